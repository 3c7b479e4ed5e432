//! Choose Type Page - First step of the wizard
//!
//! Two buttons, one per source kind.

use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::glib;
use vidwiz_common::wizard::SourceKind;

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct ChooseTypePage;

    #[glib::object_subclass]
    impl ObjectSubclass for ChooseTypePage {
        const NAME: &'static str = "VidwizChooseTypePage";
        type Type = super::ChooseTypePage;
        type ParentType = gtk::Box;
    }

    impl ObjectImpl for ChooseTypePage {
        fn constructed(&self) {
            self.parent_constructed();
            self.obj().setup_ui();
        }

        fn signals() -> &'static [glib::subclass::Signal] {
            use std::sync::OnceLock;
            static SIGNALS: OnceLock<Vec<glib::subclass::Signal>> = OnceLock::new();
            SIGNALS.get_or_init(|| {
                vec![glib::subclass::Signal::builder("source-chosen")
                    .param_types([String::static_type()])
                    .build()]
            })
        }
    }

    impl WidgetImpl for ChooseTypePage {}
    impl BoxImpl for ChooseTypePage {}
}

glib::wrapper! {
    pub struct ChooseTypePage(ObjectSubclass<imp::ChooseTypePage>)
        @extends gtk::Box, gtk::Widget,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget, gtk::Orientable;
}

impl ChooseTypePage {
    pub fn new() -> Self {
        glib::Object::builder()
            .property("orientation", gtk::Orientation::Vertical)
            .property("spacing", 16)
            .property("valign", gtk::Align::Center)
            .property("halign", gtk::Align::Center)
            .property("vexpand", true)
            .property("hexpand", true)
            .build()
    }

    fn setup_ui(&self) {
        let title = gtk::Label::builder()
            .label("Choose the type of the video file to upload")
            .css_classes(["step-title"])
            .build();

        let buttons = gtk::Box::builder()
            .orientation(gtk::Orientation::Horizontal)
            .spacing(12)
            .homogeneous(true)
            .margin_top(20)
            .build();

        for (label, kind) in [("URL", SourceKind::Url), ("File", SourceKind::File)] {
            let button = gtk::Button::builder()
                .label(label)
                .css_classes(["pill", "source-button"])
                .build();
            button.connect_clicked(glib::clone!(
                @weak self as page =>
                move |_| {
                    page.emit_by_name::<()>("source-chosen", &[&kind.as_str().to_string()]);
                }
            ));
            buttons.append(&button);
        }

        self.append(&title);
        self.append(&buttons);
    }
}

impl Default for ChooseTypePage {
    fn default() -> Self {
        Self::new()
    }
}
