//! Provide Source Page - Second step of the wizard
//!
//! Shows either a URL entry or a file picker, depending on the kind chosen
//! on the first step, plus Previous/Next buttons.

use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::{gio, glib};
use std::cell::{Cell, RefCell};
use vidwiz_common::wizard::{LocalFile, SourceKind};

const URL_VIEW: &str = "url";
const FILE_VIEW: &str = "file";

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct ProvideSourcePage {
        pub views: RefCell<Option<gtk::Stack>>,
        pub url_entry: RefCell<Option<gtk::Entry>>,
        pub file_label: RefCell<Option<gtk::Label>>,
        pub choose_button: RefCell<Option<gtk::Button>>,
        pub next_button: RefCell<Option<gtk::Button>>,
        /// Set while state is pushed into widgets, so echoes are not re-emitted
        pub syncing: Cell<bool>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for ProvideSourcePage {
        const NAME: &'static str = "VidwizProvideSourcePage";
        type Type = super::ProvideSourcePage;
        type ParentType = gtk::Box;
    }

    impl ObjectImpl for ProvideSourcePage {
        fn constructed(&self) {
            self.parent_constructed();
            self.obj().setup_ui();
        }

        fn signals() -> &'static [glib::subclass::Signal] {
            use std::sync::OnceLock;
            static SIGNALS: OnceLock<Vec<glib::subclass::Signal>> = OnceLock::new();
            SIGNALS.get_or_init(|| {
                vec![
                    glib::subclass::Signal::builder("url-edited")
                        .param_types([String::static_type()])
                        .build(),
                    glib::subclass::Signal::builder("file-selected")
                        .param_types([String::static_type()])
                        .build(),
                    glib::subclass::Signal::builder("previous-clicked").build(),
                    glib::subclass::Signal::builder("next-clicked").build(),
                ]
            })
        }
    }

    impl WidgetImpl for ProvideSourcePage {}
    impl BoxImpl for ProvideSourcePage {}
}

glib::wrapper! {
    pub struct ProvideSourcePage(ObjectSubclass<imp::ProvideSourcePage>)
        @extends gtk::Box, gtk::Widget,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget, gtk::Orientable;
}

impl ProvideSourcePage {
    pub fn new() -> Self {
        glib::Object::builder()
            .property("orientation", gtk::Orientation::Vertical)
            .property("spacing", 16)
            .property("valign", gtk::Align::Center)
            .property("halign", gtk::Align::Center)
            .property("vexpand", true)
            .property("hexpand", true)
            .property("width-request", 320)
            .build()
    }

    fn setup_ui(&self) {
        let imp = self.imp();

        // URL branch
        let url_entry = gtk::Entry::builder()
            .placeholder_text("Enter URL")
            .input_purpose(gtk::InputPurpose::Url)
            .hexpand(true)
            .build();
        url_entry.connect_changed(glib::clone!(
            @weak self as page =>
            move |entry| {
                if !page.imp().syncing.get() {
                    page.emit_by_name::<()>("url-edited", &[&entry.text().to_string()]);
                }
            }
        ));
        url_entry.connect_activate(glib::clone!(
            @weak self as page =>
            move |_| {
                page.request_next();
            }
        ));

        // File branch
        let file_label = gtk::Label::builder()
            .label("No file selected")
            .css_classes(["dim-label"])
            .ellipsize(gtk::pango::EllipsizeMode::Middle)
            .max_width_chars(40)
            .build();
        let choose_button = gtk::Button::builder()
            .label("Choose video file…")
            .css_classes(["pill"])
            .halign(gtk::Align::Center)
            .build();
        choose_button.connect_clicked(glib::clone!(
            @weak self as page =>
            move |_| {
                page.open_file_dialog();
            }
        ));
        let file_box = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .spacing(8)
            .build();
        file_box.append(&file_label);
        file_box.append(&choose_button);

        let views = gtk::Stack::builder()
            .transition_type(gtk::StackTransitionType::None)
            .vhomogeneous(false)
            .build();
        views.add_named(&url_entry, Some(URL_VIEW));
        views.add_named(&file_box, Some(FILE_VIEW));

        // Navigation buttons
        let previous_button = gtk::Button::builder().label("Previous").build();
        previous_button.connect_clicked(glib::clone!(
            @weak self as page =>
            move |_| {
                page.emit_by_name::<()>("previous-clicked", &[]);
            }
        ));
        let next_button = gtk::Button::builder()
            .label("Next")
            .sensitive(false)
            .css_classes(["suggested-action"])
            .build();
        next_button.connect_clicked(glib::clone!(
            @weak self as page =>
            move |_| {
                page.request_next();
            }
        ));
        let buttons = gtk::Box::builder()
            .orientation(gtk::Orientation::Horizontal)
            .spacing(12)
            .homogeneous(true)
            .margin_top(20)
            .build();
        buttons.append(&previous_button);
        buttons.append(&next_button);

        self.append(&views);
        self.append(&buttons);

        *imp.views.borrow_mut() = Some(views);
        *imp.url_entry.borrow_mut() = Some(url_entry);
        *imp.file_label.borrow_mut() = Some(file_label);
        *imp.choose_button.borrow_mut() = Some(choose_button);
        *imp.next_button.borrow_mut() = Some(next_button);
    }

    /// Push wizard state into the widgets
    pub fn sync(&self, kind: Option<SourceKind>, draft: &str, file: Option<&LocalFile>, can_advance: bool) {
        let imp = self.imp();
        imp.syncing.set(true);

        if let Some(ref views) = *imp.views.borrow() {
            let view = match kind {
                Some(SourceKind::File) => FILE_VIEW,
                _ => URL_VIEW,
            };
            views.set_visible_child_name(view);
        }

        if let Some(ref entry) = *imp.url_entry.borrow() {
            if entry.text() != draft {
                entry.set_text(draft);
            }
        }

        if let Some(ref label) = *imp.file_label.borrow() {
            match file {
                Some(file) => label.set_label(&format!("Selected file: {}", file.name)),
                None => label.set_label("No file selected"),
            }
        }

        // A single file per visit; going back clears it
        if let Some(ref button) = *imp.choose_button.borrow() {
            button.set_visible(file.is_none());
        }

        if let Some(ref button) = *imp.next_button.borrow() {
            button.set_sensitive(can_advance);
        }

        imp.syncing.set(false);
    }

    /// Focus the URL entry when the page becomes active
    pub fn focus_input(&self) {
        if let Some(ref entry) = *self.imp().url_entry.borrow() {
            if entry.is_visible() {
                entry.grab_focus();
            }
        }
    }

    fn request_next(&self) {
        let enabled = self
            .imp()
            .next_button
            .borrow()
            .as_ref()
            .map(|b| b.is_sensitive())
            .unwrap_or(false);
        if enabled {
            self.emit_by_name::<()>("next-clicked", &[]);
        }
    }

    fn open_file_dialog(&self) {
        let filter = gtk::FileFilter::new();
        filter.set_name(Some("Videos"));
        filter.add_mime_type("video/*");
        let filters = gio::ListStore::new::<gtk::FileFilter>();
        filters.append(&filter);

        let dialog = gtk::FileDialog::builder()
            .title("Choose a video")
            .modal(true)
            .filters(&filters)
            .default_filter(&filter)
            .build();

        let parent = self.root().and_then(|root| root.downcast::<gtk::Window>().ok());

        dialog.open(
            parent.as_ref(),
            gio::Cancellable::NONE,
            glib::clone!(@weak self as page => move |result| {
                match result {
                    Ok(file) => match file.path() {
                        Some(path) => {
                            page.emit_by_name::<()>("file-selected", &[&path.display().to_string()]);
                        }
                        None => tracing::warn!("Selected file has no local path: {}", file.uri()),
                    },
                    Err(e) => tracing::debug!("File dialog dismissed: {}", e),
                }
            }),
        );
    }
}

impl Default for ProvideSourcePage {
    fn default() -> Self {
        Self::new()
    }
}
