//! Vidwiz Window
//!
//! Main application window: a header bar and the wizard below it.

use crate::ui::app::VidwizApplication;
use crate::ui::wizard::WizardStack;
use crate::worker::ConversionWorker;
use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::glib;
use std::rc::Rc;
use vidwiz_common::config::VidwizConfig;

mod imp {
    use super::*;

    #[derive(Default, gtk::CompositeTemplate)]
    #[template(string = r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <interface>
            <template class="VidwizWindow" parent="AdwApplicationWindow">
                <property name="title">Vidwiz</property>
                <property name="resizable">true</property>
                <style>
                    <class name="vidwiz-window"/>
                </style>
                <property name="content">
                    <object class="GtkBox">
                        <property name="orientation">vertical</property>
                        <child>
                            <object class="AdwHeaderBar">
                                <property name="title-widget">
                                    <object class="AdwWindowTitle">
                                        <property name="title">Vidwiz</property>
                                        <property name="subtitle">Preview a video from a URL or a file</property>
                                    </object>
                                </property>
                            </object>
                        </child>

                        <!-- Wizard content area -->
                        <child>
                            <object class="GtkBox" id="content_box">
                                <property name="orientation">vertical</property>
                                <property name="vexpand">true</property>
                                <property name="valign">fill</property>
                                <property name="margin-start">24</property>
                                <property name="margin-end">24</property>
                                <property name="margin-top">16</property>
                                <property name="margin-bottom">24</property>
                            </object>
                        </child>
                    </object>
                </property>
            </template>
        </interface>
    "#)]
    pub struct VidwizWindow {
        #[template_child]
        pub content_box: TemplateChild<gtk::Box>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for VidwizWindow {
        const NAME: &'static str = "VidwizWindow";
        type Type = super::VidwizWindow;
        type ParentType = adw::ApplicationWindow;

        fn class_init(klass: &mut Self::Class) {
            klass.bind_template();
        }

        fn instance_init(obj: &glib::subclass::InitializingObject<Self>) {
            obj.init_template();
        }
    }

    impl ObjectImpl for VidwizWindow {}
    impl WidgetImpl for VidwizWindow {}
    impl WindowImpl for VidwizWindow {}
    impl ApplicationWindowImpl for VidwizWindow {}
    impl AdwApplicationWindowImpl for VidwizWindow {}
}

glib::wrapper! {
    pub struct VidwizWindow(ObjectSubclass<imp::VidwizWindow>)
        @extends adw::ApplicationWindow, gtk::ApplicationWindow, gtk::Window, gtk::Widget,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget, gtk::Native, gtk::Root, gtk::ShortcutManager;
}

impl VidwizWindow {
    pub fn new(app: &VidwizApplication, config: &VidwizConfig, worker: Rc<ConversionWorker>) -> Self {
        let window: Self = glib::Object::builder()
            .property("application", app)
            .property("default-width", config.ui.width)
            .property("default-height", config.ui.height)
            .build();

        let wizard = WizardStack::new(config.ui.spring(), worker);
        window.imp().content_box.append(&wizard);

        window
    }
}
