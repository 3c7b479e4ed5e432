//! Vidwiz Application - GTK4 Application Setup
//!
//! Initializes the GTK4/Libadwaita application and handles the main event loop.

use crate::ui::window::VidwizWindow;
use crate::worker::ConversionWorker;
use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::gio;
use std::cell::RefCell;
use std::rc::Rc;
use vidwiz_common::config::VidwizConfig;

/// Application ID for Vidwiz
const APP_ID: &str = "org.vidwiz.Vidwiz";

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct VidwizApplication {
        pub config: RefCell<VidwizConfig>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for VidwizApplication {
        const NAME: &'static str = "VidwizApplication";
        type Type = super::VidwizApplication;
        type ParentType = adw::Application;
    }

    impl ObjectImpl for VidwizApplication {}

    impl ApplicationImpl for VidwizApplication {
        fn activate(&self) {
            let app = self.obj();
            
            if let Some(window) = app.active_window() {
                window.present();
                return;
            }
            
            let config = self.config.borrow().clone();
            let worker = match ConversionWorker::new(&config) {
                Ok(worker) => Rc::new(worker),
                Err(e) => {
                    tracing::error!("Could not start the conversion worker: {:#}", e);
                    app.quit();
                    return;
                }
            };
            
            // Create and show the main window
            let window = VidwizWindow::new(&app, &config, worker);
            window.present();
        }

        fn startup(&self) {
            self.parent_startup();
            
            // Load CSS
            let css_provider = gtk::CssProvider::new();
            css_provider.load_from_data(include_str!("styles.css"));
            
            match gtk::gdk::Display::default() {
                Some(display) => {
                    gtk::style_context_add_provider_for_display(
                        &display,
                        &css_provider,
                        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
                    );
                }
                None => {
                    tracing::warn!("No display available. CSS styling will not be applied.");
                }
            }
            
            // Set up actions
            let app = self.obj();
            app.setup_actions();
        }
    }

    impl GtkApplicationImpl for VidwizApplication {}
    impl AdwApplicationImpl for VidwizApplication {}
}

glib::wrapper! {
    pub struct VidwizApplication(ObjectSubclass<imp::VidwizApplication>)
        @extends adw::Application, gtk::Application, gio::Application,
        @implements gio::ActionGroup, gio::ActionMap;
}

impl VidwizApplication {
    pub fn new(config: VidwizConfig) -> Self {
        let app: Self = glib::Object::builder()
            .property("application-id", APP_ID)
            .property("flags", gio::ApplicationFlags::FLAGS_NONE)
            .build();
        
        *app.imp().config.borrow_mut() = config;
        
        app
    }
    
    fn setup_actions(&self) {
        // Quit action
        let quit_action = gio::SimpleAction::new("quit", None);
        quit_action.connect_activate(glib::clone!(
            @weak self as app =>
            move |_, _| {
                app.quit();
            }
        ));
        self.add_action(&quit_action);
        
        // Set keyboard shortcuts
        self.set_accels_for_action("app.quit", &["<Ctrl>q"]);
    }
    
    /// Run the main loop. Command-line options were already consumed by clap,
    /// so GApplication only sees the program name.
    pub fn run(&self) -> glib::ExitCode {
        let program = std::env::args().next().unwrap_or_else(|| "vidwiz".to_string());
        ApplicationExtManual::run_with_args(self, &[program])
    }
}

impl Default for VidwizApplication {
    fn default() -> Self {
        Self::new(VidwizConfig::default())
    }
}
