//! Preview Page - Last step of the wizard
//!
//! Plays a local file directly, or submits a URL to the conversion worker
//! and binds the converted media once it arrives. Messages from the worker
//! are polled on the GTK main loop with glib::timeout_add_local.

use crate::worker::{ConversionWorker, WorkerMessage};
use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::glib;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, TryRecvError};
use vidwiz_common::orchestrator::ProcessOutcome;
use vidwiz_common::preview::{Playback, PreviewRequest, PreviewState, StatusListener, ERROR_MESSAGE};
use vidwiz_common::wizard::Source;

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct PreviewPage {
        pub worker: RefCell<Option<Rc<ConversionWorker>>>,
        pub state: RefCell<PreviewState>,
        pub bound_path: RefCell<Option<PathBuf>>,
        pub video: RefCell<Option<gtk::Video>>,
        pub status_label: RefCell<Option<gtk::Label>>,
        pub error_label: RefCell<Option<gtk::Label>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for PreviewPage {
        const NAME: &'static str = "VidwizPreviewPage";
        type Type = super::PreviewPage;
        type ParentType = gtk::Box;
    }

    impl ObjectImpl for PreviewPage {
        fn constructed(&self) {
            self.parent_constructed();
            // NOTE: setup_ui() runs from new(), once the worker is set
        }

        fn signals() -> &'static [glib::subclass::Signal] {
            use std::sync::OnceLock;
            static SIGNALS: OnceLock<Vec<glib::subclass::Signal>> = OnceLock::new();
            SIGNALS.get_or_init(|| vec![glib::subclass::Signal::builder("home-clicked").build()])
        }
    }

    impl WidgetImpl for PreviewPage {}
    impl BoxImpl for PreviewPage {}
}

glib::wrapper! {
    pub struct PreviewPage(ObjectSubclass<imp::PreviewPage>)
        @extends gtk::Box, gtk::Widget,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget, gtk::Orientable;
}

impl PreviewPage {
    pub fn new(worker: Rc<ConversionWorker>) -> Self {
        let obj: Self = glib::Object::builder()
            .property("orientation", gtk::Orientation::Vertical)
            .property("spacing", 12)
            .property("valign", gtk::Align::Center)
            .property("halign", gtk::Align::Center)
            .property("vexpand", true)
            .property("hexpand", true)
            .build();

        *obj.imp().worker.borrow_mut() = Some(worker);
        obj.setup_ui();

        obj
    }

    fn setup_ui(&self) {
        let imp = self.imp();

        let video = gtk::Video::builder()
            .autoplay(false)
            .css_classes(["preview-video"])
            .build();

        let status_label = gtk::Label::builder()
            .label("")
            .css_classes(["caption", "numeric", "dim-label"])
            .build();

        let error_label = gtk::Label::builder()
            .label(ERROR_MESSAGE)
            .wrap(true)
            .visible(false)
            .css_classes(["error-message"])
            .build();

        let home_button = gtk::Button::builder()
            .label("Back home")
            .css_classes(["pill"])
            .hexpand(true)
            .margin_top(20)
            .build();
        home_button.connect_clicked(glib::clone!(
            @weak self as page =>
            move |_| {
                page.emit_by_name::<()>("home-clicked", &[]);
            }
        ));

        self.append(&video);
        self.append(&status_label);
        self.append(&error_label);
        self.append(&home_button);

        *imp.video.borrow_mut() = Some(video);
        *imp.status_label.borrow_mut() = Some(status_label);
        *imp.error_label.borrow_mut() = Some(error_label);
    }

    /// Show the selected source. URLs go to the worker; repeating the URL
    /// already processed does not run the pipeline again.
    pub fn present(&self, source: Option<Source>) {
        let request = self.imp().state.borrow_mut().present(source);
        self.render();

        if let PreviewRequest::Convert(url) = request {
            self.start_conversion(url);
        }
    }

    /// Drop any bound media and invalidate running conversions
    pub fn reset(&self) {
        let imp = self.imp();
        imp.state.borrow_mut().reset();
        if let Some(ref worker) = *imp.worker.borrow() {
            worker.reset();
        }
        self.render();
    }

    fn start_conversion(&self, url: String) {
        let imp = self.imp();
        let Some(receiver) = imp.worker.borrow().as_ref().map(|w| w.submit(url)) else {
            tracing::error!("Preview page has no conversion worker");
            return;
        };
        let listener = imp.state.borrow_mut().listen();
        self.poll_worker(receiver, listener);
    }

    /// Poll until the cycle ends or a newer receiver takes over
    fn poll_worker(&self, receiver: mpsc::Receiver<WorkerMessage>, listener: StatusListener) {
        glib::timeout_add_local(
            std::time::Duration::from_millis(16),
            glib::clone!(@weak self as page => @default-return glib::ControlFlow::Break, move || {
                loop {
                    if !page.imp().state.borrow().is_listening(listener) {
                        return glib::ControlFlow::Break;
                    }
                    match receiver.try_recv() {
                        Ok(WorkerMessage::Status(line)) => page.set_status(listener, line),
                        Ok(WorkerMessage::Finished(outcome)) => {
                            page.finish(outcome);
                            return glib::ControlFlow::Break;
                        }
                        Err(TryRecvError::Empty) => return glib::ControlFlow::Continue,
                        Err(TryRecvError::Disconnected) => return glib::ControlFlow::Break,
                    }
                }
            }),
        );
    }

    fn set_status(&self, listener: StatusListener, line: String) {
        let changed = self.imp().state.borrow_mut().set_status(listener, line);
        if changed {
            self.render();
        }
    }

    fn finish(&self, outcome: ProcessOutcome) {
        let imp = self.imp();
        if let ProcessOutcome::Converted { ref media, .. } = outcome {
            tracing::debug!("Converted media {} ({})", media.path().display(), media.mime());
        }
        let latest = imp.worker.borrow().as_ref().and_then(|w| w.latest_token());
        let changed = imp.state.borrow_mut().apply(outcome, latest);
        if changed {
            self.render();
        }
    }

    fn render(&self) {
        let imp = self.imp();
        let state = imp.state.borrow();

        let path = match state.playback() {
            Playback::Unbound => None,
            Playback::File(file) => Some(file.path.clone()),
            Playback::Converted(media) => Some(media.path().to_path_buf()),
        };

        if let Some(ref video) = *imp.video.borrow() {
            let mut bound = imp.bound_path.borrow_mut();
            if *bound != path {
                match path {
                    Some(ref path) => video.set_filename(Some(path)),
                    None => video.set_media_stream(None::<&gtk::MediaStream>),
                }
                *bound = path;
            }
        }

        if let Some(ref label) = *imp.status_label.borrow() {
            label.set_label(state.status());
            label.set_visible(!state.status().is_empty());
        }

        if let Some(ref label) = *imp.error_label.borrow() {
            label.set_visible(state.has_error());
        }
    }
}
