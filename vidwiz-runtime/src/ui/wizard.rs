//! Wizard Stack - Three-step wizard with spring transitions
//!
//! Pages live in an AdwCarousel driven programmatically. Every page signal
//! becomes a wizard [`Action`]; the resulting transition plan decides which
//! page slides in and from which side.

use crate::ui::pages::{ChooseTypePage, PreviewPage, ProvideSourcePage};
use crate::worker::ConversionWorker;
use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::glib;
use std::cell::RefCell;
use std::rc::Rc;
use vidwiz_common::transition::{Direction, SpringConfig, TransitionPlan};
use vidwiz_common::wizard::{Action, LocalFile, SourceKind, Step, Wizard};

const DIRECTION_CLASSES: [Direction; 3] = [Direction::Forward, Direction::Backward, Direction::None];

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct WizardStack {
        pub carousel: RefCell<Option<adw::Carousel>>,
        pub wizard: RefCell<Wizard>,
        pub spring: RefCell<SpringConfig>,
        pub worker: RefCell<Option<Rc<ConversionWorker>>>,

        // Page references
        pub choose_type_page: RefCell<Option<ChooseTypePage>>,
        pub provide_source_page: RefCell<Option<ProvideSourcePage>>,
        pub preview_page: RefCell<Option<PreviewPage>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for WizardStack {
        const NAME: &'static str = "VidwizWizardStack";
        type Type = super::WizardStack;
        type ParentType = gtk::Box;
    }

    impl ObjectImpl for WizardStack {
        fn constructed(&self) {
            self.parent_constructed();
            // NOTE: setup_ui() needs the worker, so new() calls it
        }
    }

    impl WidgetImpl for WizardStack {}
    impl BoxImpl for WizardStack {}
}

glib::wrapper! {
    pub struct WizardStack(ObjectSubclass<imp::WizardStack>)
        @extends gtk::Box, gtk::Widget,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget, gtk::Orientable;
}

impl WizardStack {
    pub fn new(spring: SpringConfig, worker: Rc<ConversionWorker>) -> Self {
        let obj: Self = glib::Object::builder()
            .property("orientation", gtk::Orientation::Vertical)
            .property("vexpand", true)
            .build();

        let imp = obj.imp();
        *imp.spring.borrow_mut() = spring;
        *imp.worker.borrow_mut() = Some(worker);

        obj.setup_ui();
        obj.sync_pages();

        obj
    }

    fn setup_ui(&self) {
        let imp = self.imp();
        let spring = *imp.spring.borrow();
        let Some(worker) = imp.worker.borrow().clone() else {
            tracing::error!("Wizard created without a conversion worker");
            return;
        };

        let carousel = adw::Carousel::builder()
            .interactive(false) // Steps only change through the wizard
            .allow_scroll_wheel(false)
            .allow_mouse_drag(false)
            .vexpand(true)
            .build();
        carousel.set_scroll_params(&adw::SpringParams::new(
            spring.damping_ratio(),
            spring.mass,
            spring.stiffness,
        ));

        let choose_type = ChooseTypePage::new();
        let provide_source = ProvideSourcePage::new();
        let preview = PreviewPage::new(worker);

        carousel.append(&choose_type);
        carousel.append(&provide_source);
        carousel.append(&preview);

        choose_type.connect_local(
            "source-chosen",
            false,
            glib::clone!(@weak self as stack => @default-return None, move |args| {
                let kind = args[1].get::<String>().ok().and_then(|value| SourceKind::parse(&value));
                match kind {
                    Some(kind) => stack.dispatch(Action::Choose(kind)),
                    None => tracing::warn!("Unknown source kind from the first step"),
                }
                None
            }),
        );

        provide_source.connect_local(
            "url-edited",
            false,
            glib::clone!(@weak self as stack => @default-return None, move |args| {
                let text = args[1].get::<String>().unwrap_or_default();
                stack.dispatch(Action::EditUrl(text));
                None
            }),
        );

        provide_source.connect_local(
            "file-selected",
            false,
            glib::clone!(@weak self as stack => @default-return None, move |args| {
                if let Ok(path) = args[1].get::<String>() {
                    stack.dispatch(Action::SelectFile(LocalFile::from_path(path)));
                }
                None
            }),
        );

        provide_source.connect_local(
            "previous-clicked",
            false,
            glib::clone!(@weak self as stack => @default-return None, move |_| {
                stack.dispatch(Action::Previous);
                None
            }),
        );

        provide_source.connect_local(
            "next-clicked",
            false,
            glib::clone!(@weak self as stack => @default-return None, move |_| {
                stack.dispatch(Action::Next);
                None
            }),
        );

        preview.connect_local(
            "home-clicked",
            false,
            glib::clone!(@weak self as stack => @default-return None, move |_| {
                stack.dispatch(Action::BackHome);
                None
            }),
        );

        // Emitted once the spring settles on the new page
        carousel.connect_page_changed(glib::clone!(@weak self as stack => move |_, index| {
            let mut wizard = stack.imp().wizard.borrow_mut();
            if Step::from_index(index as usize) == Some(wizard.step()) {
                wizard.exit_finished();
            } else {
                tracing::debug!("Carousel passed page {} on the way to {:?}", index, wizard.step());
            }
        }));

        self.append(&carousel);

        *imp.carousel.borrow_mut() = Some(carousel);
        *imp.choose_type_page.borrow_mut() = Some(choose_type);
        *imp.provide_source_page.borrow_mut() = Some(provide_source);
        *imp.preview_page.borrow_mut() = Some(preview);
    }

    fn dispatch(&self, action: Action) {
        // The wizard borrow must end before any widget is touched
        let result = self.imp().wizard.borrow_mut().dispatch(action);

        match result {
            Ok(Some(plan)) => self.run_transition(plan),
            Ok(None) => {}
            Err(e) => tracing::warn!("Ignored wizard action: {}", e),
        }

        self.sync_pages();
    }

    fn run_transition(&self, plan: TransitionPlan) {
        let imp = self.imp();

        if plan.from == Step::PreviewResult {
            if let Some(ref preview) = *imp.preview_page.borrow() {
                preview.reset();
            }
        }

        let Some(page) = self.page_widget(plan.to) else {
            return;
        };

        for direction in DIRECTION_CLASSES {
            page.remove_css_class(direction.css_class());
        }
        page.add_css_class(plan.direction.css_class());

        if let Some(ref carousel) = *imp.carousel.borrow() {
            carousel.scroll_to(&page, true);
        }

        match plan.to {
            Step::PreviewResult => {
                let source = imp.wizard.borrow().selection().source();
                if let Some(ref preview) = *imp.preview_page.borrow() {
                    preview.present(source);
                }
            }
            Step::ProvideSource => {
                if let Some(ref page) = *imp.provide_source_page.borrow() {
                    page.focus_input();
                }
            }
            Step::ChooseType => {}
        }
    }

    fn page_widget(&self, step: Step) -> Option<gtk::Widget> {
        let imp = self.imp();
        match step {
            Step::ChooseType => imp.choose_type_page.borrow().as_ref().map(|p| p.clone().upcast()),
            Step::ProvideSource => imp.provide_source_page.borrow().as_ref().map(|p| p.clone().upcast()),
            Step::PreviewResult => imp.preview_page.borrow().as_ref().map(|p| p.clone().upcast()),
        }
    }

    /// Push wizard state into the input page
    fn sync_pages(&self) {
        let imp = self.imp();
        let (kind, draft, file, can_advance) = {
            let wizard = imp.wizard.borrow();
            let selection = wizard.selection();
            (
                selection.kind,
                wizard.url_draft().to_string(),
                selection.file.clone(),
                wizard.can_advance(),
            )
        };

        if let Some(ref page) = *imp.provide_source_page.borrow() {
            page.sync(kind, &draft, file.as_ref(), can_advance);
        }
    }
}
