//! Wizard Step Machine
//!
//! Three linear steps: choose the source type, provide the source, preview
//! the result. Every user interaction is an [`Action`] dispatched to the
//! handler of the active [`Step`]; handlers return the next step explicitly.

use crate::error::WizardError;
use crate::transition::{Navigation, TransitionPlan};
use std::fmt;
use std::path::{Path, PathBuf};

/// Wizard position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ChooseType,
    ProvideSource,
    PreviewResult,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::ChooseType, Step::ProvideSource, Step::PreviewResult];

    pub fn index(self) -> usize {
        match self {
            Step::ChooseType => 0,
            Step::ProvideSource => 1,
            Step::PreviewResult => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Kind of source picked on the first step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Url,
    File,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Url => "url",
            SourceKind::File => "file",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "url" => Some(SourceKind::Url),
            "file" => Some(SourceKind::File),
            _ => None,
        }
    }
}

/// A user-selected local video file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub name: String,
}

impl LocalFile {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }
}

/// The input the preview step should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(LocalFile),
}

/// Shared selection state accumulated across steps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSelection {
    pub kind: Option<SourceKind>,
    pub url: String,
    pub file: Option<LocalFile>,
}

impl SourceSelection {
    /// The authoritative source for the chosen kind, if one was provided
    pub fn source(&self) -> Option<Source> {
        match self.kind? {
            SourceKind::Url if !self.url.is_empty() => Some(Source::Url(self.url.clone())),
            SourceKind::File => self.file.clone().map(Source::File),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// User interactions understood by the wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Choose(SourceKind),
    EditUrl(String),
    SelectFile(LocalFile),
    Next,
    Previous,
    BackHome,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Choose(_) => "choose",
            Action::EditUrl(_) => "edit-url",
            Action::SelectFile(_) => "select-file",
            Action::Next => "next",
            Action::Previous => "previous",
            Action::BackHome => "back-home",
        }
    }
}

/// Runs right before a forward transition leaves the current step
type PreTransitionHook = Box<dyn FnOnce(&mut SourceSelection, &str)>;

pub struct Wizard {
    nav: Navigation,
    selection: SourceSelection,
    url_draft: String,
    pre_transition: Option<PreTransitionHook>,
}

impl fmt::Debug for Wizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wizard")
            .field("nav", &self.nav)
            .field("selection", &self.selection)
            .field("url_draft", &self.url_draft)
            .field("pre_transition", &self.pre_transition.is_some())
            .finish()
    }
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            nav: Navigation::default(),
            selection: SourceSelection::default(),
            url_draft: String::new(),
            pre_transition: None,
        }
    }

    pub fn step(&self) -> Step {
        self.nav.active()
    }

    pub fn selection(&self) -> &SourceSelection {
        &self.selection
    }

    pub fn url_draft(&self) -> &str {
        &self.url_draft
    }

    /// The step that was left is no longer on screen
    pub fn exit_finished(&mut self) {
        self.nav.exit_finished();
    }

    /// Whether "Next" is enabled on the current step
    pub fn can_advance(&self) -> bool {
        match self.step() {
            Step::ProvideSource => match self.selection.kind {
                Some(SourceKind::File) => self.selection.file.is_some(),
                Some(SourceKind::Url) => !self.url_draft.trim().is_empty(),
                None => false,
            },
            Step::ChooseType | Step::PreviewResult => false,
        }
    }

    /// Apply an action, returning the transition it caused (if any)
    pub fn dispatch(&mut self, action: Action) -> Result<Option<TransitionPlan>, WizardError> {
        let step = self.step();
        let target = match step {
            Step::ChooseType => self.handle_choose_type(action)?,
            Step::ProvideSource => self.handle_provide_source(action)?,
            Step::PreviewResult => self.handle_preview(action)?,
        };

        Ok(target.map(|to| self.go_to(to)))
    }

    fn handle_choose_type(&mut self, action: Action) -> Result<Option<Step>, WizardError> {
        match action {
            Action::Choose(kind) => {
                self.selection.kind = Some(kind);
                Ok(Some(Step::ProvideSource))
            }
            other => Err(illegal(Step::ChooseType, &other)),
        }
    }

    fn handle_provide_source(&mut self, action: Action) -> Result<Option<Step>, WizardError> {
        match (self.selection.kind, action) {
            (Some(SourceKind::Url), Action::EditUrl(text)) => {
                self.url_draft = text;
                Ok(None)
            }
            (Some(SourceKind::File), Action::SelectFile(file)) => {
                self.selection.file = Some(file);
                Ok(None)
            }
            (_, Action::Next) => {
                if !self.can_advance() {
                    return Err(WizardError::NextDisabled(Step::ProvideSource));
                }
                if let Some(hook) = self.pre_transition.take() {
                    hook(&mut self.selection, &self.url_draft);
                }
                Ok(Some(Step::PreviewResult))
            }
            (_, Action::Previous) => {
                self.reset_selection();
                Ok(Some(Step::ChooseType))
            }
            (_, other) => Err(illegal(Step::ProvideSource, &other)),
        }
    }

    fn handle_preview(&mut self, action: Action) -> Result<Option<Step>, WizardError> {
        match action {
            Action::BackHome => {
                self.reset_selection();
                Ok(Some(Step::ChooseType))
            }
            other => Err(illegal(Step::PreviewResult, &other)),
        }
    }

    fn go_to(&mut self, to: Step) -> TransitionPlan {
        let plan = self.nav.begin(to);
        self.pre_transition = None;

        if to == Step::ProvideSource {
            self.url_draft.clear();
            if self.selection.kind == Some(SourceKind::Url) {
                self.pre_transition = Some(Box::new(|selection, draft| {
                    selection.url = draft.trim().to_string();
                }));
            }
        }

        tracing::debug!(from = ?plan.from, to = ?plan.to, direction = ?plan.direction, "wizard transition");
        plan
    }

    fn reset_selection(&mut self) {
        self.selection.clear();
        self.url_draft.clear();
    }
}

fn illegal(step: Step, action: &Action) -> WizardError {
    WizardError::IllegalAction {
        step,
        action: action.name(),
    }
}
