//! Preview State
//!
//! What the PreviewResult step shows: the bound media, the error flag and
//! the progress line. Outcomes are only applied if their token is still the
//! latest one, so a late result from an abandoned URL never reaches the
//! player. Likewise only the newest [`StatusListener`] may change the
//! progress line.

use crate::orchestrator::{PlayableMedia, ProcessOutcome, RequestToken};
use crate::wizard::{LocalFile, Source};

/// The single message shown for any conversion failure
pub const ERROR_MESSAGE: &str = "Something went wrong. Please try again with a valid URL.";

#[derive(Debug, Clone, Default)]
pub enum Playback {
    #[default]
    Unbound,
    /// Local files are played as-is
    File(LocalFile),
    Converted(PlayableMedia),
}

#[derive(Debug, Default)]
pub struct PreviewState {
    playback: Playback,
    has_error: bool,
    status: String,
    pending_url: Option<String>,
    listener: u64,
}

/// Handle of the receiver allowed to update the progress line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusListener(u64);

/// What the caller has to do after [`PreviewState::present`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewRequest {
    /// Nothing to run, the playback is already set
    None,
    /// Submit this URL to the orchestrator
    Convert(String),
}

impl PreviewState {
    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self.playback, Playback::Unbound)
    }

    /// Show a source on entering the preview step
    pub fn present(&mut self, source: Option<Source>) -> PreviewRequest {
        match source {
            Some(Source::File(file)) => {
                self.reset();
                self.playback = Playback::File(file);
                PreviewRequest::None
            }
            Some(Source::Url(url)) => {
                if self.pending_url.as_deref() != Some(url.as_str()) {
                    self.reset();
                    self.pending_url = Some(url.clone());
                }
                PreviewRequest::Convert(url)
            }
            None => {
                self.reset();
                PreviewRequest::None
            }
        }
    }

    /// Hand status updates to a new receiver, revoking earlier ones
    pub fn listen(&mut self) -> StatusListener {
        self.listener += 1;
        StatusListener(self.listener)
    }

    pub fn is_listening(&self, listener: StatusListener) -> bool {
        listener.0 == self.listener
    }

    /// Update the progress line; ignored unless `listener` is the newest
    pub fn set_status(&mut self, listener: StatusListener, status: impl Into<String>) -> bool {
        if !self.is_listening(listener) {
            return false;
        }
        self.status = status.into();
        true
    }

    /// Apply an orchestrator outcome; `latest` is the orchestrator's newest
    /// token at the time of applying. Returns whether anything changed.
    pub fn apply(&mut self, outcome: ProcessOutcome, latest: Option<RequestToken>) -> bool {
        let is_latest = |token: RequestToken| latest == Some(token);
        match outcome {
            ProcessOutcome::Converted { token, media } if is_latest(token) => {
                self.playback = Playback::Converted(media);
                self.has_error = false;
                true
            }
            ProcessOutcome::Failed { token, .. } if is_latest(token) => {
                self.has_error = true;
                true
            }
            _ => false,
        }
    }

    /// Back to an empty player; revokes the current listener
    pub fn reset(&mut self) {
        *self = Self {
            listener: self.listener + 1,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::fetch::HttpFetcher;
    use crate::orchestrator::ConversionOrchestrator;
    use crate::testing::{MockEngine, MockFetcher};
    use crate::wizard::{Action, SourceKind, Step, Wizard};
    use std::io::Write;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_file_flow_skips_engine() {
        let dir = tempfile::tempdir().unwrap();
        let mut dummy = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
        dummy.write_all(&[0u8]).unwrap();

        let engine = Arc::new(MockEngine::default());
        let fetcher = Arc::new(MockFetcher::with_body(b""));
        let _orch = ConversionOrchestrator::new(engine.clone(), fetcher.clone(), &EngineConfig::default(), dir.path());

        let mut wizard = Wizard::new();
        wizard.dispatch(Action::Choose(SourceKind::File)).unwrap();
        wizard
            .dispatch(Action::SelectFile(LocalFile::from_path(dummy.path())))
            .unwrap();
        wizard.dispatch(Action::Next).unwrap();
        assert_eq!(wizard.step(), Step::PreviewResult);

        let mut preview = PreviewState::default();
        assert_eq!(preview.present(wizard.selection().source()), PreviewRequest::None);
        match preview.playback() {
            Playback::File(file) => assert_eq!(file.path, dummy.path()),
            other => panic!("expected file playback, got {other:?}"),
        }
        assert_eq!(engine.inits.load(Ordering::SeqCst), 0);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_url_flow_converts_once() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let fetcher = Arc::new(MockFetcher::with_body(b"webm"));
        let orch = ConversionOrchestrator::new(engine.clone(), fetcher.clone(), &EngineConfig::default(), dir.path());

        let mut wizard = Wizard::new();
        wizard.dispatch(Action::Choose(SourceKind::Url)).unwrap();
        wizard
            .dispatch(Action::EditUrl("https://example.com/sample.webm".into()))
            .unwrap();
        wizard.dispatch(Action::Next).unwrap();

        let mut preview = PreviewState::default();
        for _ in 0..2 {
            let PreviewRequest::Convert(url) = preview.present(wizard.selection().source()) else {
                panic!("expected a conversion request");
            };
            let outcome = orch.process(&url).await;
            preview.apply(outcome, orch.latest_token());
        }

        assert!(matches!(preview.playback(), Playback::Converted(_)));
        assert!(!preview.has_error());
        assert_eq!(engine.inits.load(Ordering::SeqCst), 1);
        assert_eq!(engine.execs.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bad_url_sets_error_and_stays_unbound() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let fetcher = Arc::new(HttpFetcher::new(&Default::default()).unwrap());
        let orch = ConversionOrchestrator::new(engine, fetcher, &EngineConfig::default(), dir.path());

        let mut preview = PreviewState::default();
        let request = preview.present(Some(Source::Url("bad://url".into())));
        assert_eq!(request, PreviewRequest::Convert("bad://url".into()));

        let outcome = orch.process("bad://url").await;
        assert!(preview.apply(outcome, orch.latest_token()));
        assert!(preview.has_error());
        assert!(!preview.is_bound());
    }

    #[tokio::test]
    async fn test_stale_outcome_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let orch = ConversionOrchestrator::new(
            engine,
            Arc::new(MockFetcher::with_body(b"v")),
            &EngineConfig::default(),
            dir.path(),
        );

        let outcome = orch.process("https://example.com/a.webm").await;
        orch.reset();

        let mut preview = PreviewState::default();
        assert!(!preview.apply(outcome, orch.latest_token()));
        assert!(!preview.is_bound());
    }

    #[test]
    fn test_new_url_clears_previous_result() {
        let mut preview = PreviewState::default();
        preview.present(Some(Source::Url("https://example.com/a".into())));
        let listener = preview.listen();
        preview.has_error = true;
        assert!(preview.set_status(listener, "50.00 % (Elapsed Time: 1.00 s)"));

        preview.present(Some(Source::Url("https://example.com/a".into())));
        assert!(preview.has_error(), "same URL keeps its state");

        preview.present(Some(Source::Url("https://example.com/b".into())));
        assert!(!preview.has_error());
        assert_eq!(preview.status(), "");
    }

    #[test]
    fn test_status_from_revoked_listener_ignored() {
        let mut preview = PreviewState::default();
        preview.present(Some(Source::Url("https://example.com/a".into())));
        let first = preview.listen();
        assert!(preview.set_status(first, "10.00 % (Elapsed Time: 1.00 s)"));

        preview.reset();
        assert!(!preview.is_listening(first));
        assert!(!preview.set_status(first, "20.00 % (Elapsed Time: 2.00 s)"));
        assert_eq!(preview.status(), "");

        preview.present(Some(Source::Url("https://example.com/a".into())));
        let second = preview.listen();
        assert!(!preview.set_status(first, "30.00 % (Elapsed Time: 3.00 s)"));
        assert!(preview.set_status(second, "40.00 % (Elapsed Time: 4.00 s)"));
        assert_eq!(preview.status(), "40.00 % (Elapsed Time: 4.00 s)");
    }
}
