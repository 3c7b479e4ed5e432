//! Conversion Orchestrator
//!
//! Runs one load -> fetch -> write -> exec -> read -> store cycle per
//! submitted URL. Every non-duplicate submission receives a monotonically
//! increasing [`RequestToken`]; a cycle that finishes after a newer one was
//! submitted reports [`ProcessOutcome::Superseded`] instead of a result, so
//! the player is only ever bound to the most recent URL.

use crate::config::EngineConfig;
use crate::engine::{EngineProgress, ProgressCallback, TranscodeEngine};
use crate::error::{ConversionError, EngineError};
use crate::fetch::Fetcher;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::TempPath;
use tokio::sync::{watch, OnceCell};

/// Identifies one conversion cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Converted media ready to hand to a player.
///
/// The backing file is deleted once the last clone is dropped.
#[derive(Debug, Clone)]
pub struct PlayableMedia {
    file: Arc<TempPath>,
    mime: &'static str,
}

impl PlayableMedia {
    /// Write `bytes` to a fresh file in `dir`, named after `output_name`'s extension
    pub async fn store(dir: &Path, output_name: &str, bytes: &[u8]) -> std::io::Result<Self> {
        let extension = Path::new(output_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");

        tokio::fs::create_dir_all(dir).await?;
        let file = tempfile::Builder::new()
            .prefix("converted-")
            .suffix(&format!(".{extension}"))
            .tempfile_in(dir)?
            .into_temp_path();
        tokio::fs::write(&file, bytes).await?;

        Ok(Self {
            file: Arc::new(file),
            mime: mime_for_extension(extension),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }
}

fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "ogv" => "video/ogg",
        _ => "application/octet-stream",
    }
}

/// Result of one [`ConversionOrchestrator::process`] call
#[derive(Debug)]
pub enum ProcessOutcome {
    /// Empty URL; nothing to do
    Idle,
    /// Same URL as the last processed one; nothing re-run
    Unchanged,
    Converted {
        token: RequestToken,
        media: PlayableMedia,
    },
    Failed {
        token: RequestToken,
        error: ConversionError,
    },
    /// Finished, but a newer request exists; result discarded
    Superseded { token: RequestToken },
}

impl ProcessOutcome {
    pub fn token(&self) -> Option<RequestToken> {
        match self {
            ProcessOutcome::Idle | ProcessOutcome::Unchanged => None,
            ProcessOutcome::Converted { token, .. }
            | ProcessOutcome::Failed { token, .. }
            | ProcessOutcome::Superseded { token } => Some(*token),
        }
    }
}

#[derive(Debug, Default)]
struct CycleState {
    last_processed: Option<String>,
    latest: u64,
}

pub struct ConversionOrchestrator<E, F> {
    engine: Arc<E>,
    fetcher: Arc<F>,
    input_name: String,
    output_name: String,
    media_dir: PathBuf,
    engine_ready: OnceCell<()>,
    /// Held while a cycle uses the engine; one command runs at a time
    engine_busy: tokio::sync::Mutex<()>,
    /// Token of the cycle that last took the engine
    engine_owner: Arc<AtomicU64>,
    state: Arc<Mutex<CycleState>>,
    status: Arc<watch::Sender<String>>,
}

impl<E, F> ConversionOrchestrator<E, F>
where
    E: TranscodeEngine,
    F: Fetcher,
{
    pub fn new(engine: Arc<E>, fetcher: Arc<F>, config: &EngineConfig, media_dir: impl Into<PathBuf>) -> Self {
        let (status, _) = watch::channel(String::new());
        Self {
            engine,
            fetcher,
            input_name: config.input_name.clone(),
            output_name: config.output_name.clone(),
            media_dir: media_dir.into(),
            engine_ready: OnceCell::new(),
            engine_busy: tokio::sync::Mutex::new(()),
            engine_owner: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(CycleState::default())),
            status: Arc::new(status),
        }
    }

    /// Progress status lines, e.g. `"42.00 % (Elapsed Time: 3.50 s)"`
    pub fn subscribe_status(&self) -> watch::Receiver<String> {
        self.status.subscribe()
    }

    /// Newest token handed out, if any
    pub fn latest_token(&self) -> Option<RequestToken> {
        let latest = self.lock_state().latest;
        (latest > 0).then_some(RequestToken(latest))
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.lock_state().latest == token.0
    }

    /// Forget the processed URL and invalidate in-flight cycles
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.last_processed = None;
        state.latest += 1;
        self.status.send_replace(String::new());
        tracing::debug!("Conversion state reset");
    }

    /// Make sure the engine is initialized. Only the first successful call
    /// does any work; a failed attempt is retried on the next call.
    ///
    /// Engine progress is published only while the engine belongs to the
    /// latest cycle.
    pub async fn ensure_engine(&self) -> Result<(), ConversionError> {
        let status = Arc::clone(&self.status);
        let state = Arc::clone(&self.state);
        let owner = Arc::clone(&self.engine_owner);
        let on_progress: ProgressCallback = Arc::new(move |progress: EngineProgress| {
            if owner.load(Ordering::SeqCst) == lock_cycles(&state).latest {
                status.send_replace(progress.message());
            }
        });

        self.engine_ready
            .get_or_try_init(|| async {
                tracing::info!("Initializing transcoding engine");
                self.engine.initialize(on_progress).await
            })
            .await
            .map(|_| ())
            .map_err(ConversionError::Init)
    }

    /// Run the conversion pipeline for `url` unless it was just processed
    pub async fn process(&self, url: &str) -> ProcessOutcome {
        let url = url.trim();
        if url.is_empty() {
            return ProcessOutcome::Idle;
        }

        if let Err(error) = self.ensure_engine().await {
            let token = self.issue_token();
            tracing::error!("Conversion {} failed: {}", token, error);
            return ProcessOutcome::Failed { token, error };
        }

        let Some(token) = self.claim(url) else {
            tracing::debug!("Skipping already processed URL {}", url);
            return ProcessOutcome::Unchanged;
        };

        tracing::info!("Conversion {} started for {}", token, url);
        let result = self.convert(token, url).await;

        if !self.is_current(token) {
            tracing::info!("Conversion {} superseded, discarding result", token);
            return ProcessOutcome::Superseded { token };
        }

        match result {
            Ok(Some(media)) => {
                tracing::info!("Conversion {} ready: {}", token, media.path().display());
                ProcessOutcome::Converted { token, media }
            }
            Ok(None) => ProcessOutcome::Superseded { token },
            Err(error) => {
                tracing::error!("Conversion {} failed: {}", token, error);
                ProcessOutcome::Failed { token, error }
            }
        }
    }

    /// Record `url` as processed and hand out its token, or `None` if it is
    /// the URL already processed
    fn claim(&self, url: &str) -> Option<RequestToken> {
        let mut state = self.lock_state();
        if state.last_processed.as_deref() == Some(url) {
            return None;
        }
        state.last_processed = Some(url.to_string());
        state.latest += 1;
        Some(RequestToken(state.latest))
    }

    fn issue_token(&self) -> RequestToken {
        let mut state = self.lock_state();
        state.latest += 1;
        RequestToken(state.latest)
    }

    /// Fetch and transcode `url`. Returns `None` when the cycle was
    /// superseded before it got the engine.
    async fn convert(&self, token: RequestToken, url: &str) -> Result<Option<PlayableMedia>, ConversionError> {
        let input = format!("job-{}-{}", token.0, self.input_name);
        let output = format!("job-{}-{}", token.0, self.output_name);

        let bytes = self.fetcher.fetch(url).await?;

        let _engine = self.engine_busy.lock().await;
        if !self.is_current(token) {
            tracing::debug!("Conversion {} dropped before transcoding", token);
            return Ok(None);
        }
        self.engine_owner.store(token.0, Ordering::SeqCst);
        self.status.send_replace(String::new());

        let transcoded: Result<Vec<u8>, EngineError> = async {
            self.engine.write_file(&input, &bytes).await?;
            self.engine
                .exec(&["-i".to_string(), input.clone(), output.clone()])
                .await?;
            self.engine.read_file(&output).await
        }
        .await;

        for name in [&input, &output] {
            if let Err(e) = self.engine.remove_file(name).await {
                tracing::warn!("Could not remove scratch file {}: {}", name, e);
            }
        }

        let data = transcoded.map_err(ConversionError::Transcode)?;
        let media = PlayableMedia::store(&self.media_dir, &self.output_name, &data).await?;
        Ok(Some(media))
    }

    fn lock_state(&self) -> MutexGuard<'_, CycleState> {
        lock_cycles(&self.state)
    }
}

fn lock_cycles(state: &Mutex<CycleState>) -> MutexGuard<'_, CycleState> {
    // Two plain fields; a panic mid-update cannot leave them torn
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::HttpFetcher;
    use crate::testing::{GatedFetcher, MockEngine, MockFetcher};
    use std::sync::atomic::Ordering;

    fn orchestrator<F: Fetcher>(
        engine: Arc<MockEngine>,
        fetcher: Arc<F>,
        dir: &Path,
    ) -> ConversionOrchestrator<MockEngine, F> {
        ConversionOrchestrator::new(engine, fetcher, &EngineConfig::default(), dir)
    }

    #[tokio::test]
    async fn test_converts_and_stores_media() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let fetcher = Arc::new(MockFetcher::with_body(b"webm-bytes"));
        let orch = orchestrator(engine.clone(), fetcher.clone(), dir.path());

        let outcome = orch.process("https://example.com/sample.webm").await;
        let ProcessOutcome::Converted { token, media } = outcome else {
            panic!("expected conversion, got {outcome:?}");
        };

        assert!(orch.is_current(token));
        assert_eq!(media.mime(), "video/mp4");
        assert_eq!(std::fs::read(media.path()).unwrap(), b"converted:webm-bytes");
        assert_eq!(engine.inits.load(Ordering::SeqCst), 1);
        assert_eq!(engine.execs.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(engine.files().is_empty(), "scratch files should be removed");
    }

    #[tokio::test]
    async fn test_same_url_processed_once() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let fetcher = Arc::new(MockFetcher::with_body(b"v"));
        let orch = orchestrator(engine.clone(), fetcher.clone(), dir.path());

        let url = "https://example.com/sample.webm";
        assert!(matches!(orch.process(url).await, ProcessOutcome::Converted { .. }));
        assert!(matches!(orch.process(url).await, ProcessOutcome::Unchanged));

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.execs.load(Ordering::SeqCst), 1);
        assert_eq!(engine.inits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_engine_initialized_once_across_urls() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let orch = orchestrator(engine.clone(), Arc::new(MockFetcher::with_body(b"v")), dir.path());

        orch.process("https://example.com/a.webm").await;
        orch.process("https://example.com/b.webm").await;

        assert_eq!(engine.inits.load(Ordering::SeqCst), 1);
        assert_eq!(engine.execs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_url_is_idle() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let orch = orchestrator(engine.clone(), Arc::new(MockFetcher::with_body(b"v")), dir.path());

        assert!(matches!(orch.process("").await, ProcessOutcome::Idle));
        assert_eq!(engine.inits.load(Ordering::SeqCst), 0);
        assert_eq!(orch.latest_token(), None);
    }

    #[tokio::test]
    async fn test_bad_url_fails() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let fetcher = Arc::new(HttpFetcher::new(&Default::default()).unwrap());
        let orch = orchestrator(engine.clone(), fetcher, dir.path());

        let outcome = orch.process("bad://url").await;
        assert!(matches!(
            outcome,
            ProcessOutcome::Failed {
                error: ConversionError::Fetch(FetchError::UnsupportedScheme(_)),
                ..
            }
        ));
        assert_eq!(engine.execs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transcode_failure_reported() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::failing_exec());
        let orch = orchestrator(engine.clone(), Arc::new(MockFetcher::with_body(b"junk")), dir.path());

        let outcome = orch.process("https://example.com/corrupt.webm").await;
        assert!(matches!(
            outcome,
            ProcessOutcome::Failed { error: ConversionError::Transcode(_), .. }
        ));
        assert!(engine.files().is_empty());
    }

    #[tokio::test]
    async fn test_init_failure_retried() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::failing_init_once());
        let orch = orchestrator(engine.clone(), Arc::new(MockFetcher::with_body(b"v")), dir.path());

        let url = "https://example.com/a.webm";
        assert!(matches!(
            orch.process(url).await,
            ProcessOutcome::Failed { error: ConversionError::Init(_), .. }
        ));
        assert!(matches!(orch.process(url).await, ProcessOutcome::Converted { .. }));
        assert_eq!(engine.inits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reset_allows_same_url_again() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let orch = orchestrator(engine.clone(), Arc::new(MockFetcher::with_body(b"v")), dir.path());

        let url = "https://example.com/a.webm";
        orch.process(url).await;
        orch.reset();
        assert!(matches!(orch.process(url).await, ProcessOutcome::Converted { .. }));
        assert_eq!(engine.execs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_cycle_superseded() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let fetcher = Arc::new(GatedFetcher::default());
        let orch = Arc::new(orchestrator(engine.clone(), fetcher.clone(), dir.path()));

        let slow = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.process("https://example.com/slow.webm").await })
        };
        fetcher.started.notified().await;

        let fast = orch.process("https://example.com/fast.webm").await;
        let ProcessOutcome::Converted { token: fast_token, .. } = fast else {
            panic!("expected conversion, got {fast:?}");
        };

        fetcher.release.notify_one();
        let slow = slow.await.unwrap();
        let ProcessOutcome::Superseded { token: slow_token } = slow else {
            panic!("expected superseded, got {slow:?}");
        };

        assert!(slow_token < fast_token);
        assert_eq!(orch.latest_token(), Some(fast_token));
    }

    #[tokio::test]
    async fn test_reset_supersedes_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let fetcher = Arc::new(GatedFetcher::default());
        let orch = Arc::new(orchestrator(engine, fetcher.clone(), dir.path()));

        let slow = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.process("https://example.com/slow.webm").await })
        };
        fetcher.started.notified().await;
        orch.reset();
        fetcher.release.notify_one();

        assert!(matches!(slow.await.unwrap(), ProcessOutcome::Superseded { .. }));
    }

    #[tokio::test]
    async fn test_progress_published() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let orch = orchestrator(engine.clone(), Arc::new(MockFetcher::with_body(b"v")), dir.path());
        let status = orch.subscribe_status();

        orch.ensure_engine().await.unwrap();
        engine.report_progress(0.5, std::time::Duration::from_secs(2));
        assert_eq!(*status.borrow(), "50.00 % (Elapsed Time: 2.00 s)");
    }

    #[tokio::test]
    async fn test_superseded_cycle_keeps_latest_status() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let fetcher = Arc::new(GatedFetcher::default());
        let orch = Arc::new(orchestrator(engine.clone(), fetcher.clone(), dir.path()));
        let status = orch.subscribe_status();

        let slow = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.process("https://example.com/slow.webm").await })
        };
        fetcher.started.notified().await;

        let fast = orch.process("https://example.com/fast.webm").await;
        assert!(matches!(fast, ProcessOutcome::Converted { .. }));
        engine.report_progress(1.0, std::time::Duration::from_secs(4));
        assert_eq!(*status.borrow(), "100.00 % (Elapsed Time: 4.00 s)");

        fetcher.release.notify_one();
        assert!(matches!(slow.await.unwrap(), ProcessOutcome::Superseded { .. }));

        assert_eq!(*status.borrow(), "100.00 % (Elapsed Time: 4.00 s)");
        assert_eq!(engine.execs.load(Ordering::SeqCst), 1, "stale cycle must not transcode");
    }

    #[tokio::test]
    async fn test_progress_after_reset_not_published() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::default());
        let orch = orchestrator(engine.clone(), Arc::new(MockFetcher::with_body(b"v")), dir.path());
        let status = orch.subscribe_status();

        orch.process("https://example.com/a.webm").await;
        orch.reset();
        engine.report_progress(0.5, std::time::Duration::from_secs(2));

        assert_eq!(*status.borrow(), "");
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension("MP4"), "video/mp4");
        assert_eq!(mime_for_extension("webm"), "video/webm");
        assert_eq!(mime_for_extension("xyz"), "application/octet-stream");
    }
}
