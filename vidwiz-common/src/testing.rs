//! In-memory engine and fetchers for tests

use crate::engine::{EngineProgress, ProgressCallback, TranscodeEngine};
use crate::error::{EngineError, FetchError};
use crate::fetch::Fetcher;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// Engine whose "transcode" prefixes the input bytes with `converted:`
#[derive(Default)]
pub struct MockEngine {
    pub inits: AtomicUsize,
    pub execs: AtomicUsize,
    init_failures_left: AtomicUsize,
    fail_exec: bool,
    files: Mutex<HashMap<String, Vec<u8>>>,
    progress: Mutex<Option<ProgressCallback>>,
}

impl MockEngine {
    pub fn failing_exec() -> Self {
        Self {
            fail_exec: true,
            ..Self::default()
        }
    }

    pub fn failing_init_once() -> Self {
        Self {
            init_failures_left: AtomicUsize::new(1),
            ..Self::default()
        }
    }

    pub fn files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }

    pub fn report_progress(&self, ratio: f64, elapsed: Duration) {
        let callback = self.progress.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback(EngineProgress { ratio, elapsed });
        }
    }
}

#[async_trait]
impl TranscodeEngine for MockEngine {
    async fn initialize(&self, on_progress: ProgressCallback) -> Result<(), EngineError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        let failures = self.init_failures_left.load(Ordering::SeqCst);
        if failures > 0 {
            self.init_failures_left.store(failures - 1, Ordering::SeqCst);
            return Err(EngineError::Unavailable {
                path: "mock".into(),
                reason: "assets unreachable".to_string(),
            });
        }
        *self.progress.lock().unwrap() = Some(on_progress);
        Ok(())
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        self.files.lock().unwrap().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn exec(&self, args: &[String]) -> Result<(), EngineError> {
        self.execs.fetch_add(1, Ordering::SeqCst);
        if self.fail_exec {
            return Err(EngineError::CommandFailed {
                status: "exit status: 1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }

        let [flag, input, output] = args else {
            return Err(EngineError::InvalidName(args.join(" ")));
        };
        assert_eq!(flag, "-i");

        let mut files = self.files.lock().unwrap();
        let source = files
            .get(input)
            .cloned()
            .ok_or_else(|| EngineError::InvalidName(input.clone()))?;
        let mut converted = b"converted:".to_vec();
        converted.extend_from_slice(&source);
        files.insert(output.clone(), converted);
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::InvalidName(name.to_string()))
    }

    async fn remove_file(&self, name: &str) -> Result<(), EngineError> {
        self.files.lock().unwrap().remove(name);
        Ok(())
    }
}

/// Fetcher returning a fixed body for every URL
pub struct MockFetcher {
    pub calls: AtomicUsize,
    body: Vec<u8>,
}

impl MockFetcher {
    pub fn with_body(body: &[u8]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            body: body.to_vec(),
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

/// Fetcher that holds any URL containing `slow` until released
#[derive(Default)]
pub struct GatedFetcher {
    pub started: Notify,
    pub release: Notify,
}

#[async_trait]
impl Fetcher for GatedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url.contains("slow") {
            self.started.notify_one();
            self.release.notified().await;
        }
        Ok(url.as_bytes().to_vec())
    }
}
