//! Conversion Worker
//!
//! ARCHITECTURE: The orchestrator runs on a Tokio runtime whose worker
//! threads are separate from the GTK main thread. Results travel back over
//! std::sync::mpsc; the GTK side polls the receiver with
//! glib::timeout_add_local and applies them to widgets.

use anyhow::{Context, Result};
use std::sync::mpsc;
use std::sync::Arc;
use vidwiz_common::config::VidwizConfig;
use vidwiz_common::engine::FfmpegEngine;
use vidwiz_common::fetch::HttpFetcher;
use vidwiz_common::orchestrator::{ConversionOrchestrator, ProcessOutcome, RequestToken};
use vidwiz_common::paths;

pub type AppOrchestrator = ConversionOrchestrator<FfmpegEngine, HttpFetcher>;

/// Messages sent from the worker to the GTK main thread
#[derive(Debug)]
pub enum WorkerMessage {
    /// Engine progress line
    Status(String),
    /// The cycle ended
    Finished(ProcessOutcome),
}

pub struct ConversionWorker {
    runtime: tokio::runtime::Runtime,
    orchestrator: Arc<AppOrchestrator>,
}

impl ConversionWorker {
    pub fn new(config: &VidwizConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("vidwiz-worker")
            .enable_all()
            .build()
            .context("Failed to initialize async runtime")?;

        let scratch = paths::scratch_root();
        let engine = Arc::new(FfmpegEngine::new(&config.engine.ffmpeg, &scratch));
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch).context("Failed to build HTTP client")?);
        let orchestrator = Arc::new(ConversionOrchestrator::new(engine, fetcher, &config.engine, scratch));

        Ok(Self { runtime, orchestrator })
    }

    /// Start a conversion cycle for `url`
    pub fn submit(&self, url: String) -> mpsc::Receiver<WorkerMessage> {
        let (sender, receiver) = mpsc::channel::<WorkerMessage>();
        let orchestrator = Arc::clone(&self.orchestrator);

        self.runtime.spawn(async move {
            let mut status = orchestrator.subscribe_status();
            let status_sender = sender.clone();
            let forwarder = tokio::spawn(async move {
                while status.changed().await.is_ok() {
                    let line = status.borrow_and_update().clone();
                    if status_sender.send(WorkerMessage::Status(line)).is_err() {
                        break; // Receiver dropped
                    }
                }
            });

            let outcome = orchestrator.process(&url).await;
            forwarder.abort();
            let _ = sender.send(WorkerMessage::Finished(outcome));
        });

        receiver
    }

    pub fn latest_token(&self) -> Option<RequestToken> {
        self.orchestrator.latest_token()
    }

    /// Forget the processed URL; in-flight results will be discarded
    pub fn reset(&self) {
        self.orchestrator.reset();
    }
}
