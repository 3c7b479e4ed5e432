//! Transcoding Engine
//!
//! The engine is an opaque capability: it is initialized once, accepts
//! input bytes into a private scratch namespace, runs a command over those
//! names and hands the output bytes back.

mod ffmpeg;

pub use ffmpeg::FfmpegEngine;

use crate::error::EngineError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Progress report emitted while a command runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineProgress {
    /// Completed fraction, 0.0 - 1.0
    pub ratio: f64,

    /// Media time processed so far
    pub elapsed: Duration,
}

impl EngineProgress {
    /// Human-readable status line, e.g. `"42.00 % (Elapsed Time: 3.50 s)"`
    pub fn message(&self) -> String {
        format!(
            "{:.2} % (Elapsed Time: {:.2} s)",
            self.ratio * 100.0,
            self.elapsed.as_secs_f64()
        )
    }
}

pub type ProgressCallback = Arc<dyn Fn(EngineProgress) + Send + Sync>;

/// Media transcoding capability.
///
/// Implementations must be safe to call from several conversion cycles at
/// once; callers keep their scratch names disjoint.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Prepare the engine and register the progress callback
    async fn initialize(&self, on_progress: ProgressCallback) -> Result<(), EngineError>;

    /// Store `bytes` in the scratch namespace under `name`
    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError>;

    /// Run a command; fails on unsupported or corrupt input
    async fn exec(&self, args: &[String]) -> Result<(), EngineError>;

    /// Read back a file from the scratch namespace
    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError>;

    /// Drop a scratch file. Engines without cleanup may ignore this.
    async fn remove_file(&self, _name: &str) -> Result<(), EngineError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_message() {
        let progress = EngineProgress {
            ratio: 0.4213,
            elapsed: Duration::from_micros(3_500_000),
        };
        assert_eq!(progress.message(), "42.13 % (Elapsed Time: 3.50 s)");
    }

    #[test]
    fn test_progress_message_zero() {
        let progress = EngineProgress {
            ratio: 0.0,
            elapsed: Duration::ZERO,
        };
        assert_eq!(progress.message(), "0.00 % (Elapsed Time: 0.00 s)");
    }
}
