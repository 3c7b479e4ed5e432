//! Error types shared by the wizard, the engine and the orchestrator.

use crate::wizard::Step;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a [`TranscodeEngine`](crate::engine::TranscodeEngine)
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("ffmpeg binary not usable ({path}): {reason}")]
    Unavailable { path: PathBuf, reason: String },

    #[error("engine used before initialization")]
    NotInitialized,

    #[error("invalid scratch file name: {0}")]
    InvalidName(String),

    #[error("engine command failed ({status}): {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by a [`Fetcher`](crate::fetch::Fetcher)
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// One conversion cycle failed.
///
/// The variants mirror where the cycle stopped; the UI collapses all of them
/// into a single error flag.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("engine initialization failed: {0}")]
    Init(#[source] EngineError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("transcode failed: {0}")]
    Transcode(#[source] EngineError),

    #[error("could not store converted media: {0}")]
    Media(#[from] std::io::Error),
}

/// Rejected wizard actions
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("{action} is not available on the {step:?} step")]
    IllegalAction { step: Step, action: &'static str },

    #[error("cannot advance from {0:?} yet")]
    NextDisabled(Step),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
