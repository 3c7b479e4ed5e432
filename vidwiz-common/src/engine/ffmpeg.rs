//! ffmpeg subprocess engine
//!
//! The scratch namespace is a private temporary directory; `exec` runs the
//! ffmpeg binary inside it with machine-readable progress on stdout.

use super::{EngineProgress, ProgressCallback, TranscodeEngine};
use crate::error::EngineError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Number of stderr lines kept for error reports
const STDERR_TAIL_LINES: usize = 12;

struct Ready {
    workdir: TempDir,
    on_progress: ProgressCallback,
}

pub struct FfmpegEngine {
    binary: PathBuf,
    scratch_parent: PathBuf,
    ready: OnceLock<Ready>,
}

impl FfmpegEngine {
    pub fn new(binary: impl Into<PathBuf>, scratch_parent: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            scratch_parent: scratch_parent.into(),
            ready: OnceLock::new(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run `ffmpeg -version` and return its first line
    pub async fn probe(&self) -> Result<String, EngineError> {
        let output = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        if !output.status.success() {
            return Err(self.unavailable(format!("-version exited with {}", output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    fn unavailable(&self, reason: String) -> EngineError {
        EngineError::Unavailable {
            path: self.binary.clone(),
            reason,
        }
    }

    fn ready(&self) -> Result<&Ready, EngineError> {
        self.ready.get().ok_or(EngineError::NotInitialized)
    }

    fn scratch_path(&self, name: &str) -> Result<PathBuf, EngineError> {
        validate_name(name)?;
        Ok(self.ready()?.workdir.path().join(name))
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    async fn initialize(&self, on_progress: ProgressCallback) -> Result<(), EngineError> {
        if self.ready.get().is_some() {
            return Ok(());
        }

        let version = self.probe().await?;
        tracing::info!("Using {} ({})", self.binary.display(), version);

        tokio::fs::create_dir_all(&self.scratch_parent).await?;
        let workdir = tempfile::Builder::new()
            .prefix("engine-")
            .tempdir_in(&self.scratch_parent)?;
        tracing::debug!("Engine scratch dir: {}", workdir.path().display());

        // A concurrent initializer may have won; its state is equivalent.
        let _ = self.ready.set(Ready {
            workdir,
            on_progress,
        });
        Ok(())
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        let path = self.scratch_path(name)?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn exec(&self, args: &[String]) -> Result<(), EngineError> {
        let ready = self.ready()?;
        tracing::debug!("ffmpeg {}", args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(["-hide_banner", "-nostdin", "-y", "-progress", "pipe:1"])
            .args(args)
            .current_dir(ready.workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.unavailable(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| self.unavailable("stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| self.unavailable("stderr not captured".to_string()))?;

        let total = Arc::new(Mutex::new(None::<Duration>));
        let stderr_task = {
            let total = Arc::clone(&total);
            tokio::spawn(async move {
                let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if let Some(duration) = parse_duration_line(&line) {
                        if let Ok(mut slot) = total.lock() {
                            slot.get_or_insert(duration);
                        }
                    }
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                Vec::from(tail).join("\n")
            })
        };

        let mut out_time = Duration::ZERO;
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            match key {
                // out_time_ms is microseconds as well
                "out_time_us" | "out_time_ms" => {
                    if let Ok(micros) = value.parse::<i64>() {
                        out_time = Duration::from_micros(micros.max(0) as u64);
                    }
                }
                "progress" => {
                    let known_total = total.lock().map(|slot| *slot).unwrap_or(None);
                    let ratio = if value == "end" {
                        1.0
                    } else {
                        progress_ratio(out_time, known_total)
                    };
                    (ready.on_progress)(EngineProgress {
                        ratio,
                        elapsed: out_time,
                    });
                }
                _ => {}
            }
        }

        let status = child.wait().await?;
        let stderr_tail = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(EngineError::CommandFailed {
                status: status.to_string(),
                stderr: stderr_tail,
            })
        }
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        let path = self.scratch_path(name)?;
        Ok(tokio::fs::read(&path).await?)
    }

    async fn remove_file(&self, name: &str) -> Result<(), EngineError> {
        let path = self.scratch_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Scratch names are plain file names; no directories, no traversal
fn validate_name(name: &str) -> Result<(), EngineError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        Err(EngineError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

fn progress_ratio(out_time: Duration, total: Option<Duration>) -> f64 {
    match total {
        Some(total) if !total.is_zero() => {
            (out_time.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

/// Extract the input duration from an ffmpeg header line such as
/// `  Duration: 00:01:02.50, start: 0.000000, bitrate: 1205 kb/s`
fn parse_duration_line(line: &str) -> Option<Duration> {
    let rest = line.trim_start().strip_prefix("Duration:")?;
    let stamp = rest.split(',').next()?.trim();
    parse_timestamp(stamp)
}

/// `HH:MM:SS.frac` to a duration
fn parse_timestamp(stamp: &str) -> Option<Duration> {
    let mut parts = stamp.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(Duration::from_secs(hours * 3600 + minutes * 60) + Duration::from_secs_f64(seconds))
}
