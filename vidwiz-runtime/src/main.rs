//! Vidwiz - pick a video source, convert it, preview it
//!
//! This is the main entry point. It handles:
//! 1. CLI argument parsing (--config, --ffmpeg, --check)
//! 2. Loading the optional configuration file
//! 3. Launching the GTK4/Libadwaita wizard, or probing the engine headless

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use vidwiz_common::config::VidwizConfig;
use vidwiz_common::engine::FfmpegEngine;
use vidwiz_common::paths;
use vidwiz_runtime::ui;

/// Vidwiz - video source wizard
#[derive(Parser, Debug)]
#[command(name = "vidwiz")]
#[command(about = "Pick a video by URL or file, convert it and preview it")]
#[command(version)]
struct Args {
    /// Configuration file (default: ~/.config/vidwiz/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// ffmpeg executable to use instead of the configured one
    #[arg(long, value_name = "PATH")]
    ffmpeg: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Check that the transcoding engine is usable and exit
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    let startup_time = std::time::Instant::now();

    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let _ = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .try_init();

    info!("Vidwiz v{}", env!("CARGO_PKG_VERSION"));

    let mut config = VidwizConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(ffmpeg) = args.ffmpeg {
        config.engine.ffmpeg = ffmpeg;
    }

    if args.check {
        return run_check(&config);
    }

    run_gui(config, startup_time)
}

/// Probe the ffmpeg binary without starting the GUI
fn run_check(config: &VidwizConfig) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let engine = FfmpegEngine::new(&config.engine.ffmpeg, paths::scratch_root());

    match rt.block_on(engine.probe()) {
        Ok(version) => {
            println!("✅ {}", version);
            println!("   binary: {}", engine.binary().display());
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Transcoding engine unavailable: {}", e);
            eprintln!();
            eprintln!("Install ffmpeg or point --ffmpeg at an existing binary.");
            std::process::exit(1);
        }
    }
}

fn run_gui(config: VidwizConfig, startup_time: std::time::Instant) -> Result<()> {
    if std::env::var("DISPLAY").is_err() && std::env::var("WAYLAND_DISPLAY").is_err() {
        eprintln!("Error: No display server detected (X11 or Wayland).");
        eprintln!();
        eprintln!("To only verify the ffmpeg setup, run:");
        eprintln!("  {} --check", std::env::current_exe()?.display());
        std::process::exit(1);
    }

    if let Err(e) = gtk::init() {
        eprintln!("Failed to initialize GTK4: {}", e);
        eprintln!("Please ensure GTK4 is installed on your system.");
        std::process::exit(1);
    }

    if let Err(e) = adw::init() {
        eprintln!("Failed to initialize Libadwaita: {}", e);
        eprintln!("Please ensure Libadwaita is installed on your system.");
        std::process::exit(1);
    }

    info!("GTK4/Libadwaita initialized in {:?}", startup_time.elapsed());

    let app = ui::app::VidwizApplication::new(config);

    let exit_code = app.run();

    std::process::exit(exit_code.into());
}
