//! Vidwiz Runtime Library
//!
//! This library provides the desktop front end:
//! - Conversion worker bridging Tokio and the GTK main loop
//! - GUI wizard

// Re-export from vidwiz-common for convenience
pub use vidwiz_common::{config, engine, fetch, orchestrator, paths, preview, transition, wizard};

pub mod ui;
pub mod worker;
