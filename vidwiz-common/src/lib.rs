//! Vidwiz Common Library
//!
//! Everything below the GTK layer: the wizard step machine, step
//! transitions, the conversion orchestrator and its engine/fetch
//! capabilities, configuration and paths.
//! This crate has NO GTK4 dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod paths;
pub mod preview;
pub mod transition;
pub mod wizard;

#[cfg(test)]
mod testing;
