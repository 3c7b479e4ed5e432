//! UI Module - GTK4 + Libadwaita Interface
//!
//! A single window hosting the three-step source wizard.

pub mod app;
pub mod window;
pub mod wizard;
pub mod pages;
