//! realprep library exports.
//!
//! The binary in `main.rs` is a thin clap wrapper over these modules;
//! integration tests link against them directly.

pub mod apt;
pub mod clean;
pub mod commands;
pub mod config;
pub mod plan;
pub mod preflight;
pub mod process;
pub mod sdk;
pub mod source;
pub mod state;
pub mod timing;
pub mod udev;
pub mod verify;
