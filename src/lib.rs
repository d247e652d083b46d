//! Build driver for a Go backend with a bundled Vite web UI.
//!
//! Stages shell out to `npm` and `go` through a [`process::CommandRunner`],
//! with progress estimated from their output, and fall back to installing
//! the Go toolchain when it is missing on Linux.

pub mod app;
pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod install;
pub mod menu;
pub mod platform;
pub mod process;
pub mod progress;
pub mod tasks;
pub mod ui;

pub use build::Pipeline;
pub use config::{BuildConfig, MirrorConfig, ToolchainConfig};
pub use error::{BuildError, NetworkError, Result};
pub use platform::BuildTarget;
