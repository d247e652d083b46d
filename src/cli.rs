use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "hub-builder",
    version,
    about = "Build driver for the one-hub backend and web UI using domestic mirrors"
)]
pub struct Args {
    /// Build configuration file (default: <root>/hub-builder.toml when present)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Project root containing go.mod and web/
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Sub-commands; without one an interactive menu is shown
    #[command(subcommand)]
    pub sub: Option<Cmd>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Install web dependencies and bundle the frontend
    Web,
    /// Compile the Go backend (defaults to the host platform)
    Backend {
        /// Target OS: windows|win32, darwin|macos, linux
        os: Option<String>,
        /// Target arch: amd64|x64, arm64|aarch64, 386|ia32
        arch: Option<String>,
    },
    /// Frontend, then backend for the host
    All,
    /// Remove build outputs and node_modules
    Clean,
    /// Remove build outputs, keep node_modules
    CleanBuild,
    /// Start the built backend
    Run,
    /// Show the mirror configuration
    Mirrors,
    /// Create config.yaml from config.example.yaml with fresh secrets
    InitConfig,
}
