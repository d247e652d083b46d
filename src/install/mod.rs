//! Go toolchain installation
//!
//! Used by the backend stage when `go` is missing on a Linux host.
//!
//! - `download` - streaming archive download
//! - `privilege` - install root selection (direct, sudo or `~/.local`)
//! - `extract` - replacing `<root>/go` with the archive contents
//! - `persist` - shell startup file update
//! - `detection` - locating `go` and reading its version
//! - `toolchain` - the installer state machine tying these together

pub mod detection;
pub mod download;
pub mod extract;
pub mod persist;
pub mod privilege;
pub mod toolchain;

pub use detection::{go_version, locate_go};
pub use download::Downloader;
pub use persist::{Persisted, ShellKind};
pub use privilege::{InstallationPlan, PrivilegeProbe, SystemProbe};
pub use toolchain::{InstallStage, InstalledToolchain, ToolchainInstaller};
