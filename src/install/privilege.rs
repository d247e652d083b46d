//! Choosing where the toolchain goes and whether that needs `sudo`

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tokio::process::Command;

/// System-wide install root tried first.
pub const DEFAULT_INSTALL_ROOT: &str = "/usr/local";

/// Environment facts the plan depends on.
pub trait PrivilegeProbe {
    /// Whether the current user may create entries in `dir`
    fn is_writable(&self, dir: &Path) -> bool;
    /// Whether `sudo` is available
    fn has_elevation_helper(&self) -> bool;
}

/// Probe backed by the real system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl PrivilegeProbe for SystemProbe {
    #[cfg(unix)]
    fn is_writable(&self, dir: &Path) -> bool {
        use nix::unistd::{AccessFlags, access};
        access(dir, AccessFlags::W_OK).is_ok()
    }

    #[cfg(not(unix))]
    fn is_writable(&self, dir: &Path) -> bool {
        std::fs::metadata(dir).is_ok_and(|m| !m.permissions().readonly())
    }

    fn has_elevation_helper(&self) -> bool {
        which::which("sudo").is_ok()
    }
}

/// Where one install attempt puts the toolchain and how it gets there.
///
/// Computed once per attempt; every file operation of the attempt uses the
/// command form it dictates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationPlan {
    pub install_root: PathBuf,
    pub requires_elevation: bool,
    pub uses_user_local: bool,
}

impl InstallationPlan {
    /// Writable default root, then `sudo`, then `<home>/.local`
    pub fn compute(default_root: &Path, home: &Path, probe: &impl PrivilegeProbe) -> Self {
        if probe.is_writable(default_root) {
            log::info!("{} is writable, installing directly", default_root.display());
            return Self {
                install_root: default_root.to_path_buf(),
                requires_elevation: false,
                uses_user_local: false,
            };
        }
        if probe.has_elevation_helper() {
            log::info!("{} needs elevation, using sudo", default_root.display());
            return Self {
                install_root: default_root.to_path_buf(),
                requires_elevation: true,
                uses_user_local: false,
            };
        }
        let install_root = home.join(".local");
        log::info!(
            "no write access to {} and no sudo, falling back to {}",
            default_root.display(),
            install_root.display()
        );
        Self {
            install_root,
            requires_elevation: false,
            uses_user_local: true,
        }
    }

    /// `<root>/go`
    pub fn goroot(&self) -> PathBuf {
        self.install_root.join("go")
    }

    pub fn go_bin(&self) -> PathBuf {
        self.goroot().join("bin")
    }

    /// `program args..`, prefixed with `sudo` when the plan is elevated
    pub fn command<I, S>(&self, program: &str, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = if self.requires_elevation {
            let mut cmd = Command::new("sudo");
            cmd.arg(program);
            cmd
        } else {
            Command::new(program)
        };
        cmd.args(args);
        cmd
    }
}
