//! Build target detection and naming

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use once_cell::sync::OnceCell;

use crate::error::BuildError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Windows,
    Darwin,
    Linux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetArch {
    Amd64,
    Arm64,
    X86,
}

/// Operating system and architecture a backend binary is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTarget {
    pub os: TargetOs,
    pub arch: TargetArch,
}

/// Host detection runs once per process.
static HOST_TARGET: OnceCell<BuildTarget> = OnceCell::new();

impl BuildTarget {
    pub const fn new(os: TargetOs, arch: TargetArch) -> Self {
        Self { os, arch }
    }

    /// Target matching the machine we run on (cached after first call)
    pub fn host() -> Result<Self, BuildError> {
        HOST_TARGET
            .get_or_try_init(|| Self::from_parts(std::env::consts::OS, std::env::consts::ARCH))
            .copied()
    }

    /// Resolve an optional override against the host defaults.
    ///
    /// Each part falls back to the host independently, so `backend linux`
    /// keeps the host architecture. The host is only consulted when a part
    /// is missing.
    pub fn resolve(os: Option<&str>, arch: Option<&str>) -> Result<Self, BuildError> {
        Self::resolve_with(os, arch, Self::host)
    }

    fn resolve_with(
        os: Option<&str>,
        arch: Option<&str>,
        host: impl FnOnce() -> Result<Self, BuildError>,
    ) -> Result<Self, BuildError> {
        let os = os.map(TargetOs::from_str).transpose()?;
        let arch = arch.map(TargetArch::from_str).transpose()?;
        if let (Some(os), Some(arch)) = (os, arch) {
            return Ok(Self { os, arch });
        }
        let host = host()?;
        Ok(Self {
            os: os.unwrap_or(host.os),
            arch: arch.unwrap_or(host.arch),
        })
    }

    fn from_parts(os: &str, arch: &str) -> Result<Self, BuildError> {
        Ok(Self {
            os: os.parse()?,
            arch: arch.parse()?,
        })
    }

    /// `GOOS` value
    pub fn goos(&self) -> &'static str {
        match self.os {
            TargetOs::Windows => "windows",
            TargetOs::Darwin => "darwin",
            TargetOs::Linux => "linux",
        }
    }

    /// `GOARCH` value
    pub fn goarch(&self) -> &'static str {
        match self.arch {
            TargetArch::Amd64 => "amd64",
            TargetArch::Arm64 => "arm64",
            TargetArch::X86 => "386",
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os == TargetOs::Windows
    }

    /// Output binary path following the target's naming convention.
    ///
    /// `.exe` is appended for Windows when missing and removed for every
    /// other target.
    pub fn binary_path(&self, base: &Path) -> PathBuf {
        let has_exe = base
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"));
        match (self.is_windows(), has_exe) {
            (true, false) => {
                let mut name = base.as_os_str().to_os_string();
                name.push(".exe");
                PathBuf::from(name)
            }
            (false, true) => base.with_extension(""),
            _ => base.to_path_buf(),
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.goos(), self.goarch())
    }
}

impl FromStr for TargetOs {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" | "win32" => Ok(TargetOs::Windows),
            "darwin" | "macos" => Ok(TargetOs::Darwin),
            "linux" => Ok(TargetOs::Linux),
            other => Err(BuildError::Config(format!("unsupported target os: {other}"))),
        }
    }
}

impl FromStr for TargetArch {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "amd64" | "x64" | "x86_64" => Ok(TargetArch::Amd64),
            "arm64" | "aarch64" => Ok(TargetArch::Arm64),
            "386" | "x86" | "ia32" => Ok(TargetArch::X86),
            other => Err(BuildError::Config(format!("unsupported target arch: {other}"))),
        }
    }
}
