//! Go toolchain self-installation
//!
//! Download the official archive from a mirror, pick an install root the
//! current user can actually write to, unpack, persist the environment in
//! the user's shell startup file and verify the result.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::detection;
use super::download::Downloader;
use super::extract;
use super::persist::{self, Persisted, ShellKind};
use super::privilege::{DEFAULT_INSTALL_ROOT, InstallationPlan, PrivilegeProbe, SystemProbe};
use crate::config::{BuildConfig, MirrorConfig, ToolchainConfig};
use crate::error::{BuildError, Result};
use crate::platform::BuildTarget;
use crate::process::Environment;
use crate::ui;

/// Installer progress, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    Detecting,
    Downloading,
    PlanningTarget,
    Extracting,
    ConfiguringEnvironment,
    ConfiguringPersistence,
    Verifying,
    Success,
    Failed,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallStage::Detecting => "detecting",
            InstallStage::Downloading => "downloading",
            InstallStage::PlanningTarget => "planning install target",
            InstallStage::Extracting => "extracting",
            InstallStage::ConfiguringEnvironment => "configuring environment",
            InstallStage::ConfiguringPersistence => "configuring shell profile",
            InstallStage::Verifying => "verifying",
            InstallStage::Success => "success",
            InstallStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A toolchain on disk plus the variables that make it usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledToolchain {
    pub goroot: PathBuf,
    pub gopath: PathBuf,
    pub bin_dir: PathBuf,
    pub goproxy: String,
    pub gosumdb: String,
    /// `go version` output, filled in by verification
    pub version: Option<String>,
}

impl InstalledToolchain {
    pub fn at(goroot: &Path, gopath: &Path, goproxy: &str, gosumdb: &str) -> Self {
        Self {
            goroot: goroot.to_path_buf(),
            gopath: gopath.to_path_buf(),
            bin_dir: goroot.join("bin"),
            goproxy: goproxy.to_string(),
            gosumdb: gosumdb.to_string(),
            version: None,
        }
    }

    /// Overlay to merge into the build environment
    pub fn environment(&self) -> Environment {
        let mut env = Environment::new();
        env.set("GOROOT", self.goroot.to_string_lossy());
        env.set("GOPATH", self.gopath.to_string_lossy());
        env.set("GOPROXY", self.goproxy.clone());
        env.set("GOSUMDB", self.gosumdb.clone());
        env.prepend_path(self.bin_dir.clone());
        env
    }
}

/// Installs Go into a root chosen by [`InstallationPlan`].
pub struct ToolchainInstaller<P: PrivilegeProbe = SystemProbe> {
    toolchain: ToolchainConfig,
    mirrors: MirrorConfig,
    host: BuildTarget,
    home: PathBuf,
    default_root: PathBuf,
    shell: ShellKind,
    probe: P,
    show_progress: bool,
    stage: InstallStage,
}

impl ToolchainInstaller<SystemProbe> {
    pub fn new(config: &BuildConfig) -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| BuildError::Config("cannot determine home directory".into()))?;
        Ok(Self {
            toolchain: config.toolchain.clone(),
            mirrors: config.mirrors.clone(),
            host: BuildTarget::host()?,
            home,
            default_root: PathBuf::from(DEFAULT_INSTALL_ROOT),
            shell: ShellKind::from_env(),
            probe: SystemProbe,
            show_progress: true,
            stage: InstallStage::Detecting,
        })
    }
}

impl<P: PrivilegeProbe> ToolchainInstaller<P> {
    pub fn with_probe<Q: PrivilegeProbe>(self, probe: Q) -> ToolchainInstaller<Q> {
        ToolchainInstaller {
            toolchain: self.toolchain,
            mirrors: self.mirrors,
            host: self.host,
            home: self.home,
            default_root: self.default_root,
            shell: self.shell,
            probe,
            show_progress: self.show_progress,
            stage: self.stage,
        }
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    pub fn with_default_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.default_root = root.into();
        self
    }

    pub fn with_shell(mut self, shell: ShellKind) -> Self {
        self.shell = shell;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn stage(&self) -> InstallStage {
        self.stage
    }

    /// `{mirror}go{version}.{goos}-{goarch}.tar.gz` for the host
    pub fn archive_url(&self) -> String {
        format!(
            "{}go{}.{}-{}.tar.gz",
            self.toolchain.archive_mirror,
            self.toolchain.go_version,
            self.host.goos(),
            self.host.goarch()
        )
    }

    fn enter(&mut self, stage: InstallStage) {
        log::info!("toolchain install: {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    /// Run the whole install. `env` is the caller's build environment; it is
    /// only read, the returned toolchain carries the additions.
    pub async fn install(&mut self, env: &Environment) -> Result<InstalledToolchain> {
        match self.run(env).await {
            Ok(toolchain) => {
                self.enter(InstallStage::Success);
                Ok(toolchain)
            }
            Err(e) => {
                self.enter(InstallStage::Failed);
                log::error!("toolchain install failed: {e}");
                Err(e)
            }
        }
    }

    async fn run(&mut self, env: &Environment) -> Result<InstalledToolchain> {
        self.enter(InstallStage::Downloading);
        let url = self.archive_url();
        ui::info(format!("downloading Go {} from {url}", self.toolchain.go_version));

        // Removed on every exit path
        let scratch = tempfile::Builder::new()
            .prefix("hub-builder-go")
            .tempdir()
            .map_err(|e| BuildError::fs("failed to create temp dir", std::env::temp_dir(), e))?;
        let archive = scratch.path().join(format!("go{}.tar.gz", self.toolchain.go_version));

        let downloader = Downloader::new()?;
        let downloader = if self.show_progress { downloader } else { downloader.hidden() };
        downloader.download(&url, &archive).await?;

        if let Some(expected) = &self.toolchain.archive_sha256 {
            verify_sha256(&archive, expected).await?;
        }

        self.enter(InstallStage::PlanningTarget);
        let plan = InstallationPlan::compute(&self.default_root, &self.home, &self.probe);
        if plan.uses_user_local {
            ui::warn(format!(
                "no write access to {} and no sudo, installing to {}",
                self.default_root.display(),
                plan.install_root.display()
            ));
        } else if plan.requires_elevation {
            ui::warn(format!(
                "{} is not writable, using sudo (you may be asked for a password)",
                plan.install_root.display()
            ));
        }

        self.enter(InstallStage::Extracting);
        extract::remove_previous(&plan).await?;
        extract::extract_archive(&archive, &plan).await?;
        if let Err(e) = scratch.close() {
            log::debug!("failed to remove download scratch dir: {e}");
        }

        self.enter(InstallStage::ConfiguringEnvironment);
        let mut toolchain = InstalledToolchain::at(
            &plan.goroot(),
            &self.home.join("go"),
            &self.mirrors.go_proxy,
            &self.mirrors.go_sumdb,
        );
        ui::success(format!("Go {} installed", self.toolchain.go_version));
        ui::info(format!("location: {}", toolchain.goroot.display()));

        self.enter(InstallStage::ConfiguringPersistence);
        self.persist(&toolchain);

        self.enter(InstallStage::Verifying);
        let mut verify_env = env.clone();
        verify_env.extend(&toolchain.environment());
        let version = detection::go_version(&verify_env)
            .await
            .ok_or_else(|| BuildError::ToolMissing("go (after install)".into()))?;
        ui::success(format!("verified: {version}"));
        toolchain.version = Some(version);
        Ok(toolchain)
    }

    /// Failure here only costs the user a manual step, so it is not fatal
    fn persist(&self, toolchain: &InstalledToolchain) {
        let file = self.shell.startup_file(&self.home);
        match persist::persist(self.shell, &file, toolchain) {
            Ok(Persisted::Appended(path)) => {
                ui::success(format!("Go environment written to {}", path.display()));
                ui::warn("apply it to the current shell with:");
                ui::highlight(format!("source {}", path.display()));
            }
            Ok(Persisted::AlreadyPresent(path)) => {
                ui::info(format!("{} already configures Go, skipping", path.display()));
            }
            Err(e) => {
                ui::warn(format!("could not update shell profile: {e}"));
                ui::warn("add the following to your shell profile manually:");
                ui::highlight(self.shell.render_block(toolchain).trim());
            }
        }
        ui::info("this build session already uses the new toolchain");
    }
}

async fn verify_sha256(archive: &Path, expected: &str) -> Result<()> {
    let path = archive.to_path_buf();
    let actual = tokio::task::spawn_blocking(move || -> std::io::Result<String> {
        let mut file = std::fs::File::open(&path)?;
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hex::encode(hasher.finalize()))
    })
    .await
    .map_err(|e| BuildError::fs("hashing task failed", archive, std::io::Error::other(e)))?
    .map_err(|e| BuildError::fs("failed to hash archive", archive, e))?;

    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(BuildError::Checksum {
            path: archive.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }
    log::info!("archive checksum verified");
    Ok(())
}
