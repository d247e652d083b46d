//! Frontend and backend build stages
//!
//! Each stage reports a go/no-go `bool`; details have already been printed
//! by the time it returns. Stages run strictly one after another.

mod backend;
mod frontend;
pub mod npmrc;
pub mod revision;

use std::path::PathBuf;

use tokio::sync::OnceCell;

pub use revision::RevisionInfo;

use crate::config::BuildConfig;
use crate::platform::BuildTarget;
use crate::process::{CommandRunner, Environment};
use crate::ui;

/// Build driver for one project root.
pub struct Pipeline<R: CommandRunner> {
    config: BuildConfig,
    runner: R,
    env: Environment,
    /// `None` when the machine is not a Go target we know
    host: Option<BuildTarget>,
    revision: OnceCell<RevisionInfo>,
}

impl<R: CommandRunner> Pipeline<R> {
    /// Environment starts with every mirror variable set
    pub fn new(config: BuildConfig, runner: R) -> Self {
        let env = Environment::from_mirrors(&config.mirrors);
        let host = BuildTarget::host()
            .inspect_err(|e| log::warn!("host target unknown: {e}"))
            .ok();
        Self {
            config,
            runner,
            env,
            host,
            revision: OnceCell::new(),
        }
    }

    /// Pretend to run on `host` (decides whether Go may be self-installed)
    pub fn with_host(mut self, host: impl Into<Option<BuildTarget>>) -> Self {
        self.host = host.into();
        self
    }

    /// Use fixed version stamps instead of asking git
    pub fn with_revision(self, revision: RevisionInfo) -> Self {
        Self {
            revision: OnceCell::new_with(Some(revision)),
            ..self
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn host(&self) -> Option<BuildTarget> {
        self.host
    }

    /// Resolved once per pipeline
    pub async fn revision(&self) -> &RevisionInfo {
        self.revision
            .get_or_init(|| RevisionInfo::detect(&self.config.root_dir))
            .await
    }

    /// Where the backend binary for `target` is written
    pub fn binary_path(&self, target: BuildTarget) -> PathBuf {
        target.binary_path(&self.config.output_dir().join(&self.config.binary_name))
    }

    /// Frontend, then the backend for the host. The backend is skipped when
    /// the frontend fails; nothing runs when the host is not a known target.
    pub async fn all(&mut self) -> bool {
        ui::title("Full build");

        let Some(target) = self.host else {
            ui::error("cannot build the backend for this host platform");
            ui::info("run `web`, then `backend <os> <arch>` with an explicit target");
            return false;
        };
        if !self.frontend().await {
            ui::error("frontend build failed");
            return false;
        }
        if !self.backend(target).await {
            ui::error("backend build failed");
            return false;
        }

        let binary = self.binary_path(target);
        ui::rule();
        ui::success("full build complete: frontend and backend are ready");
        ui::rule();
        ui::info("artifacts:");
        ui::highlight(format!("frontend: {}", self.config.web_dir().join("build").display()));
        ui::highlight(format!("backend:  {}", binary.display()));
        ui::info("quick start:");
        ui::highlight(run_command(&self.config, target, &binary));
        ui::info("the backend serves the bundled frontend on http://localhost:3000 by default");
        true
    }
}

/// Shell-ready command for starting `binary` from the project root
fn run_command(config: &BuildConfig, target: BuildTarget, binary: &std::path::Path) -> String {
    let relative = binary.strip_prefix(&config.root_dir).unwrap_or(binary);
    if target.is_windows() || relative.is_absolute() {
        relative.display().to_string()
    } else {
        format!("./{}", relative.display())
    }
}
