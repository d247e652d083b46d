use std::path::Path;

use super::{Pipeline, run_command};
use crate::install::ToolchainInstaller;
use crate::platform::{BuildTarget, TargetOs};
use crate::process::{CommandRunner, CommandSpec};
use crate::progress::ProgressProfile;
use crate::tasks;
use crate::ui;

impl<R: CommandRunner> Pipeline<R> {
    /// Compile the Go backend for `target`.
    pub async fn backend(&mut self, target: BuildTarget) -> bool {
        ui::title("Backend build");

        if !self.ensure_go().await {
            return false;
        }

        let rev = self.revision().await.clone();
        let out_dir = self.config.output_dir();
        if let Err(e) = std::fs::create_dir_all(&out_dir) {
            ui::error(format!("cannot create {}: {e}", out_dir.display()));
            return false;
        }
        let binary = self.binary_path(target);
        let mirrors = &self.config.mirrors;

        ui::info(format!("target:   {target}"));
        ui::info(format!(
            "version:  {}, commit: {}, date: {}",
            rev.version, rev.commit, rev.date
        ));
        ui::info(format!("go proxy: {}", mirrors.go_proxy));

        ui::info("tidying Go modules from the mirror...");
        let tidy = CommandSpec::new("go mod tidy", &self.config.root_dir, ProgressProfile::go())
            .env("GOPROXY", mirrors.go_proxy.as_str())
            .env("GOSUMDB", mirrors.go_sumdb.as_str())
            .env("GOTOOLCHAIN", "auto");
        if !self.runner.run(&tidy, &self.env).await {
            ui::error("go mod tidy failed");
            return false;
        }

        let pkg = &self.config.version_pkg;
        let ldflags = format!(
            "-w -s -X '{pkg}.Version={}' -X '{pkg}.BuildTime={}' -X '{pkg}.Commit={}'",
            rev.version, rev.date, rev.commit
        );
        let build = CommandSpec::new(
            format!("go build -o \"{}\" -ldflags \"{ldflags}\"", binary.display()),
            &self.config.root_dir,
            ProgressProfile::go(),
        )
        .env("GOPROXY", mirrors.go_proxy.as_str())
        .env("GOSUMDB", mirrors.go_sumdb.as_str())
        .env("GOTOOLCHAIN", "auto")
        .env("GOOS", target.goos())
        .env("GOARCH", target.goarch())
        .env("CGO_ENABLED", "0");

        ui::info("compiling backend...");
        if !self.runner.run(&build, &self.env).await {
            ui::error("go build failed");
            return false;
        }

        ui::success(format!("built {}", binary.display()));
        ui::rule();
        ui::success("backend build complete");
        self.start_hints(target, &binary);
        ui::rule();
        true
    }

    /// `go` is on the search path, possibly after installing it.
    async fn ensure_go(&mut self) -> bool {
        if self.runner.has_command("go", &self.env) {
            return true;
        }
        ui::error("Go toolchain not found");

        if self.host.is_none_or(|host| host.os != TargetOs::Linux) {
            self.manual_install_guidance();
            return false;
        }

        ui::info("Linux host, installing Go automatically...");
        let installed = match ToolchainInstaller::new(&self.config) {
            Ok(mut installer) => installer.install(&self.env).await,
            Err(e) => Err(e),
        };
        match installed {
            Ok(toolchain) => {
                self.env.extend(&toolchain.environment());
                ui::success("Go is ready, continuing the build");
                true
            }
            Err(e) => {
                ui::error(format!("automatic install failed: {e}"));
                self.manual_install_guidance();
                false
            }
        }
    }

    fn manual_install_guidance(&self) {
        let tc = &self.config.toolchain;
        ui::info(format!("install Go {} or newer manually", tc.go_version));
        if let Some(host) = self.host {
            let package = match host.os {
                TargetOs::Windows => format!("go{}.windows-{}.msi", tc.go_version, host.goarch()),
                TargetOs::Darwin => format!("go{}.darwin-{}.pkg", tc.go_version, host.goarch()),
                TargetOs::Linux => format!("go{}.linux-{}.tar.gz", tc.go_version, host.goarch()),
            };
            ui::info(format!("suggested package: {package}"));
        }
        ui::info(format!("download page: {}", tc.download_page));
        ui::info(format!("mirror: {}", tc.archive_mirror));
    }

    fn start_hints(&self, target: BuildTarget, binary: &Path) {
        let config_file = self.config.root_dir.join("config.yaml");
        if !config_file.exists() {
            let secret = tasks::generate_secret(32).unwrap_or_default();
            let name = binary.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            ui::warn("config.yaml not found; the server needs configuration to start");
            ui::info("either start it with the secret in the environment (quick test):");
            if target.is_windows() {
                ui::highlight(format!("set USER_TOKEN_SECRET={secret} && {name}"));
            } else {
                ui::highlight(format!("USER_TOKEN_SECRET=\"{secret}\" ./{name}"));
            }
            ui::info("or create a config file (production):");
            ui::highlight("hub-builder init-config");
            return;
        }

        ui::info("start with:");
        let absolute = std::path::absolute(binary).unwrap_or_else(|_| binary.to_path_buf());
        ui::highlight(absolute.display().to_string());
        ui::info("or from the project root:");
        let relative = run_command(&self.config, target, binary);
        ui::highlight(&relative);
        ui::info("common flags:");
        ui::highlight("--port PORT          listen port (default 3000)");
        ui::highlight("--log-dir PATH       log directory");
        ui::highlight("--data-source PATH   database file");
        ui::info("example:");
        ui::highlight(format!("{relative} --port 8080"));
    }
}
