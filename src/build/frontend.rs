use super::{Pipeline, npmrc};
use crate::process::{CommandRunner, CommandSpec};
use crate::progress::ProgressProfile;
use crate::ui;

impl<R: CommandRunner> Pipeline<R> {
    /// Install dependencies when needed and bundle the web UI.
    pub async fn frontend(&mut self) -> bool {
        ui::title("Frontend build");

        let web = self.config.web_dir();
        if !web.is_dir() {
            ui::error(format!("web directory not found: {}", web.display()));
            return false;
        }
        let version = self.revision().await.version.clone();

        ui::info("configuring npm mirrors...");
        match npmrc::write(&web, &self.config.mirrors) {
            Ok(path) => ui::success(format!("wrote {}", path.display())),
            Err(e) => {
                ui::error(e.to_string());
                return false;
            }
        }

        // Presence is enough; a stale lockfile is not detected
        if web.join("node_modules").exists() {
            ui::info("node_modules present, skipping install");
        } else {
            ui::info("installing frontend dependencies from the mirror...");
            let registry = &self.config.mirrors.npm_registry;
            let install = CommandSpec::new(
                format!("npm install --legacy-peer-deps --registry={registry} --timing"),
                &web,
                ProgressProfile::npm_install(),
            );
            if !self.runner.run(&install, &self.env).await {
                ui::warn("install failed, retrying with --force...");
                let forced = CommandSpec::new(
                    format!("npm install --force --registry={registry} --timing"),
                    &web,
                    ProgressProfile::npm_install(),
                );
                if !self.runner.run(&forced, &self.env).await {
                    ui::error("dependency install failed");
                    return false;
                }
            }
        }

        ui::info("building frontend assets...");
        let build = CommandSpec::new("npm run build", &web, ProgressProfile::vite_build())
            .env("DISABLE_ESLINT_PLUGIN", "true")
            .env("VITE_APP_VERSION", version.as_str());
        if !self.runner.run(&build, &self.env).await {
            ui::error("frontend bundle failed");
            return false;
        }

        ui::rule();
        ui::success("frontend build complete");
        ui::highlight(format!("output:  {}", web.join("build").display()));
        ui::highlight(format!("version: {version}"));
        ui::rule();
        true
    }
}
