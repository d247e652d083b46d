//! Housekeeping commands: clean, run, mirrors, init-config

use std::path::PathBuf;

use regex::Regex;

use crate::config::{BuildConfig, CONFIG_FILE_NAME};
use crate::error::{BuildError, Result};
use crate::platform::BuildTarget;
use crate::ui;

/// Random lowercase hex string of `len` characters
pub fn generate_secret(len: usize) -> std::result::Result<String, getrandom::Error> {
    let mut bytes = vec![0u8; len.div_ceil(2)];
    getrandom::getrandom(&mut bytes)?;
    let mut secret = hex::encode(bytes);
    secret.truncate(len);
    Ok(secret)
}

fn build_outputs(config: &BuildConfig) -> Vec<PathBuf> {
    let web = config.web_dir();
    vec![config.output_dir(), web.join("build"), web.join("dist")]
}

fn remove_all(paths: &[PathBuf]) -> bool {
    let mut ok = true;
    for path in paths.iter().filter(|p| p.exists()) {
        ui::info(format!("removing {}", path.display()));
        if let Err(e) = std::fs::remove_dir_all(path) {
            ui::error(format!("failed to remove {}: {e}", path.display()));
            ok = false;
        }
    }
    ok
}

/// Remove build outputs and installed frontend dependencies
pub fn clean(config: &BuildConfig) -> bool {
    ui::title("Clean all");
    let mut paths = build_outputs(config);
    paths.push(config.web_dir().join("node_modules"));
    let ok = remove_all(&paths);
    if ok {
        ui::success("clean complete");
    }
    ok
}

/// Remove build outputs, keep `node_modules`
pub fn clean_build(config: &BuildConfig) -> bool {
    ui::title("Clean build outputs (keeping dependencies)");
    let ok = remove_all(&build_outputs(config));
    if ok {
        ui::success("clean complete");
    }
    ok
}

/// Start the host binary from the project root and wait for it
pub async fn run(config: &BuildConfig) -> bool {
    ui::title("Run");
    let binary = match BuildTarget::host() {
        Ok(host) => host.binary_path(&config.output_dir().join(&config.binary_name)),
        Err(e) => {
            ui::error(e.to_string());
            return false;
        }
    };
    if !binary.exists() {
        ui::error(format!("{} not found, build the backend first", binary.display()));
        return false;
    }

    ui::info(format!("starting {}", binary.display()));
    let status = tokio::process::Command::new(&binary)
        .current_dir(&config.root_dir)
        .status()
        .await;
    match status {
        Ok(status) if status.success() => true,
        Ok(status) => {
            ui::error(format!("{} exited with {status}", binary.display()));
            false
        }
        Err(e) => {
            ui::error(format!("failed to start {}: {e}", binary.display()));
            false
        }
    }
}

pub fn show_mirrors(config: &BuildConfig) {
    let m = &config.mirrors;
    ui::title("Mirror configuration");
    ui::highlight(format!("npm registry:   {}", m.npm_registry));
    ui::highlight(format!("Go proxy:       {}", m.go_proxy));
    ui::highlight(format!("Go sumdb:       {}", m.go_sumdb));
    ui::highlight(format!("Node mirror:    {}", m.node_mirror));
    ui::highlight(format!("Electron:       {}", m.electron_mirror));
    ui::highlight(format!("Go archives:    {}", config.toolchain.archive_mirror));

    match config.to_toml() {
        Ok(text) => {
            ui::info(format!("effective {CONFIG_FILE_NAME}:"));
            ui::block(&text);
        }
        Err(e) => log::warn!("cannot render configuration: {e}"),
    }
}

/// Secrets written by [`init_config`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSecrets {
    pub user_token_secret: String,
    pub session_secret: String,
}

/// Fill the empty secrets of an example config template.
pub fn render_config(template: &str, secrets: &GeneratedSecrets) -> Result<String> {
    let user = Regex::new(r#"user_token_secret:\s*""\s*#"#)
        .map_err(|e| BuildError::Config(e.to_string()))?;
    let session =
        Regex::new(r#"session_secret:\s*""\s*#"#).map_err(|e| BuildError::Config(e.to_string()))?;

    let text = user.replace(
        template,
        regex::NoExpand(&format!("user_token_secret: \"{}\" #", secrets.user_token_secret)),
    );
    let text = session.replace(
        &text,
        regex::NoExpand(&format!("session_secret: \"{}\" #", secrets.session_secret)),
    );
    Ok(text.into_owned())
}

/// Create `config.yaml` from `config.example.yaml` with fresh secrets.
///
/// Never overwrites an existing `config.yaml`.
pub fn init_config(config: &BuildConfig) -> Result<GeneratedSecrets> {
    let target = config.root_dir.join("config.yaml");
    let example = config.root_dir.join("config.example.yaml");

    if target.exists() {
        return Err(BuildError::Config(format!(
            "{} already exists; remove or rename it to regenerate",
            target.display()
        )));
    }
    if !example.exists() {
        return Err(BuildError::MissingPath {
            what: "config template",
            path: example,
        });
    }

    let template = std::fs::read_to_string(&example)
        .map_err(|e| BuildError::fs("failed to read config template", &example, e))?;
    let secret = |what: &str| {
        generate_secret(32).map_err(|e| BuildError::Config(format!("cannot generate {what}: {e}")))
    };
    let secrets = GeneratedSecrets {
        user_token_secret: secret("user token secret")?,
        session_secret: secret("session secret")?,
    };
    let rendered = render_config(&template, &secrets)?;
    std::fs::write(&target, rendered)
        .map_err(|e| BuildError::fs("failed to write config", &target, e))?;
    log::info!("created {}", target.display());
    Ok(secrets)
}

/// `init-config` command with console reporting
pub fn init_config_command(config: &BuildConfig) -> bool {
    ui::title("Initialise configuration");
    match init_config(config) {
        Ok(secrets) => {
            ui::success("created config.yaml");
            ui::info("generated secrets:");
            ui::highlight(format!("user_token_secret: {}", secrets.user_token_secret));
            ui::highlight(format!("session_secret:    {}", secrets.session_secret));
            ui::warn("keep these safe; changing them invalidates issued user tokens");
            true
        }
        Err(e) => {
            ui::error(e.to_string());
            false
        }
    }
}
