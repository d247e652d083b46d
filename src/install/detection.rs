//! Go toolchain detection
//!
//! Both checks resolve `go` through the build [`Environment`], so a
//! toolchain installed earlier in the same run is found even though the
//! parent process `PATH` never changed.

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::process::Environment;

const VERSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Path of the `go` binary visible through `env`
pub fn locate_go(env: &Environment) -> Option<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_default();
    env.which("go", &cwd)
}

/// Trimmed `go version` output; `None` when go is missing, fails or prints nothing
pub async fn go_version(env: &Environment) -> Option<String> {
    let go = locate_go(env)?;
    let mut cmd = Command::new(&go);
    cmd.arg("version");
    env.apply(&mut cmd);

    let output = match timeout(VERSION_TIMEOUT, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            log::warn!("failed to run {} version: {e}", go.display());
            return None;
        }
        Err(_) => {
            log::warn!("`go version` timed out after {}s", VERSION_TIMEOUT.as_secs());
            return None;
        }
    };
    if !output.status.success() {
        log::warn!("`go version` exited with {}", output.status);
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
