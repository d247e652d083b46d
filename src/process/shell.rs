use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::{MissedTickBehavior, timeout};

use super::{CommandRunner, CommandSpec, Environment};
use crate::progress::{ProgressEstimator, ProgressRenderer, Stream};
use crate::ui;

/// Time allowed for pipes to drain after the child has exited.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Runs command lines through the platform shell with a progress bar.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    hide_progress: bool,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner that tracks progress without drawing it
    pub fn hidden() -> Self {
        Self { hide_progress: true }
    }

    fn renderer(&self, status: &str) -> ProgressRenderer {
        if self.hide_progress {
            ProgressRenderer::hidden(100.0, status)
        } else {
            ProgressRenderer::new(100.0, status)
        }
    }
}

/// `cmd /C` only strips the outermost quotes, so the line goes through
/// verbatim instead of being re-quoted as a single argument.
#[cfg(windows)]
fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").raw_arg(command_line);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);
    cmd
}

impl CommandRunner for ShellRunner {
    async fn run(&self, spec: &CommandSpec, env: &Environment) -> bool {
        log::info!("running `{}` in {}", spec.command_line, spec.cwd.display());

        let mut cmd = shell_command(&spec.command_line);
        cmd.current_dir(&spec.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        env.apply(&mut cmd);
        cmd.envs(spec.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                ui::error(format!("failed to start `{}`: {e}", spec.command_line));
                return false;
            }
        };
        let (Some(mut stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
            ui::error(format!("no output pipes for `{}`", spec.command_line));
            return false;
        };

        let mut estimator = ProgressEstimator::new(spec.profile.clone());
        let mut bar = self.renderer(estimator.status());
        let mut ticker = tokio::time::interval(spec.profile.tick_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        let mut output = Vec::new();
        let mut out_buf = [0u8; 8192];
        let mut err_buf = [0u8; 8192];
        let (mut out_open, mut err_open) = (true, true);

        let status = loop {
            tokio::select! {
                read = stdout.read(&mut out_buf), if out_open => match read {
                    Ok(0) | Err(_) => out_open = false,
                    Ok(n) => {
                        output.extend_from_slice(&out_buf[..n]);
                        if estimator.feed(Stream::Stdout, &out_buf[..n]) {
                            bar.update(estimator.percent(), estimator.status());
                        }
                    }
                },
                read = stderr.read(&mut err_buf), if err_open => match read {
                    Ok(0) | Err(_) => err_open = false,
                    Ok(n) => {
                        output.extend_from_slice(&err_buf[..n]);
                        if estimator.feed(Stream::Stderr, &err_buf[..n]) {
                            bar.update(estimator.percent(), estimator.status());
                        }
                    }
                },
                _ = ticker.tick() => {
                    estimator.tick();
                    bar.update(estimator.percent(), estimator.status());
                }
                status = child.wait() => break status,
            }
        };
        drop(ticker);

        // Whatever was still buffered in the pipes belongs in the error report
        if out_open {
            drain(&mut stdout, &mut output).await;
        }
        if err_open {
            drain(&mut stderr, &mut output).await;
        }
        estimator.flush();

        match status {
            Ok(status) if status.code() == Some(0) => {
                estimator.finish_success();
                bar.complete(estimator.status());
                log::debug!("`{}` finished", spec.command_line);
                true
            }
            Ok(status) => {
                bar.clear();
                report_failure(&spec.command_line, &spec.cwd, Some(status), &output);
                false
            }
            Err(e) => {
                bar.clear();
                log::warn!("waiting for `{}` failed: {e}", spec.command_line);
                report_failure(&spec.command_line, &spec.cwd, None, &output);
                false
            }
        }
    }

    fn has_command(&self, name: &str, env: &Environment) -> bool {
        let cwd = std::env::current_dir().unwrap_or_default();
        env.which(name, &cwd).is_some()
    }
}

async fn drain<R: AsyncRead + Unpin>(reader: &mut R, output: &mut Vec<u8>) {
    if timeout(DRAIN_TIMEOUT, reader.read_to_end(output)).await.is_err() {
        log::debug!("output pipe still open after exit, giving up on the rest");
    }
}

fn report_failure(command_line: &str, cwd: &Path, status: Option<ExitStatus>, output: &[u8]) {
    let code = status
        .and_then(|s| s.code())
        .map_or_else(|| "unknown".to_string(), |c| c.to_string());
    ui::error(format!(
        "`{command_line}` failed in {} (exit code {code})",
        cwd.display()
    ));
    let text = String::from_utf8_lossy(output);
    if !text.trim().is_empty() {
        ui::block(&text);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::progress::ProgressProfile;

    fn spec(line: &str) -> CommandSpec {
        CommandSpec::new(line, std::env::temp_dir(), ProgressProfile::go())
    }

    #[tokio::test]
    async fn zero_exit_is_success() {
        let ok = ShellRunner::hidden()
            .run(&spec("echo 'go: downloading example.com/mod v1'"), &Environment::new())
            .await;
        assert!(ok);
    }

    #[tokio::test]
    async fn non_zero_exit_is_failure() {
        let ok = ShellRunner::hidden()
            .run(&spec("echo boom >&2; exit 3"), &Environment::new())
            .await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn missing_working_directory_is_failure() {
        let mut spec = spec("true");
        spec.cwd = std::env::temp_dir().join("hub-builder-does-not-exist");
        assert!(!ShellRunner::hidden().run(&spec, &Environment::new()).await);
    }

    #[tokio::test]
    async fn overlay_and_call_variables_reach_the_child() {
        let mut env = Environment::new();
        env.set("HUB_BUILDER_OVERLAY", "a");
        let spec = spec(r#"test "$HUB_BUILDER_OVERLAY" = a && test "$HUB_BUILDER_CALL" = b"#)
            .env("HUB_BUILDER_CALL", "b");
        assert!(ShellRunner::hidden().run(&spec, &env).await);
    }

    #[tokio::test]
    async fn quoted_flags_survive_the_shell() {
        let spec = spec(r#"set -- -ldflags "-w -s -X 'pkg.Version=v1'"; test $# = 2 && test "$2" = "-w -s -X 'pkg.Version=v1'""#);
        assert!(ShellRunner::hidden().run(&spec, &Environment::new()).await);
    }

    #[test]
    fn command_lookup_uses_the_overlay_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("hub-builder-fake-tool");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let runner = ShellRunner::hidden();
        let mut env = Environment::new();
        assert!(!runner.has_command("hub-builder-fake-tool", &env));
        env.prepend_path(dir.path());
        assert!(runner.has_command("hub-builder-fake-tool", &env));
    }
}
