//! Running external tools with live progress

mod env;
mod shell;

use std::path::{Path, PathBuf};

pub use env::Environment;
pub use shell::ShellRunner;

use crate::progress::ProgressProfile;

/// One shell command line plus everything needed to run it.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub command_line: String,
    pub cwd: PathBuf,
    /// Per-call variables, applied after the shared [`Environment`]
    pub vars: Vec<(String, String)>,
    pub profile: ProgressProfile,
}

impl CommandSpec {
    pub fn new(command_line: impl Into<String>, cwd: impl AsRef<Path>, profile: ProgressProfile) -> Self {
        Self {
            command_line: command_line.into(),
            cwd: cwd.as_ref().to_path_buf(),
            vars: Vec::new(),
            profile,
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((key.into(), value.into()));
        self
    }

    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Seam between the build stages and the processes they start.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run to completion; true iff the exit code is 0. Failing to start
    /// counts as failure.
    async fn run(&self, spec: &CommandSpec, env: &Environment) -> bool;

    /// Whether `name` resolves on the search path of `env`
    fn has_command(&self, name: &str, env: &Environment) -> bool;
}
