//! Environment overlay applied to every child process

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::MirrorConfig;

/// Variables and search-path prefixes layered over the parent environment.
///
/// The parent process environment is never modified; each spawned command
/// receives the parent environment with this overlay on top.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
    path_prefix: Vec<PathBuf>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay carrying every mirror variable
    pub fn from_mirrors(mirrors: &MirrorConfig) -> Self {
        let mut env = Self::new();
        for (key, value) in mirrors.env_vars() {
            env.set(key, value);
        }
        env
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Put `dir` in front of the search path (later calls win)
    pub fn prepend_path(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        self.path_prefix.retain(|d| d != &dir);
        self.path_prefix.insert(0, dir);
    }

    pub fn path_prefix(&self) -> &[PathBuf] {
        &self.path_prefix
    }

    /// Merge `other` into `self`; its variables and path entries take precedence
    pub fn extend(&mut self, other: &Environment) {
        for (k, v) in &other.vars {
            self.vars.insert(k.clone(), v.clone());
        }
        for dir in other.path_prefix.iter().rev() {
            self.prepend_path(dir.clone());
        }
    }

    /// Prefixes followed by the parent `PATH`
    pub fn search_path(&self) -> Option<OsString> {
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let dirs = self
            .path_prefix
            .iter()
            .cloned()
            .chain(std::env::split_paths(&inherited));
        match std::env::join_paths(dirs) {
            Ok(joined) => Some(joined),
            Err(e) => {
                log::warn!("search path contains an invalid entry: {e}");
                None
            }
        }
    }

    /// Locate `name` the way a child process started with this overlay would
    pub fn which(&self, name: &str, cwd: &Path) -> Option<PathBuf> {
        which::which_in(name, self.search_path(), cwd).ok()
    }

    pub fn apply(&self, cmd: &mut tokio::process::Command) {
        cmd.envs(self.vars());
        if !self.path_prefix.is_empty()
            && let Some(path) = self.search_path()
        {
            cmd.env("PATH", path);
        }
    }
}
