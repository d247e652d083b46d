//! Persisting toolchain variables in the user's shell startup file

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::toolchain::InstalledToolchain;
use crate::error::{BuildError, Result};

/// Shell family, detected from `$SHELL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Bash,
    Zsh,
    Fish,
}

impl ShellKind {
    /// Anything unrecognised is treated as bash
    pub fn detect(shell: &str) -> Self {
        if shell.contains("zsh") {
            ShellKind::Zsh
        } else if shell.contains("fish") {
            ShellKind::Fish
        } else {
            ShellKind::Bash
        }
    }

    pub fn from_env() -> Self {
        Self::detect(&std::env::var("SHELL").unwrap_or_default())
    }

    pub fn startup_file(&self, home: &Path) -> PathBuf {
        match self {
            ShellKind::Bash => home.join(".bashrc"),
            ShellKind::Zsh => home.join(".zshrc"),
            ShellKind::Fish => home.join(".config").join("fish").join("config.fish"),
        }
    }

    /// Text that identifies an existing GOROOT assignment
    pub fn goroot_marker(&self) -> &'static str {
        match self {
            ShellKind::Bash | ShellKind::Zsh => "export GOROOT=",
            ShellKind::Fish => "set -gx GOROOT ",
        }
    }

    /// Block appended to the startup file
    pub fn render_block(&self, toolchain: &InstalledToolchain) -> String {
        let goroot = toolchain.goroot.display();
        let gopath = toolchain.gopath.display();
        let bin = toolchain.bin_dir.display();
        let (proxy, sumdb) = (&toolchain.goproxy, &toolchain.gosumdb);
        match self {
            ShellKind::Bash | ShellKind::Zsh => format!(
                "\n# Go toolchain (added by hub-builder)\n\
                 export GOROOT=\"{goroot}\"\n\
                 export GOPATH=\"{gopath}\"\n\
                 export PATH=\"{bin}:$PATH\"\n\
                 export GOPROXY=\"{proxy}\"\n\
                 export GOSUMDB=\"{sumdb}\"\n"
            ),
            ShellKind::Fish => format!(
                "\n# Go toolchain (added by hub-builder)\n\
                 set -gx GOROOT \"{goroot}\"\n\
                 set -gx GOPATH \"{gopath}\"\n\
                 fish_add_path -g \"{bin}\"\n\
                 set -gx GOPROXY \"{proxy}\"\n\
                 set -gx GOSUMDB \"{sumdb}\"\n"
            ),
        }
    }
}

/// Result of a persistence attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted {
    Appended(PathBuf),
    AlreadyPresent(PathBuf),
}

/// Append the toolchain block to `file` unless it is already there.
///
/// The file counts as configured when it contains both the shell's GOROOT
/// marker and the install path.
pub fn persist(shell: ShellKind, file: &Path, toolchain: &InstalledToolchain) -> Result<Persisted> {
    let write_err = |source| BuildError::PersistenceWrite {
        path: file.to_path_buf(),
        source,
    };

    if file.exists() {
        // Startup files are not always UTF-8
        let raw = std::fs::read(file).map_err(write_err)?;
        let content = String::from_utf8_lossy(&raw);
        let goroot = toolchain.goroot.to_string_lossy();
        if content.contains(shell.goroot_marker()) && content.contains(goroot.as_ref()) {
            log::info!("{} already configures {goroot}", file.display());
            return Ok(Persisted::AlreadyPresent(file.to_path_buf()));
        }
    } else if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut handle = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .map_err(write_err)?;
    handle
        .write_all(shell.render_block(toolchain).as_bytes())
        .map_err(write_err)?;
    log::info!("appended Go environment to {}", file.display());
    Ok(Persisted::Appended(file.to_path_buf()))
}
