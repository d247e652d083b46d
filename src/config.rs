use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

/// File looked up in the project root when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "hub-builder.toml";

/// Top-level build configuration. Every field has a default so an absent
/// or partial TOML file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Project root; set from the command line, never read from the file
    #[serde(skip)]
    pub root_dir: PathBuf,
    /// Frontend subproject, relative to the root
    pub web_dir: PathBuf,
    /// Where the backend binary is written, relative to the root
    pub output_dir: PathBuf,
    /// Backend binary name without platform suffix
    pub binary_name: String,
    /// Go package receiving the `-X` version stamps
    pub version_pkg: String,
    pub mirrors: MirrorConfig,
    pub toolchain: ToolchainConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            web_dir: PathBuf::from("web"),
            output_dir: PathBuf::from("_output"),
            binary_name: "one-hub".into(),
            version_pkg: "one-api/common/config".into(),
            mirrors: MirrorConfig::default(),
            toolchain: ToolchainConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Load configuration for `root`.
    ///
    /// An explicit path must exist; otherwise `hub-builder.toml` in the root
    /// is used when present and defaults apply when it is not.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let candidate = match explicit {
            Some(path) if !path.exists() => {
                return Err(BuildError::MissingPath {
                    what: "configuration file",
                    path: path.to_path_buf(),
                });
            }
            Some(path) => Some(path.to_path_buf()),
            None => Some(root.join(CONFIG_FILE_NAME)).filter(|p| p.exists()),
        };

        let mut cfg = match candidate {
            Some(path) => {
                let raw = fs::read_to_string(&path)
                    .map_err(|e| BuildError::fs("failed to read config", &path, e))?;
                let cfg: BuildConfig = toml::from_str(&raw)
                    .map_err(|e| BuildError::Config(format!("{}: {e}", path.display())))?;
                log::debug!("loaded build config from {}", path.display());
                cfg
            }
            None => BuildConfig::default(),
        };
        cfg.root_dir = root.to_path_buf();
        Ok(cfg)
    }

    /// Effective settings in the on-disk format; the root is not included.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BuildError::Config(e.to_string()))
    }

    pub fn web_dir(&self) -> PathBuf {
        self.root_dir.join(&self.web_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root_dir.join(&self.output_dir)
    }
}

/// Mirror endpoints injected into every subprocess and generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub npm_registry: String,
    /// Comma separated, tried in order; should end with `direct`
    pub go_proxy: String,
    pub go_sumdb: String,
    pub node_mirror: String,
    pub electron_mirror: String,
    /// Base for the per-package binary hosts written to `.npmrc`
    pub binary_mirror_base: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            npm_registry: "https://registry.npmmirror.com".into(),
            go_proxy: "https://goproxy.cn,https://goproxy.io,direct".into(),
            go_sumdb: "sum.golang.google.cn".into(),
            node_mirror: "https://npmmirror.com/mirrors/node/".into(),
            electron_mirror: "https://npmmirror.com/mirrors/electron/".into(),
            binary_mirror_base: "https://npmmirror.com/mirrors/".into(),
        }
    }
}

impl MirrorConfig {
    /// Variables every child process sees.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        vec![
            ("GOPROXY".into(), self.go_proxy.clone()),
            ("GOSUMDB".into(), self.go_sumdb.clone()),
            ("npm_config_registry".into(), self.npm_registry.clone()),
            ("NODEJS_ORG_MIRROR".into(), self.node_mirror.clone()),
            ("ELECTRON_MIRROR".into(), self.electron_mirror.clone()),
            ("npm_config_audit".into(), "false".into()),
            ("npm_config_fund".into(), "false".into()),
        ]
    }
}

/// Go toolchain used for self-installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub go_version: String,
    pub archive_mirror: String,
    /// Optional pinned digest of the archive (hex)
    pub archive_sha256: Option<String>,
    /// Shown in manual-install guidance
    pub download_page: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            go_version: "1.25.4".into(),
            archive_mirror: "https://mirrors.nju.edu.cn/golang/".into(),
            archive_sha256: None,
            download_page: "https://golang.google.cn/dl/".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = BuildConfig::load(dir.path(), None).unwrap();
        assert_eq!(cfg.binary_name, "one-hub");
        assert_eq!(cfg.web_dir(), dir.path().join("web"));
        assert_eq!(cfg.mirrors, MirrorConfig::default());
    }

    #[test]
    fn partial_file_overrides_selected_fields() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "binary_name = \"hub\"\n[mirrors]\nnpm_registry = \"https://registry.npmjs.org\"\n",
        )
        .unwrap();

        let cfg = BuildConfig::load(dir.path(), None).unwrap();
        assert_eq!(cfg.binary_name, "hub");
        assert_eq!(cfg.mirrors.npm_registry, "https://registry.npmjs.org");
        assert_eq!(cfg.mirrors.go_sumdb, "sum.golang.google.cn");
        assert_eq!(cfg.toolchain.go_version, "1.25.4");
    }

    #[test]
    fn effective_settings_load_back_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = BuildConfig::load(dir.path(), None).unwrap();
        cfg.binary_name = "hub".into();
        cfg.mirrors.go_proxy = "https://proxy.example,direct".into();
        cfg.toolchain.archive_sha256 = Some("ab".repeat(32));

        let text = cfg.to_toml().unwrap();
        assert!(text.contains("[mirrors]"));
        assert!(!text.contains("root_dir"));
        let path = dir.path().join("other.toml");
        fs::write(&path, &text).unwrap();

        let loaded = BuildConfig::load(dir.path(), Some(&path)).unwrap();
        assert_eq!(loaded.binary_name, "hub");
        assert_eq!(loaded.mirrors, cfg.mirrors);
        assert_eq!(loaded.toolchain.archive_sha256, cfg.toolchain.archive_sha256);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BuildConfig::load(dir.path(), Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, BuildError::MissingPath { .. }));
    }

    #[test]
    fn mirror_env_disables_audit_and_fund() {
        let vars = MirrorConfig::default().env_vars();
        assert!(vars.contains(&("npm_config_audit".into(), "false".into())));
        assert!(vars.contains(&("npm_config_fund".into(), "false".into())));
        assert!(vars.iter().any(|(k, v)| k == "GOPROXY" && v.ends_with(",direct")));
    }
}
