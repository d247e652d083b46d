//! `.npmrc` pointing npm and native-binary installers at the mirrors

use std::path::{Path, PathBuf};

use crate::config::MirrorConfig;
use crate::error::{BuildError, Result};

/// Packages that download prebuilt binaries from their own host
const BINARY_HOSTS: &[(&str, &str)] = &[
    ("sass_binary_site", "node-sass"),
    ("phantomjs_cdnurl", "phantomjs"),
    ("chromedriver_cdnurl", "chromedriver"),
    ("operadriver_cdnurl", "operadriver"),
    ("selenium_cdnurl", "selenium"),
    ("node_inspector_cdnurl", "node-inspector"),
    ("fsevents_binary_host_mirror", "fsevents"),
];

pub fn render(mirrors: &MirrorConfig) -> String {
    let base = mirrors.binary_mirror_base.trim_end_matches('/');
    let mut out = format!(
        "registry={}\ndisturl={}\nelectron_mirror={}\n",
        mirrors.npm_registry, mirrors.node_mirror, mirrors.electron_mirror
    );
    for (key, name) in BINARY_HOSTS {
        out.push_str(&format!("{key}={base}/{name}/\n"));
    }
    out
}

/// Overwrite `<web_dir>/.npmrc`
pub fn write(web_dir: &Path, mirrors: &MirrorConfig) -> Result<PathBuf> {
    let path = web_dir.join(".npmrc");
    std::fs::write(&path, render(mirrors)).map_err(|e| BuildError::fs("failed to write .npmrc", &path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_follow_the_mirror_config() {
        let mirrors = MirrorConfig {
            npm_registry: "https://npm.example".into(),
            binary_mirror_base: "https://bin.example/mirrors/".into(),
            ..MirrorConfig::default()
        };
        let text = render(&mirrors);
        assert!(text.starts_with("registry=https://npm.example\n"));
        assert!(text.contains("disturl=https://npmmirror.com/mirrors/node/\n"));
        assert!(text.contains("electron_mirror=https://npmmirror.com/mirrors/electron/\n"));
        assert!(text.contains("sass_binary_site=https://bin.example/mirrors/node-sass/\n"));
        assert!(text.contains("fsevents_binary_host_mirror=https://bin.example/mirrors/fsevents/\n"));
    }

    #[test]
    fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".npmrc"), "registry=https://old\n").unwrap();
        let path = write(dir.path(), &MirrorConfig::default()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(!text.contains("https://old"));
        assert!(text.contains("registry=https://registry.npmmirror.com"));
    }
}
