//! Version stamps taken from git

use std::path::Path;

use tokio::process::Command;

/// Version, commit and build date baked into the frontend and backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionInfo {
    pub version: String,
    pub commit: String,
    /// `YYYYMMDD`
    pub date: String,
}

impl RevisionInfo {
    pub fn new(version: impl Into<String>, commit: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            commit: commit.into(),
            date: date.into(),
        }
    }

    /// Ask git in `root`; falls back to `dev` / `unknown` outside a checkout
    pub async fn detect(root: &Path) -> Self {
        let version = git(root, &["describe", "--tags"])
            .await
            .unwrap_or_else(|| "dev".into());
        let commit = git(root, &["rev-parse", "--short", "HEAD"])
            .await
            .unwrap_or_else(|| "unknown".into());
        Self {
            version,
            commit,
            date: today(),
        }
    }
}

pub fn today() -> String {
    chrono::Local::now().format("%Y%m%d").to_string()
}

async fn git(root: &Path, args: &[&str]) -> Option<String> {
    let output = match Command::new("git").args(args).current_dir(root).output().await {
        Ok(output) => output,
        Err(e) => {
            log::debug!("git {} failed to start: {e}", args.join(" "));
            return None;
        }
    };
    if !output.status.success() {
        log::debug!("git {} exited with {}", args.join(" "), output.status);
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_is_eight_digits() {
        let d = today();
        assert_eq!(d.len(), 8);
        assert!(d.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn outside_a_checkout_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let rev = RevisionInfo::detect(dir.path()).await;
        assert_eq!(rev.version, "dev");
        assert_eq!(rev.commit, "unknown");
    }
}
