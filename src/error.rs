//! Error taxonomy for the build driver.
//!
//! Stage functions turn these into go/no-go decisions; only the binary
//! boundary converts them into an exit code.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    /// A required executable is not on the search path
    #[error("required tool not found: {0}")]
    ToolMissing(String),

    /// Non-zero exit or spawn failure of an external command
    #[error("command failed: {cmd}")]
    Subprocess { cmd: String },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("{context}: {}", path.display())]
    Filesystem {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing {what}: {}", path.display())]
    MissingPath { what: &'static str, path: PathBuf },

    #[error("could not update {}: {source}", path.display())]
    PersistenceWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    Checksum {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BuildError {
    pub(crate) fn fs(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            context,
            path: path.into(),
            source,
        }
    }
}

/// Download-level failures.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("download failed with HTTP status {0}")]
    HttpStatus(u16),

    #[error("too many redirects (limit {limit}) starting from {url}")]
    TooManyRedirects { url: String, limit: usize },

    #[error("redirect from {0} has no Location header")]
    MissingLocation(String),

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no data received for {secs}s after {downloaded} bytes")]
    Timeout { secs: u64, downloaded: u64 },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
