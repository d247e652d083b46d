//! Single-file HTTP download with redirect following and a progress bar

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, LOCATION};
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use url::Url;

use crate::error::NetworkError;
use crate::progress::ProgressRenderer;

const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// No data for this long aborts the transfer
const DOWNLOAD_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(300);
pub const MAX_REDIRECTS: usize = 5;

const MIB: f64 = 1024.0 * 1024.0;

/// Streams one URL into one file.
///
/// Redirects are handled here rather than by reqwest so every hop is logged
/// and the hop limit surfaces as [`NetworkError::TooManyRedirects`].
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    max_redirects: usize,
    inactivity_timeout: Duration,
    show_progress: bool,
}

impl Downloader {
    pub fn new() -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .connect_timeout(DOWNLOAD_CONNECT_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("hub-builder/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_redirects: MAX_REDIRECTS,
            inactivity_timeout: DOWNLOAD_INACTIVITY_TIMEOUT,
            show_progress: true,
        })
    }

    /// Track progress without drawing a bar
    pub fn hidden(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn with_inactivity_timeout(mut self, limit: Duration) -> Self {
        self.inactivity_timeout = limit;
        self
    }

    /// Download `url` into `dest`, returning the number of bytes written.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, NetworkError> {
        let mut current = Url::parse(url).map_err(|source| NetworkError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let mut hops = 0;

        let response = loop {
            log::debug!("GET {current}");
            let response = self.client.get(current.clone()).send().await?;
            let status = response.status();

            if is_followed_redirect(status) {
                if hops == self.max_redirects {
                    return Err(NetworkError::TooManyRedirects {
                        url: url.to_string(),
                        limit: self.max_redirects,
                    });
                }
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| NetworkError::MissingLocation(current.to_string()))?;
                let next = current.join(location).map_err(|source| NetworkError::InvalidUrl {
                    url: location.to_string(),
                    source,
                })?;
                log::info!("{status} redirect: {current} -> {next}");
                current = next;
                hops += 1;
                continue;
            }

            if status != StatusCode::OK {
                return Err(NetworkError::HttpStatus(status.as_u16()));
            }
            break response;
        };

        // Header, not `content_length()`, so a body we can't size stays unknown
        let total = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        let mut bar = if self.show_progress {
            ProgressRenderer::new(100.0, "connecting...")
        } else {
            ProgressRenderer::hidden(100.0, "connecting...")
        };

        // On error the bar is cleared by its Drop impl
        let written = self.stream_to_file(response, dest, total, &mut bar).await?;
        bar.complete("download complete");
        log::info!("downloaded {written} bytes to {}", dest.display());
        Ok(written)
    }

    async fn stream_to_file(
        &self,
        response: reqwest::Response,
        dest: &Path,
        total: u64,
        bar: &mut ProgressRenderer,
    ) -> Result<u64, NetworkError> {
        let write_err = |source| NetworkError::Write {
            path: dest.to_path_buf(),
            source,
        };
        let mut file = tokio::fs::File::create(dest).await.map_err(write_err)?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        loop {
            let chunk = match timeout(self.inactivity_timeout, stream.next()).await {
                Ok(Some(chunk)) => chunk?,
                Ok(None) => break,
                Err(_) => {
                    return Err(NetworkError::Timeout {
                        secs: self.inactivity_timeout.as_secs(),
                        downloaded,
                    });
                }
            };
            file.write_all(&chunk).await.map_err(write_err)?;
            downloaded += chunk.len() as u64;

            if total > 0 {
                let pct = downloaded as f64 / total as f64 * 100.0;
                bar.update(pct, &byte_status(downloaded, total));
            } else {
                bar.update(0.0, "downloading...");
            }
        }

        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        Ok(downloaded)
    }
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// `"12.3MB / 80.0MB"`
pub fn byte_status(downloaded: u64, total: u64) -> String {
    format!(
        "{:.1}MB / {:.1}MB",
        downloaded as f64 / MIB,
        total as f64 / MIB
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_status_uses_one_decimal_mebibytes() {
        assert_eq!(byte_status(0, 1024 * 1024), "0.0MB / 1.0MB");
        assert_eq!(byte_status(1536 * 1024, 80 * 1024 * 1024), "1.5MB / 80.0MB");
    }

    #[test]
    fn only_redirect_codes_are_followed() {
        assert!(is_followed_redirect(StatusCode::FOUND));
        assert!(is_followed_redirect(StatusCode::PERMANENT_REDIRECT));
        assert!(!is_followed_redirect(StatusCode::NOT_MODIFIED));
        assert!(!is_followed_redirect(StatusCode::OK));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let err = Downloader::new()
            .unwrap()
            .hidden()
            .download("not a url", &dir.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidUrl { .. }));
    }
}
