//! Bounded download of remote images.

use crate::error::{IngestError, IngestErrorExt};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Upper bound for one whole request/response cycle.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Bytes read from a response body; anything beyond is discarded.
pub const MAX_DOWNLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Parses `raw` and accepts only `http`/`https` URLs with a non-empty host.
///
/// # Errors
/// Returns [`IngestError::InvalidUrl`] for anything else.
///
/// # Examples
///
/// ```rust
/// use fc_ingest::parse_source_url;
///
/// assert!(parse_source_url("https://cdn.example.com/a.png").is_ok());
/// assert!(parse_source_url("ftp://example.com/x.jpg").is_err());
/// assert!(parse_source_url("not a url").is_err());
/// ```
pub fn parse_source_url(raw: &str) -> Result<Url, IngestError> {
    let url = Url::parse(raw).map_err(|e| IngestError::InvalidUrl {
        message: format!("{raw}: {e}").into(),
        context: None,
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(IngestError::InvalidUrl {
            message: format!("unsupported scheme {}", url.scheme()).into(),
            context: None,
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(IngestError::InvalidUrl { message: "missing host".into(), context: None });
    }

    Ok(url)
}

/// HTTP client with a request timeout and a body size cap.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl Fetcher {
    /// Client with [`FETCH_TIMEOUT`] and [`MAX_DOWNLOAD_BYTES`].
    pub fn new() -> Result<Self, IngestError> {
        Self::with_limits(FETCH_TIMEOUT, MAX_DOWNLOAD_BYTES)
    }

    pub fn with_limits(timeout: Duration, max_bytes: usize) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, max_bytes })
    }

    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Downloads `url` and returns at most [`Fetcher::max_bytes`] of its body.
    ///
    /// An oversized body is truncated with a warning rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Fetch`] on transport errors or timeout and
    /// [`IngestError::FetchStatus`] for any status other than `200 OK`.
    pub async fn fetch(&self, url: &Url) -> Result<Vec<u8>, IngestError> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .context(format!("GET {url}"))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(IngestError::FetchStatus {
                message: format!("{url} answered {status}").into(),
                context: None,
            });
        }

        let capacity = response
            .content_length()
            .and_then(|len| usize::try_from(len).ok())
            .map_or(0, |len| len.min(self.max_bytes));
        let mut body = Vec::with_capacity(capacity);
        let mut truncated = false;

        while let Some(chunk) = response.chunk().await.context(format!("Reading body of {url}"))? {
            let remaining = self.max_bytes - body.len();
            if chunk.len() > remaining {
                body.extend_from_slice(&chunk[..remaining]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }

        if truncated {
            warn!(url = %url, limit = self.max_bytes, "Download exceeded size limit, body truncated");
        }
        debug!(url = %url, bytes = body.len(), "Downloaded image data");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        let url = parse_source_url("http://example.com/a.jpg").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert!(parse_source_url("https://cdn.discordapp.com/attachments/1/2/a.png?x=1").is_ok());
        assert!(parse_source_url("http://127.0.0.1:8080/a.png").is_ok());
    }

    #[test]
    fn test_rejects_other_schemes_and_garbage() {
        for raw in [
            "ftp://example.com/x.jpg",
            "file:///etc/passwd",
            "data:image/png;base64,AAAA",
            "javascript:alert(1)",
            "example.com/a.png",
            "",
            "http://",
        ] {
            let err = parse_source_url(raw).unwrap_err();
            assert!(matches!(err, IngestError::InvalidUrl { .. }), "{raw} was accepted");
        }
    }
}
