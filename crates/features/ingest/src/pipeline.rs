use crate::codec::{ImageCodec, Quality, WebpCodec};
use crate::error::IngestError;
use crate::fetch::{Fetcher, parse_source_url};
use fc_storage::{ObjectId, Storage, StorageError, StoredObject};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Download, transcode and persist in one call.
///
/// Cloning is cheap; all parts are shared handles.
#[derive(Debug, Clone)]
pub struct Ingestor {
    fetcher: Fetcher,
    codec: Arc<dyn ImageCodec>,
    storage: Storage,
}

impl Ingestor {
    /// Ingestor with the default [`Fetcher`] and the WebP codec.
    pub fn new(storage: Storage) -> Result<Self, IngestError> {
        Self::with_parts(storage, Fetcher::new()?, Arc::new(WebpCodec))
    }

    /// # Errors
    /// Returns [`IngestError::Internal`] when the codec output does not match the extension
    /// the store names its files with.
    pub fn with_parts(
        storage: Storage,
        fetcher: Fetcher,
        codec: Arc<dyn ImageCodec>,
    ) -> Result<Self, IngestError> {
        if codec.extension() != storage.extension() {
            return Err(IngestError::Internal {
                message: format!(
                    "codec produces .{} files but the store names them .{}",
                    codec.extension(),
                    storage.extension()
                )
                .into(),
                context: None,
            });
        }
        Ok(Self { fetcher, codec, storage })
    }

    #[must_use]
    pub const fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Fetches `source_url`, re-encodes it at `quality` and stores it under `segments`.
    ///
    /// The URL and the identity segment are both checked before any network traffic.
    ///
    /// # Errors
    ///
    /// - [`IngestError::InvalidUrl`] for a malformed or non-http(s) URL.
    /// - [`IngestError::Fetch`] / [`IngestError::FetchStatus`] when the download fails.
    /// - [`IngestError::Decode`] / [`IngestError::Encode`] when transcoding fails.
    /// - [`IngestError::Storage`] carrying the store's error unchanged.
    pub async fn ingest<S: AsRef<str>>(
        &self,
        source_url: &str,
        segments: &[S],
        quality: Quality,
    ) -> Result<StoredObject, IngestError> {
        let url = parse_source_url(source_url)?;

        let identity: &str = segments.last().map_or("", |s| s.as_ref());
        if !ObjectId::is_valid(identity) {
            return Err(StorageError::InvalidIdentifier {
                message: format!("{identity} is not a valid character ID").into(),
                context: None,
            }
            .into());
        }

        let started = Instant::now();
        let bytes = self.fetcher.fetch(&url).await?;
        let downloaded = bytes.len();

        let codec = Arc::clone(&self.codec);
        let encoded = tokio::task::spawn_blocking(move || {
            let image = codec.decode(&bytes)?;
            codec.encode(&image, quality)
        })
        .await
        .map_err(|e| IngestError::Internal {
            message: e.to_string().into(),
            context: Some("Transcoding task failed".into()),
        })??;

        let stored = self.storage.put(&encoded, segments).await?;

        info!(
            url = %url,
            path = %stored.relative,
            downloaded,
            bytes = encoded.len(),
            quality = quality.get(),
            elapsed = ?started.elapsed(),
            "Image ingested"
        );
        Ok(stored)
    }
}
