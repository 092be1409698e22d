//! # Image Ingestion
//!
//! Turns a remote image URL into a stored WebP file:
//!
//! 1. **Validation**: only `http`/`https` URLs with a host pass ([`parse_source_url`]).
//! 2. **Download**: [`Fetcher`] bounds the whole exchange by a 30 second timeout and reads at
//!    most 100 MiB of the body.
//! 3. **Transcode**: an [`ImageCodec`] decodes whatever format was served and re-encodes it as
//!    lossy WebP on the blocking pool.
//! 4. **Persist**: the result is handed to [`fc_storage::Storage::put`] (write-once).

mod codec;
mod error;
mod fetch;
mod pipeline;

pub use codec::{ImageCodec, Quality, WebpCodec};
pub use error::{IngestError, IngestErrorExt};
pub use fetch::{FETCH_TIMEOUT, Fetcher, MAX_DOWNLOAD_BYTES, parse_source_url};
pub use pipeline::Ingestor;
