use fc_storage::StorageError;
use std::borrow::Cow;

/// Error types specific to image ingestion.
#[fc_derive::fc_error]
pub enum IngestError {
    #[error("Invalid image URL{}: {message}", format_context(.context))]
    InvalidUrl { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid quality{}: {message}", format_context(.context))]
    InvalidQuality { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Transport failure, including the request timeout.
    #[error("Image download failed{}: {source}", format_context(.context))]
    Fetch { source: reqwest::Error, context: Option<Cow<'static, str>> },

    /// The remote answered with anything but `200 OK`.
    #[error("Image download failed{}: {message}", format_context(.context))]
    FetchStatus { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Image decoding failed{}: {source}", format_context(.context))]
    Decode { source: image::ImageError, context: Option<Cow<'static, str>> },

    #[error("Image encoding failed{}: {message}", format_context(.context))]
    Encode { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("{source}")]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal ingestion error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
