//! Image decoding and WebP transcoding.

use crate::error::IngestError;
use image::DynamicImage;
use std::fmt;

/// Lossy encoder quality, 1 (smallest) to 100 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const DEFAULT: Self = Self(90);
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;

    /// # Errors
    /// Returns [`IngestError::InvalidQuality`] outside `1..=100`.
    pub fn new(value: u8) -> Result<Self, IngestError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(IngestError::InvalidQuality {
                message: format!("{value} is outside {}..={}", Self::MIN, Self::MAX).into(),
                context: None,
            })
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Quality {
    type Error = IngestError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Decodes arbitrary image bytes and re-encodes them into the stored format.
///
/// Both methods are CPU bound and blocking; callers run them on the blocking pool.
pub trait ImageCodec: fmt::Debug + Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, IngestError>;

    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, IngestError>;

    /// File extension of encoded output, without the dot.
    fn extension(&self) -> &'static str;
}

/// Sniffs the input format, encodes lossy WebP with the fastest method.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpCodec;

impl ImageCodec for WebpCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, IngestError> {
        Ok(image::load_from_memory(bytes)?)
    }

    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, IngestError> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut config = webp::WebPConfig::new().map_err(|()| IngestError::Encode {
            message: "libwebp rejected the default configuration".into(),
            context: None,
        })?;
        config.lossless = 0;
        config.quality = f32::from(quality.get());
        config.method = 0;

        let encoded = webp::Encoder::from_rgba(rgba.as_raw(), width, height)
            .encode_advanced(&config)
            .map_err(|e| IngestError::Encode {
                message: format!("{e:?}").into(),
                context: Some(format!("{width}x{height} at quality {quality}").into()),
            })?;

        Ok(encoded.to_vec())
    }

    fn extension(&self) -> &'static str {
        "webp"
    }
}
