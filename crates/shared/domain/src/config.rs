use crate::constants::{DEFAULT_IMAGES_DIR, DEFAULT_LOG_LEVEL, DEFAULT_PORT, DEFAULT_QUALITY};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level service configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

impl From<ApiConfigInner> for ApiConfig {
    fn from(inner: ApiConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Image store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of the stored images. Must exist.
    pub images_dir: PathBuf,
    /// Public URL prefix under which `images_dir` is served. Required.
    pub base_url: String,
    /// WebP quality, 1 to 100.
    pub quality: u8,
}

impl StorageConfig {
    /// Public URL of a stored object: the base URL without surrounding slashes, a `/`, then
    /// the relative path.
    ///
    /// ```rust
    /// use fc_domain::config::StorageConfig;
    ///
    /// let cfg = StorageConfig { base_url: "https://img.example.com/".into(), ..Default::default() };
    /// assert_eq!(cfg.public_url("a/b.webp"), "https://img.example.com/a/b.webp");
    /// ```
    #[must_use]
    pub fn public_url(&self, relative: &str) -> String {
        format!("{}/{relative}", self.base_url.trim_matches('/'))
    }
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Writes daily-rotated log files here in addition to the console.
    pub directory: Option<PathBuf>,
    /// JSON lines instead of human-readable output.
    pub json: bool,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: DEFAULT_PORT, ssl: None }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            base_url: String::new(),
            quality: DEFAULT_QUALITY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_owned(), directory: None, json: false }
    }
}
