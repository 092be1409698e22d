use config::{Config, Environment, File};
use fc_domain::config::ApiConfig;
use fc_domain::constants::{ENV_PREFIX, ENV_SEPARATOR};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;
use url::Url;

/// Custom error type for config loading and validation.
#[fc_derive::fc_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Invalid configuration{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Config I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}

/// A reusable configuration loader that combines file-based settings with environment overrides.
///
/// This function implements a layered configuration strategy:
/// 1. **Base File**: When `path` is given, settings are loaded from it (TOML, JSON or YAML by
///    extension). The file is then required. Without a path only defaults and the
///    environment apply.
/// 2. **Environment Overrides**: Overlays values from environment variables prefixed with
///    `FACECLAIMER__`. Nested structures are accessed using double underscores (e.g.,
///    `FACECLAIMER__STORAGE__BASE_URL` maps to `storage.base_url`).
///
/// # Errors
/// This function will return an error if:
/// * The specified configuration file cannot be found or parsed.
/// * The merged values do not match the structure of type `T`.
///
/// # Example
/// ```rust
/// use fc_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local.toml")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layers(path, None)
}

/// Same as [`load_config`] with an explicit variable map instead of the process environment.
pub fn load_config_with_env<T>(
    path: Option<impl AsRef<Path>>,
    vars: config::Map<String, String>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layers(path, Some(vars))
}

fn load_layers<T>(
    path: Option<impl AsRef<Path>>,
    vars: Option<config::Map<String, String>>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let mut builder = Config::builder();

    if let Some(path) = &path {
        let path: &Path = path.as_ref();
        info!("Loading config from {}", path.display());
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .convert_case(config::Case::Snake) // Env var overrides (e.g., FACECLAIMER__SERVER__PORT)
            .source(vars),
    );

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

/// Checks a loaded configuration and normalizes it for use.
///
/// * `storage.base_url` must be an `http`/`https` URL with a host.
/// * `storage.quality` must lie in `1..=100`.
/// * `storage.images_dir` must be an existing directory; it is made absolute.
///
/// # Errors
/// Returns [`ConfigError::Validation`] naming the first offending key.
pub fn validate_config(cfg: &mut ApiConfig) -> Result<(), ConfigError> {
    let storage = &cfg.storage;

    if storage.base_url.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "storage.base_url is required".into(),
            context: None,
        });
    }
    let base = Url::parse(&storage.base_url).map_err(|e| ConfigError::Validation {
        message: format!("storage.base_url {:?}: {e}", storage.base_url).into(),
        context: None,
    })?;
    if !matches!(base.scheme(), "http" | "https") || base.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Validation {
            message: format!("storage.base_url {:?} must be an http(s) URL", storage.base_url)
                .into(),
            context: None,
        });
    }

    if !(1..=100).contains(&storage.quality) {
        return Err(ConfigError::Validation {
            message: format!("storage.quality {} is outside 1..=100", storage.quality).into(),
            context: None,
        });
    }

    if !storage.images_dir.is_dir() {
        return Err(ConfigError::Validation {
            message: format!("storage.images_dir {} is not a directory", storage.images_dir.display())
                .into(),
            context: None,
        });
    }
    let images_dir = std::path::absolute(&storage.images_dir)
        .context(format!("Resolving {}", storage.images_dir.display()))?;

    cfg.storage.images_dir = images_dir;
    Ok(())
}
