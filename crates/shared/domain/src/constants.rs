//! Names and defaults shared by the configuration loader, the CLI and the HTTP layer.

/// Binary and service name.
pub const APP_NAME: &str = "faceclaimer";

/// Prefix of environment variables that override configuration, e.g.
/// `FACECLAIMER__STORAGE__BASE_URL`.
pub const ENV_PREFIX: &str = "FACECLAIMER";
/// Separator between nested configuration keys in environment variables.
pub const ENV_SEPARATOR: &str = "__";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_QUALITY: u8 = 90;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Path prefix of the image routes; single deletes append a wildcard path to it.
pub const IMAGE_ROUTE: &str = "/image";

/// `OpenAPI` tag of operational endpoints.
pub const SYSTEM_TAG: &str = "System";
/// `OpenAPI` tag of the image endpoints.
pub const IMAGES_TAG: &str = "Images";
