//! Kernel utilities shared by the service binary.
//! Keep this crate lightweight: configuration loading and validation, plus the HTTP surface
//! (behind the `server` feature).
//!
//! ## Config loading
//! ```rust,no_run
//! use fc_kernel::config::{load_config, validate_config};
//! use fc_kernel::domain::config::ApiConfig;
//!
//! let mut cfg: ApiConfig = load_config(Some("faceclaimer.toml")).unwrap();
//! validate_config(&mut cfg).unwrap();
//! ```
pub mod config;
#[cfg(feature = "server")]
pub mod server;

pub use fc_domain as domain;
