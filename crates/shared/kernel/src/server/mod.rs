//! HTTP surface: shared state, handlers, error mapping and route tables.

mod error;
mod health;
mod images;
pub mod router;
mod state;

pub use error::{ApiError, ErrorBody};
pub use health::{HealthResponse, __path_health_handler, health_handler};
pub use images::{
    UploadRequest, __path_delete_character, __path_delete_image, __path_upload_image,
    delete_character, delete_image, upload_image,
};
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateErrorExt, ApiStateInner};
