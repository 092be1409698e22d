use super::state::ApiState;
use super::{health, images};
use axum::routing::delete;
use fc_domain::constants::IMAGE_ROUTE;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub fn system_router<S>() -> OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
{
    OpenApiRouter::<S>::new().routes(routes!(health::health_handler))
}

/// Upload and deletion endpoints.
///
/// The single-image delete takes a wildcard path, which the `OpenAPI` router cannot
/// derive from the handler; it is mounted by hand and documented separately.
pub fn image_router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::<ApiState>::new()
        .routes(routes!(images::upload_image))
        .routes(routes!(images::delete_character))
        .route(&format!("{IMAGE_ROUTE}/{{*image_path}}"), delete(images::delete_image))
}
