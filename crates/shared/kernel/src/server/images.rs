use super::error::{ApiError, ErrorBody};
use super::state::ApiState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use fc_domain::constants::IMAGES_TAG;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

/// Upload request: where to fetch the image and which character it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadRequest {
    /// Character identifier, 24 hex characters.
    #[schema(example = "507f1f77bcf86cd799439011")]
    pub charid: String,
    /// `http` or `https` URL of the source image.
    #[schema(example = "https://cdn.example.com/portrait.png")]
    pub image_url: String,
    /// Discord guild the request originates from. Logged only.
    #[serde(default)]
    pub guild: Option<u64>,
    /// Discord user the request originates from. Logged only.
    #[serde(default)]
    pub user: Option<u64>,
}

/// Downloads an image, converts it to WebP and stores it under the character.
///
/// Responds with the public URL of the stored image.
#[utoipa::path(
    post,
    path = "/image/upload",
    request_body = UploadRequest,
    responses(
        (status = CREATED, description = "Public URL of the stored image", body = String),
        (status = BAD_REQUEST, description = "Malformed body, URL or character ID", body = ErrorBody),
        (status = BAD_GATEWAY, description = "The image could not be downloaded", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Decoding, encoding or storage failed", body = ErrorBody),
    ),
    tag = IMAGES_TAG,
)]
pub async fn upload_image(
    State(state): State<ApiState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<String>), ApiError> {
    let Json(request) = payload?;
    info!(
        user = ?request.user,
        guild = ?request.guild,
        char_id = %request.charid,
        "Image upload request"
    );

    let stored =
        state.ingestor.ingest(&request.image_url, &[request.charid.as_str()], state.quality).await?;

    Ok((StatusCode::CREATED, Json(state.config.storage.public_url(&stored.relative))))
}

/// Deletes a single stored image and prunes directories left empty.
#[utoipa::path(
    delete,
    path = "/image/{image_path}",
    params(("image_path" = String, Path, description = "Image path relative to the images root")),
    responses(
        (status = OK, description = "Confirmation message", body = String),
        (status = BAD_REQUEST, description = "Path escapes the root or names a directory", body = ErrorBody),
        (status = NOT_FOUND, description = "Image not found", body = ErrorBody),
    ),
    tag = IMAGES_TAG,
)]
pub async fn delete_image(
    State(state): State<ApiState>,
    Path(image_path): Path<String>,
) -> Result<Json<String>, ApiError> {
    let image_path = image_path.trim_start_matches('/');
    state.storage.delete_one(&[image_path]).await?;

    Ok(Json(format!("Deleted {image_path}")))
}

/// Deletes every image of a character and prunes directories left empty.
#[utoipa::path(
    delete,
    path = "/character/{char_id}",
    params(("char_id" = String, Path, description = "Character identifier, 24 hex characters")),
    responses(
        (status = OK, description = "Confirmation message", body = String),
        (status = BAD_REQUEST, description = "Invalid character ID", body = ErrorBody),
        (status = NOT_FOUND, description = "Character has no images", body = ErrorBody),
    ),
    tag = IMAGES_TAG,
)]
pub async fn delete_character(
    State(state): State<ApiState>,
    Path(char_id): Path<String>,
) -> Result<Json<String>, ApiError> {
    state.storage.delete_subtree(&[char_id.as_str()]).await?;

    Ok(Json(format!("Deleted all images: {char_id}")))
}
