use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fc_ingest::IngestError;
use fc_storage::StorageError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{error, warn};
use utoipa::ToSchema;

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// An error on its way to the client: a status code and the message it will see.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: Cow<'static, str>,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self { status, message: message.into(), detail: None }
    }

    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Server-side detail, logged but never sent.
    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        // Storage messages carry absolute paths; only the identifier check echoes caller input.
        let (status, message): (StatusCode, Cow<'static, str>) = match &err {
            StorageError::InvalidIdentifier { message, .. } => {
                (StatusCode::BAD_REQUEST, message.clone())
            },
            StorageError::PathTraversalAttempt { .. } => (StatusCode::BAD_REQUEST, "invalid path".into()),
            StorageError::IsDirectory { .. } => {
                (StatusCode::BAD_REQUEST, "Cannot delete directory".into())
            },
            StorageError::NotFound { .. } => (StatusCode::NOT_FOUND, "Image not found".into()),
            StorageError::AlreadyExists { .. }
            | StorageError::Io { .. }
            | StorageError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal storage error".into())
            },
        };
        Self::new(status, message).with_detail(err.to_string())
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Storage { source, .. } => source.into(),
            IngestError::InvalidUrl { .. } => {
                Self::bad_request("invalid image URL").with_detail(err.to_string())
            },
            IngestError::Fetch { .. } | IngestError::FetchStatus { .. } => {
                Self::new(StatusCode::BAD_GATEWAY, "failed to download image")
                    .with_detail(err.to_string())
            },
            IngestError::Decode { .. } | IngestError::Encode { .. } => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "failed to convert image")
                    .with_detail(err.to_string())
            },
            IngestError::InvalidQuality { .. } | IngestError::Internal { .. } => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
                    .with_detail(err.to_string())
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.detail.as_deref().unwrap_or_default();
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, detail, "Request failed");
        } else {
            warn!(status = %self.status, error = %self.message, detail, "Request rejected");
        }

        (self.status, Json(ErrorBody { error: self.message.into_owned() })).into_response()
    }
}
