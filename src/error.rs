use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{ContentLengthLimitRejection, FormRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use thiserror::Error;

use crate::constants::{INTERNAL_SERVER_ERROR_MESSAGE, MAX_UPLOAD_BYTES};
use crate::models::Envelope;
use crate::predictor::PredictorError;

/// Any possible server errors
#[derive(Debug, Error)]
pub(crate) enum NailError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error(transparent)]
    AxumFormRejection(#[from] FormRejection),

    #[error(transparent)]
    AxumMultipartRejection(#[from] MultipartRejection),

    #[error(transparent)]
    AxumMultipartError(#[from] MultipartError),

    #[error(transparent)]
    AxumPathRejection(#[from] PathRejection),

    #[error("request body is too large, files are limited to {} bytes", MAX_UPLOAD_BYTES)]
    PayloadTooLarge,

    #[error("a Content-Length header is required")]
    LengthRequired,

    #[error("email is already registered")]
    Conflict,

    #[error("wrong email or password")]
    Unauthorized,

    #[error("prediction history is empty")]
    NotFound,

    #[error(transparent)]
    Upstream(#[from] PredictorError),

    #[error(transparent)]
    Storage(#[from] object_store::Error),

    #[error("upload to object storage timed out")]
    StorageTimeout,

    #[error(transparent)]
    Persistence(#[from] sea_orm::DbErr),

    #[error("password hashing failed: {0:?}")]
    Hash(libreauth::pass::ErrorCode),
}

impl IntoResponse for NailError {
    fn into_response(self) -> Response {
        let (status, message, data): (StatusCode, String, Option<Value>) = match self {
            NailError::InvalidInput(_) => {
                let message = format!("Input validation error: [{}]", self).replace('\n', ", ");
                tracing::debug!("{}", message);
                (StatusCode::BAD_REQUEST, message, None)
            }
            NailError::Validation(_)
            | NailError::AxumFormRejection(_)
            | NailError::AxumMultipartRejection(_)
            | NailError::AxumMultipartError(_)
            | NailError::AxumPathRejection(_) => {
                tracing::debug!("Rejected input: {}", self);
                (StatusCode::BAD_REQUEST, self.to_string(), None)
            }
            NailError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string(), None),
            NailError::LengthRequired => (StatusCode::LENGTH_REQUIRED, self.to_string(), None),
            NailError::Conflict => (StatusCode::CONFLICT, self.to_string(), None),
            NailError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), None),
            NailError::NotFound => (StatusCode::NOT_FOUND, self.to_string(), None),
            NailError::Upstream(PredictorError::Rejected { status, body }) => {
                tracing::warn!("Prediction service answered {}: {:?}", status, body);
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let message = body
                    .as_ref()
                    .and_then(|body| body.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("prediction service rejected the image")
                    .to_owned();
                (status, message, body)
            }
            NailError::Upstream(PredictorError::Transport(e)) => {
                tracing::error!("Prediction service call failed: {:?}", e);
                internal()
            }
            NailError::Storage(e) => {
                tracing::error!("Object storage error occurred: {:?}", e);
                internal()
            }
            NailError::StorageTimeout => {
                tracing::error!("{}", self);
                internal()
            }
            NailError::Persistence(e) => {
                tracing::error!("Database error occurred: {:?}", e);
                internal()
            }
            NailError::Hash(e) => {
                tracing::error!("Password hasher failed: {:?}", e);
                internal()
            }
        };

        Envelope::error(message, data).respond(status)
    }
}

impl<T> From<ContentLengthLimitRejection<T>> for NailError
where
    T: Into<NailError>,
{
    fn from(rejection: ContentLengthLimitRejection<T>) -> Self {
        match rejection {
            ContentLengthLimitRejection::PayloadTooLarge(_) => NailError::PayloadTooLarge,
            ContentLengthLimitRejection::LengthRequired(_) => NailError::LengthRequired,
            ContentLengthLimitRejection::Inner(inner) => inner.into(),
            // a body on GET, HEAD or OPTIONS
            _ => NailError::Validation("this request must not carry a body".into()),
        }
    }
}

fn internal() -> (StatusCode, String, Option<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_SERVER_ERROR_MESSAGE.into(),
        None,
    )
}
