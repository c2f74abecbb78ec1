use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Outcome tag of an [`Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Status {
    Success,
    Error,
}

/// The `{status, message, data}` body shared by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope<T> {
    pub(crate) status: Status,
    pub(crate) message: String,
    pub(crate) data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub(crate) fn success(message: impl Into<String>, data: Option<T>) -> Self {
        Envelope {
            status: Status::Success,
            message: message.into(),
            data,
        }
    }

    pub(crate) fn error(message: impl Into<String>, data: Option<T>) -> Self {
        Envelope {
            status: Status::Error,
            message: message.into(),
            data,
        }
    }

    /// Serialize into a JSON response with the given status code.
    pub(crate) fn respond(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}
