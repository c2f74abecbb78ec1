use axum::{
    async_trait,
    body::{Bytes, HttpBody},
    extract::{ContentLengthLimit, Form, FromRequest, Multipart, RequestParts},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    BoxError,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::Validate;

use crate::constants::MAX_FORM_BYTES;
use crate::error::NailError;
use crate::models::Envelope;

pub(crate) mod history;
pub(crate) mod login;
pub(crate) mod predict;
pub(crate) mod user;

pub(crate) use history::*;
pub(crate) use login::*;
pub(crate) use predict::*;
pub(crate) use user::*;

/// A validated form with some input.
///
/// Accepts both `application/x-www-form-urlencoded` and `multipart/form-data` bodies. For the
/// latter, every field is read as text. Bodies over `MAX_FORM_BYTES` are refused before anything
/// is read.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ValidatedForm<T>(pub(crate) T);

#[async_trait]
impl<T, B> FromRequest<B> for ValidatedForm<T>
where
    T: DeserializeOwned + Validate,
    B: HttpBody<Data = Bytes> + Default + Unpin + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Rejection = NailError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let value = if is_multipart(req.headers()) {
            let ContentLengthLimit(multipart) =
                ContentLengthLimit::<Multipart, MAX_FORM_BYTES>::from_request(req).await?;
            from_multipart(multipart).await?
        } else {
            let ContentLengthLimit(Form(value)) =
                ContentLengthLimit::<Form<T>, MAX_FORM_BYTES>::from_request(req).await?;
            value
        };
        value.validate()?;
        Ok(ValidatedForm(value))
    }
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

async fn from_multipart<T: DeserializeOwned>(mut multipart: Multipart) -> Result<T, NailError> {
    let mut fields = Map::new();
    while let Some(field) = multipart.next_field().await? {
        let name = match field.name() {
            Some(name) => name.to_owned(),
            None => continue,
        };
        fields.insert(name, Value::String(field.text().await?));
    }
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| NailError::Validation(format!("Failed to deserialize form: {}", e)))
}

/// Handler for `GET /`
pub(crate) async fn health() -> Response {
    Envelope::<()>::success("ok", None).respond(StatusCode::OK)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use axum::{body::Body, http::Request};
    use object_store::memory::InMemory;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn health_answers_ok() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let state = state(db, idle_predictor(), Arc::new(InMemory::new()));

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, body) = send(state, request).await;

        assert_eq!(status, 200);
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "ok");
    }
}
