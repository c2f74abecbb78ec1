use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartRejection, rejection::ContentLengthLimitRejection, ContentLengthLimit,
        Extension, Multipart,
    },
    http::StatusCode,
    response::Response,
};
use chrono::Utc;
use entity::prediction;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;

use crate::constants::{FILE_FIELD, MAX_PREDICT_REQUEST_BYTES, MAX_UPLOAD_BYTES, USER_ID_FIELD};
use crate::error::NailError;
use crate::models::{Envelope, PredictionOutcome};
use crate::predictor::Upload;
use crate::server::State;
use crate::utils::{blob_name, to_exponential};

const NO_FILE_MESSAGE: &str = "file not found";

/// The multipart input of a `POST /predict` request, as far as we care about it.
#[derive(Debug, Default)]
struct PredictInput {
    file: Option<Upload>,
    user_id: Option<String>,
}

impl PredictInput {
    async fn read(mut multipart: Multipart) -> Result<Self, NailError> {
        let mut input = PredictInput::default();

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some(FILE_FIELD) => {
                    let file_name = field.file_name().unwrap_or_default().to_owned();
                    let content_type = field.content_type().map(|mime| mime.to_string());

                    let mut buf = Vec::new();
                    while let Some(chunk) = field.chunk().await? {
                        if buf.len() + chunk.len() > MAX_UPLOAD_BYTES {
                            return Err(NailError::PayloadTooLarge);
                        }
                        buf.extend_from_slice(&chunk);
                    }

                    // browsers send an empty, nameless part when no file was picked
                    if file_name.is_empty() && buf.is_empty() {
                        continue;
                    }
                    input.file = Some(Upload {
                        file_name,
                        content_type,
                        bytes: Bytes::from(buf),
                    });
                }
                Some(USER_ID_FIELD) => input.user_id = Some(field.text().await?),
                _ => {}
            }
        }

        Ok(input)
    }
}

/// Handler for `POST /predict`
///
/// Scores the image, stores it, then records the prediction. The blob and the row are written in
/// that order and not atomically: if the insert fails, the blob stays behind unreferenced.
pub(crate) async fn predict(
    state: Extension<Arc<State>>,
    multipart: Result<
        ContentLengthLimit<Multipart, MAX_PREDICT_REQUEST_BYTES>,
        ContentLengthLimitRejection<MultipartRejection>,
    >,
) -> Result<Response, NailError> {
    let ContentLengthLimit(multipart) = multipart.map_err(|rejection| match rejection {
        // not multipart at all, so certainly no file
        ContentLengthLimitRejection::Inner(_) => NailError::Validation(NO_FILE_MESSAGE.into()),
        other => other.into(),
    })?;
    let input = PredictInput::read(multipart).await?;

    let upload = input
        .file
        .ok_or_else(|| NailError::Validation(NO_FILE_MESSAGE.into()))?;
    let user_id = input
        .user_id
        .as_deref()
        .and_then(|id| id.trim().parse::<i32>().ok())
        .ok_or_else(|| NailError::Validation("user_id must be an integer".into()))?;

    let verdict = state.predictor.predict(&upload).await?;
    tracing::debug!(
        "Prediction for user {}: {} ({})",
        user_id,
        verdict.prediction,
        verdict.description
    );

    let name = blob_name(&upload.file_name, Utc::now());
    let url = state.blobs.put(&name, &upload).await?;

    let row = prediction::ActiveModel {
        confidence: Set(verdict.prediction),
        description: Set(verdict.description.clone()),
        url: Set(url.clone()),
        user_id: Set(user_id),
        ..Default::default()
    };
    if let Err(e) = row.insert(&state.db).await {
        tracing::error!("Blob {} is orphaned, its prediction row was not saved", url);
        return Err(e.into());
    }

    Ok(Envelope::success(
        "prediction succeeded",
        Some(PredictionOutcome {
            prediction: to_exponential(verdict.prediction),
            description: verdict.description,
            url,
        }),
    )
    .respond(StatusCode::OK))
}
