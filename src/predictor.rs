//! The client side of the remote prediction service.

use anyhow::{Context, Result};
use axum::{async_trait, body::Bytes};
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::constants::FILE_FIELD;

/// An image as received from the client.
#[derive(Debug, Clone)]
pub(crate) struct Upload {
    /// The original file name, as the client sent it
    pub(crate) file_name: String,
    pub(crate) content_type: Option<String>,
    pub(crate) bytes: Bytes,
}

/// The answer of the prediction service. Any other field it sends is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Verdict {
    pub(crate) prediction: f64,
    pub(crate) description: String,
}

#[derive(Debug, Error)]
pub(crate) enum PredictorError {
    /// The service answered, but not with a success.
    #[error("prediction service answered with status {status}")]
    Rejected { status: u16, body: Option<Value> },

    /// The service could not be reached, timed out, or sent something unreadable.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Something that can score an image.
#[async_trait]
pub(crate) trait Predictor: Send + Sync {
    async fn predict(&self, upload: &Upload) -> Result<Verdict, PredictorError>;
}

/// Calls the prediction service over HTTP, posting the image as multipart field `file`.
pub(crate) struct HttpPredictor {
    client: Client,
    url: String,
}

impl HttpPredictor {
    pub(crate) fn try_new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(HttpPredictor {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    async fn predict(&self, upload: &Upload) -> Result<Verdict, PredictorError> {
        let mut part = Part::bytes(upload.bytes.to_vec()).file_name(upload.file_name.clone());
        if let Some(content_type) = &upload.content_type {
            part = part.mime_str(content_type)?;
        }

        let response = self
            .client
            .post(&self.url)
            .multipart(Form::new().part(FILE_FIELD, part))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // the body is passed back to our caller, so it's fine if it isn't JSON
            let body = response.json::<Value>().await.ok();
            return Err(PredictorError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Verdict>().await?)
    }
}
