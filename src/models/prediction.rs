use serde::{Deserialize, Serialize};

/// The response data of a successful `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PredictionOutcome {
    /// The confidence, in scientific notation
    pub(crate) prediction: String,
    pub(crate) description: String,
    pub(crate) url: String,
}
