use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Every way a recognition request can end without a service result
#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("No audio file provided")]
    MissingAudio,

    #[error("Server misconfiguration: Missing ACRCloud keys")]
    MissingConfiguration,

    #[error("{0}")]
    RecognitionFailure(String),

    /// The multipart stream itself could not be read
    #[error("{message}")]
    Upload { status: StatusCode, message: String },
}

impl RecognizeError {
    pub fn status(&self) -> StatusCode {
        match self {
            RecognizeError::MissingAudio => StatusCode::BAD_REQUEST,
            RecognizeError::MissingConfiguration => StatusCode::INTERNAL_SERVER_ERROR,
            RecognizeError::RecognitionFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RecognizeError::Upload { status, .. } => *status,
        }
    }
}

impl IntoResponse for RecognizeError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(json!({
                "error": self.to_string(),
            })),
        )
            .into_response()
    }
}
