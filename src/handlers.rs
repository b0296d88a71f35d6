use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::RecognizeError;
use crate::recognition::{recognize_upload, UploadForm};
use crate::state::AppState;

/// `POST /api/recognize`
pub async fn recognize(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = Uuid::new_v4();

    async move {
        let form = match multipart {
            Ok(multipart) => read_upload(multipart).await,
            Err(rejection) => {
                // Not a multipart body, so there is no audio field to find
                warn!("Request body is not multipart form data: {}", rejection);
                Ok(UploadForm::new())
            }
        };

        let result = match form {
            Ok(form) => {
                recognize_upload(
                    &form,
                    &state.config.acrcloud,
                    state.recognizer.as_ref(),
                    &state.diagnostics,
                )
                .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
            Err(e) => e.into_response(),
        }
    }
    .instrument(info_span!("recognize", %request_id))
    .await
}

/// Buffer every field of the form in memory
async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, RecognizeError> {
    let mut form = UploadForm::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return keep_partial(form, e),
        };

        let name = field.name().unwrap_or_default().to_string();
        match field.bytes().await {
            Ok(data) => form.insert(name, data),
            Err(e) => return keep_partial(form, e),
        }
    }

    Ok(form)
}

/// A malformed or truncated stream keeps the fields read so far.
/// Only an exceeded body limit fails the upload.
fn keep_partial(form: UploadForm, e: MultipartError) -> Result<UploadForm, RecognizeError> {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Multipart upload exceeds the body limit: {}", e);
        return Err(RecognizeError::Upload {
            status: e.status(),
            message: e.body_text(),
        });
    }

    warn!(
        "Multipart upload ended early after {} complete fields: {}",
        form.len(),
        e
    );
    Ok(form)
}

/// `GET /` and `GET /api/test`
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "message": "Flask API is working!"
    }))
}

/// `POST /api/debug_log`
pub async fn debug_log(Json(payload): Json<Value>) -> Json<Value> {
    let pretty = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
    info!("--- DEBUG JSON START ---\n{}\n--- DEBUG JSON END ---", pretty);

    Json(json!({ "success": true }))
}
