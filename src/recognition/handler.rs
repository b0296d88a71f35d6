use axum::body::Bytes;
use std::time::Instant;
use tracing::{error, info, warn};

use super::interface::{Recognizer, RecognizerError};
use crate::config::AcrCloudConfig;
use crate::diagnostics::Diagnostics;
use crate::error::RecognizeError;

/// Name of the multipart field carrying the audio payload
pub const AUDIO_FIELD: &str = "audio";

/// Named fields of an inbound form, independent of the transport
pub trait FormFields {
    fn field(&self, name: &str) -> Option<&[u8]>;
}

/// A fully buffered multipart form
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    fields: Vec<(String, Bytes)>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Bytes>) {
        self.fields.push((name.into(), data.into()));
    }

    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }
}

impl FormFields for UploadForm {
    /// The first field with a matching name wins
    fn field(&self, name: &str) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_ref())
    }
}

/// Turn one uploaded form into one recognition call.
///
/// Order of checks: audio present, then configuration complete, then the
/// external call. Nothing reaches the recognizer unless both checks pass.
/// On success the service's body is returned untouched.
pub async fn recognize_upload<F>(
    form: &F,
    config: &AcrCloudConfig,
    recognizer: &dyn Recognizer,
    diagnostics: &Diagnostics,
) -> Result<String, RecognizeError>
where
    F: FormFields + ?Sized,
{
    let audio = form.field(AUDIO_FIELD).ok_or_else(|| {
        warn!("Recognition request without an '{}' field", AUDIO_FIELD);
        RecognizeError::MissingAudio
    })?;

    let recognizer_config = config.credentials().ok_or_else(|| {
        error!("ACRCloud host, access key or access secret is not configured");
        RecognizeError::MissingConfiguration
    })?;

    let started = Instant::now();
    let call = recognizer.recognize_by_buffer(audio, 0, audio.len(), &recognizer_config);

    let result = match tokio::time::timeout(recognizer_config.timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(RecognizerError::Timeout),
    };

    match result {
        Ok(body) => {
            info!(
                "ACRCloud result ({} bytes audio, {} ms): {}",
                audio.len(),
                started.elapsed().as_millis(),
                body
            );
            diagnostics.record_result(&body).await;
            Ok(body)
        }
        Err(e) => {
            error!(
                "ACRCloud recognition failed after {} ms: {}",
                started.elapsed().as_millis(),
                e
            );
            Err(RecognizeError::RecognitionFailure(e.to_string()))
        }
    }
}
