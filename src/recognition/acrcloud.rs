use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, error};

use super::interface::{slice_range, Recognizer, RecognizerError};
use super::signature::{sign, HTTP_URI, SIGNATURE_VERSION};
use crate::config::RecognizerConfig;

const DATA_TYPE: &str = "audio";

/// Client for the hosted ACRCloud identify endpoint
///
/// The audio is submitted as-is; fingerprint extraction happens on the
/// service side.
#[derive(Debug, Clone)]
pub struct AcrCloudClient {
    client: Client,
}

impl AcrCloudClient {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn identify_url(host: &str) -> String {
        let host = host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}{}", host, HTTP_URI)
        } else {
            format!("https://{}{}", host, HTTP_URI)
        }
    }

    fn build_form(sample: &[u8], config: &RecognizerConfig, timestamp: i64) -> Form {
        let signature = sign(&config.access_key, &config.access_secret, DATA_TYPE, timestamp);

        Form::new()
            .part("sample", Part::bytes(sample.to_vec()).file_name("sample"))
            .text("sample_bytes", sample.len().to_string())
            .text("access_key", config.access_key.clone())
            .text("data_type", DATA_TYPE)
            .text("signature_version", SIGNATURE_VERSION)
            .text("signature", signature)
            .text("timestamp", timestamp.to_string())
    }
}

impl Default for AcrCloudClient {
    fn default() -> Self {
        Self::new()
    }
}

fn transport_error(e: reqwest::Error) -> RecognizerError {
    if e.is_timeout() {
        RecognizerError::Timeout
    } else {
        RecognizerError::Transport(e.to_string())
    }
}

#[async_trait]
impl Recognizer for AcrCloudClient {
    async fn recognize_by_buffer(
        &self,
        audio: &[u8],
        offset: usize,
        length: usize,
        config: &RecognizerConfig,
    ) -> Result<String, RecognizerError> {
        let sample = slice_range(audio, offset, length)?;
        let url = Self::identify_url(&config.host);
        let timestamp = chrono::Utc::now().timestamp();

        debug!("Submitting {} bytes to {}", sample.len(), url);

        let response = self
            .client
            .post(&url)
            .timeout(config.timeout)
            .multipart(Self::build_form(sample, config, timestamp))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            error!("Recognition service returned HTTP {}", status);
            return Err(RecognizerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}
