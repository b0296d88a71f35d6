use std::sync::Arc;

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::recognition::{AcrCloudClient, Recognizer};

/// Read-only state shared by every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub recognizer: Arc<dyn Recognizer>,
    pub diagnostics: Diagnostics,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_recognizer(config, Arc::new(AcrCloudClient::new()))
    }

    pub fn with_recognizer(config: Config, recognizer: Arc<dyn Recognizer>) -> Self {
        let diagnostics = Diagnostics::new(&config.diagnostics);
        Self {
            config: Arc::new(config),
            recognizer,
            diagnostics,
        }
    }
}
