use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::DiagnosticsConfig;

/// Opt-in dump of the last successful recognition result
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    debug_result_path: Option<PathBuf>,
}

impl Diagnostics {
    pub fn new(config: &DiagnosticsConfig) -> Self {
        Self {
            debug_result_path: config.debug_result_path.clone(),
        }
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Write `result` to the configured path. Failures are only logged.
    pub async fn record_result(&self, result: &str) {
        let Some(path) = &self.debug_result_path else {
            return;
        };

        match tokio::fs::write(path, result).await {
            Ok(()) => debug!("Wrote recognition result to {}", path.display()),
            Err(e) => warn!("Failed to write debug file {}: {}", path.display(), e),
        }
    }
}
