use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info, warn};

/// Files probed in the working directory when `CONFIG_PATH` is not set
const DEFAULT_CONFIG_FILES: [&str; 3] = ["conf.yaml", "conf.yml", "conf.json"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub acrcloud: AcrCloudConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Credentials and endpoint for the recognition service.
///
/// Every field is optional on disk so that a missing key surfaces as a
/// per-request misconfiguration instead of a startup failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcrCloudConfig {
    pub host: Option<String>,
    pub access_key: Option<String>,
    pub access_secret: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for AcrCloudConfig {
    fn default() -> Self {
        Self {
            host: None,
            access_key: None,
            access_secret: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// When set, each successful recognition body is also written here
    #[serde(default)]
    pub debug_result_path: Option<PathBuf>,
}

/// Snapshot handed to the recognizer for a single call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizerConfig {
    pub host: String,
    pub access_key: String,
    pub access_secret: String,
    pub timeout: Duration,
}

impl AcrCloudConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns `None` if any of host, access key or access secret is
    /// absent or empty.
    pub fn credentials(&self) -> Option<RecognizerConfig> {
        let host = non_empty(self.host.as_deref())?;
        let access_key = non_empty(self.access_key.as_deref())?;
        let access_secret = non_empty(self.access_secret.as_deref())?;

        Some(RecognizerConfig {
            host: host.to_string(),
            access_key: access_key.to_string(),
            access_secret: access_secret.to_string(),
            timeout: self.timeout(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from a YAML or JSON file with `${VAR}` substitution
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = read_with_env_substitution(path)?;

        let path_lower = path.to_string_lossy().to_lowercase();
        let config = if path_lower.ends_with(".json") || path_lower.ends_with(".jsonld") {
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON configuration in {}", path.display()))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML configuration in {}", path.display()))?
        };

        Ok(Self::checked(config))
    }

    fn checked(mut config: Self) -> Self {
        if config.acrcloud.timeout_secs == 0 {
            warn!(
                "acrcloud.timeout_secs must be positive, using {} seconds",
                default_timeout_secs()
            );
            config.acrcloud.timeout_secs = default_timeout_secs();
        }
        config
    }

    /// Build the process configuration: file (if any), then environment overrides
    pub fn resolve() -> Result<Self> {
        let mut config = match std::env::var("CONFIG_PATH").ok() {
            Some(path) => {
                let config = Self::load(&path)?;
                info!("Loaded configuration from: {}", path);
                config
            }
            None => Self::load_first_existing(&DEFAULT_CONFIG_FILES)?,
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn load_first_existing(candidates: &[&str]) -> Result<Self> {
        for candidate in candidates {
            if Path::new(candidate).exists() {
                let config = Self::load(candidate)?;
                info!("Loaded configuration from: {}", candidate);
                return Ok(config);
            }
            debug!("No configuration file at {}", candidate);
        }

        info!("No configuration file found, using defaults and environment");
        Ok(Self::default())
    }

    /// Apply `ACRCLOUD_*` and `PORT` overrides from the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("ACRCLOUD_HOST") {
            self.acrcloud.host = Some(host);
        }
        if let Some(key) = lookup("ACRCLOUD_ACCESS_KEY") {
            self.acrcloud.access_key = Some(key);
        }
        if let Some(secret) = lookup("ACRCLOUD_ACCESS_SECRET") {
            self.acrcloud.access_secret = Some(secret);
        }
        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!("Ignoring invalid PORT {:?}: {}", port, e),
            }
        }
    }
}

fn read_with_env_substitution(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

    // decode() strips a UTF-8 BOM if present
    let (content, _, had_errors) = encoding_rs::UTF_8.decode(&bytes);
    if had_errors {
        warn!("Configuration file {} contains invalid UTF-8", path.display());
    }

    Ok(substitute_env(&content, |name| std::env::var(name).ok()))
}

/// Replace `${VAR_NAME}` with the variable's value, leaving unknown ones untouched
fn substitute_env<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let pattern = Regex::new(r"\$\{(\w+)\}").expect("static pattern is valid");
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn complete() -> AcrCloudConfig {
        AcrCloudConfig {
            host: Some("identify-eu-west-1.acrcloud.com".to_string()),
            access_key: Some("key".to_string()),
            access_secret: Some("secret".to_string()),
            timeout_secs: 10,
        }
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.acrcloud.timeout(), Duration::from_secs(10));
        assert!(config.acrcloud.credentials().is_none());
        assert!(config.diagnostics.debug_result_path.is_none());
    }

    #[test]
    fn credentials_snapshot_carries_timeout() {
        let creds = complete().credentials().unwrap();
        assert_eq!(creds.host, "identify-eu-west-1.acrcloud.com");
        assert_eq!(creds.access_key, "key");
        assert_eq!(creds.access_secret, "secret");
        assert_eq!(creds.timeout, Duration::from_secs(10));
    }

    #[test]
    fn any_missing_or_empty_value_is_misconfiguration() {
        let mut no_host = complete();
        no_host.host = None;
        let mut empty_key = complete();
        empty_key.access_key = Some(String::new());
        let mut no_secret = complete();
        no_secret.access_secret = None;

        for config in [no_host, empty_key, no_secret] {
            assert!(config.credentials().is_none(), "{:?}", config);
        }
    }

    #[test]
    fn whitespace_values_are_passed_through() {
        let mut config = complete();
        config.access_secret = Some("  ".to_string());
        assert_eq!(config.credentials().unwrap().access_secret, "  ");
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        config.acrcloud.host = Some("from-file".to_string());

        config.apply_env(env_from(&[
            ("ACRCLOUD_HOST", "from-env"),
            ("ACRCLOUD_ACCESS_KEY", "k"),
            ("ACRCLOUD_ACCESS_SECRET", "s"),
            ("PORT", "8080"),
        ]));

        assert_eq!(config.acrcloud.host.as_deref(), Some("from-env"));
        assert_eq!(config.acrcloud.access_key.as_deref(), Some("k"));
        assert_eq!(config.acrcloud.access_secret.as_deref(), Some("s"));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn invalid_port_is_ignored() {
        let mut config = Config::default();
        config.apply_env(env_from(&[("PORT", "not-a-port")]));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn substitution_leaves_unknown_variables() {
        let out = substitute_env(
            "host: ${KNOWN}\nkey: ${UNKNOWN}",
            env_from(&[("KNOWN", "example.com")]),
        );
        assert_eq!(out, "host: example.com\nkey: ${UNKNOWN}");
    }

    #[test]
    fn loads_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "server:\n  port: 9000\nacrcloud:\n  host: identify.example.com\n  access_key: abc\n  timeout_secs: 3\ndiagnostics:\n  debug_result_path: /tmp/result.json"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.acrcloud.host.as_deref(), Some("identify.example.com"));
        assert_eq!(config.acrcloud.access_key.as_deref(), Some("abc"));
        assert!(config.acrcloud.access_secret.is_none());
        assert_eq!(config.acrcloud.timeout_secs, 3);
        assert_eq!(
            config.diagnostics.debug_result_path,
            Some(PathBuf::from("/tmp/result.json"))
        );
    }

    #[test]
    fn loads_json_file_with_bom() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"\xEF\xBB\xBF{\"acrcloud\": {\"host\": \"h\"}}").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.acrcloud.host.as_deref(), Some("h"));
        assert_eq!(config.acrcloud.timeout_secs, 10);
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "acrcloud:\n  timeout_secs: 0").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.acrcloud.timeout_secs, 10);
        assert_eq!(config.acrcloud.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Config::load("/definitely/not/here/conf.yaml").unwrap_err();
        assert!(err.to_string().contains("conf.yaml"));
    }
}
