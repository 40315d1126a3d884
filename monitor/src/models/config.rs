//! Monitor configuration handed over by the launcher

use std::path::PathBuf;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::app::options::MonitorOptions;
use crate::errors::MonitorError;
use crate::logs::LogLevel;
use crate::models::string_or_number;

/// Submission API credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub username: String,

    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,

    /// Base URL of the submission API, e.g. `https://example.com/wp-json/submission/v1`
    pub api_url: String,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Everything one monitor process needs, immutable for its lifetime
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    #[serde(deserialize_with = "string_or_number")]
    pub product_id: String,

    pub version: String,

    pub slug: String,

    pub credentials: Credentials,

    #[serde(default)]
    pub working_dir: PathBuf,

    #[serde(default)]
    pub commit_message: String,

    /// Shared dashboard file; the monitor runs standalone when absent
    #[serde(default)]
    pub status_file: Option<PathBuf>,

    #[serde(default)]
    pub is_batch_deploy: bool,

    #[serde(default)]
    pub batch_index: usize,

    #[serde(default)]
    pub batch_total: usize,

    /// Overrides the 30 second poll interval
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,

    /// Overrides the 60 attempt ceiling
    #[serde(default)]
    pub max_attempts: Option<u32>,

    #[serde(default)]
    pub log_level: LogLevel,

    /// JSON log lines instead of plain text
    #[serde(default)]
    pub log_json: bool,

    /// Directory for the per-product log file
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl MonitorConfig {
    /// Decode the launch argument: base64 of a JSON object
    pub fn decode(arg: &str) -> Result<Self, MonitorError> {
        let bytes = BASE64
            .decode(arg.trim())
            .map_err(|e| MonitorError::DecodeError(format!("invalid base64 payload: {}", e)))?;
        let config: MonitorConfig = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Encode as a launch argument
    pub fn encode(&self) -> Result<String, MonitorError> {
        let payload = serde_json::json!({
            "productId": self.product_id,
            "version": self.version,
            "slug": self.slug,
            "credentials": {
                "username": self.credentials.username,
                "password": self.credentials.password.expose_secret(),
                "apiUrl": self.credentials.api_url,
            },
            "workingDir": self.working_dir,
            "commitMessage": self.commit_message,
            "statusFile": self.status_file,
            "isBatchDeploy": self.is_batch_deploy,
            "batchIndex": self.batch_index,
            "batchTotal": self.batch_total,
            "pollIntervalSecs": self.poll_interval_secs,
            "maxAttempts": self.max_attempts,
            "logLevel": self.log_level,
            "logJson": self.log_json,
            "logDir": self.log_dir,
        });
        let json = serde_json::to_vec(&payload)?;
        Ok(BASE64.encode(json))
    }

    fn validate(&self) -> Result<(), MonitorError> {
        if self.product_id.trim().is_empty() {
            return Err(MonitorError::ConfigError("productId is required".to_string()));
        }
        url::Url::parse(&self.credentials.api_url).map_err(|e| {
            MonitorError::ConfigError(format!(
                "credentials.apiUrl is not a valid URL ({}): {}",
                self.credentials.api_url, e
            ))
        })?;
        if self.max_attempts == Some(0) {
            return Err(MonitorError::ConfigError(
                "maxAttempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// `[index/total]` prefix for batch messages, empty otherwise
    pub fn batch_label(&self) -> String {
        if self.is_batch_deploy {
            format!("[{}/{}] ", self.batch_index, self.batch_total)
        } else {
            String::new()
        }
    }

    /// Loop timing with this config's overrides applied
    pub fn monitor_options(&self) -> MonitorOptions {
        let mut options = MonitorOptions::default();
        if let Some(secs) = self.poll_interval_secs {
            options.interval = Duration::from_secs(secs);
        }
        if let Some(attempts) = self.max_attempts {
            options.max_attempts = attempts;
        }
        options
    }
}
