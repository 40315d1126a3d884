//! HTTP client implementation

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};
use url::Url;

use crate::errors::{MonitorError, RemoteError};

/// Per-request timeout; well under the poll interval
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the submission API
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, MonitorError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("deploywatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Join an endpoint path onto an API base URL, keeping the base's own path
    pub fn endpoint(base_url: &str, path: &str) -> Result<Url, RemoteError> {
        let base = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&base)
            .map_err(|e| RemoteError::malformed(format!("invalid API URL {}: {}", base_url, e)))?;
        base.join(path.trim_start_matches('/'))
            .map_err(|e| RemoteError::malformed(format!("invalid endpoint {}: {}", path, e)))
    }

    /// POST a form and return the raw JSON body
    ///
    /// Send failures are `network`, non-2xx answers are `http` and bodies that are
    /// not a JSON object are `malformed`.
    pub async fn post_form<F: Serialize + ?Sized>(
        &self,
        url: Url,
        form: &F,
    ) -> Result<serde_json::Map<String, serde_json::Value>, RemoteError> {
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| RemoteError::network(describe_send_error(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            error!("HTTP POST failed: {} - {}", status, body);
            return Err(RemoteError::http(status.as_u16(), &body));
        }

        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(RemoteError::malformed(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(RemoteError::malformed(format!("invalid JSON: {}", e))),
        }
    }
}

fn describe_send_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("fetch failed: {}", e)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
