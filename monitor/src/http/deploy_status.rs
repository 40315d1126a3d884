//! Deployment status API client

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::warn;

use crate::app::options::RetryPolicy;
use crate::errors::RemoteError;
use crate::http::client::HttpClient;
use crate::models::config::Credentials;
use crate::models::snapshot::DeploymentStatusSnapshot;

/// Path of the status endpoint relative to the API base URL
pub const DEPLOY_STATUS_PATH: &str = "product/deploy/status";

/// Source of deployment status snapshots, for testability
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the current status of a deployment
    async fn check_status(
        &self,
        credentials: &Credentials,
        product_id: &str,
    ) -> Result<DeploymentStatusSnapshot, RemoteError>;
}

/// Remote status client with fixed-backoff retry
pub struct DeployStatusClient {
    http: HttpClient,
    retry: RetryPolicy,
}

impl DeployStatusClient {
    pub fn new(http: HttpClient, retry: RetryPolicy) -> Self {
        Self { http, retry }
    }

    /// Single status request, no retry
    pub async fn fetch_once(
        &self,
        credentials: &Credentials,
        product_id: &str,
    ) -> Result<DeploymentStatusSnapshot, RemoteError> {
        let url = HttpClient::endpoint(&credentials.api_url, DEPLOY_STATUS_PATH)?;
        let form = [
            ("product_id", product_id),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.expose_secret()),
        ];

        let body = self.http.post_form(url, &form).await?;
        serde_json::from_value(serde_json::Value::Object(body))
            .map_err(|e| RemoteError::malformed(format!("unexpected status payload: {}", e)))
    }

    /// Status request retried on network failures only, sleeping with `sleep_fn`
    pub async fn check_status_with<S, F>(
        &self,
        credentials: &Credentials,
        product_id: &str,
        sleep_fn: S,
    ) -> Result<DeploymentStatusSnapshot, RemoteError>
    where
        S: Fn(Duration) -> F,
        F: Future<Output = ()>,
    {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.fetch_once(credentials, product_id).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        "Status check attempt {}/{} failed: {}; retrying in {:?}",
                        attempt, attempts, e, self.retry.backoff
                    );
                    sleep_fn(self.retry.backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl StatusSource for DeployStatusClient {
    async fn check_status(
        &self,
        credentials: &Credentials,
        product_id: &str,
    ) -> Result<DeploymentStatusSnapshot, RemoteError> {
        self.check_status_with(credentials, product_id, tokio::time::sleep)
            .await
    }
}
