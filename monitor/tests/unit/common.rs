//! Shared test helpers

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use deploywatch::errors::RemoteError;
use deploywatch::http::deploy_status::StatusSource;
use deploywatch::models::config::{Credentials, MonitorConfig};
use deploywatch::models::snapshot::DeploymentStatusSnapshot;
use deploywatch::notify::Notifier;

pub fn config_json(api_url: &str, status_file: Option<&Path>) -> serde_json::Value {
    serde_json::json!({
        "productId": "4242",
        "version": "1.4.0",
        "slug": "gift-cards",
        "credentials": {
            "username": "vendor",
            "password": "s3cret",
            "apiUrl": api_url
        },
        "workingDir": "/work/gift-cards",
        "commitMessage": "Release 1.4.0",
        "statusFile": status_file,
        "isBatchDeploy": false,
        "batchIndex": 0,
        "batchTotal": 0
    })
}

pub fn decode(json: serde_json::Value) -> MonitorConfig {
    MonitorConfig::decode(&BASE64.encode(json.to_string())).unwrap()
}

pub fn config(status_file: Option<&Path>) -> MonitorConfig {
    decode(config_json("https://api.test/v1", status_file))
}

pub fn snapshot(json: serde_json::Value) -> DeploymentStatusSnapshot {
    serde_json::from_value(json).unwrap()
}

/// Replays scripted poll results; the last one repeats forever
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<DeploymentStatusSnapshot, RemoteError>>>,
    calls: Mutex<u32>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<DeploymentStatusSnapshot, RemoteError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn check_status(
        &self,
        credentials: &Credentials,
        product_id: &str,
    ) -> Result<DeploymentStatusSnapshot, RemoteError> {
        assert_eq!(credentials.username, "vendor");
        assert_eq!(product_id, "4242");
        *self.calls.lock().unwrap() += 1;

        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Notify(String, String),
    Speak(String),
    Open(String),
}

/// Notifier that only remembers what it was asked to do
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<Call>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Notify(title.to_string(), message.to_string()));
    }

    fn speak(&self, message: &str) {
        self.calls.lock().unwrap().push(Call::Speak(message.to_string()));
    }

    fn open_url(&self, url: &str) {
        self.calls.lock().unwrap().push(Call::Open(url.to_string()));
    }
}

/// Sleep function that returns at once and records the requested waits
pub fn recording_sleep(
    log: Arc<Mutex<Vec<Duration>>>,
) -> impl Fn(Duration) -> std::future::Ready<()> {
    move |d| {
        log.lock().unwrap().push(d);
        std::future::ready(())
    }
}
