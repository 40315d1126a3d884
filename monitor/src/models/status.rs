//! Shared status entries written to the dashboard's status file

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::snapshot::{deserialize_test_runs, TestRuns};
use crate::models::string_or_number;

/// Status of a deployment as shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EntryStatus {
    #[default]
    Queued,
    Initializing,
    Success,
    Failed,
    Timeout,
    Error,
    /// Any other status reported verbatim by the remote API (e.g. "processing")
    Remote(String),
}

impl EntryStatus {
    pub fn as_str(&self) -> &str {
        match self {
            EntryStatus::Queued => "queued",
            EntryStatus::Initializing => "initializing",
            EntryStatus::Success => "success",
            EntryStatus::Failed => "failed",
            EntryStatus::Timeout => "timeout",
            EntryStatus::Error => "error",
            EntryStatus::Remote(s) => s,
        }
    }

    /// Whether the monitor that owns the entry has finished
    ///
    /// `error` is written on every failed poll, so it does not end tracking.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EntryStatus::Success | EntryStatus::Failed | EntryStatus::Timeout
        )
    }
}

impl From<&str> for EntryStatus {
    fn from(s: &str) -> Self {
        match s {
            "queued" => EntryStatus::Queued,
            "initializing" => EntryStatus::Initializing,
            "success" => EntryStatus::Success,
            "failed" => EntryStatus::Failed,
            "timeout" => EntryStatus::Timeout,
            "error" => EntryStatus::Error,
            other => EntryStatus::Remote(other.to_string()),
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for EntryStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for EntryStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(EntryStatus::from(s.as_str()))
    }
}

/// A test run that did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTest {
    #[serde(rename = "type")]
    pub test_type: String,

    pub status: String,

    #[serde(default)]
    pub url: Option<String>,
}

/// One deployment's entry in the shared status file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedStatusEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub product_id: String,

    #[serde(default)]
    pub slug: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub status: EntryStatus,

    #[serde(default, deserialize_with = "deserialize_progress")]
    pub progress: u8,

    #[serde(default = "Utc::now")]
    pub start_time: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub last_update: DateTime<Utc>,

    #[serde(
        default,
        deserialize_with = "deserialize_test_runs",
        skip_serializing_if = "Option::is_none"
    )]
    pub test_runs: Option<TestRuns>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_tests: Option<Vec<FailedTest>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Fields written by other tools are carried through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SharedStatusEntry {
    /// A fresh entry for a deployment seen for the first time
    pub fn seed(product_id: &str, slug: &str, version: &str, now: DateTime<Utc>) -> Self {
        Self {
            product_id: product_id.to_string(),
            slug: slug.to_string(),
            version: version.to_string(),
            status: EntryStatus::Queued,
            progress: 0,
            start_time: now,
            last_update: now,
            test_runs: None,
            failed_tests: None,
            error: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Progress written by other tools may be fractional or out of range
fn deserialize_progress<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_f64()
        .map(|p| p.round().clamp(0.0, 100.0) as u8)
        .unwrap_or_default())
}

/// Partial fields merged into a deployment's entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusUpdate {
    pub status: Option<EntryStatus>,
    pub progress: Option<u8>,
    pub test_runs: Option<TestRuns>,
    pub failed_tests: Option<Vec<FailedTest>>,
    pub error: Option<String>,
}

impl StatusUpdate {
    pub fn status(status: EntryStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_test_runs(mut self, test_runs: Option<TestRuns>) -> Self {
        self.test_runs = test_runs;
        self
    }

    pub fn with_failed_tests(mut self, failed_tests: Vec<FailedTest>) -> Self {
        self.failed_tests = Some(failed_tests);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Shallow merge into a raw entry: every field set here replaces the stored one,
    /// `lastUpdate` is refreshed and all other keys are left untouched
    pub fn merge_into(
        &self,
        entry: &mut Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<(), serde_json::Error> {
        if let Some(status) = &self.status {
            entry.insert("status".to_string(), Value::from(status.as_str()));
        }
        if let Some(progress) = self.progress {
            entry.insert("progress".to_string(), Value::from(progress));
        }
        if let Some(test_runs) = &self.test_runs {
            entry.insert("testRuns".to_string(), serde_json::to_value(test_runs)?);
        }
        if let Some(failed_tests) = &self.failed_tests {
            entry.insert("failedTests".to_string(), serde_json::to_value(failed_tests)?);
        }
        if let Some(error) = &self.error {
            entry.insert("error".to_string(), Value::from(error.as_str()));
        }
        entry.insert("lastUpdate".to_string(), serde_json::to_value(now)?);
        Ok(())
    }
}

/// True once every entry has reached a terminal status (and there is at least one)
pub fn all_terminal(entries: &[SharedStatusEntry]) -> bool {
    !entries.is_empty() && entries.iter().all(|e| e.status.is_terminal())
}
