//! Deployment status snapshot returned by the remote submission API

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::string_or_number;

/// Test runs keyed by test run id
pub type TestRuns = BTreeMap<String, TestRun>;

/// A single asynchronous test run on the remote side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRun {
    #[serde(default, deserialize_with = "string_or_number")]
    pub test_run_id: String,

    /// pending, running, queued, success, failed, error, or anything else
    pub status: String,

    #[serde(default = "default_test_type")]
    pub test_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
}

fn default_test_type() -> String {
    "unknown".to_string()
}

/// One poll's view of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStatusSnapshot {
    pub status: String,

    /// Absent while the deployment is still queued
    #[serde(
        default,
        deserialize_with = "deserialize_test_runs",
        skip_serializing_if = "Option::is_none"
    )]
    pub test_runs: Option<TestRuns>,
}

impl DeploymentStatusSnapshot {
    /// Test runs in the order the API lists them: numeric ids ascending, then the rest
    pub fn ordered_runs(&self) -> Vec<&TestRun> {
        let Some(runs) = &self.test_runs else {
            return Vec::new();
        };
        let mut entries: Vec<(&String, &TestRun)> = runs.iter().collect();
        entries.sort_by(|(a, _), (b, _)| compare_run_ids(a, b));
        entries.into_iter().map(|(_, run)| run).collect()
    }
}

fn compare_run_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// `test_runs` arrives as an object keyed by id, or as `[]`/a list when the backend
/// serializes an empty or sequential collection
pub(crate) fn deserialize_test_runs<'de, D>(deserializer: D) -> Result<Option<TestRuns>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => {
            let mut runs = TestRuns::new();
            for (id, value) in map {
                let mut run: TestRun = serde_json::from_value(value).map_err(D::Error::custom)?;
                if run.test_run_id.is_empty() {
                    run.test_run_id = id.clone();
                }
                runs.insert(id, run);
            }
            Ok(Some(runs))
        }
        Some(Value::Array(items)) => {
            let mut runs = TestRuns::new();
            for (index, value) in items.into_iter().enumerate() {
                let run: TestRun = serde_json::from_value(value).map_err(D::Error::custom)?;
                let id = if run.test_run_id.is_empty() {
                    index.to_string()
                } else {
                    run.test_run_id.clone()
                };
                runs.insert(id, run);
            }
            Ok(Some(runs))
        }
        Some(other) => Err(D::Error::custom(format!(
            "test_runs must be an object or a list, got {}",
            other
        ))),
    }
}
