//! Classification of deployment status snapshots

use crate::models::snapshot::{DeploymentStatusSnapshot, TestRun};
use crate::models::status::FailedTest;
use crate::utils::percent;

/// Progress reported while the deployment has no test runs yet
pub const QUEUED_PROGRESS: u8 = 5;

/// Progress reported once test runs exist but none is listed
pub const STARTED_PROGRESS: u8 = 10;

const IN_FLIGHT: [&str; 3] = ["pending", "running", "queued"];
const FAILURE: [&str; 2] = ["failed", "error"];
const SUCCESS: &str = "success";

fn is_in_flight(run: &TestRun) -> bool {
    IN_FLIGHT.contains(&run.status.as_str())
}

/// 0-100 progress estimate
pub fn calculate_progress(snapshot: &DeploymentStatusSnapshot) -> u8 {
    match &snapshot.test_runs {
        None => QUEUED_PROGRESS,
        Some(runs) if runs.is_empty() => STARTED_PROGRESS,
        Some(runs) => {
            let completed = runs.values().filter(|r| !is_in_flight(r)).count();
            percent(completed, runs.len())
        }
    }
}

/// Every test run has left pending/running/queued
pub fn are_tests_complete(snapshot: &DeploymentStatusSnapshot) -> bool {
    match &snapshot.test_runs {
        Some(runs) if !runs.is_empty() => runs.values().all(|r| !is_in_flight(r)),
        _ => false,
    }
}

/// The deployment or any single test run already failed, even with siblings in flight
pub fn has_failed_early(snapshot: &DeploymentStatusSnapshot) -> bool {
    if FAILURE.contains(&snapshot.status.as_str()) {
        return true;
    }
    snapshot
        .test_runs
        .as_ref()
        .is_some_and(|runs| runs.values().any(|r| FAILURE.contains(&r.status.as_str())))
}

/// Every test run reported exactly `success`
pub fn did_tests_pass(snapshot: &DeploymentStatusSnapshot) -> bool {
    snapshot
        .test_runs
        .as_ref()
        .is_some_and(|runs| runs.values().all(|r| r.status == SUCCESS))
}

/// Test runs that did not succeed, in listing order
pub fn failed_tests(snapshot: &DeploymentStatusSnapshot) -> Vec<FailedTest> {
    snapshot
        .ordered_runs()
        .into_iter()
        .filter(|r| r.status != SUCCESS)
        .map(|r| FailedTest {
            test_type: r.test_type.clone(),
            status: r.status.clone(),
            url: r.result_url.clone(),
        })
        .collect()
}

/// Where a poll leaves the deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No test runs yet
    Queued,
    /// Tests still running, or finished without a clear pass
    InProgress,
    /// A failure was reported; stop now
    FailedEarly,
    /// All tests passed
    Passed,
}

/// Combine the predicates in the order the monitor acts on them
pub fn classify(snapshot: &DeploymentStatusSnapshot) -> Verdict {
    if has_failed_early(snapshot) {
        Verdict::FailedEarly
    } else if are_tests_complete(snapshot) && did_tests_pass(snapshot) {
        Verdict::Passed
    } else if snapshot.test_runs.is_none() {
        Verdict::Queued
    } else {
        Verdict::InProgress
    }
}
