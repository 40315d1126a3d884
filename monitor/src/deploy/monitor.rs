//! Poll loop for one deployment
//!
//! One monitor owns one product id. It polls the status endpoint until a verdict,
//! mirrors every outcome into the shared status file, and reports the terminal
//! state exactly once. It never creates tags.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use tracing::{debug, error, info, warn};

use crate::app::options::MonitorOptions;
use crate::deploy::fsm::{MonitorEvent, MonitorFsm, MonitorState};
use crate::deploy::instructions;
use crate::deploy::interpret::{calculate_progress, classify, failed_tests, Verdict};
use crate::errors::RemoteError;
use crate::http::deploy_status::StatusSource;
use crate::models::config::MonitorConfig;
use crate::models::snapshot::DeploymentStatusSnapshot;
use crate::models::status::{EntryStatus, FailedTest, StatusUpdate};
use crate::notify::Notifier;
use crate::storage::status_store::StatusStore;

/// Final result of a monitor run
#[derive(Debug, Clone)]
pub struct MonitorReport {
    pub state: MonitorState,
    pub attempts: u32,
    pub progress: u8,
    /// Lines printed for the operator
    pub next_steps: Vec<String>,
}

impl MonitorReport {
    pub fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }
}

/// Deployment monitor
pub struct Monitor {
    config: MonitorConfig,
    options: MonitorOptions,
    source: Arc<dyn StatusSource>,
    notifier: Arc<dyn Notifier>,
    store: StatusStore,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        options: MonitorOptions,
        source: Arc<dyn StatusSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = StatusStore::new(config.status_file.clone(), &config.slug, &config.version);
        Self {
            config,
            options,
            source,
            notifier,
            store,
        }
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    fn product_id(&self) -> &str {
        &self.config.product_id
    }

    /// Run until a terminal state, sleeping between polls with `sleep_fn`
    pub async fn run<S, F>(&self, sleep_fn: S) -> MonitorReport
    where
        S: Fn(Duration) -> F,
        F: Future<Output = ()>,
    {
        let max_attempts = self.options.max_attempts;
        let mut fsm = MonitorFsm::new();
        let mut progress = 0;

        info!(
            "{}Monitoring {} {} (product {}), polling every {:?} for at most {} attempts",
            self.config.batch_label(),
            self.config.slug,
            self.config.version,
            self.product_id(),
            self.options.interval,
            max_attempts
        );
        self.store
            .update(
                self.product_id(),
                &StatusUpdate::status(EntryStatus::Initializing).with_progress(0),
            )
            .await;

        while fsm.can_poll(max_attempts) {
            debug!("Status check {}/{}", fsm.attempts() + 1, max_attempts);

            match self
                .source
                .check_status(&self.config.credentials, self.product_id())
                .await
            {
                Err(e) => {
                    error!("Status check failed: {}", e);
                    self.store
                        .update(
                            self.product_id(),
                            &StatusUpdate::status(EntryStatus::Error).with_error(e.to_string()),
                        )
                        .await;

                    if e.is_auth() {
                        transition(&mut fsm, MonitorEvent::AuthRejected(e.to_string()));
                        return self.finish_auth_error(&fsm, progress, &e);
                    }
                    transition(&mut fsm, MonitorEvent::PollFailed(e.to_string()));
                }
                Ok(snapshot) => {
                    progress = calculate_progress(&snapshot);
                    self.store
                        .update(
                            self.product_id(),
                            &StatusUpdate::status(EntryStatus::from(snapshot.status.as_str()))
                                .with_progress(progress)
                                .with_test_runs(snapshot.test_runs.clone()),
                        )
                        .await;
                    log_snapshot(&snapshot, progress);

                    match classify(&snapshot) {
                        Verdict::FailedEarly => {
                            transition(&mut fsm, MonitorEvent::TestsFailed);
                            return self.finish_failed(&fsm, progress, &snapshot).await;
                        }
                        Verdict::Passed => {
                            transition(&mut fsm, MonitorEvent::TestsPassed);
                            return self.finish_succeeded(&fsm, &snapshot).await;
                        }
                        Verdict::Queued | Verdict::InProgress => {
                            transition(&mut fsm, MonitorEvent::StillRunning);
                        }
                    }
                }
            }

            if fsm.can_poll(max_attempts) {
                sleep_fn(self.options.interval).await;
            }
        }

        transition(&mut fsm, MonitorEvent::AttemptsExhausted);
        self.finish_timed_out(&fsm, progress).await
    }

    /// Record that monitoring stopped because the process was interrupted
    pub async fn record_interrupted(&self) {
        self.store
            .update(
                self.product_id(),
                &StatusUpdate::status(EntryStatus::Error).with_error("Monitoring interrupted"),
            )
            .await;
    }

    async fn finish_failed(
        &self,
        fsm: &MonitorFsm,
        progress: u8,
        snapshot: &DeploymentStatusSnapshot,
    ) -> MonitorReport {
        let failed = failed_tests(snapshot);
        self.store
            .update(
                self.product_id(),
                &StatusUpdate::status(EntryStatus::Failed)
                    .with_progress(progress)
                    .with_failed_tests(failed.clone()),
            )
            .await;

        let label = self.config.batch_label();
        let types = if failed.is_empty() {
            format!("deployment status {}", snapshot.status)
        } else {
            failed_types(&failed)
        };
        if self.config.is_batch_deploy {
            self.notifier.notify(
                "Deployment failed",
                &format!("{}{} {}: {}", label, self.config.slug, self.config.version, types),
            );
        } else {
            self.notifier.notify(
                &format!("Deployment failed: {}", self.config.slug),
                &format!(
                    "{} {} failed remote tests ({}). No tag was created.",
                    self.config.slug, self.config.version, types
                ),
            );
            self.notifier
                .speak(&format!("Deployment of {} failed", self.config.slug));
            if let Some(url) = failed.iter().find_map(|t| t.url.as_deref()) {
                self.notifier.open_url(url);
            }
        }

        let next_steps = instructions::failure_steps(&self.config, &failed);
        print_steps(&next_steps, Outcome::Bad);
        self.report(fsm, progress, next_steps)
    }

    async fn finish_succeeded(
        &self,
        fsm: &MonitorFsm,
        snapshot: &DeploymentStatusSnapshot,
    ) -> MonitorReport {
        self.store
            .update(
                self.product_id(),
                &StatusUpdate::status(EntryStatus::Success).with_progress(100),
            )
            .await;

        let label = self.config.batch_label();
        if self.config.is_batch_deploy {
            self.notifier.notify(
                "Deployment succeeded",
                &format!(
                    "{}{} {} passed all tests",
                    label, self.config.slug, self.config.version
                ),
            );
        } else {
            self.notifier.notify(
                &format!("Deployment succeeded: {}", self.config.slug),
                &format!(
                    "{} {} passed all {} remote tests. Tag and push to finish the release.",
                    self.config.slug,
                    self.config.version,
                    snapshot.ordered_runs().len()
                ),
            );
            self.notifier
                .speak(&format!("Deployment of {} succeeded", self.config.slug));
            if let Some(url) = snapshot
                .ordered_runs()
                .first()
                .and_then(|r| r.result_url.as_deref())
            {
                self.notifier.open_url(url);
            }
        }

        let next_steps = instructions::success_steps(&self.config);
        print_steps(&next_steps, Outcome::Good);
        self.report(fsm, 100, next_steps)
    }

    async fn finish_timed_out(&self, fsm: &MonitorFsm, progress: u8) -> MonitorReport {
        self.store
            .update(
                self.product_id(),
                &StatusUpdate::status(EntryStatus::Timeout).with_progress(progress),
            )
            .await;

        self.notifier.notify(
            "Deployment monitoring timed out",
            &format!(
                "{}{} {}: tests still running after {} checks",
                self.config.batch_label(),
                self.config.slug,
                self.config.version,
                fsm.attempts()
            ),
        );

        let next_steps = instructions::timeout_steps(&self.config, fsm.attempts());
        print_steps(&next_steps, Outcome::Unknown);
        self.report(fsm, progress, next_steps)
    }

    fn finish_auth_error(&self, fsm: &MonitorFsm, progress: u8, e: &RemoteError) -> MonitorReport {
        self.notifier.notify(
            "Deployment monitor error",
            &format!(
                "{}{}: submission API rejected the credentials",
                self.config.batch_label(),
                self.config.slug
            ),
        );

        let next_steps = instructions::auth_error_steps(&self.config, &e.message);
        print_steps(&next_steps, Outcome::Bad);
        self.report(fsm, progress, next_steps)
    }

    fn report(&self, fsm: &MonitorFsm, progress: u8, next_steps: Vec<String>) -> MonitorReport {
        info!(
            "Monitoring of product {} ended: {:?} after {} attempts",
            self.product_id(),
            fsm.state(),
            fsm.attempts()
        );
        MonitorReport {
            state: fsm.state(),
            attempts: fsm.attempts(),
            progress,
            next_steps,
        }
    }
}

fn transition(fsm: &mut MonitorFsm, event: MonitorEvent) {
    if let Err(e) = fsm.process(event) {
        warn!("{}", e);
    }
}

fn log_snapshot(snapshot: &DeploymentStatusSnapshot, progress: u8) {
    info!("Deployment status: {} ({}%)", snapshot.status, progress);
    for run in snapshot.ordered_runs() {
        info!("  {} [{}]: {}", run.test_type, run.test_run_id, run.status);
    }
}

fn failed_types(failed: &[FailedTest]) -> String {
    failed
        .iter()
        .map(|t| format!("{} ({})", t.test_type, t.status))
        .collect::<Vec<_>>()
        .join(", ")
}

enum Outcome {
    Good,
    Bad,
    Unknown,
}

fn print_steps(lines: &[String], outcome: Outcome) {
    let Some((headline, rest)) = lines.split_first() else {
        return;
    };
    let headline = match outcome {
        Outcome::Good => headline.green().bold(),
        Outcome::Bad => headline.red().bold(),
        Outcome::Unknown => headline.yellow().bold(),
    };
    println!();
    println!("{}", headline);
    for line in rest {
        println!("{}", line);
    }
}
