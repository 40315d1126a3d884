//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info};

use crate::deploy::monitor::Monitor;
use crate::errors::MonitorError;
use crate::http::client::HttpClient;
use crate::http::deploy_status::{DeployStatusClient, StatusSource};
use crate::models::config::MonitorConfig;
use crate::notify::{NoopNotifier, Notifier, SystemNotifier};

/// Exit code used when monitoring is interrupted
pub const INTERRUPTED_EXIT_CODE: i32 = 1;

/// Monitor one deployment to a terminal state and return the process exit code
pub async fn run(
    config: MonitorConfig,
    headless: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<i32, MonitorError> {
    info!("Initializing deployment monitor...");

    let options = config.monitor_options();
    let http = HttpClient::new()?;
    let source: Arc<dyn StatusSource> =
        Arc::new(DeployStatusClient::new(http, options.retry.clone()));
    let notifier: Arc<dyn Notifier> = if headless {
        Arc::new(NoopNotifier)
    } else {
        Arc::new(SystemNotifier)
    };

    let monitor = Monitor::new(config, options, source, notifier);

    tokio::select! {
        report = monitor.run(tokio::time::sleep) => {
            Ok(report.exit_code())
        }
        _ = shutdown_signal => {
            error!("Shutdown signal received, monitoring stopped before a verdict");
            monitor.record_interrupted().await;
            Ok(INTERRUPTED_EXIT_CODE)
        }
    }
}
