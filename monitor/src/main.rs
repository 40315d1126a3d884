//! Deployment monitor - Entry Point
//!
//! Launched detached, once per deployment, with a single base64-encoded JSON
//! argument. Exits 0 when all tests passed, 1 on failure and 2 on timeout.

use std::env;
use std::process::ExitCode;

use deploywatch::app::run::run;
use deploywatch::logs::{init_logging, monitor_log_file, LogOptions};
use deploywatch::models::config::MonitorConfig;
use deploywatch::utils::version_info;

use tracing::{error, info};

const USAGE: &str = "Usage: deploywatch <base64-encoded monitor config>";

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{}", e),
        }
        return ExitCode::SUCCESS;
    }

    let headless = args.iter().any(|a| a == "--headless");
    let Some(payload) = args.iter().find(|a| !a.starts_with("--")) else {
        eprintln!("{}", USAGE);
        return ExitCode::from(1);
    };

    let config = match MonitorConfig::decode(payload) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid monitor config: {}", e);
            eprintln!("{}", USAGE);
            return ExitCode::from(1);
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: config.log_level.clone(),
        log_file: config
            .log_dir
            .as_ref()
            .map(|dir| monitor_log_file(dir, &config.product_id)),
        json_format: config.log_json,
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!("deploywatch {} starting", version_info().version);
    match run(config, headless, await_shutdown_signal()).await {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            error!("Monitor failed: {e}");
            ExitCode::from(1)
        }
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                _ => {
                    error!("Unable to install signal handlers, falling back to Ctrl+C");
                    if tokio::signal::ctrl_c().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down...");
        } else {
            std::future::pending::<()>().await;
        }
    }
}
