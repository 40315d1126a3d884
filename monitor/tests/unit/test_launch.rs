//! Detached launcher tests

#![cfg(unix)]

use std::path::Path;
use std::time::{Duration, Instant};

use tokio_test::assert_ok;

use deploywatch::launch::spawn_detached;
use deploywatch::models::config::MonitorConfig;

use crate::common::config;

fn wait_for_output(log_file: &Path) -> String {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let contents = std::fs::read_to_string(log_file).unwrap_or_default();
        if contents.ends_with('\n') || Instant::now() > deadline {
            return contents;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn test_child_receives_encoded_config() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("logs").join("monitor-4242.log");
    let config = config(Some(&dir.path().join("status.json")));

    let pid = assert_ok!(spawn_detached(Path::new("/bin/echo"), &config, &log_file));
    assert!(pid > 0);

    // echo writes its only argument back into the log
    let output = wait_for_output(&log_file);
    let decoded = assert_ok!(MonitorConfig::decode(output.trim()));
    assert_eq!(decoded.product_id, "4242");
    assert_eq!(decoded.slug, "gift-cards");
    assert_eq!(decoded.status_file, config.status_file);
}

#[test]
fn test_missing_program_is_launch_error() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("monitor.log");

    let err = spawn_detached(
        Path::new("/nonexistent/deploywatch"),
        &config(None),
        &log_file,
    )
    .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/deploywatch"));
}
