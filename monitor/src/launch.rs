//! Spawning detached monitor processes
//!
//! A launcher starts one monitor per deployment and returns immediately. Each child
//! gets its own process group so the dashboard can stop a whole batch at once.

use std::fs::OpenOptions;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::info;

use crate::errors::MonitorError;
use crate::models::config::MonitorConfig;

/// Start `program` with `config` as its single argument, appending output to `log_file`
///
/// Returns the child's PID. The child is not waited on.
pub fn spawn_detached(
    program: &Path,
    config: &MonitorConfig,
    log_file: &Path,
) -> Result<u32, MonitorError> {
    let arg = config.encode()?;

    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let log = OpenOptions::new().create(true).append(true).open(log_file)?;
    let log_err = log.try_clone()?;

    let mut command = Command::new(program);
    command
        .arg(arg)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err));

    if !config.working_dir.as_os_str().is_empty() && config.working_dir.is_dir() {
        command.current_dir(&config.working_dir);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let child = command.spawn().map_err(|e| {
        MonitorError::LaunchError(format!("failed to start {}: {}", program.display(), e))
    })?;
    let pid = child.id();

    info!(
        "{}Started monitor for {} {} (pid {}), logging to {}",
        config.batch_label(),
        config.slug,
        config.version,
        pid,
        log_file.display()
    );
    Ok(pid)
}
