//! Desktop notifications, speech and URL opening
//!
//! Every call is fire-and-forget. Failures are logged and never reach the caller.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

/// Side-effect capability used by the monitor
pub trait Notifier: Send + Sync {
    /// Show a desktop notification
    fn notify(&self, title: &str, message: &str);

    /// Read a short message aloud
    fn speak(&self, message: &str);

    /// Open a URL in the default browser
    fn open_url(&self, url: &str);
}

/// Notifier that does nothing; used when running headless
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, title: &str, message: &str) {
        debug!("notification suppressed: {} - {}", title, message);
    }

    fn speak(&self, _message: &str) {}

    fn open_url(&self, _url: &str) {}
}

/// Notifier backed by the platform's own tools
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemNotifier;

impl Notifier for SystemNotifier {
    fn notify(&self, title: &str, message: &str) {
        let result = if cfg!(target_os = "macos") {
            let script = format!(
                "display notification \"{}\" with title \"{}\"",
                applescript_escape(message),
                applescript_escape(title)
            );
            spawn_detached("osascript", &["-e", &script])
        } else if cfg!(target_os = "linux") {
            spawn_detached("notify-send", &[title, message])
        } else {
            debug!("desktop notifications not supported on this platform");
            Ok(())
        };
        if let Err(e) = result {
            warn!("Failed to show notification: {}", e);
        }
    }

    fn speak(&self, message: &str) {
        let result = if cfg!(target_os = "macos") {
            spawn_detached("say", &[message])
        } else if cfg!(target_os = "linux") {
            spawn_detached("spd-say", &[message])
                .or_else(|_| spawn_detached("espeak", &[message]))
        } else {
            Ok(())
        };
        if let Err(e) = result {
            warn!("Failed to speak message: {}", e);
        }
    }

    fn open_url(&self, url: &str) {
        if let Err(e) = open::that_detached(url) {
            warn!("Failed to open {}: {}", url, e);
        }
    }
}

/// Start a helper process without waiting on it
///
/// Must be called within a tokio runtime, which reaps the dropped child.
fn spawn_detached(program: &str, args: &[&str]) -> std::io::Result<()> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
