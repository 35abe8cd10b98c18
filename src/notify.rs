//! Desktop Notifications
//!
//! User-visible progress and failure reports. Delivery is fire-and-forget:
//! a notification that cannot be shown is logged and otherwise ignored.

use std::fmt;
use std::process::Command;

use log::{debug, info, warn};

/// Title used for progress notifications.
pub const TITLE: &str = "HyDE PIP";

/// Title used for critical failure notifications.
pub const ERROR_TITLE: &str = "HyDE Error";

/// Notification urgency level, matching the freedesktop levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can show a notification to the user.
pub trait Notifier {
    /// Sends a notification. Never fails from the caller's point of view.
    fn send(&self, title: &str, body: &str, urgency: Urgency);

    /// Sends a notification with normal urgency.
    fn notify(&self, title: &str, body: &str) {
        self.send(title, body, Urgency::Normal);
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn send(&self, title: &str, body: &str, urgency: Urgency) {
        (**self).send(title, body, urgency);
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn send(&self, title: &str, body: &str, urgency: Urgency) {
        (**self).send(title, body, urgency);
    }
}

/// Shows notifications through `notify-send`.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    fn command(&self, title: &str, body: &str, urgency: Urgency) -> Command {
        let mut cmd = Command::new("notify-send");
        cmd.arg("-a")
            .arg(&self.app_name)
            .arg("-u")
            .arg(urgency.as_str())
            .arg(title)
            .arg(body);
        cmd
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new(crate::APP_NAME)
    }
}

impl Notifier for DesktopNotifier {
    fn send(&self, title: &str, body: &str, urgency: Urgency) {
        debug!("notify [{}] {}: {}", urgency, title, body);

        match self.command(title, body, urgency).output() {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!("notify-send exited with {:?}: {}", output.status.code(), stderr.trim());
            }
            Err(e) => warn!("Failed to send notification '{}': {}", title, e),
        }
    }
}

/// Writes notifications to the log instead of the desktop.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, title: &str, body: &str, urgency: Urgency) {
        match urgency {
            Urgency::Critical => warn!("{}: {}", title, body),
            _ => info!("{}: {}", title, body),
        }
    }
}
