//! Notifications printed to stderr.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use listsync_core::Notifier;
use listsync_model::{Notification, Severity};

/// Prints each notification on its own line and counts failures.
///
/// Warnings count as failures: they are only raised when a flow refused to
/// proceed.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    failures: AtomicUsize,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn has_failures(&self) -> bool {
        self.failures() > 0
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        if matches!(notification.severity, Severity::Warning | Severity::Error) {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        let stderr = io::stderr();
        let line = render(&notification, stderr.is_terminal());
        let _ = writeln!(stderr.lock(), "{line}");
    }
}

/// One notification as a console line, colored for terminals.
pub fn render(notification: &Notification, ansi: bool) -> String {
    if !ansi {
        return notification.to_string();
    }
    let color = match notification.severity {
        Severity::Success => "32",
        Severity::Info => "36",
        Severity::Warning => "33",
        Severity::Error => "31",
    };
    format!(
        "\x1b[{color}m[{}]\x1b[0m {}: {}",
        notification.severity, notification.title, notification.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_rendering_matches_display() {
        let note = Notification::warning("Warning", "Select one Lead");
        assert_eq!(render(&note, false), "[warning] Warning: Select one Lead");
    }

    #[test]
    fn warnings_and_errors_count_as_failures() {
        let notifier = ConsoleNotifier::new();
        notifier.notify(Notification::success("Success", "Refreshed"));
        assert!(!notifier.has_failures());
        notifier.notify(Notification::warning("Warning", "Select one Lead"));
        notifier.notify(Notification::error("Error", "insufficient access"));
        assert_eq!(notifier.failures(), 2);
    }
}
