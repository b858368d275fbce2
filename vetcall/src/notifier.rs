//! User-facing notifications

use tracing::info;

/// Blocking user alerts and page navigation
pub trait Notifier: Send + Sync {
    /// Show a message the user must acknowledge
    fn alert(&self, message: &str);

    /// Move to another page
    fn navigate(&self, page: &str);
}

/// Notifier for headless runs that writes alerts and navigation to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn alert(&self, message: &str) {
        info!("🔔 {}", message);
    }

    fn navigate(&self, page: &str) {
        info!("➡️ Navigating to {}", page);
    }
}
