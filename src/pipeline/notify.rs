//! Notification hook

use async_trait::async_trait;

use crate::error::NotificationError;
use crate::models::Alert;

/// Best-effort delivery of a freshly committed alert
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: &Alert) -> Result<(), NotificationError>;
}

/// Writes alerts to the log. Stand-in for a real delivery transport.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), NotificationError> {
        tracing::warn!(
            alert_id = %alert.id,
            severity = %alert.severity,
            zones = alert.location.len(),
            "🚨 Alert generated: {}",
            alert.message
        );
        Ok(())
    }
}
