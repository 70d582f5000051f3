//! Outbound notification contract.
//!
//! Delivery transport is an external collaborator. Notification is
//! best-effort: a failure is logged and reported through the receipt, never
//! escalated, and never rolls back the decision or its financial effect.

use serde_json::Value;

/// Result of a notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyReceipt {
    pub sent: bool,
}

/// Sends structured notifications to claim owners.
pub trait Notifier: Send + Sync {
    fn notify(&self, recipient: &str, payload: Value) -> NotifyReceipt;
}

/// Notifier that writes to the log instead of a delivery channel.
///
/// Stands in for the real transport in single-process deployments and
/// tests.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, recipient: &str, payload: Value) -> NotifyReceipt {
        log::info!("Notification to {recipient}: {payload}");
        NotifyReceipt { sent: true }
    }
}
