//! Audit log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// What kind of event an audit entry records.
///
/// These are the four mandatory triggers: expense terminal status changes,
/// cross-provider protocol messages, RBAC denials, and balance credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    ExpenseStatusChange,
    ProtocolMessage,
    RbacDenial,
    BalanceCredit,
}

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub entry_id: String,
    pub event_type: AuditEventType,
    /// Who caused the event: a rule id, "oracle", "human", or a subject id.
    pub actor: String,
    /// Human-readable summary line.
    pub summary: String,
    /// Structured event payload for machine consumers.
    pub detail: Value,
    pub expense_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        event_type: AuditEventType,
        actor: impl Into<String>,
        summary: impl Into<String>,
        detail: Value,
        expense_id: Option<String>,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4().to_string(),
            event_type,
            actor: actor.into(),
            summary: summary.into(),
            detail,
            expense_id,
            timestamp: Utc::now(),
        }
    }
}
