//! Accounts and the side-effect idempotency witness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reimbursement account.
///
/// Mutated only by the side-effect coordinator, only by addition, at most
/// once per approved expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub owner_id: String,
    pub balance: f64,
}

impl Account {
    /// A fresh zero-balance account for `owner_id`.
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            account_id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            balance: 0.0,
        }
    }
}

/// Kind of side effect applied for an expense decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    BalanceCredit,
    AuditEntry,
    Notification,
}

impl std::fmt::Display for EffectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BalanceCredit => write!(f, "balance_credit"),
            Self::AuditEntry => write!(f, "audit_entry"),
            Self::Notification => write!(f, "notification"),
        }
    }
}

/// Recorded witness that a side effect was applied.
///
/// The coordinator checks for an existing record before applying the same
/// effect again; this is what makes every call path converge on
/// "apply at most once". For `BalanceCredit` the invariant is strict: at
/// most one record per expense ever exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideEffectRecord {
    pub expense_id: String,
    pub effect_type: EffectType,
    /// Distinguishes effects applied once per transition (audit,
    /// notification) from the once-ever balance credit, which uses an
    /// empty qualifier.
    pub qualifier: String,
    pub applied_at: DateTime<Utc>,
}
