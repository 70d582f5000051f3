//! Storage contracts consumed by the core.
//!
//! Durable persistence is an external collaborator: the core only assumes
//! `get`/`put`/`query` per entity with last-write-wins semantics and no
//! cross-entity transactions. That is exactly why the side-effect
//! coordinator relies on an idempotency record rather than a database
//! transaction. The bundled [`MemoryStore`] backs tests and single-process
//! deployments.

pub mod memory;

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{Account, AuditLogEntry, EffectType, Expense};

pub use memory::MemoryStore;

/// Expense persistence.
pub trait ExpenseStore: Send + Sync {
    /// Insert or replace the expense (last-write-wins).
    fn put(&self, expense: Expense);

    fn get(&self, expense_id: &str) -> Option<Expense>;

    fn list(&self) -> Vec<Expense>;

    /// Number of submissions by `owner_id` on `day` created strictly before
    /// `before`. Drives the first-submission-of-the-day rule.
    fn count_prior_same_day(&self, owner_id: &str, day: NaiveDate, before: DateTime<Utc>)
        -> usize;
}

/// Account persistence.
pub trait AccountStore: Send + Sync {
    fn put(&self, account: Account);

    fn get(&self, account_id: &str) -> Option<Account>;

    fn find_by_owner(&self, owner_id: &str) -> Option<Account>;
}

/// Audit log persistence. Append-only.
pub trait AuditLogStore: Send + Sync {
    fn append(&self, entry: AuditLogEntry);

    fn list(&self) -> Vec<AuditLogEntry>;
}

/// Side-effect witness persistence.
pub trait EffectStore: Send + Sync {
    /// Record that an effect was applied. Returns `false` if a record for
    /// the same `(expense_id, effect_type, qualifier)` already existed, in
    /// which case nothing is written.
    fn record(&self, expense_id: &str, effect_type: EffectType, qualifier: &str) -> bool;

    /// Whether a matching record exists.
    fn contains(&self, expense_id: &str, effect_type: EffectType, qualifier: &str) -> bool;
}
