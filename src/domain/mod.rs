//! Domain entities for the expense approval core.
//!
//! These are the persisted shapes the storage collaborator holds
//! (`Expense`, `Account`, `AuditLogEntry`, `SideEffectRecord`) plus the
//! ephemeral `Decision` value produced by rule evaluation or oracle
//! consultation, which is never stored directly — only folded into an
//! `Expense`.

pub mod account;
pub mod audit;
pub mod decision;
pub mod expense;

pub use account::{Account, EffectType, SideEffectRecord};
pub use audit::{AuditEventType, AuditLogEntry};
pub use decision::{Decision, DecisionOutcome, DecisionSource, RuleId};
pub use expense::{Category, DecisionActor, Expense, ExpenseStatus, Receipt};
