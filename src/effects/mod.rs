//! Side-effect coordinator.
//!
//! Applies the financial, audit and notification effects of a decision.
//! Multiple call paths converge here (synchronous rule path, oracle path,
//! manual admin action), so application is guarded two ways:
//!
//! - a per-expense mutex serializes concurrent attempts, making the
//!   check-then-act on the witness store a critical section;
//! - a [`SideEffectRecord`] witness per effect makes re-application a no-op.
//!   Finding an existing record is success, not an error — the desired end
//!   state already holds.
//!
//! Only the balance credit has double-application blast radius; its witness
//! is keyed once per expense ever. Audit and notification are keyed per
//! transition. Effects are independent: a failed notification never rolls
//! back the credit or the audit entry.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::json;

use crate::audit::AuditTrail;
use crate::domain::{Account, EffectType, Expense, ExpenseStatus};
use crate::notify::Notifier;
use crate::storage::{AccountStore, EffectStore};

/// What a coordinator run actually applied (false = already applied or not
/// applicable).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedEffects {
    pub credited: bool,
    pub audited: bool,
    pub notified: bool,
}

/// Applies decision side effects exactly once.
pub struct SideEffectCoordinator {
    accounts: Arc<dyn AccountStore>,
    effects: Arc<dyn EffectStore>,
    audit: AuditTrail,
    notifier: Arc<dyn Notifier>,
    /// Per-expense critical sections. Entries are tiny and never removed;
    /// the process is single-tenant per review pipeline.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SideEffectCoordinator {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        effects: Arc<dyn EffectStore>,
        audit: AuditTrail,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            accounts,
            effects,
            audit,
            notifier,
            locks: DashMap::new(),
        }
    }

    /// Apply the effects of the transition `old_status -> expense.status`.
    ///
    /// `actor` names who decided, e.g. `rule_engine:R1`, `oracle`, or
    /// `human:<subject>`. Safe to call any number of times from any path.
    pub fn apply(
        &self,
        expense: &Expense,
        old_status: ExpenseStatus,
        actor: &str,
    ) -> AppliedEffects {
        let lock = self
            .locks
            .entry(expense.expense_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock();

        let mut applied = AppliedEffects::default();

        if expense.status == ExpenseStatus::Approved {
            applied.credited = self.credit_owner(expense);
        }

        let transition = expense.status.to_string();

        if self
            .effects
            .record(&expense.expense_id, EffectType::AuditEntry, &transition)
        {
            self.audit.log_status_change(
                actor,
                &expense.expense_id,
                old_status,
                expense.status,
                &expense.decision_reason,
            );
            applied.audited = true;
        }

        if self
            .effects
            .record(&expense.expense_id, EffectType::Notification, &transition)
        {
            let receipt = self.notifier.notify(
                &expense.owner_id,
                json!({
                    "expense_id": expense.expense_id,
                    "status": expense.status,
                    "amount": expense.amount,
                    "reason": expense.decision_reason,
                }),
            );
            if !receipt.sent {
                log::warn!(
                    "Notification for expense {} to {} failed; continuing",
                    expense.expense_id,
                    expense.owner_id
                );
            }
            applied.notified = true;
        }

        applied
    }

    /// Credit the owner's account with the claimed amount, at most once
    /// ever for this expense. Creates a zero-balance account if the owner
    /// has none yet.
    fn credit_owner(&self, expense: &Expense) -> bool {
        if !self
            .effects
            .record(&expense.expense_id, EffectType::BalanceCredit, "")
        {
            log::debug!(
                "Balance credit for expense {} already applied; skipping",
                expense.expense_id
            );
            return false;
        }

        let mut account = self
            .accounts
            .find_by_owner(&expense.owner_id)
            .unwrap_or_else(|| Account::new(&expense.owner_id));
        account.balance += expense.amount;
        self.accounts.put(account.clone());
        self.audit
            .log_balance_credit(&expense.expense_id, &account.account_id, expense.amount);
        true
    }
}
