//! In-memory storage backend.
//!
//! Single-process, last-write-wins, no cross-entity transactions — the same
//! contract the core assumes of the external document store. One instance
//! implements every store trait so the whole core can share it.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;

use super::{AccountStore, AuditLogStore, EffectStore, ExpenseStore};
use crate::domain::{Account, AuditLogEntry, EffectType, Expense, SideEffectRecord};

/// In-memory store for expenses, accounts, audit entries and side-effect
/// records.
#[derive(Debug, Default)]
pub struct MemoryStore {
    expenses: RwLock<HashMap<String, Expense>>,
    accounts: RwLock<HashMap<String, Account>>,
    audit_log: RwLock<Vec<AuditLogEntry>>,
    effects: RwLock<EffectTable>,
}

#[derive(Debug, Default)]
struct EffectTable {
    keys: HashSet<(String, EffectType, String)>,
    records: Vec<SideEffectRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded side-effect witnesses, for inspection in tests and
    /// diagnostics.
    pub fn effect_records(&self) -> Vec<SideEffectRecord> {
        self.effects.read().records.clone()
    }
}

impl ExpenseStore for MemoryStore {
    fn put(&self, expense: Expense) {
        self.expenses
            .write()
            .insert(expense.expense_id.clone(), expense);
    }

    fn get(&self, expense_id: &str) -> Option<Expense> {
        self.expenses.read().get(expense_id).cloned()
    }

    fn list(&self) -> Vec<Expense> {
        let mut all: Vec<Expense> = self.expenses.read().values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        all
    }

    fn count_prior_same_day(
        &self,
        owner_id: &str,
        day: NaiveDate,
        before: DateTime<Utc>,
    ) -> usize {
        self.expenses
            .read()
            .values()
            .filter(|e| e.owner_id == owner_id && e.submission_day() == day && e.created_at < before)
            .count()
    }
}

impl AccountStore for MemoryStore {
    fn put(&self, account: Account) {
        self.accounts
            .write()
            .insert(account.account_id.clone(), account);
    }

    fn get(&self, account_id: &str) -> Option<Account> {
        self.accounts.read().get(account_id).cloned()
    }

    fn find_by_owner(&self, owner_id: &str) -> Option<Account> {
        self.accounts
            .read()
            .values()
            .find(|a| a.owner_id == owner_id)
            .cloned()
    }
}

impl AuditLogStore for MemoryStore {
    fn append(&self, entry: AuditLogEntry) {
        self.audit_log.write().push(entry);
    }

    fn list(&self) -> Vec<AuditLogEntry> {
        self.audit_log.read().clone()
    }
}

impl EffectStore for MemoryStore {
    fn record(&self, expense_id: &str, effect_type: EffectType, qualifier: &str) -> bool {
        let mut table = self.effects.write();
        let key = (expense_id.to_string(), effect_type, qualifier.to_string());
        if !table.keys.insert(key) {
            return false;
        }
        table.records.push(SideEffectRecord {
            expense_id: expense_id.to_string(),
            effect_type,
            qualifier: qualifier.to_string(),
            applied_at: Utc::now(),
        });
        true
    }

    fn contains(&self, expense_id: &str, effect_type: EffectType, qualifier: &str) -> bool {
        self.effects.read().keys.contains(&(
            expense_id.to_string(),
            effect_type,
            qualifier.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;

    #[test]
    fn expense_round_trip_and_prior_day_count() {
        let store = MemoryStore::new();
        let first = Expense::new("emp-1", 40.0, Category::Meals, "lunch", None);
        let mut second = Expense::new("emp-1", 60.0, Category::Meals, "dinner", None);
        second.created_at = first.created_at + chrono::Duration::seconds(10);
        let other_owner = Expense::new("emp-2", 10.0, Category::Other, "pens", None);
        let day = first.submission_day();

        ExpenseStore::put(&store, first.clone());
        ExpenseStore::put(&store, second.clone());
        ExpenseStore::put(&store, other_owner);

        assert_eq!(
            ExpenseStore::get(&store, &first.expense_id)
                .unwrap()
                .amount,
            40.0
        );
        // The first submission has no prior; the second has exactly one.
        assert_eq!(store.count_prior_same_day("emp-1", day, first.created_at), 0);
        assert_eq!(store.count_prior_same_day("emp-1", day, second.created_at), 1);
    }

    #[test]
    fn effect_record_is_first_writer_wins() {
        let store = MemoryStore::new();
        assert!(store.record("exp-1", EffectType::BalanceCredit, ""));
        assert!(!store.record("exp-1", EffectType::BalanceCredit, ""));
        assert!(store.contains("exp-1", EffectType::BalanceCredit, ""));

        // A different qualifier is a different effect.
        assert!(store.record("exp-1", EffectType::AuditEntry, "approved"));
        assert!(store.record("exp-1", EffectType::AuditEntry, "rejected"));
        assert_eq!(store.effect_records().len(), 3);
    }

    #[test]
    fn last_write_wins_on_put() {
        let store = MemoryStore::new();
        let mut expense = Expense::new("emp-1", 40.0, Category::Meals, "lunch", None);
        ExpenseStore::put(&store, expense.clone());
        expense.amount = 45.0;
        ExpenseStore::put(&store, expense.clone());
        assert_eq!(
            ExpenseStore::get(&store, &expense.expense_id)
                .unwrap()
                .amount,
            45.0
        );
        assert_eq!(ExpenseStore::list(&store).len(), 1);
    }
}
