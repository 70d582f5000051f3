//! Audit trail service.
//!
//! Thin layer over the audit log store that shapes the four mandatory
//! entries: expense status changes, cross-provider protocol messages, RBAC
//! denials, and balance credit applications.

use std::sync::Arc;

use serde_json::json;

use crate::a2a::errors::Denial;
use crate::a2a::types::{CallerContext, ProtocolMessage};
use crate::domain::{AuditEventType, AuditLogEntry, ExpenseStatus};
use crate::storage::AuditLogStore;

/// Writes structured audit entries.
#[derive(Clone)]
pub struct AuditTrail {
    store: Arc<dyn AuditLogStore>,
}

impl AuditTrail {
    pub fn new(store: Arc<dyn AuditLogStore>) -> Self {
        Self { store }
    }

    /// Record an expense status change.
    pub fn log_status_change(
        &self,
        actor: &str,
        expense_id: &str,
        old_status: ExpenseStatus,
        new_status: ExpenseStatus,
        reason: &str,
    ) {
        let summary =
            format!("Expense {expense_id} status changed: {old_status} -> {new_status}. Reason: {reason}");
        log::info!("{summary}");
        self.store.append(AuditLogEntry::new(
            AuditEventType::ExpenseStatusChange,
            actor,
            summary,
            json!({
                "old_status": old_status,
                "new_status": new_status,
                "reason": reason,
            }),
            Some(expense_id.to_string()),
        ));
    }

    /// Record one cross-provider protocol message (request, response or
    /// error).
    pub fn log_protocol_message(&self, message: &ProtocolMessage) {
        let capability = message.capability_name.as_deref().unwrap_or("-");
        let summary = format!(
            "Protocol {}: {} -> {}.{}",
            message.message_type, message.sender_id, message.recipient_id, capability
        );
        log::debug!("{summary} (message_id={})", message.message_id);
        self.store.append(AuditLogEntry::new(
            AuditEventType::ProtocolMessage,
            &message.sender_id,
            summary,
            json!({
                "message_id": message.message_id,
                "message_type": message.message_type,
                "capability": message.capability_name,
                "correlation_id": message.correlation_id,
            }),
            None,
        ));
    }

    /// Record an RBAC denial.
    pub fn log_denial(&self, context: &CallerContext, denial: &Denial) {
        let summary = format!("Denied {}: {}", context.subject_id, denial);
        log::warn!("{summary}");
        self.store.append(AuditLogEntry::new(
            AuditEventType::RbacDenial,
            &context.subject_id,
            summary,
            json!({
                "capability": denial.capability,
                "required_roles": denial.required_roles,
                "user_role": denial.user_role,
            }),
            None,
        ));
    }

    /// Record a balance credit application.
    pub fn log_balance_credit(&self, expense_id: &str, account_id: &str, amount: f64) {
        let summary =
            format!("Credited account {account_id} with {amount:.2} for expense {expense_id}");
        log::info!("{summary}");
        self.store.append(AuditLogEntry::new(
            AuditEventType::BalanceCredit,
            "side_effect_coordinator",
            summary,
            json!({
                "account_id": account_id,
                "amount": amount,
            }),
            Some(expense_id.to_string()),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2a::types::Role;
    use crate::storage::MemoryStore;

    #[test]
    fn entries_carry_event_types() {
        let store = Arc::new(MemoryStore::new());
        let trail = AuditTrail::new(store.clone());

        trail.log_status_change(
            "R1",
            "exp-1",
            ExpenseStatus::Pending,
            ExpenseStatus::Approved,
            "auto-approved",
        );
        trail.log_balance_credit("exp-1", "acct-1", 120.0);
        trail.log_denial(
            &CallerContext::employee("emp-1"),
            &Denial {
                capability: "list_audit_logs".into(),
                required_roles: vec![Role::Admin],
                user_role: Role::Employee,
            },
        );

        let entries = store.list();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].event_type, AuditEventType::ExpenseStatusChange);
        assert_eq!(entries[0].expense_id.as_deref(), Some("exp-1"));
        assert_eq!(entries[1].event_type, AuditEventType::BalanceCredit);
        assert_eq!(entries[2].event_type, AuditEventType::RbacDenial);
        assert_eq!(entries[2].detail["user_role"], "employee");
    }
}
