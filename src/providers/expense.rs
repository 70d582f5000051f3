//! The expense provider.
//!
//! Advertises the expense capabilities on one card and guards each handler
//! with the role it requires, declared once at construction. Handlers assume
//! the registry already validated params against the advertised input
//! schema; what they still check is business-level (ownership, lifecycle
//! state).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::a2a::errors::CoreError;
use crate::a2a::provider::CapabilityProvider;
use crate::a2a::types::{CallerContext, Capability, CapabilityCard, Role};
use crate::domain::{Category, DecisionOutcome, Expense, Receipt};
use crate::policy::{check_ownership, filter_by_ownership, handler, require_role, HandlerFn};
use crate::review::{DecisionOrchestrator, ReviewDispatcher};
use crate::storage::{AuditLogStore, ExpenseStore};

/// Provider id the expense provider registers under.
pub const EXPENSE_PROVIDER_ID: &str = "expense-agent";

// ---------------------------------------------------------------------------
// Parameter shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SubmitParams {
    amount: f64,
    category: String,
    justification: String,
    receipt: Option<ReceiptParams>,
}

#[derive(Debug, Deserialize)]
struct ReceiptParams {
    receipt_ref: String,
    vendor: Option<String>,
    date: Option<NaiveDate>,
    total: Option<f64>,
    #[serde(default = "default_true")]
    legible: bool,
    #[serde(default = "default_confidence")]
    extraction_confidence: f64,
}

fn default_true() -> bool {
    true
}

fn default_confidence() -> f64 {
    1.0
}

impl From<ReceiptParams> for Receipt {
    fn from(p: ReceiptParams) -> Self {
        Receipt {
            receipt_ref: p.receipt_ref,
            vendor: p.vendor,
            date: p.date,
            total: p.total,
            legible: p.legible,
            extraction_confidence: p.extraction_confidence,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExpenseIdParams {
    expense_id: String,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DecideParams {
    expense_id: String,
    outcome: DecisionOutcome,
    reason: String,
}

#[derive(Debug, Deserialize)]
struct AuditQueryParams {
    #[serde(default)]
    expense_id: Option<String>,
}

fn parse<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, CoreError> {
    serde_json::from_value(params).map_err(|e| CoreError::validation(e.to_string()))
}

fn expense_json(expense: &Expense) -> Value {
    json!({
        "expense_id": expense.expense_id,
        "owner_id": expense.owner_id,
        "amount": expense.amount,
        "category": expense.category,
        "justification": expense.justification,
        "status": expense.status,
        "decision_actor": expense.decision_actor,
        "decision_reason": expense.decision_reason,
        "has_receipt": expense.receipt.is_some(),
        "created_at": expense.created_at,
        "updated_at": expense.updated_at,
    })
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Capability provider for the expense workflow.
pub struct ExpenseProvider {
    handlers: HashMap<&'static str, HandlerFn>,
}

impl ExpenseProvider {
    pub fn new(
        expenses: Arc<dyn ExpenseStore>,
        audit_log: Arc<dyn AuditLogStore>,
        orchestrator: Arc<DecisionOrchestrator>,
        dispatcher: Arc<ReviewDispatcher>,
    ) -> Self {
        let mut handlers: HashMap<&'static str, HandlerFn> = HashMap::new();

        let store = expenses.clone();
        handlers.insert(
            "list_expenses",
            require_role(
                "list_expenses",
                &[Role::Employee],
                handler(move |params, context| {
                    let store = store.clone();
                    async move {
                        let query: ListParams = parse(params)?;
                        let status = query.status;
                        let all = store.list();
                        let visible =
                            filter_by_ownership(&context, all, |e: &Expense| &e.owner_id);
                        let expenses: Vec<Value> = visible
                            .iter()
                            .filter(|e| match &status {
                                Some(s) => e.status.to_string() == *s,
                                None => true,
                            })
                            .map(expense_json)
                            .collect();
                        Ok(json!({ "expenses": expenses }))
                    }
                }),
            ),
        );

        let store = expenses.clone();
        handlers.insert(
            "get_expense",
            require_role(
                "get_expense",
                &[Role::Employee],
                handler(move |params, context| {
                    let store = store.clone();
                    async move {
                        let query: ExpenseIdParams = parse(params)?;
                        let expense = store.get(&query.expense_id);
                        // Another employee's expense looks like a missing
                        // one; existence is not leaked.
                        match expense {
                            Some(e) if check_ownership(&context, &e.owner_id) => {
                                Ok(expense_json(&e))
                            }
                            _ => Err(CoreError::NotFound {
                                entity: "expense",
                                id: query.expense_id,
                            }),
                        }
                    }
                }),
            ),
        );

        let store = expenses.clone();
        let queue = dispatcher.clone();
        handlers.insert(
            "submit_expense",
            require_role(
                "submit_expense",
                &[Role::Employee],
                handler(move |params, context| {
                    let store = store.clone();
                    let queue = queue.clone();
                    async move {
                        let submission: SubmitParams = parse(params)?;
                        // Refused here, before anything is stored or queued:
                        // a claim that can never be credited must not sit in
                        // pending.
                        if !submission.amount.is_finite() || submission.amount <= 0.0 {
                            return Err(CoreError::validation(format!(
                                "amount must be a positive finite number, got {}",
                                submission.amount
                            )));
                        }
                        let expense = Expense::new(
                            context.subject_id.clone(),
                            submission.amount,
                            Category::normalize(&submission.category),
                            submission.justification,
                            submission.receipt.map(Receipt::from),
                        );
                        log::info!(
                            "Expense {} submitted by {} ({:.2})",
                            expense.expense_id,
                            expense.owner_id,
                            expense.amount
                        );
                        store.put(expense.clone());
                        queue.submit(expense.expense_id.clone());
                        Ok(expense_json(&expense))
                    }
                }),
            ),
        );

        let review = orchestrator;
        handlers.insert(
            "decide_expense",
            require_role(
                "decide_expense",
                &[Role::Admin],
                handler(move |params, context| {
                    let review = review.clone();
                    async move {
                        let decision: DecideParams = parse(params)?;
                        let expense = review.resolve_manually(
                            &decision.expense_id,
                            decision.outcome,
                            &decision.reason,
                            &context,
                        )?;
                        Ok(expense_json(&expense))
                    }
                }),
            ),
        );

        handlers.insert(
            "list_audit_logs",
            require_role(
                "list_audit_logs",
                &[Role::Admin],
                handler(move |params, _context| {
                    let audit_log = audit_log.clone();
                    async move {
                        let query: AuditQueryParams = parse(params)?;
                        let entries: Vec<Value> = audit_log
                            .list()
                            .into_iter()
                            .filter(|entry| match &query.expense_id {
                                Some(id) => entry.expense_id.as_deref() == Some(id.as_str()),
                                None => true,
                            })
                            .map(|entry| serde_json::to_value(entry).unwrap_or(Value::Null))
                            .collect();
                        Ok(json!({ "entries": entries }))
                    }
                }),
            ),
        );

        Self { handlers }
    }
}

#[async_trait]
impl CapabilityProvider for ExpenseProvider {
    fn card(&self) -> CapabilityCard {
        expense_card()
    }

    async fn handle(
        &self,
        capability: &str,
        params: Value,
        context: &CallerContext,
    ) -> Result<Value, CoreError> {
        match self.handlers.get(capability) {
            Some(handler) => handler(params, context.clone()).await,
            None => Err(CoreError::ProviderUnavailable {
                provider_id: EXPENSE_PROVIDER_ID.to_string(),
                capability: capability.to_string(),
            }),
        }
    }
}

/// The card the expense provider advertises.
pub fn expense_card() -> CapabilityCard {
    let expense_output = json!({
        "type": "object",
        "required": ["expense_id", "owner_id", "amount", "status"],
        "properties": {
            "expense_id": {"type": "string"},
            "owner_id": {"type": "string"},
            "amount": {"type": "number"},
            "category": {"type": "string"},
            "justification": {"type": "string"},
            "status": {"type": "string"},
            "decision_actor": {"type": "string"},
            "decision_reason": {"type": "string"},
            "has_receipt": {"type": "boolean"}
        }
    });

    CapabilityCard::new(
        EXPENSE_PROVIDER_ID,
        "Expense Agent",
        "Submission, inspection and resolution of reimbursement claims",
        vec![
            Capability::new(
                "list_expenses",
                "List expenses visible to the caller, optionally by status",
                json!({
                    "type": "object",
                    "properties": {
                        "status": {"type": "string"}
                    }
                }),
                json!({
                    "type": "object",
                    "required": ["expenses"],
                    "properties": {
                        "expenses": {"type": "array", "items": expense_output}
                    }
                }),
            ),
            Capability::new(
                "get_expense",
                "Fetch a single expense by id",
                json!({
                    "type": "object",
                    "required": ["expense_id"],
                    "properties": {
                        "expense_id": {"type": "string"}
                    }
                }),
                expense_output.clone(),
            ),
            Capability::new(
                "submit_expense",
                "Submit a new reimbursement claim and queue its review",
                json!({
                    "type": "object",
                    "required": ["amount", "category", "justification"],
                    "properties": {
                        "amount": {"type": "number"},
                        "category": {"type": "string"},
                        "justification": {"type": "string"},
                        "receipt": {
                            "type": "object",
                            "required": ["receipt_ref"],
                            "properties": {
                                "receipt_ref": {"type": "string"},
                                "vendor": {"type": "string"},
                                "date": {"type": "string"},
                                "total": {"type": "number"},
                                "legible": {"type": "boolean"},
                                "extraction_confidence": {"type": "number"}
                            }
                        }
                    }
                }),
                expense_output.clone(),
            ),
            Capability::new(
                "decide_expense",
                "Manually resolve an expense waiting in admin review",
                json!({
                    "type": "object",
                    "required": ["expense_id", "outcome", "reason"],
                    "properties": {
                        "expense_id": {"type": "string"},
                        "outcome": {"type": "string"},
                        "reason": {"type": "string"}
                    }
                }),
                expense_output,
            ),
            Capability::new(
                "list_audit_logs",
                "List audit log entries, optionally for one expense",
                json!({
                    "type": "object",
                    "properties": {
                        "expense_id": {"type": "string"}
                    }
                }),
                json!({
                    "type": "object",
                    "required": ["entries"],
                    "properties": {
                        "entries": {"type": "array"}
                    }
                }),
            ),
        ],
    )
}
