//! Intent router.
//!
//! Top-level entry point: maps a caller's free-form request to capability
//! invocations through a deterministic dispatch table keyed by intent
//! classification. The only non-deterministic component in the system is
//! the oracle, and it stays behind the orchestrator's narrow contract; the
//! router itself is plain keyword matching and fully testable offline.
//!
//! Submissions are the one compound operation: the caller expects "create
//! and review" as one logical exchange, so after queueing the review the
//! router joins on the decision channel with a bounded timeout. On timeout
//! it answers `review_completed = false` with the pending status; the
//! review keeps running and the caller may query again later.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::a2a::registry::CapabilityRegistry;
use crate::a2a::types::{CallerContext, ProtocolMessage};
use crate::config::ReviewConfig;
use crate::providers::EXPENSE_PROVIDER_ID;
use crate::review::ReviewDispatcher;

// ---------------------------------------------------------------------------
// Intent classification
// ---------------------------------------------------------------------------

/// What the caller is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SubmitExpense,
    GetExpense,
    ListExpenses,
    DecideExpense,
    ListAuditLogs,
    Unknown,
}

/// Classify a free-form request deterministically.
///
/// First matching row wins; rows are ordered most-specific first so that
/// e.g. "show the audit log for my expense" is an audit query, not a list.
pub fn classify_intent(text: &str) -> Intent {
    let text = text.to_lowercase();
    let matches_any = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if matches_any(&["audit"]) {
        Intent::ListAuditLogs
    } else if matches_any(&["approve", "reject", "decide", "resolve"]) {
        Intent::DecideExpense
    } else if matches_any(&["submit", "new expense", "reimburse", "claim", "file an expense"]) {
        Intent::SubmitExpense
    } else if matches_any(&["status of", "look up", "get expense", "details"]) {
        Intent::GetExpense
    } else if matches_any(&["list", "show", "my expenses", "all expenses"]) {
        Intent::ListExpenses
    } else {
        Intent::Unknown
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// A routed request: free-form text for intent classification plus the
/// structured arguments forwarded to the capability.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub params: Value,
}

/// The router's answer. `result` is the capability response payload;
/// submissions additionally carry the review outcome.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub intent: Intent,
    pub success: bool,
    pub result: Value,
}

/// Maps classified intents onto expense capabilities.
pub struct IntentRouter {
    registry: Arc<CapabilityRegistry>,
    dispatcher: Arc<ReviewDispatcher>,
    config: ReviewConfig,
}

impl IntentRouter {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        dispatcher: Arc<ReviewDispatcher>,
        config: ReviewConfig,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            config,
        }
    }

    /// Route one request. Never faults: authorization denials, validation
    /// failures and unknown intents all come back as a structured response
    /// with `success = false`.
    pub async fn route(&self, request: QueryRequest, context: &CallerContext) -> QueryResponse {
        let intent = classify_intent(&request.query);
        log::info!(
            "Routing query from {} as {intent:?}",
            context.subject_id
        );

        match intent {
            Intent::SubmitExpense => self.submit_and_wait(request.params, context).await,
            Intent::GetExpense => {
                self.invoke_as(intent, "get_expense", request.params, context)
                    .await
            }
            Intent::ListExpenses => {
                self.invoke_as(intent, "list_expenses", request.params, context)
                    .await
            }
            Intent::DecideExpense => {
                self.invoke_as(intent, "decide_expense", request.params, context)
                    .await
            }
            Intent::ListAuditLogs => {
                self.invoke_as(intent, "list_audit_logs", request.params, context)
                    .await
            }
            Intent::Unknown => QueryResponse {
                intent,
                success: false,
                result: json!({
                    "message": "Could not understand the request. Supported: \
                                submit an expense, get an expense's status, \
                                list expenses, approve/reject an expense, \
                                list audit logs.",
                }),
            },
        }
    }

    async fn invoke_as(
        &self,
        intent: Intent,
        capability: &str,
        params: Value,
        context: &CallerContext,
    ) -> QueryResponse {
        let reply = self
            .registry
            .invoke(EXPENSE_PROVIDER_ID, capability, params, context)
            .await;
        reply_to_response(intent, reply)
    }

    /// Submit, then observe the decision before answering.
    async fn submit_and_wait(&self, params: Value, context: &CallerContext) -> QueryResponse {
        let reply = self
            .registry
            .invoke(EXPENSE_PROVIDER_ID, "submit_expense", params, context)
            .await;
        if !reply.is_ok() {
            return reply_to_response(Intent::SubmitExpense, reply);
        }

        let Some(expense_id) = reply.payload["expense_id"].as_str() else {
            return reply_to_response(Intent::SubmitExpense, reply);
        };

        let wait = self
            .dispatcher
            .wait_for_decision(expense_id, self.config.decision_wait_timeout)
            .await;
        let mut result = reply.payload.clone();
        result["status"] = json!(wait.status);
        result["review_completed"] = json!(wait.review_completed);
        result["decision_reason"] = json!(wait.reason);

        QueryResponse {
            intent: Intent::SubmitExpense,
            success: true,
            result,
        }
    }
}

fn reply_to_response(intent: Intent, reply: ProtocolMessage) -> QueryResponse {
    QueryResponse {
        intent,
        success: reply.is_ok(),
        result: reply.payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditTrail;
    use crate::config::ReviewConfig;
    use crate::effects::SideEffectCoordinator;
    use crate::notify::LogNotifier;
    use crate::oracle::{StubOracle, ORACLE_PROVIDER_ID};
    use crate::providers::ExpenseProvider;
    use crate::review::DecisionOrchestrator;
    use crate::storage::MemoryStore;

    #[test]
    fn classification_table() {
        assert_eq!(
            classify_intent("I want to submit a new expense for lunch"),
            Intent::SubmitExpense
        );
        assert_eq!(
            classify_intent("Please reimburse my taxi ride"),
            Intent::SubmitExpense
        );
        assert_eq!(classify_intent("show my expenses"), Intent::ListExpenses);
        assert_eq!(
            classify_intent("what is the status of expense abc?"),
            Intent::GetExpense
        );
        assert_eq!(
            classify_intent("approve expense abc"),
            Intent::DecideExpense
        );
        assert_eq!(
            classify_intent("show me the audit log"),
            Intent::ListAuditLogs
        );
        // Audit wins over list when both could match.
        assert_eq!(
            classify_intent("list the audit entries for this expense"),
            Intent::ListAuditLogs
        );
        assert_eq!(classify_intent("sing me a song"), Intent::Unknown);
    }

    fn router() -> (IntentRouter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let audit = AuditTrail::new(store.clone());
        let registry = Arc::new(CapabilityRegistry::new(audit.clone()));
        let effects = Arc::new(SideEffectCoordinator::new(
            store.clone(),
            store.clone(),
            audit,
            Arc::new(LogNotifier),
        ));
        let config = ReviewConfig::default();
        let orchestrator = Arc::new(DecisionOrchestrator::new(
            registry.clone(),
            store.clone(),
            effects,
            config.clone(),
            ORACLE_PROVIDER_ID,
        ));
        let dispatcher = Arc::new(ReviewDispatcher::new(
            orchestrator.clone(),
            store.clone(),
            config.worker_pool_size,
        ));
        registry.register(Arc::new(StubOracle::new()));
        registry.register(Arc::new(ExpenseProvider::new(
            store.clone(),
            store.clone(),
            orchestrator,
            dispatcher.clone(),
        )));
        (IntentRouter::new(registry, dispatcher, config), store)
    }

    #[tokio::test]
    async fn submit_query_returns_decision_in_one_exchange() {
        let (router, store) = router();
        let employee = CallerContext::employee("emp-1");

        let response = router
            .route(
                QueryRequest {
                    query: "submit an expense for a client lunch".to_string(),
                    params: json!({
                        "amount": 42.0,
                        "category": "meals",
                        "justification": "client lunch",
                        "receipt": {
                            "receipt_ref": "receipts/r.pdf",
                            "vendor": "Bistro",
                            "date": "2026-08-24",
                            "total": 42.0
                        }
                    }),
                },
                &employee,
            )
            .await;

        assert!(response.success);
        assert_eq!(response.result["review_completed"], true);
        assert_eq!(response.result["status"], "approved");
        assert_eq!(
            crate::storage::AccountStore::find_by_owner(&*store, "emp-1")
                .unwrap()
                .balance,
            42.0
        );
    }

    #[tokio::test]
    async fn unknown_intent_is_a_structured_refusal() {
        let (router, _) = router();
        let response = router
            .route(
                QueryRequest {
                    query: "what's the weather like".to_string(),
                    params: json!({}),
                },
                &CallerContext::employee("emp-1"),
            )
            .await;
        assert!(!response.success);
        assert_eq!(response.intent, Intent::Unknown);
        assert!(response.result["message"].is_string());
    }

    #[tokio::test]
    async fn denial_surfaces_as_structured_response_not_fault() {
        let (router, _) = router();
        let response = router
            .route(
                QueryRequest {
                    query: "show me the audit trail".to_string(),
                    params: json!({}),
                },
                &CallerContext::employee("emp-1"),
            )
            .await;
        assert!(!response.success);
        assert_eq!(response.result["code"], "authorization_error");
        assert_eq!(response.result["denial"]["user_role"], "employee");
    }

    #[tokio::test]
    async fn second_submission_of_the_day_waits_in_admin_review() {
        let (router, _) = router();
        let employee = CallerContext::employee("emp-1");
        let params = json!({
            "amount": 30.0,
            "category": "meals",
            "justification": "coffee",
            "receipt": {
                "receipt_ref": "receipts/c.pdf",
                "vendor": "Cafe",
                "date": "2026-08-24",
                "total": 30.0
            }
        });

        let first = router
            .route(
                QueryRequest {
                    query: "submit expense".to_string(),
                    params: params.clone(),
                },
                &employee,
            )
            .await;
        assert_eq!(first.result["status"], "approved");

        let second = router
            .route(
                QueryRequest {
                    query: "submit expense".to_string(),
                    params,
                },
                &employee,
            )
            .await;
        assert_eq!(second.result["status"], "admin_review");
    }
}
