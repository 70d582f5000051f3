//! Decision orchestration.
//!
//! Per-expense state machine: `pending -> evaluating rules ->
//! (consulting oracle)? -> approved | rejected | admin_review`. The rules
//! run first; only an inconclusive evaluation consults the oracle, and the
//! oracle is reached through the capability registry so it stays swappable.
//! Oracle timeouts and malformed outputs degrade to `admin_review` — never
//! toward auto-approval.
//!
//! The [`ReviewDispatcher`] runs orchestrator runs on a bounded worker pool
//! and exposes a completion channel per expense so the router can join on
//! the decision with a bounded timeout instead of busy-polling the store.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::{watch, Semaphore};

use crate::a2a::errors::CoreError;
use crate::a2a::registry::CapabilityRegistry;
use crate::a2a::types::{CallerContext, Role};
use crate::config::ReviewConfig;
use crate::domain::{
    Decision, DecisionActor, DecisionOutcome, DecisionSource, Expense, ExpenseStatus,
};
use crate::effects::SideEffectCoordinator;
use crate::oracle::{ClassifyRequest, ClassifyResponse, CLASSIFY_CLAIM};
use crate::rules::{self, RuleOutcome};
use crate::storage::ExpenseStore;

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Outcome of a guarded status transition.
enum Transition {
    /// This caller moved the expense; side effects were handed off.
    Applied(Expense),
    /// Another path already moved the expense past the expected status;
    /// carries the current state, nothing was changed.
    Superseded(Expense),
}

/// Sequences rule evaluation, oracle consultation, persistence and the
/// side-effect hand-off for one expense at a time.
pub struct DecisionOrchestrator {
    registry: Arc<CapabilityRegistry>,
    expenses: Arc<dyn ExpenseStore>,
    effects: Arc<SideEffectCoordinator>,
    config: ReviewConfig,
    oracle_provider_id: String,
    /// Per-expense transition locks. Terminal-transition attempts for the
    /// same expense are serialized here, so the status check and the write
    /// form one critical section across every call path (automated and
    /// manual).
    transitions: DashMap<String, Arc<Mutex<()>>>,
}

impl DecisionOrchestrator {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        expenses: Arc<dyn ExpenseStore>,
        effects: Arc<SideEffectCoordinator>,
        config: ReviewConfig,
        oracle_provider_id: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            expenses,
            effects,
            config,
            oracle_provider_id: oracle_provider_id.into(),
            transitions: DashMap::new(),
        }
    }

    /// Run the automated review for `expense_id`.
    ///
    /// Idempotent on re-entry: an expense that already left `pending` is
    /// returned unchanged. Rule evaluation errors (malformed expense) are
    /// fatal for this run and reported to the caller, not retried.
    pub async fn review(&self, expense_id: &str) -> Result<Expense, CoreError> {
        let expense = self
            .expenses
            .get(expense_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "expense",
                id: expense_id.to_string(),
            })?;

        if expense.status.is_decided() {
            log::debug!("Expense {expense_id} already decided ({})", expense.status);
            return Ok(expense);
        }

        let prior = self.expenses.count_prior_same_day(
            &expense.owner_id,
            expense.submission_day(),
            expense.created_at,
        );

        let decision = match rules::evaluate(&expense, prior, &self.config)? {
            RuleOutcome::Decided(decision) => decision,
            RuleOutcome::Inconclusive { reason } => {
                log::info!("Rules inconclusive for {expense_id} ({reason}); consulting oracle");
                self.consult_oracle(&expense).await
            }
        };

        let actor = match decision.source {
            DecisionSource::Rule(_) => DecisionActor::RuleEngine,
            DecisionSource::Oracle => DecisionActor::Oracle,
        };
        let label = match decision.source {
            DecisionSource::Rule(id) => format!("rule_engine:{id}"),
            DecisionSource::Oracle => "oracle".to_string(),
        };
        match self.apply_transition(
            &expense.expense_id,
            ExpenseStatus::Pending,
            decision.outcome,
            decision.reason,
            actor,
            &label,
        )? {
            // A concurrent path that decided first wins; this run's
            // re-entry contract is to report the current state.
            Transition::Applied(expense) | Transition::Superseded(expense) => Ok(expense),
        }
    }

    /// A human resolves an expense waiting in `admin_review`.
    ///
    /// The only path out of `admin_review`, and it converges on the same
    /// side-effect entry point as the automated paths.
    pub fn resolve_manually(
        &self,
        expense_id: &str,
        outcome: DecisionOutcome,
        reason: &str,
        context: &CallerContext,
    ) -> Result<Expense, CoreError> {
        if outcome == DecisionOutcome::AdminReview {
            return Err(CoreError::validation(
                "manual resolution must approve or reject",
            ));
        }

        let label = format!("human:{}", context.subject_id);
        match self.apply_transition(
            expense_id,
            ExpenseStatus::AdminReview,
            outcome,
            reason.to_string(),
            DecisionActor::Human,
            &label,
        )? {
            Transition::Applied(expense) => Ok(expense),
            // Lost the race to a concurrent resolution (or the expense was
            // never in admin_review): exactly one resolution may land.
            Transition::Superseded(expense) => Err(CoreError::validation(format!(
                "expense {expense_id} is {}, only admin_review expenses can be resolved manually",
                expense.status
            ))),
        }
    }

    /// Consult the oracle through the registry. Every degradation path
    /// (timeout, error envelope, malformed payload) resolves to
    /// `admin_review`.
    async fn consult_oracle(&self, expense: &Expense) -> Decision {
        let params = match serde_json::to_value(ClassifyRequest::for_expense(expense)) {
            Ok(params) => params,
            Err(e) => return degrade(expense, &format!("request serialization failed: {e}")),
        };

        let context = CallerContext::new("decision-orchestrator", Role::Admin);
        let invocation =
            self.registry
                .invoke(&self.oracle_provider_id, CLASSIFY_CLAIM, params, &context);

        let reply = match tokio::time::timeout(self.config.oracle_timeout, invocation).await {
            Ok(reply) => reply,
            Err(_) => return degrade(expense, "consultation timed out"),
        };

        if !reply.is_ok() {
            let detail = reply.payload["error"].as_str().unwrap_or("error envelope");
            return degrade(expense, detail);
        }

        match serde_json::from_value::<ClassifyResponse>(reply.payload) {
            Ok(response) => {
                Decision::from_oracle(response.outcome, response.reason, response.confidence)
            }
            Err(e) => degrade(expense, &format!("malformed response: {e}")),
        }
    }

    /// Move `expense_id` out of `from` under its transition lock, persist
    /// the result and hand off to the side-effect coordinator. The persisted
    /// write is the single source of truth the coordinator acts on.
    ///
    /// Re-reading the status inside the lock makes check-then-transition a
    /// critical section: of any number of concurrent attempts, exactly one
    /// observes `from` and applies; the rest get [`Transition::Superseded`].
    fn apply_transition(
        &self,
        expense_id: &str,
        from: ExpenseStatus,
        outcome: DecisionOutcome,
        reason: String,
        actor: DecisionActor,
        actor_label: &str,
    ) -> Result<Transition, CoreError> {
        let lock = self
            .transitions
            .entry(expense_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock();

        let mut expense = self
            .expenses
            .get(expense_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "expense",
                id: expense_id.to_string(),
            })?;
        if expense.status != from {
            return Ok(Transition::Superseded(expense));
        }

        let old_status = expense.status;
        expense.status = outcome.status();
        expense.decision_actor = actor;
        expense.decision_reason = reason;
        expense.updated_at = chrono::Utc::now();
        self.expenses.put(expense.clone());

        self.effects.apply(&expense, old_status, actor_label);
        Ok(Transition::Applied(expense))
    }
}

fn degrade(expense: &Expense, detail: &str) -> Decision {
    log::warn!(
        "Oracle degraded for expense {} ({detail}); routing to admin review",
        expense.expense_id
    );
    Decision::from_oracle(
        DecisionOutcome::AdminReview,
        format!("Oracle unavailable or unusable ({detail}); routed to manual review"),
        0.0,
    )
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Signal published on an expense's completion channel.
#[derive(Debug, Clone, PartialEq)]
enum ReviewSignal {
    Running,
    Decided(ExpenseStatus),
    Failed(String),
}

/// Outcome of a bounded wait for a decision.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReviewWait {
    pub review_completed: bool,
    pub status: ExpenseStatus,
    pub reason: String,
}

/// Runs orchestrator runs on a bounded pool and lets callers join on the
/// result with a timeout.
pub struct ReviewDispatcher {
    orchestrator: Arc<DecisionOrchestrator>,
    expenses: Arc<dyn ExpenseStore>,
    permits: Arc<Semaphore>,
    channels: DashMap<String, watch::Receiver<ReviewSignal>>,
}

impl ReviewDispatcher {
    pub fn new(
        orchestrator: Arc<DecisionOrchestrator>,
        expenses: Arc<dyn ExpenseStore>,
        worker_pool_size: usize,
    ) -> Self {
        Self {
            orchestrator,
            expenses,
            permits: Arc::new(Semaphore::new(worker_pool_size.max(1))),
            channels: DashMap::new(),
        }
    }

    /// Queue the automated review of `expense_id`. Returns immediately; the
    /// run executes as soon as a worker permit is available.
    pub fn submit(&self, expense_id: impl Into<String>) {
        let expense_id = expense_id.into();
        let (tx, rx) = watch::channel(ReviewSignal::Running);
        self.channels.insert(expense_id.clone(), rx);

        let orchestrator = self.orchestrator.clone();
        let permits = self.permits.clone();
        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return, // pool shut down
            };
            match orchestrator.review(&expense_id).await {
                Ok(expense) => {
                    let _ = tx.send(ReviewSignal::Decided(expense.status));
                }
                Err(err) => {
                    log::error!("Review of expense {expense_id} failed: {err}");
                    let _ = tx.send(ReviewSignal::Failed(err.to_string()));
                }
            }
        });
    }

    /// Wait until the expense's review completes, up to `timeout`.
    ///
    /// On timeout the review keeps running in the background and the caller
    /// gets `review_completed = false` with the current (pending) status —
    /// never a block past the timeout, never a raw internal fault.
    pub async fn wait_for_decision(&self, expense_id: &str, timeout: Duration) -> ReviewWait {
        let Some(rx) = self.channels.get(expense_id).map(|entry| entry.value().clone()) else {
            // No live channel (never submitted here, or its signal was
            // already consumed); report whatever the store holds.
            return self.snapshot(expense_id);
        };
        let mut rx = rx;

        let outcome = tokio::time::timeout(timeout, async {
            loop {
                let signal = rx.borrow_and_update().clone();
                match signal {
                    ReviewSignal::Decided(_) | ReviewSignal::Failed(_) => return signal,
                    ReviewSignal::Running => {
                        if rx.changed().await.is_err() {
                            return rx.borrow().clone();
                        }
                    }
                }
            }
        })
        .await;

        match outcome {
            Ok(ReviewSignal::Decided(_)) => {
                // Signal consumed; the store is authoritative from here on.
                self.channels.remove(expense_id);
                self.snapshot(expense_id)
            }
            Ok(ReviewSignal::Failed(reason)) => {
                self.channels.remove(expense_id);
                ReviewWait {
                    review_completed: false,
                    status: ExpenseStatus::Pending,
                    reason,
                }
            }
            Ok(ReviewSignal::Running) | Err(_) => ReviewWait {
                review_completed: false,
                status: ExpenseStatus::Pending,
                reason: "Review is taking longer than expected".to_string(),
            },
        }
    }

    fn snapshot(&self, expense_id: &str) -> ReviewWait {
        match self.expenses.get(expense_id) {
            Some(expense) => ReviewWait {
                review_completed: expense.status.is_decided(),
                status: expense.status,
                reason: expense.decision_reason,
            },
            None => ReviewWait {
                review_completed: false,
                status: ExpenseStatus::Pending,
                reason: format!("expense not found: {expense_id}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditTrail;
    use crate::domain::{Category, Receipt};
    use crate::notify::LogNotifier;
    use crate::oracle::{oracle_card, StubOracle, ORACLE_PROVIDER_ID};
    use crate::a2a::provider::CapabilityProvider;
    use crate::a2a::types::CapabilityCard;
    use crate::storage::{AccountStore, MemoryStore};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn valid_receipt(total: f64) -> Receipt {
        Receipt::new(
            "receipts/emp-1/r.pdf",
            "Acme",
            NaiveDate::from_ymd_opt(2026, 8, 24).unwrap(),
            total,
        )
    }

    struct Harness {
        store: Arc<MemoryStore>,
        registry: Arc<CapabilityRegistry>,
        orchestrator: Arc<DecisionOrchestrator>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let audit = AuditTrail::new(store.clone());
        let registry = Arc::new(CapabilityRegistry::new(audit.clone()));
        let effects = Arc::new(SideEffectCoordinator::new(
            store.clone(),
            store.clone(),
            audit,
            Arc::new(LogNotifier),
        ));
        let orchestrator = Arc::new(DecisionOrchestrator::new(
            registry.clone(),
            store.clone(),
            effects,
            ReviewConfig::default(),
            ORACLE_PROVIDER_ID,
        ));
        Harness {
            store,
            registry,
            orchestrator,
        }
    }

    fn submit(store: &MemoryStore, amount: f64, receipt: Option<Receipt>) -> Expense {
        let expense = Expense::new("emp-1", amount, Category::Meals, "team lunch", receipt);
        ExpenseStore::put(store, expense.clone());
        expense
    }

    #[tokio::test]
    async fn rule_path_approves_and_credits() {
        let h = harness();
        let expense = submit(&h.store, 100.0, Some(valid_receipt(100.0)));

        let decided = h.orchestrator.review(&expense.expense_id).await.unwrap();
        assert_eq!(decided.status, ExpenseStatus::Approved);
        assert_eq!(decided.decision_actor, DecisionActor::RuleEngine);
        assert!(!decided.decision_reason.is_empty());
        assert_eq!(h.store.find_by_owner("emp-1").unwrap().balance, 100.0);
    }

    #[tokio::test]
    async fn review_is_idempotent_after_decision() {
        let h = harness();
        let expense = submit(&h.store, 100.0, Some(valid_receipt(100.0)));

        h.orchestrator.review(&expense.expense_id).await.unwrap();
        h.orchestrator.review(&expense.expense_id).await.unwrap();
        assert_eq!(h.store.find_by_owner("emp-1").unwrap().balance, 100.0);
    }

    #[tokio::test]
    async fn inconclusive_claim_adopts_oracle_outcome() {
        let h = harness();
        h.registry.register(Arc::new(StubOracle::new()));

        // Ambiguous extraction forces the oracle path; stub approves small
        // receipted claims.
        let mut receipt = valid_receipt(80.0);
        receipt.extraction_confidence = 0.3;
        let expense = submit(&h.store, 80.0, Some(receipt));

        let decided = h.orchestrator.review(&expense.expense_id).await.unwrap();
        assert_eq!(decided.status, ExpenseStatus::Approved);
        assert_eq!(decided.decision_actor, DecisionActor::Oracle);
    }

    #[tokio::test]
    async fn missing_oracle_degrades_to_admin_review() {
        let h = harness();
        // No oracle registered at all.
        let mut receipt = valid_receipt(80.0);
        receipt.extraction_confidence = 0.3;
        let expense = submit(&h.store, 80.0, Some(receipt));

        let decided = h.orchestrator.review(&expense.expense_id).await.unwrap();
        assert_eq!(decided.status, ExpenseStatus::AdminReview);
        assert_eq!(decided.decision_actor, DecisionActor::Oracle);
    }

    #[tokio::test]
    async fn malformed_oracle_output_degrades_to_admin_review() {
        struct GarbageOracle;

        #[async_trait]
        impl CapabilityProvider for GarbageOracle {
            fn card(&self) -> CapabilityCard {
                let mut card = oracle_card(ORACLE_PROVIDER_ID);
                // Advertise an open output contract so the garbage reaches
                // the orchestrator's parser.
                card.capabilities[0].output_schema = json!({});
                card
            }

            async fn handle(
                &self,
                _capability: &str,
                _params: Value,
                _context: &CallerContext,
            ) -> Result<Value, CoreError> {
                Ok(json!({"verdict": "looks fine to me"}))
            }
        }

        let h = harness();
        h.registry.register(Arc::new(GarbageOracle));
        let mut receipt = valid_receipt(80.0);
        receipt.extraction_confidence = 0.3;
        let expense = submit(&h.store, 80.0, Some(receipt));

        let decided = h.orchestrator.review(&expense.expense_id).await.unwrap();
        assert_eq!(decided.status, ExpenseStatus::AdminReview);
    }

    #[tokio::test]
    async fn slow_oracle_times_out_to_admin_review() {
        struct SlowOracle;

        #[async_trait]
        impl CapabilityProvider for SlowOracle {
            fn card(&self) -> CapabilityCard {
                oracle_card(ORACLE_PROVIDER_ID)
            }

            async fn handle(
                &self,
                _capability: &str,
                _params: Value,
                _context: &CallerContext,
            ) -> Result<Value, CoreError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!()
            }
        }

        let h = harness();
        h.registry.register(Arc::new(SlowOracle));

        let orchestrator = Arc::new(DecisionOrchestrator::new(
            h.registry.clone(),
            h.store.clone(),
            Arc::new(SideEffectCoordinator::new(
                h.store.clone(),
                h.store.clone(),
                AuditTrail::new(h.store.clone()),
                Arc::new(LogNotifier),
            )),
            ReviewConfig {
                oracle_timeout: Duration::from_millis(50),
                ..ReviewConfig::default()
            },
            ORACLE_PROVIDER_ID,
        ));

        let mut receipt = valid_receipt(80.0);
        receipt.extraction_confidence = 0.3;
        let expense = submit(&h.store, 80.0, Some(receipt));

        let decided = orchestrator.review(&expense.expense_id).await.unwrap();
        assert_eq!(decided.status, ExpenseStatus::AdminReview);
        assert!(decided.decision_reason.contains("manual review"));
    }

    #[tokio::test]
    async fn manual_resolution_only_from_admin_review() {
        let h = harness();
        let expense = submit(&h.store, 600.0, Some(valid_receipt(600.0)));
        h.orchestrator.review(&expense.expense_id).await.unwrap();

        let admin = CallerContext::admin("adm-1");
        let resolved = h
            .orchestrator
            .resolve_manually(
                &expense.expense_id,
                DecisionOutcome::Approved,
                "Verified with vendor",
                &admin,
            )
            .unwrap();
        assert_eq!(resolved.status, ExpenseStatus::Approved);
        assert_eq!(resolved.decision_actor, DecisionActor::Human);
        assert_eq!(h.store.find_by_owner("emp-1").unwrap().balance, 600.0);

        // A second resolution attempt is rejected: no longer admin_review.
        let err = h
            .orchestrator
            .resolve_manually(
                &expense.expense_id,
                DecisionOutcome::Rejected,
                "changed my mind",
                &admin,
            )
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
        // And the credit stayed single.
        assert_eq!(h.store.find_by_owner("emp-1").unwrap().balance, 600.0);
    }

    #[test]
    fn concurrent_manual_resolutions_apply_exactly_once() {
        use std::sync::Barrier;

        // Conflicting outcomes racing on one escalated expense: exactly one
        // resolution may land, and the balance must match the final status.
        for _ in 0..50 {
            let h = harness();
            let mut expense =
                Expense::new("emp-1", 600.0, Category::Meals, "dinner", Some(valid_receipt(600.0)));
            expense.status = ExpenseStatus::AdminReview;
            ExpenseStore::put(&*h.store, expense.clone());

            let barrier = Arc::new(Barrier::new(2));
            let handles: Vec<_> = [DecisionOutcome::Approved, DecisionOutcome::Rejected]
                .into_iter()
                .map(|outcome| {
                    let orchestrator = h.orchestrator.clone();
                    let barrier = barrier.clone();
                    let id = expense.expense_id.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        orchestrator
                            .resolve_manually(&id, outcome, "resolved", &CallerContext::admin("adm-1"))
                            .is_ok()
                    })
                })
                .collect();

            let landed = handles
                .into_iter()
                .map(|t| t.join().unwrap())
                .filter(|&ok| ok)
                .count();
            assert_eq!(landed, 1, "exactly one resolution must succeed");

            let decided = ExpenseStore::get(&*h.store, &expense.expense_id).unwrap();
            let balance = h
                .store
                .find_by_owner("emp-1")
                .map(|a| a.balance)
                .unwrap_or(0.0);
            match decided.status {
                ExpenseStatus::Approved => assert_eq!(balance, 600.0),
                ExpenseStatus::Rejected => assert_eq!(balance, 0.0),
                other => panic!("unexpected final status {other}"),
            }

            // One status change, one audit entry for it.
            let changes = crate::storage::AuditLogStore::list(&*h.store)
                .into_iter()
                .filter(|e| {
                    e.event_type == crate::domain::AuditEventType::ExpenseStatusChange
                        && e.expense_id.as_deref() == Some(expense.expense_id.as_str())
                })
                .count();
            assert_eq!(changes, 1);
        }
    }

    #[tokio::test]
    async fn dispatcher_wait_returns_terminal_status() {
        let h = harness();
        let dispatcher = ReviewDispatcher::new(h.orchestrator.clone(), h.store.clone(), 2);
        let expense = submit(&h.store, 100.0, Some(valid_receipt(100.0)));

        dispatcher.submit(expense.expense_id.clone());
        let wait = dispatcher
            .wait_for_decision(&expense.expense_id, Duration::from_secs(5))
            .await;

        assert!(wait.review_completed);
        assert_eq!(wait.status, ExpenseStatus::Approved);
    }

    #[tokio::test]
    async fn dispatcher_drops_channel_after_decision_and_keeps_answering() {
        let h = harness();
        let dispatcher = ReviewDispatcher::new(h.orchestrator.clone(), h.store.clone(), 2);
        let expense = submit(&h.store, 100.0, Some(valid_receipt(100.0)));

        dispatcher.submit(expense.expense_id.clone());
        let first = dispatcher
            .wait_for_decision(&expense.expense_id, Duration::from_secs(5))
            .await;
        assert!(first.review_completed);

        // The completion channel is gone once its signal is consumed.
        assert!(dispatcher.channels.get(&expense.expense_id).is_none());

        // Later waits answer from the store instead of a channel.
        let again = dispatcher
            .wait_for_decision(&expense.expense_id, Duration::from_millis(10))
            .await;
        assert!(again.review_completed);
        assert_eq!(again.status, ExpenseStatus::Approved);
    }

    #[tokio::test]
    async fn dispatcher_wait_times_out_without_blocking_forever() {
        struct NeverOracle;

        #[async_trait]
        impl CapabilityProvider for NeverOracle {
            fn card(&self) -> CapabilityCard {
                oracle_card(ORACLE_PROVIDER_ID)
            }

            async fn handle(
                &self,
                _capability: &str,
                _params: Value,
                _context: &CallerContext,
            ) -> Result<Value, CoreError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!()
            }
        }

        let h = harness();
        h.registry.register(Arc::new(NeverOracle));
        let dispatcher = ReviewDispatcher::new(h.orchestrator.clone(), h.store.clone(), 2);

        let mut receipt = valid_receipt(80.0);
        receipt.extraction_confidence = 0.3;
        let expense = submit(&h.store, 80.0, Some(receipt));

        dispatcher.submit(expense.expense_id.clone());
        let started = std::time::Instant::now();
        let wait = dispatcher
            .wait_for_decision(&expense.expense_id, Duration::from_millis(100))
            .await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!wait.review_completed);
        assert_eq!(wait.status, ExpenseStatus::Pending);
    }
}
