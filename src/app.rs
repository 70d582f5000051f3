//! Application wiring.
//!
//! The registry is an explicitly constructed instance with a documented
//! lifecycle: built here at process start, populated by provider
//! registration, read thereafter. No implicit singletons anywhere in the
//! core; everything reaches its collaborators through the handles built in
//! [`AppCore::new`].

use std::sync::Arc;

use crate::a2a::registry::CapabilityRegistry;
use crate::audit::AuditTrail;
use crate::config::ReviewConfig;
use crate::effects::SideEffectCoordinator;
use crate::notify::{LogNotifier, Notifier};
use crate::oracle::{StubOracle, ORACLE_PROVIDER_ID};
use crate::providers::ExpenseProvider;
use crate::review::{DecisionOrchestrator, ReviewDispatcher};
use crate::router::IntentRouter;
use crate::storage::MemoryStore;

/// The assembled approval core.
pub struct AppCore {
    pub store: Arc<MemoryStore>,
    pub registry: Arc<CapabilityRegistry>,
    pub orchestrator: Arc<DecisionOrchestrator>,
    pub dispatcher: Arc<ReviewDispatcher>,
    pub router: Arc<IntentRouter>,
    pub config: ReviewConfig,
}

impl AppCore {
    /// Wire the core with the in-memory store, the log notifier and the
    /// stub oracle. Swap providers by registering over them afterwards.
    pub fn new(config: ReviewConfig) -> Self {
        Self::with_notifier(config, Arc::new(LogNotifier))
    }

    pub fn with_notifier(config: ReviewConfig, notifier: Arc<dyn Notifier>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let audit = AuditTrail::new(store.clone());
        let registry = Arc::new(CapabilityRegistry::new(audit.clone()));

        let effects = Arc::new(SideEffectCoordinator::new(
            store.clone(),
            store.clone(),
            audit,
            notifier,
        ));
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
            orchestrator.clone(),
            dispatcher.clone(),
        )));

        let router = Arc::new(IntentRouter::new(
            registry.clone(),
            dispatcher.clone(),
            config.clone(),
        ));

        Self {
            store,
            registry,
            orchestrator,
            dispatcher,
            router,
            config,
        }
    }
}
