//! Review pipeline configuration.

use std::collections::HashSet;
use std::time::Duration;

use crate::domain::Category;

/// Tunables for rule evaluation, oracle consultation and the decision wait.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Amounts at or below this auto-approve when the other R1 conditions
    /// hold; amounts above it always route to manual review (R3).
    pub threshold_low: f64,
    /// Categories eligible for auto-approval.
    pub reimbursable: HashSet<Category>,
    /// Extraction confidence below this marks documentation ambiguous,
    /// sending the claim to the oracle instead of auto-rejecting it.
    pub min_extraction_confidence: f64,
    /// Allowed difference between the receipt total and the claimed amount
    /// before they count as contradictory.
    pub amount_tolerance: f64,
    /// How long a single oracle consultation may take. Independent of the
    /// router's decision wait; a timed-out call resolves to admin review.
    pub oracle_timeout: Duration,
    /// How long the router waits for a decision before replying
    /// `review_completed = false`.
    pub decision_wait_timeout: Duration,
    /// Maximum number of concurrently running decision orchestrator runs.
    pub worker_pool_size: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            threshold_low: 500.0,
            reimbursable: [Category::Travel, Category::Meals, Category::Conference]
                .into_iter()
                .collect(),
            min_extraction_confidence: 0.6,
            amount_tolerance: 0.01,
            oracle_timeout: Duration::from_secs(5),
            decision_wait_timeout: Duration::from_secs(30),
            worker_pool_size: 4,
        }
    }
}

impl ReviewConfig {
    /// Build from environment variables, falling back to defaults.
    ///
    /// Recognized: `EXPENSE_THRESHOLD_LOW`, `EXPENSE_ORACLE_TIMEOUT_SECS`,
    /// `EXPENSE_DECISION_WAIT_SECS`, `EXPENSE_WORKER_POOL_SIZE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse::<f64>("EXPENSE_THRESHOLD_LOW") {
            config.threshold_low = v;
        }
        if let Some(v) = env_parse::<u64>("EXPENSE_ORACLE_TIMEOUT_SECS") {
            config.oracle_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env_parse::<u64>("EXPENSE_DECISION_WAIT_SECS") {
            config.decision_wait_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env_parse::<usize>("EXPENSE_WORKER_POOL_SIZE") {
            config.worker_pool_size = v.max(1);
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
