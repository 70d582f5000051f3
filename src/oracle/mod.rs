//! Oracle contract and stub provider.
//!
//! The oracle is the external reasoning service consulted only when the
//! deterministic rules are inconclusive. The orchestrator never calls it
//! directly: it is a capability provider reached through the registry under
//! the `classify_claim` capability, which keeps it swappable and testable
//! with a stub.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::a2a::errors::CoreError;
use crate::a2a::provider::CapabilityProvider;
use crate::a2a::types::{CallerContext, Capability, CapabilityCard};
use crate::domain::{DecisionOutcome, Expense};

/// Capability name the orchestrator invokes.
pub const CLASSIFY_CLAIM: &str = "classify_claim";

/// Default provider id the stub registers under.
pub const ORACLE_PROVIDER_ID: &str = "claim-oracle";

/// Claim metadata sent alongside the receipt reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimMetadata {
    pub expense_id: String,
    pub owner_id: String,
    pub amount: f64,
    pub category: String,
    pub justification: String,
}

/// Request payload for `classify_claim`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub claim: ClaimMetadata,
    pub receipt_ref: Option<String>,
}

impl ClassifyRequest {
    pub fn for_expense(expense: &Expense) -> Self {
        Self {
            claim: ClaimMetadata {
                expense_id: expense.expense_id.clone(),
                owner_id: expense.owner_id.clone(),
                amount: expense.amount,
                category: format!("{:?}", expense.category).to_lowercase(),
                justification: expense.justification.clone(),
            },
            receipt_ref: expense.receipt.as_ref().map(|r| r.receipt_ref.clone()),
        }
    }
}

/// Response payload for `classify_claim`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub outcome: DecisionOutcome,
    pub reason: String,
    pub confidence: f64,
}

/// The card a classify-claim oracle advertises.
pub fn oracle_card(provider_id: &str) -> CapabilityCard {
    CapabilityCard::new(
        provider_id,
        "Claim Oracle",
        "Judges claims the deterministic rules cannot decide",
        vec![Capability::new(
            CLASSIFY_CLAIM,
            "Classify a claim from its metadata and receipt reference",
            json!({
                "type": "object",
                "required": ["claim"],
                "properties": {
                    "claim": {
                        "type": "object",
                        "required": ["expense_id", "owner_id", "amount"],
                        "properties": {
                            "expense_id": {"type": "string"},
                            "owner_id": {"type": "string"},
                            "amount": {"type": "number"},
                            "category": {"type": "string"},
                            "justification": {"type": "string"}
                        }
                    },
                    "receipt_ref": {"type": "string"}
                }
            }),
            json!({
                "type": "object",
                "required": ["outcome", "reason", "confidence"],
                "properties": {
                    "outcome": {"type": "string"},
                    "reason": {"type": "string"},
                    "confidence": {"type": "number"}
                }
            }),
        )],
    )
}

/// Deterministic stand-in for the reasoning service.
///
/// Approves modest claims with a receipt and routes everything else to
/// manual review; never rejects on its own. Useful both as a default wiring
/// and as the happy-path stub in tests.
pub struct StubOracle {
    provider_id: String,
    approve_below: f64,
}

impl StubOracle {
    pub fn new() -> Self {
        Self {
            provider_id: ORACLE_PROVIDER_ID.to_string(),
            approve_below: 200.0,
        }
    }

    pub fn with_approve_below(mut self, amount: f64) -> Self {
        self.approve_below = amount;
        self
    }
}

impl Default for StubOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProvider for StubOracle {
    fn card(&self) -> CapabilityCard {
        oracle_card(&self.provider_id)
    }

    async fn handle(
        &self,
        _capability: &str,
        params: Value,
        _context: &CallerContext,
    ) -> Result<Value, CoreError> {
        let request: ClassifyRequest = serde_json::from_value(params)
            .map_err(|e| CoreError::validation(format!("malformed classify request: {e}")))?;

        let response = if request.receipt_ref.is_some() && request.claim.amount < self.approve_below
        {
            ClassifyResponse {
                outcome: DecisionOutcome::Approved,
                reason: format!(
                    "Receipt present and amount {:.2} is modest",
                    request.claim.amount
                ),
                confidence: 0.8,
            }
        } else {
            ClassifyResponse {
                outcome: DecisionOutcome::AdminReview,
                reason: "Claim needs human judgment".to_string(),
                confidence: 0.5,
            }
        };

        serde_json::to_value(response).map_err(|e| CoreError::provider(e.to_string()))
    }
}
