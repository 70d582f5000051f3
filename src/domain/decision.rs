//! The ephemeral decision value.

use serde::{Deserialize, Serialize};

use super::expense::ExpenseStatus;

/// Outcome of a decision, automated or human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Approved,
    Rejected,
    AdminReview,
}

impl DecisionOutcome {
    /// The expense status this outcome maps to.
    pub fn status(self) -> ExpenseStatus {
        match self {
            Self::Approved => ExpenseStatus::Approved,
            Self::Rejected => ExpenseStatus::Rejected,
            Self::AdminReview => ExpenseStatus::AdminReview,
        }
    }
}

/// Identifier of the deterministic rule that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleId {
    /// Auto-approve: small amount, first of the day, valid receipt,
    /// reimbursable category.
    R1,
    /// Manual review: small amount but not the first submission today.
    R2,
    /// Manual review: amount above the low threshold.
    R3,
    /// Auto-reject: receipt missing, unreadable, or required fields
    /// absent/contradictory.
    R4,
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::R1 => write!(f, "R1"),
            Self::R2 => write!(f, "R2"),
            Self::R3 => write!(f, "R3"),
            Self::R4 => write!(f, "R4"),
        }
    }
}

/// What produced a decision: a deterministic rule or the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Rule(RuleId),
    Oracle,
}

impl std::fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rule(id) => write!(f, "{}", id),
            Self::Oracle => write!(f, "oracle"),
        }
    }
}

/// An ephemeral decision. Never persisted as-is — only folded into an
/// `Expense` by the decision orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub outcome: DecisionOutcome,
    pub source: DecisionSource,
    pub reason: String,
    pub confidence: f64,
}

impl Decision {
    /// A decision produced by a deterministic rule (confidence 1.0).
    pub fn from_rule(rule: RuleId, outcome: DecisionOutcome, reason: impl Into<String>) -> Self {
        Self {
            outcome,
            source: DecisionSource::Rule(rule),
            reason: reason.into(),
            confidence: 1.0,
        }
    }

    /// A decision produced by the oracle.
    pub fn from_oracle(outcome: DecisionOutcome, reason: impl Into<String>, confidence: f64) -> Self {
        Self {
            outcome,
            source: DecisionSource::Oracle,
            reason: reason.into(),
            confidence,
        }
    }
}
