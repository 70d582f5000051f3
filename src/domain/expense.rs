//! Expense entity and its lifecycle enums.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an expense.
///
/// `Approved` and `Rejected` are terminal. `AdminReview` is semi-terminal:
/// no automated transition leaves it, only a human decision does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Pending,
    Approved,
    Rejected,
    AdminReview,
}

impl ExpenseStatus {
    /// Whether this status ends the automated review pipeline.
    ///
    /// `AdminReview` counts: the automated side is done and only a human
    /// can move the expense further.
    pub fn is_decided(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether this status is fully terminal (no further transition at all).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl std::fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::AdminReview => write!(f, "admin_review"),
        }
    }
}

/// Who produced the decision currently recorded on the expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionActor {
    None,
    RuleEngine,
    Oracle,
    Human,
}

impl std::fmt::Display for DecisionActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::RuleEngine => write!(f, "rule_engine"),
            Self::Oracle => write!(f, "oracle"),
            Self::Human => write!(f, "human"),
        }
    }
}

/// Expense category as submitted by the claimant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Travel,
    Meals,
    Conference,
    Other,
}

impl Category {
    /// Normalize a free-form category label to a known category.
    ///
    /// Unknown labels fall back to `Other`, matching how submissions from
    /// receipt extraction are mapped.
    pub fn normalize(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "travel" | "transportation" | "lodging" => Self::Travel,
            "meals" => Self::Meals,
            "conference" => Self::Conference,
            _ => Self::Other,
        }
    }
}

/// Receipt attached to an expense, with the fields the document extraction
/// step pulled out of it.
///
/// `vendor`, `date` and `total` are the required fields: if any is absent
/// the documentation is structurally invalid. `extraction_confidence` below
/// the configured floor marks the receipt ambiguous rather than invalid,
/// which routes the claim to the oracle instead of auto-rejecting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Reference into the document store, e.g. `receipts/<owner>/<uuid>.pdf`.
    pub receipt_ref: String,
    pub vendor: Option<String>,
    pub date: Option<NaiveDate>,
    pub total: Option<f64>,
    /// False when the document could not be read at all.
    pub legible: bool,
    /// Extraction confidence in `[0, 1]`.
    pub extraction_confidence: f64,
}

impl Receipt {
    /// A fully extracted, legible receipt.
    pub fn new(
        receipt_ref: impl Into<String>,
        vendor: impl Into<String>,
        date: NaiveDate,
        total: f64,
    ) -> Self {
        Self {
            receipt_ref: receipt_ref.into(),
            vendor: Some(vendor.into()),
            date: Some(date),
            total: Some(total),
            legible: true,
            extraction_confidence: 1.0,
        }
    }
}

/// A submitted reimbursement claim.
///
/// Created with `status = Pending`; the decision orchestrator folds exactly
/// one decision into it per terminal transition. A human reviewer may mutate
/// it only while `status = AdminReview`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub expense_id: String,
    pub owner_id: String,
    pub amount: f64,
    pub category: Category,
    pub justification: String,
    pub receipt: Option<Receipt>,
    pub status: ExpenseStatus,
    pub decision_actor: DecisionActor,
    pub decision_reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Create a new pending expense for `owner_id`.
    pub fn new(
        owner_id: impl Into<String>,
        amount: f64,
        category: Category,
        justification: impl Into<String>,
        receipt: Option<Receipt>,
    ) -> Self {
        let now = Utc::now();
        Self {
            expense_id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            amount,
            category,
            justification: justification.into(),
            receipt,
            status: ExpenseStatus::Pending,
            decision_actor: DecisionActor::None,
            decision_reason: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The UTC calendar day this expense was submitted.
    pub fn submission_day(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}
