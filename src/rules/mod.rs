//! Deterministic policy rules.
//!
//! Pure functions over an expense snapshot and the submitter's same-day
//! submission count. Evaluation order is R4 first (fail fast on bad
//! documentation), then R3, then R1/R2, which are mutually exclusive on the
//! first-submission-of-the-day predicate:
//!
//! - R4: receipt missing, unreadable, or required fields (vendor, date,
//!   total) absent or contradictory — reject.
//! - R3: amount above the low threshold — manual review.
//! - R2: at or below the threshold but not the first submission today —
//!   manual review.
//! - R1: at or below the threshold, first of the day, valid receipt,
//!   reimbursable category — approve.
//!
//! Documentation that is present but ambiguous fires no rule; the evaluator
//! returns [`RuleOutcome::Inconclusive`] and the orchestrator consults the
//! oracle.

use crate::a2a::errors::CoreError;
use crate::config::ReviewConfig;
use crate::domain::{Decision, DecisionOutcome, Expense, Receipt, RuleId};

/// Result of deterministic evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// A rule fired conclusively.
    Decided(Decision),
    /// No rule fired; the oracle must judge.
    Inconclusive { reason: String },
}

/// Structural state of the attached documentation.
#[derive(Debug, Clone, PartialEq)]
enum ReceiptCheck {
    Valid,
    /// Missing, unreadable, or required fields absent/contradictory.
    Invalid(String),
    /// Present and structurally complete, but extraction confidence is too
    /// low to trust deterministically.
    Ambiguous(String),
}

/// Evaluate the policy rules.
///
/// `prior_submissions_today` is the number of other submissions by the same
/// owner on the submission day. Malformed core data (blank identity fields,
/// non-finite or non-positive amount) is a caller bug and is fatal for the
/// request, not folded into a decision.
pub fn evaluate(
    expense: &Expense,
    prior_submissions_today: usize,
    config: &ReviewConfig,
) -> Result<RuleOutcome, CoreError> {
    check_well_formed(expense)?;

    match check_receipt(expense, config) {
        ReceiptCheck::Invalid(reason) => {
            return Ok(RuleOutcome::Decided(Decision::from_rule(
                RuleId::R4,
                DecisionOutcome::Rejected,
                reason,
            )));
        }
        ReceiptCheck::Ambiguous(reason) => {
            return Ok(RuleOutcome::Inconclusive { reason });
        }
        ReceiptCheck::Valid => {}
    }

    if expense.amount > config.threshold_low {
        return Ok(RuleOutcome::Decided(Decision::from_rule(
            RuleId::R3,
            DecisionOutcome::AdminReview,
            format!(
                "Amount {:.2} exceeds auto-approval threshold {:.2}",
                expense.amount, config.threshold_low
            ),
        )));
    }

    if prior_submissions_today > 0 {
        return Ok(RuleOutcome::Decided(Decision::from_rule(
            RuleId::R2,
            DecisionOutcome::AdminReview,
            format!(
                "Not the first submission today ({} prior)",
                prior_submissions_today
            ),
        )));
    }

    if config.reimbursable.contains(&expense.category) {
        return Ok(RuleOutcome::Decided(Decision::from_rule(
            RuleId::R1,
            DecisionOutcome::Approved,
            format!(
                "Amount {:.2} within threshold, first submission of the day, receipt valid",
                expense.amount
            ),
        )));
    }

    // Documentation is fine but the category is outside the reimbursable
    // set; policy does not decide this deterministically.
    Ok(RuleOutcome::Inconclusive {
        reason: format!(
            "Category {:?} is not in the auto-reimbursable set",
            expense.category
        ),
    })
}

fn check_well_formed(expense: &Expense) -> Result<(), CoreError> {
    if expense.expense_id.trim().is_empty() || expense.owner_id.trim().is_empty() {
        return Err(CoreError::malformed(
            "expense is missing identity fields (expense_id/owner_id)",
        ));
    }
    if !expense.amount.is_finite() || expense.amount <= 0.0 {
        return Err(CoreError::malformed(format!(
            "expense {} has invalid amount {}",
            expense.expense_id, expense.amount
        )));
    }
    Ok(())
}

fn check_receipt(expense: &Expense, config: &ReviewConfig) -> ReceiptCheck {
    let Some(receipt) = &expense.receipt else {
        return ReceiptCheck::Invalid("Receipt is missing".to_string());
    };
    if !receipt.legible {
        return ReceiptCheck::Invalid("Receipt is unreadable".to_string());
    }
    if let Some(reason) = missing_field(receipt) {
        return ReceiptCheck::Invalid(reason);
    }
    // All three required fields are present here.
    let total = receipt.total.unwrap_or_default();
    if (total - expense.amount).abs() > config.amount_tolerance {
        return ReceiptCheck::Invalid(format!(
            "Receipt total {:.2} contradicts claimed amount {:.2}",
            total, expense.amount
        ));
    }
    if receipt.extraction_confidence < config.min_extraction_confidence {
        return ReceiptCheck::Ambiguous(format!(
            "Receipt extraction confidence {:.2} below {:.2}",
            receipt.extraction_confidence, config.min_extraction_confidence
        ));
    }
    ReceiptCheck::Valid
}

fn missing_field(receipt: &Receipt) -> Option<String> {
    let missing: Vec<&str> = [
        ("vendor", receipt.vendor.is_none()),
        ("date", receipt.date.is_none()),
        ("total", receipt.total.is_none()),
    ]
    .iter()
    .filter(|(_, absent)| *absent)
    .map(|(name, _)| *name)
    .collect();

    if missing.is_empty() {
        None
    } else {
        Some(format!("Receipt missing required fields: {}", missing.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, DecisionSource};
    use chrono::NaiveDate;

    fn valid_receipt(total: f64) -> Receipt {
        Receipt::new(
            "receipts/emp-1/r.pdf",
            "Acme Travel",
            NaiveDate::from_ymd_opt(2026, 8, 24).unwrap(),
            total,
        )
    }

    fn expense(amount: f64, receipt: Option<Receipt>) -> Expense {
        Expense::new("emp-1", amount, Category::Travel, "client visit", receipt)
    }

    fn fired_rule(outcome: &RuleOutcome) -> Option<RuleId> {
        match outcome {
            RuleOutcome::Decided(d) => match d.source {
                DecisionSource::Rule(id) => Some(id),
                DecisionSource::Oracle => None,
            },
            RuleOutcome::Inconclusive { .. } => None,
        }
    }

    #[test]
    fn r1_auto_approves_clean_first_submission() {
        let config = ReviewConfig::default();
        let e = expense(100.0, Some(valid_receipt(100.0)));
        let outcome = evaluate(&e, 0, &config).unwrap();
        assert_eq!(fired_rule(&outcome), Some(RuleId::R1));
        match outcome {
            RuleOutcome::Decided(d) => assert_eq!(d.outcome, DecisionOutcome::Approved),
            _ => unreachable!(),
        }
    }

    #[test]
    fn r2_routes_repeat_submission_to_review() {
        let config = ReviewConfig::default();
        let e = expense(100.0, Some(valid_receipt(100.0)));
        let outcome = evaluate(&e, 1, &config).unwrap();
        assert_eq!(fired_rule(&outcome), Some(RuleId::R2));
        match outcome {
            RuleOutcome::Decided(d) => assert_eq!(d.outcome, DecisionOutcome::AdminReview),
            _ => unreachable!(),
        }
    }

    #[test]
    fn r3_dominates_r1_above_threshold() {
        let config = ReviewConfig::default();
        let e = expense(600.0, Some(valid_receipt(600.0)));
        let outcome = evaluate(&e, 0, &config).unwrap();
        assert_eq!(fired_rule(&outcome), Some(RuleId::R3));
    }

    #[test]
    fn r4_dominates_everything_on_missing_receipt() {
        let config = ReviewConfig::default();
        let e = expense(100.0, None);
        let outcome = evaluate(&e, 0, &config).unwrap();
        assert_eq!(fired_rule(&outcome), Some(RuleId::R4));
        match outcome {
            RuleOutcome::Decided(d) => assert_eq!(d.outcome, DecisionOutcome::Rejected),
            _ => unreachable!(),
        }
    }

    #[test]
    fn r4_rejects_contradictory_total() {
        let config = ReviewConfig::default();
        let e = expense(100.0, Some(valid_receipt(250.0)));
        let outcome = evaluate(&e, 0, &config).unwrap();
        assert_eq!(fired_rule(&outcome), Some(RuleId::R4));
    }

    #[test]
    fn r4_rejects_unreadable_and_incomplete_receipts() {
        let config = ReviewConfig::default();

        let mut unreadable = valid_receipt(100.0);
        unreadable.legible = false;
        let outcome = evaluate(&expense(100.0, Some(unreadable)), 0, &config).unwrap();
        assert_eq!(fired_rule(&outcome), Some(RuleId::R4));

        let mut no_vendor = valid_receipt(100.0);
        no_vendor.vendor = None;
        let outcome = evaluate(&expense(100.0, Some(no_vendor)), 0, &config).unwrap();
        assert_eq!(fired_rule(&outcome), Some(RuleId::R4));
    }

    #[test]
    fn low_confidence_extraction_is_inconclusive() {
        let config = ReviewConfig::default();
        let mut receipt = valid_receipt(100.0);
        receipt.extraction_confidence = 0.3;
        let outcome = evaluate(&expense(100.0, Some(receipt)), 0, &config).unwrap();
        assert!(matches!(outcome, RuleOutcome::Inconclusive { .. }));
    }

    #[test]
    fn non_reimbursable_category_is_inconclusive() {
        let config = ReviewConfig::default();
        let mut e = expense(100.0, Some(valid_receipt(100.0)));
        e.category = Category::Other;
        let outcome = evaluate(&e, 0, &config).unwrap();
        assert!(matches!(outcome, RuleOutcome::Inconclusive { .. }));
    }

    #[test]
    fn malformed_expense_is_fatal_not_decided() {
        let config = ReviewConfig::default();
        let mut e = expense(100.0, Some(valid_receipt(100.0)));
        e.owner_id = String::new();
        let err = evaluate(&e, 0, &config).unwrap_err();
        assert_eq!(err.code(), "malformed_entity");

        let mut e = expense(100.0, Some(valid_receipt(100.0)));
        e.amount = f64::NAN;
        assert!(evaluate(&e, 0, &config).is_err());
    }
}
