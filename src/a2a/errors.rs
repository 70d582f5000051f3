//! Error taxonomy for the approval core.
//!
//! Failure is a first-class, inspectable value here: capability invocation
//! never lets a provider-side failure escape as a panic or an unwrapped
//! error. Providers return `CoreError`, and the registry converts it into
//! an error envelope the caller inspects.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::types::Role;
use crate::domain::EffectType;

/// Structured RBAC denial.
///
/// A typed value, not an exception, so an automated caller can explain the
/// refusal rather than propagate an opaque fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Denial {
    /// The capability the caller attempted to invoke.
    pub capability: String,
    /// Roles that would have been accepted.
    pub required_roles: Vec<Role>,
    /// The role the caller actually holds.
    pub user_role: Role,
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let required: Vec<String> = self.required_roles.iter().map(|r| r.to_string()).collect();
        write!(
            f,
            "access to '{}' requires one of [{}], caller has '{}'",
            self.capability,
            required.join(", "),
            self.user_role
        )
    }
}

/// Errors produced inside the approval core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Payload does not satisfy a capability's advertised schema.
    /// Rejected before (input) or after (output) the handler runs.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// RBAC denial. Structured, not exceptional.
    #[error("authorization denied: {0}")]
    Authorization(Denial),

    /// The provider or the named capability is not registered.
    #[error("provider unavailable: {provider_id} has no capability '{capability}'")]
    ProviderUnavailable {
        provider_id: String,
        capability: String,
    },

    /// Oracle timed out or returned malformed output. Resolved to
    /// admin review by the orchestrator, never surfaced as a hard failure.
    #[error("oracle degraded: {reason}")]
    OracleDegraded { reason: String },

    /// The idempotency guard found an existing effect record. Treated as
    /// success by the coordinator since the desired end state already holds.
    #[error("side effect already applied: {effect_type} for expense {expense_id}")]
    SideEffectConflict {
        expense_id: String,
        effect_type: EffectType,
    },

    /// Malformed core data, e.g. an expense missing identity fields.
    /// Indicates a caller/integration bug; fatal for the operation.
    #[error("malformed entity: {message}")]
    MalformedEntity { message: String },

    /// A referenced entity does not exist in the store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Provider handler failed for a reason outside the taxonomy above.
    #[error("provider error: {message}")]
    Provider { message: String },
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEntity {
            message: message.into(),
        }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Authorization(_) => "authorization_error",
            Self::ProviderUnavailable { .. } => "provider_unavailable",
            Self::OracleDegraded { .. } => "oracle_degraded",
            Self::SideEffectConflict { .. } => "side_effect_conflict",
            Self::MalformedEntity { .. } => "malformed_entity",
            Self::NotFound { .. } => "not_found",
            Self::Provider { .. } => "provider_error",
        }
    }

    /// Render this error as an error-envelope payload.
    ///
    /// Denials carry their structure so callers can report `required_roles`
    /// and `user_role` instead of an opaque message.
    pub fn to_payload(&self) -> Value {
        match self {
            Self::Authorization(denial) => json!({
                "success": false,
                "code": self.code(),
                "error": self.to_string(),
                "denial": denial,
            }),
            _ => json!({
                "success": false,
                "code": self.code(),
                "error": self.to_string(),
            }),
        }
    }
}
