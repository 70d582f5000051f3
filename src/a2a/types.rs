//! Protocol envelope and capability card types.
//!
//! A `ProtocolMessage` is the structured request/response/error envelope
//! exchanged between the router and capability providers. A
//! `CapabilityCard` advertises a provider's capabilities (name plus
//! input/output schema) so routers discover providers by contract rather
//! than by direct call.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Caller identity
// ---------------------------------------------------------------------------

/// Role of the caller, as established by the authentication boundary.
///
/// The hierarchy is static: admin covers everything an employee may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    Admin,
}

impl Role {
    /// Whether this role satisfies a check that requires `required`.
    pub fn covers(self, required: Role) -> bool {
        match self {
            Self::Admin => true,
            Self::Employee => required == Self::Employee,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Employee => write!(f, "employee"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Identity attached to every capability invocation.
///
/// Supplied by the authentication boundary and never inferred from payload
/// content; this is the sole source of identity for authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    pub subject_id: String,
    pub role: Role,
}

impl CallerContext {
    pub fn new(subject_id: impl Into<String>, role: Role) -> Self {
        Self {
            subject_id: subject_id.into(),
            role,
        }
    }

    pub fn employee(subject_id: impl Into<String>) -> Self {
        Self::new(subject_id, Role::Employee)
    }

    pub fn admin(subject_id: impl Into<String>) -> Self {
        Self::new(subject_id, Role::Admin)
    }
}

// ---------------------------------------------------------------------------
// Capability cards
// ---------------------------------------------------------------------------

/// A single named, schema-described operation a provider can perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    pub description: String,
    /// JSON schema the invocation parameters must satisfy.
    pub input_schema: Value,
    /// JSON schema a successful result must satisfy.
    pub output_schema: Value,
}

impl Capability {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        output_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            output_schema,
        }
    }
}

/// Advertises a provider's identity and capabilities.
///
/// Immutable once registered; re-registration replaces the card wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityCard {
    pub provider_id: String,
    pub name: String,
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl CapabilityCard {
    pub fn new(
        provider_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        capabilities: Vec<Capability>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            name: name.into(),
            description: description.into(),
            version: default_version(),
            capabilities,
            metadata: HashMap::new(),
        }
    }

    /// Look up an advertised capability by name.
    pub fn capability(&self, name: &str) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.name == name)
    }
}

// ---------------------------------------------------------------------------
// Protocol envelope
// ---------------------------------------------------------------------------

/// Envelope message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Request,
    Response,
    Error,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Response => write!(f, "response"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The envelope exchanged between routers and providers.
///
/// Created per invocation and never mutated. A response or error envelope
/// carries the `correlation_id` of the request it answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolMessage {
    pub message_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub sender_id: String,
    pub recipient_id: String,
    pub message_type: MessageType,
    pub capability_name: Option<String>,
    pub payload: Value,
    pub correlation_id: Option<Uuid>,
}

impl ProtocolMessage {
    /// Build a request envelope for a capability invocation.
    pub fn request(
        sender_id: impl Into<String>,
        recipient_id: impl Into<String>,
        capability_name: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            sender_id: sender_id.into(),
            recipient_id: recipient_id.into(),
            message_type: MessageType::Request,
            capability_name: Some(capability_name.into()),
            payload,
            correlation_id: None,
        }
    }

    /// Build the response envelope answering `request`.
    pub fn response_to(request: &ProtocolMessage, payload: Value) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            sender_id: request.recipient_id.clone(),
            recipient_id: request.sender_id.clone(),
            message_type: MessageType::Response,
            capability_name: request.capability_name.clone(),
            payload,
            correlation_id: Some(request.correlation_id.unwrap_or(request.message_id)),
        }
    }

    /// Build the error envelope answering `request`.
    pub fn error_to(request: &ProtocolMessage, payload: Value) -> Self {
        Self {
            message_type: MessageType::Error,
            ..Self::response_to(request, payload)
        }
    }

    /// Whether this envelope is a successful response.
    pub fn is_ok(&self) -> bool {
        self.message_type == MessageType::Response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_hierarchy() {
        assert!(Role::Admin.covers(Role::Employee));
        assert!(Role::Admin.covers(Role::Admin));
        assert!(Role::Employee.covers(Role::Employee));
        assert!(!Role::Employee.covers(Role::Admin));
    }

    #[test]
    fn response_correlates_to_request() {
        let req = ProtocolMessage::request("router", "expense-agent", "get_expense", json!({}));
        let resp = ProtocolMessage::response_to(&req, json!({"ok": true}));

        assert_eq!(resp.correlation_id, Some(req.message_id));
        assert_eq!(resp.sender_id, "expense-agent");
        assert_eq!(resp.recipient_id, "router");
        assert_eq!(resp.capability_name.as_deref(), Some("get_expense"));
        assert!(resp.is_ok());
    }

    #[test]
    fn error_envelope_keeps_correlation() {
        let req = ProtocolMessage::request("router", "oracle", "classify_claim", json!({}));
        let err = ProtocolMessage::error_to(&req, json!({"error": "boom"}));

        assert_eq!(err.message_type, MessageType::Error);
        assert_eq!(err.correlation_id, Some(req.message_id));
        assert!(!err.is_ok());
    }

    #[test]
    fn card_capability_lookup() {
        let card = CapabilityCard::new(
            "expense-agent",
            "Expense Agent",
            "Expense operations",
            vec![Capability::new(
                "list_expenses",
                "List expenses",
                json!({}),
                json!({}),
            )],
        );
        assert!(card.capability("list_expenses").is_some());
        assert!(card.capability("missing").is_none());
    }
}
