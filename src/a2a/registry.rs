//! Capability registry and invocation boundary.
//!
//! Holds the cards advertised by capability providers and dispatches
//! invocations to them. The registry is an explicitly constructed instance
//! with a documented lifecycle: built at process start, populated by
//! provider registration, read thereafter. There is no global singleton.
//!
//! `invoke` is the one place failure crosses the provider boundary, and it
//! crosses as a value: any handler error becomes an `error` envelope, so
//! callers inspect `message_type` instead of catching faults.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::errors::CoreError;
use super::provider::CapabilityProvider;
use super::schema;
use super::types::{CallerContext, CapabilityCard, ProtocolMessage};
use crate::audit::AuditTrail;

struct RegisteredProvider {
    card: CapabilityCard,
    handler: Arc<dyn CapabilityProvider>,
}

/// Registry of capability providers, keyed by provider id.
///
/// Registration is rare and replaces the provider's card wholesale; reads
/// are frequent and never observe a partially updated card (the card map is
/// behind a single `RwLock`).
pub struct CapabilityRegistry {
    providers: RwLock<HashMap<String, RegisteredProvider>>,
    audit: AuditTrail,
}

impl CapabilityRegistry {
    pub fn new(audit: AuditTrail) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            audit,
        }
    }

    /// Register a provider, replacing any prior card for the same id.
    pub fn register(&self, provider: Arc<dyn CapabilityProvider>) {
        let card = provider.card();
        log::info!(
            "Registered provider {} ({} capabilities)",
            card.provider_id,
            card.capabilities.len()
        );
        self.providers.write().insert(
            card.provider_id.clone(),
            RegisteredProvider {
                card,
                handler: provider,
            },
        );
    }

    /// The card for a provider, if registered.
    pub fn find_by_provider(&self, provider_id: &str) -> Option<CapabilityCard> {
        self.providers
            .read()
            .get(provider_id)
            .map(|p| p.card.clone())
    }

    /// All cards advertising a capability with the given name.
    pub fn find_by_capability(&self, capability_name: &str) -> Vec<CapabilityCard> {
        self.providers
            .read()
            .values()
            .filter(|p| p.card.capability(capability_name).is_some())
            .map(|p| p.card.clone())
            .collect()
    }

    /// All registered cards.
    pub fn list(&self) -> Vec<CapabilityCard> {
        let mut cards: Vec<CapabilityCard> = self
            .providers
            .read()
            .values()
            .map(|p| p.card.clone())
            .collect();
        cards.sort_by(|a, b| a.provider_id.cmp(&b.provider_id));
        cards
    }

    /// Invoke a capability on a provider.
    ///
    /// Validates that the provider is registered and exposes the capability,
    /// checks the parameters against the advertised input schema, dispatches
    /// to the handler, and checks a successful result against the output
    /// schema. Every failure on that path is returned as an error envelope;
    /// this method never returns `Err` and never panics on provider faults.
    /// Every envelope that crosses this boundary is audited.
    pub async fn invoke(
        &self,
        provider_id: &str,
        capability_name: &str,
        params: Value,
        context: &CallerContext,
    ) -> ProtocolMessage {
        let request = ProtocolMessage::request(
            context.subject_id.clone(),
            provider_id,
            capability_name,
            params.clone(),
        );
        self.audit.log_protocol_message(&request);

        // Resolve handler and schemas under the read lock, then release it
        // before awaiting the handler.
        let resolved = {
            let providers = self.providers.read();
            providers.get(provider_id).and_then(|p| {
                p.card.capability(capability_name).map(|cap| {
                    (
                        p.handler.clone(),
                        cap.input_schema.clone(),
                        cap.output_schema.clone(),
                    )
                })
            })
        };

        let Some((handler, input_schema, output_schema)) = resolved else {
            return self.reply_error(
                &request,
                context,
                CoreError::ProviderUnavailable {
                    provider_id: provider_id.to_string(),
                    capability: capability_name.to_string(),
                },
            );
        };

        if let Err(err) = schema::validate(&input_schema, &params) {
            return self.reply_error(&request, context, err);
        }

        match handler.handle(capability_name, params, context).await {
            Ok(result) => {
                if let Err(err) = schema::validate(&output_schema, &result) {
                    log::error!(
                        "Provider {provider_id} returned output violating its own '{capability_name}' schema: {err}"
                    );
                    return self.reply_error(&request, context, err);
                }
                let response = ProtocolMessage::response_to(&request, result);
                self.audit.log_protocol_message(&response);
                response
            }
            Err(err) => self.reply_error(&request, context, err),
        }
    }

    fn reply_error(
        &self,
        request: &ProtocolMessage,
        context: &CallerContext,
        err: CoreError,
    ) -> ProtocolMessage {
        if let CoreError::Authorization(denial) = &err {
            self.audit.log_denial(context, denial);
        }
        let reply = ProtocolMessage::error_to(request, err.to_payload());
        self.audit.log_protocol_message(&reply);
        reply
    }
}
