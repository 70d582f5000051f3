//! The capability provider contract.

use async_trait::async_trait;
use serde_json::Value;

use super::errors::CoreError;
use super::types::{CallerContext, CapabilityCard};

/// A component that advertises capabilities and executes them when invoked.
///
/// Providers never see raw envelopes; the registry unwraps the request,
/// validates the payload against the advertised schema, and converts any
/// returned error into an error envelope. Handlers therefore report failure
/// through `CoreError`, not by panicking.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// The card this provider advertises. Called once at registration.
    fn card(&self) -> CapabilityCard;

    /// Execute the named capability.
    ///
    /// `params` has already been validated against the capability's input
    /// schema. `context` is the authenticated caller identity; handlers must
    /// use it, and only it, for authorization decisions.
    async fn handle(
        &self,
        capability: &str,
        params: Value,
        context: &CallerContext,
    ) -> Result<Value, CoreError>;
}
