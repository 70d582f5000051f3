//! Capability-routing protocol.
//!
//! Providers advertise [`CapabilityCard`]s describing what they can do; the
//! [`CapabilityRegistry`] lets routers discover and invoke them by contract
//! (capability name plus input/output schema) instead of by direct call.
//! Request, response and error all travel as [`ProtocolMessage`] envelopes
//! linked by correlation id.

pub mod errors;
pub mod provider;
pub mod registry;
pub mod schema;
pub mod types;

pub use errors::{CoreError, Denial};
pub use provider::CapabilityProvider;
pub use registry::CapabilityRegistry;
pub use types::{
    CallerContext, Capability, CapabilityCard, MessageType, ProtocolMessage, Role,
};
