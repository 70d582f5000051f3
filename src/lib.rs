//! # expense-flow
//!
//! A policy-driven expense approval core: capability-routed providers, a
//! role-based policy layer, deterministic approval rules with an oracle
//! fallback, a per-expense decision orchestrator, and an exactly-once
//! side-effect coordinator.
//!
//! The pieces compose bottom-up:
//!
//! - [`a2a`] — protocol envelope, capability cards, registry, error taxonomy
//! - [`policy`] — role guards and ownership filtering
//! - [`rules`] — the deterministic approval rules
//! - [`review`] — decision orchestrator and the bounded review dispatcher
//! - [`effects`] — exactly-once side effects (credit, audit, notification)
//! - [`router`] — deterministic intent classification over free-form requests
//! - [`server`] — thin axum transport over the assembled [`app::AppCore`]

pub mod a2a;
pub mod app;
pub mod audit;
pub mod config;
pub mod domain;
pub mod effects;
pub mod notify;
pub mod oracle;
pub mod policy;
pub mod providers;
pub mod review;
pub mod router;
pub mod rules;
pub mod server;
pub mod storage;

pub use a2a::errors::CoreError;
pub use a2a::registry::CapabilityRegistry;
pub use a2a::types::{CallerContext, CapabilityCard, ProtocolMessage, Role};
pub use app::AppCore;
pub use config::ReviewConfig;
pub use domain::{Expense, ExpenseStatus};

/// Crate version, surfaced by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
