//! HTTP server for the expense approval core.
//!
//! Transport only; all behavior lives in the core. Caller identity is taken
//! from headers supplied by the authentication boundary in front of this
//! service, never from payload content.
//!
//! # Endpoints
//!
//! - `GET  /health`          — Liveness probe
//! - `GET  /providers`       — List registered capability cards
//! - `GET  /providers/:id`   — One provider's card
//! - `POST /query`           — Route a free-form request

pub mod routes;

pub use routes::{app_router, AppState};
