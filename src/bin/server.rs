//! expense-flow HTTP server binary.
//!
//! # Environment Variables
//!
//! - `PORT` — HTTP port (default: 8080)
//! - `EXPENSE_THRESHOLD_LOW` — auto-approve threshold (default: 500)
//! - `EXPENSE_ORACLE_TIMEOUT_SECS` — oracle consultation timeout (default: 5)
//! - `EXPENSE_DECISION_WAIT_SECS` — router decision wait (default: 30)
//! - `EXPENSE_WORKER_POOL_SIZE` — concurrent review runs (default: 4)
//! - `RUST_LOG` — Tracing filter (default: "info")

use expense_flow::app::AppCore;
use expense_flow::config::ReviewConfig;
use expense_flow::server::{app_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,expense_flow=debug".into()),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_addr = format!("0.0.0.0:{}", port);

    let config = ReviewConfig::from_env();
    let state = AppState::new(AppCore::new(config));

    let app = app_router(state);

    tracing::info!("expense-flow server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health          — liveness probe");
    tracing::info!("  GET  /providers       — registered capability cards");
    tracing::info!("  GET  /providers/{{id}}  — one provider's card");
    tracing::info!("  POST /query           — route a free-form request");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
