//! Dialbook API — process entry points of the contact number service.
//!
//! The library holds the HTTP routes, their shared state, error mapping and
//! configuration. The `dialbook-api` binary serves the routes; the
//! `dialbook-stream` binary runs the projection pipelines.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod stream;

use axum::Router;

use crate::state::AppState;

/// Builds the application router without middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::contact_number_type::router())
        .merge(routes::client_contact_number::router())
        .with_state(state)
}

/// Installs the JSON `tracing` subscriber, filtered by `RUST_LOG` (default
/// `info`).
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();
}

/// Resolves on the first `SIGINT` or `SIGTERM`.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!(signal = "SIGINT", "shutdown signal received"),
        () = terminate => tracing::info!(signal = "SIGTERM", "shutdown signal received"),
    }
}
