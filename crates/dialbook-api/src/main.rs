//! Dialbook API server entry point.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use dialbook_api::config::AppConfig;
use dialbook_api::state::AppState;
use dialbook_event_store::pg_event_repository::PgEventRepository;
use dialbook_event_store::pools::{CLIENT_MANAGEMENT_DB_KEY, ConnectionPools, EVENT_STORE_DB_KEY};
use dialbook_projections::pg_read_model::{PgClientContactNumberStore, PgContactNumberTypeStore};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dialbook_api::init_tracing();

    tracing::info!("Starting dialbook API server");

    let config = AppConfig::from_env()?;

    let mut pools = ConnectionPools::new(config.database.connection_config());
    pools.register_client_configs([EVENT_STORE_DB_KEY, CLIENT_MANAGEMENT_DB_KEY]);
    let event_store = pools.client_database(EVENT_STORE_DB_KEY).await?;
    let client_management = pools.client_database(CLIENT_MANAGEMENT_DB_KEY).await?;
    let pools = Arc::new(pools);

    let app_state = AppState::new(
        Arc::new(PgEventRepository::new(event_store)),
        Arc::new(PgContactNumberTypeStore::new(client_management.clone())),
        Arc::new(PgClientContactNumberStore::new(client_management)),
    )
    .with_database_health(pools.clone());

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = dialbook_api::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("invalid HOST:PORT combination: {e}"))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(dialbook_api::shutdown_signal())
        .await?;

    pools.close().await;
    Ok(())
}
