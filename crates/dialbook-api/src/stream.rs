//! Lifecycle of the streaming application.

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use dialbook_event_store::change_feed::PgChangeFeed;
use dialbook_event_store::pg_event_repository::PgEventRepository;
use dialbook_event_store::pools::{CLIENT_MANAGEMENT_DB_KEY, ConnectionPools, EVENT_STORE_DB_KEY};
use dialbook_event_store::resume_token::PgResumeTokenRepository;
use dialbook_projections::pg_read_model::{PgClientContactNumberStore, PgContactNumberTypeStore};
use dialbook_projections::pipeline::{PipelineContext, PipelineType};
use dialbook_projections::pipelines::PipelineRegistry;
use dialbook_projections::resume_token::ResumeTokenCollectionManager;
use dialbook_projections::watcher::{ShutdownOutcome, Watcher};

use crate::config::StreamConfig;
use crate::error::AppError;

/// Registers the databases the pipelines of `pipeline_type` use and builds
/// their context from the `PostgreSQL` adapters.
///
/// # Errors
///
/// Returns `AppError::Pool` if a database cannot be reached.
pub async fn postgres_context(
    config: &StreamConfig,
    registry: &PipelineRegistry,
    pipeline_type: PipelineType,
) -> Result<(ConnectionPools, PipelineContext), AppError> {
    let mut pools = ConnectionPools::new(config.database.connection_config());
    pools.register_client_configs([EVENT_STORE_DB_KEY]);
    pools.register_client_configs(registry.client_config_keys(pipeline_type));

    let event_store = pools.client_database(EVENT_STORE_DB_KEY).await?;
    let client_management = pools.client_database(CLIENT_MANAGEMENT_DB_KEY).await?;

    let ctx = PipelineContext {
        feed: Arc::new(PgChangeFeed::new(event_store.clone())),
        events: Arc::new(PgEventRepository::new(event_store)),
        tokens: ResumeTokenCollectionManager::new(Arc::new(PgResumeTokenRepository::new(
            client_management.clone(),
        ))),
        contact_number_types: Arc::new(PgContactNumberTypeStore::new(client_management.clone())),
        client_contact_numbers: Arc::new(PgClientContactNumberStore::new(client_management)),
        poll_interval: config.poll_interval,
    };
    Ok((pools, ctx))
}

/// How often a running stream checks for halted pipelines.
const HALT_CHECK_INTERVAL: Duration = Duration::from_millis(500);

/// Starts the pipelines of `pipeline_type`, waits for `shutdown`, then
/// drains them within `shutdown_timeout`.
///
/// A pipeline that halts on its own ends the run early: the remaining
/// pipelines are drained and `AppError::PipelineHalted` is returned.
///
/// # Errors
///
/// Returns `AppError::Projection` if a pipeline fails to start and
/// `AppError::PipelineHalted` if one stops before `shutdown` resolves.
pub async fn run(
    registry: &PipelineRegistry,
    pipeline_type: PipelineType,
    ctx: &PipelineContext,
    shutdown_timeout: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<ShutdownOutcome, AppError> {
    let watcher = Watcher::start(registry, pipeline_type, ctx).await?;
    tracing::info!(pipelines = ?watcher.pipeline_ids(), "watching event store");

    let mut shutdown = pin!(shutdown);
    let mut halt_check = tokio::time::interval(HALT_CHECK_INTERVAL);
    let halted = loop {
        tokio::select! {
            () = &mut shutdown => break None,
            _ = halt_check.tick() => {
                if let Some(pipeline_id) = watcher.halted_pipeline() {
                    tracing::error!(pipeline_id, "pipeline halted, stopping streaming application");
                    break Some(pipeline_id);
                }
            }
        }
    };

    let outcome = watcher.shutdown(shutdown_timeout).await;
    match halted {
        Some(pipeline_id) => Err(AppError::PipelineHalted(pipeline_id)),
        None => Ok(outcome),
    }
}
