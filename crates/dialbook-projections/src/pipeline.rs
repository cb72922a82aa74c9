//! The stage chain every projection pipeline runs.
//!
//! ```text
//! change feed -> watch -> decode -> project -> resume token writer
//! ```
//!
//! Stages are tokio tasks joined by channels of [`HIGH_WATER_MARK`] slots,
//! so a slow stage stalls the ones before it down to the feed. A stage
//! forwards an item only after its own effect completed. A failing stage
//! returns its error and drops its channels; the stages before it stop
//! when their sends fail and the stages after it drain and finish.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dialbook_core::changes::{ChangeFeed, ChangeRecord, ResumeToken, StreamKind};
use dialbook_core::event::StoredEvent;
use dialbook_core::repository::EventRepository;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::HIGH_WATER_MARK;
use crate::error::ProjectionError;
use crate::read_model::{ClientContactNumberProjectionStore, ContactNumberTypeProjectionStore};
use crate::resume_token::ResumeTokenCollectionManager;
use crate::transformers::ProjectionTransformer;

/// Default delay between two polls of an idle change feed.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

const STAGES: [&str; 4] = ["watch", "decode", "project", "resume_token_writer"];

/// A decoded change record travelling through a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Feed position of the record.
    pub resume_token: ResumeToken,
    /// The event the record carries.
    pub event: StoredEvent,
}

impl TryFrom<ChangeRecord> for ChangeEvent {
    type Error = ProjectionError;

    fn try_from(record: ChangeRecord) -> Result<Self, Self::Error> {
        let event = serde_json::from_value(record.full_document).map_err(|source| {
            ProjectionError::MalformedRecord {
                token: record.resume_token,
                source,
            }
        })?;
        Ok(Self {
            resume_token: record.resume_token,
            event,
        })
    }
}

/// Group of pipelines started together by one streaming process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineType {
    /// The read models of the contact number service.
    Core,
}

impl PipelineType {
    /// Name used on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
        }
    }
}

impl fmt::Display for PipelineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineType {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "core" => Ok(Self::Core),
            other => Err(ProjectionError::UnknownPipelineType(other.to_owned())),
        }
    }
}

/// Everything a pipeline needs to run.
#[derive(Clone)]
pub struct PipelineContext {
    /// Change feed of the event store.
    pub feed: Arc<dyn ChangeFeed>,
    /// Event store, for cross-aggregate lookups.
    pub events: Arc<dyn EventRepository>,
    /// Resume token bookkeeping.
    pub tokens: ResumeTokenCollectionManager,
    /// Contact number type read model.
    pub contact_number_types: Arc<dyn ContactNumberTypeProjectionStore>,
    /// Client contact number read model.
    pub client_contact_numbers: Arc<dyn ClientContactNumberProjectionStore>,
    /// Delay between two polls of an idle feed.
    pub poll_interval: Duration,
}

impl fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineContext")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

/// A read model kept up to date from the change feed.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Identifier; also the resume token key.
    fn id(&self) -> &'static str;

    /// Configuration keys of the databases this pipeline uses.
    fn client_config_keys(&self) -> &'static [&'static str];

    /// The group this pipeline is started with.
    fn pipeline_type(&self) -> PipelineType;

    /// Builds the projection stage of this pipeline.
    fn transformer(&self, ctx: &PipelineContext) -> Arc<dyn ProjectionTransformer>;

    /// Starts watching the change feed.
    ///
    /// # Errors
    ///
    /// Returns the token store error if the watch options cannot be built.
    async fn watch(&self, ctx: &PipelineContext) -> Result<WatchHandle, ProjectionError> {
        start_pipeline(self.id(), ctx, self.transformer(ctx)).await
    }
}

/// Control over one running pipeline.
#[derive(Debug)]
pub struct WatchHandle {
    pipeline_id: &'static str,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<Result<(), ProjectionError>>,
}

impl WatchHandle {
    /// Identifier of the pipeline.
    #[must_use]
    pub fn pipeline_id(&self) -> &'static str {
        self.pipeline_id
    }

    /// Returns `true` once every stage has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops reading the feed and resolves once every item already read has
    /// passed the resume token writer.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that failed.
    pub async fn shutdown(self) -> Result<(), ProjectionError> {
        let _ = self.shutdown_tx.send(true);
        self.wait().await
    }

    /// Resolves when the pipeline ends without being asked to, after a
    /// stage failed.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that failed.
    pub async fn wait(self) -> Result<(), ProjectionError> {
        let pipeline_id = self.pipeline_id;
        self.task
            .await
            .map_err(|e| ProjectionError::StageAborted {
                pipeline_id,
                stage: "supervisor",
                message: e.to_string(),
            })?
    }
}

/// Spawns the four stages of a pipeline and returns its handle.
///
/// # Errors
///
/// Returns the token store error if the watch options cannot be built.
pub async fn start_pipeline(
    pipeline_id: &'static str,
    ctx: &PipelineContext,
    transformer: Arc<dyn ProjectionTransformer>,
) -> Result<WatchHandle, ProjectionError> {
    let stream_kind = StreamKind::Watch;
    let options = ctx
        .tokens
        .set_resume_after_watch_options(pipeline_id, stream_kind)
        .await?;

    let start_after = match options.resume_after {
        Some(token) => Some(token),
        None => ctx.feed.head().await?,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (raw_tx, raw_rx) = mpsc::channel(HIGH_WATER_MARK);
    let (decoded_tx, decoded_rx) = mpsc::channel(HIGH_WATER_MARK);
    let (applied_tx, applied_rx) = mpsc::channel(HIGH_WATER_MARK);

    let stages = [
        tokio::spawn(watch_stage(
            Arc::clone(&ctx.feed),
            start_after,
            ctx.poll_interval,
            raw_tx,
            shutdown_rx,
        )),
        tokio::spawn(decode_stage(raw_rx, decoded_tx)),
        tokio::spawn(projection_stage(pipeline_id, transformer, decoded_rx, applied_tx)),
        tokio::spawn(
            ctx.tokens
                .resume_token_writer_stage(pipeline_id, stream_kind, applied_rx),
        ),
    ];
    tracing::info!(pipeline_id, stream_type = %stream_kind, "Collection watch initiated");

    Ok(WatchHandle {
        pipeline_id,
        shutdown_tx,
        task: tokio::spawn(supervise(pipeline_id, stages)),
    })
}

async fn supervise(
    pipeline_id: &'static str,
    stages: [JoinHandle<Result<(), ProjectionError>>; 4],
) -> Result<(), ProjectionError> {
    let mut outcome = Ok(());
    for (stage, handle) in STAGES.into_iter().zip(stages) {
        let result = handle.await.map_err(|e| ProjectionError::StageAborted {
            pipeline_id,
            stage,
            message: e.to_string(),
        });
        if let Err(err) = result.and_then(|r| r) {
            tracing::error!(pipeline_id, stage, error = %err, "pipeline stage failed");
            if outcome.is_ok() {
                outcome = Err(err);
            }
        }
    }
    if outcome.is_ok() {
        tracing::info!(pipeline_id, "pipeline drained");
    }
    outcome
}

/// Polls the feed from `after` and emits its records in position order until
/// shutdown is requested or the next stage goes away.
async fn watch_stage(
    feed: Arc<dyn ChangeFeed>,
    mut after: Option<ResumeToken>,
    poll_interval: Duration,
    output: mpsc::Sender<ChangeRecord>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ProjectionError> {
    let mut interval = interval_at(Instant::now(), poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            () = output.closed() => return Ok(()),
            _ = interval.tick() => {}
        }
        if *shutdown.borrow() {
            break;
        }

        let records = feed.read_after(after, HIGH_WATER_MARK).await?;
        let full_batch = records.len() == HIGH_WATER_MARK;
        for record in records {
            after = Some(record.resume_token);
            if output.send(record).await.is_err() {
                return Ok(());
            }
        }
        if full_batch {
            interval.reset_immediately();
        }
    }
    tracing::debug!(last_token = ?after, "change feed watch closed");
    Ok(())
}

/// Turns raw change records into events.
async fn decode_stage(
    mut input: mpsc::Receiver<ChangeRecord>,
    output: mpsc::Sender<ChangeEvent>,
) -> Result<(), ProjectionError> {
    while let Some(record) = input.recv().await {
        let item = ChangeEvent::try_from(record)?;
        if output.send(item).await.is_err() {
            break;
        }
    }
    Ok(())
}

/// Applies supported events to the read model and forwards every item,
/// supported or not, once that is done.
async fn projection_stage(
    pipeline_id: &'static str,
    transformer: Arc<dyn ProjectionTransformer>,
    mut input: mpsc::Receiver<ChangeEvent>,
    output: mpsc::Sender<ChangeEvent>,
) -> Result<(), ProjectionError> {
    while let Some(item) = input.recv().await {
        let event_type = item.event.event_type;
        if transformer.supports(event_type) {
            transformer.apply(&item.event).await?;
        } else {
            tracing::debug!(pipeline_id, event_type = %event_type, "Incoming event ignored");
        }
        if output.send(item).await.is_err() {
            break;
        }
    }
    Ok(())
}
