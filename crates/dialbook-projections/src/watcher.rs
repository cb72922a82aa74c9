//! Starts the pipelines of one type and shuts them down together.

use std::time::Duration;

use futures_util::future::join_all;

use crate::error::ProjectionError;
use crate::pipeline::{PipelineContext, PipelineType, WatchHandle};
use crate::pipelines::PipelineRegistry;

/// How a [`Watcher::shutdown`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every pipeline drained within the timeout.
    Graceful,
    /// The timeout elapsed first.
    TimedOut,
}

/// The running pipelines of one streaming process.
#[derive(Debug)]
pub struct Watcher {
    pipeline_type: PipelineType,
    handles: Vec<WatchHandle>,
}

impl Watcher {
    /// Starts every registered pipeline of `pipeline_type`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while starting a pipeline; pipelines
    /// started before it are shut down.
    pub async fn start(
        registry: &PipelineRegistry,
        pipeline_type: PipelineType,
        ctx: &PipelineContext,
    ) -> Result<Self, ProjectionError> {
        let mut handles = Vec::new();
        for pipeline in registry.pipelines(pipeline_type) {
            match pipeline.watch(ctx).await {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    tracing::error!(
                        pipeline_id = pipeline.id(),
                        error = %err,
                        "pipeline failed to start"
                    );
                    for handle in handles {
                        let pipeline_id = handle.pipeline_id();
                        if let Err(rollback_err) = handle.shutdown().await {
                            tracing::warn!(
                                pipeline_id,
                                error = %rollback_err,
                                "pipeline failed while rolling back startup"
                            );
                        }
                    }
                    return Err(err);
                }
            }
        }
        tracing::info!(
            pipeline_type = %pipeline_type,
            pipelines = handles.len(),
            "streaming application started"
        );
        Ok(Self {
            pipeline_type,
            handles,
        })
    }

    /// Identifiers of the running pipelines.
    #[must_use]
    pub fn pipeline_ids(&self) -> Vec<&'static str> {
        self.handles.iter().map(WatchHandle::pipeline_id).collect()
    }

    /// Returns the first pipeline that stopped without being asked to.
    #[must_use]
    pub fn halted_pipeline(&self) -> Option<&'static str> {
        self.handles
            .iter()
            .find(|handle| handle.is_finished())
            .map(WatchHandle::pipeline_id)
    }

    /// Drains every pipeline concurrently, giving up after `timeout`.
    ///
    /// A pipeline that fails while draining is logged and does not stop the
    /// others.
    pub async fn shutdown(self, timeout: Duration) -> ShutdownOutcome {
        let pipeline_type = self.pipeline_type;
        tracing::info!(pipeline_type = %pipeline_type, "shutting down pipelines");
        let drains = join_all(self.handles.into_iter().map(|handle| async move {
            let pipeline_id = handle.pipeline_id();
            if let Err(err) = handle.shutdown().await {
                tracing::error!(pipeline_id, error = %err, "pipeline ended with an error");
            }
        }));

        if tokio::time::timeout(timeout, drains).await.is_ok() {
            tracing::info!(pipeline_type = %pipeline_type, "all pipelines drained");
            ShutdownOutcome::Graceful
        } else {
            tracing::error!(
                pipeline_type = %pipeline_type,
                ?timeout,
                "pipelines did not drain in time"
            );
            ShutdownOutcome::TimedOut
        }
    }
}
