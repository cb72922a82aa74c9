//! Resume token bookkeeping for the pipelines.

use std::future::Future;
use std::sync::Arc;

use dialbook_core::changes::{ResumeToken, ResumeTokenRepository, StreamKind};
use tokio::sync::mpsc;

use crate::error::ProjectionError;
use crate::pipeline::ChangeEvent;

/// Where a change feed watch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchOptions {
    /// Resume after this token. `None` starts from the current feed head.
    pub resume_after: Option<ResumeToken>,
}

/// Reads and writes the resume tokens of every pipeline.
#[derive(Clone)]
pub struct ResumeTokenCollectionManager {
    tokens: Arc<dyn ResumeTokenRepository>,
}

impl std::fmt::Debug for ResumeTokenCollectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeTokenCollectionManager")
            .finish_non_exhaustive()
    }
}

impl ResumeTokenCollectionManager {
    /// Creates a manager over `tokens`.
    #[must_use]
    pub fn new(tokens: Arc<dyn ResumeTokenRepository>) -> Self {
        Self { tokens }
    }

    /// Builds the watch options of a pipeline from its persisted token.
    ///
    /// # Errors
    ///
    /// Returns the token store error.
    pub async fn set_resume_after_watch_options(
        &self,
        pipeline_id: &str,
        stream_kind: StreamKind,
    ) -> Result<WatchOptions, ProjectionError> {
        let resume_after = self.tokens.load(pipeline_id, stream_kind).await?;
        match resume_after {
            Some(token) => {
                tracing::info!(
                    pipeline_id,
                    stream_type = %stream_kind,
                    resume_token = %token,
                    "resuming watch after stored token"
                );
            }
            None => {
                tracing::info!(
                    pipeline_id,
                    stream_type = %stream_kind,
                    "no stored resume token, watching from now"
                );
            }
        }
        Ok(WatchOptions { resume_after })
    }

    /// Builds the terminal stage of a pipeline: persists the resume token of
    /// every item it receives, in arrival order, and completes once its
    /// input is closed and drained.
    ///
    /// Fails on the first token that cannot be stored.
    pub fn resume_token_writer_stage(
        &self,
        pipeline_id: &'static str,
        stream_kind: StreamKind,
        mut input: mpsc::Receiver<ChangeEvent>,
    ) -> impl Future<Output = Result<(), ProjectionError>> + Send + 'static {
        let tokens = Arc::clone(&self.tokens);
        async move {
            let mut written = 0_u64;
            while let Some(item) = input.recv().await {
                tokens
                    .store(pipeline_id, stream_kind, item.resume_token)
                    .await?;
                written += 1;
                tracing::debug!(
                    pipeline_id,
                    resume_token = %item.resume_token,
                    "resume token stored"
                );
            }
            tracing::info!(
                pipeline_id,
                stream_type = %stream_kind,
                written,
                "resume token writer finished"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use dialbook_core::aggregate::AggregateId;
    use dialbook_core::event::{EventMetaData, EventType, StoredEvent};
    use dialbook_test_support::InMemoryResumeTokenRepository;

    use super::*;

    fn item(position: i64) -> ChangeEvent {
        ChangeEvent {
            resume_token: ResumeToken::new(position),
            event: StoredEvent {
                event_type: EventType::ContactNumberTypeEnabled,
                aggregate_id: AggregateId::contact_number_setting(),
                data: serde_json::json!({"_id": "t1"}),
                sequence_id: position,
                meta_data: EventMetaData::system(),
                correlation_id: "corr".into(),
                created_at: Utc::now(),
                position,
            },
        }
    }

    #[tokio::test]
    async fn test_options_resume_after_stored_token() {
        // Arrange
        let repo = Arc::new(InMemoryResumeTokenRepository::new());
        repo.store("p1", StreamKind::Watch, ResumeToken::new(7))
            .await
            .unwrap();
        let manager = ResumeTokenCollectionManager::new(repo);

        // Act
        let options = manager
            .set_resume_after_watch_options("p1", StreamKind::Watch)
            .await
            .unwrap();

        // Assert
        assert_eq!(options.resume_after, Some(ResumeToken::new(7)));
    }

    #[tokio::test]
    async fn test_options_without_token_start_from_now() {
        let manager =
            ResumeTokenCollectionManager::new(Arc::new(InMemoryResumeTokenRepository::new()));

        let options = manager
            .set_resume_after_watch_options("p1", StreamKind::Watch)
            .await
            .unwrap();

        assert_eq!(options, WatchOptions::default());
    }

    #[tokio::test]
    async fn test_writer_stores_every_token_in_order_until_input_closes() {
        let repo = Arc::new(InMemoryResumeTokenRepository::new());
        let manager = ResumeTokenCollectionManager::new(repo.clone());
        let (tx, rx) = mpsc::channel(crate::HIGH_WATER_MARK);
        let stage = tokio::spawn(manager.resume_token_writer_stage("p1", StreamKind::Watch, rx));

        for position in [3, 4, 9] {
            tx.send(item(position)).await.unwrap();
        }
        drop(tx);
        stage.await.unwrap().unwrap();

        let history: Vec<i64> = repo.history().iter().map(|(_, t)| t.position()).collect();
        assert_eq!(history, vec![3, 4, 9]);
        assert_eq!(
            repo.load("p1", StreamKind::Watch).await.unwrap(),
            Some(ResumeToken::new(9))
        );
    }
}
