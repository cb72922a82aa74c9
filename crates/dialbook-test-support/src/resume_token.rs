//! In-memory `ResumeTokenRepository`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use dialbook_core::changes::{ResumeToken, ResumeTokenRepository, StreamKind};
use dialbook_core::error::DomainError;

/// Resume tokens kept in a map keyed by `(pipeline_id, stream_kind)`.
///
/// Every successful `store` is also appended to a history so tests can
/// assert the order in which tokens advanced.
#[derive(Debug, Default)]
pub struct InMemoryResumeTokenRepository {
    tokens: Mutex<HashMap<(String, StreamKind), ResumeToken>>,
    history: Mutex<Vec<(String, ResumeToken)>>,
}

impl InMemoryResumeTokenRepository {
    /// Creates an empty token store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored token in write order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn history(&self) -> Vec<(String, ResumeToken)> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResumeTokenRepository for InMemoryResumeTokenRepository {
    async fn load(
        &self,
        pipeline_id: &str,
        stream_kind: StreamKind,
    ) -> Result<Option<ResumeToken>, DomainError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .get(&(pipeline_id.to_owned(), stream_kind))
            .copied())
    }

    async fn store(
        &self,
        pipeline_id: &str,
        stream_kind: StreamKind,
        token: ResumeToken,
    ) -> Result<(), DomainError> {
        self.tokens
            .lock()
            .unwrap()
            .insert((pipeline_id.to_owned(), stream_kind), token);
        self.history
            .lock()
            .unwrap()
            .push((pipeline_id.to_owned(), token));
        Ok(())
    }
}
