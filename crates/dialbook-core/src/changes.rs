//! Change feed abstractions over the event log.
//!
//! A change feed exposes every event appended to the store, in append
//! order, tagged with a resume token. Projection pipelines persist the token
//! of the last record they fully applied and resume after it on restart.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Opaque position in the change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeToken(i64);

impl ResumeToken {
    /// Wraps a raw feed position.
    #[must_use]
    pub fn new(position: i64) -> Self {
        Self(position)
    }

    /// Returns the raw feed position.
    #[must_use]
    pub fn position(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of stream a pipeline consumes; part of the resume token key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// A live watch over the event store collection.
    Watch,
}

impl StreamKind {
    /// Returns the persisted name of the stream kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Watch => "watch",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw record emitted by the change feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    /// Feed position of this record.
    pub resume_token: ResumeToken,
    /// The inserted event document, as stored.
    pub full_document: serde_json::Value,
}

/// Read access to the event store's change feed.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Returns the token of the most recent record, or `None` for an empty
    /// log. Used to start watching from "now".
    async fn head(&self) -> Result<Option<ResumeToken>, DomainError>;

    /// Returns up to `limit` records strictly after `after` (from the start
    /// of the log when `None`), in feed order.
    async fn read_after(
        &self,
        after: Option<ResumeToken>,
        limit: usize,
    ) -> Result<Vec<ChangeRecord>, DomainError>;
}

/// Persistence of the last drained resume token per pipeline and stream kind.
#[async_trait]
pub trait ResumeTokenRepository: Send + Sync {
    /// Loads the persisted token, if any.
    async fn load(
        &self,
        pipeline_id: &str,
        stream_kind: StreamKind,
    ) -> Result<Option<ResumeToken>, DomainError>;

    /// Persists `token` as the latest drained position.
    async fn store(
        &self,
        pipeline_id: &str,
        stream_kind: StreamKind,
        token: ResumeToken,
    ) -> Result<(), DomainError>;
}
