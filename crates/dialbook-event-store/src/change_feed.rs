//! Change feed over the event log, ordered by global append position.

use async_trait::async_trait;
use sqlx::PgPool;

use dialbook_core::changes::{ChangeFeed, ChangeRecord, ResumeToken};
use dialbook_core::error::DomainError;
use dialbook_core::event::StoredEvent;

use crate::infrastructure;
use crate::pg_event_repository::EventRow;
use crate::schema::{EVENT_COLUMNS, EVENTS_TABLE};

/// Polled change feed over `domain_events`.
///
/// The `position` column is the resume token. Appends serialize on an
/// advisory lock, so a position is never committed after a higher one.
#[derive(Debug, Clone)]
pub struct PgChangeFeed {
    pool: PgPool,
}

impl PgChangeFeed {
    /// Creates a new `PgChangeFeed`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn head(&self) -> Result<Option<ResumeToken>, DomainError> {
        let (position,): (Option<i64>,) =
            sqlx::query_as(&format!("SELECT MAX(position) FROM {EVENTS_TABLE}"))
                .fetch_one(&self.pool)
                .await
                .map_err(infrastructure)?;
        Ok(position.map(ResumeToken::new))
    }

    async fn read_after(
        &self,
        after: Option<ResumeToken>,
        limit: usize,
    ) -> Result<Vec<ChangeRecord>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM {EVENTS_TABLE} \
             WHERE position > $1 ORDER BY position ASC LIMIT $2"
        ))
        .bind(after.map_or(0, ResumeToken::position))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        rows.into_iter()
            .map(|row| {
                let event = StoredEvent::try_from(row)?;
                let full_document = serde_json::to_value(&event)
                    .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
                Ok(ChangeRecord {
                    resume_token: ResumeToken::new(event.position),
                    full_document,
                })
            })
            .collect()
    }
}
