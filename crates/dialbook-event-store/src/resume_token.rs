//! `PostgreSQL` resume token store.

use async_trait::async_trait;
use sqlx::PgPool;

use dialbook_core::changes::{ResumeToken, ResumeTokenRepository, StreamKind};
use dialbook_core::error::DomainError;

use crate::infrastructure;
use crate::schema::STREAM_TRACKER_TABLE;

/// Resume tokens persisted in `stream_tracker`, one row per pipeline and
/// stream kind.
#[derive(Debug, Clone)]
pub struct PgResumeTokenRepository {
    pool: PgPool,
}

impl PgResumeTokenRepository {
    /// Creates a new `PgResumeTokenRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeTokenRepository for PgResumeTokenRepository {
    async fn load(
        &self,
        pipeline_id: &str,
        stream_kind: StreamKind,
    ) -> Result<Option<ResumeToken>, DomainError> {
        let row: Option<(i64,)> = sqlx::query_as(&format!(
            "SELECT resume_token FROM {STREAM_TRACKER_TABLE} \
             WHERE pipeline_id = $1 AND stream_kind = $2"
        ))
        .bind(pipeline_id)
        .bind(stream_kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(row.map(|(token,)| ResumeToken::new(token)))
    }

    async fn store(
        &self,
        pipeline_id: &str,
        stream_kind: StreamKind,
        token: ResumeToken,
    ) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO {STREAM_TRACKER_TABLE} \
             (pipeline_id, stream_kind, resume_token, updated_at) \
             VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (pipeline_id, stream_kind) \
             DO UPDATE SET resume_token = EXCLUDED.resume_token, updated_at = EXCLUDED.updated_at"
        ))
        .bind(pipeline_id)
        .bind(stream_kind.as_str())
        .bind(token.position())
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(())
    }
}
