//! `PostgreSQL` infrastructure for the dialbook event log.
//!
//! Holds the event repository, the change feed the projection pipelines
//! poll, the resume token store and the per-database connection pools.

pub mod change_feed;
pub mod pg_event_repository;
pub mod pools;
pub mod resume_token;
pub mod schema;

/// Maps a `sqlx` error onto the domain's infrastructure error.
pub(crate) fn infrastructure(err: sqlx::Error) -> dialbook_core::error::DomainError {
    tracing::error!(error = %err, "database operation failed");
    dialbook_core::error::DomainError::Infrastructure(err.to_string())
}
