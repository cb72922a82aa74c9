//! Projection pipeline error types.

use dialbook_core::changes::ResumeToken;
use dialbook_core::error::DomainError;
use dialbook_event_store::pools::PoolError;
use thiserror::Error;

/// Errors raised by read-model stores and pipeline stages.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A read-model insert hit an existing primary key.
    #[error("duplicate key {0} in read model")]
    DuplicateKey(String),

    /// Decoding an event or reading the event log failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A read-model query failed.
    #[error("read model database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Acquiring a database handle failed.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// A change record does not hold a valid event document.
    #[error("malformed change record at {token}: {source}")]
    MalformedRecord {
        /// Feed position of the record.
        token: ResumeToken,
        /// The decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// A stage task panicked or was cancelled.
    #[error("pipeline {pipeline_id} stage {stage} aborted: {message}")]
    StageAborted {
        /// The pipeline the stage belongs to.
        pipeline_id: &'static str,
        /// The stage name.
        stage: &'static str,
        /// The join error.
        message: String,
    },

    /// No pipeline type has this name.
    #[error("unknown pipeline type: {0}")]
    UnknownPipelineType(String),
}

impl ProjectionError {
    /// Maps a `sqlx` error, turning unique violations into
    /// [`ProjectionError::DuplicateKey`] for `key`.
    #[must_use]
    pub fn from_insert(err: sqlx::Error, key: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::DuplicateKey(key.to_owned())
            }
            _ => Self::Database(err),
        }
    }

    /// Returns `true` for [`ProjectionError::DuplicateKey`].
    #[must_use]
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_is_not_a_duplicate() {
        let err = ProjectionError::from_insert(sqlx::Error::RowNotFound, "t1");

        assert!(!err.is_duplicate_key());
        assert!(matches!(err, ProjectionError::Database(_)));
    }

    #[test]
    fn test_duplicate_key_display() {
        let err = ProjectionError::DuplicateKey("t1".into());

        assert!(err.is_duplicate_key());
        assert_eq!(err.to_string(), "duplicate key t1 in read model");
    }
}
