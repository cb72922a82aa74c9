//! Domain error types.

use serde::Serialize;
use thiserror::Error;

/// A single invariant violation inside a [`ValidationError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Machine-readable error code, e.g. `DUPLICATE_NAME`.
    pub code: String,
    /// Human-readable description of the violation.
    pub message: String,
    /// Path of the offending field.
    pub path: Vec<String>,
}

/// A batch of invariant violations reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Summary message for the whole batch.
    pub message: String,
    /// The individual violations.
    pub errors: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Builds a validation error carrying exactly one issue.
    #[must_use]
    pub fn single(
        message: impl Into<String>,
        code: impl Into<String>,
        issue_message: impl Into<String>,
        path: &[&str],
    ) -> Self {
        Self {
            message: message.into(),
            errors: vec![ValidationIssue {
                code: code.into(),
                message: issue_message.into(),
                path: path.iter().map(|segment| (*segment).to_owned()).collect(),
            }],
        }
    }

    /// Returns `true` if any issue in the batch carries `code`.
    #[must_use]
    pub fn has_code(&self, code: &str) -> bool {
        self.errors.iter().any(|issue| issue.code == code)
    }
}

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate invariant was violated by the command.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced aggregate or aggregate item does not exist.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// Another writer already appended this sequence id for the aggregate.
    #[error("concurrency conflict on {aggregate_id}: sequence id {sequence_id} already exists")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: String,
        /// The sequence id that was taken.
        sequence_id: i64,
    },

    /// A write projection handler received an event type it does not fold.
    #[error("event not supported by {handler}: {event_type}")]
    UnsupportedEvent {
        /// The reducer that rejected the event.
        handler: &'static str,
        /// The rejected event type.
        event_type: String,
    },

    /// No handler is registered on the command bus for this command type.
    #[error("command type:{0} is not supported")]
    UnsupportedCommand(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns the validation error if this is a [`DomainError::Validation`].
    #[must_use]
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_builds_one_issue_with_path() {
        let err = ValidationError::single(
            "Not allowed contact number type name",
            "DUPLICATE_NAME",
            "name 'mobile' already exists. we do not allow duplicates.",
            &["name"],
        );

        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].path, vec!["name".to_owned()]);
        assert!(err.has_code("DUPLICATE_NAME"));
        assert!(!err.has_code("RESOURCE_NOT_FOUND"));
    }

    #[test]
    fn test_as_validation_only_matches_validation_variant() {
        let validation: DomainError =
            ValidationError::single("bad", "EMPTY_BODY", "empty", &["body"]).into();
        let missing = DomainError::ResourceNotFound("x".into());

        assert!(validation.as_validation().is_some());
        assert!(missing.as_validation().is_none());
    }
}
