//! Event repository abstraction and the left-fold reconstruction engine.

use async_trait::async_trait;

use crate::aggregate::{AggregateId, WriteProjection, fold_events};
use crate::error::DomainError;
use crate::event::{NewEvent, StoredEvent};

/// Repository trait for loading and appending events to the shared log.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Appends a batch of events as one write operation.
    ///
    /// Returns the stored events in the order they were given.
    async fn save(&self, events: &[NewEvent]) -> Result<Vec<StoredEvent>, DomainError>;

    /// Loads the events of one aggregate ordered by ascending `sequence_id`,
    /// optionally capped (inclusive) at `upper_sequence_id`.
    async fn load_events(
        &self,
        aggregate_id: &AggregateId,
        upper_sequence_id: Option<i64>,
    ) -> Result<Vec<StoredEvent>, DomainError>;
}

/// Rebuilds the current state of `aggregate_id` by replaying its events
/// through `handler`.
///
/// Passing `upper_sequence_id` yields the state as of that sequence id.
///
/// # Errors
///
/// Returns the repository error if loading fails, or the reducer error for
/// the first event it rejects.
pub async fn left_fold_events<P: WriteProjection + ?Sized>(
    repo: &dyn EventRepository,
    handler: &P,
    aggregate_id: &AggregateId,
    upper_sequence_id: Option<i64>,
) -> Result<P::State, DomainError> {
    let events = repo.load_events(aggregate_id, upper_sequence_id).await?;
    tracing::debug!(
        aggregate_id = %aggregate_id,
        events = events.len(),
        handler = handler.name(),
        "folding aggregate events"
    );
    fold_events(handler, &events)
}
