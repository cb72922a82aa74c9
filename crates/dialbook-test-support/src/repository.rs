//! Test repositories — mock `EventRepository` implementations for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dialbook_core::aggregate::AggregateId;
use dialbook_core::changes::{ChangeFeed, ChangeRecord, ResumeToken};
use dialbook_core::clock::Clock;
use dialbook_core::error::DomainError;
use dialbook_core::event::{NewEvent, StoredEvent};
use dialbook_core::repository::EventRepository;

use crate::clock::FixedClock;

/// A fully working event log kept in memory.
///
/// Enforces uniqueness of `(aggregate_id, sequence_id)` like the
/// `PostgreSQL` schema does, assigns gapless global positions starting at 1
/// and doubles as the change feed over those positions.
pub struct InMemoryEventRepository {
    events: Mutex<Vec<StoredEvent>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for InMemoryEventRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventRepository")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryEventRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventRepository {
    /// Creates an empty log stamping events with [`FixedClock::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(FixedClock::default()))
    }

    /// Creates an empty log stamping events with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            clock,
        }
    }

    /// Returns a snapshot of the whole log in append order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn all_events(&self) -> Vec<StoredEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns the number of events in the log.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Returns `true` if nothing was appended yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn save(&self, events: &[NewEvent]) -> Result<Vec<StoredEvent>, DomainError> {
        let mut log = self.events.lock().unwrap();

        for (i, event) in events.iter().enumerate() {
            let taken_in_log = log.iter().any(|stored| {
                stored.aggregate_id == event.aggregate_id
                    && stored.sequence_id == event.sequence_id
            });
            let taken_in_batch = events[..i].iter().any(|earlier| {
                earlier.aggregate_id == event.aggregate_id
                    && earlier.sequence_id == event.sequence_id
            });
            if taken_in_log || taken_in_batch {
                return Err(DomainError::ConcurrencyConflict {
                    aggregate_id: event.aggregate_id.to_string(),
                    sequence_id: event.sequence_id,
                });
            }
        }

        let created_at = self.clock.now();
        let mut position = i64::try_from(log.len()).unwrap_or(i64::MAX);
        let mut stored = Vec::with_capacity(events.len());
        for event in events {
            position += 1;
            stored.push(StoredEvent::from_new(event.clone(), position, created_at));
        }
        log.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn load_events(
        &self,
        aggregate_id: &AggregateId,
        upper_sequence_id: Option<i64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let mut events: Vec<StoredEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| &event.aggregate_id == aggregate_id)
            .filter(|event| upper_sequence_id.is_none_or(|upper| event.sequence_id <= upper))
            .cloned()
            .collect();
        events.sort_by_key(|event| event.sequence_id);
        Ok(events)
    }
}

#[async_trait]
impl ChangeFeed for InMemoryEventRepository {
    async fn head(&self) -> Result<Option<ResumeToken>, DomainError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .last()
            .map(|event| ResumeToken::new(event.position)))
    }

    async fn read_after(
        &self,
        after: Option<ResumeToken>,
        limit: usize,
    ) -> Result<Vec<ChangeRecord>, DomainError> {
        let after = after.map_or(0, ResumeToken::position);
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.position > after)
            .take(limit)
            .map(|event| {
                let full_document = serde_json::to_value(event)
                    .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
                Ok(ChangeRecord {
                    resume_token: ResumeToken::new(event.position),
                    full_document,
                })
            })
            .collect()
    }
}

/// An event repository that records every `save` call and returns the
/// configured events from every `load_events` call.
#[derive(Debug)]
pub struct RecordingEventRepository {
    load_result: Vec<StoredEvent>,
    saved: Mutex<Vec<Vec<NewEvent>>>,
}

impl RecordingEventRepository {
    /// Creates a recording repository that will return `load_result` from
    /// every `load_events` call, regardless of the aggregate asked for.
    #[must_use]
    pub fn new(load_result: Vec<StoredEvent>) -> Self {
        Self {
            load_result,
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of every batch passed to `save`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saved_batches(&self) -> Vec<Vec<NewEvent>> {
        self.saved.lock().unwrap().clone()
    }

    /// Returns every saved event, flattened across batches.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saved_events(&self) -> Vec<NewEvent> {
        self.saved.lock().unwrap().iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn save(&self, events: &[NewEvent]) -> Result<Vec<StoredEvent>, DomainError> {
        self.saved.lock().unwrap().push(events.to_vec());
        let created_at = FixedClock::default().now();
        Ok(events
            .iter()
            .zip(1..)
            .map(|(event, position)| StoredEvent::from_new(event.clone(), position, created_at))
            .collect())
    }

    async fn load_events(
        &self,
        _aggregate_id: &AggregateId,
        upper_sequence_id: Option<i64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .load_result
            .iter()
            .filter(|event| upper_sequence_id.is_none_or(|upper| event.sequence_id <= upper))
            .cloned()
            .collect())
    }
}

/// An event repository that always returns an empty event list and silently
/// accepts saves. Useful for testing "aggregate not found" scenarios and
/// creation commands.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn save(&self, events: &[NewEvent]) -> Result<Vec<StoredEvent>, DomainError> {
        let created_at = FixedClock::default().now();
        Ok(events
            .iter()
            .zip(1..)
            .map(|(event, position)| StoredEvent::from_new(event.clone(), position, created_at))
            .collect())
    }

    async fn load_events(
        &self,
        _aggregate_id: &AggregateId,
        _upper_sequence_id: Option<i64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }
}

/// An event repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn save(&self, _events: &[NewEvent]) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load_events(
        &self,
        _aggregate_id: &AggregateId,
        _upper_sequence_id: Option<i64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

#[cfg(test)]
mod tests {
    use dialbook_core::event::{EventMetaData, EventType};

    use super::*;

    fn new_event(aggregate_id: AggregateId, sequence_id: i64) -> NewEvent {
        NewEvent::new(
            EventType::ContactNumberTypeAdded,
            aggregate_id,
            &serde_json::json!({"_id": format!("t{sequence_id}")}),
            sequence_id,
            EventMetaData::system(),
            "corr-1",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_assigns_gapless_positions_across_aggregates() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let setting = AggregateId::contact_number_setting();
        let client = AggregateId::client_contact_number("c1");

        // Act
        repo.save(&[new_event(setting.clone(), 1), new_event(setting, 2)])
            .await
            .unwrap();
        let stored = repo.save(&[new_event(client, 1)]).await.unwrap();

        // Assert
        assert_eq!(stored[0].position, 3);
        assert_eq!(repo.head().await.unwrap(), Some(ResumeToken::new(3)));
    }

    #[tokio::test]
    async fn test_duplicate_sequence_id_is_a_concurrency_conflict() {
        let repo = InMemoryEventRepository::new();
        let setting = AggregateId::contact_number_setting();
        repo.save(&[new_event(setting.clone(), 1)]).await.unwrap();

        let result = repo
            .save(&[new_event(setting.clone(), 2), new_event(setting, 1)])
            .await;

        assert!(matches!(
            result,
            Err(DomainError::ConcurrencyConflict { sequence_id: 1, .. })
        ));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_load_events_filters_by_aggregate_and_upper_bound() {
        let repo = InMemoryEventRepository::new();
        let setting = AggregateId::contact_number_setting();
        repo.save(&[
            new_event(setting.clone(), 1),
            new_event(AggregateId::client_contact_number("c1"), 1),
            new_event(setting.clone(), 2),
            new_event(setting.clone(), 3),
        ])
        .await
        .unwrap();

        let capped = repo.load_events(&setting, Some(2)).await.unwrap();

        assert_eq!(
            capped.iter().map(|e| e.sequence_id).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn test_read_after_pages_through_the_feed() {
        let repo = InMemoryEventRepository::new();
        let setting = AggregateId::contact_number_setting();
        repo.save(&[
            new_event(setting.clone(), 1),
            new_event(setting.clone(), 2),
            new_event(setting, 3),
        ])
        .await
        .unwrap();

        let first = repo.read_after(None, 2).await.unwrap();
        let rest = repo
            .read_after(Some(first[1].resume_token), 10)
            .await
            .unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].resume_token, ResumeToken::new(3));
        assert_eq!(rest[0].full_document["type"], "ContactNumberTypeAdded");
        assert_eq!(rest[0].full_document["sequence_id"], 3);
    }
}
