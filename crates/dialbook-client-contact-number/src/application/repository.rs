//! Loads client contact number aggregates and appends their events.

use std::sync::Arc;

use dialbook_contact_number_setting::application::repository::ContactNumberSettingRepository;
use dialbook_core::aggregate::AggregateId;
use dialbook_core::error::DomainError;
use dialbook_core::event::{NewEvent, StoredEvent};
use dialbook_core::repository::{EventRepository, left_fold_events};

use crate::domain::aggregates::ClientContactNumberAggregate;
use crate::domain::write_projection::ClientContactNumberWriteProjectionHandler;

/// Aggregate retrieval and event persistence for client contact numbers.
///
/// Holds a shared, non-owning handle on the contact number setting
/// repository for the add invariants.
#[derive(Clone)]
pub struct ClientContactNumberRepository {
    events: Arc<dyn EventRepository>,
    handler: ClientContactNumberWriteProjectionHandler,
    settings: Arc<ContactNumberSettingRepository>,
}

impl std::fmt::Debug for ClientContactNumberRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContactNumberRepository")
            .finish_non_exhaustive()
    }
}

impl ClientContactNumberRepository {
    /// Creates a repository over the shared event log.
    #[must_use]
    pub fn new(
        events: Arc<dyn EventRepository>,
        settings: Arc<ContactNumberSettingRepository>,
    ) -> Self {
        Self {
            events,
            handler: ClientContactNumberWriteProjectionHandler,
            settings,
        }
    }

    /// Rebuilds the aggregate of `client_id`, as of `upper_sequence_id` when
    /// given.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if loading or folding the events fails.
    pub async fn get_aggregate(
        &self,
        client_id: &str,
        upper_sequence_id: Option<i64>,
    ) -> Result<ClientContactNumberAggregate, DomainError> {
        let id = AggregateId::client_contact_number(client_id);
        let record =
            left_fold_events(self.events.as_ref(), &self.handler, &id, upper_sequence_id).await?;
        Ok(ClientContactNumberAggregate::new(
            id,
            record,
            Arc::clone(&self.settings),
        ))
    }

    /// Appends client contact number events.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the append fails.
    pub async fn save(&self, events: &[NewEvent]) -> Result<Vec<StoredEvent>, DomainError> {
        self.events.save(events).await
    }
}
