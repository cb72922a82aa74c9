//! Loads the contact number setting aggregate and appends its events.

use std::sync::Arc;

use dialbook_core::aggregate::AggregateId;
use dialbook_core::error::DomainError;
use dialbook_core::event::{NewEvent, StoredEvent};
use dialbook_core::repository::{EventRepository, left_fold_events};

use crate::domain::aggregates::ContactNumberSettingAggregate;
use crate::domain::write_projection::ContactNumberSettingWriteProjectionHandler;

/// Aggregate retrieval and event persistence for the contact number setting.
#[derive(Clone)]
pub struct ContactNumberSettingRepository {
    events: Arc<dyn EventRepository>,
    handler: ContactNumberSettingWriteProjectionHandler,
}

impl std::fmt::Debug for ContactNumberSettingRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactNumberSettingRepository")
            .finish_non_exhaustive()
    }
}

impl ContactNumberSettingRepository {
    /// Creates a repository over the shared event log.
    #[must_use]
    pub fn new(events: Arc<dyn EventRepository>) -> Self {
        Self {
            events,
            handler: ContactNumberSettingWriteProjectionHandler,
        }
    }

    /// Rebuilds the aggregate, as of `upper_sequence_id` when given.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if loading or folding the events fails.
    pub async fn get_aggregate(
        &self,
        upper_sequence_id: Option<i64>,
    ) -> Result<ContactNumberSettingAggregate, DomainError> {
        let id = AggregateId::contact_number_setting();
        let record =
            left_fold_events(self.events.as_ref(), &self.handler, &id, upper_sequence_id).await?;
        Ok(ContactNumberSettingAggregate::new(id, record))
    }

    /// Appends contact number setting events.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the append fails.
    pub async fn save(&self, events: &[NewEvent]) -> Result<Vec<StoredEvent>, DomainError> {
        self.events.save(events).await
    }
}
