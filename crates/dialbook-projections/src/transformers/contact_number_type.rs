use std::sync::Arc;

use async_trait::async_trait;
use dialbook_contact_number_setting::domain::aggregates::ContactNumberTypeStatus;
use dialbook_contact_number_setting::domain::events::ContactNumberSettingEvent;
use dialbook_core::event::{EventType, StoredEvent};

use super::{ProjectionTransformer, already_applied};
use crate::error::ProjectionError;
use crate::read_model::{ContactNumberTypeProjectionStore, NewContactNumberTypeView};

/// Keeps the contact number type read model in line with the contact number
/// setting aggregate.
#[derive(Clone)]
pub struct ContactNumberTypeProjectionTransformer {
    store: Arc<dyn ContactNumberTypeProjectionStore>,
}

impl std::fmt::Debug for ContactNumberTypeProjectionTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactNumberTypeProjectionTransformer")
            .finish_non_exhaustive()
    }
}

impl ContactNumberTypeProjectionTransformer {
    const NAME: &'static str = "ContactNumberTypeProjectionTransformer";

    /// Creates the transformer.
    #[must_use]
    pub fn new(store: Arc<dyn ContactNumberTypeProjectionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProjectionTransformer for ContactNumberTypeProjectionTransformer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supports(&self, event_type: EventType) -> bool {
        matches!(
            event_type,
            EventType::ContactNumberTypeAdded
                | EventType::ContactNumberTypeEnabled
                | EventType::ContactNumberTypeDisabled
                | EventType::ContactNumberTypeUpdated
        )
    }

    async fn apply(&self, event: &StoredEvent) -> Result<(), ProjectionError> {
        match ContactNumberSettingEvent::decode(Self::NAME, event.event_type, event)? {
            ContactNumberSettingEvent::Added(data) => {
                let inserted = self
                    .store
                    .insert(NewContactNumberTypeView {
                        id: data.id,
                        name: data.name,
                        order: data.order,
                    })
                    .await;
                already_applied(inserted, Self::NAME, event)
            }
            ContactNumberSettingEvent::Enabled(data) => {
                self.store
                    .set_status(&data.id, ContactNumberTypeStatus::Enabled)
                    .await?;
                Ok(())
            }
            ContactNumberSettingEvent::Disabled(data) => {
                self.store
                    .set_status(&data.id, ContactNumberTypeStatus::Disabled)
                    .await?;
                Ok(())
            }
            ContactNumberSettingEvent::Updated(data) => {
                self.store
                    .update(&data.id, data.name.as_deref(), data.order)
                    .await?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use dialbook_core::aggregate::AggregateId;
    use dialbook_core::event::EventMetaData;
    use dialbook_test_support::fixed_time;
    use serde_json::json;

    use super::*;
    use crate::memory::InMemoryContactNumberTypeStore;

    fn event(event_type: EventType, data: serde_json::Value, sequence_id: i64) -> StoredEvent {
        StoredEvent {
            event_type,
            aggregate_id: AggregateId::contact_number_setting(),
            data,
            sequence_id,
            meta_data: EventMetaData::system(),
            correlation_id: "corr".into(),
            created_at: fixed_time(),
            position: sequence_id,
        }
    }

    fn added() -> StoredEvent {
        event(
            EventType::ContactNumberTypeAdded,
            json!({"_id": "t1", "name": "Mobile", "order": 2}),
            1,
        )
    }

    fn setup() -> (
        ContactNumberTypeProjectionTransformer,
        Arc<InMemoryContactNumberTypeStore>,
    ) {
        let store = Arc::new(InMemoryContactNumberTypeStore::new());
        (
            ContactNumberTypeProjectionTransformer::new(store.clone()),
            store,
        )
    }

    #[tokio::test]
    async fn test_replayed_added_event_leaves_one_record() {
        // Arrange
        let (transformer, store) = setup();
        transformer.apply(&added()).await.unwrap();

        // Act
        let replay = transformer.apply(&added()).await;

        // Assert
        assert!(replay.is_ok());
        let page = store.list(crate::read_model::ListQuery::default()).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.data[0].order, 2);
    }

    #[tokio::test]
    async fn test_status_and_update_events_bump_revision() {
        let (transformer, store) = setup();
        transformer.apply(&added()).await.unwrap();

        transformer
            .apply(&event(EventType::ContactNumberTypeEnabled, json!({"_id": "t1"}), 2))
            .await
            .unwrap();
        transformer
            .apply(&event(
                EventType::ContactNumberTypeUpdated,
                json!({"_id": "t1", "name": "Cell"}),
                3,
            ))
            .await
            .unwrap();

        let row = store.find("t1").await.unwrap().unwrap();
        assert_eq!(row.status, Some(ContactNumberTypeStatus::Enabled));
        assert_eq!(row.name, "Cell");
        assert_eq!(row.order, 2);
        assert_eq!(row.revision, 2);
    }

    #[tokio::test]
    async fn test_update_of_unknown_type_is_not_an_error() {
        let (transformer, store) = setup();

        let result = transformer
            .apply(&event(
                EventType::ContactNumberTypeDisabled,
                json!({"_id": "missing"}),
                1,
            ))
            .await;

        assert!(result.is_ok());
        assert!(store.find("missing").await.unwrap().is_none());
    }

    #[test]
    fn test_client_events_are_not_supported() {
        let (transformer, _) = setup();

        assert!(!transformer.supports(EventType::ClientContactNumberAdded));
        assert!(transformer.supports(EventType::ContactNumberTypeUpdated));
    }
}
