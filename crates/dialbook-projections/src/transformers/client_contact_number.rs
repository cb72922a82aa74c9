use std::sync::Arc;

use async_trait::async_trait;
use dialbook_client_contact_number::domain::events::ClientContactNumberEvent;
use dialbook_contact_number_setting::application::repository::ContactNumberSettingRepository;
use dialbook_contact_number_setting::domain::events::ContactNumberSettingEvent;
use dialbook_core::event::{EventType, StoredEvent};

use super::{ProjectionTransformer, already_applied};
use crate::error::ProjectionError;
use crate::read_model::{ClientContactNumberProjectionStore, NewClientContactNumberView};

/// Keeps the client contact number read model in line with the client
/// contact number aggregates.
///
/// Rows copy the name and order of their contact number type when inserted.
/// `ContactNumberTypeUpdated` rewrites those copies on every row of the
/// type.
#[derive(Clone)]
pub struct ClientContactNumberProjectionTransformer {
    store: Arc<dyn ClientContactNumberProjectionStore>,
    settings: Arc<ContactNumberSettingRepository>,
}

impl std::fmt::Debug for ClientContactNumberProjectionTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContactNumberProjectionTransformer")
            .finish_non_exhaustive()
    }
}

impl ClientContactNumberProjectionTransformer {
    const NAME: &'static str = "ClientContactNumberProjectionTransformer";

    /// Creates the transformer; `settings` resolves type names and orders.
    #[must_use]
    pub fn new(
        store: Arc<dyn ClientContactNumberProjectionStore>,
        settings: Arc<ContactNumberSettingRepository>,
    ) -> Self {
        Self { store, settings }
    }

    async fn apply_client_event(&self, event: &StoredEvent) -> Result<(), ProjectionError> {
        match ClientContactNumberEvent::decode(Self::NAME, event.event_type, event)? {
            ClientContactNumberEvent::Added(data) => {
                let setting = self.settings.get_aggregate(None).await?;
                let contact_type = setting.get_contact_number_type(&data.type_id);
                if contact_type.is_none() {
                    tracing::warn!(
                        type_id = %data.type_id,
                        id = %data.id,
                        "contact number type missing, projecting without name"
                    );
                }
                let inserted = self
                    .store
                    .insert(NewClientContactNumberView {
                        type_name: contact_type.map(|t| t.name.clone()),
                        type_order: contact_type.map(|t| t.order),
                        id: data.id,
                        client_id: data.client_id,
                        type_id: data.type_id,
                        contact_number: data.contact_number,
                    })
                    .await;
                already_applied(inserted, Self::NAME, event)
            }
            ClientContactNumberEvent::Removed(data) => {
                self.store.delete(&data.id).await?;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ProjectionTransformer for ClientContactNumberProjectionTransformer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supports(&self, event_type: EventType) -> bool {
        matches!(
            event_type,
            EventType::ClientContactNumberAdded
                | EventType::ClientContactNumberRemoved
                | EventType::ContactNumberTypeUpdated
        )
    }

    async fn apply(&self, event: &StoredEvent) -> Result<(), ProjectionError> {
        if event.event_type != EventType::ContactNumberTypeUpdated {
            return self.apply_client_event(event).await;
        }
        let ContactNumberSettingEvent::Updated(data) =
            ContactNumberSettingEvent::decode(Self::NAME, event.event_type, event)?
        else {
            return Ok(());
        };
        let changed = self
            .store
            .update_by_type_id(&data.id, data.name.as_deref(), data.order)
            .await?;
        tracing::debug!(type_id = %data.id, changed, "denormalized contact number type updated");
        Ok(())
    }
}
