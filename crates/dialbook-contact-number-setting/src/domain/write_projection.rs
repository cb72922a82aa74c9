//! Reducer that folds contact number setting events into aggregate state.

use dialbook_core::aggregate::WriteProjection;
use dialbook_core::error::DomainError;
use dialbook_core::event::{EventType, StoredEvent};

use crate::domain::aggregates::{
    ContactNumberSettingRecord, ContactNumberType, ContactNumberTypeStatus,
};
use crate::domain::events::ContactNumberSettingEvent;

/// Builds the current [`ContactNumberSettingRecord`] from its events.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactNumberSettingWriteProjectionHandler;

impl ContactNumberSettingWriteProjectionHandler {
    const NAME: &'static str = "ContactNumberSettingWriteProjectionHandler";
}

impl WriteProjection for ContactNumberSettingWriteProjectionHandler {
    type State = ContactNumberSettingRecord;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute(
        &self,
        event_type: EventType,
        prior: ContactNumberSettingRecord,
        event: &StoredEvent,
    ) -> Result<ContactNumberSettingRecord, DomainError> {
        let mut next = prior;
        match ContactNumberSettingEvent::decode(Self::NAME, event_type, event)? {
            ContactNumberSettingEvent::Added(data) => {
                next.types.push(ContactNumberType {
                    id: data.id,
                    name: data.name,
                    order: data.order,
                    status: None,
                });
            }
            ContactNumberSettingEvent::Enabled(data) => {
                set_status(&mut next, &data.id, ContactNumberTypeStatus::Enabled);
            }
            ContactNumberSettingEvent::Disabled(data) => {
                set_status(&mut next, &data.id, ContactNumberTypeStatus::Disabled);
            }
            ContactNumberSettingEvent::Updated(data) => {
                if let Some(item) = next.types.iter_mut().find(|t| t.id == data.id) {
                    if let Some(name) = data.name {
                        item.name = name;
                    }
                    if let Some(order) = data.order {
                        item.order = order;
                    }
                }
            }
        }
        next.last_sequence_id = event.sequence_id;
        Ok(next)
    }
}

fn set_status(record: &mut ContactNumberSettingRecord, id: &str, status: ContactNumberTypeStatus) {
    if let Some(item) = record.types.iter_mut().find(|t| t.id == id) {
        item.status = Some(status);
    }
}
