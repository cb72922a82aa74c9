//! Reducer that folds client contact number events into aggregate state.

use dialbook_core::aggregate::WriteProjection;
use dialbook_core::error::DomainError;
use dialbook_core::event::{EventType, StoredEvent};

use crate::domain::aggregates::{
    ClientContactNumber, ClientContactNumberRecord, ClientContactNumberStatus,
};
use crate::domain::events::ClientContactNumberEvent;

/// Builds the current [`ClientContactNumberRecord`] from its events.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientContactNumberWriteProjectionHandler;

impl ClientContactNumberWriteProjectionHandler {
    const NAME: &'static str = "ClientContactNumberWriteProjectionHandler";
}

impl WriteProjection for ClientContactNumberWriteProjectionHandler {
    type State = ClientContactNumberRecord;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute(
        &self,
        event_type: EventType,
        prior: ClientContactNumberRecord,
        event: &StoredEvent,
    ) -> Result<ClientContactNumberRecord, DomainError> {
        let mut next = prior;
        match ClientContactNumberEvent::decode(Self::NAME, event_type, event)? {
            ClientContactNumberEvent::Added(data) => {
                next.contact_numbers.push(ClientContactNumber {
                    id: data.id,
                    type_id: data.type_id,
                    contact_number: data.contact_number,
                    status: None,
                });
            }
            ClientContactNumberEvent::Removed(data) => {
                // Removal of an unknown id leaves the state untouched.
                if let Some(item) = next.contact_numbers.iter_mut().find(|n| n.id == data.id) {
                    item.status = Some(ClientContactNumberStatus::Removed);
                }
            }
        }
        next.last_sequence_id = event.sequence_id;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use dialbook_core::aggregate::{AggregateId, fold_events};
    use dialbook_core::event::EventMetaData;
    use dialbook_test_support::fixed_time;

    use super::*;

    fn stored(event_type: EventType, data: serde_json::Value, sequence_id: i64) -> StoredEvent {
        StoredEvent {
            event_type,
            aggregate_id: AggregateId::client_contact_number("c1"),
            data,
            sequence_id,
            meta_data: EventMetaData::system(),
            correlation_id: "corr-1".into(),
            created_at: fixed_time(),
            position: sequence_id,
        }
    }

    fn added(id: &str, sequence_id: i64) -> StoredEvent {
        stored(
            EventType::ClientContactNumberAdded,
            serde_json::json!({
                "_id": id,
                "client_id": "c1",
                "type_id": "t1",
                "contact_number": "07700900123"
            }),
            sequence_id,
        )
    }

    #[test]
    fn test_removed_marks_status_and_keeps_history() {
        let events = vec![
            added("n1", 1),
            stored(
                EventType::ClientContactNumberRemoved,
                serde_json::json!({"_id": "n1"}),
                2,
            ),
        ];

        let state = fold_events(&ClientContactNumberWriteProjectionHandler, &events).unwrap();

        assert_eq!(state.contact_numbers.len(), 1);
        assert_eq!(
            state.contact_numbers[0].status,
            Some(ClientContactNumberStatus::Removed)
        );
        assert_eq!(state.last_sequence_id, 2);
    }

    #[test]
    fn test_removed_of_unknown_id_changes_nothing_but_sequence() {
        let events = vec![
            added("n1", 1),
            stored(
                EventType::ClientContactNumberRemoved,
                serde_json::json!({"_id": "n9"}),
                2,
            ),
        ];

        let state = fold_events(&ClientContactNumberWriteProjectionHandler, &events).unwrap();

        assert_eq!(state.contact_numbers[0].status, None);
        assert_eq!(state.last_sequence_id, 2);
    }

    #[test]
    fn test_setting_events_are_unsupported() {
        let event = stored(
            EventType::ContactNumberTypeEnabled,
            serde_json::json!({"_id": "t1"}),
            1,
        );

        let result = fold_events(&ClientContactNumberWriteProjectionHandler, &[event]);

        assert!(matches!(result, Err(DomainError::UnsupportedEvent { .. })));
    }
}
