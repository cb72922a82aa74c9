//! Domain events for the Client Contact Number aggregate.

use dialbook_core::aggregate::unsupported_event;
use dialbook_core::command::AggregateEvent;
use dialbook_core::error::DomainError;
use dialbook_core::event::{EventType, StoredEvent};
use serde::{Deserialize, Serialize};

/// Emitted when a contact number is added to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContactNumberAdded {
    /// The contact number identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning client.
    pub client_id: String,
    /// Referenced contact number type.
    pub type_id: String,
    /// The number itself.
    pub contact_number: String,
}

/// Emitted when a client contact number is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContactNumberRemoved {
    /// The contact number identifier.
    #[serde(rename = "_id")]
    pub id: String,
}

/// Every event the client contact number aggregate folds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ClientContactNumberEvent {
    /// A contact number has been added.
    Added(ClientContactNumberAdded),
    /// A contact number has been removed.
    Removed(ClientContactNumberRemoved),
}

impl ClientContactNumberEvent {
    /// Decodes the payload of `event` according to `event_type`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnsupportedEvent` for event types owned by other
    /// aggregates and `DomainError::Infrastructure` for malformed payloads.
    pub fn decode(
        handler: &'static str,
        event_type: EventType,
        event: &StoredEvent,
    ) -> Result<Self, DomainError> {
        match event_type {
            EventType::ClientContactNumberAdded => Ok(Self::Added(event.decode_data()?)),
            EventType::ClientContactNumberRemoved => Ok(Self::Removed(event.decode_data()?)),
            EventType::ContactNumberTypeAdded
            | EventType::ContactNumberTypeEnabled
            | EventType::ContactNumberTypeDisabled
            | EventType::ContactNumberTypeUpdated => Err(unsupported_event(handler, event_type)),
        }
    }
}

impl AggregateEvent for ClientContactNumberEvent {
    fn event_type(&self) -> EventType {
        match self {
            Self::Added(_) => EventType::ClientContactNumberAdded,
            Self::Removed(_) => EventType::ClientContactNumberRemoved,
        }
    }
}
