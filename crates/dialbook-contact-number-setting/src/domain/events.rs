//! Domain events for the Contact Number Setting aggregate.

use dialbook_core::aggregate::unsupported_event;
use dialbook_core::command::AggregateEvent;
use dialbook_core::error::DomainError;
use dialbook_core::event::{EventType, StoredEvent};
use serde::{Deserialize, Serialize};

/// Emitted when a contact number type is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactNumberTypeAdded {
    /// The contact number type identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display order.
    pub order: i32,
}

/// Emitted when a contact number type is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactNumberTypeEnabled {
    /// The contact number type identifier.
    #[serde(rename = "_id")]
    pub id: String,
}

/// Emitted when a contact number type is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactNumberTypeDisabled {
    /// The contact number type identifier.
    #[serde(rename = "_id")]
    pub id: String,
}

/// Emitted when a contact number type's name and/or order changes. Absent
/// fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactNumberTypeUpdated {
    /// The contact number type identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New display order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

/// Every event the contact number setting aggregate folds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContactNumberSettingEvent {
    /// A contact number type has been created.
    Added(ContactNumberTypeAdded),
    /// A contact number type has been enabled.
    Enabled(ContactNumberTypeEnabled),
    /// A contact number type has been disabled.
    Disabled(ContactNumberTypeDisabled),
    /// A contact number type has been updated.
    Updated(ContactNumberTypeUpdated),
}

impl ContactNumberSettingEvent {
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
            EventType::ContactNumberTypeAdded => Ok(Self::Added(event.decode_data()?)),
            EventType::ContactNumberTypeEnabled => Ok(Self::Enabled(event.decode_data()?)),
            EventType::ContactNumberTypeDisabled => Ok(Self::Disabled(event.decode_data()?)),
            EventType::ContactNumberTypeUpdated => Ok(Self::Updated(event.decode_data()?)),
            EventType::ClientContactNumberAdded | EventType::ClientContactNumberRemoved => {
                Err(unsupported_event(handler, event_type))
            }
        }
    }
}

impl AggregateEvent for ContactNumberSettingEvent {
    fn event_type(&self) -> EventType {
        match self {
            Self::Added(_) => EventType::ContactNumberTypeAdded,
            Self::Enabled(_) => EventType::ContactNumberTypeEnabled,
            Self::Disabled(_) => EventType::ContactNumberTypeDisabled,
            Self::Updated(_) => EventType::ContactNumberTypeUpdated,
        }
    }
}
