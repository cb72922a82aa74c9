//! Event record types shared by every aggregate and every projection.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateId;
use crate::error::DomainError;

/// Every event type that may appear in the shared event log.
///
/// The wire name of each variant is its identifier, e.g.
/// `ContactNumberTypeAdded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// A contact number type was created.
    ContactNumberTypeAdded,
    /// A contact number type was enabled.
    ContactNumberTypeEnabled,
    /// A contact number type was disabled.
    ContactNumberTypeDisabled,
    /// A contact number type's name and/or order changed.
    ContactNumberTypeUpdated,
    /// A contact number was added to a client.
    ClientContactNumberAdded,
    /// A client contact number was removed.
    ClientContactNumberRemoved,
}

impl EventType {
    /// Returns the wire name of the event type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContactNumberTypeAdded => "ContactNumberTypeAdded",
            Self::ContactNumberTypeEnabled => "ContactNumberTypeEnabled",
            Self::ContactNumberTypeDisabled => "ContactNumberTypeDisabled",
            Self::ContactNumberTypeUpdated => "ContactNumberTypeUpdated",
            Self::ClientContactNumberAdded => "ClientContactNumberAdded",
            Self::ClientContactNumberRemoved => "ClientContactNumberRemoved",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ContactNumberTypeAdded" => Ok(Self::ContactNumberTypeAdded),
            "ContactNumberTypeEnabled" => Ok(Self::ContactNumberTypeEnabled),
            "ContactNumberTypeDisabled" => Ok(Self::ContactNumberTypeDisabled),
            "ContactNumberTypeUpdated" => Ok(Self::ContactNumberTypeUpdated),
            "ClientContactNumberAdded" => Ok(Self::ClientContactNumberAdded),
            "ClientContactNumberRemoved" => Ok(Self::ClientContactNumberRemoved),
            other => Err(DomainError::Infrastructure(format!(
                "unknown event type in event store: {other}"
            ))),
        }
    }
}

/// The context an event was produced in (audit only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    /// Context type, e.g. `agency`.
    #[serde(rename = "type")]
    pub context_type: String,
    /// Context identifier, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Audit metadata attached to every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetaData {
    /// Acting user id, or `system` for system generated events.
    pub user_id: String,
    /// OAuth client id of the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Caller context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EventContext>,
}

impl EventMetaData {
    /// Metadata for events produced without a calling user.
    #[must_use]
    pub fn system() -> Self {
        Self {
            user_id: "system".to_owned(),
            client_id: None,
            context: None,
        }
    }
}

/// An event built by a command handler, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Aggregate this event belongs to.
    pub aggregate_id: AggregateId,
    /// Event specific payload.
    pub data: serde_json::Value,
    /// Position of the event inside its aggregate, starting at 1.
    pub sequence_id: i64,
    /// Audit metadata.
    pub meta_data: EventMetaData,
    /// Request/process correlator.
    pub correlation_id: String,
}

impl NewEvent {
    /// Builds a new event, serializing `data` into the payload.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if `data` cannot be serialized.
    pub fn new<D: Serialize>(
        event_type: EventType,
        aggregate_id: AggregateId,
        data: &D,
        sequence_id: i64,
        meta_data: EventMetaData,
        correlation_id: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let data = serde_json::to_value(data)
            .map_err(|e| DomainError::Infrastructure(format!("event serialization failed: {e}")))?;
        Ok(Self {
            event_type,
            aggregate_id,
            data,
            sequence_id,
            meta_data,
            correlation_id: correlation_id.into(),
        })
    }
}

/// A persisted, immutable event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Aggregate this event belongs to.
    pub aggregate_id: AggregateId,
    /// Event specific payload.
    pub data: serde_json::Value,
    /// Position of the event inside its aggregate.
    pub sequence_id: i64,
    /// Audit metadata.
    pub meta_data: EventMetaData,
    /// Request/process correlator.
    pub correlation_id: String,
    /// Server timestamp of the append.
    pub created_at: DateTime<Utc>,
    /// Global append position in the event log.
    pub position: i64,
}

impl StoredEvent {
    /// Builds the stored form of `event` once the store assigned it a
    /// position and timestamp.
    #[must_use]
    pub fn from_new(event: NewEvent, position: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            event_type: event.event_type,
            aggregate_id: event.aggregate_id,
            data: event.data,
            sequence_id: event.sequence_id,
            meta_data: event.meta_data,
            correlation_id: event.correlation_id,
            created_at,
            position,
        }
    }

    /// Deserializes the payload into the event specific data type.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload does not match `T`.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            DomainError::Infrastructure(format!(
                "event deserialization failed for {} #{}: {e}",
                self.event_type, self.sequence_id
            ))
        })
    }
}
