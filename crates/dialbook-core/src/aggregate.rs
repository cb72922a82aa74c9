//! Aggregate identity and the write projection (reducer) abstraction.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::event::{EventType, StoredEvent};

/// Name of the contact number setting aggregate.
pub const CONTACT_NUMBER_SETTING_AGGREGATE: &str = "contact_number_setting";

/// Name of the client contact number aggregate.
pub const CLIENT_CONTACT_NUMBER_AGGREGATE: &str = "client_contact_number";

/// Identifies one aggregate instance inside the shared event log.
///
/// A flat key/value map compared by exact equality, e.g.
/// `{"name": "contact_number_setting"}` or
/// `{"client_id": "c1", "name": "client_contact_number"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(BTreeMap<String, String>);

impl AggregateId {
    /// Builds an aggregate id from key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// The singleton contact number setting aggregate.
    #[must_use]
    pub fn contact_number_setting() -> Self {
        Self::from_pairs([("name", CONTACT_NUMBER_SETTING_AGGREGATE)])
    }

    /// The client contact number aggregate of one client.
    #[must_use]
    pub fn client_contact_number(client_id: &str) -> Self {
        Self::from_pairs([
            ("client_id", client_id),
            ("name", CLIENT_CONTACT_NUMBER_AGGREGATE),
        ])
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns the aggregate id as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("}")
    }
}

/// State produced by folding the events of one aggregate.
pub trait AggregateRecord: Default + Clone + Send + Sync {
    /// Highest sequence id folded into this state (0 when empty).
    fn last_sequence_id(&self) -> i64;
}

/// Pure per-aggregate-type reducer.
///
/// `execute` must not perform I/O and must return a state reflecting exactly
/// the effect of `event_type`. Event types the reducer does not fold are
/// rejected with [`DomainError::UnsupportedEvent`].
pub trait WriteProjection: Send + Sync {
    /// The state this reducer builds.
    type State: AggregateRecord;

    /// Reducer name used in error reports.
    fn name(&self) -> &'static str;

    /// Applies one event to `prior` and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnsupportedEvent` for foreign event types and
    /// `DomainError::Infrastructure` for undecodable payloads.
    fn execute(
        &self,
        event_type: EventType,
        prior: Self::State,
        event: &StoredEvent,
    ) -> Result<Self::State, DomainError>;
}

/// Folds `events` through `handler`, starting from the empty state.
///
/// The events must already be in ascending `sequence_id` order.
///
/// # Errors
///
/// Propagates the first error returned by the reducer.
pub fn fold_events<P: WriteProjection + ?Sized>(
    handler: &P,
    events: &[StoredEvent],
) -> Result<P::State, DomainError> {
    events.iter().try_fold(P::State::default(), |state, event| {
        handler.execute(event.event_type, state, event)
    })
}

/// Builds the [`DomainError::UnsupportedEvent`] error for `handler`.
#[must_use]
pub fn unsupported_event(handler: &'static str, event_type: EventType) -> DomainError {
    tracing::error!(
        handler,
        event_type = %event_type,
        "write projection received an unsupported event"
    );
    DomainError::UnsupportedEvent {
        handler,
        event_type: event_type.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::event::EventMetaData;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        applied: Vec<i64>,
        last_sequence_id: i64,
    }

    impl AggregateRecord for Counter {
        fn last_sequence_id(&self) -> i64 {
            self.last_sequence_id
        }
    }

    struct CounterProjection;

    impl WriteProjection for CounterProjection {
        type State = Counter;

        fn name(&self) -> &'static str {
            "CounterProjection"
        }

        fn execute(
            &self,
            event_type: EventType,
            prior: Counter,
            event: &StoredEvent,
        ) -> Result<Counter, DomainError> {
            match event_type {
                EventType::ContactNumberTypeAdded => {
                    let mut next = prior;
                    next.applied.push(event.sequence_id);
                    next.last_sequence_id = event.sequence_id;
                    Ok(next)
                }
                other => Err(unsupported_event(self.name(), other)),
            }
        }
    }

    fn stored(event_type: EventType, sequence_id: i64) -> StoredEvent {
        StoredEvent {
            event_type,
            aggregate_id: AggregateId::contact_number_setting(),
            data: serde_json::json!({}),
            sequence_id,
            meta_data: EventMetaData::system(),
            correlation_id: "corr".into(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            position: sequence_id,
        }
    }

    #[test]
    fn test_fold_of_no_events_is_empty_state() {
        let state = fold_events(&CounterProjection, &[]).unwrap();

        assert_eq!(state, Counter::default());
        assert_eq!(state.last_sequence_id(), 0);
    }

    #[test]
    fn test_fold_applies_events_in_given_order() {
        let events = vec![
            stored(EventType::ContactNumberTypeAdded, 1),
            stored(EventType::ContactNumberTypeAdded, 2),
            stored(EventType::ContactNumberTypeAdded, 3),
        ];

        let first = fold_events(&CounterProjection, &events).unwrap();
        let second = fold_events(&CounterProjection, &events).unwrap();

        assert_eq!(first.applied, vec![1, 2, 3]);
        assert_eq!(first.last_sequence_id, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fold_stops_on_unsupported_event() {
        let events = vec![
            stored(EventType::ContactNumberTypeAdded, 1),
            stored(EventType::ClientContactNumberAdded, 2),
        ];

        let result = fold_events(&CounterProjection, &events);

        match result {
            Err(DomainError::UnsupportedEvent {
                handler,
                event_type,
            }) => {
                assert_eq!(handler, "CounterProjection");
                assert_eq!(event_type, "ClientContactNumberAdded");
            }
            other => panic!("expected UnsupportedEvent, got {other:?}"),
        }
    }

    #[test]
    fn test_aggregate_id_json_and_display() {
        let id = AggregateId::client_contact_number("client-1");

        assert_eq!(
            id.to_json(),
            serde_json::json!({"client_id": "client-1", "name": "client_contact_number"})
        );
        assert_eq!(id.get("client_id"), Some("client-1"));
        assert_eq!(
            id.to_string(),
            "{client_id: client-1, name: client_contact_number}"
        );
    }
}
