//! `PostgreSQL` implementation of the `EventRepository` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use dialbook_core::aggregate::AggregateId;
use dialbook_core::error::DomainError;
use dialbook_core::event::{NewEvent, StoredEvent};
use dialbook_core::repository::EventRepository;

use crate::infrastructure;
use crate::schema::{APPEND_LOCK_KEY, EVENT_COLUMNS, EVENTS_TABLE};

/// A row of the `domain_events` table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EventRow {
    pub(crate) position: i64,
    pub(crate) event_type: String,
    pub(crate) aggregate_id: serde_json::Value,
    pub(crate) data: serde_json::Value,
    pub(crate) sequence_id: i64,
    pub(crate) meta_data: serde_json::Value,
    pub(crate) correlation_id: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for StoredEvent {
    type Error = DomainError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, e: serde_json::Error| {
            DomainError::Infrastructure(format!(
                "corrupt {what} in event at position {}: {e}",
                row.position
            ))
        };
        Ok(Self {
            event_type: row.event_type.parse()?,
            aggregate_id: serde_json::from_value(row.aggregate_id)
                .map_err(|e| corrupt("aggregate_id", e))?,
            data: row.data,
            sequence_id: row.sequence_id,
            meta_data: serde_json::from_value(row.meta_data)
                .map_err(|e| corrupt("meta_data", e))?,
            correlation_id: row.correlation_id,
            created_at: row.created_at,
            position: row.position,
        })
    }
}

/// PostgreSQL-backed event repository.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn save(&self, events: &[NewEvent]) -> Result<Vec<StoredEvent>, DomainError> {
        if events.is_empty() {
            return Ok(vec![]);
        }

        let mut rows = Vec::with_capacity(events.len());
        for event in events {
            let meta_data = serde_json::to_value(&event.meta_data).map_err(|e| {
                DomainError::Infrastructure(format!("event serialization failed: {e}"))
            })?;
            rows.push((event, event.aggregate_id.to_json(), meta_data));
        }

        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(APPEND_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(infrastructure)?;

        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {EVENTS_TABLE} \
             (event_type, aggregate_id, data, sequence_id, meta_data, correlation_id) "
        ));
        query_builder.push_values(&rows, |mut b, (event, aggregate_id, meta_data)| {
            b.push_bind(event.event_type.as_str())
                .push_bind(aggregate_id.clone())
                .push_bind(event.data.clone())
                .push_bind(event.sequence_id)
                .push_bind(meta_data.clone())
                .push_bind(event.correlation_id.clone());
        });
        query_builder.push(" RETURNING aggregate_id, sequence_id, position, created_at");

        let inserted: Vec<(serde_json::Value, i64, i64, DateTime<Utc>)> = query_builder
            .build_query_as()
            .fetch_all(&mut *tx)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    tracing::warn!(
                        aggregate_id = %events[0].aggregate_id,
                        sequence_id = events[0].sequence_id,
                        "sequence id already taken"
                    );
                    DomainError::ConcurrencyConflict {
                        aggregate_id: events[0].aggregate_id.to_string(),
                        sequence_id: events[0].sequence_id,
                    }
                }
                other => infrastructure(other),
            })?;

        tx.commit().await.map_err(infrastructure)?;

        let mut assigned: HashMap<(AggregateId, i64), (i64, DateTime<Utc>)> =
            HashMap::with_capacity(inserted.len());
        for (aggregate_id, sequence_id, position, created_at) in inserted {
            let aggregate_id: AggregateId = serde_json::from_value(aggregate_id).map_err(|e| {
                DomainError::Infrastructure(format!("corrupt aggregate_id returned by insert: {e}"))
            })?;
            assigned.insert((aggregate_id, sequence_id), (position, created_at));
        }

        // RETURNING order is not guaranteed to follow VALUES order.
        events
            .iter()
            .map(|event| {
                let key = (event.aggregate_id.clone(), event.sequence_id);
                let (position, created_at) = assigned.get(&key).copied().ok_or_else(|| {
                    DomainError::Infrastructure(format!(
                        "insert did not return event {} #{}",
                        event.aggregate_id, event.sequence_id
                    ))
                })?;
                Ok(StoredEvent::from_new(event.clone(), position, created_at))
            })
            .collect()
    }

    async fn load_events(
        &self,
        aggregate_id: &AggregateId,
        upper_sequence_id: Option<i64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM {EVENTS_TABLE} \
             WHERE aggregate_id = $1 AND ($2::BIGINT IS NULL OR sequence_id <= $2) \
             ORDER BY sequence_id ASC"
        ))
        .bind(aggregate_id.to_json())
        .bind(upper_sequence_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        rows.into_iter().map(StoredEvent::try_from).collect()
    }
}
