//! Event store database schema.

/// Name of the event log table.
pub const EVENTS_TABLE: &str = "domain_events";

/// Name of the resume token table.
pub const STREAM_TRACKER_TABLE: &str = "stream_tracker";

/// Columns selected whenever a full event row is read.
pub(crate) const EVENT_COLUMNS: &str =
    "position, event_type, aggregate_id, data, sequence_id, meta_data, correlation_id, created_at";

/// Advisory lock taken by every append so that positions become visible to
/// the change feed in commit order.
pub(crate) const APPEND_LOCK_KEY: i64 = 0x6469_616c_626f_6f6b;
