//! Projection stages: apply the events of one read model.

mod client_contact_number;
mod contact_number_type;

use async_trait::async_trait;
use dialbook_core::event::{EventType, StoredEvent};

use crate::error::ProjectionError;

pub use client_contact_number::ClientContactNumberProjectionTransformer;
pub use contact_number_type::ContactNumberTypeProjectionTransformer;

/// Applies the events one read model depends on.
#[async_trait]
pub trait ProjectionTransformer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Returns `true` for the event types this read model applies. Any other
    /// event passes the stage untouched.
    fn supports(&self, event_type: EventType) -> bool;

    /// Applies `event`. Replaying an event that was already applied must
    /// succeed and leave the read model unchanged.
    async fn apply(&self, event: &StoredEvent) -> Result<(), ProjectionError>;
}

/// Treats a duplicate key as an insert that was applied before.
fn already_applied(
    result: Result<(), ProjectionError>,
    transformer: &'static str,
    event: &StoredEvent,
) -> Result<(), ProjectionError> {
    match result {
        Err(ProjectionError::DuplicateKey(key)) => {
            tracing::info!(
                transformer,
                event_type = %event.event_type,
                key = %key,
                position = event.position,
                "Duplicate key error, record already projected"
            );
            Ok(())
        }
        other => other,
    }
}
