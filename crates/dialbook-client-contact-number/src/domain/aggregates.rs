//! Aggregate root for the Client Contact Number aggregate.

use std::sync::Arc;

use dialbook_contact_number_setting::application::repository::ContactNumberSettingRepository;
use dialbook_core::aggregate::{AggregateId, AggregateRecord};
use dialbook_core::error::{DomainError, ValidationError};
use serde::{Deserialize, Serialize};

/// Validation code for a reference to an unknown contact number type.
pub const CONTACT_NUMBER_TYPE_NOT_FOUND: &str = "CONTACT_NUMBER_TYPE_NOT_FOUND";
/// Validation code for a reference to a disabled contact number type.
pub const CONTACT_NUMBER_TYPE_DISABLED: &str = "CONTACT_NUMBER_TYPE_DISABLED";
/// Validation code for a number the client already has with that type.
pub const CONTACT_NUMBER_ALREADY_EXISTS: &str = "CONTACT_NUMBER_ALREADY_EXISTS";
/// Validation code for removing a number twice.
pub const CONTACT_NUMBER_ALREADY_REMOVED: &str = "CONTACT_NUMBER_ALREADY_REMOVED";

/// Status of a client contact number; absent while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientContactNumberStatus {
    /// The number was removed; it stays in the aggregate as history.
    Removed,
}

/// One contact number of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContactNumber {
    /// Identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Referenced contact number type.
    pub type_id: String,
    /// The number itself.
    pub contact_number: String,
    /// `Some(Removed)` once removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ClientContactNumberStatus>,
}

/// Folded state of one client's contact numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientContactNumberRecord {
    /// Every number ever added, in creation order.
    pub contact_numbers: Vec<ClientContactNumber>,
    /// Highest folded sequence id.
    pub last_sequence_id: i64,
}

impl AggregateRecord for ClientContactNumberRecord {
    fn last_sequence_id(&self) -> i64 {
        self.last_sequence_id
    }
}

/// The aggregate root for one client's contact numbers.
#[derive(Debug, Clone)]
pub struct ClientContactNumberAggregate {
    id: AggregateId,
    record: ClientContactNumberRecord,
    settings: Arc<ContactNumberSettingRepository>,
}

impl ClientContactNumberAggregate {
    /// Wraps folded state; `settings` is read for cross-aggregate checks.
    #[must_use]
    pub fn new(
        id: AggregateId,
        record: ClientContactNumberRecord,
        settings: Arc<ContactNumberSettingRepository>,
    ) -> Self {
        Self {
            id,
            record,
            settings,
        }
    }

    /// Aggregate identifier.
    #[must_use]
    pub fn id(&self) -> &AggregateId {
        &self.id
    }

    /// Highest sequence id folded into this aggregate.
    #[must_use]
    pub fn last_event_id(&self) -> i64 {
        self.record.last_sequence_id
    }

    /// Folded state.
    #[must_use]
    pub fn record(&self) -> &ClientContactNumberRecord {
        &self.record
    }

    /// Returns `true` if an active number equal to `contact_number` with
    /// `type_id` exists. Removed numbers are ignored.
    #[must_use]
    pub fn client_contact_number_exists(&self, contact_number: &str, type_id: &str) -> bool {
        self.record.contact_numbers.iter().any(|n| {
            n.status.is_none() && n.contact_number == contact_number && n.type_id == type_id
        })
    }

    /// Returns `true` if a number with `id` was ever added.
    #[must_use]
    pub fn client_contact_number_id_exists(&self, id: &str) -> bool {
        self.record.contact_numbers.iter().any(|n| n.id == id)
    }

    /// Returns `true` if the number with `id` was removed.
    #[must_use]
    pub fn client_contact_number_removed(&self, id: &str) -> bool {
        self.record
            .contact_numbers
            .iter()
            .any(|n| n.id == id && n.status == Some(ClientContactNumberStatus::Removed))
    }

    /// Checks the referenced type against the current contact number setting
    /// and that the number is not already present.
    ///
    /// # Errors
    ///
    /// Returns a `CONTACT_NUMBER_TYPE_NOT_FOUND`,
    /// `CONTACT_NUMBER_TYPE_DISABLED` or `CONTACT_NUMBER_ALREADY_EXISTS`
    /// validation error, or the error of loading the setting aggregate.
    pub async fn validate_add_client_contact_number_invariants(
        &self,
        type_id: &str,
        contact_number: &str,
    ) -> Result<(), DomainError> {
        let setting = self.settings.get_aggregate(None).await?;

        if !setting.contact_number_type_exists(type_id) {
            return Err(ValidationError::single(
                "Not allowed. Contact number type does not exist",
                CONTACT_NUMBER_TYPE_NOT_FOUND,
                format!("Contact number type '{type_id}' does not exist"),
                &["type_id"],
            )
            .into());
        }
        if !setting.contact_number_type_enabled(type_id) {
            return Err(ValidationError::single(
                "Not allowed. Contact number type is disabled",
                CONTACT_NUMBER_TYPE_DISABLED,
                format!("Contact number type '{type_id}' is disabled"),
                &["type_id"],
            )
            .into());
        }
        if self.client_contact_number_exists(contact_number, type_id) {
            return Err(ValidationError::single(
                "Not allowed. Client Contact number already exists",
                CONTACT_NUMBER_ALREADY_EXISTS,
                format!("Contact number '{contact_number}' already exists for this type"),
                &["contact_number"],
            )
            .into());
        }
        Ok(())
    }

    /// Checks that the number exists and is not removed yet.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ResourceNotFound` or a
    /// `CONTACT_NUMBER_ALREADY_REMOVED` validation error.
    pub fn validate_remove_client_contact_number_invariants(
        &self,
        id: &str,
    ) -> Result<(), DomainError> {
        if !self.client_contact_number_id_exists(id) {
            return Err(DomainError::ResourceNotFound(format!(
                "Client contact number not found: {id}"
            )));
        }
        if self.client_contact_number_removed(id) {
            return Err(ValidationError::single(
                "Not allowed. Client contact number already removed",
                CONTACT_NUMBER_ALREADY_REMOVED,
                format!("Client contact number '{id}' is already removed"),
                &["_id"],
            )
            .into());
        }
        Ok(())
    }
}
