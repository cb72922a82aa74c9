//! Aggregate root for the Contact Number Setting aggregate.

use dialbook_core::aggregate::{AggregateId, AggregateRecord};
use dialbook_core::error::{DomainError, ValidationError};
use serde::{Deserialize, Serialize};

use crate::domain::commands::{AddContactNumberType, UpdateContactNumberType};

/// Validation code for a name already used by another type.
pub const DUPLICATE_NAME: &str = "DUPLICATE_NAME";

/// Lifecycle status of a contact number type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactNumberTypeStatus {
    /// Usable for new client contact numbers.
    Enabled,
    /// Kept for history; not usable for new client contact numbers.
    Disabled,
}

/// One contact number type inside the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactNumberType {
    /// Identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display order.
    pub order: i32,
    /// Status; `None` until the first enable/disable event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContactNumberTypeStatus>,
}

/// Folded state of the contact number setting aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactNumberSettingRecord {
    /// Every type ever added, in creation order.
    pub types: Vec<ContactNumberType>,
    /// Highest folded sequence id.
    pub last_sequence_id: i64,
}

impl AggregateRecord for ContactNumberSettingRecord {
    fn last_sequence_id(&self) -> i64 {
        self.last_sequence_id
    }
}

/// The aggregate root for the contact number setting.
#[derive(Debug, Clone)]
pub struct ContactNumberSettingAggregate {
    id: AggregateId,
    record: ContactNumberSettingRecord,
}

impl ContactNumberSettingAggregate {
    /// Wraps folded state.
    #[must_use]
    pub fn new(id: AggregateId, record: ContactNumberSettingRecord) -> Self {
        Self { id, record }
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
    pub fn record(&self) -> &ContactNumberSettingRecord {
        &self.record
    }

    /// Returns the type with `id`.
    #[must_use]
    pub fn get_contact_number_type(&self, id: &str) -> Option<&ContactNumberType> {
        self.record.types.iter().find(|t| t.id == id)
    }

    /// Returns `true` if a type with `id` was ever added.
    #[must_use]
    pub fn contact_number_type_exists(&self, id: &str) -> bool {
        self.get_contact_number_type(id).is_some()
    }

    /// Returns `true` if the type with `id` exists and is enabled.
    #[must_use]
    pub fn contact_number_type_enabled(&self, id: &str) -> bool {
        self.get_contact_number_type(id)
            .is_some_and(|t| t.status == Some(ContactNumberTypeStatus::Enabled))
    }

    /// Returns `false` when the type is already enabled (nothing to do).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ResourceNotFound` for an unknown type.
    pub fn can_enable_contact_number_type(&self, id: &str) -> Result<bool, DomainError> {
        let item = self.existing(id)?;
        Ok(item.status != Some(ContactNumberTypeStatus::Enabled))
    }

    /// Returns `false` when the type is already disabled (nothing to do).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ResourceNotFound` for an unknown type.
    pub fn can_disable_contact_number_type(&self, id: &str) -> Result<bool, DomainError> {
        let item = self.existing(id)?;
        Ok(item.status != Some(ContactNumberTypeStatus::Disabled))
    }

    /// Checks that the new type's name is not taken.
    ///
    /// # Errors
    ///
    /// Returns a `DUPLICATE_NAME` validation error.
    pub fn validate_add_contact_number_type(
        &self,
        command: &AddContactNumberType,
    ) -> Result<(), DomainError> {
        self.ensure_unique_name(&command.name, None)
    }

    /// Checks that the type exists and that a new name is not used by any
    /// other type.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ResourceNotFound` or a `DUPLICATE_NAME`
    /// validation error.
    pub fn validate_update_contact_number_type(
        &self,
        command: &UpdateContactNumberType,
    ) -> Result<(), DomainError> {
        self.existing(&command.id)?;
        match &command.name {
            Some(name) => self.ensure_unique_name(name, Some(&command.id)),
            None => Ok(()),
        }
    }

    fn existing(&self, id: &str) -> Result<&ContactNumberType, DomainError> {
        self.get_contact_number_type(id).ok_or_else(|| {
            DomainError::ResourceNotFound(format!("Contact number type not found: {id}"))
        })
    }

    fn ensure_unique_name(&self, name: &str, except_id: Option<&str>) -> Result<(), DomainError> {
        let wanted = normalize_name(name);
        let taken = self
            .record
            .types
            .iter()
            .filter(|t| Some(t.id.as_str()) != except_id)
            .any(|t| normalize_name(&t.name) == wanted);
        if taken {
            return Err(ValidationError::single(
                "Not allowed contact number type name",
                DUPLICATE_NAME,
                format!("name '{name}' already exists. we do not allow duplicates."),
                &["name"],
            )
            .into());
        }
        Ok(())
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
