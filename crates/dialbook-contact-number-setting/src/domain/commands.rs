//! Commands for the Contact Number Setting aggregate.

use dialbook_core::command::Command;
use serde::Deserialize;

/// Creates a contact number type; it starts out enabled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddContactNumberType {
    /// Identifier of the new type.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name, unique ignoring case and surrounding whitespace.
    pub name: String,
    /// Display order; defaults to 1.
    #[serde(default)]
    pub order: Option<i32>,
}

/// Changes the name and/or order of a contact number type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateContactNumberType {
    /// The type to update.
    #[serde(rename = "_id")]
    pub id: String,
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New display order.
    #[serde(default)]
    pub order: Option<i32>,
}

/// Enables a contact number type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnableContactNumberType {
    /// The type to enable.
    #[serde(rename = "_id")]
    pub id: String,
}

/// Disables a contact number type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisableContactNumberType {
    /// The type to disable.
    #[serde(rename = "_id")]
    pub id: String,
}

/// Every command accepted by the contact number setting command bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactNumberSettingCommand {
    /// See [`AddContactNumberType`].
    AddContactNumberType(AddContactNumberType),
    /// See [`UpdateContactNumberType`].
    UpdateContactNumberType(UpdateContactNumberType),
    /// See [`EnableContactNumberType`].
    EnableContactNumberType(EnableContactNumberType),
    /// See [`DisableContactNumberType`].
    DisableContactNumberType(DisableContactNumberType),
}

impl Command for ContactNumberSettingCommand {
    fn command_type(&self) -> &'static str {
        match self {
            Self::AddContactNumberType(_) => "AddContactNumberTypeCommand",
            Self::UpdateContactNumberType(_) => "UpdateContactNumberTypeCommand",
            Self::EnableContactNumberType(_) => "EnableContactNumberTypeCommand",
            Self::DisableContactNumberType(_) => "DisableContactNumberTypeCommand",
        }
    }
}
