//! Commands for the Client Contact Number aggregate.

use dialbook_core::command::Command;
use serde::Deserialize;

/// Adds a contact number to a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddClientContactNumber {
    /// Identifier of the new contact number.
    #[serde(rename = "_id")]
    pub id: String,
    /// Referenced contact number type; must exist and be enabled.
    pub type_id: String,
    /// The number itself.
    pub contact_number: String,
}

/// Removes a contact number from a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoveClientContactNumber {
    /// The contact number to remove.
    #[serde(rename = "_id")]
    pub id: String,
}

/// Every command accepted by the client contact number command bus. Each
/// carries the client whose aggregate it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientContactNumberCommand {
    /// See [`AddClientContactNumber`].
    AddClientContactNumber {
        /// Target client.
        client_id: String,
        /// Command payload.
        data: AddClientContactNumber,
    },
    /// See [`RemoveClientContactNumber`].
    RemoveClientContactNumber {
        /// Target client.
        client_id: String,
        /// Command payload.
        data: RemoveClientContactNumber,
    },
}

impl Command for ClientContactNumberCommand {
    fn command_type(&self) -> &'static str {
        match self {
            Self::AddClientContactNumber { .. } => "AddClientContactNumberCommand",
            Self::RemoveClientContactNumber { .. } => "RemoveClientContactNumberCommand",
        }
    }
}
