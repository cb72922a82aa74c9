//! Read-model records and the store seams the pipelines write through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dialbook_contact_number_setting::domain::aggregates::ContactNumberTypeStatus;
use serde::Serialize;

use crate::error::ProjectionError;

/// Page size used when a list request does not give one.
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 25;

/// Largest page size a list request may ask for.
pub const MAX_ITEMS_PER_PAGE: u32 = 100;

/// One row of the contact number type read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactNumberTypeView {
    /// Identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display order.
    pub order: i32,
    /// Lifecycle status; absent until the first enable/disable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContactNumberTypeStatus>,
    /// Number of updates applied since insertion.
    #[serde(rename = "__v")]
    pub revision: i64,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// Time of the last update.
    pub updated_at: DateTime<Utc>,
}

/// Fields of a new contact number type row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContactNumberTypeView {
    /// Identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display order.
    pub order: i32,
}

/// One row of the client contact number read model.
///
/// `type_name` and `type_order` are copied from the referenced contact
/// number type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientContactNumberView {
    /// Identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning client.
    pub client_id: String,
    /// Referenced contact number type.
    pub type_id: String,
    /// Name of the referenced type.
    pub type_name: Option<String>,
    /// Display order of the referenced type.
    pub type_order: Option<i32>,
    /// The number itself.
    pub contact_number: String,
    /// Number of updates applied since insertion.
    #[serde(rename = "__v")]
    pub revision: i64,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// Time of the last update.
    pub updated_at: DateTime<Utc>,
}

/// Fields of a new client contact number row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClientContactNumberView {
    /// Identifier.
    pub id: String,
    /// Owning client.
    pub client_id: String,
    /// Referenced contact number type.
    pub type_id: String,
    /// Name of the referenced type at insertion time.
    pub type_name: Option<String>,
    /// Display order of the referenced type at insertion time.
    pub type_order: Option<i32>,
    /// The number itself.
    pub contact_number: String,
}

/// Pagination of a list query. Pages start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    /// Requested page.
    pub page: u32,
    /// Rows per page.
    pub items_per_page: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
        }
    }
}

impl ListQuery {
    /// Builds a query, falling back to defaults for absent values and
    /// clamping them into range.
    #[must_use]
    pub fn new(page: Option<u32>, items_per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            items_per_page: items_per_page
                .unwrap_or(DEFAULT_ITEMS_PER_PAGE)
                .clamp(1, MAX_ITEMS_PER_PAGE),
        }
    }

    /// Rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.items_per_page)
    }

    /// Rows to return.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.items_per_page)
    }
}

/// One page of a list query plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Matching rows across all pages.
    pub count: u64,
    /// Rows of the requested page.
    pub data: Vec<T>,
}

/// Contact number type read model.
#[async_trait]
pub trait ContactNumberTypeProjectionStore: Send + Sync {
    /// Inserts a row with revision 0.
    ///
    /// Fails with [`ProjectionError::DuplicateKey`] if the id exists.
    async fn insert(&self, record: NewContactNumberTypeView) -> Result<(), ProjectionError>;

    /// Sets the status of `id`. Returns the number of rows changed.
    async fn set_status(
        &self,
        id: &str,
        status: ContactNumberTypeStatus,
    ) -> Result<u64, ProjectionError>;

    /// Overwrites the given fields of `id`. Returns the number of rows
    /// changed.
    async fn update(
        &self,
        id: &str,
        name: Option<&str>,
        order: Option<i32>,
    ) -> Result<u64, ProjectionError>;

    /// Returns the row of `id`.
    async fn find(&self, id: &str) -> Result<Option<ContactNumberTypeView>, ProjectionError>;

    /// Lists rows by ascending order, then name.
    async fn list(&self, query: ListQuery) -> Result<Page<ContactNumberTypeView>, ProjectionError>;
}

/// Client contact number read model.
#[async_trait]
pub trait ClientContactNumberProjectionStore: Send + Sync {
    /// Inserts a row with revision 0.
    ///
    /// Fails with [`ProjectionError::DuplicateKey`] if the id exists.
    async fn insert(&self, record: NewClientContactNumberView) -> Result<(), ProjectionError>;

    /// Deletes the row of `id`. Returns the number of rows deleted.
    async fn delete(&self, id: &str) -> Result<u64, ProjectionError>;

    /// Overwrites the given denormalized type fields of every row referencing
    /// `type_id`. Returns the number of rows changed.
    async fn update_by_type_id(
        &self,
        type_id: &str,
        type_name: Option<&str>,
        type_order: Option<i32>,
    ) -> Result<u64, ProjectionError>;

    /// Returns the row of `id`.
    async fn find(&self, id: &str) -> Result<Option<ClientContactNumberView>, ProjectionError>;

    /// Lists the rows of `client_id` by ascending type order, then id.
    async fn list_for_client(
        &self,
        client_id: &str,
        query: ListQuery,
    ) -> Result<Page<ClientContactNumberView>, ProjectionError>;
}
