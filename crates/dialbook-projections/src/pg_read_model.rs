//! `PostgreSQL` read-model stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dialbook_contact_number_setting::domain::aggregates::ContactNumberTypeStatus;
use sqlx::PgPool;

use crate::error::ProjectionError;
use crate::read_model::{
    ClientContactNumberProjectionStore, ClientContactNumberView, ContactNumberTypeProjectionStore,
    ContactNumberTypeView, ListQuery, NewClientContactNumberView, NewContactNumberTypeView, Page,
};

/// Table of the contact number type read model.
pub const CONTACT_NUMBER_TYPE_TABLE: &str = "contact_number_type_projection";

/// Table of the client contact number read model.
pub const CLIENT_CONTACT_NUMBER_TABLE: &str = "client_contact_number_projection";

const TYPE_COLUMNS: &str = "id, name, type_order, status, revision, created_at, updated_at";

const CLIENT_COLUMNS: &str = "id, client_id, type_id, type_name, type_order, contact_number, \
                              revision, created_at, updated_at";

fn status_name(status: ContactNumberTypeStatus) -> &'static str {
    match status {
        ContactNumberTypeStatus::Enabled => "enabled",
        ContactNumberTypeStatus::Disabled => "disabled",
    }
}

fn i64_of(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[derive(Debug, sqlx::FromRow)]
struct ContactNumberTypeRow {
    id: String,
    name: String,
    type_order: i32,
    status: Option<String>,
    revision: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContactNumberTypeRow> for ContactNumberTypeView {
    fn from(row: ContactNumberTypeRow) -> Self {
        let status = match row.status.as_deref() {
            Some("enabled") => Some(ContactNumberTypeStatus::Enabled),
            Some("disabled") => Some(ContactNumberTypeStatus::Disabled),
            _ => None,
        };
        Self {
            id: row.id,
            name: row.name,
            order: row.type_order,
            status,
            revision: row.revision,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClientContactNumberRow {
    id: String,
    client_id: String,
    type_id: String,
    type_name: Option<String>,
    type_order: Option<i32>,
    contact_number: String,
    revision: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClientContactNumberRow> for ClientContactNumberView {
    fn from(row: ClientContactNumberRow) -> Self {
        Self {
            id: row.id,
            client_id: row.client_id,
            type_id: row.type_id,
            type_name: row.type_name,
            type_order: row.type_order,
            contact_number: row.contact_number,
            revision: row.revision,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Contact number type read model in `contact_number_type_projection`.
#[derive(Debug, Clone)]
pub struct PgContactNumberTypeStore {
    pool: PgPool,
}

impl PgContactNumberTypeStore {
    /// Creates a new `PgContactNumberTypeStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactNumberTypeProjectionStore for PgContactNumberTypeStore {
    async fn insert(&self, record: NewContactNumberTypeView) -> Result<(), ProjectionError> {
        sqlx::query(&format!(
            "INSERT INTO {CONTACT_NUMBER_TYPE_TABLE} \
             (id, name, type_order, status, revision, created_at, updated_at) \
             VALUES ($1, $2, $3, NULL, 0, NOW(), NOW())"
        ))
        .bind(&record.id)
        .bind(&record.name)
        .bind(record.order)
        .execute(&self.pool)
        .await
        .map_err(|e| ProjectionError::from_insert(e, &record.id))?;
        Ok(())
    }

    async fn set_status(
        &self,
        id: &str,
        status: ContactNumberTypeStatus,
    ) -> Result<u64, ProjectionError> {
        let result = sqlx::query(&format!(
            "UPDATE {CONTACT_NUMBER_TYPE_TABLE} \
             SET status = $2, revision = revision + 1, updated_at = NOW() \
             WHERE id = $1"
        ))
        .bind(id)
        .bind(status_name(status))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn update(
        &self,
        id: &str,
        name: Option<&str>,
        order: Option<i32>,
    ) -> Result<u64, ProjectionError> {
        let result = sqlx::query(&format!(
            "UPDATE {CONTACT_NUMBER_TYPE_TABLE} \
             SET name = COALESCE($2, name), type_order = COALESCE($3, type_order), \
                 revision = revision + 1, updated_at = NOW() \
             WHERE id = $1"
        ))
        .bind(id)
        .bind(name)
        .bind(order)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find(&self, id: &str) -> Result<Option<ContactNumberTypeView>, ProjectionError> {
        let row: Option<ContactNumberTypeRow> = sqlx::query_as(&format!(
            "SELECT {TYPE_COLUMNS} FROM {CONTACT_NUMBER_TYPE_TABLE} WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list(&self, query: ListQuery) -> Result<Page<ContactNumberTypeView>, ProjectionError> {
        let count_sql = format!("SELECT COUNT(*) FROM {CONTACT_NUMBER_TYPE_TABLE}");
        let list_sql = format!(
            "SELECT {TYPE_COLUMNS} FROM {CONTACT_NUMBER_TYPE_TABLE} \
             ORDER BY type_order ASC, name ASC, id ASC LIMIT $1 OFFSET $2"
        );
        let count = sqlx::query_as::<_, (i64,)>(&count_sql).fetch_one(&self.pool);
        let rows = sqlx::query_as::<_, ContactNumberTypeRow>(&list_sql)
            .bind(i64_of(query.limit()))
            .bind(i64_of(query.offset()))
            .fetch_all(&self.pool);
        let ((count,), rows) = tokio::try_join!(count, rows)?;

        Ok(Page {
            count: u64::try_from(count).unwrap_or_default(),
            data: rows.into_iter().map(Into::into).collect(),
        })
    }
}

/// Client contact number read model in `client_contact_number_projection`.
#[derive(Debug, Clone)]
pub struct PgClientContactNumberStore {
    pool: PgPool,
}

impl PgClientContactNumberStore {
    /// Creates a new `PgClientContactNumberStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientContactNumberProjectionStore for PgClientContactNumberStore {
    async fn insert(&self, record: NewClientContactNumberView) -> Result<(), ProjectionError> {
        sqlx::query(&format!(
            "INSERT INTO {CLIENT_CONTACT_NUMBER_TABLE} \
             (id, client_id, type_id, type_name, type_order, contact_number, \
              revision, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 0, NOW(), NOW())"
        ))
        .bind(&record.id)
        .bind(&record.client_id)
        .bind(&record.type_id)
        .bind(&record.type_name)
        .bind(record.type_order)
        .bind(&record.contact_number)
        .execute(&self.pool)
        .await
        .map_err(|e| ProjectionError::from_insert(e, &record.id))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<u64, ProjectionError> {
        let result = sqlx::query(&format!(
            "DELETE FROM {CLIENT_CONTACT_NUMBER_TABLE} WHERE id = $1"
        ))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn update_by_type_id(
        &self,
        type_id: &str,
        type_name: Option<&str>,
        type_order: Option<i32>,
    ) -> Result<u64, ProjectionError> {
        let result = sqlx::query(&format!(
            "UPDATE {CLIENT_CONTACT_NUMBER_TABLE} \
             SET type_name = COALESCE($2, type_name), type_order = COALESCE($3, type_order), \
                 revision = revision + 1, updated_at = NOW() \
             WHERE type_id = $1"
        ))
        .bind(type_id)
        .bind(type_name)
        .bind(type_order)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find(&self, id: &str) -> Result<Option<ClientContactNumberView>, ProjectionError> {
        let row: Option<ClientContactNumberRow> = sqlx::query_as(&format!(
            "SELECT {CLIENT_COLUMNS} FROM {CLIENT_CONTACT_NUMBER_TABLE} WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_for_client(
        &self,
        client_id: &str,
        query: ListQuery,
    ) -> Result<Page<ClientContactNumberView>, ProjectionError> {
        let count_sql =
            format!("SELECT COUNT(*) FROM {CLIENT_CONTACT_NUMBER_TABLE} WHERE client_id = $1");
        let list_sql = format!(
            "SELECT {CLIENT_COLUMNS} FROM {CLIENT_CONTACT_NUMBER_TABLE} WHERE client_id = $1 \
             ORDER BY type_order ASC NULLS LAST, id ASC LIMIT $2 OFFSET $3"
        );
        let count = sqlx::query_as::<_, (i64,)>(&count_sql)
            .bind(client_id)
            .fetch_one(&self.pool);
        let rows = sqlx::query_as::<_, ClientContactNumberRow>(&list_sql)
            .bind(client_id)
            .bind(i64_of(query.limit()))
            .bind(i64_of(query.offset()))
            .fetch_all(&self.pool);
        let ((count,), rows) = tokio::try_join!(count, rows)?;

        Ok(Page {
            count: u64::try_from(count).unwrap_or_default(),
            data: rows.into_iter().map(Into::into).collect(),
        })
    }
}
