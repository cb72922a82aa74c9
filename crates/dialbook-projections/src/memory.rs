//! In-memory read-model stores for tests and local runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dialbook_contact_number_setting::domain::aggregates::ContactNumberTypeStatus;
use dialbook_core::clock::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::error::ProjectionError;
use crate::read_model::{
    ClientContactNumberProjectionStore, ClientContactNumberView, ContactNumberTypeProjectionStore,
    ContactNumberTypeView, ListQuery, NewClientContactNumberView, NewContactNumberTypeView, Page,
};

fn paginate<T: Clone>(rows: &[T], query: ListQuery) -> Page<T> {
    let skip = usize::try_from(query.offset()).unwrap_or(usize::MAX);
    let take = usize::try_from(query.limit()).unwrap_or(usize::MAX);
    Page {
        count: rows.len() as u64,
        data: rows.iter().skip(skip).take(take).cloned().collect(),
    }
}

/// Contact number type rows keyed by id.
pub struct InMemoryContactNumberTypeStore {
    rows: Mutex<BTreeMap<String, ContactNumberTypeView>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for InMemoryContactNumberTypeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContactNumberTypeStore")
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryContactNumberTypeStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl InMemoryContactNumberTypeStore {
    /// Creates an empty store stamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store stamped by `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            clock,
        }
    }
}

#[async_trait]
impl ContactNumberTypeProjectionStore for InMemoryContactNumberTypeStore {
    async fn insert(&self, record: NewContactNumberTypeView) -> Result<(), ProjectionError> {
        let mut rows = self.rows.lock().await;
        if rows.contains_key(&record.id) {
            return Err(ProjectionError::DuplicateKey(record.id));
        }
        let now = self.clock.now();
        rows.insert(
            record.id.clone(),
            ContactNumberTypeView {
                id: record.id,
                name: record.name,
                order: record.order,
                status: None,
                revision: 0,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn set_status(
        &self,
        id: &str,
        status: ContactNumberTypeStatus,
    ) -> Result<u64, ProjectionError> {
        let mut rows = self.rows.lock().await;
        let Some(row) = rows.get_mut(id) else {
            return Ok(0);
        };
        row.status = Some(status);
        row.revision += 1;
        row.updated_at = self.clock.now();
        Ok(1)
    }

    async fn update(
        &self,
        id: &str,
        name: Option<&str>,
        order: Option<i32>,
    ) -> Result<u64, ProjectionError> {
        let mut rows = self.rows.lock().await;
        let Some(row) = rows.get_mut(id) else {
            return Ok(0);
        };
        if let Some(name) = name {
            name.clone_into(&mut row.name);
        }
        if let Some(order) = order {
            row.order = order;
        }
        row.revision += 1;
        row.updated_at = self.clock.now();
        Ok(1)
    }

    async fn find(&self, id: &str) -> Result<Option<ContactNumberTypeView>, ProjectionError> {
        Ok(self.rows.lock().await.get(id).cloned())
    }

    async fn list(&self, query: ListQuery) -> Result<Page<ContactNumberTypeView>, ProjectionError> {
        let mut rows: Vec<ContactNumberTypeView> =
            self.rows.lock().await.values().cloned().collect();
        rows.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(paginate(&rows, query))
    }
}

/// Client contact number rows keyed by id.
pub struct InMemoryClientContactNumberStore {
    rows: Mutex<BTreeMap<String, ClientContactNumberView>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for InMemoryClientContactNumberStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryClientContactNumberStore")
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryClientContactNumberStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl InMemoryClientContactNumberStore {
    /// Creates an empty store stamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store stamped by `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            clock,
        }
    }

    /// Returns every row, ordered by id.
    pub async fn all(&self) -> Vec<ClientContactNumberView> {
        self.rows.lock().await.values().cloned().collect()
    }
}

#[async_trait]
impl ClientContactNumberProjectionStore for InMemoryClientContactNumberStore {
    async fn insert(&self, record: NewClientContactNumberView) -> Result<(), ProjectionError> {
        let mut rows = self.rows.lock().await;
        if rows.contains_key(&record.id) {
            return Err(ProjectionError::DuplicateKey(record.id));
        }
        let now = self.clock.now();
        rows.insert(
            record.id.clone(),
            ClientContactNumberView {
                id: record.id,
                client_id: record.client_id,
                type_id: record.type_id,
                type_name: record.type_name,
                type_order: record.type_order,
                contact_number: record.contact_number,
                revision: 0,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<u64, ProjectionError> {
        Ok(u64::from(self.rows.lock().await.remove(id).is_some()))
    }

    async fn update_by_type_id(
        &self,
        type_id: &str,
        type_name: Option<&str>,
        type_order: Option<i32>,
    ) -> Result<u64, ProjectionError> {
        let now = self.clock.now();
        let mut changed = 0;
        for row in self
            .rows
            .lock()
            .await
            .values_mut()
            .filter(|row| row.type_id == type_id)
        {
            if let Some(name) = type_name {
                row.type_name = Some(name.to_owned());
            }
            if let Some(order) = type_order {
                row.type_order = Some(order);
            }
            row.revision += 1;
            row.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn find(&self, id: &str) -> Result<Option<ClientContactNumberView>, ProjectionError> {
        Ok(self.rows.lock().await.get(id).cloned())
    }

    async fn list_for_client(
        &self,
        client_id: &str,
        query: ListQuery,
    ) -> Result<Page<ClientContactNumberView>, ProjectionError> {
        let mut rows: Vec<ClientContactNumberView> = self
            .rows
            .lock()
            .await
            .values()
            .filter(|row| row.client_id == client_id)
            .cloned()
            .collect();
        // NULLS LAST, matching the PostgreSQL store.
        rows.sort_by(|a, b| {
            (a.type_order.is_none(), a.type_order)
                .cmp(&(b.type_order.is_none(), b.type_order))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(paginate(&rows, query))
    }
}
