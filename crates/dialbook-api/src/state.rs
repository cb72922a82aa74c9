//! Shared application state.

use std::fmt;
use std::sync::Arc;

use dialbook_client_contact_number::application::command_handlers as client_handlers;
use dialbook_client_contact_number::application::repository::ClientContactNumberRepository;
use dialbook_client_contact_number::domain::commands::ClientContactNumberCommand;
use dialbook_contact_number_setting::application::command_handlers as setting_handlers;
use dialbook_contact_number_setting::application::repository::ContactNumberSettingRepository;
use dialbook_contact_number_setting::domain::commands::ContactNumberSettingCommand;
use dialbook_core::command::CommandBus;
use dialbook_core::repository::EventRepository;
use dialbook_event_store::pools::DatabaseHealth;
use dialbook_projections::read_model::{
    ClientContactNumberProjectionStore, ContactNumberTypeProjectionStore,
};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Event store repository.
    pub event_repository: Arc<dyn EventRepository>,
    /// Command bus of the contact number setting aggregate.
    pub contact_number_setting_bus: Arc<CommandBus<ContactNumberSettingCommand>>,
    /// Command bus of the client contact number aggregate.
    pub client_contact_number_bus: Arc<CommandBus<ClientContactNumberCommand>>,
    /// Contact number type read model.
    pub contact_number_types: Arc<dyn ContactNumberTypeProjectionStore>,
    /// Client contact number read model.
    pub client_contact_numbers: Arc<dyn ClientContactNumberProjectionStore>,
    /// Database check behind `/health`; `None` when nothing is pooled.
    pub database_health: Option<Arc<dyn DatabaseHealth>>,
}

impl AppState {
    /// Wires both command buses over `event_repository`.
    #[must_use]
    pub fn new(
        event_repository: Arc<dyn EventRepository>,
        contact_number_types: Arc<dyn ContactNumberTypeProjectionStore>,
        client_contact_numbers: Arc<dyn ClientContactNumberProjectionStore>,
    ) -> Self {
        let settings = Arc::new(ContactNumberSettingRepository::new(Arc::clone(
            &event_repository,
        )));
        let clients = Arc::new(ClientContactNumberRepository::new(
            Arc::clone(&event_repository),
            Arc::clone(&settings),
        ));
        Self {
            contact_number_setting_bus: Arc::new(setting_handlers::command_bus(settings)),
            client_contact_number_bus: Arc::new(client_handlers::command_bus(clients)),
            event_repository,
            contact_number_types,
            client_contact_numbers,
            database_health: None,
        }
    }

    /// Reports `checker` from `/health`.
    #[must_use]
    pub fn with_database_health(mut self, checker: Arc<dyn DatabaseHealth>) -> Self {
        self.database_health = Some(checker);
        self
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("contact_number_setting_bus", &self.contact_number_setting_bus)
            .field("client_contact_number_bus", &self.client_contact_number_bus)
            .finish_non_exhaustive()
    }
}
