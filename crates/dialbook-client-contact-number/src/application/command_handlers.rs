//! Command handlers for the Client Contact Number aggregate.

use std::sync::Arc;

use async_trait::async_trait;
use dialbook_core::command::{Command, CommandBus, CommandContext, CommandHandler, build_events};
use dialbook_core::error::DomainError;

use crate::application::repository::ClientContactNumberRepository;
use crate::domain::commands::ClientContactNumberCommand;
use crate::domain::events::{
    ClientContactNumberAdded, ClientContactNumberEvent, ClientContactNumberRemoved,
};

fn misrouted(handler: &'static str, command: &ClientContactNumberCommand) -> DomainError {
    tracing::error!(
        handler,
        command_type = command.command_type(),
        "command routed to the wrong handler"
    );
    DomainError::UnsupportedCommand(command.command_type().to_owned())
}

/// Handles `AddClientContactNumberCommand`.
#[derive(Debug, Clone)]
pub struct AddClientContactNumberCommandHandler {
    repo: Arc<ClientContactNumberRepository>,
}

impl AddClientContactNumberCommandHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(repo: Arc<ClientContactNumberRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CommandHandler<ClientContactNumberCommand> for AddClientContactNumberCommandHandler {
    fn command_type(&self) -> &'static str {
        "AddClientContactNumberCommand"
    }

    async fn execute(
        &self,
        command: &ClientContactNumberCommand,
        context: &CommandContext,
    ) -> Result<(), DomainError> {
        let ClientContactNumberCommand::AddClientContactNumber { client_id, data } = command else {
            return Err(misrouted("AddClientContactNumberCommandHandler", command));
        };

        let aggregate = self.repo.get_aggregate(client_id, None).await?;
        aggregate
            .validate_add_client_contact_number_invariants(&data.type_id, &data.contact_number)
            .await?;

        let events = [ClientContactNumberEvent::Added(ClientContactNumberAdded {
            id: data.id.clone(),
            client_id: client_id.clone(),
            type_id: data.type_id.clone(),
            contact_number: data.contact_number.clone(),
        })];
        let records = build_events(aggregate.id(), aggregate.last_event_id(), &events, context)?;
        self.repo.save(&records).await?;
        Ok(())
    }
}

/// Handles `RemoveClientContactNumberCommand`.
#[derive(Debug, Clone)]
pub struct RemoveClientContactNumberCommandHandler {
    repo: Arc<ClientContactNumberRepository>,
}

impl RemoveClientContactNumberCommandHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(repo: Arc<ClientContactNumberRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CommandHandler<ClientContactNumberCommand> for RemoveClientContactNumberCommandHandler {
    fn command_type(&self) -> &'static str {
        "RemoveClientContactNumberCommand"
    }

    async fn execute(
        &self,
        command: &ClientContactNumberCommand,
        context: &CommandContext,
    ) -> Result<(), DomainError> {
        let ClientContactNumberCommand::RemoveClientContactNumber { client_id, data } = command
        else {
            return Err(misrouted("RemoveClientContactNumberCommandHandler", command));
        };

        let aggregate = self.repo.get_aggregate(client_id, None).await?;
        aggregate.validate_remove_client_contact_number_invariants(&data.id)?;

        let events = [ClientContactNumberEvent::Removed(ClientContactNumberRemoved {
            id: data.id.clone(),
        })];
        let records = build_events(aggregate.id(), aggregate.last_event_id(), &events, context)?;
        self.repo.save(&records).await?;
        Ok(())
    }
}

/// Builds the command bus with one handler per client contact number command.
#[must_use]
pub fn command_bus(
    repo: Arc<ClientContactNumberRepository>,
) -> CommandBus<ClientContactNumberCommand> {
    CommandBus::new()
        .add_handler(AddClientContactNumberCommandHandler::new(Arc::clone(&repo)))
        .add_handler(RemoveClientContactNumberCommandHandler::new(repo))
}

#[cfg(test)]
mod tests {
    use dialbook_contact_number_setting::application::command_handlers::command_bus as setting_bus;
    use dialbook_contact_number_setting::application::repository::ContactNumberSettingRepository;
    use dialbook_contact_number_setting::domain::commands::{
        AddContactNumberType, ContactNumberSettingCommand, DisableContactNumberType,
    };
    use dialbook_core::aggregate::AggregateId;
    use dialbook_core::event::{EventMetaData, EventType};
    use dialbook_core::repository::EventRepository;
    use dialbook_test_support::InMemoryEventRepository;

    use super::*;
    use crate::domain::aggregates::{
        CONTACT_NUMBER_ALREADY_EXISTS, CONTACT_NUMBER_ALREADY_REMOVED,
        CONTACT_NUMBER_TYPE_DISABLED, CONTACT_NUMBER_TYPE_NOT_FOUND,
    };
    use crate::domain::commands::{AddClientContactNumber, RemoveClientContactNumber};

    struct Fixture {
        log: Arc<InMemoryEventRepository>,
        settings: CommandBus<ContactNumberSettingCommand>,
        clients: CommandBus<ClientContactNumberCommand>,
        repo: Arc<ClientContactNumberRepository>,
    }

    fn fixture() -> Fixture {
        let log = Arc::new(InMemoryEventRepository::new());
        let setting_repo = Arc::new(ContactNumberSettingRepository::new(log.clone()));
        let repo = Arc::new(ClientContactNumberRepository::new(
            log.clone(),
            Arc::clone(&setting_repo),
        ));
        Fixture {
            log,
            settings: setting_bus(setting_repo),
            clients: command_bus(Arc::clone(&repo)),
            repo,
        }
    }

    fn context() -> CommandContext {
        CommandContext::new("corr-1", EventMetaData::system())
    }

    fn add_type(id: &str) -> ContactNumberSettingCommand {
        ContactNumberSettingCommand::AddContactNumberType(AddContactNumberType {
            id: id.into(),
            name: format!("type {id}"),
            order: None,
        })
    }

    fn add_number(id: &str, type_id: &str, number: &str) -> ClientContactNumberCommand {
        ClientContactNumberCommand::AddClientContactNumber {
            client_id: "c1".into(),
            data: AddClientContactNumber {
                id: id.into(),
                type_id: type_id.into(),
                contact_number: number.into(),
            },
        }
    }

    fn remove_number(id: &str) -> ClientContactNumberCommand {
        ClientContactNumberCommand::RemoveClientContactNumber {
            client_id: "c1".into(),
            data: RemoveClientContactNumber { id: id.into() },
        }
    }

    fn client_events(fixture: &Fixture) -> usize {
        fixture
            .log
            .all_events()
            .iter()
            .filter(|e| e.aggregate_id == AggregateId::client_contact_number("c1"))
            .count()
    }

    #[tokio::test]
    async fn test_add_number_with_enabled_type_folds_into_one_number() {
        // Arrange
        let f = fixture();
        f.settings.execute(&add_type("T"), &context()).await.unwrap();

        // Act
        f.clients
            .execute(&add_number("n1", "T", "07700900123"), &context())
            .await
            .unwrap();

        // Assert
        let aggregate = f.repo.get_aggregate("c1", None).await.unwrap();
        let numbers = &aggregate.record().contact_numbers;
        assert_eq!(numbers.len(), 1);
        assert_eq!(numbers[0].type_id, "T");
        assert_eq!(aggregate.last_event_id(), 1);
        let stored = f
            .log
            .load_events(&AggregateId::client_contact_number("c1"), None)
            .await
            .unwrap();
        assert_eq!(stored[0].event_type, EventType::ClientContactNumberAdded);
        assert_eq!(stored[0].data["client_id"], "c1");
    }

    #[tokio::test]
    async fn test_add_number_with_disabled_type_is_rejected() {
        let f = fixture();
        f.settings.execute(&add_type("T"), &context()).await.unwrap();
        f.settings
            .execute(
                &ContactNumberSettingCommand::DisableContactNumberType(DisableContactNumberType {
                    id: "T".into(),
                }),
                &context(),
            )
            .await
            .unwrap();

        let err = f
            .clients
            .execute(&add_number("n1", "T", "07700900123"), &context())
            .await
            .unwrap_err();

        assert!(err.as_validation().unwrap().has_code(CONTACT_NUMBER_TYPE_DISABLED));
        assert_eq!(client_events(&f), 0);
    }

    #[tokio::test]
    async fn test_add_number_with_unknown_type_is_rejected() {
        let f = fixture();

        let err = f
            .clients
            .execute(&add_number("n1", "missing", "07700900123"), &context())
            .await
            .unwrap_err();

        let validation = err.as_validation().unwrap();
        assert!(validation.has_code(CONTACT_NUMBER_TYPE_NOT_FOUND));
        assert_eq!(
            validation.message,
            "Not allowed. Contact number type does not exist"
        );
    }

    #[tokio::test]
    async fn test_duplicate_active_number_is_rejected_but_removed_one_may_be_re_added() {
        let f = fixture();
        f.settings.execute(&add_type("T"), &context()).await.unwrap();
        f.clients
            .execute(&add_number("n1", "T", "07700900123"), &context())
            .await
            .unwrap();

        let err = f
            .clients
            .execute(&add_number("n2", "T", "07700900123"), &context())
            .await
            .unwrap_err();
        assert!(err.as_validation().unwrap().has_code(CONTACT_NUMBER_ALREADY_EXISTS));

        f.clients.execute(&remove_number("n1"), &context()).await.unwrap();
        f.clients
            .execute(&add_number("n2", "T", "07700900123"), &context())
            .await
            .unwrap();
        assert_eq!(client_events(&f), 3);
    }

    #[tokio::test]
    async fn test_remove_twice_is_rejected_as_already_removed() {
        let f = fixture();
        f.settings.execute(&add_type("T"), &context()).await.unwrap();
        f.clients
            .execute(&add_number("N", "T", "07700900123"), &context())
            .await
            .unwrap();

        f.clients.execute(&remove_number("N"), &context()).await.unwrap();
        let aggregate = f.repo.get_aggregate("c1", None).await.unwrap();
        let second = f.clients.execute(&remove_number("N"), &context()).await;

        assert!(aggregate.client_contact_number_id_exists("N"));
        assert!(aggregate.client_contact_number_removed("N"));
        let err = second.unwrap_err();
        assert!(err.as_validation().unwrap().has_code(CONTACT_NUMBER_ALREADY_REMOVED));
        assert_eq!(client_events(&f), 2);
    }

    #[tokio::test]
    async fn test_remove_unknown_number_is_not_found() {
        let f = fixture();

        let result = f.clients.execute(&remove_number("missing"), &context()).await;

        assert!(matches!(result, Err(DomainError::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_clients_have_independent_sequences() {
        let f = fixture();
        f.settings.execute(&add_type("T"), &context()).await.unwrap();
        let other_client = ClientContactNumberCommand::AddClientContactNumber {
            client_id: "c2".into(),
            data: AddClientContactNumber {
                id: "m1".into(),
                type_id: "T".into(),
                contact_number: "07700900999".into(),
            },
        };

        f.clients
            .execute(&add_number("n1", "T", "07700900123"), &context())
            .await
            .unwrap();
        f.clients.execute(&other_client, &context()).await.unwrap();

        let c2 = f.repo.get_aggregate("c2", None).await.unwrap();
        assert_eq!(c2.last_event_id(), 1);
    }
}
