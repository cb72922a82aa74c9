//! Command handlers for the Contact Number Setting aggregate.
//!
//! Every handler loads the aggregate, checks its invariants, numbers the
//! resulting events after the aggregate's last sequence id and saves them.

use std::sync::Arc;

use async_trait::async_trait;
use dialbook_core::command::{Command, CommandBus, CommandContext, CommandHandler, build_events};
use dialbook_core::error::DomainError;

use crate::application::repository::ContactNumberSettingRepository;
use crate::domain::aggregates::ContactNumberSettingAggregate;
use crate::domain::commands::ContactNumberSettingCommand;
use crate::domain::events::{
    ContactNumberSettingEvent, ContactNumberTypeAdded, ContactNumberTypeDisabled,
    ContactNumberTypeEnabled, ContactNumberTypeUpdated,
};

/// Display order used when a new type does not specify one.
pub const DEFAULT_ORDER: i32 = 1;

fn misrouted(handler: &'static str, command: &ContactNumberSettingCommand) -> DomainError {
    tracing::error!(
        handler,
        command_type = command.command_type(),
        "command routed to the wrong handler"
    );
    DomainError::UnsupportedCommand(command.command_type().to_owned())
}

async fn append(
    repo: &ContactNumberSettingRepository,
    aggregate: &ContactNumberSettingAggregate,
    events: &[ContactNumberSettingEvent],
    context: &CommandContext,
) -> Result<(), DomainError> {
    let records = build_events(aggregate.id(), aggregate.last_event_id(), events, context)?;
    repo.save(&records).await?;
    Ok(())
}

/// Handles `AddContactNumberTypeCommand`: emits `ContactNumberTypeAdded`
/// followed by `ContactNumberTypeEnabled`.
#[derive(Debug, Clone)]
pub struct AddContactNumberTypeCommandHandler {
    repo: Arc<ContactNumberSettingRepository>,
}

impl AddContactNumberTypeCommandHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(repo: Arc<ContactNumberSettingRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CommandHandler<ContactNumberSettingCommand> for AddContactNumberTypeCommandHandler {
    fn command_type(&self) -> &'static str {
        "AddContactNumberTypeCommand"
    }

    async fn execute(
        &self,
        command: &ContactNumberSettingCommand,
        context: &CommandContext,
    ) -> Result<(), DomainError> {
        let ContactNumberSettingCommand::AddContactNumberType(data) = command else {
            return Err(misrouted("AddContactNumberTypeCommandHandler", command));
        };

        let aggregate = self.repo.get_aggregate(None).await?;
        aggregate.validate_add_contact_number_type(data)?;

        let events = [
            ContactNumberSettingEvent::Added(ContactNumberTypeAdded {
                id: data.id.clone(),
                name: data.name.clone(),
                order: data.order.unwrap_or(DEFAULT_ORDER),
            }),
            ContactNumberSettingEvent::Enabled(ContactNumberTypeEnabled {
                id: data.id.clone(),
            }),
        ];
        append(&self.repo, &aggregate, &events, context).await
    }
}

/// Handles `UpdateContactNumberTypeCommand`.
#[derive(Debug, Clone)]
pub struct UpdateContactNumberTypeCommandHandler {
    repo: Arc<ContactNumberSettingRepository>,
}

impl UpdateContactNumberTypeCommandHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(repo: Arc<ContactNumberSettingRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CommandHandler<ContactNumberSettingCommand> for UpdateContactNumberTypeCommandHandler {
    fn command_type(&self) -> &'static str {
        "UpdateContactNumberTypeCommand"
    }

    async fn execute(
        &self,
        command: &ContactNumberSettingCommand,
        context: &CommandContext,
    ) -> Result<(), DomainError> {
        let ContactNumberSettingCommand::UpdateContactNumberType(data) = command else {
            return Err(misrouted("UpdateContactNumberTypeCommandHandler", command));
        };

        let aggregate = self.repo.get_aggregate(None).await?;
        aggregate.validate_update_contact_number_type(data)?;

        let events = [ContactNumberSettingEvent::Updated(ContactNumberTypeUpdated {
            id: data.id.clone(),
            name: data.name.clone(),
            order: data.order,
        })];
        append(&self.repo, &aggregate, &events, context).await
    }
}

/// Handles `EnableContactNumberTypeCommand`; a no-op for enabled types.
#[derive(Debug, Clone)]
pub struct EnableContactNumberTypeCommandHandler {
    repo: Arc<ContactNumberSettingRepository>,
}

impl EnableContactNumberTypeCommandHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(repo: Arc<ContactNumberSettingRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CommandHandler<ContactNumberSettingCommand> for EnableContactNumberTypeCommandHandler {
    fn command_type(&self) -> &'static str {
        "EnableContactNumberTypeCommand"
    }

    async fn execute(
        &self,
        command: &ContactNumberSettingCommand,
        context: &CommandContext,
    ) -> Result<(), DomainError> {
        let ContactNumberSettingCommand::EnableContactNumberType(data) = command else {
            return Err(misrouted("EnableContactNumberTypeCommandHandler", command));
        };

        let aggregate = self.repo.get_aggregate(None).await?;
        if !aggregate.can_enable_contact_number_type(&data.id)? {
            tracing::debug!(type_id = %data.id, "contact number type already enabled");
            return Ok(());
        }

        let events = [ContactNumberSettingEvent::Enabled(ContactNumberTypeEnabled {
            id: data.id.clone(),
        })];
        append(&self.repo, &aggregate, &events, context).await
    }
}

/// Handles `DisableContactNumberTypeCommand`; a no-op for disabled types.
#[derive(Debug, Clone)]
pub struct DisableContactNumberTypeCommandHandler {
    repo: Arc<ContactNumberSettingRepository>,
}

impl DisableContactNumberTypeCommandHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(repo: Arc<ContactNumberSettingRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CommandHandler<ContactNumberSettingCommand> for DisableContactNumberTypeCommandHandler {
    fn command_type(&self) -> &'static str {
        "DisableContactNumberTypeCommand"
    }

    async fn execute(
        &self,
        command: &ContactNumberSettingCommand,
        context: &CommandContext,
    ) -> Result<(), DomainError> {
        let ContactNumberSettingCommand::DisableContactNumberType(data) = command else {
            return Err(misrouted("DisableContactNumberTypeCommandHandler", command));
        };

        let aggregate = self.repo.get_aggregate(None).await?;
        if !aggregate.can_disable_contact_number_type(&data.id)? {
            tracing::debug!(type_id = %data.id, "contact number type already disabled");
            return Ok(());
        }

        let events = [ContactNumberSettingEvent::Disabled(ContactNumberTypeDisabled {
            id: data.id.clone(),
        })];
        append(&self.repo, &aggregate, &events, context).await
    }
}

/// Builds the command bus with one handler per contact number setting command.
#[must_use]
pub fn command_bus(
    repo: Arc<ContactNumberSettingRepository>,
) -> CommandBus<ContactNumberSettingCommand> {
    CommandBus::new()
        .add_handler(AddContactNumberTypeCommandHandler::new(Arc::clone(&repo)))
        .add_handler(UpdateContactNumberTypeCommandHandler::new(Arc::clone(&repo)))
        .add_handler(EnableContactNumberTypeCommandHandler::new(Arc::clone(&repo)))
        .add_handler(DisableContactNumberTypeCommandHandler::new(repo))
}

#[cfg(test)]
mod tests {
    use dialbook_core::aggregate::AggregateId;
    use dialbook_core::event::{EventMetaData, EventType};
    use dialbook_core::repository::EventRepository;
    use dialbook_core::event::{NewEvent, StoredEvent};
    use dialbook_test_support::{
        EmptyEventRepository, FailingEventRepository, InMemoryEventRepository,
        RecordingEventRepository, fixed_time,
    };
    use serde_json::json;

    use super::*;
    use crate::domain::aggregates::{ContactNumberTypeStatus, DUPLICATE_NAME};
    use crate::domain::commands::{
        AddContactNumberType, DisableContactNumberType, EnableContactNumberType,
        UpdateContactNumberType,
    };

    fn setup() -> (
        Arc<InMemoryEventRepository>,
        CommandBus<ContactNumberSettingCommand>,
        Arc<ContactNumberSettingRepository>,
    ) {
        let log = Arc::new(InMemoryEventRepository::new());
        let repo = Arc::new(ContactNumberSettingRepository::new(log.clone()));
        (log, command_bus(Arc::clone(&repo)), repo)
    }

    fn context() -> CommandContext {
        CommandContext::new("corr-1", EventMetaData::system())
    }

    fn add(id: &str, name: &str) -> ContactNumberSettingCommand {
        ContactNumberSettingCommand::AddContactNumberType(AddContactNumberType {
            id: id.into(),
            name: name.into(),
            order: None,
        })
    }

    fn enable(id: &str) -> ContactNumberSettingCommand {
        ContactNumberSettingCommand::EnableContactNumberType(EnableContactNumberType {
            id: id.into(),
        })
    }

    fn disable(id: &str) -> ContactNumberSettingCommand {
        ContactNumberSettingCommand::DisableContactNumberType(DisableContactNumberType {
            id: id.into(),
        })
    }

    #[tokio::test]
    async fn test_add_emits_added_then_enabled_with_default_order() {
        // Arrange
        let (log, bus, repo) = setup();

        // Act
        bus.execute(&add("t1", "mobile"), &context()).await.unwrap();

        // Assert
        let events = log.all_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::ContactNumberTypeAdded);
        assert_eq!(events[0].data["order"], DEFAULT_ORDER);
        assert_eq!(events[0].aggregate_id, AggregateId::contact_number_setting());
        assert_eq!(events[1].event_type, EventType::ContactNumberTypeEnabled);
        assert_eq!(
            events.iter().map(|e| e.sequence_id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        let aggregate = repo.get_aggregate(None).await.unwrap();
        assert!(aggregate.contact_number_type_enabled("t1"));
    }

    #[tokio::test]
    async fn test_add_duplicate_name_is_rejected_without_side_effects() {
        let (log, bus, _) = setup();
        bus.execute(&add("t1", "mobile"), &context()).await.unwrap();

        let result = bus.execute(&add("t2", "Mobile "), &context()).await;

        let err = result.unwrap_err();
        assert!(err.as_validation().unwrap().has_code(DUPLICATE_NAME));
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_enable_already_enabled_type_is_a_silent_no_op() {
        let (log, bus, _) = setup();
        bus.execute(&add("t1", "mobile"), &context()).await.unwrap();

        bus.execute(&enable("t1"), &context()).await.unwrap();

        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_disable_twice_appends_once() {
        let (log, bus, repo) = setup();
        bus.execute(&add("t1", "mobile"), &context()).await.unwrap();

        bus.execute(&disable("t1"), &context()).await.unwrap();
        bus.execute(&disable("t1"), &context()).await.unwrap();

        assert_eq!(log.len(), 3);
        let aggregate = repo.get_aggregate(None).await.unwrap();
        assert_eq!(
            aggregate.get_contact_number_type("t1").unwrap().status,
            Some(ContactNumberTypeStatus::Disabled)
        );
    }

    #[tokio::test]
    async fn test_enable_unknown_type_is_not_found() {
        let (log, bus, _) = setup();

        let result = bus.execute(&enable("missing"), &context()).await;

        assert!(matches!(result, Err(DomainError::ResourceNotFound(_))));
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_sequence_ids_continue_from_last_event() {
        let (log, bus, _) = setup();

        bus.execute(&add("t1", "mobile"), &context()).await.unwrap();
        bus.execute(&disable("t1"), &context()).await.unwrap();
        bus.execute(&add("t2", "home"), &context()).await.unwrap();
        bus.execute(
            &ContactNumberSettingCommand::UpdateContactNumberType(UpdateContactNumberType {
                id: "t2".into(),
                name: None,
                order: Some(4),
            }),
            &context(),
        )
        .await
        .unwrap();

        let sequence: Vec<i64> = log
            .load_events(&AggregateId::contact_number_setting(), None)
            .await
            .unwrap()
            .iter()
            .map(|e| e.sequence_id)
            .collect();
        assert_eq!(sequence, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_get_aggregate_as_of_sequence_id() {
        let (_, bus, repo) = setup();
        bus.execute(&add("t1", "mobile"), &context()).await.unwrap();
        bus.execute(&disable("t1"), &context()).await.unwrap();

        let before_disable = repo.get_aggregate(Some(2)).await.unwrap();

        assert_eq!(before_disable.last_event_id(), 2);
        assert!(before_disable.contact_number_type_enabled("t1"));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let repo = Arc::new(ContactNumberSettingRepository::new(Arc::new(FailingEventRepository)));
        let bus = command_bus(repo);

        let result = bus.execute(&add("t1", "mobile"), &context()).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    fn history_event(
        event_type: EventType,
        data: serde_json::Value,
        sequence_id: i64,
    ) -> StoredEvent {
        let event = NewEvent::new(
            event_type,
            AggregateId::contact_number_setting(),
            &data,
            sequence_id,
            EventMetaData::system(),
            "corr-0",
        )
        .unwrap();
        StoredEvent::from_new(event, sequence_id, fixed_time())
    }

    #[tokio::test]
    async fn test_add_saves_added_and_enabled_in_one_batch() {
        // Arrange
        let history = vec![
            history_event(
                EventType::ContactNumberTypeAdded,
                json!({"_id": "t1", "name": "mobile", "order": 1}),
                1,
            ),
            history_event(EventType::ContactNumberTypeEnabled, json!({"_id": "t1"}), 2),
        ];
        let recorder = Arc::new(RecordingEventRepository::new(history));
        let bus = command_bus(Arc::new(ContactNumberSettingRepository::new(recorder.clone())));

        // Act
        bus.execute(&add("t2", "home"), &context()).await.unwrap();

        // Assert
        let batches = recorder.saved_batches();
        assert_eq!(batches.len(), 1);
        let saved = recorder.saved_events();
        assert_eq!(
            saved.iter().map(|e| (e.event_type, e.sequence_id)).collect::<Vec<_>>(),
            vec![
                (EventType::ContactNumberTypeAdded, 3),
                (EventType::ContactNumberTypeEnabled, 4),
            ]
        );
        assert_eq!(saved[0].data, json!({"_id": "t2", "name": "home", "order": DEFAULT_ORDER}));
        assert!(saved.iter().all(|e| e.correlation_id == "corr-1"));
    }

    #[tokio::test]
    async fn test_update_on_empty_aggregate_is_not_found() {
        let repo = Arc::new(ContactNumberSettingRepository::new(Arc::new(EmptyEventRepository)));
        let bus = command_bus(repo);

        let result = bus
            .execute(
                &ContactNumberSettingCommand::UpdateContactNumberType(UpdateContactNumberType {
                    id: "t1".into(),
                    name: Some("cell".into()),
                    order: None,
                }),
                &context(),
            )
            .await;

        assert!(matches!(result, Err(DomainError::ResourceNotFound(_))));
    }
}
