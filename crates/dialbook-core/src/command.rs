//! Command abstractions and the command bus.

use async_trait::async_trait;
use serde::Serialize;

use crate::aggregate::AggregateId;
use crate::error::DomainError;
use crate::event::{EventMetaData, EventType, NewEvent};

/// Number of times a command is attempted when its append loses a sequence
/// id race against a concurrent writer.
pub const MAX_COMMAND_ATTEMPTS: u32 = 3;

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;
}

/// Caller information stamped onto every event a command produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    /// Correlation id to trace this command through the system.
    pub correlation_id: String,
    /// Audit metadata of the caller.
    pub meta_data: EventMetaData,
}

impl CommandContext {
    /// Creates a context for `correlation_id` with caller `meta_data`.
    #[must_use]
    pub fn new(correlation_id: impl Into<String>, meta_data: EventMetaData) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            meta_data,
        }
    }
}

/// A typed event of one aggregate, ready to be appended.
///
/// Serializing the value yields the event's `data` payload.
pub trait AggregateEvent: Serialize {
    /// The log event type of this value.
    fn event_type(&self) -> EventType;
}

/// Builds the records for `events`, numbering them `last_sequence_id + 1`,
/// `+ 2`, ... in the given order.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if a payload cannot be serialized.
pub fn build_events<E: AggregateEvent>(
    aggregate_id: &AggregateId,
    last_sequence_id: i64,
    events: &[E],
    context: &CommandContext,
) -> Result<Vec<NewEvent>, DomainError> {
    events
        .iter()
        .zip(last_sequence_id + 1..)
        .map(|(event, sequence_id)| {
            NewEvent::new(
                event.event_type(),
                aggregate_id.clone(),
                event,
                sequence_id,
                context.meta_data.clone(),
                context.correlation_id.clone(),
            )
        })
        .collect()
}

/// Handles exactly one command type.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    /// The command type this handler is routed for.
    fn command_type(&self) -> &'static str;

    /// Loads the aggregate, checks invariants and appends the resulting
    /// events. Returns without side effects when an invariant fails.
    async fn execute(&self, command: &C, context: &CommandContext) -> Result<(), DomainError>;
}

/// Routes a command to the handler registered for its type.
pub struct CommandBus<C: Command> {
    handlers: Vec<Box<dyn CommandHandler<C>>>,
}

impl<C: Command> Default for CommandBus<C> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<C: Command> std::fmt::Debug for CommandBus<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBus")
            .field(
                "handlers",
                &self
                    .handlers
                    .iter()
                    .map(|h| h.command_type())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<C: Command> CommandBus<C> {
    /// Creates an empty command bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. The first handler registered for a command type
    /// is the one that receives it.
    #[must_use]
    pub fn add_handler(mut self, handler: impl CommandHandler<C> + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Executes the command through its registered handler.
    ///
    /// A handler that fails with [`DomainError::ConcurrencyConflict`] is run
    /// again from scratch, up to [`MAX_COMMAND_ATTEMPTS`] times in total.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnsupportedCommand` if no handler matches, and
    /// otherwise whatever the handler returns.
    pub async fn execute(&self, command: &C, context: &CommandContext) -> Result<(), DomainError> {
        let command_type = command.command_type();
        let Some(handler) = self
            .handlers
            .iter()
            .find(|handler| handler.command_type() == command_type)
        else {
            tracing::error!(command_type, "no handler registered for command type");
            return Err(DomainError::UnsupportedCommand(command_type.to_owned()));
        };

        let mut attempt = 1;
        loop {
            match handler.execute(command, context).await {
                Err(DomainError::ConcurrencyConflict {
                    aggregate_id,
                    sequence_id,
                }) if attempt < MAX_COMMAND_ATTEMPTS => {
                    tracing::warn!(
                        command_type,
                        aggregate_id = %aggregate_id,
                        sequence_id,
                        attempt,
                        correlation_id = %context.correlation_id,
                        "sequence id taken by a concurrent writer, retrying command"
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
