//! Application services: repository, command handlers and the command bus.

pub mod command_handlers;
pub mod repository;
