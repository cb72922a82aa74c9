//! Domain model of the client contact number aggregate.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod write_projection;
