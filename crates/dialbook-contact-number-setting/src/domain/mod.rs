//! Domain model of the contact number setting aggregate.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod write_projection;
