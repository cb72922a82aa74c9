//! Dialbook Core — shared event-sourcing abstractions.
//!
//! This crate defines the event record, the event repository seam, the
//! left-fold reconstruction engine, the change feed seam and the command bus
//! that the aggregate and projection crates build on. It contains no
//! infrastructure code.

pub mod aggregate;
pub mod changes;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod repository;
