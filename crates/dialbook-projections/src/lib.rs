//! Dialbook Projections — read models kept up to date from the event log.
//!
//! Every pipeline watches the shared change feed and runs each record
//! through a chain of bounded stages: decode the change record, apply it to
//! the read model, persist the resume token. The [`watcher::Watcher`] starts
//! the registered pipelines of one type and drains them on shutdown.

pub mod error;
pub mod memory;
pub mod pg_read_model;
pub mod pipeline;
pub mod pipelines;
pub mod read_model;
pub mod resume_token;
pub mod transformers;
pub mod watcher;

/// Queue depth of every inter-stage channel.
pub const HIGH_WATER_MARK: usize = 5;
