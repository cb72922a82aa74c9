//! dialbook — Contact Number Setting aggregate.
//!
//! A single, process-wide aggregate holding every contact number type
//! (e.g. "mobile", "home") with its display order and enabled status.

pub mod application;
pub mod domain;
