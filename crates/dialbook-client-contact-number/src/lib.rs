//! dialbook — Client Contact Number aggregate.
//!
//! One aggregate per client holding that client's contact numbers. Adding a
//! number reads the contact number setting aggregate to check the referenced
//! type.

pub mod application;
pub mod domain;
