//! Shared test mocks and utilities for the dialbook event-sourcing engine.

mod clock;
mod repository;
mod resume_token;

pub use clock::{FixedClock, fixed_time};
pub use repository::{
    EmptyEventRepository, FailingEventRepository, InMemoryEventRepository,
    RecordingEventRepository,
};
pub use resume_token::InMemoryResumeTokenRepository;
