//! Time source for event and read model timestamps.

use chrono::{DateTime, Utc};

/// Supplies `created_at`/`updated_at` stamps. The `PostgreSQL` adapters
/// stamp rows with the database clock; in-memory stores take one of these
/// so their timestamps can be pinned in tests.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock of the host.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_does_not_go_backwards() {
        let first = SystemClock.now();
        let second = SystemClock.now();

        assert!(second >= first);
    }
}
