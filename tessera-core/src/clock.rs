use chrono::{DateTime, Utc};

/// Source of wall-clock time for cache expiry decisions.
///
/// Guards measure elapsed time with the runtime's monotonic clock; only
/// calendar-aware logic (TTL boundaries, persisted timestamps) goes through
/// this trait, so tests can pin it.
pub trait Clock: Send + Sync + core::fmt::Debug {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
