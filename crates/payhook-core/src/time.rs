//! Clock abstraction for receipt timestamps and timing measurements.
//!
//! PostgreSQL stamps `received_at` itself; the in-memory store and the
//! health checks read time through this trait so tests can control it.

use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};

/// Clock abstraction for time operations.
///
/// Production code uses `RealClock`; tests inject `TestClock`.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns the current instant for duration measurements.
    fn now(&self) -> Instant;

    /// Returns the current wall-clock time in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Real clock implementation using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates a new real clock instance.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock for deterministic time control.
///
/// Wall-clock time only moves when `advance` or `jump_to` is called. Clones
/// share the same underlying time.
#[derive(Debug, Clone)]
pub struct TestClock {
    /// Wall-clock time as microseconds since the UNIX epoch
    utc_micros: Arc<AtomicI64>,
    /// Monotonic offset in microseconds from `base_instant`
    monotonic_micros: Arc<AtomicI64>,
    base_instant: Instant,
}

impl TestClock {
    /// Creates a new test clock starting at the current time.
    pub fn new() -> Self {
        Self::with_start_time(Utc::now())
    }

    /// Creates a test clock starting at a specific time.
    pub fn with_start_time(start: DateTime<Utc>) -> Self {
        Self {
            utc_micros: Arc::new(AtomicI64::new(start.timestamp_micros())),
            monotonic_micros: Arc::new(AtomicI64::new(0)),
            base_instant: Instant::now(),
        }
    }

    /// Advances the clock by the specified duration.
    pub fn advance(&self, duration: Duration) {
        let micros = i64::try_from(duration.as_micros()).unwrap_or(i64::MAX);
        self.utc_micros.fetch_add(micros, Ordering::AcqRel);
        self.monotonic_micros.fetch_add(micros, Ordering::AcqRel);
    }

    /// Jumps wall-clock time to a specific point. Monotonic time is unaffected.
    pub fn jump_to(&self, time: DateTime<Utc>) {
        self.utc_micros.store(time.timestamp_micros(), Ordering::Release);
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        let offset = self.monotonic_micros.load(Ordering::Acquire);
        self.base_instant + Duration::from_micros(u64::try_from(offset).unwrap_or(0))
    }

    fn now_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(self.utc_micros.load(Ordering::Acquire))
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_clock_only_moves_when_advanced() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let clock = TestClock::with_start_time(start);

        assert_eq!(clock.now_utc(), start);
        assert_eq!(clock.now_utc(), start);

        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now_utc(), start + chrono::Duration::seconds(90));
    }

    #[test]
    fn clones_share_time() {
        let clock = TestClock::new();
        let other = clock.clone();
        let before = other.now_utc();

        clock.advance(Duration::from_millis(5));

        assert_eq!(other.now_utc() - before, chrono::Duration::milliseconds(5));
    }

    #[test]
    fn monotonic_time_tracks_advance() {
        let clock = TestClock::new();
        let start = clock.now();
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now().duration_since(start), Duration::from_secs(2));
    }

    #[test]
    fn jump_to_sets_wall_clock() {
        let clock = TestClock::new();
        let target = Utc.with_ymd_and_hms(2030, 6, 1, 8, 30, 0).unwrap();
        clock.jump_to(target);
        assert_eq!(clock.now_utc(), target);
    }
}
