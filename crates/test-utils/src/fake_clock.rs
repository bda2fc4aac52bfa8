use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use stepgraph::clock::Clock;

/// Deterministic clock: the n-th reading is `start + n * interval`.
///
/// Unlike a replay clock it never runs out, which suits property tests with
/// an unknown number of operations.
#[derive(Debug)]
pub struct SteppingClock {
    start: DateTime<Utc>,
    interval: Duration,
    readings: Mutex<i32>,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, interval: Duration) -> Self {
        Self {
            start,
            interval,
            readings: Mutex::new(0),
        }
    }

    /// One-second steps from 2025-01-01T00:00:00Z.
    pub fn per_second() -> Self {
        let start = Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .expect("valid start time");
        Self::new(start, Duration::seconds(1))
    }

    /// How many times `now` has been called.
    pub fn readings(&self) -> usize {
        *self.readings.lock().unwrap() as usize
    }

    /// The timestamp the n-th reading (0-based) yields.
    pub fn reading_at(&self, n: i32) -> DateTime<Utc> {
        self.start + self.interval * n
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut readings = self.readings.lock().unwrap();
        let ts = self.start + self.interval * *readings;
        *readings += 1;
        ts
    }
}
