// src/clock/replay.rs

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::Clock;
use crate::types::Timestamp;

/// Clock that yields a pre-recorded sequence of timestamps, one per reading.
///
/// Once the recording is exhausted the last yielded value is repeated, so a
/// replay that runs longer than the recording stays deterministic.
#[derive(Debug)]
pub struct ReplayClock {
    inner: Mutex<ReplayState>,
}

#[derive(Debug)]
struct ReplayState {
    pending: VecDeque<Timestamp>,
    last: Timestamp,
}

impl ReplayClock {
    pub fn new(recorded: impl IntoIterator<Item = Timestamp>) -> Self {
        Self {
            inner: Mutex::new(ReplayState {
                pending: recorded.into_iter().collect(),
                last: DateTime::<Utc>::UNIX_EPOCH,
            }),
        }
    }

    /// Number of recorded timestamps not yet handed out.
    pub fn remaining(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pending
            .len()
    }
}

impl Clock for ReplayClock {
    fn now(&self) -> Timestamp {
        let mut state = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match state.pending.pop_front() {
            Some(ts) => {
                state.last = ts;
                ts
            }
            None => {
                warn!(last = %state.last, "replay clock exhausted; repeating last timestamp");
                state.last
            }
        }
    }
}
