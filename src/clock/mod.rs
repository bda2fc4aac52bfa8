// src/clock/mod.rs

//! Time source abstraction.
//!
//! The graph never reads the system clock itself. Every operation that stamps
//! a timestamp takes a `&dyn Clock`, so a host replaying recorded events can
//! hand in the recorded times and get bit-identical results.

use std::fmt::Debug;

use chrono::Utc;

use crate::types::Timestamp;

pub mod replay;

pub use replay::ReplayClock;

/// Abstract time source.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Timestamp;
}

/// Wall-clock implementation backed by `chrono::Utc::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}
