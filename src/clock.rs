//! Wall-clock access in the board's time zone.
//!
//! The transit feed publishes whole-second epoch timestamps, so "now" is
//! truncated to the second as well; otherwise an arrival exactly `n` minutes
//! out would read as `n - 1` for most of that second.

use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Mutex;

/// Source of the current instant in the target time zone.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
}

/// The real clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().trunc_subsecs(0).with_timezone(&self.tz)
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Tz>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Tz>) -> Self {
        Self {
            now: Mutex::new(now.trunc_subsecs(0)),
        }
    }

    /// Clock pinned to a Unix timestamp, viewed from `tz`.
    pub fn at_timestamp(tz: Tz, secs: i64) -> Option<Self> {
        tz.timestamp_opt(secs, 0).single().map(Self::new)
    }

    pub fn set(&self, now: DateTime<Tz>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now.trunc_subsecs(0);
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl TimeSource for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
