//! Clock source for the board.
//!
//! Every evaluation reads `now` through a [`Clock`] so tests can pin or
//! advance time without touching the system clock.

use std::sync::Mutex;
use time::{Duration, OffsetDateTime, UtcOffset};

pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current instant, expressed in the board's local offset.
    fn now(&self) -> OffsetDateTime;

    fn offset(&self) -> UtcOffset {
        self.now().offset()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }

    /// Detect the host's local offset. Only reliable while the process is
    /// still single-threaded, so call this before spawning any tasks.
    pub fn local() -> Self {
        match UtcOffset::current_local_offset() {
            Ok(offset) => Self { offset },
            Err(err) => {
                tracing::warn!(error = %err, "Could not determine local UTC offset, using UTC");
                Self {
                    offset: UtcOffset::UTC,
                }
            }
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }

    fn offset(&self) -> UtcOffset {
        self.offset
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
