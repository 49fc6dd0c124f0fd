//! Clock and identifier sources

use chrono::{DateTime, Utc};
use std::sync::{Mutex, PoisonError};

/// Source of timestamps for session mutations
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock that never hands out a timestamp earlier than the last one,
/// even if the system clock steps backwards.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let wall = Utc::now();
        let now = match *last {
            Some(prev) if prev > wall => prev,
            _ => wall,
        };
        *last = Some(now);
        now
    }
}

/// Fresh unique identifier for sessions and turns
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
