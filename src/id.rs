//! Time-derived task id allocation.
//!
//! Ids are milliseconds since the Unix epoch at creation time, bumped past
//! the previously issued id whenever the clock has not advanced (two adds in
//! the same tick) or has gone backwards. Once `i64::MAX` has been issued or
//! observed the id space is spent and no further ids are handed out.

use std::time::SystemTime;

use crate::task::TaskId;

/// Source of the current time in milliseconds since the Unix epoch.
pub type Clock = fn() -> i64;

/// Reads the wall clock. A clock set before the epoch reads as `0`; the
/// generator's monotonic floor keeps ids unique regardless.
pub fn system_clock() -> i64 {
    SystemTime::UNIX_EPOCH
        .elapsed()
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Issues strictly increasing [`TaskId`]s.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    clock: Clock,
    last: Option<i64>,
}

impl IdGenerator {
    /// Create a generator reading from `clock`.
    pub fn new(clock: Clock) -> Self {
        Self { clock, last: None }
    }

    /// Issue the next id: the clock reading, or one past the last issued
    /// (or observed) id if the clock has not moved beyond it.
    ///
    /// Returns `None` when the last id is `i64::MAX`, leaving nothing above
    /// it to hand out.
    pub fn next_id(&mut self) -> Option<TaskId> {
        let now = (self.clock)();
        let id = match self.last {
            Some(last) if now <= last => last.checked_add(1)?,
            _ => now,
        };
        self.last = Some(id);
        Some(TaskId(id))
    }

    /// Record an id that already exists (e.g. restored from storage) so it
    /// is never issued again.
    pub fn observe(&mut self, id: TaskId) {
        self.last = Some(self.last.map_or(id.0, |last| last.max(id.0)));
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(system_clock)
    }
}
