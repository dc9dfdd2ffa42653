//! Monotonic, clock-seeded id generation.

use std::sync::atomic::{AtomicI64, Ordering};

use time::OffsetDateTime;

use super::TodoId;

/// Hands out strictly increasing, strictly positive ids.
///
/// Each id is the current Unix time in nanoseconds, bumped past the previous
/// id when the clock is coarse, stalled, or stepped backwards.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    /// Create a generator with no ids issued yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator whose ids are all greater than `floor`.
    pub fn starting_after(floor: TodoId) -> Self {
        Self {
            last: AtomicI64::new(floor.max(0)),
        }
    }

    /// Issue the next id, or `None` once `i64::MAX` has been handed out.
    pub fn next_id(&self) -> Option<TodoId> {
        let now = clock_nanos();
        let advance = |last: i64| last.checked_add(1).map(|next| now.max(next));

        self.last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, advance)
            .ok()
            .and_then(advance)
    }

    /// Last id issued (or the seed floor).
    pub fn last_id(&self) -> TodoId {
        self.last.load(Ordering::Acquire)
    }
}

fn clock_nanos() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    nanos.clamp(1, i64::MAX as i128) as i64
}
