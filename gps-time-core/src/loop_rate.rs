use embassy_time::{Duration, Instant};

use crate::logging::debug;

/// scheduler iterations per second. logged once a second so a stalled loop is obvious
pub struct LoopRate {
    last: Instant,
    count: u64,
}

impl LoopRate {
    pub fn new(now: Instant) -> Self {
        Self {
            last: now,
            count: 0,
        }
    }

    /// returns the rate each time a full second has gone by
    pub fn tick(&mut self, now: Instant) -> Option<u64> {
        self.count += 1;

        let elapsed = now.saturating_duration_since(self.last);

        if elapsed < Duration::from_secs(1) {
            return None;
        }

        let rate = self.count * 1_000u64 / elapsed.as_millis();

        self.count = 0;
        self.last = now;

        debug!("loops/s: {}", rate);

        Some(rate)
    }
}
