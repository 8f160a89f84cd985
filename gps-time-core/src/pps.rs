//! pulse-per-second tracking.
//!
//! the interrupt handler and the main loop share one atomic timestamp. no locks, no allocation.
use embassy_time::{Duration, Instant};
use portable_atomic::{AtomicU64, Ordering};

pub struct PpsMonitor {
    /// embassy ticks of the most recent rising edge
    last_pulse_ticks: AtomicU64,
}

impl Default for PpsMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PpsMonitor {
    /// const so this can live in a `static` next to the interrupt handler
    pub const fn new() -> Self {
        Self {
            last_pulse_ticks: AtomicU64::new(0),
        }
    }

    /// pretend a pulse just happened. called once at startup so "since last pulse" starts at zero
    pub fn start(&self, now: Instant) {
        self.last_pulse_ticks.store(now.as_ticks(), Ordering::Release);
    }

    /// call this from the rising edge interrupt
    pub fn on_rising_edge(&self) {
        self.record_edge(Instant::now());
    }

    /// the recorded time never goes backwards, even if edges are reported out of order
    pub fn record_edge(&self, at: Instant) {
        self.last_pulse_ticks.fetch_max(at.as_ticks(), Ordering::AcqRel);
    }

    pub fn last_pulse(&self) -> Instant {
        Instant::from_ticks(self.last_pulse_ticks.load(Ordering::Acquire))
    }

    pub fn since_last_pulse(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_pulse())
    }

    /// true while the last pulse is younger than `timeout`. the boundary itself counts as lost
    pub fn is_synced(&self, now: Instant, timeout: Duration) -> bool {
        self.since_last_pulse(now) < timeout
    }
}
