//! the human readable status page.
//!
//! a snapshot is captured first and then formatted. formatting never touches live state.
use core::fmt::{self, Write as _};

use embassy_time::{Duration, Instant};

use crate::errors::{GpsTimeError, GpsTimeResult};
use crate::fix::{Fix, FixStore};
use crate::pps::PpsMonitor;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub fix: Option<Fix>,
    pub fix_age: Option<Duration>,
    pub uptime: Duration,
    pub since_pulse: Duration,
    pub synced: bool,
}

impl StatusReport {
    pub fn capture(
        fixes: &FixStore,
        pps: &PpsMonitor,
        started_at: Instant,
        now: Instant,
        pps_timeout: Duration,
    ) -> Self {
        Self {
            fix: fixes.current().copied(),
            fix_age: fixes.age(now),
            uptime: now.saturating_duration_since(started_at),
            since_pulse: pps.since_last_pulse(now),
            synced: pps.is_synced(now, pps_timeout),
        }
    }

    pub fn render<const N: usize>(&self) -> GpsTimeResult<heapless::String<N>> {
        let mut out = heapless::String::new();

        write!(out, "{}", self).map_err(|_| GpsTimeError::BufferFull)?;

        Ok(out)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fix = self.fix.as_ref();

        writeln!(f, "UTC: {}", Unknown(fix.map(|x| x.datetime)))?;
        writeln!(
            f,
            "Lat: {}",
            Unknown(fix.map(|x| Dms::latitude(x.position.latitude)))
        )?;
        writeln!(
            f,
            "Lon: {}",
            Unknown(fix.map(|x| Dms::longitude(x.position.longitude)))
        )?;
        writeln!(f, "Speed: {} km/h", Unknown(fix.and_then(|x| x.speed_kmh).map(TwoPlaces)))?;
        writeln!(f, "Course: {} deg", Unknown(fix.and_then(|x| x.course_deg).map(TwoPlaces)))?;
        writeln!(f, "Satellites: {}", fix.and_then(|x| x.satellites).unwrap_or(0))?;
        writeln!(f, "Fix age: {}", Unknown(self.fix_age.map(Elapsed)))?;
        writeln!(f, "Running: {}", Elapsed(self.uptime))?;
        writeln!(f, "Since PPS: {}", Elapsed(self.since_pulse))?;
        writeln!(f, "Synced: {}", if self.synced { "yes" } else { "no" })
    }
}

/// `--` for anything we don't have yet
struct Unknown<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for Unknown<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(x) => fmt::Display::fmt(x, f),
            None => f.write_str("--"),
        }
    }
}

struct TwoPlaces(f32);

impl fmt::Display for TwoPlaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// `HH:MM:SS.S`. hours keep counting past 99
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Elapsed(pub Duration);

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.as_millis();
        let secs = millis / 1_000;

        write!(
            f,
            "{:02}:{:02}:{:02}.{}",
            secs / 3_600,
            (secs / 60) % 60,
            secs % 60,
            (millis % 1_000) / 100
        )
    }
}

/// degrees:minutes:seconds.millis with a hemisphere letter instead of a sign
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dms {
    pub degrees: u32,
    pub minutes: u8,
    pub seconds: u8,
    pub millis: u16,
    pub hemisphere: char,
}

impl Dms {
    const MILLIS_PER_DEGREE: u64 = 3_600_000;

    pub fn latitude(degrees: f64) -> Self {
        Self::new(degrees, 'N', 'S')
    }

    pub fn longitude(degrees: f64) -> Self {
        Self::new(degrees, 'E', 'W')
    }

    fn new(degrees: f64, positive: char, negative: char) -> Self {
        let (hemisphere, magnitude) = if degrees < 0.0 {
            (negative, -degrees)
        } else {
            (positive, degrees)
        };

        // milliseconds of arc. rounded here, integer math after
        let total = (magnitude * Self::MILLIS_PER_DEGREE as f64 + 0.5) as u64;

        let degrees = total / Self::MILLIS_PER_DEGREE;
        let rem = total % Self::MILLIS_PER_DEGREE;

        Self {
            degrees: degrees as u32,
            minutes: (rem / 60_000) as u8,
            seconds: ((rem % 60_000) / 1_000) as u8,
            millis: (rem % 1_000) as u16,
            hemisphere,
        }
    }
}

impl fmt::Display for Dms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:02}:{:02}.{:03} {}",
            self.degrees, self.minutes, self.seconds, self.millis, self.hemisphere
        )
    }
}
