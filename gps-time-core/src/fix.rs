//! the most recent position and time we believe.
use core::fmt;

use embassy_time::{Duration, Instant};

use crate::logging::{debug, trace};
use crate::nmea::fields::{UtcDate, UtcTime};
use crate::nmea::{Gga, Rmc, Sentence};

/// signed decimal degrees. north and east are positive
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
}

impl DateTime {
    pub fn new(date: UtcDate, time: UtcTime) -> Self {
        Self {
            year: date.year,
            month: date.month,
            day: date.day,
            hour: time.hour,
            minute: time.minute,
            second: time.second,
            hundredths: time.hundredths,
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.hundredths
        )
    }
}

/// everything in here came from the same RMC sentence. satellites are from the GGA just before it
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fix {
    pub position: Coordinate,
    pub datetime: DateTime,
    pub speed_kmh: Option<f32>,
    pub course_deg: Option<f32>,
    pub satellites: Option<u8>,
    pub updated_at: Instant,
}

impl Fix {
    /// `None` unless the receiver says it is active and every required field is there
    pub fn from_rmc(rmc: &Rmc, satellites: Option<u8>, now: Instant) -> Option<Self> {
        if !rmc.active {
            return None;
        }

        Some(Self {
            position: rmc.position?,
            datetime: DateTime::new(rmc.date?, rmc.time?),
            speed_kmh: rmc.speed_kmh,
            course_deg: rmc.course_deg,
            satellites,
            updated_at: now,
        })
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.updated_at)
    }
}

/// holds `None` until the first good RMC. never goes back to `None`
#[derive(Debug, Default)]
pub struct FixStore {
    current: Option<Fix>,
    /// from the last GGA. used by the next RMC instead of patching the current fix
    satellites: Option<u8>,
}

impl FixStore {
    pub const fn new() -> Self {
        Self {
            current: None,
            satellites: None,
        }
    }

    pub fn current(&self) -> Option<&Fix> {
        self.current.as_ref()
    }

    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.current.as_ref().map(|x| x.age(now))
    }

    /// returns true if the fix was replaced
    pub fn apply(&mut self, sentence: &Sentence, now: Instant) -> bool {
        match sentence {
            Sentence::Rmc(rmc) => self.apply_rmc(rmc, now),
            Sentence::Gga(gga) => {
                self.apply_gga(gga);
                false
            }
            Sentence::Other(_) => false,
        }
    }

    fn apply_rmc(&mut self, rmc: &Rmc, now: Instant) -> bool {
        // the receiver sends GGA before RMC. each RMC closes out the epoch
        let satellites = self.satellites.take();

        let Some(fix) = Fix::from_rmc(rmc, satellites, now) else {
            trace!("rmc without a usable fix. keeping the old one");
            return false;
        };

        if self.current.is_none() {
            debug!("first fix: {:?}", fix.position);
        } else {
            trace!("fix replaced: {:?}", fix.position);
        }

        // wholesale. readers never see half of one sentence and half of another
        self.current = Some(fix);

        true
    }

    fn apply_gga(&mut self, gga: &Gga) {
        // quality 0 means the count isn't meaningful
        self.satellites = match gga.quality {
            Some(0) => None,
            _ => gga.satellites,
        };
    }
}
