//! GPS time and fix acquisition.
//!
//! serial bytes -> [`nmea::NmeaDecoder`] -> [`fix::FixStore`]
//! pulse edge   -> [`pps::PpsMonitor`]
//! request      -> [`dispatch::RequestDispatcher`] -> [`status::StatusReport`] -> response bytes
//!
//! [`scheduler::Scheduler`] gives each of these a bounded turn every iteration.
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod fix;
pub mod logging;
pub mod loop_rate;
pub mod nmea;
pub mod pmtk;
pub mod pps;
pub mod scheduler;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use dispatch::{RequestDispatcher, Transport};
pub use errors::{GpsTimeError, GpsTimeResult};
pub use fix::{Coordinate, DateTime, Fix, FixStore};
pub use nmea::{NmeaDecoder, Sentence, SentenceResult};
pub use pps::PpsMonitor;
pub use scheduler::{PollSummary, Scheduler};
pub use status::StatusReport;
