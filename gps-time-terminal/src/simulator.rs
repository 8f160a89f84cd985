//! a pretend MediaTek receiver.
//!
//! pulses the pps monitor at the top of every second and then sends GGA + RMC for that second,
//! paced at the uart baud rate. PMTK commands written to the serial port change what it sends.
use std::fs;
use std::path::Path;
use std::thread::sleep;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use gps_time_core::PpsMonitor;
use gps_time_core::nmea::checksum;
use gps_time_core::pmtk::OutputSentences;
use log::{debug, info, trace, warn};

use crate::config::TerminalConfig;

/// start, 8 data bits, stop
const BITS_PER_BYTE: u64 = 10;

pub struct Simulator {
    tx: flume::Sender<u8>,
    commands: flume::Receiver<String>,
    pps: &'static PpsMonitor,
    baud_rate: u32,
    update_interval: Duration,
    output: OutputSentences,
    latitude: f64,
    longitude: f64,
    satellites: u8,
    /// bytes lost because the uart buffer was full
    overruns: u64,
}

impl Simulator {
    pub fn new(
        tx: flume::Sender<u8>,
        commands: flume::Receiver<String>,
        pps: &'static PpsMonitor,
        config: &TerminalConfig,
    ) -> Self {
        Self {
            tx,
            commands,
            pps,
            // what the receiver does out of the box
            baud_rate: config.core.gps_baud_rate,
            update_interval: Duration::from_secs(1),
            output: OutputSentences {
                gll: true,
                rmc: true,
                vtg: true,
                gga: true,
                gsa: true,
                gsv: true,
            },
            latitude: config.latitude,
            longitude: config.longitude,
            satellites: config.satellites,
            overruns: 0,
        }
    }

    pub fn run(mut self) {
        info!("simulated receiver running");

        loop {
            while let Ok(line) = self.commands.try_recv() {
                self.handle_command(&line);
            }

            let now = unix_now();

            let interval = self.update_interval.as_nanos().max(1);
            let next = (now.as_nanos() / interval + 1) * interval;
            let at = Duration::from_nanos(next as u64);

            sleep(at.saturating_sub(now));

            if at.subsec_nanos() == 0 {
                self.pps.on_rising_edge();
            }

            if self.output.gga {
                let body = gga_body(at, self.latitude, self.longitude, self.satellites);
                if !self.send(&body) {
                    break;
                }
            }

            if self.output.rmc {
                let body = rmc_body(at, self.latitude, self.longitude);
                if !self.send(&body) {
                    break;
                }
            }
        }

        info!("simulated receiver stopped. {} bytes overrun", self.overruns);
    }

    /// false once nobody is reading anymore
    fn send(&mut self, body: &str) -> bool {
        let line = nmea_line(body);

        if !send_paced(&self.tx, line.as_bytes(), self.baud_rate, &mut self.overruns) {
            return false;
        }

        trace!("sim > {}", line.trim_end());

        true
    }

    fn handle_command(&mut self, line: &str) {
        let Some(body) = verified_body(line) else {
            warn!("receiver ignored a bad command: {}", line);
            return;
        };

        let mut fields = body.split(',');

        match fields.next() {
            Some("PMTK251") => match fields.next().and_then(|x| x.parse::<u32>().ok()) {
                Some(baud_rate) => {
                    debug!("receiver baud rate {} -> {}", self.baud_rate, baud_rate);
                    self.baud_rate = baud_rate;
                }
                None => warn!("bad baud rate command: {}", line),
            },
            Some("PMTK220") => match fields.next().and_then(|x| x.parse::<u64>().ok()) {
                Some(millis) if millis >= 100 => {
                    debug!("receiver update rate {}ms", millis);
                    self.update_interval = Duration::from_millis(millis);
                }
                _ => warn!("bad update rate command: {}", line),
            },
            Some("PMTK314") => {
                let flags: Vec<bool> = fields.map(|x| x == "1").collect();

                let flag = |i: usize| flags.get(i).copied().unwrap_or(false);

                self.output = OutputSentences {
                    gll: flag(0),
                    rmc: flag(1),
                    vtg: flag(2),
                    gga: flag(3),
                    gsa: flag(4),
                    gsv: flag(5),
                };

                debug!("receiver output {:?}", self.output);
            }
            _ => debug!("receiver ignored {}", line),
        }
    }
}

/// plays a captured log back at about the rate it was recorded. a pulse goes out before each RMC
pub struct Replay {
    tx: flume::Sender<u8>,
    pps: &'static PpsMonitor,
    baud_rate: u32,
    lines: Vec<String>,
}

impl Replay {
    pub fn open(
        path: &Path,
        tx: flume::Sender<u8>,
        pps: &'static PpsMonitor,
        baud_rate: u32,
    ) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading nmea capture {}", path.display()))?;

        let lines: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|x| x.starts_with('$'))
            .map(|x| format!("{}\r\n", x))
            .collect();

        info!("replaying {} sentences from {}", lines.len(), path.display());

        Ok(Self {
            tx,
            pps,
            baud_rate,
            lines,
        })
    }

    pub fn run(self) {
        let mut overruns = 0;
        let mut second_started = SystemTime::now();

        for line in self.lines.iter() {
            if is_rmc(line) {
                let elapsed = second_started.elapsed().unwrap_or_default();
                sleep(Duration::from_secs(1).saturating_sub(elapsed));

                second_started = SystemTime::now();
                self.pps.on_rising_edge();
            }

            if !send_paced(&self.tx, line.as_bytes(), self.baud_rate, &mut overruns) {
                break;
            }
        }

        // the pulse stops too, so the status page goes stale
        info!("replay finished. {} bytes overrun", overruns);
    }
}

fn is_rmc(line: &str) -> bool {
    line.get(3..6) == Some("RMC")
}

/// sends at roughly the speed the wire would. a full buffer drops bytes like a real uart
fn send_paced(tx: &flume::Sender<u8>, bytes: &[u8], baud_rate: u32, overruns: &mut u64) -> bool {
    for &b in bytes {
        match tx.try_send(b) {
            Ok(()) => {}
            Err(flume::TrySendError::Full(_)) => {
                *overruns += 1;
                if *overruns % 100 == 1 {
                    warn!("uart overrun. {} bytes lost so far", *overruns);
                }
            }
            Err(flume::TrySendError::Disconnected(_)) => return false,
        }
    }

    let micros = bytes.len() as u64 * BITS_PER_BYTE * 1_000_000 / baud_rate.max(1) as u64;
    sleep(Duration::from_micros(micros));

    true
}

fn unix_now() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// the body of `line` if it is `$body*HH` with a correct checksum
fn verified_body(line: &str) -> Option<&str> {
    let (body, sum) = line.strip_prefix('$')?.split_once('*')?;

    let sum = u8::from_str_radix(sum.trim(), 16).ok()?;

    (checksum(body.as_bytes()) == sum).then_some(body)
}

pub fn nmea_line(body: &str) -> String {
    format!("${}*{:02X}\r\n", body, checksum(body.as_bytes()))
}

/// RMC for a moment `at` after the unix epoch. parked, so speed and course are zero
pub fn rmc_body(at: Duration, latitude: f64, longitude: f64) -> String {
    let (year, month, day) = civil_from_days((at.as_secs() / 86_400) as i64);

    format!(
        "GPRMC,{},A,{},{},0.00,0.00,{:02}{:02}{:02},,,A",
        utc_time(at),
        degrees_minutes(latitude, 2, 'N', 'S'),
        degrees_minutes(longitude, 3, 'E', 'W'),
        day,
        month,
        year % 100,
    )
}

pub fn gga_body(at: Duration, latitude: f64, longitude: f64, satellites: u8) -> String {
    format!(
        "GPGGA,{},{},{},1,{:02},1.0,10.0,M,0.0,M,,",
        utc_time(at),
        degrees_minutes(latitude, 2, 'N', 'S'),
        degrees_minutes(longitude, 3, 'E', 'W'),
        satellites,
    )
}

/// `hhmmss.ss`
fn utc_time(at: Duration) -> String {
    let secs = at.as_secs() % 86_400;

    format!(
        "{:02}{:02}{:02}.{:02}",
        secs / 3_600,
        (secs / 60) % 60,
        secs % 60,
        at.subsec_millis() / 10
    )
}

/// `ddmm.mmmm,N` (or `dddmm.mmmm,E` with 3 degree digits)
fn degrees_minutes(degrees: f64, degree_digits: usize, positive: char, negative: char) -> String {
    let hemisphere = if degrees < 0.0 { negative } else { positive };

    // ten thousandths of a minute
    let total = (degrees.abs() * 600_000.0).round() as u64;

    let whole = total / 600_000;
    let minutes = total % 600_000;

    format!(
        "{:0width$}{:02}.{:04},{}",
        whole,
        minutes / 10_000,
        minutes % 10_000,
        hemisphere,
        width = degree_digits
    )
}

/// days since 1970-01-01 to (year, month, day). Howard Hinnant's algorithm
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };

    (year, month, day)
}
