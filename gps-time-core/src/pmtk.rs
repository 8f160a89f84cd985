//! MediaTek receiver commands. sent once at startup, then the receiver just talks
use core::fmt::Write as _;

use embedded_io::{Error as _, Write};

use crate::config::Config;
use crate::errors::{GpsTimeError, GpsTimeResult};
use crate::logging::{debug, info};
use crate::nmea::checksum;

/// `$` + body + `*HH\r\n`
const MAX_COMMAND_LEN: usize = 80;

/// which sentences `PMTK314` turns on. each one is sent on every update
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputSentences {
    pub gll: bool,
    pub rmc: bool,
    pub vtg: bool,
    pub gga: bool,
    pub gsa: bool,
    pub gsv: bool,
}

impl OutputSentences {
    pub const NONE: Self = Self {
        gll: false,
        rmc: false,
        vtg: false,
        gga: false,
        gsa: false,
        gsv: false,
    };

    pub const RMC: Self = Self {
        rmc: true,
        ..Self::NONE
    };

    /// what we parse
    pub const RMC_GGA: Self = Self {
        rmc: true,
        gga: true,
        ..Self::NONE
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PmtkCommand {
    /// `PMTK251`. the receiver switches as soon as it reads this
    SetBaudRate(u32),
    /// `PMTK220`
    SetUpdateRate { millis: u16 },
    /// `PMTK314`
    SetOutput(OutputSentences),
}

impl PmtkCommand {
    pub fn render(&self) -> GpsTimeResult<heapless::String<MAX_COMMAND_LEN>> {
        let mut body = heapless::String::<MAX_COMMAND_LEN>::new();

        let written = match self {
            Self::SetBaudRate(baud) => write!(body, "PMTK251,{}", baud),
            Self::SetUpdateRate { millis } => write!(body, "PMTK220,{}", millis),
            Self::SetOutput(x) => {
                let flags = [x.gll, x.rmc, x.vtg, x.gga, x.gsa, x.gsv];

                let mut r = write!(body, "PMTK314");
                for flag in flags {
                    r = r.and_then(|_| write!(body, ",{}", flag as u8));
                }
                // the reserved slots
                for _ in 0..11 {
                    r = r.and_then(|_| write!(body, ",0"));
                }
                r
            }
        };
        written.map_err(|_| GpsTimeError::BufferFull)?;

        let mut line = heapless::String::new();
        write!(line, "${}*{:02X}\r\n", body, checksum(body.as_bytes()))
            .map_err(|_| GpsTimeError::BufferFull)?;

        Ok(line)
    }

    pub fn write_to<W: Write>(&self, serial: &mut W) -> GpsTimeResult<()> {
        let line = self.render()?;

        debug!("pmtk > {}", line.trim_end());

        serial
            .write_all(line.as_bytes())
            .map_err(|err| GpsTimeError::SerialWrite(err.kind()))?;
        serial
            .flush()
            .map_err(|err| GpsTimeError::SerialWrite(err.kind()))
    }
}

/// a uart whose local baud rate can change after it was opened
pub trait SetBaudRate {
    fn set_baud_rate(&mut self, baud_rate: u32);
}

/// we don't know what rate the receiver is at after a power cycle, so ask it to switch at
/// every rate it could be at. then set the update rate and pick the sentences.
pub fn configure_receiver<S>(serial: &mut S, config: &Config) -> GpsTimeResult<()>
where
    S: Write + SetBaudRate,
{
    let switch = PmtkCommand::SetBaudRate(config.gps_baud_rate);

    for &probe in config.probe_baud_rates.iter() {
        serial.set_baud_rate(probe);
        switch.write_to(serial)?;
    }

    serial.set_baud_rate(config.gps_baud_rate);

    PmtkCommand::SetUpdateRate {
        millis: config.update_rate_ms,
    }
    .write_to(serial)?;

    PmtkCommand::SetOutput(config.output_sentences).write_to(serial)?;

    info!(
        "gps receiver configured for {} baud, {}ms updates",
        config.gps_baud_rate, config.update_rate_ms
    );

    Ok(())
}
