use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};
use gps_time_core::Config;

pub const USAGE: &str = "usage: gps-time-terminal [--listen ADDR] [--replay FILE] [--position LAT,LON] [--satellites N] [--echo-nmea]";

#[derive(Clone, Debug)]
pub struct TerminalConfig {
    pub core: Config,
    pub listen: SocketAddr,
    /// play back a captured nmea log instead of simulating a receiver
    pub replay: Option<PathBuf>,
    /// where the simulated receiver thinks it is
    pub latitude: f64,
    pub longitude: f64,
    pub satellites: u8,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            core: Config::default(),
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            replay: None,
            latitude: 37.5,
            longitude: -122.25,
            satellites: 7,
        }
    }
}

impl TerminalConfig {
    pub fn from_args<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--listen" => {
                    config.listen = next_value(&mut args, &arg)?
                        .parse()
                        .context("--listen needs an address like 127.0.0.1:8080")?;
                }
                "--replay" => {
                    config.replay = Some(next_value(&mut args, &arg)?.into());
                }
                "--position" => {
                    let value = next_value(&mut args, &arg)?;

                    let Some((lat, lon)) = value.split_once(',') else {
                        bail!("--position needs LAT,LON. got {}", value);
                    };

                    config.latitude = lat.trim().parse().context("bad latitude")?;
                    config.longitude = lon.trim().parse().context("bad longitude")?;

                    if !(-90.0..=90.0).contains(&config.latitude)
                        || !(-180.0..=180.0).contains(&config.longitude)
                    {
                        bail!("--position out of range: {}", value);
                    }
                }
                "--satellites" => {
                    config.satellites = next_value(&mut args, &arg)?
                        .parse()
                        .context("--satellites needs a number")?;
                }
                "--echo-nmea" => config.core.echo_nmea = true,
                "-h" | "--help" => bail!("{}", USAGE),
                other => bail!("unknown argument: {}\n{}", other, USAGE),
            }
        }

        Ok(config)
    }
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    args.next()
        .with_context(|| format!("{} needs a value", flag))
}
