use std::env;
use std::thread;

use anyhow::Context;
use embassy_executor::Spawner;
use embassy_time::{Instant, Timer};
use gps_time_core::pmtk::configure_receiver;
use gps_time_core::{PpsMonitor, Scheduler};
use gps_time_terminal::config::TerminalConfig;
use gps_time_terminal::indicator::LogPin;
use gps_time_terminal::serial::ChannelSerial;
use gps_time_terminal::simulator::{Replay, Simulator};
use gps_time_terminal::transport::TcpTransport;
use log::*;
use static_cell::StaticCell;

/// shared with whichever thread plays the receiver
static PPS: StaticCell<PpsMonitor> = StaticCell::new();

type GpsScheduler = Scheduler<'static, ChannelSerial, LogPin, TcpTransport>;

#[embassy_executor::task]
async fn scheduler_task(mut scheduler: GpsScheduler) {
    loop {
        let summary = scheduler.poll(Instant::now());

        if summary.fix_updated {
            trace!("{:?}", summary);
        }

        // the only await in the loop. a real board would spin here instead
        Timer::after_millis(1).await;
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .format_timestamp_nanos()
        .init();

    info!("hello, world!");

    match start() {
        Ok(scheduler) => spawner.must_spawn(scheduler_task(scheduler)),
        Err(err) => {
            error!("{:#}", err);
            std::process::exit(1);
        }
    }

    debug!("all tasks spawned");
}

fn start() -> anyhow::Result<GpsScheduler> {
    let config = TerminalConfig::from_args(env::args().skip(1))?;

    let pps: &'static PpsMonitor = PPS.init(PpsMonitor::new());

    // this is the uart's receive buffer. when it fills up, the receiver side drops bytes
    let (rx_tx, rx_rx) = flume::bounded(config.core.serial_rx_capacity);
    let (command_tx, command_rx) = flume::unbounded();

    let mut serial = ChannelSerial::new(rx_rx, command_tx);

    match &config.replay {
        Some(path) => {
            let replay = Replay::open(path, rx_tx, pps, config.core.gps_baud_rate)?;

            thread::Builder::new()
                .name("replay".to_string())
                .spawn(move || replay.run())?;
        }
        None => {
            let simulator = Simulator::new(rx_tx, command_rx, pps, &config);

            thread::Builder::new()
                .name("receiver".to_string())
                .spawn(move || simulator.run())?;
        }
    }

    configure_receiver(&mut serial, &config.core).context("configuring the gps receiver")?;

    let transport = TcpTransport::bind(config.listen)
        .with_context(|| format!("listening on {}", config.listen))?;

    info!("status page at http://{}/", transport.local_addr()?);

    Ok(Scheduler::new(
        serial,
        LogPin::default(),
        transport,
        pps,
        config.core,
        Instant::now(),
    ))
}
