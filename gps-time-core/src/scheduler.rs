//! the main loop body. one call to [`Scheduler::poll`] is one iteration.
//!
//! 1. drain whatever the uart already has into the decoder (bounded by the rx buffer size)
//! 2. drive the sync indicator from the pps monitor
//! 3. serve at most one request
//!
//! nothing in here waits for data. failures are logged and the next iteration carries on.
use embassy_time::Instant;
use embedded_hal::digital::OutputPin;
use embedded_io::{Error as _, Read, ReadReady};

use crate::config::Config;
use crate::dispatch::{RequestDispatcher, Transport};
use crate::errors::{GpsTimeError, GpsTimeResult};
use crate::fix::{Fix, FixStore};
use crate::logging::{debug, trace, warn};
use crate::loop_rate::LoopRate;
use crate::nmea::{NmeaDecoder, SentenceResult};
use crate::pps::PpsMonitor;
use crate::status::StatusReport;

/// uart reads are done in chunks this big
const READ_CHUNK: usize = 32;

/// what one iteration did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollSummary {
    pub bytes_read: usize,
    pub sentences: u16,
    pub invalid: u16,
    pub fix_updated: bool,
    pub synced: bool,
    pub request_served: bool,
}

/// owns everything except the pps monitor, which is shared with the edge interrupt
pub struct Scheduler<'a, S, P, T> {
    serial: S,
    indicator: P,
    transport: T,
    pps: &'a PpsMonitor,
    config: Config,
    decoder: NmeaDecoder,
    fixes: FixStore,
    dispatcher: RequestDispatcher,
    started_at: Instant,
    /// last value written to the indicator. `None` until the first iteration
    synced: Option<bool>,
    loop_rate: LoopRate,
}

impl<'a, S, P, T> Scheduler<'a, S, P, T>
where
    S: Read + ReadReady,
    P: OutputPin,
    T: Transport,
{
    /// `now` is boot time. the pps monitor is reset so we start out "just synced"
    pub fn new(
        serial: S,
        indicator: P,
        transport: T,
        pps: &'a PpsMonitor,
        config: Config,
        now: Instant,
    ) -> Self {
        pps.start(now);

        Self {
            serial,
            indicator,
            transport,
            pps,
            config,
            decoder: NmeaDecoder::new(),
            fixes: FixStore::new(),
            dispatcher: RequestDispatcher::new(),
            started_at: now,
            synced: None,
            loop_rate: LoopRate::new(now),
        }
    }

    pub fn poll(&mut self, now: Instant) -> PollSummary {
        let mut summary = PollSummary::default();

        if let Err(err) = self.ingest_serial(now, &mut summary) {
            warn!("gps ingest: {}", err);
        }

        if let Err(err) = self.update_indicator(now, &mut summary) {
            warn!("indicator: {}", err);
        }

        if let Err(err) = self.serve_request(now, &mut summary) {
            warn!("request: {}", err);
        }

        self.loop_rate.tick(now);

        summary
    }

    fn ingest_serial(&mut self, now: Instant, summary: &mut PollSummary) -> GpsTimeResult<()> {
        let mut buf = [0u8; READ_CHUNK];

        // only what was already buffered. a flood can't keep us in here forever
        while summary.bytes_read < self.config.serial_rx_capacity {
            let ready = self
                .serial
                .read_ready()
                .map_err(|err| GpsTimeError::SerialRead(err.kind()))?;

            if !ready {
                break;
            }

            let want = buf.len().min(self.config.serial_rx_capacity - summary.bytes_read);

            let n = self
                .serial
                .read(&mut buf[..want])
                .map_err(|err| GpsTimeError::SerialRead(err.kind()))?;

            if n == 0 {
                break;
            }

            summary.bytes_read += n;

            for &b in &buf[..n] {
                match self.decoder.feed(b) {
                    SentenceResult::Incomplete => {}
                    SentenceResult::Invalid(reason) => {
                        summary.invalid = summary.invalid.saturating_add(1);
                        debug!("dropped sentence: {:?}", reason);
                    }
                    SentenceResult::Complete(sentence) => {
                        summary.sentences = summary.sentences.saturating_add(1);

                        if self.config.echo_nmea {
                            trace!("nmea: {:?}", sentence);
                        }

                        summary.fix_updated |= self.fixes.apply(&sentence, now);
                    }
                }
            }
        }

        Ok(())
    }

    fn update_indicator(&mut self, now: Instant, summary: &mut PollSummary) -> GpsTimeResult<()> {
        let synced = self.pps.is_synced(now, self.config.pps_timeout);

        summary.synced = synced;

        if self.synced == Some(synced) {
            return Ok(());
        }

        // this flips twice a second with a healthy pulse, so keep it quiet
        trace!("pps synced: {}", synced);

        let r = if synced {
            self.indicator.set_high()
        } else {
            self.indicator.set_low()
        };

        r.map_err(|_| GpsTimeError::Indicator)?;

        self.synced = Some(synced);

        Ok(())
    }

    fn serve_request(&mut self, now: Instant, summary: &mut PollSummary) -> GpsTimeResult<()> {
        let fixes = &self.fixes;
        let pps = self.pps;
        let started_at = self.started_at;
        let pps_timeout = self.config.pps_timeout;

        summary.request_served = self.dispatcher.poll(&mut self.transport, || {
            StatusReport::capture(fixes, pps, started_at, now, pps_timeout)
        })?;

        Ok(())
    }

    pub fn fix(&self) -> Option<&Fix> {
        self.fixes.current()
    }

    pub fn report(&self, now: Instant) -> StatusReport {
        StatusReport::capture(
            &self.fixes,
            self.pps,
            self.started_at,
            now,
            self.config.pps_timeout,
        )
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn indicator(&self) -> &P {
        &self.indicator
    }
}
