use embassy_time::Duration;

use crate::pmtk::OutputSentences;

/// everything is set at compile/flash time. there is no persisted state
#[derive(Clone, Debug)]
pub struct Config {
    /// a pulse older than this means we are no longer synced
    pub pps_timeout: Duration,
    /// the baud rate we want the receiver to end up at
    pub gps_baud_rate: u32,
    /// rates tried while forcing the receiver onto `gps_baud_rate`. we don't know what it booted with
    pub probe_baud_rates: [u32; 5],
    /// receiver fix interval
    pub update_rate_ms: u16,
    pub output_sentences: OutputSentences,
    /// size of the uart receive buffer. this is also the most we drain in one scheduler iteration
    pub serial_rx_capacity: usize,
    /// trace log every completed sentence
    pub echo_nmea: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pps_timeout: Duration::from_millis(100),
            gps_baud_rate: 9600,
            probe_baud_rates: [9600, 19200, 38400, 57600, 115200],
            update_rate_ms: 1000,
            output_sentences: OutputSentences::RMC_GGA,
            // 64 is too small to hold more than one sentence
            serial_rx_capacity: 128,
            echo_nmea: false,
        }
    }
}
