//! fakes for the serial port, transport, and indicator pin
use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_io::{ErrorType, Read, ReadReady, Write};

use crate::dispatch::Transport;
use crate::nmea::checksum;
use crate::pmtk::SetBaudRate;

/// wrap a body in `$`, checksum, and terminator
pub fn sentence(body: &str) -> String {
    format!("${}*{:02X}\r\n", body, checksum(body.as_bytes()))
}

/// bytes go in with `push`. everything written is kept in `tx`
#[derive(Default)]
pub struct MockSerial {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub baud_rates: Vec<u32>,
}

impl MockSerial {
    pub fn push(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }
}

impl ErrorType for MockSerial {
    type Error = Infallible;
}

impl ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.is_empty())
    }
}

impl Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.rx.len());
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl SetBaudRate for MockSerial {
    fn set_baud_rate(&mut self, baud_rate: u32) {
        self.baud_rates.push(baud_rate);
    }
}

/// a receiver that never stops talking
pub struct FloodSerial {
    pattern: Vec<u8>,
    offset: usize,
}

impl FloodSerial {
    pub fn new(pattern: &[u8]) -> Self {
        Self {
            pattern: pattern.to_vec(),
            offset: 0,
        }
    }
}

impl ErrorType for FloodSerial {
    type Error = Infallible;
}

impl ReadReady for FloodSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

impl Read for FloodSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        for b in buf.iter_mut() {
            *b = self.pattern[self.offset];
            self.offset = (self.offset + 1) % self.pattern.len();
        }
        Ok(buf.len())
    }
}

#[derive(Debug)]
pub struct ReplyFailed;

#[derive(Default)]
pub struct QueueTransport {
    pub requests: VecDeque<Vec<u8>>,
    pub replies: Vec<Vec<u8>>,
    pub fail_replies: bool,
}

impl QueueTransport {
    pub fn push_request(&mut self, request: &[u8]) {
        self.requests.push_back(request.to_vec());
    }
}

impl Transport for QueueTransport {
    type Error = ReplyFailed;

    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>, Self::Error> {
        let Some(request) = self.requests.pop_front() else {
            return Ok(None);
        };

        let n = request.len().min(buf.len());
        buf[..n].copy_from_slice(&request[..n]);

        Ok(Some(n))
    }

    fn reply(&mut self, response: &[u8]) -> Result<(), Self::Error> {
        if self.fail_replies {
            return Err(ReplyFailed);
        }

        self.replies.push(response.to_vec());

        Ok(())
    }
}

/// remembers every level it was set to
#[derive(Default)]
pub struct RecordingPin {
    pub states: Vec<bool>,
    pub fail: bool,
}

#[derive(Debug)]
pub struct PinFailed;

impl embedded_hal::digital::Error for PinFailed {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl embedded_hal::digital::ErrorType for RecordingPin {
    type Error = PinFailed;
}

impl embedded_hal::digital::OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true)
    }
}

impl RecordingPin {
    fn set(&mut self, high: bool) -> Result<(), PinFailed> {
        if self.fail {
            return Err(PinFailed);
        }
        self.states.push(high);
        Ok(())
    }
}
