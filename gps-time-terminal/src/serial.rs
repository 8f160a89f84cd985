//! a uart made of channels. the simulator thread is on the other end
use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};
use gps_time_core::pmtk::SetBaudRate;
use log::{debug, trace};

pub struct ChannelSerial {
    rx: flume::Receiver<u8>,
    /// whole lines we wrote, for the receiver to act on
    commands: flume::Sender<String>,
    line: Vec<u8>,
    baud_rate: u32,
}

impl ChannelSerial {
    pub fn new(rx: flume::Receiver<u8>, commands: flume::Sender<String>) -> Self {
        Self {
            rx,
            commands,
            line: Vec::new(),
            baud_rate: 0,
        }
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl ErrorType for ChannelSerial {
    type Error = ErrorKind;
}

impl ReadReady for ChannelSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.is_empty())
    }
}

impl Read for ChannelSerial {
    /// waits for the first byte, then takes whatever else is already buffered
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        buf[0] = self.rx.recv().map_err(|_| ErrorKind::NotConnected)?;

        let mut n = 1;
        while n < buf.len() {
            match self.rx.try_recv() {
                Ok(b) => {
                    buf[n] = b;
                    n += 1;
                }
                Err(_) => break,
            }
        }

        Ok(n)
    }
}

impl Write for ChannelSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &b in buf {
            if b == b'\n' {
                let line = String::from_utf8_lossy(&self.line).trim_end().to_string();
                self.line.clear();

                if self.commands.send(line).is_err() {
                    // replaying a capture. nobody is listening
                    trace!("dropped a line written to the receiver");
                }
            } else {
                self.line.push(b);
            }
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl SetBaudRate for ChannelSerial {
    fn set_baud_rate(&mut self, baud_rate: u32) {
        debug!("uart now at {} baud", baud_rate);
        self.baud_rate = baud_rate;
    }
}
