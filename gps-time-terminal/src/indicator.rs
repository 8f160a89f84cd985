use std::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use log::trace;

/// stands in for the pps led
#[derive(Debug, Default)]
pub struct LogPin {
    high: bool,
    /// rising transitions. roughly one per pulse when everything is healthy
    flashes: u64,
}

impl ErrorType for LogPin {
    type Error = Infallible;
}

impl OutputPin for LogPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            trace!("pps led off");
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            self.flashes += 1;
            trace!("pps led on. flash #{}", self.flashes);
        }
        self.high = true;
        Ok(())
    }
}
