//! request handling. the request body is ignored, every request gets the same status page
use crate::errors::{GpsTimeError, GpsTimeResult};
use crate::logging::{debug, trace};
use crate::status::StatusReport;

/// bytes of request we bother reading. anything past this is left to the transport
pub const REQUEST_CAPACITY: usize = 256;
pub const RESPONSE_CAPACITY: usize = 512;

/// whatever carries requests in and responses out. the transport owns any framing
pub trait Transport {
    type Error: core::fmt::Debug;

    /// copy a waiting request into `buf`. `Ok(None)` if nobody is asking. must not block
    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>, Self::Error>;

    /// answer the request that `receive` just returned
    fn reply(&mut self, response: &[u8]) -> Result<(), Self::Error>;
}

pub struct RequestDispatcher {
    request: [u8; REQUEST_CAPACITY],
    served: u32,
}

impl Default for RequestDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestDispatcher {
    pub const fn new() -> Self {
        Self {
            request: [0; REQUEST_CAPACITY],
            served: 0,
        }
    }

    pub fn served(&self) -> u32 {
        self.served
    }

    /// handle at most one request. the report is only captured if someone is waiting.
    /// returns true if a response went out
    pub fn poll<T, F>(&mut self, transport: &mut T, report: F) -> GpsTimeResult<bool>
    where
        T: Transport,
        F: FnOnce() -> StatusReport,
    {
        let Some(len) = transport
            .receive(&mut self.request)
            .map_err(|_| GpsTimeError::Transport)?
        else {
            return Ok(false);
        };

        trace!("request: {} bytes", len);

        let response = report().render::<RESPONSE_CAPACITY>()?;

        transport
            .reply(response.as_bytes())
            .map_err(|_| GpsTimeError::Transport)?;

        self.served = self.served.wrapping_add(1);

        debug!("served status request #{}", self.served);

        Ok(true)
    }
}
