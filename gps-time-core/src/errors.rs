use thiserror::Error;

/// collaborator failures. the steady-state loop logs these and keeps going
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpsTimeError {
    #[error("gps serial read failed: {0:?}")]
    SerialRead(embedded_io::ErrorKind),
    #[error("gps serial write failed: {0:?}")]
    SerialWrite(embedded_io::ErrorKind),
    #[error("transport failed")]
    Transport,
    /// a fixed capacity formatting buffer ran out of room
    #[error("formatting buffer full")]
    BufferFull,
    #[error("sync indicator pin failed")]
    Indicator,
}

pub type GpsTimeResult<T> = Result<T, GpsTimeError>;
