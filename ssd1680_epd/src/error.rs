use std::convert::Infallible;

pub use ssd1680_epd_core::error::TimeOutError;

use crate::ssd1680::ControllerState;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    TimeOut(#[from] TimeOutError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("controller is {0:?}, `init` must complete first")]
    NotInitialized(ControllerState),
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Rejected geometry or profile. Raised before any line is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unknown geometry profile {0:?}")]
    UnknownProfile(String),
    #[error("planes are 1 bit per pixel, got {0}")]
    UnsupportedBitsPerPixel(u8),
    #[error("geometry has no pixels: {width}x{height}")]
    EmptyGeometry { width: u16, height: u16 },
    #[error("RAM X address 0 is not addressable")]
    ZeroXAddress,
    #[error("RAM {axis} end {end:#04x} exceeds controller maximum {max:#04x}")]
    RamWindowOutOfRange { axis: char, end: u16, max: u16 },
    #[error("RAM X window spans {columns} bytes, plane rows are {row_bytes}")]
    RowStrideMismatch { columns: u16, row_bytes: usize },
    #[error("RAM {axis} window spans {spans}, panel needs {needs}")]
    RamWindowTooSmall { axis: char, spans: u16, needs: u16 },
    #[error("plane of {provided} bytes cannot hold {required}")]
    BufferTooSmall { required: usize, provided: usize },
}
