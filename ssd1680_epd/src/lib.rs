//! Fast-update driver for SSD1680 e-paper controllers with black/white/red panels.
//!
//! Drawing goes into a pair of bitplanes ([`frame::FrameBuffers`]), either through
//! `set_pixel`/`fill_rect` with 24-bit color words or through `embedded-graphics`.
//! [`ssd1680::Ssd1680::flip`] sends both planes and refreshes with the waveform
//! table from [`lut`].

pub mod cmd;
pub mod config;
pub mod error;
pub mod frame;
pub mod lut;
pub mod ssd1680;

pub use config::{DisplayGeometry, GeometryProfile, PanelPreset, RamWindow, SessionConfig};
pub use error::{ConfigurationError, Error};
pub use frame::{composite, FrameBuffers, PlaneBits};
pub use lut::WaveformTable;
pub use ssd1680::{ControllerState, Ssd1680};
