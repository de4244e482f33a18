//! Hardware primitives shared by the SSD1680 driver.
//!
//! [`spi_interface`] frames command and data bytes on a 4-wire SPI link and
//! owns the reset, power and busy lines. [`error`] holds the timeout type
//! reported by the bounded busy wait.

pub mod error;
pub mod spi_interface;
