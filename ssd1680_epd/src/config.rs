//! Panel geometry and session configuration.
//!
//! A [`DisplayGeometry`] is resolved and validated once, when the session is
//! built. Nothing here touches hardware.

use std::str::FromStr;

use ssd1680_epd_core::spi_interface::BusyPolicy;

use crate::{error::ConfigurationError, lut::WaveformTable};

/// RAM X address 0 is not addressable on this part, windows start at 1.
pub const X_ADDR_PADDING: u8 = 1;
/// Larger X ends make the controller fall back to its default window.
pub const MAX_RAM_X_END: u8 = 0x11;
pub const MAX_RAM_Y_END: u16 = 0xAB;

/// Register values for `0x44`/`0x45` and the matching address counters.
///
/// X is counted in bytes and already includes [`X_ADDR_PADDING`]. Y runs from
/// `y_start` down to `y_end`, matching the X-increment/Y-decrement entry mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamWindow {
    pub x_start: u8,
    pub x_end: u8,
    pub y_start: u16,
    pub y_end: u16,
}

impl RamWindow {
    /// Inclusive window over exactly `ceil(width / 8)` bytes per row.
    ///
    /// An X end that does not fit the register saturates to `0xFF`, which
    /// [`DisplayGeometry::validate`] then rejects.
    pub const fn for_panel(width: u16, height: u16) -> Self {
        let x_end = (width.div_ceil(8) + X_ADDR_PADDING as u16).saturating_sub(1);
        Self {
            x_start: X_ADDR_PADDING,
            x_end: if x_end > u8::MAX as u16 { u8::MAX } else { x_end as u8 },
            y_start: height.saturating_sub(1),
            y_end: 0,
        }
    }

    pub fn x_window(&self) -> [u8; 2] {
        [self.x_start, self.x_end]
    }

    pub fn y_window(&self) -> [u8; 4] {
        let [start_lo, start_hi] = self.y_start.to_le_bytes();
        let [end_lo, end_hi] = self.y_end.to_le_bytes();
        [start_lo, start_hi, end_lo, end_hi]
    }

    pub fn x_counter(&self) -> [u8; 1] {
        [self.x_start]
    }

    pub fn y_counter(&self) -> [u8; 2] {
        self.y_start.to_le_bytes()
    }

    fn columns(&self) -> u16 {
        u16::from(self.x_end.abs_diff(self.x_start)) + 1
    }

    fn rows(&self) -> u16 {
        self.y_start.abs_diff(self.y_end) + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub width: u16,
    pub height: u16,
    pub bits_per_pixel: u8,
    pub ram_window: RamWindow,
    /// Length of each plane in bytes.
    pub max_ram_bytes: usize,
}

impl DisplayGeometry {
    /// One bit per pixel, default window, planes sized exactly.
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            bits_per_pixel: 1,
            ram_window: RamWindow::for_panel(width, height),
            max_ram_bytes: (width as usize).div_ceil(8) * height as usize,
        }
    }

    pub const fn row_bytes(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Bytes actually covered by pixels, at most [`Self::max_ram_bytes`].
    pub const fn used_bytes(&self) -> usize {
        self.row_bytes() * self.height as usize
    }

    /// Value for the first two bytes of driver output control (`0x01`).
    pub fn gate_lines(&self) -> [u8; 2] {
        self.height.saturating_sub(1).to_le_bytes()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < i32::from(self.width) && y < i32::from(self.height)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.bits_per_pixel != 1 {
            return Err(ConfigurationError::UnsupportedBitsPerPixel(
                self.bits_per_pixel,
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigurationError::EmptyGeometry {
                width: self.width,
                height: self.height,
            });
        }

        let window = &self.ram_window;
        if window.x_start < X_ADDR_PADDING {
            return Err(ConfigurationError::ZeroXAddress);
        }
        if window.x_end > MAX_RAM_X_END {
            return Err(ConfigurationError::RamWindowOutOfRange {
                axis: 'X',
                end: window.x_end.into(),
                max: MAX_RAM_X_END.into(),
            });
        }
        if window.y_end > MAX_RAM_Y_END {
            return Err(ConfigurationError::RamWindowOutOfRange {
                axis: 'Y',
                end: window.y_end,
                max: MAX_RAM_Y_END,
            });
        }

        // The controller wraps rows at the window edge, so X must match the stride.
        let row_bytes = self.row_bytes();
        if usize::from(window.columns()) != row_bytes {
            return Err(ConfigurationError::RowStrideMismatch {
                columns: window.columns(),
                row_bytes,
            });
        }
        if window.rows() < self.height {
            return Err(ConfigurationError::RamWindowTooSmall {
                axis: 'Y',
                spans: window.rows(),
                needs: self.height,
            });
        }

        if self.max_ram_bytes < self.used_bytes() {
            return Err(ConfigurationError::BufferTooSmall {
                required: self.used_bytes(),
                provided: self.max_ram_bytes,
            });
        }
        Ok(())
    }
}

/// Panels this driver has been tuned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelPreset {
    /// 2.13" 128x250, the LOLIN / Waveshare V3 class.
    #[default]
    Epd2in13,
    /// GDEM029C90, 2.9" 128x296.
    Gdem029c90,
    /// GDE021A1, 72x172 at 2 bits per pixel. Known, but the two-plane
    /// waveform cannot drive it.
    Gde021a1,
}

impl PanelPreset {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Epd2in13 => "ssd1680-128x250",
            Self::Gdem029c90 => "gdem029c90",
            Self::Gde021a1 => "gde021a1",
        }
    }

    pub const fn geometry(self) -> DisplayGeometry {
        match self {
            Self::Epd2in13 => DisplayGeometry::new(128, 250),
            Self::Gdem029c90 => DisplayGeometry::new(128, 296),
            Self::Gde021a1 => DisplayGeometry {
                bits_per_pixel: 2,
                max_ram_bytes: 3096,
                ..DisplayGeometry::new(72, 172)
            },
        }
    }
}

impl FromStr for PanelPreset {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Epd2in13, Self::Gdem029c90, Self::Gde021a1]
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigurationError::UnknownProfile(s.to_owned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryProfile {
    Named(PanelPreset),
    Explicit(DisplayGeometry),
}

impl GeometryProfile {
    /// Resolves the profile to a validated geometry.
    pub fn resolve(&self) -> Result<DisplayGeometry, ConfigurationError> {
        let geometry = match *self {
            Self::Named(preset) => preset.geometry(),
            Self::Explicit(geometry) => geometry,
        };
        geometry.validate()?;
        Ok(geometry)
    }
}

impl Default for GeometryProfile {
    fn default() -> Self {
        Self::Named(PanelPreset::default())
    }
}

impl FromStr for GeometryProfile {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self::Named)
    }
}

impl From<PanelPreset> for GeometryProfile {
    fn from(preset: PanelPreset) -> Self {
        Self::Named(preset)
    }
}

impl From<DisplayGeometry> for GeometryProfile {
    fn from(geometry: DisplayGeometry) -> Self {
        Self::Explicit(geometry)
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub geometry: GeometryProfile,
    /// `poll_budget` is the hard cap on busy-line reads per wait.
    pub busy: BusyPolicy,
    /// Reset line low, then high, in milliseconds.
    pub reset_pulse_ms: [u32; 2],
    /// Settle time after [`clear`](crate::ssd1680::Ssd1680::clear).
    pub post_clear_timeout_ms: u32,
    pub waveform: WaveformTable,
    /// Largest single SPI write when streaming a plane.
    pub chunk_size: usize,
}

impl SessionConfig {
    pub fn new(geometry: impl Into<GeometryProfile>) -> Self {
        Self {
            geometry: geometry.into(),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            geometry: GeometryProfile::default(),
            busy: BusyPolicy::default(),
            reset_pulse_ms: [1, 10],
            post_clear_timeout_ms: 100,
            waveform: WaveformTable::default(),
            chunk_size: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_window() {
        let geometry = GeometryProfile::default().resolve().unwrap();
        assert_eq!((geometry.width, geometry.height), (128, 250));
        assert_eq!(geometry.ram_window.x_window(), [0x01, 0x10]);
        assert_eq!(geometry.ram_window.columns(), geometry.row_bytes() as u16);
        assert_eq!(geometry.ram_window.y_window(), [0xF9, 0x00, 0x00, 0x00]);
        assert_eq!(geometry.ram_window.y_counter(), [0xF9, 0x00]);
        assert_eq!(geometry.gate_lines(), [0xF9, 0x00]);
        assert_eq!(geometry.max_ram_bytes, 16 * 250);
    }

    #[test]
    fn tall_preset_uses_high_byte() {
        let geometry: GeometryProfile = "GDEM029C90".parse().unwrap();
        let geometry = geometry.resolve().unwrap();
        assert_eq!(geometry.ram_window.y_window(), [0x27, 0x01, 0x00, 0x00]);
        assert_eq!(geometry.gate_lines(), [0x27, 0x01]);
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let err = "gdew042t2".parse::<GeometryProfile>().unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownProfile("gdew042t2".into()));
    }

    #[test]
    fn known_two_bit_profile_is_incompatible() {
        let profile: GeometryProfile = "GDE021A1".parse().unwrap();
        assert_eq!(profile, GeometryProfile::Named(PanelPreset::Gde021a1));
        assert_eq!(
            profile.resolve(),
            Err(ConfigurationError::UnsupportedBitsPerPixel(2))
        );
    }

    #[test]
    fn window_limits_are_enforced() {
        let mut geometry = DisplayGeometry::new(128, 250);
        geometry.ram_window.x_end = 0x12;
        assert!(matches!(
            geometry.validate(),
            Err(ConfigurationError::RamWindowOutOfRange { axis: 'X', .. })
        ));

        let mut geometry = DisplayGeometry::new(72, 172);
        geometry.ram_window.y_start = 0;
        geometry.ram_window.y_end = 0xAC;
        assert!(matches!(
            geometry.validate(),
            Err(ConfigurationError::RamWindowOutOfRange { axis: 'Y', .. })
        ));

        let mut geometry = DisplayGeometry::new(128, 250);
        geometry.ram_window.x_start = 0;
        assert_eq!(geometry.validate(), Err(ConfigurationError::ZeroXAddress));
    }

    #[test]
    fn window_must_cover_panel() {
        let mut geometry = DisplayGeometry::new(128, 250);
        geometry.ram_window.x_end = 0x11;
        assert_eq!(
            geometry.validate(),
            Err(ConfigurationError::RowStrideMismatch {
                columns: 17,
                row_bytes: 16
            })
        );

        let mut geometry = DisplayGeometry::new(128, 250);
        geometry.ram_window.y_start = 100;
        assert_eq!(
            geometry.validate(),
            Err(ConfigurationError::RamWindowTooSmall {
                axis: 'Y',
                spans: 101,
                needs: 250
            })
        );
    }

    #[test]
    fn two_bit_geometry_is_incompatible() {
        let geometry = DisplayGeometry {
            bits_per_pixel: 2,
            ..DisplayGeometry::new(72, 172)
        };
        assert_eq!(
            GeometryProfile::Explicit(geometry).resolve(),
            Err(ConfigurationError::UnsupportedBitsPerPixel(2))
        );
    }

    #[test]
    fn planes_must_fit_pixels() {
        let geometry = DisplayGeometry {
            max_ram_bytes: 3096,
            ..DisplayGeometry::new(128, 250)
        };
        assert_eq!(
            geometry.validate(),
            Err(ConfigurationError::BufferTooSmall {
                required: 4000,
                provided: 3096
            })
        );
    }

    #[test]
    fn odd_width_rounds_rows_up() {
        let geometry = DisplayGeometry::new(122, 250);
        assert_eq!(geometry.row_bytes(), 16);
        assert_eq!(geometry.ram_window.x_window(), [0x01, 0x10]);
        geometry.validate().unwrap();
    }

    #[test]
    fn too_wide_geometry_is_an_error() {
        for width in [144, 2040, 2047, u16::MAX] {
            let geometry = DisplayGeometry::new(width, 10);
            assert!(matches!(
                geometry.validate(),
                Err(ConfigurationError::RamWindowOutOfRange { axis: 'X', .. })
            ));
        }
        assert_eq!(DisplayGeometry::new(2040, 10).ram_window.x_end, 0xFF);
        assert_eq!(DisplayGeometry::new(136, 10).ram_window.x_end, 0x11);
        DisplayGeometry::new(136, 10).validate().unwrap();
    }
}
