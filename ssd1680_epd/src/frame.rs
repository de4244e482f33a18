//! The two bitplanes written by `flip` and the color rule that fills them.
//!
//! Colors are 24-bit words: bits 16..24 are the red channel, bits 0..16 the
//! white/black channel. White/black always wins, so a pixel never has both
//! plane bits set. The fast waveform depends on that.

use std::convert::Infallible;

use embedded_graphics_core::{
    pixelcolor::{Rgb888, RgbColor},
    prelude::*,
    primitives::Rectangle,
};

use crate::{config::DisplayGeometry, error::ConfigurationError};

/// Plane bits of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaneBits {
    pub red: bool,
    pub white: bool,
}

/// Splits a color word into its plane bits.
pub const fn composite(color: u32) -> PlaneBits {
    let white = color & 0xFFFF != 0;
    let red = (color >> 16) & 0xFF != 0 && !white;
    PlaneBits { red, white }
}

pub fn color_word(color: Rgb888) -> u32 {
    (u32::from(color.r()) << 16) | (u32::from(color.g()) << 8) | u32::from(color.b())
}

/// W (white/black) and R (red) planes, MSB-first, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffers {
    geometry: DisplayGeometry,
    white: Box<[u8]>,
    red: Box<[u8]>,
}

impl std::fmt::Debug for FrameBuffers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffers")
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

impl FrameBuffers {
    /// Both planes zeroed, after checking that `geometry` fits in them.
    pub fn new(geometry: DisplayGeometry) -> Result<Self, ConfigurationError> {
        geometry.validate()?;
        let plane = vec![0; geometry.max_ram_bytes].into_boxed_slice();
        Ok(Self {
            geometry,
            white: plane.clone(),
            red: plane,
        })
    }

    pub fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    pub fn white(&self) -> &[u8] {
        &self.white
    }

    pub fn red(&self) -> &[u8] {
        &self.red
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if !self.geometry.contains(x, y) {
            return;
        }
        let bits = composite(color);
        let (index, offset) = self.position(x as usize, y as usize);
        set_bit(&mut self.white[index], offset, bits.white);
        set_bit(&mut self.red[index], offset, bits.red);
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<PlaneBits> {
        if !self.geometry.contains(x, y) {
            return None;
        }
        let (index, offset) = self.position(x as usize, y as usize);
        Some(PlaneBits {
            red: self.red[index] & (1 << offset) != 0,
            white: self.white[index] & (1 << offset) != 0,
        })
    }

    /// Fills the rectangle spanned by two inclusive corners, clipped.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let max_x = i32::from(self.geometry.width) - 1;
        let max_y = i32::from(self.geometry.height) - 1;
        let (left, right) = (x0.min(x1).max(0), x0.max(x1).min(max_x));
        let (top, bottom) = (y0.min(y1).max(0), y0.max(y1).min(max_y));
        if left > right || top > bottom {
            return;
        }

        let bits = composite(color);
        let row_bytes = self.geometry.row_bytes();
        let (left, right) = (left as usize, right as usize);
        for y in top as usize..=bottom as usize {
            let row = y * row_bytes..(y + 1) * row_bytes;
            fill_span(&mut self.white[row.clone()], left, right, bits.white);
            fill_span(&mut self.red[row], left, right, bits.red);
        }
    }

    /// Sets every bit of both planes, padding included.
    pub fn fill(&mut self, color: u32) {
        let bits = composite(color);
        self.white.fill(if bits.white { 0xFF } else { 0x00 });
        self.red.fill(if bits.red { 0xFF } else { 0x00 });
    }

    fn position(&self, x: usize, y: usize) -> (usize, u8) {
        let bit = y * self.geometry.row_bytes() * 8 + x;
        (bit / 8, 7 - (bit % 8) as u8)
    }
}

fn set_bit(value: &mut u8, offset: u8, on: bool) {
    if on {
        *value |= 1 << offset;
    } else {
        *value &= !(1 << offset);
    }
}

fn set_mask(value: &mut u8, mask: u8, on: bool) {
    if on {
        *value |= mask;
    } else {
        *value &= !mask;
    }
}

// Inclusive pixel span `left..=right` within one row.
fn fill_span(row: &mut [u8], left: usize, right: usize, on: bool) {
    let (first, last) = (left / 8, right / 8);
    let head = 0xFF >> (left % 8);
    let tail = 0xFF << (7 - right % 8);
    if first == last {
        set_mask(&mut row[first], head & tail, on);
        return;
    }
    set_mask(&mut row[first], head, on);
    row[first + 1..last].fill(if on { 0xFF } else { 0x00 });
    set_mask(&mut row[last], tail, on);
}

impl OriginDimensions for FrameBuffers {
    fn size(&self) -> Size {
        Size::new(self.geometry.width.into(), self.geometry.height.into())
    }
}

impl DrawTarget for FrameBuffers {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color_word(color));
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        if let Some(bottom_right) = area.bottom_right() {
            let Point { x, y } = area.top_left;
            self.fill_rect(x, y, bottom_right.x, bottom_right.y, color_word(color));
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color_word(color));
        Ok(())
    }
}
