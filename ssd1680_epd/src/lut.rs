//! Waveform lookup tables for the fast update path.
//!
//! Loading one of these replaces the OTP full-refresh waveform. The values are
//! tuned on hardware and must reach the controller unmodified and in order.
//!
//! The red level's voltage-select bytes use `0b11` in groups 1 and 2, which
//! leaves the pixel black after a single short update. The frame buffer
//! therefore writes "fast black" pixels into the red plane.

use std::fmt::Debug;

/// Length of every waveform table in bytes.
pub const LUT_LEN: usize = 159;

/// A complete `0x32` payload.
///
/// | bytes   | content                                           |
/// |---------|---------------------------------------------------|
/// | 0..60   | voltage select, 5 levels x 12 phases               |
/// | 60..144 | timing, 12 groups of `TP A, B, SR AB, C, D, SR CD, RP` |
/// | 144..150| frame rate                                        |
/// | 150..153| gate scan selection (XON)                         |
/// | 153..159| EOPT, VGH, VSH1, VSH2, VSL, VCOM                   |
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WaveformTable([u8; LUT_LEN]);

const _: () = assert!(std::mem::size_of::<WaveformTable>() == 159);

impl WaveformTable {
    /// Phase 2 is stretched so the red-plane transition has time to settle.
    pub const FAST_RED: WaveformTable = WaveformTable(build([
        0x0A, 0x0A, 0x00, 0x0A, 0x0A, 0x02, 0x02,
    ]));

    /// The untuned phase 2. Faster, with more ghosting on red-plane pixels.
    pub const FAST: WaveformTable = WaveformTable(build([
        0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ]));

    pub const fn new(bytes: [u8; LUT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; LUT_LEN] {
        &self.0
    }
}

impl Default for WaveformTable {
    fn default() -> Self {
        Self::FAST_RED
    }
}

impl AsRef<[u8]> for WaveformTable {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for WaveformTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = if *self == Self::FAST_RED {
            "FAST_RED"
        } else if *self == Self::FAST {
            "FAST"
        } else {
            "custom"
        };
        f.debug_tuple("WaveformTable").field(&name).finish()
    }
}

#[rustfmt::skip]
const VOLTAGE_SELECT: [u8; 60] = [
    // L0 black
    0x40, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // L1 white
    0x80, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // L2 red, VS 0b11 in groups 1-2 ends black
    0x80, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // L3
    0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // L4 VCOM
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

#[rustfmt::skip]
const PHASE_0_1: [u8; 14] = [
    0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
    0x0A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02,
];

const FRAME_RATE: [u8; 6] = [0x22; 6];

const GATE_SCAN: [u8; 3] = [0x00; 3];

#[rustfmt::skip]
const VOLTAGES: [u8; 6] = [
    0x22, // EOPT
    0x17, // VGH 20V
    0x41, // VSH1 15V
    0x00, // VSH2
    0x32, // VSL -15V
    0x36, // VCOM
];

const fn build(phase_2: [u8; 7]) -> [u8; LUT_LEN] {
    let lut = copy([0; LUT_LEN], 0, &VOLTAGE_SELECT);
    let lut = copy(lut, 60, &PHASE_0_1);
    let lut = copy(lut, 74, &phase_2);
    // phases 3..=11 (81..144) stay zero
    let lut = copy(lut, 144, &FRAME_RATE);
    let lut = copy(lut, 150, &GATE_SCAN);
    copy(lut, 153, &VOLTAGES)
}

const fn copy(mut lut: [u8; LUT_LEN], at: usize, src: &[u8]) -> [u8; LUT_LEN] {
    assert!(at + src.len() <= LUT_LEN);
    let mut i = 0;
    while i < src.len() {
        lut[at + i] = src[i];
        i += 1;
    }
    lut
}
