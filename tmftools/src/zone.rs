//! Zone tools: recovering spatial pixels from the time-multiplexed channel order
//!
//! In 8x8 mode the sensor sweeps its 64 zones in 4 time-multiplexed steps of
//! 16 SPAD channels each (8 channels in each of 2 sub-captures). Zones are
//! numbered in row-major order:
//!
//! ```text
//!  1  2  3  4  5  6  7  8
//!  9 10 11 12 13 14 15 16
//! 17 18 19 20 21 22 23 24
//! 25 26 27 28 29 30 31 32
//! 33 34 35 36 37 38 39 40
//! 41 42 43 44 45 46 47 48
//! 49 50 51 52 53 54 55 56
//! 57 58 59 60 61 62 63 64
//! ```

use crate::{
    CAPTURES_PER_SEQUENCE, CHANNELS_PER_TDC, HISTOGRAMS_PER_CAPTURE, HISTOGRAMS_PER_SUB_CAPTURE,
    MAX_SUB_CAPTURE,
};

pub const ZONES: usize = 64;
/// Object columns in the log, one unused column after every 8 zones
pub const LOG_PIXELS: usize = 72;
/// Serial numbers of the histograms in one 8x8 sequence
pub const SERIALS_8X8: u32 = CAPTURES_PER_SEQUENCE as u32 * HISTOGRAMS_PER_CAPTURE;

const STEPS: i64 = 4;
const CHANNELS_PER_SUB_CAPTURE: i64 = 8;
const CHANNELS_PER_STEP: i64 = 16;

/// Physical wiring of SPAD channel (1-64, index 0 unused) to zone
const SPAD_CH_TO_ZONE: [u8; ZONES + 1] = [
    0,
    39, 47, 55, 63, 40, 48, 56, 64,
    7, 15, 23, 31, 8, 16, 24, 32,
    37, 45, 53, 61, 38, 46, 54, 62,
    5, 13, 21, 29, 6, 14, 22, 30,
    35, 43, 51, 59, 36, 44, 52, 60,
    3, 11, 19, 27, 4, 12, 20, 28,
    33, 41, 49, 57, 34, 42, 50, 58,
    1, 9, 17, 25, 2, 10, 18, 26,
];

/// Zone (1-64, index 0 unused) to object column of the log (1-71)
const ZONE_TO_LOG_PIXEL: [u8; ZONES + 1] = [
    0,
    1, 2, 3, 4, 5, 6, 7, 8,
    10, 11, 12, 13, 14, 15, 16, 17,
    19, 20, 21, 22, 23, 24, 25, 26,
    28, 29, 30, 31, 32, 33, 34, 35,
    37, 38, 39, 40, 41, 42, 43, 44,
    46, 47, 48, 49, 50, 51, 52, 53,
    55, 56, 57, 58, 59, 60, 61, 62,
    64, 65, 66, 67, 68, 69, 70, 71,
];

/// Histogram serial number to zone, 0 where the histogram has no pixel
/// (reference channels and the padding between sub-captures)
const PIXEL_MAP: [u8; SERIALS_8X8 as usize] = [
    0, 57, 61, 41, 45, 25, 29, 9, 13, 0,
    0, 58, 62, 42, 46, 26, 30, 10, 14, 0,
    0, 59, 63, 43, 47, 27, 31, 11, 15, 0,
    0, 60, 64, 44, 48, 28, 32, 12, 16, 0,
    0, 49, 53, 33, 37, 17, 21, 1, 5, 0,
    0, 50, 54, 34, 38, 18, 22, 2, 6, 0,
    0, 51, 55, 35, 39, 19, 23, 3, 7, 0,
    0, 52, 56, 36, 40, 20, 24, 4, 8, 0,
];

/// Inverse of the time-multiplexing permutation for measurement results.
///
/// `phase_offset` shifts which result number is taken as the first step of
/// the 4-step cycle, for sensors whose result counter is out of phase.
#[derive(Clone, Copy, Default, Eq, PartialEq, Debug)]
pub struct ZoneMap {
    pub phase_offset: u32,
}

impl ZoneMap {
    pub fn new(phase_offset: u32) -> Self {
        ZoneMap { phase_offset }
    }

    /// Step (0-3) of the time-multiplexing cycle that a result belongs to
    pub fn step(&self, result_num: i32) -> i64 {
        (result_num as i64 + self.phase_offset as i64).rem_euclid(STEPS)
    }

    /// Zone (1-64) of a result channel, or `None` if the channel (1-8) or
    /// sub-capture (0-1) is outside what the 8x8 mode produces
    pub fn zone(&self, result_num: i32, sub_capture: i32, channel: i32) -> Option<u8> {
        let channel = channel as i64;
        let sub_capture = sub_capture as i64;
        if !(1..=CHANNELS_PER_SUB_CAPTURE).contains(&channel) || !(0..=1).contains(&sub_capture) {
            return None;
        }
        let spad_ch = channel
            + CHANNELS_PER_SUB_CAPTURE * sub_capture
            + CHANNELS_PER_STEP * self.step(result_num);
        SPAD_CH_TO_ZONE.get(spad_ch as usize).copied()
    }

    /// Object column (1-71) of a result channel
    pub fn log_pixel(&self, result_num: i32, sub_capture: i32, channel: i32) -> Option<u8> {
        self.zone(result_num, sub_capture, channel).map(log_pixel)
    }
}

/// Object column (1-71) of a zone; zone 0 and anything past 64 map to 0
pub fn log_pixel(zone: u8) -> u8 {
    ZONE_TO_LOG_PIXEL.get(zone as usize).copied().unwrap_or(0)
}

/// Serial number of histogram A of a TDC in an 8x8 sequence; histogram B is the next one
pub fn serial(capture_num: i32, sub_capture: i32, tdc: usize) -> u32 {
    let sub_capture = sub_capture.clamp(0, MAX_SUB_CAPTURE) as u32;
    capture_num.rem_euclid(CAPTURES_PER_SEQUENCE) as u32 * HISTOGRAMS_PER_CAPTURE
        + sub_capture * HISTOGRAMS_PER_SUB_CAPTURE
        + tdc as u32 * CHANNELS_PER_TDC
}

/// Pixel (1-64) measured by an 8x8 histogram, if any
pub fn pixel(serial: u32) -> Option<u8> {
    match PIXEL_MAP.get(serial as usize) {
        Some(&p) if p > 0 => Some(p),
        _ => None,
    }
}

/// Pixel as a number, 0 if the histogram has none
pub fn pixel_number(serial: u32) -> u8 {
    pixel(serial).unwrap_or(0)
}

/// Two-digit pixel label used in `#HIST` tags, empty if the histogram has none
pub fn pixel_label(serial: u32) -> String {
    match pixel(serial) {
        Some(p) => format!("{:02}", p),
        None => String::new(),
    }
}
