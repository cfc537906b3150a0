//! Session configuration: which capture layout to expect and how patient to be
//!
//! Configurations are stored as JSON. Every field is optional, so the
//! smallest useful file is `{}`, which decodes one 8x8 time-multiplexed
//! sequence with the default preflush and starvation bounds:
//!
//! ```json
//! {
//!     "layout": "Direct4x4",
//!     "preflush": 40,
//!     "return_serials": [0, 1, 12]
//! }
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::msg::HistogramMsg;
use crate::{
    zone, CAPTURES_PER_SEQUENCE, CHANNELS_PER_TDC, HISTOGRAMS_PER_SUB_CAPTURE, MAX_SUB_CAPTURE,
};

pub const PREFLUSH_8X8: u32 = 10;
pub const PREFLUSH_4X4: u32 = 40;
pub const MAX_IDLE: u32 = 100;

/// Pixel geometry of the capture sequence
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Layout {
    /// 64 zones in 4 time-multiplexed captures of 2 sub-captures; a sequence
    /// starts at capture 0 mod 4, sub-capture 0, and fills the object table
    TimeMultiplexed8x8,
    /// 4x4 zones, a sequence per sub-capture cycle; no object table
    Direct4x4,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::TimeMultiplexed8x8
    }
}

impl Layout {
    pub fn default_preflush(self) -> u32 {
        match self {
            Layout::TimeMultiplexed8x8 => PREFLUSH_8X8,
            Layout::Direct4x4 => PREFLUSH_4X4,
        }
    }

    /// Whether a histogram opens a new sequence (and so closes the previous one)
    pub fn is_sequence_start(self, hist: &HistogramMsg) -> bool {
        match self {
            Layout::TimeMultiplexed8x8 => {
                hist.capture_num.rem_euclid(CAPTURES_PER_SEQUENCE) == 0 && hist.sub_capture == 0
            }
            Layout::Direct4x4 => hist.sub_capture == 0,
        }
    }

    /// Serial number of histogram A of a TDC
    pub fn serial(self, hist: &HistogramMsg, tdc: usize) -> u32 {
        match self {
            Layout::TimeMultiplexed8x8 => zone::serial(hist.capture_num, hist.sub_capture, tdc),
            Layout::Direct4x4 => {
                hist.sub_capture.clamp(0, MAX_SUB_CAPTURE) as u32 * HISTOGRAMS_PER_SUB_CAPTURE
                    + tdc as u32 * CHANNELS_PER_TDC
            }
        }
    }

    /// Suffix of the `#HIST` tag of a histogram
    pub fn label(self, serial: u32) -> String {
        match self {
            Layout::TimeMultiplexed8x8 => zone::pixel_label(serial),
            Layout::Direct4x4 => serial.to_string(),
        }
    }

    pub fn populates_objects(self) -> bool {
        matches!(self, Layout::TimeMultiplexed8x8)
    }

    /// Whether results messages count toward the idle bound like any other
    /// message that is not a histogram
    pub fn results_count_as_idle(self) -> bool {
        matches!(self, Layout::Direct4x4)
    }

    pub fn requires_time_multiplexing(self) -> bool {
        matches!(self, Layout::TimeMultiplexed8x8)
    }

    /// Electrical calibration histograms (type 1) are not part of a 4x4 sequence
    pub fn skips(self, hist: &HistogramMsg) -> bool {
        matches!(self, Layout::Direct4x4) && hist.histogram_type == 1
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionConfig {
    #[serde(default)]
    pub layout: Layout,
    /// Histograms discarded after subscribing, defaults per layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preflush: Option<u32>,
    /// Consecutive non-progress messages tolerated before giving up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_idle: Option<u32>,
    /// Phase correction of the result counter, see `zone::ZoneMap`
    #[serde(default)]
    pub phase_offset: u32,
    /// Histograms whose raw bins are returned alongside the log
    #[serde(default = "emptyvec", skip_serializing_if = "Vec::is_empty")]
    pub return_serials: Vec<u32>,
}

fn emptyvec<T>() -> Vec<T> {
    Vec::new()
}

impl SessionConfig {
    pub fn new(layout: Layout) -> Self {
        SessionConfig {
            layout,
            ..Default::default()
        }
    }

    pub fn preflush(&self) -> u32 {
        self.preflush.unwrap_or_else(|| self.layout.default_preflush())
    }

    pub fn max_idle(&self) -> u32 {
        self.max_idle.unwrap_or(MAX_IDLE)
    }
}

/// Read a JSON session configuration
pub fn load(rdr: impl Read) -> Result<SessionConfig> {
    let cfg = serde_json::from_reader(rdr)?;
    Ok(cfg)
}
