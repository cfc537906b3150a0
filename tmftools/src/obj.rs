//! Accumulation of measurement results into the `#OBJ` table

use crate::msg::MeasResult;
use crate::zone::{ZoneMap, LOG_PIXELS};

pub const TARGETS: usize = 2;

/// Latest result for each of the 72 object columns and its 2 targets.
///
/// Slot `(log_pixel - 1) * 2 + target` holds the result; columns that no
/// zone maps to stay zero.
#[derive(Clone, Debug)]
pub struct ObjectTable {
    zones: ZoneMap,
    entries: [MeasResult; LOG_PIXELS * TARGETS],
}

impl ObjectTable {
    pub fn new(zones: ZoneMap) -> Self {
        ObjectTable {
            zones,
            entries: [MeasResult::default(); LOG_PIXELS * TARGETS],
        }
    }

    pub fn reset(&mut self) {
        self.entries = [MeasResult::default(); LOG_PIXELS * TARGETS];
    }

    /// Slot of a result, or `None` if the channel has no zone or the target is not 0 or 1
    pub fn slot(&self, result_num: i32, sub_capture: i32, channel: i32, target: i32) -> Option<usize> {
        let target = usize::try_from(target).ok().filter(|&t| t < TARGETS)?;
        let opix = self.zones.log_pixel(result_num, sub_capture, channel)?;
        Some((opix as usize - 1) * TARGETS + target)
    }

    /// Overwrite the slot of a result, returning it, or `None` if the result was rejected
    pub fn set(
        &mut self,
        result_num: i32,
        sub_capture: i32,
        channel: i32,
        target: i32,
        distance_mm: i32,
        confidence: i32,
    ) -> Option<usize> {
        let slot = self.slot(result_num, sub_capture, channel, target)?;
        self.entries[slot] = MeasResult {
            confidence,
            distance_mm,
            channel,
            ch_target_idx: target,
            sub_capture,
        };
        Some(slot)
    }

    /// Store one entry of a results message
    pub fn record(&mut self, result_num: i32, r: &MeasResult) -> Option<usize> {
        self.set(
            result_num,
            r.sub_capture,
            r.channel,
            r.ch_target_idx,
            r.distance_mm,
            r.confidence,
        )
    }

    pub fn get(&self, result_num: i32, sub_capture: i32, channel: i32, target: i32) -> Option<&MeasResult> {
        self.slot(result_num, sub_capture, channel, target)
            .map(|slot| &self.entries[slot])
    }

    /// All slots in log order: column 1 target 0, column 1 target 1, column 2 target 0, ...
    pub fn entries(&self) -> &[MeasResult] {
        &self.entries
    }
}
