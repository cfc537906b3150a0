//! Per-histogram reductions evaluated while a sequence is logged

use std::collections::BTreeMap;
use std::ops::Range;

use crate::zone;

/// Reduces one 128-bin histogram to a value, stored by histogram serial number.
///
/// Implemented for any `FnMut(&[i32]) -> T`, so closures can be passed directly.
pub trait Reducer {
    type Output;
    fn reduce(&mut self, bins: &[i32]) -> Self::Output;
}

impl<F, T> Reducer for F
where
    F: FnMut(&[i32]) -> T,
{
    type Output = T;

    fn reduce(&mut self, bins: &[i32]) -> T {
        self(bins)
    }
}

/// Placeholder for sessions without a reducer; never evaluated
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReducer;

impl Reducer for NoReducer {
    type Output = ();

    fn reduce(&mut self, _bins: &[i32]) {}
}

/// Optical crosstalk: the peak count in the bins just after the laser pulse
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Crosstalk {
    pub window: Range<usize>,
}

impl Default for Crosstalk {
    fn default() -> Self {
        Crosstalk { window: 5..20 }
    }
}

impl Reducer for Crosstalk {
    type Output = i32;

    fn reduce(&mut self, bins: &[i32]) -> i32 {
        let end = self.window.end.min(bins.len());
        let start = self.window.start.min(end);
        bins[start..end].iter().copied().max().unwrap_or(0)
    }
}

/// Keep only values of histograms that measure a pixel, in serial order
pub fn filter_non_pixel<T: Clone>(vals: &BTreeMap<u32, T>) -> Vec<T> {
    (0..zone::SERIALS_8X8)
        .filter(|&serial| zone::pixel(serial).is_some())
        .filter_map(|serial| vals.get(&serial).cloned())
        .collect()
}
