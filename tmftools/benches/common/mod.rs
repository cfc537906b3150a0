#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use tmftools::msg::{HISTOGRAM_ID, RESULTS_ID};
use tmftools::{MAX_BINS, MAX_TDC};

/// Histogram with a ramp in every TDC, as a capture with real counts would fill all bins
pub fn histogram(capture_num: i32, sub_capture: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    for v in [HISTOGRAM_ID, 0, capture_num, sub_capture, 0, MAX_TDC as i32, MAX_BINS as i32] {
        buf.write_i32::<LittleEndian>(v).unwrap();
    }
    for tdc in 0..MAX_TDC {
        for bin in 0..MAX_BINS {
            buf.write_i32::<LittleEndian>((tdc * 1000 + bin) as i32).unwrap();
        }
    }
    buf
}

/// Results for all 16 channels of one time-multiplexing step, both targets
pub fn results(result_num: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    for v in [RESULTS_ID, 0, result_num, 25, 0, 0, 0, 0, 32, 32] {
        buf.write_i32::<LittleEndian>(v).unwrap();
    }
    for sub_capture in 0..2 {
        for channel in 1..=8 {
            for target in 0..2 {
                for v in [100 - target * 50, 1000 + channel * 10 + target, channel, target, sub_capture] {
                    buf.write_i32::<LittleEndian>(v).unwrap();
                }
            }
        }
    }
    buf
}

/// Preflush, one interleaved 8x8 sequence, and the histogram that closes it
pub fn full_session() -> Vec<Vec<u8>> {
    let mut msgs = (0..10).map(|i| histogram(1, i % 2)).collect::<Vec<_>>();
    for capture_num in 0..4 {
        for sub_capture in 0..2 {
            msgs.push(histogram(capture_num, sub_capture));
        }
        msgs.push(results(capture_num));
    }
    msgs.push(histogram(4, 0));
    msgs
}
