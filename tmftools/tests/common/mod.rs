#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use tmftools::msg::{ERROR_ID, HISTOGRAM_ID, RESULTS_ID, STATS_ID};
use tmftools::{MAX_BINS, MAX_NUM_RESULTS, MAX_TDC};

fn put(buf: &mut Vec<u8>, vals: &[i32]) {
    for &v in vals {
        buf.write_i32::<LittleEndian>(v).unwrap();
    }
}

/// Histogram message of 5 TDCs x 256 bins with bin values from `fill(tdc, bin)`
pub fn histogram(
    capture_num: i32,
    sub_capture: i32,
    histogram_type: i32,
    fill: impl Fn(usize, usize) -> i32,
) -> Vec<u8> {
    let mut buf = Vec::new();
    put(&mut buf, &[HISTOGRAM_ID, 0, capture_num, sub_capture, histogram_type, MAX_TDC as i32, MAX_BINS as i32]);
    for tdc in 0..MAX_TDC {
        for bin in 0..MAX_BINS {
            put(&mut buf, &[fill(tdc, bin)]);
        }
    }
    buf
}

/// All bins zero except TDC 0, bin 0 = 42
pub fn marked(capture_num: i32, sub_capture: i32) -> Vec<u8> {
    histogram(capture_num, sub_capture, 0, |tdc, bin| if (tdc, bin) == (0, 0) { 42 } else { 0 })
}

/// Every bin holds `tdc * 1000 + bin`
pub fn ramp(capture_num: i32, sub_capture: i32, histogram_type: i32) -> Vec<u8> {
    histogram(capture_num, sub_capture, histogram_type, |tdc, bin| (tdc * 1000 + bin) as i32)
}

/// Results message; entries are (confidence, distance, channel, target, sub_capture)
pub fn results(result_num: i32, entries: &[(i32, i32, i32, i32, i32)]) -> Vec<u8> {
    let mut buf = Vec::new();
    put(&mut buf, &[RESULTS_ID, 0, result_num, 25, 0, 0, 0, 0, entries.len() as i32, entries.len() as i32]);
    for &(confidence, distance, channel, target, sub_capture) in entries.iter().take(MAX_NUM_RESULTS) {
        put(&mut buf, &[confidence, distance, channel, target, sub_capture]);
    }
    buf
}

pub fn error(code: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    put(&mut buf, &[ERROR_ID, 12, code]);
    buf
}

pub fn stats(capture_num: i32, sub_capture: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    put(&mut buf, &[STATS_ID, 0, capture_num, sub_capture, 0, 100, 0, 5000]);
    put(&mut buf, &[0; 2 * MAX_TDC]);
    buf
}

pub fn other(id: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    put(&mut buf, &[id, 8]);
    buf
}

/// The 10 stale histograms discarded at the start of an 8x8 session
pub fn priming() -> Vec<Vec<u8>> {
    (0..10).map(|i| marked(1, i % 2)).collect()
}

/// Captures 0-3, sub-captures 0 and 1
pub fn sequence() -> Vec<Vec<u8>> {
    let mut msgs = Vec::new();
    for capture_num in 0..4 {
        for sub_capture in 0..2 {
            msgs.push(marked(capture_num, sub_capture));
        }
    }
    msgs
}

/// Priming, one full sequence, and the histogram that closes it
pub fn full_session() -> Vec<Vec<u8>> {
    let mut msgs = priming();
    msgs.extend(sequence());
    msgs.push(marked(0, 0));
    msgs
}

pub fn lines<'a>(log: &'a str, tag: &str) -> Vec<&'a str> {
    log.lines()
        .filter(|l| l.split(';').next().map_or(false, |t| t.starts_with(tag)))
        .collect()
}
