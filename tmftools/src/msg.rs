//! Decoding of the sensor's fixed-layout binary messages
//!
//! Every message is a little-endian record of 4-byte integers, at most
//! `MAX_MSG_SIZE` bytes long, that starts with a common header:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     Message id (selects the layout of the rest)
//! 4       4     Length
//! 8       ...   Variant payload
//! ```
//!
//! | id  | Variant            | Payload                                                  |
//! |-----|--------------------|----------------------------------------------------------|
//! | 0   | Measurement result | 8 counters, then 36 x {conf, dist, ch, target, sub}      |
//! | 2   | Measurement stats  | 6 counters, then raw hits[5], saturation counts[5]       |
//! | 3   | Histogram          | 5 counters, then bins[5][256]                            |
//! | 15  | Error              | error code                                               |
//!
//! Decoding never fails. Short buffers are zero-padded up to the fixed size
//! and anything past it is dropped. The counts embedded in the payload are
//! clamped to the capacity of the fixed arrays before they are used.

use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;

use crate::{MAX_BINS, MAX_MSG_SIZE, MAX_NUM_RESULTS, MAX_TDC};

pub const RESULTS_ID: i32 = 0;
pub const STATS_ID: i32 = 2;
pub const HISTOGRAM_ID: i32 = 3;
pub const ERROR_ID: i32 = 0xF;

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct Header {
    pub id: i32,
    pub len: i32,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct ErrorMsg {
    pub hdr: Header,
    pub error_code: i32,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct HistogramMsg {
    pub hdr: Header,
    /// Monotonic capture counter, also reported as the transaction id
    pub capture_num: i32,
    pub sub_capture: i32,
    pub histogram_type: i32,
    /// Number of TDCs with data, clamped to `MAX_TDC`
    pub num_tdc: usize,
    /// Declared bins per TDC, clamped to `MAX_BINS`
    pub num_bins: usize,
    pub bins: [[i32; MAX_BINS]; MAX_TDC],
}

impl HistogramMsg {
    /// Bin tables of the TDCs that carry data
    pub fn tdcs(&self) -> &[[i32; MAX_BINS]] {
        &self.bins[..self.num_tdc]
    }
}

/// A single target detected in one channel
#[derive(Clone, Copy, Default, Eq, PartialEq, Debug)]
pub struct MeasResult {
    pub confidence: i32,
    pub distance_mm: i32,
    pub channel: i32,
    /// Target 0 or 1 within the channel
    pub ch_target_idx: i32,
    pub sub_capture: i32,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ResultsMsg {
    pub hdr: Header,
    pub result_num: i32,
    pub temperature: i32,
    pub ambient_light: i32,
    pub photon_count: i32,
    pub ref_photon_count: i32,
    pub sys_ticks: i32,
    /// Number of leading entries of `results` that are filled, clamped to `MAX_NUM_RESULTS`
    pub valid_results: usize,
    pub num_results: i32,
    pub results: [MeasResult; MAX_NUM_RESULTS],
}

impl ResultsMsg {
    pub fn valid(&self) -> &[MeasResult] {
        &self.results[..self.valid_results]
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct StatsMsg {
    pub hdr: Header,
    pub capture_num: i32,
    pub sub_capture: i32,
    pub tdcif_status: i32,
    pub iterations_configured: i32,
    pub remaining_iterations: i32,
    pub accumulated_hits: i32,
    pub raw_hits: [i32; MAX_TDC],
    pub saturation_cnt: [i32; MAX_TDC],
}

/// A decoded message, selected by the id in its header
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Message {
    Error(ErrorMsg),
    Histogram(Box<HistogramMsg>),
    Results(Box<ResultsMsg>),
    Stats(StatsMsg),
    /// Any id without a known layout
    Other(Header),
}

impl Message {
    /// Decode one raw buffer as received from the sensor
    pub fn decode(buf: &[u8]) -> Message {
        let mut padded = [0u8; MAX_MSG_SIZE];
        if buf.len() > MAX_MSG_SIZE {
            warn!(len = buf.len(), max = MAX_MSG_SIZE, "oversized message truncated");
        }
        let n = buf.len().min(MAX_MSG_SIZE);
        padded[..n].copy_from_slice(&buf[..n]);

        let mut f = Fields::new(&padded);
        let hdr = Header {
            id: f.int(),
            len: f.int(),
        };
        match hdr.id {
            ERROR_ID => Message::Error(ErrorMsg {
                hdr,
                error_code: f.int(),
            }),
            HISTOGRAM_ID => {
                let mut hist = HistogramMsg {
                    hdr,
                    capture_num: f.int(),
                    sub_capture: f.int(),
                    histogram_type: f.int(),
                    num_tdc: count("num_tdc", f.int(), MAX_TDC),
                    num_bins: count("num_bins", f.int(), MAX_BINS),
                    bins: [[0; MAX_BINS]; MAX_TDC],
                };
                for tdc in hist.bins.iter_mut() {
                    f.ints(tdc);
                }
                Message::Histogram(Box::new(hist))
            }
            RESULTS_ID => {
                let mut res = ResultsMsg {
                    hdr,
                    result_num: f.int(),
                    temperature: f.int(),
                    ambient_light: f.int(),
                    photon_count: f.int(),
                    ref_photon_count: f.int(),
                    sys_ticks: f.int(),
                    valid_results: count("valid_results", f.int(), MAX_NUM_RESULTS),
                    num_results: f.int(),
                    results: [MeasResult::default(); MAX_NUM_RESULTS],
                };
                for r in res.results.iter_mut() {
                    *r = MeasResult {
                        confidence: f.int(),
                        distance_mm: f.int(),
                        channel: f.int(),
                        ch_target_idx: f.int(),
                        sub_capture: f.int(),
                    };
                }
                Message::Results(Box::new(res))
            }
            STATS_ID => {
                let mut stats = StatsMsg {
                    hdr,
                    capture_num: f.int(),
                    sub_capture: f.int(),
                    tdcif_status: f.int(),
                    iterations_configured: f.int(),
                    remaining_iterations: f.int(),
                    accumulated_hits: f.int(),
                    raw_hits: [0; MAX_TDC],
                    saturation_cnt: [0; MAX_TDC],
                };
                f.ints(&mut stats.raw_hits);
                f.ints(&mut stats.saturation_cnt);
                Message::Stats(stats)
            }
            _ => Message::Other(hdr),
        }
    }

    pub fn header(&self) -> Header {
        match self {
            Message::Error(m) => m.hdr,
            Message::Histogram(m) => m.hdr,
            Message::Results(m) => m.hdr,
            Message::Stats(m) => m.hdr,
            Message::Other(hdr) => *hdr,
        }
    }
}

/// Sequential reader of 4-byte fields. The largest layout ends well before
/// `MAX_MSG_SIZE`, so reads stay in bounds.
struct Fields<'a> {
    buf: &'a [u8; MAX_MSG_SIZE],
    pos: usize,
}

impl<'a> Fields<'a> {
    fn new(buf: &'a [u8; MAX_MSG_SIZE]) -> Self {
        Fields { buf, pos: 0 }
    }

    #[inline]
    fn int(&mut self) -> i32 {
        let v = LittleEndian::read_i32(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        v
    }

    #[inline]
    fn ints(&mut self, dst: &mut [i32]) {
        let end = self.pos + 4 * dst.len();
        LittleEndian::read_i32_into(&self.buf[self.pos..end], dst);
        self.pos = end;
    }
}

/// Clamp an embedded count to the capacity of the array it indexes
fn count(field: &'static str, value: i32, max: usize) -> usize {
    match usize::try_from(value) {
        Ok(v) if v <= max => v,
        _ => {
            warn!(field, value, max, "count out of range, clamped");
            if value < 0 {
                0
            } else {
                max
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn ints(vals: &[i32]) -> Vec<u8> {
        let mut b = Vec::new();
        for &v in vals {
            b.write_i32::<LittleEndian>(v).unwrap();
        }
        b
    }

    #[test]
    fn empty_buffer_is_results() {
        // All-zero padding reads as id 0
        match Message::decode(&[]) {
            Message::Results(res) => {
                assert_eq!(res.valid_results, 0);
                assert!(res.valid().is_empty());
            }
            m => panic!("unexpected {:?}", m),
        }
    }

    #[test]
    fn error_code() {
        let m = Message::decode(&ints(&[ERROR_ID, 12, 7]));
        assert_eq!(
            m,
            Message::Error(ErrorMsg {
                hdr: Header { id: ERROR_ID, len: 12 },
                error_code: 7
            })
        );
    }

    #[test]
    fn histogram_fields_and_bins() {
        let mut b = ints(&[HISTOGRAM_ID, 0, 9, 1, 0, 5, 256]);
        let mut bins = vec![0; MAX_TDC * MAX_BINS];
        bins[0] = 42;
        bins[MAX_BINS + 129] = 3;
        bins[MAX_TDC * MAX_BINS - 1] = -1;
        b.extend(ints(&bins));
        match Message::decode(&b) {
            Message::Histogram(h) => {
                assert_eq!((h.capture_num, h.sub_capture, h.histogram_type), (9, 1, 0));
                assert_eq!((h.num_tdc, h.num_bins), (5, 256));
                assert_eq!(h.bins[0][0], 42);
                assert_eq!(h.bins[1][129], 3);
                assert_eq!(h.bins[4][255], -1);
                assert_eq!(h.tdcs().len(), 5);
            }
            m => panic!("unexpected {:?}", m),
        }
    }

    #[test]
    fn histogram_counts_clamped() {
        let b = ints(&[HISTOGRAM_ID, 0, 0, 0, 0, 1_000_000, -3]);
        match Message::decode(&b) {
            Message::Histogram(h) => {
                assert_eq!(h.num_tdc, MAX_TDC);
                assert_eq!(h.num_bins, 0);
            }
            m => panic!("unexpected {:?}", m),
        }
    }

    #[test]
    fn results_truncated_mid_record() {
        // One full result record, and a second cut off after its distance
        let mut b = ints(&[RESULTS_ID, 0, 21, 0, 0, 0, 0, 0, 99, 2]);
        b.extend(ints(&[80, 1234, 3, 1, 0]));
        b.extend(ints(&[60, 777]));
        match Message::decode(&b) {
            Message::Results(res) => {
                assert_eq!(res.result_num, 21);
                assert_eq!(res.valid_results, MAX_NUM_RESULTS);
                assert_eq!(res.num_results, 2);
                assert_eq!(
                    res.results[0],
                    MeasResult {
                        confidence: 80,
                        distance_mm: 1234,
                        channel: 3,
                        ch_target_idx: 1,
                        sub_capture: 0
                    }
                );
                assert_eq!((res.results[1].confidence, res.results[1].distance_mm), (60, 777));
                assert_eq!(res.results[1].channel, 0);
            }
            m => panic!("unexpected {:?}", m),
        }
    }

    #[test]
    fn stats_arrays() {
        let mut b = ints(&[STATS_ID, 0, 4, 1, 0, 100, 50, 9000]);
        b.extend(ints(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]));
        match Message::decode(&b) {
            Message::Stats(s) => {
                assert_eq!(s.accumulated_hits, 9000);
                assert_eq!(s.raw_hits, [1, 2, 3, 4, 5]);
                assert_eq!(s.saturation_cnt, [6, 7, 8, 9, 10]);
            }
            m => panic!("unexpected {:?}", m),
        }
    }

    #[test]
    fn unknown_and_oversized() {
        let mut b = ints(&[7, 3]);
        b.resize(MAX_MSG_SIZE + 100, 0xff);
        assert_eq!(Message::decode(&b).header(), Header { id: 7, len: 3 });
        assert_eq!(Message::decode(&b), Message::Other(Header { id: 7, len: 3 }));
    }
}
