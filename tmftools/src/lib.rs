pub mod cfg;
pub mod de;
pub mod error;
pub mod msg;
pub mod obj;
pub mod reduce;
pub mod seq;
pub mod ser;
pub mod source;
pub mod zone;

/// Size of every message buffer on the wire; shorter buffers are zero-padded
pub const MAX_MSG_SIZE: usize = 8192;
pub const MAX_NUM_RESULTS: usize = 36;
pub const MAX_BINS: usize = 256;
pub const MAX_TDC: usize = 5;

/// Each TDC carries two logical histograms, A and B, of 128 bins each
pub const BINS_PER_CHANNEL: usize = 128;
pub const CHANNELS_PER_TDC: u32 = 2;
pub const CAPTURES_PER_SEQUENCE: i32 = 4;
/// Highest sub-capture index a histogram may carry
pub const MAX_SUB_CAPTURE: i32 = 3;
pub const HISTOGRAMS_PER_CAPTURE: u32 = 20;
pub const HISTOGRAMS_PER_SUB_CAPTURE: u32 = 10;

/// One logical 128-bin histogram, identified by its serial number within a sequence
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Histogram {
    pub serial: u32,
    pub bins: Vec<i32>,
}
