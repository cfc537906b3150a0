//! Sources of raw message buffers

use anyhow::Result;

/// Blocking supplier of raw message buffers, e.g. a subscription to the sensor
pub trait Source {
    /// Wait for the next buffer; `None` once the source is closed
    fn recv(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Source that replays buffers from an iterator, for offline decoding
pub struct Replay<I> {
    bufs: I,
}

impl<I> Replay<I>
where
    I: Iterator<Item = Vec<u8>>,
{
    pub fn new(bufs: impl IntoIterator<IntoIter = I, Item = Vec<u8>>) -> Self {
        Replay { bufs: bufs.into_iter() }
    }

    /// Buffers that were not consumed
    pub fn into_inner(self) -> I {
        self.bufs
    }
}

impl<I> Source for Replay<I>
where
    I: Iterator<Item = Vec<u8>>,
{
    fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.bufs.next())
    }
}
