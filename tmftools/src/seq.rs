//! Reassembly of complete capture sequences from the sensor's message stream
//!
//! A [`Session`] consumes decoded messages one at a time. After discarding the
//! stale histograms buffered at subscription time (the preflush), it waits for
//! the histogram that opens a sequence, logs every histogram until the next
//! sequence opens, and meanwhile folds measurement results into the object
//! table. The finished log ends with the `#OBJ` record in 8x8 mode.
//!
//! ```text
//!                    sequence start                 sequence start
//! AwaitingFirstCapture ----------> Logging -----------------------> Done
//!          |                         |
//!          +-------------------------+--> Failed (error message, no
//!                                         sub-capture 1, starvation)
//! ```

use anyhow::Result;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::cfg::{Layout, SessionConfig};
use crate::error::SessionError;
use crate::msg::{HistogramMsg, Message, ResultsMsg};
use crate::obj::ObjectTable;
use crate::reduce::{NoReducer, Reducer};
use crate::ser;
use crate::source::Source;
use crate::zone::ZoneMap;
use crate::{Histogram, BINS_PER_CHANNEL, MAX_SUB_CAPTURE};

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum State {
    AwaitingFirstCapture,
    Logging,
    Done,
    Failed(SessionError),
}

/// Whether a session wants more messages
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Step {
    Continue,
    Finished,
}

/// Everything produced by a completed sequence
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Report<T> {
    pub log: String,
    /// Reducer results by histogram serial number; empty without a reducer
    pub reduced: BTreeMap<u32, T>,
    /// Raw bins of the histograms listed in `SessionConfig::return_serials`, in arrival order
    pub raw: Vec<Histogram>,
}

/// A completed sequence, or the condition that ended the session.
/// `SessionError::log_line` gives the text that replaces the log.
pub type Outcome<T> = std::result::Result<Report<T>, SessionError>;

/// One decoding session; all counters and accumulated output belong to it
pub struct Session<R: Reducer = NoReducer> {
    cfg: SessionConfig,
    state: State,
    histograms: u32,
    idle: u32,
    /// `#HIST` records written
    logged: usize,
    seen_sub_capture_one: bool,
    objects: ObjectTable,
    log: csv::Writer<Vec<u8>>,
    reducer: Option<R>,
    reduced: BTreeMap<u32, R::Output>,
    raw: Vec<Histogram>,
}

impl Session<NoReducer> {
    pub fn new(cfg: SessionConfig) -> Self {
        Session::build(cfg, None)
    }
}

impl<R: Reducer> Session<R> {
    /// Session that evaluates `reducer` on every logged histogram
    pub fn with_reducer(cfg: SessionConfig, reducer: R) -> Self {
        Session::build(cfg, Some(reducer))
    }

    fn build(cfg: SessionConfig, reducer: Option<R>) -> Self {
        Session {
            objects: ObjectTable::new(ZoneMap::new(cfg.phase_offset)),
            cfg,
            state: State::AwaitingFirstCapture,
            histograms: 0,
            idle: 0,
            logged: 0,
            seen_sub_capture_one: false,
            log: ser::writer(Vec::new()),
            reducer,
            reduced: BTreeMap::new(),
            raw: Vec::new(),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    /// Number of `#HIST` records written so far
    pub fn histograms_logged(&self) -> usize {
        self.logged
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Done | State::Failed(_))
    }

    /// Decode and process one raw buffer
    pub fn feed(&mut self, buf: &[u8]) -> Result<Step> {
        if self.is_finished() {
            return Ok(Step::Finished);
        }
        self.process(&Message::decode(buf))
    }

    /// Process one message. Once finished, further messages are ignored.
    pub fn process(&mut self, msg: &Message) -> Result<Step> {
        if !self.is_finished() {
            match msg {
                Message::Histogram(hist) => self.histogram(hist)?,
                Message::Results(res) => self.results(res),
                Message::Error(err) => self.fail(SessionError::Protocol { code: err.error_code }),
                Message::Stats(stats) => {
                    debug!(
                        capture = stats.capture_num,
                        sub_capture = stats.sub_capture,
                        accumulated_hits = stats.accumulated_hits,
                        "stats"
                    );
                    self.idle();
                }
                Message::Other(hdr) => {
                    debug!(id = hdr.id, len = hdr.len, "unrecognized message");
                    self.idle();
                }
            }
        }
        Ok(if self.is_finished() { Step::Finished } else { Step::Continue })
    }

    /// Consume buffers from `src` until the session finishes or the source closes
    pub fn run<S: Source>(mut self, src: &mut S) -> Result<Outcome<R::Output>> {
        while let Some(buf) = src.recv()? {
            if self.feed(&buf)? == Step::Finished {
                break;
            }
        }
        self.finish()
    }

    /// Close the session and produce its outcome
    pub fn finish(mut self) -> Result<Outcome<R::Output>> {
        match self.state {
            State::Done => {}
            State::Failed(err) => return Ok(Err(err)),
            State::AwaitingFirstCapture | State::Logging => {
                warn!("source closed before the sequence completed");
                return Ok(Err(SessionError::Incomplete));
            }
        }
        if self.cfg.layout.populates_objects() {
            ser::obj(&mut self.log, &self.objects)?;
        }
        let log = self.log.into_inner().map_err(|e| e.into_error())?;
        info!(histograms = self.logged, raw = self.raw.len(), "sequence complete");
        Ok(Ok(Report {
            log: String::from_utf8(log)?,
            reduced: self.reduced,
            raw: self.raw,
        }))
    }

    fn histogram(&mut self, hist: &HistogramMsg) -> Result<()> {
        let layout = self.cfg.layout;
        if !(0..=MAX_SUB_CAPTURE).contains(&hist.sub_capture) {
            warn!(
                capture = hist.capture_num,
                sub_capture = hist.sub_capture,
                "histogram with invalid sub-capture dropped"
            );
            self.idle();
            return Ok(());
        }
        self.idle = 0;
        if hist.sub_capture == 1 {
            self.seen_sub_capture_one = true;
        }
        self.histograms = self.histograms.saturating_add(1);
        if self.histograms <= self.cfg.preflush() || layout.skips(hist) {
            return Ok(());
        }
        if layout.requires_time_multiplexing() && !self.seen_sub_capture_one {
            self.fail(SessionError::NotTimeMultiplexed);
            return Ok(());
        }

        if layout.is_sequence_start(hist) {
            match self.state {
                State::Logging => {
                    debug!(capture = hist.capture_num, "sequence closed");
                    self.state = State::Done;
                    return Ok(());
                }
                State::AwaitingFirstCapture => {
                    debug!(capture = hist.capture_num, "sequence opened");
                    self.state = State::Logging;
                }
                _ => {}
            }
        }

        if self.state == State::Logging {
            self.log_histogram(layout, hist)?;
        }
        Ok(())
    }

    fn log_histogram(&mut self, layout: Layout, hist: &HistogramMsg) -> Result<()> {
        ser::histinfo(&mut self.log, hist)?;
        for (tdc, bins) in hist.tdcs().iter().enumerate() {
            let serial = layout.serial(hist, tdc);
            let (a, b) = bins.split_at(BINS_PER_CHANNEL);
            for (serial, bins) in [(serial, a), (serial + 1, b)] {
                if let Some(reducer) = self.reducer.as_mut() {
                    self.reduced.insert(serial, reducer.reduce(bins));
                }
                if self.cfg.return_serials.contains(&serial) {
                    self.raw.push(Histogram { serial, bins: bins.to_vec() });
                }
                ser::hist(&mut self.log, &layout.label(serial), bins)?;
                self.logged += 1;
            }
        }
        Ok(())
    }

    fn results(&mut self, res: &ResultsMsg) {
        if self.cfg.layout.results_count_as_idle() {
            self.idle();
        }
        if self.histograms <= self.cfg.preflush() || !self.cfg.layout.populates_objects() {
            return;
        }
        for r in res.valid() {
            if self.objects.record(res.result_num, r).is_none() {
                warn!(
                    result_num = res.result_num,
                    channel = r.channel,
                    sub_capture = r.sub_capture,
                    target = r.ch_target_idx,
                    "result has no object slot, dropped"
                );
            }
        }
    }

    fn idle(&mut self) {
        self.idle = self.idle.saturating_add(1);
        if self.idle > self.cfg.max_idle() {
            self.fail(SessionError::Starved { messages: self.idle });
        }
    }

    fn fail(&mut self, err: SessionError) {
        warn!(%err, "session failed");
        self.state = State::Failed(err);
    }
}

/// Decode one complete sequence and render its log
pub fn decode_sequence<S: Source>(src: &mut S, cfg: SessionConfig) -> Result<Outcome<()>> {
    Session::new(cfg).run(src)
}

/// Decode one complete sequence, also reducing every logged histogram
pub fn decode_sequence_with<S, R>(src: &mut S, cfg: SessionConfig, reducer: R) -> Result<Outcome<R::Output>>
where
    S: Source,
    R: Reducer,
{
    Session::with_reducer(cfg, reducer).run(src)
}

/// Decode one complete sequence, returning the raw bins of the given histograms
pub fn extract_histograms<S: Source>(src: &mut S, cfg: SessionConfig, serials: &[u32]) -> Result<Outcome<()>> {
    let cfg = SessionConfig {
        return_serials: serials.to_vec(),
        ..cfg
    };
    Session::new(cfg).run(src)
}
