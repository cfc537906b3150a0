//! Conditions that end a decoding session without a complete sequence

use thiserror::Error;

/// Every variant is terminal: the session stops consuming messages and its
/// log is replaced by the single `#ERROR` line of the variant.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum SessionError {
    /// The sensor reported an error
    #[error("CODE: {code}")]
    Protocol { code: i32 },
    /// No histogram of sub-capture 1 arrived, so the sensor is not time-multiplexing
    #[error("Time multiplexed measurement not enabled. Exiting.")]
    NotTimeMultiplexed,
    /// Too many messages in a row that were neither histograms nor results
    #[error("Histogram dumping not enabled. Exiting.")]
    Starved { messages: u32 },
    /// The message source closed before a full sequence was seen
    #[error("Stream ended before a complete sequence. Exiting.")]
    Incomplete,
}

impl SessionError {
    /// The `#ERROR` line that stands in for the session's log
    pub fn log_line(&self) -> String {
        format!("#ERROR;{}\n", self)
    }
}
