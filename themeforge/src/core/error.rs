//! Crate-wide error taxonomy.
//!
//! Fatal for the calling process: [`Error::ChannelUnavailable`] and
//! [`Error::ListenerTimeout`] — there is no automatic resync between the
//! editor and the render process, so the caller is expected to surface a
//! blocking diagnostic and relaunch. Everything else is recoverable at the
//! site that observes it.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Connect retries to the render process exhausted.
    #[error(
        "unable to reach render process at {endpoint} after {attempts} attempts"
    )]
    ChannelUnavailable { endpoint: String, attempts: u32 },

    /// The listener-ready marker never appeared within the polling budget.
    #[error(
        "render listener never became ready ({polls} polls over {waited:?})"
    )]
    ListenerTimeout { polls: u32, waited: Duration },

    /// Stream closed before a full frame could be read. Receivers treat this
    /// as "no command" and drop the connection.
    #[error("truncated frame: expected {expected} bytes, got {actual}")]
    TruncatedFrame { expected: usize, actual: usize },

    /// Frame header or payload bytes that cannot possibly carry a command.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Domain/operation outside the closed command set. Programmer error;
    /// never silently ignored.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Undo or redo called with nothing to pop.
    #[error("nothing to {action}")]
    EmptyStack { action: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn is_truncated_frame(&self) -> bool {
        matches!(self, Error::TruncatedFrame { .. })
    }
}
