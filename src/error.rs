// ABOUTME: Transport-wide error type shared by the link, wire codec, dispatcher and pipelines
// ABOUTME: Every variant here is non-fatal to a peer-facing loop; callers retry, log, or drop

use std::io;
use thiserror::Error;

/// Errors surfaced by the streaming transport.
///
/// No variant here is allowed to unwind a long-running task. Each caller
/// decides locally whether to retry, sleep-and-retry, log-and-drop, or
/// (for `Stopped`) unwind cleanly because `stop()` was called.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The duplex link is not in the `Connected` state, or an I/O error was
    /// observed on the socket. Recovery is always "wait for reconnect".
    #[error("no connection to peer")]
    NoConnection,

    /// A non-blocking read found nothing queued yet.
    #[error("no data available")]
    NoDataAvailable,

    /// A length-prefixed field declared a size that would exceed a sane
    /// bound, or a string field was not valid UTF-8.
    #[error("malformed packet framing: {0}")]
    Framing(String),

    /// The plugged-in decoder rejected a VideoData body it was given.
    #[error("frame decode error: {0}")]
    DecodeError(String),

    /// The plugged-in OS input backend rejected an event. Callers swallow
    /// this rather than propagate it.
    #[error("input backend error: {0}")]
    InputBackendError(String),

    /// `stop()` was called while a task was blocked in I/O or a queue wait.
    #[error("stopped")]
    Stopped,

    /// Wraps the underlying I/O error that caused a socket to be declared
    /// broken, preserved for logging.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
