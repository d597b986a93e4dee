//! Error types for monodemux-av.

use crate::engine::EngineError;
use monodemux_common::MediaKind;
use std::fmt;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// The engine step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOperation {
    /// Opening the input and detecting its container format.
    Open,
    /// Scanning the input for per-stream codec parameters.
    Probe,
    /// Reading the next packet.
    Read,
    /// Seeking within a stream.
    Seek,
}

impl fmt::Display for EngineOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Probe => write!(f, "probe"),
            Self::Read => write!(f, "read"),
            Self::Seek => write!(f, "seek"),
        }
    }
}

/// Errors that can occur during a demuxing session.
///
/// End of stream is not an error: [`crate::DemuxSession::read_packet`]
/// reports it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Empty or malformed input to a public operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation needs an open session.
    #[error("session is not open")]
    NotOpen,

    /// The opened file has no stream of the session's kind.
    #[error("no {0} stream in the opened file")]
    NoActiveStream(MediaKind),

    /// The underlying engine reported an error.
    #[error("engine {operation} failed: {source}")]
    Engine {
        operation: EngineOperation,
        #[source]
        source: EngineError,
    },
}

impl Error {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Wrap an engine error with the step that produced it.
    pub fn engine(operation: EngineOperation, source: EngineError) -> Self {
        Self::Engine { operation, source }
    }

    /// Whether the engine itself reported this failure.
    pub fn is_engine_failure(&self) -> bool {
        matches!(self, Self::Engine { .. })
    }
}
