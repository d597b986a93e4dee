//! The container engine a session drives.
//!
//! A session never parses bytes itself. It talks to an [`Engine`], which owns
//! format detection, packet extraction and codec parameter discovery:
//!
//! - **Memory** (always available): [`memory::MemoryEngine`], media described
//!   in memory, used for tests and replaying pre-demuxed data
//! - **Native FFmpeg** (optional): [`ffmpeg::FfmpegEngine`] via the
//!   `native-ffmpeg` feature

pub mod memory;

#[cfg(feature = "native-ffmpeg")]
pub mod ffmpeg;

use monodemux_common::{rescale, MediaKind, Rational, SeekFlags};
use std::path::Path;

/// An error reported by an engine, with its code and diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EngineError {
    /// Engine-defined error code (negative for FFmpeg).
    pub code: i32,
    /// Human-readable diagnostic from the engine.
    pub message: String,
}

impl EngineError {
    /// Create a new engine error.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A snapshot of one entry in the engine's stream table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    /// Index of the stream in the container.
    pub index: usize,
    /// Kind of the stream, if it is video or audio.
    pub kind: Option<MediaKind>,
    /// Timebase of the stream's timestamps.
    pub time_base: Rational,
    /// Duration in `time_base` ticks, if the container records one.
    pub duration: Option<i64>,
}

/// A demultiplexed packet owned by the caller.
///
/// Dropping the packet releases it back to the engine.
pub trait EnginePacket {
    /// Index of the stream this packet belongs to.
    fn stream_index(&self) -> usize;

    /// Presentation timestamp in the stream's timebase.
    fn pts(&self) -> Option<i64>;

    /// Decoding timestamp in the stream's timebase.
    fn dts(&self) -> Option<i64>;

    /// Duration in the stream's timebase (0 if unknown).
    fn duration(&self) -> i64;

    /// Whether the packet starts with a keyframe.
    fn is_key(&self) -> bool;

    /// Encoded payload.
    fn data(&self) -> &[u8];
}

/// A container/codec parsing engine.
///
/// All calls are synchronous and may block on I/O. A [`Engine::Context`] is
/// one opened input, exclusively owned by whoever opened it.
pub trait Engine {
    /// One opened input.
    type Context;
    /// A packet read from a context.
    type Packet: EnginePacket;

    /// Open `path` and detect its container format.
    fn open_input(&self, path: &Path) -> Result<Self::Context, EngineError>;

    /// Read enough of the input to fill in per-stream parameters.
    fn find_stream_info(&self, context: &mut Self::Context) -> Result<(), EngineError>;

    /// The engine's preferred stream of `kind`, if any.
    fn find_best_stream(&self, context: &Self::Context, kind: MediaKind) -> Option<usize>;

    /// Look up a stream table entry.
    fn stream(&self, context: &Self::Context, index: usize) -> Option<StreamInfo>;

    /// Container-level duration in microseconds, if known.
    fn container_duration(&self, context: &Self::Context) -> Option<i64>;

    /// Read the next packet in container order, across all streams.
    ///
    /// Returns `Ok(None)` at end of stream.
    fn read_packet(&self, context: &mut Self::Context) -> Result<Option<Self::Packet>, EngineError>;

    /// Seek `stream_index` to `target`, expressed in that stream's timebase.
    fn seek(
        &self,
        context: &mut Self::Context,
        stream_index: usize,
        target: i64,
        flags: SeekFlags,
    ) -> Result<(), EngineError>;

    /// Convert a timestamp between timebases.
    fn rescale(&self, value: i64, from: Rational, to: Rational) -> i64 {
        rescale(value, from, to)
    }

    /// Release a context.
    ///
    /// The context is gone after this call even if an error is returned.
    fn close(&self, context: Self::Context) -> Result<(), EngineError>;
}
