//! # monodemux-av
//!
//! Single-stream demuxing sessions over a pluggable container engine.
//!
//! A [`DemuxSession`] opens one media file through an [`Engine`] and hands
//! out the packets of exactly one stream: the best video stream or the best
//! audio stream, chosen when the session is created. It also converts seek
//! targets from microseconds into the stream's timebase and resolves the
//! media duration from whatever the container records.
//!
//! ## Features
//!
//! - `native-ffmpeg` - [`engine::ffmpeg::FfmpegEngine`], backed by libavformat
//!
//! ## Example
//!
//! ```
//! use monodemux_av::engine::memory::{MemoryEngine, MemoryMedia, MemoryStream};
//! use monodemux_av::{DemuxSession, MediaKind, Rational};
//!
//! let media = MemoryMedia::new()
//!     .stream(MemoryStream::audio(Rational::new(1, 48_000)).with_duration(240_000));
//! let engine = MemoryEngine::new().with_file("tone.aac", media);
//!
//! let mut session = DemuxSession::new(engine, MediaKind::Audio);
//! session.open("tone.aac")?;
//! assert_eq!(session.stream_index(), Some(0));
//! assert_eq!(session.duration_us(), 5_000_000);
//! # Ok::<(), monodemux_av::Error>(())
//! ```

pub mod engine;
mod error;
mod session;

// Re-exports
pub use engine::{Engine, EngineError, EnginePacket, StreamInfo};
pub use error::{EngineOperation, Error, Result};
pub use monodemux_common::{MediaKind, Rational, SeekFlags};
pub use session::DemuxSession;
