//! Single-stream demuxing session.

use crate::engine::{Engine, EnginePacket, StreamInfo};
use crate::error::{EngineOperation, Error, Result};
use monodemux_common::{MediaKind, Rational, SeekFlags};
use std::path::Path;
use tracing::{debug, error, info, trace, warn};

/// A demuxing session bound to one [`MediaKind`].
///
/// The session owns at most one engine context. While open it returns only
/// packets of the best stream of its kind; every other packet the engine
/// produces is dropped as soon as it is read.
///
/// The session starts closed. [`open`](Self::open) moves it to open,
/// [`close`](Self::close) (or dropping the session) moves it back. A session
/// must not be shared between threads without external synchronization.
///
/// # Example
///
/// ```no_run
/// # #[cfg(feature = "native-ffmpeg")]
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use monodemux_av::engine::ffmpeg::FfmpegEngine;
/// use monodemux_av::{DemuxSession, EnginePacket, MediaKind};
///
/// let mut session = DemuxSession::new(FfmpegEngine::new()?, MediaKind::Video);
/// session.open("movie.mkv")?;
/// println!("duration: {}us", session.duration_us());
/// while let Some(packet) = session.read_packet()? {
///     println!("pts {:?}, {} bytes", packet.pts(), packet.data().len());
/// }
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "native-ffmpeg"))]
/// # fn main() {}
/// ```
pub struct DemuxSession<E: Engine> {
    engine: E,
    kind: MediaKind,
    context: Option<E::Context>,
    video_stream_index: Option<usize>,
    audio_stream_index: Option<usize>,
    at_eof: bool,
}

impl<E: Engine> DemuxSession<E> {
    /// Create a closed session tracking streams of `kind`.
    pub fn new(engine: E, kind: MediaKind) -> Self {
        info!(%kind, "Demux session created");
        Self {
            engine,
            kind,
            context: None,
            video_stream_index: None,
            audio_stream_index: None,
            at_eof: false,
        }
    }

    /// The kind of stream this session tracks.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// The engine this session drives.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Whether the session currently owns an engine context.
    pub fn is_open(&self) -> bool {
        self.context.is_some()
    }

    /// Open `path` and select the best video and audio streams.
    ///
    /// Any context already owned is closed first. On failure the session is
    /// left closed, except for an empty path, which is rejected before
    /// anything is touched. A file without a stream of the session's kind
    /// still opens; packet reads and seeks then fail with
    /// [`Error::NoActiveStream`].
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!("Opening demuxer for file: {}", path.display());

        if path.as_os_str().is_empty() {
            error!("Cannot open demuxer: path is empty");
            return Err(Error::invalid_argument("path is empty"));
        }

        if self.context.is_some() {
            warn!("Demux session already open, closing previous context");
            self.close();
        }

        let mut context = self.engine.open_input(path).map_err(|e| {
            error!("Failed to open media file {}: {}", path.display(), e);
            Error::engine(EngineOperation::Open, e)
        })?;

        if let Err(e) = self.engine.find_stream_info(&mut context) {
            error!(
                "Could not find stream information in {}: {}",
                path.display(),
                e
            );
            if let Err(close_err) = self.engine.close(context) {
                warn!("Error releasing context after failed probe: {}", close_err);
            }
            return Err(Error::engine(EngineOperation::Probe, e));
        }

        self.video_stream_index = self.discover(&context, MediaKind::Video, path);
        self.audio_stream_index = self.discover(&context, MediaKind::Audio, path);
        self.context = Some(context);
        self.at_eof = false;

        Ok(())
    }

    fn discover(&self, context: &E::Context, kind: MediaKind, path: &Path) -> Option<usize> {
        match self.engine.find_best_stream(context, kind) {
            Some(index) => {
                info!("{} stream found at index: {}", kind, index);
                Some(index)
            }
            None => {
                warn!("No {} stream found in file: {}", kind, path.display());
                None
            }
        }
    }

    /// Release the engine context and reset all per-file state.
    ///
    /// Does nothing if the session is already closed. An error from the
    /// engine while releasing is logged; the session is closed regardless.
    pub fn close(&mut self) {
        if let Some(context) = self.context.take() {
            info!("Closing demux session");
            if let Err(e) = self.engine.close(context) {
                error!("Engine reported an error while closing: {}", e);
            }
        }
        self.video_stream_index = None;
        self.audio_stream_index = None;
        self.at_eof = false;
    }

    /// Index of the active stream (the best stream of the session's kind).
    pub fn stream_index(&self) -> Option<usize> {
        match self.kind {
            MediaKind::Video => self.video_stream_index,
            MediaKind::Audio => self.audio_stream_index,
        }
    }

    /// Index of the best video stream, whatever the session's kind.
    pub fn video_stream_index(&self) -> Option<usize> {
        self.video_stream_index
    }

    /// Index of the best audio stream, whatever the session's kind.
    pub fn audio_stream_index(&self) -> Option<usize> {
        self.audio_stream_index
    }

    /// The active stream's table entry, looked up in the live context.
    pub fn stream(&self) -> Option<StreamInfo> {
        self.stream_of(self.stream_index())
    }

    fn stream_of(&self, index: Option<usize>) -> Option<StreamInfo> {
        let context = self.context.as_ref()?;
        self.engine.stream(context, index?)
    }

    /// Whether the last read reached end of stream.
    pub fn is_eof(&self) -> bool {
        self.at_eof
    }

    /// Read the next packet of the active stream.
    ///
    /// Returns `Ok(None)` at end of stream. Once end of stream is reached,
    /// further calls keep returning `Ok(None)` until a seek succeeds. The
    /// returned packet is owned by the caller.
    pub fn read_packet(&mut self) -> Result<Option<E::Packet>> {
        let Some(context) = self.context.as_mut() else {
            error!("Cannot read packet: demux session not open");
            return Err(Error::NotOpen);
        };
        let target = match self.kind {
            MediaKind::Video => self.video_stream_index,
            MediaKind::Audio => self.audio_stream_index,
        };
        let Some(target) = target else {
            error!("Cannot read packet: no {} stream", self.kind);
            return Err(Error::NoActiveStream(self.kind));
        };

        if self.at_eof {
            debug!("Read after end of stream");
            return Ok(None);
        }

        loop {
            match self.engine.read_packet(context) {
                Ok(Some(packet)) if packet.stream_index() == target => return Ok(Some(packet)),
                Ok(Some(packet)) => {
                    trace!(stream_index = packet.stream_index(), "Skipping packet");
                }
                Ok(None) => {
                    self.at_eof = true;
                    info!("End of file reached");
                    return Ok(None);
                }
                Err(e) => {
                    error!("Error reading frame: {}", e);
                    return Err(Error::engine(EngineOperation::Read, e));
                }
            }
        }
    }

    /// Seek the active stream to `timestamp_us` microseconds.
    ///
    /// The timestamp is rescaled into the stream's timebase with integer
    /// arithmetic. On success the end-of-stream flag is cleared. An engine
    /// failure (typically media without random access) leaves the flag as
    /// it was; callers should treat it as "seek unsupported".
    pub fn seek(&mut self, timestamp_us: i64, flags: SeekFlags) -> Result<()> {
        if self.context.is_none() {
            error!("Cannot seek: demux session not open");
            return Err(Error::NotOpen);
        }
        let Some(stream) = self.stream() else {
            error!("Cannot seek: no {} stream", self.kind);
            return Err(Error::NoActiveStream(self.kind));
        };

        let target = self
            .engine
            .rescale(timestamp_us, Rational::MICROSECONDS, stream.time_base);
        info!(
            "Seeking to {}us (stream timebase: {}, target: {})",
            timestamp_us, stream.time_base, target
        );

        let Some(context) = self.context.as_mut() else {
            return Err(Error::NotOpen);
        };
        match self.engine.seek(context, stream.index, target, flags) {
            Ok(()) => {
                self.at_eof = false;
                info!("Seeked to {}us successfully", timestamp_us);
                Ok(())
            }
            Err(e) => {
                error!("Error seeking to {}us: {}", timestamp_us, e);
                Err(Error::engine(EngineOperation::Seek, e))
            }
        }
    }

    /// Seek with [`SeekFlags::default`] (nearest keyframe at or before).
    pub fn seek_default(&mut self, timestamp_us: i64) -> Result<()> {
        self.seek(timestamp_us, SeekFlags::default())
    }

    /// Media duration in microseconds, or 0 if closed or unknown.
    ///
    /// Tries, in order: the container duration, the active stream, the
    /// video stream, the audio stream.
    pub fn duration_us(&self) -> i64 {
        let Some(context) = self.context.as_ref() else {
            debug!("Duration requested on a closed session");
            return 0;
        };

        if let Some(duration) = self.engine.container_duration(context) {
            return duration;
        }

        [
            self.stream_index(),
            self.video_stream_index,
            self.audio_stream_index,
        ]
        .into_iter()
        .filter_map(|index| self.stream_of(index))
        .find_map(|stream| {
            stream.duration.map(|d| {
                self.engine
                    .rescale(d, stream.time_base, Rational::MICROSECONDS)
            })
        })
        .unwrap_or(0)
    }
}

impl<E: Engine> Drop for DemuxSession<E> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<E: Engine> std::fmt::Debug for DemuxSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemuxSession")
            .field("kind", &self.kind)
            .field("open", &self.is_open())
            .field("video_stream_index", &self.video_stream_index)
            .field("audio_stream_index", &self.audio_stream_index)
            .field("at_eof", &self.at_eof)
            .finish_non_exhaustive()
    }
}
