//! In-memory engine.
//!
//! [`MemoryEngine`] serves media that is described up front rather than
//! parsed from bytes: a stream table, an interleaved packet list and a few
//! failure switches. It behaves like a real engine at the contract level
//! (container order, keyframe-aligned seeking, end of stream) and counts
//! every context and packet it hands out so callers can check that they
//! were all released.

use super::{Engine, EngineError, EnginePacket, StreamInfo};
use monodemux_common::{MediaKind, Rational, SeekFlags};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const ENOENT: i32 = -2;
const EINVAL: i32 = -22;
const ENOSYS: i32 = -38;
const EPERM: i32 = -1;

/// One entry of a [`MemoryMedia`] stream table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStream {
    /// Kind of the stream; `None` for data or subtitle streams.
    pub kind: Option<MediaKind>,
    /// Timebase of the stream's timestamps.
    pub time_base: Rational,
    /// Duration in `time_base` ticks.
    pub duration: Option<i64>,
    /// Preference among streams of the same kind; highest wins.
    pub score: u32,
}

impl MemoryStream {
    /// A video stream.
    pub fn video(time_base: Rational) -> Self {
        Self::new(Some(MediaKind::Video), time_base)
    }

    /// An audio stream.
    pub fn audio(time_base: Rational) -> Self {
        Self::new(Some(MediaKind::Audio), time_base)
    }

    /// A stream that is neither video nor audio.
    pub fn data(time_base: Rational) -> Self {
        Self::new(None, time_base)
    }

    fn new(kind: Option<MediaKind>, time_base: Rational) -> Self {
        Self {
            kind,
            time_base,
            duration: None,
            score: 0,
        }
    }

    /// Set the stream duration, in `time_base` ticks.
    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set the best-stream score.
    pub fn with_score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }
}

/// A packet as stored in a [`MemoryMedia`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketRecord {
    /// Index of the stream the packet belongs to.
    pub stream_index: usize,
    /// Presentation timestamp in the stream's timebase.
    pub pts: Option<i64>,
    /// Decoding timestamp in the stream's timebase.
    pub dts: Option<i64>,
    /// Duration in the stream's timebase.
    pub duration: i64,
    /// Whether the packet starts with a keyframe.
    pub key: bool,
    /// Encoded payload.
    pub data: Vec<u8>,
}

impl PacketRecord {
    /// A packet with `pts == dts`.
    pub fn new(stream_index: usize, pts: i64, duration: i64, key: bool) -> Self {
        Self {
            stream_index,
            pts: Some(pts),
            dts: Some(pts),
            duration,
            key,
            data: Vec::new(),
        }
    }

    /// Attach a payload.
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }
}

/// Description of one in-memory input.
#[derive(Debug, Clone)]
pub struct MemoryMedia {
    streams: Vec<MemoryStream>,
    container_duration: Option<i64>,
    packets: Vec<PacketRecord>,
    probe_error: Option<EngineError>,
    close_error: Option<EngineError>,
    read_error_at: Option<(usize, EngineError)>,
    seekable: bool,
}

impl Default for MemoryMedia {
    fn default() -> Self {
        Self {
            streams: Vec::new(),
            container_duration: None,
            packets: Vec::new(),
            probe_error: None,
            close_error: None,
            read_error_at: None,
            seekable: true,
        }
    }
}

impl MemoryMedia {
    /// Empty media: no streams, no packets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stream; its index is its position in the table.
    pub fn stream(mut self, stream: MemoryStream) -> Self {
        self.streams.push(stream);
        self
    }

    /// Set the container-level duration, in microseconds.
    pub fn container_duration(mut self, micros: i64) -> Self {
        self.container_duration = Some(micros);
        self
    }

    /// Append a packet in container order.
    pub fn packet(mut self, packet: PacketRecord) -> Self {
        self.packets.push(packet);
        self
    }

    /// Append packets in container order.
    pub fn packets(mut self, packets: impl IntoIterator<Item = PacketRecord>) -> Self {
        self.packets.extend(packets);
        self
    }

    /// Make stream-info discovery fail.
    pub fn fail_probe(mut self, error: EngineError) -> Self {
        self.probe_error = Some(error);
        self
    }

    /// Make releasing the context report an error.
    pub fn fail_close(mut self, error: EngineError) -> Self {
        self.close_error = Some(error);
        self
    }

    /// Fail the read at packet position `position` (0-based, container order).
    pub fn fail_read_at(mut self, position: usize, error: EngineError) -> Self {
        self.read_error_at = Some((position, error));
        self
    }

    /// Reject every seek.
    pub fn unseekable(mut self) -> Self {
        self.seekable = false;
        self
    }

    /// Number of packets across all streams.
    pub fn packet_count(&self) -> usize {
        self.packets.len()
    }

    fn seek_position(
        &self,
        stream_index: usize,
        target: i64,
        flags: SeekFlags,
    ) -> Result<usize, EngineError> {
        if !self.seekable {
            return Err(EngineError::new(ENOSYS, "Function not implemented"));
        }
        if flags.intersects(SeekFlags::BYTE | SeekFlags::FRAME) {
            return Err(EngineError::new(EINVAL, "Invalid argument"));
        }
        if stream_index >= self.streams.len() {
            return Err(EngineError::new(EINVAL, "Invalid argument"));
        }

        let any = flags.contains(SeekFlags::ANY);
        let candidates: Vec<(usize, i64)> = self
            .packets
            .iter()
            .enumerate()
            .filter(|(_, p)| p.stream_index == stream_index && (any || p.key))
            .filter_map(|(pos, p)| p.pts.map(|pts| (pos, pts)))
            .collect();

        let (first, _) = *candidates
            .first()
            .ok_or_else(|| EngineError::new(EPERM, "Operation not permitted"))?;

        if flags.contains(SeekFlags::BACKWARD) {
            let position = candidates
                .iter()
                .rev()
                .find(|(_, pts)| *pts <= target)
                .map(|(pos, _)| *pos)
                .unwrap_or(first);
            Ok(position)
        } else {
            candidates
                .iter()
                .find(|(_, pts)| *pts >= target)
                .map(|(pos, _)| *pos)
                .ok_or_else(|| EngineError::new(EPERM, "Operation not permitted"))
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    opens: AtomicUsize,
    closes: AtomicUsize,
    live_packets: AtomicUsize,
}

/// Shared counters of everything a [`MemoryEngine`] handed out.
#[derive(Debug, Clone, Default)]
pub struct MemoryStats {
    inner: Arc<Counters>,
}

impl MemoryStats {
    /// Contexts successfully opened.
    pub fn opens(&self) -> usize {
        self.inner.opens.load(Ordering::SeqCst)
    }

    /// Contexts released.
    pub fn closes(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }

    /// Contexts opened but not yet released.
    pub fn live_contexts(&self) -> usize {
        self.opens().saturating_sub(self.closes())
    }

    /// Packets handed out and not yet dropped.
    pub fn live_packets(&self) -> usize {
        self.inner.live_packets.load(Ordering::SeqCst)
    }
}

/// An opened in-memory input.
#[derive(Debug)]
pub struct MemoryContext {
    media: Arc<MemoryMedia>,
    cursor: usize,
    stats: MemoryStats,
}

impl MemoryContext {
    /// Position of the next packet to be read, in container order.
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl Drop for MemoryContext {
    fn drop(&mut self) {
        self.stats.inner.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// A packet read from a [`MemoryContext`].
#[derive(Debug)]
pub struct MemoryPacket {
    record: PacketRecord,
    stats: MemoryStats,
}

impl MemoryPacket {
    fn new(record: PacketRecord, stats: MemoryStats) -> Self {
        stats.inner.live_packets.fetch_add(1, Ordering::SeqCst);
        Self { record, stats }
    }
}

impl Drop for MemoryPacket {
    fn drop(&mut self) {
        self.stats.inner.live_packets.fetch_sub(1, Ordering::SeqCst);
    }
}

impl EnginePacket for MemoryPacket {
    fn stream_index(&self) -> usize {
        self.record.stream_index
    }

    fn pts(&self) -> Option<i64> {
        self.record.pts
    }

    fn dts(&self) -> Option<i64> {
        self.record.dts
    }

    fn duration(&self) -> i64 {
        self.record.duration
    }

    fn is_key(&self) -> bool {
        self.record.key
    }

    fn data(&self) -> &[u8] {
        &self.record.data
    }
}

/// Engine serving [`MemoryMedia`] registered by path.
///
/// # Example
///
/// ```
/// use monodemux_av::engine::memory::{MemoryEngine, MemoryMedia, MemoryStream, PacketRecord};
/// use monodemux_av::{DemuxSession, EnginePacket, MediaKind, Rational};
///
/// let media = MemoryMedia::new()
///     .stream(MemoryStream::video(Rational::new(1, 30)))
///     .stream(MemoryStream::audio(Rational::new(1, 48_000)))
///     .packet(PacketRecord::new(1, 0, 1024, true))
///     .packet(PacketRecord::new(0, 0, 1, true));
/// let engine = MemoryEngine::new().with_file("clip.mp4", media);
///
/// let mut session = DemuxSession::new(engine, MediaKind::Video);
/// session.open("clip.mp4")?;
/// let packet = session.read_packet()?.unwrap();
/// assert_eq!(packet.stream_index(), 0);
/// # Ok::<(), monodemux_av::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    files: HashMap<PathBuf, Arc<MemoryMedia>>,
    stats: MemoryStats,
}

impl MemoryEngine {
    /// An engine with no files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `media` under `path`.
    pub fn with_file(mut self, path: impl Into<PathBuf>, media: MemoryMedia) -> Self {
        self.files.insert(path.into(), Arc::new(media));
        self
    }

    /// Counters shared by every context and packet of this engine.
    pub fn stats(&self) -> MemoryStats {
        self.stats.clone()
    }
}

impl Engine for MemoryEngine {
    type Context = MemoryContext;
    type Packet = MemoryPacket;

    fn open_input(&self, path: &Path) -> Result<MemoryContext, EngineError> {
        let media = self
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| EngineError::new(ENOENT, "No such file or directory"))?;

        self.stats.inner.opens.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryContext {
            media,
            cursor: 0,
            stats: self.stats.clone(),
        })
    }

    fn find_stream_info(&self, context: &mut MemoryContext) -> Result<(), EngineError> {
        match &context.media.probe_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn find_best_stream(&self, context: &MemoryContext, kind: MediaKind) -> Option<usize> {
        context
            .media
            .streams
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind == Some(kind))
            .max_by(|(ia, a), (ib, b)| a.score.cmp(&b.score).then(ib.cmp(ia)))
            .map(|(index, _)| index)
    }

    fn stream(&self, context: &MemoryContext, index: usize) -> Option<StreamInfo> {
        context.media.streams.get(index).map(|s| StreamInfo {
            index,
            kind: s.kind,
            time_base: s.time_base,
            duration: s.duration,
        })
    }

    fn container_duration(&self, context: &MemoryContext) -> Option<i64> {
        context.media.container_duration
    }

    fn read_packet(&self, context: &mut MemoryContext) -> Result<Option<MemoryPacket>, EngineError> {
        if let Some((position, err)) = &context.media.read_error_at {
            if *position == context.cursor {
                return Err(err.clone());
            }
        }

        let Some(record) = context.media.packets.get(context.cursor).cloned() else {
            return Ok(None);
        };
        context.cursor += 1;
        Ok(Some(MemoryPacket::new(record, context.stats.clone())))
    }

    fn seek(
        &self,
        context: &mut MemoryContext,
        stream_index: usize,
        target: i64,
        flags: SeekFlags,
    ) -> Result<(), EngineError> {
        context.cursor = context.media.seek_position(stream_index, target, flags)?;
        Ok(())
    }

    fn close(&self, context: MemoryContext) -> Result<(), EngineError> {
        let result = match &context.media.close_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        };
        drop(context);
        result
    }
}
