//! Native FFmpeg engine using ffmpeg-the-third bindings.
//!
//! Calls libavformat directly so that open and probe stay two separate
//! steps and seeks can target a single stream with caller-supplied flags.
//! Requires the `native-ffmpeg` feature.

use super::{Engine, EngineError, EnginePacket, StreamInfo};
use ffmpeg_the_third as ffmpeg;
use ffmpeg::ffi;
use monodemux_common::{known, MediaKind, Rational, SeekFlags};
use std::ffi::CString;
use std::os::raw::c_int;
use std::path::Path;
use std::ptr;

const EINVAL: c_int = -22;
const ENOMEM: c_int = -12;

fn ffmpeg_error(code: c_int) -> EngineError {
    EngineError::new(code, ffmpeg::Error::from(code).to_string())
}

fn to_av(r: Rational) -> ffi::AVRational {
    ffi::AVRational {
        num: r.num,
        den: r.den,
    }
}

fn from_av(r: ffi::AVRational) -> Rational {
    Rational::new(r.num, r.den)
}

fn media_type(kind: MediaKind) -> ffi::AVMediaType {
    match kind {
        MediaKind::Video => ffi::AVMediaType::AVMEDIA_TYPE_VIDEO,
        MediaKind::Audio => ffi::AVMediaType::AVMEDIA_TYPE_AUDIO,
    }
}

/// An opened `AVFormatContext`, closed on drop.
pub struct FfmpegContext {
    ptr: *mut ffi::AVFormatContext,
}

impl FfmpegContext {
    fn stream_ptr(&self, index: usize) -> Option<*mut ffi::AVStream> {
        // SAFETY: ptr is a live context from avformat_open_input; streams
        // holds nb_streams valid pointers.
        unsafe {
            let ctx = &*self.ptr;
            if index >= ctx.nb_streams as usize || ctx.streams.is_null() {
                return None;
            }
            let stream = *ctx.streams.add(index);
            (!stream.is_null()).then_some(stream)
        }
    }
}

impl Drop for FfmpegContext {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            // SAFETY: avformat_close_input frees the context and its stream
            // table, then nulls the pointer.
            unsafe { ffi::avformat_close_input(&mut self.ptr) };
        }
    }
}

/// An `AVPacket` owned by the caller, freed on drop.
pub struct FfmpegPacket {
    ptr: *mut ffi::AVPacket,
}

impl FfmpegPacket {
    fn alloc() -> Result<Self, EngineError> {
        // SAFETY: av_packet_alloc returns an owned packet or null.
        let ptr = unsafe { ffi::av_packet_alloc() };
        if ptr.is_null() {
            return Err(ffmpeg_error(ENOMEM));
        }
        Ok(Self { ptr })
    }

    fn raw(&self) -> &ffi::AVPacket {
        // SAFETY: ptr is non-null for the packet's whole life.
        unsafe { &*self.ptr }
    }
}

impl Drop for FfmpegPacket {
    fn drop(&mut self) {
        // SAFETY: av_packet_free unrefs the payload and frees the packet.
        unsafe { ffi::av_packet_free(&mut self.ptr) };
    }
}

impl EnginePacket for FfmpegPacket {
    fn stream_index(&self) -> usize {
        self.raw().stream_index.max(0) as usize
    }

    fn pts(&self) -> Option<i64> {
        known(self.raw().pts)
    }

    fn dts(&self) -> Option<i64> {
        known(self.raw().dts)
    }

    fn duration(&self) -> i64 {
        self.raw().duration
    }

    fn is_key(&self) -> bool {
        self.raw().flags & (ffi::AV_PKT_FLAG_KEY as c_int) != 0
    }

    fn data(&self) -> &[u8] {
        let raw = self.raw();
        if raw.data.is_null() || raw.size <= 0 {
            return &[];
        }
        // SAFETY: data points at size readable bytes owned by the packet.
        unsafe { std::slice::from_raw_parts(raw.data, raw.size as usize) }
    }
}

/// Engine backed by libavformat.
#[derive(Debug, Clone, Copy)]
pub struct FfmpegEngine {
    _private: (),
}

impl FfmpegEngine {
    /// Initialize FFmpeg and create the engine.
    pub fn new() -> Result<Self, EngineError> {
        ffmpeg::init().map_err(|e| EngineError::new(-1, e.to_string()))?;
        Ok(Self { _private: () })
    }
}

impl Engine for FfmpegEngine {
    type Context = FfmpegContext;
    type Packet = FfmpegPacket;

    fn open_input(&self, path: &Path) -> Result<FfmpegContext, EngineError> {
        let c_path = CString::new(path.to_string_lossy().as_bytes())
            .map_err(|_| EngineError::new(EINVAL, "path contains a NUL byte"))?;

        let mut ptr: *mut ffi::AVFormatContext = ptr::null_mut();
        // SAFETY: on failure avformat_open_input frees what it allocated and
        // leaves ptr null.
        let ret = unsafe {
            ffi::avformat_open_input(&mut ptr, c_path.as_ptr(), ptr::null(), ptr::null_mut())
        };
        if ret < 0 {
            return Err(ffmpeg_error(ret));
        }
        Ok(FfmpegContext { ptr })
    }

    fn find_stream_info(&self, context: &mut FfmpegContext) -> Result<(), EngineError> {
        // SAFETY: context.ptr is a live context.
        let ret = unsafe { ffi::avformat_find_stream_info(context.ptr, ptr::null_mut()) };
        if ret < 0 {
            return Err(ffmpeg_error(ret));
        }
        Ok(())
    }

    fn find_best_stream(&self, context: &FfmpegContext, kind: MediaKind) -> Option<usize> {
        // SAFETY: context.ptr is a live context; no decoder is requested.
        let ret = unsafe {
            ffi::av_find_best_stream(context.ptr, media_type(kind), -1, -1, ptr::null_mut(), 0)
        };
        (ret >= 0).then_some(ret as usize)
    }

    fn stream(&self, context: &FfmpegContext, index: usize) -> Option<StreamInfo> {
        let stream = context.stream_ptr(index)?;
        // SAFETY: stream belongs to the live context.
        let (time_base, duration, codec_type) = unsafe {
            let s = &*stream;
            let codec_type = if s.codecpar.is_null() {
                ffi::AVMediaType::AVMEDIA_TYPE_UNKNOWN
            } else {
                (*s.codecpar).codec_type
            };
            (from_av(s.time_base), known(s.duration), codec_type)
        };

        let kind = match codec_type {
            ffi::AVMediaType::AVMEDIA_TYPE_VIDEO => Some(MediaKind::Video),
            ffi::AVMediaType::AVMEDIA_TYPE_AUDIO => Some(MediaKind::Audio),
            _ => None,
        };

        Some(StreamInfo {
            index,
            kind,
            time_base,
            duration,
        })
    }

    fn container_duration(&self, context: &FfmpegContext) -> Option<i64> {
        // SAFETY: context.ptr is a live context. The field is in AV_TIME_BASE
        // units, i.e. microseconds.
        known(unsafe { (*context.ptr).duration })
    }

    fn read_packet(&self, context: &mut FfmpegContext) -> Result<Option<FfmpegPacket>, EngineError> {
        let packet = FfmpegPacket::alloc()?;
        // SAFETY: both pointers are live; on error the packet stays blank.
        let ret = unsafe { ffi::av_read_frame(context.ptr, packet.ptr) };
        if ret < 0 {
            return match ffmpeg::Error::from(ret) {
                ffmpeg::Error::Eof => Ok(None),
                _ => Err(ffmpeg_error(ret)),
            };
        }
        Ok(Some(packet))
    }

    fn seek(
        &self,
        context: &mut FfmpegContext,
        stream_index: usize,
        target: i64,
        flags: SeekFlags,
    ) -> Result<(), EngineError> {
        if context.stream_ptr(stream_index).is_none() {
            return Err(ffmpeg_error(EINVAL));
        }
        // SAFETY: context.ptr is live and stream_index is in range.
        let ret = unsafe {
            ffi::av_seek_frame(context.ptr, stream_index as c_int, target, flags.bits())
        };
        if ret < 0 {
            return Err(ffmpeg_error(ret));
        }
        Ok(())
    }

    fn rescale(&self, value: i64, from: Rational, to: Rational) -> i64 {
        // SAFETY: pure arithmetic.
        unsafe { ffi::av_rescale_q(value, to_av(from), to_av(to)) }
    }

    fn close(&self, context: FfmpegContext) -> Result<(), EngineError> {
        drop(context);
        Ok(())
    }
}
