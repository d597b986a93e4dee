//! Reporting for the CLI commands, independent of the engine in use.

use anyhow::Result;
use monodemux_av::{DemuxSession, Engine, EnginePacket, MediaKind};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// What an opened session knows about its file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub file: String,
    pub kind: MediaKind,
    pub stream_index: Option<usize>,
    pub video_stream_index: Option<usize>,
    pub audio_stream_index: Option<usize>,
    pub time_base: Option<String>,
    pub duration_us: i64,
}

impl StreamSummary {
    /// Summarize an open session.
    pub fn from_session<E: Engine>(session: &DemuxSession<E>, file: &Path) -> Self {
        Self {
            file: file.display().to_string(),
            kind: session.kind(),
            stream_index: session.stream_index(),
            video_stream_index: session.video_stream_index(),
            audio_stream_index: session.audio_stream_index(),
            time_base: session.stream().map(|s| s.time_base.to_string()),
            duration_us: session.duration_us(),
        }
    }

    /// Human-readable report.
    pub fn write_text<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "File: {}", self.file)?;
        writeln!(out, "Kind: {}", self.kind)?;
        match self.stream_index {
            Some(index) => writeln!(out, "Stream: #{}", index)?,
            None => writeln!(out, "Stream: none")?,
        }
        if let Some(ref time_base) = self.time_base {
            writeln!(out, "Time base: {}", time_base)?;
        }
        writeln!(out, "Video stream: {}", format_index(self.video_stream_index))?;
        writeln!(out, "Audio stream: {}", format_index(self.audio_stream_index))?;
        writeln!(out, "Duration: {}", format_duration(self.duration_us))?;
        Ok(())
    }
}

fn format_index(index: Option<usize>) -> String {
    index.map_or_else(|| "none".to_string(), |i| format!("#{}", i))
}

fn format_ts(ts: Option<i64>) -> String {
    ts.map_or_else(|| "-".to_string(), |t| t.to_string())
}

/// Format microseconds as `HH:MM:SS.mmm`.
pub fn format_duration(micros: i64) -> String {
    let millis = micros.max(0) / 1000;
    let secs = millis / 1000;
    let mins = secs / 60;
    let hours = mins / 60;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        hours,
        mins % 60,
        secs % 60,
        millis % 1000
    )
}

/// Convert a position in seconds to whole microseconds.
pub fn seconds_to_micros(seconds: f64) -> Result<i64> {
    if !seconds.is_finite() || seconds < 0.0 {
        anyhow::bail!("Seek position must be a non-negative number of seconds");
    }
    let micros = (seconds * 1_000_000.0).round();
    if micros > i64::MAX as f64 {
        anyhow::bail!("Seek position out of range: {}s", seconds);
    }
    Ok(micros as i64)
}

/// How a packet dump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpEnd {
    /// The stream ran out of packets.
    EndOfStream,
    /// The packet limit was reached first.
    Limit,
}

/// Write one line per packet of the active stream.
///
/// Returns the number of packets written and why the dump stopped.
pub fn dump_packets<E: Engine, W: Write>(
    session: &mut DemuxSession<E>,
    limit: Option<u64>,
    out: &mut W,
) -> Result<(u64, DumpEnd)> {
    let mut count = 0u64;
    loop {
        if limit.is_some_and(|limit| count >= limit) {
            return Ok((count, DumpEnd::Limit));
        }
        let Some(packet) = session.read_packet()? else {
            return Ok((count, DumpEnd::EndOfStream));
        };
        writeln!(
            out,
            "#{}\tpts={}\tdts={}\tduration={}\tsize={}{}",
            packet.stream_index(),
            format_ts(packet.pts()),
            format_ts(packet.dts()),
            packet.duration(),
            packet.data().len(),
            if packet.is_key() { "\tkey" } else { "" }
        )?;
        count += 1;
    }
}
