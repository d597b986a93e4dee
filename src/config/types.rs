use monodemux_common::{MediaKind, SeekFlags};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub demux: DemuxConfig,
}

/// Severity threshold for log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    /// Also accepts `fatal`.
    #[serde(alias = "fatal")]
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    /// Tag each line with the emitting thread
    #[serde(default = "default_true")]
    pub thread_ids: bool,

    /// Tag each line with file and line number
    #[serde(default = "default_true")]
    pub source_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            thread_ids: true,
            source_location: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemuxConfig {
    /// Stream kind used when a command does not pass --kind
    #[serde(default)]
    pub kind: MediaKind,

    /// Seek to the keyframe at or before the target (default: true)
    #[serde(default = "default_true")]
    pub seek_backward: bool,

    /// Allow seeking onto non-keyframes (default: false)
    #[serde(default)]
    pub seek_any: bool,

    /// Maximum number of packets the packets command prints
    #[serde(default)]
    pub packet_limit: Option<u64>,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            kind: MediaKind::default(),
            seek_backward: true,
            seek_any: false,
            packet_limit: None,
        }
    }
}

impl DemuxConfig {
    /// Seek flags described by this config.
    pub fn seek_flags(&self) -> SeekFlags {
        let mut flags = SeekFlags::empty();
        if self.seek_backward {
            flags |= SeekFlags::BACKWARD;
        }
        if self.seek_any {
            flags |= SeekFlags::ANY;
        }
        flags
    }
}

fn default_true() -> bool {
    true
}
