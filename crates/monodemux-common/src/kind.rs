//! The kind of media stream a session tracks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of media stream.
///
/// A session is bound to one kind for its whole life; the stream of that
/// kind is the only one it returns packets for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Video stream.
    #[default]
    Video,
    /// Audio stream.
    Audio,
}

impl MediaKind {
    /// Both kinds, video first.
    pub const ALL: [MediaKind; 2] = [MediaKind::Video, MediaKind::Audio];

    /// The opposite kind.
    pub fn other(self) -> Self {
        match self {
            Self::Video => Self::Audio,
            Self::Audio => Self::Video,
        }
    }

    /// Lowercase name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a media kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown media kind: {0:?} (expected \"video\" or \"audio\")")]
pub struct ParseMediaKindError(pub String);

impl FromStr for MediaKind {
    type Err = ParseMediaKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            _ => Err(ParseMediaKindError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(MediaKind::Video.to_string(), "video");
        assert_eq!(MediaKind::Audio.to_string(), "audio");
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("VIDEO".parse::<MediaKind>().unwrap(), MediaKind::Video);
        assert_eq!(" Audio ".parse::<MediaKind>().unwrap(), MediaKind::Audio);
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "subtitle".parse::<MediaKind>().unwrap_err();
        assert_eq!(err, ParseMediaKindError("subtitle".to_string()));
        assert!(err.to_string().contains("subtitle"));
    }

    #[test]
    fn test_other() {
        assert_eq!(MediaKind::Video.other(), MediaKind::Audio);
        assert_eq!(MediaKind::Audio.other(), MediaKind::Video);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&MediaKind::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
        let kind: MediaKind = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(kind, MediaKind::Video);
    }
}
