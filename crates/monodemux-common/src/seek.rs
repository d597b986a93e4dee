//! Seek flags.

use bitflags::bitflags;

bitflags! {
    /// How a seek target is resolved against the stream's keyframes.
    ///
    /// Bit values match FFmpeg's `AVSEEK_FLAG_*` so engines built on it can
    /// pass [`SeekFlags::bits`] straight through.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SeekFlags: i32 {
        /// Land on the nearest keyframe at or before the target.
        const BACKWARD = 1;
        /// Interpret the target as a byte offset.
        const BYTE = 2;
        /// Allow landing on non-keyframes.
        const ANY = 4;
        /// Interpret the target as a frame number.
        const FRAME = 8;
    }
}

impl Default for SeekFlags {
    fn default() -> Self {
        Self::BACKWARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_backward() {
        assert_eq!(SeekFlags::default(), SeekFlags::BACKWARD);
        assert_eq!(SeekFlags::default().bits(), 1);
    }

    #[test]
    fn test_combined_bits() {
        let flags = SeekFlags::BACKWARD | SeekFlags::ANY;
        assert_eq!(flags.bits(), 5);
        assert!(flags.contains(SeekFlags::ANY));
        assert!(!flags.contains(SeekFlags::BYTE));
    }
}
