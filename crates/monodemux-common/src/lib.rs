//! Monodemux-Common: Shared vocabulary for demuxing sessions.
//!
//! This crate holds the engine-neutral types that cross crate boundaries:
//!
//! - **Media kinds**: which kind of stream a session tracks
//! - **Timebases**: rational timebases and overflow-safe rescaling
//! - **Seek flags**: how a seek resolves against keyframes
//!
//! # Examples
//!
//! ```
//! use monodemux_common::{rescale, MediaKind, Rational};
//!
//! let kind: MediaKind = "audio".parse().unwrap();
//! assert_eq!(kind, MediaKind::Audio);
//!
//! // Two seconds in microseconds, expressed in a 90 kHz timebase.
//! let target = rescale(2_000_000, Rational::MICROSECONDS, Rational::new(1, 90_000));
//! assert_eq!(target, 180_000);
//! ```

pub mod kind;
pub mod seek;
pub mod time;

pub use kind::{MediaKind, ParseMediaKindError};
pub use seek::SeekFlags;
pub use time::{from_micros, known, rescale, to_micros, Rational, NO_TIMESTAMP};
