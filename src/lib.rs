//! Monodemux - single-stream media demuxing sessions
//!
//! This library crate exposes the CLI's building blocks for integration testing.

pub mod config;
pub mod inspect;
pub mod logging;
