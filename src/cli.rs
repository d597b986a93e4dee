use clap::{Parser, Subcommand};
use monodemux_common::MediaKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "monodemux")]
#[command(author, version, about = "Inspect one stream of a media file")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a media file and describe its active stream
    Info {
        /// File to open
        #[arg(required = true)]
        file: PathBuf,

        /// Stream kind to track (video or audio)
        #[arg(short, long)]
        kind: Option<MediaKind>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the packets of the active stream
    Packets {
        /// File to demux
        #[arg(required = true)]
        file: PathBuf,

        /// Stream kind to track (video or audio)
        #[arg(short, long)]
        kind: Option<MediaKind>,

        /// Stop after this many packets
        #[arg(short, long)]
        limit: Option<u64>,

        /// Seek to this position, in seconds, before reading
        #[arg(short, long)]
        seek: Option<f64>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
