mod cli;

use monodemux::{config, inspect, logging};
use monodemux_av::{DemuxSession, Engine, MediaKind};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::io::Write;
use std::path::Path;

#[cfg(feature = "native-ffmpeg")]
fn media_engine() -> Result<monodemux_av::engine::ffmpeg::FfmpegEngine> {
    Ok(monodemux_av::engine::ffmpeg::FfmpegEngine::new()?)
}

#[cfg(not(feature = "native-ffmpeg"))]
fn media_engine() -> Result<monodemux_av::engine::memory::MemoryEngine> {
    anyhow::bail!(
        "monodemux was built without native-ffmpeg; rebuild with `--features native-ffmpeg` to read media files"
    )
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config still gets reported through the default logger
    let loaded = config::load_config_or_default(cli.config.as_deref());
    let logging_config = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    logging::init(&logging_config, cli.verbose)?;

    match cli.command {
        Commands::Info { file, kind, json } => {
            let config = loaded?;
            let kind = kind.unwrap_or(config.demux.kind);
            info_file(media_engine()?, &file, kind, json)
        }
        Commands::Packets {
            file,
            kind,
            limit,
            seek,
        } => {
            let config = loaded?;
            let kind = kind.unwrap_or(config.demux.kind);
            let limit = limit.or(config.demux.packet_limit);
            let seek = seek.map(inspect::seconds_to_micros).transpose()?;
            packets_file(media_engine()?, &file, kind, limit, seek, &config.demux)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("monodemux {}", env!("CARGO_PKG_VERSION"));
            println!(
                "native-ffmpeg: {}",
                if cfg!(feature = "native-ffmpeg") {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            Ok(())
        }
    }
}

fn open_session<E: Engine>(engine: E, file: &Path, kind: MediaKind) -> Result<DemuxSession<E>> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let mut session = DemuxSession::new(engine, kind);
    session.open(file)?;
    if session.stream_index().is_none() {
        tracing::warn!("{:?} has no {} stream", file, kind);
    }
    Ok(session)
}

fn info_file<E: Engine>(engine: E, file: &Path, kind: MediaKind, json: bool) -> Result<()> {
    let session = open_session(engine, file, kind)?;
    let summary = inspect::StreamSummary::from_session(&session, file);

    if json {
        let json_str = serde_json::to_string_pretty(&summary)?;
        println!("{}", json_str);
    } else {
        summary.write_text(&mut std::io::stdout().lock())?;
    }

    Ok(())
}

fn packets_file<E: Engine>(
    engine: E,
    file: &Path,
    kind: MediaKind,
    limit: Option<u64>,
    seek_us: Option<i64>,
    demux: &config::DemuxConfig,
) -> Result<()> {
    let mut session = open_session(engine, file, kind)?;

    if let Some(timestamp_us) = seek_us {
        tracing::info!("Seeking to {}us before reading", timestamp_us);
        session.seek(timestamp_us, demux.seek_flags())?;
    }

    let mut out = std::io::stdout().lock();
    let (count, end) = inspect::dump_packets(&mut session, limit, &mut out)?;
    match end {
        inspect::DumpEnd::EndOfStream => writeln!(out, "{} packets, end of stream", count)?,
        inspect::DumpEnd::Limit => writeln!(out, "{} packets, limit reached", count)?,
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            println!("Default config:");
            print_config(&config::Config::default());
        }
    }

    Ok(())
}

fn print_config(config: &config::Config) {
    println!("  Log level: {}", config.logging.level.as_directive());
    println!("  Stream kind: {}", config.demux.kind);
    println!("  Seek flags: {:?}", config.demux.seek_flags());
    match config.demux.packet_limit {
        Some(limit) => println!("  Packet limit: {}", limit),
        None => println!("  Packet limit: none"),
    }
}
