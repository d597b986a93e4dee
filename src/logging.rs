//! Process-wide log output.
//!
//! Installed once at startup. Library crates only emit `tracing` events;
//! this module decides where they go and which are kept.

use crate::config::LoggingConfig;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

const CRATES: [&str; 3] = ["monodemux", "monodemux_av", "monodemux_common"];

/// Filter directives for the given settings.
///
/// `RUST_LOG` wins when set; otherwise `verbose` turns on trace output for
/// the monodemux crates, and the configured level applies to everything
/// else.
pub fn filter_directives(config: &LoggingConfig, verbose: bool, rust_log: Option<&str>) -> String {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return directives.to_string();
    }

    let level = if verbose {
        "trace"
    } else {
        config.level.as_directive()
    };
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_filter = filter_directives(config, verbose, rust_log.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&env_filter)?)
        .with_writer(std::io::stderr)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_configured_level() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            ..LoggingConfig::default()
        };
        assert_eq!(
            filter_directives(&config, false, None),
            "monodemux=warn,monodemux_av=warn,monodemux_common=warn"
        );
    }

    #[test]
    fn test_verbose_overrides_level() {
        let directives = filter_directives(&LoggingConfig::default(), true, None);
        assert!(directives.contains("monodemux_av=trace"));
    }

    #[test]
    fn test_rust_log_wins() {
        let directives = filter_directives(&LoggingConfig::default(), true, Some("monodemux_av=debug"));
        assert_eq!(directives, "monodemux_av=debug");
    }

    #[test]
    fn test_blank_rust_log_is_ignored() {
        let directives = filter_directives(&LoggingConfig::default(), false, Some("  "));
        assert!(directives.starts_with("monodemux=info"));
    }
}
