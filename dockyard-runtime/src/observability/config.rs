//! Log output settings for the host.

use std::env;
use std::str::FromStr;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON lines, one object per event.
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line output.
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::default(),
        })
    }
}

/// How the host's subscriber renders events.
///
/// Unit threads are named `unit-<slug>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    log_format: LogFormat,
    log_filter: String,
    include_location: bool,
    include_thread_names: bool,
}

impl TracingConfig {
    /// Read the settings from the environment.
    ///
    /// - `DOCKYARD_LOG_FORMAT`: "json", "pretty" or "compact"; defaults to
    ///   pretty on a terminal and JSON otherwise
    /// - `DOCKYARD_LOG_LEVEL` or `RUST_LOG`: filter directive, default "info"
    /// - `DOCKYARD_LOG_LOCATION`: "true" to include file and line
    /// - `DOCKYARD_LOG_THREAD_NAMES`: "true" to include thread names
    pub fn from_env() -> Self {
        Self::from_env_or("info")
    }

    /// Settings for a CLI invoked with `verbosity` `-v` flags.
    ///
    /// The flag count only picks the default filter; an explicit
    /// `DOCKYARD_LOG_LEVEL` or `RUST_LOG` still wins. From `-vv` on, events
    /// carry the unit thread name.
    pub fn for_verbosity(verbosity: u8) -> Self {
        let mut config = Self::from_env_or(filter_for_verbosity(verbosity));
        config.include_thread_names |= verbosity >= 2;
        config
    }

    fn from_env_or(default_filter: &str) -> Self {
        let log_format = env::var("DOCKYARD_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse::<LogFormat>().ok())
            .unwrap_or_else(|| {
                if std::io::IsTerminal::is_terminal(&std::io::stdout()) {
                    LogFormat::Pretty
                } else {
                    LogFormat::Json
                }
            });

        let log_filter = env::var("DOCKYARD_LOG_LEVEL")
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_else(|_| default_filter.to_string());

        Self {
            log_format,
            log_filter,
            include_location: env_flag("DOCKYARD_LOG_LOCATION"),
            include_thread_names: env_flag("DOCKYARD_LOG_THREAD_NAMES"),
        }
    }

    /// The log format.
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// The filter directive (e.g. "info", "debug,dockyard_runtime::unit=trace").
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Whether events carry file and line.
    pub fn include_location(&self) -> bool {
        self.include_location
    }

    /// Whether events carry the thread name.
    pub fn include_thread_names(&self) -> bool {
        self.include_thread_names
    }
}

fn filter_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_falls_back_to_compact() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("fancy".parse::<LogFormat>().unwrap(), LogFormat::Compact);
    }

    #[test]
    fn verbosity_picks_default_filter() {
        assert_eq!(filter_for_verbosity(0), "warn");
        assert_eq!(filter_for_verbosity(1), "info");
        assert_eq!(filter_for_verbosity(2), "debug");
        assert_eq!(filter_for_verbosity(9), "trace");
    }

    #[test]
    fn high_verbosity_shows_unit_threads() {
        assert!(TracingConfig::for_verbosity(2).include_thread_names());
    }
}
