//! Structured logging for squadhealth
//!
//! Engine events (registrations, status changes, recomputations) and scheduler ticks are
//! emitted through `tracing`. This module wires them to the console and, optionally, to a
//! JSON log file rotated daily.
//!
//! Level precedence, lowest to highest: config file, `-v` count, `--log-level`, `RUST_LOG`.

use serde::{Deserialize, Serialize};
use std::fmt as stdfmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

const DEFAULT_LOG_FILE: &str = "squadhealth.log";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Level for the whole crate
    pub level: LogLevel,

    /// Console format
    pub format: LogFormat,

    /// JSON log file; console only when unset
    pub file_path: Option<PathBuf>,

    /// Rotate the log file daily
    pub rotation: bool,

    /// Report tick span enter/exit
    pub include_spans: bool,

    /// Separate level for scheduler output. Ticks fire every few seconds, so this keeps
    /// `debug` engine logs readable during `watch`.
    #[serde(default)]
    pub scheduler_level: Option<LogLevel>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Pretty,
            file_path: None,
            rotation: true,
            include_spans: false,
            scheduler_level: None,
        }
    }
}

impl LogConfig {
    /// Fold command-line flags into the file settings. An explicit level beats `-v`.
    pub fn with_overrides(
        mut self,
        verbose: u8,
        level: Option<LogLevel>,
        format: Option<LogFormat>,
    ) -> Self {
        if verbose > 0 {
            self.level = LogLevel::from_verbosity(verbose);
        }
        if let Some(level) = level {
            self.level = level;
        }
        if let Some(format) = format {
            self.format = format;
        }
        self
    }

    /// Filter directives applied when `RUST_LOG` is unset
    pub fn directives(&self) -> Vec<Directive> {
        let mut directives = vec![crate_directive("squadhealth", self.level)];
        if let Some(level) = self.scheduler_level {
            directives.push(crate_directive("squadhealth::scheduler", level));
        }
        directives
    }

    fn filter(&self) -> EnvFilter {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => self
                .directives()
                .into_iter()
                .fold(EnvFilter::new("off"), EnvFilter::add_directive),
        }
    }
}

fn crate_directive(target: &str, level: LogLevel) -> Directive {
    format!("{}={}", target, level)
        .parse()
        .unwrap_or_else(|_| level.to_tracing_level().into())
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Map a `-v` count onto a level: none is warn, then info, debug, trace
    pub fn from_verbosity(verbose: u8) -> Self {
        match verbose {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl stdfmt::Display for LogLevel {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        let name = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Invalid log level '{}': expected error, warn, info, debug or trace",
                s
            )),
        }
    }
}

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line with colours and source lines
    Pretty,
    /// One JSON object per event
    Json,
    /// One line per event
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!(
                "Invalid log format '{}': expected pretty, json or compact",
                s
            )),
        }
    }
}

fn span_events(include_spans: bool) -> FmtSpan {
    if include_spans {
        FmtSpan::ENTER | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

/// Console layer. Diagnostics go to stderr so roster tables on stdout stay clean.
fn console_layer<S>(config: &LogConfig) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let spans = span_events(config.include_spans);
    match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
            .with_span_events(spans)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(config.include_spans)
            .with_span_list(config.include_spans)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_events(spans)
            .boxed(),
    }
}

/// JSON file layer, when a log file is configured
fn file_layer<S>(config: &LogConfig) -> anyhow::Result<Option<BoxedLayer<S>>>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let Some(file_path) = &config.file_path else {
        return Ok(None);
    };

    let directory = file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory)?;

    let layer = fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(config.include_spans)
        .with_span_list(config.include_spans);

    let layer = if config.rotation {
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_LOG_FILE);
        layer
            .with_writer(tracing_appender::rolling::daily(directory, file_name))
            .boxed()
    } else {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        layer.with_writer(file).boxed()
    };

    Ok(Some(layer))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(config.filter());
    let console = console_layer(config);
    let file = file_layer(config)?;

    registry.with(console).with(file).try_init()?;

    tracing::info!(
        level = %config.level,
        format = ?config.format,
        file = ?config.file_path,
        "Logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!(" Warning ".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        let err = "loud".parse::<LogLevel>().unwrap_err();
        assert!(err.contains("'loud'"));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_verbosity_mapping() {
        assert_eq!(LogLevel::from_verbosity(0), LogLevel::Warn);
        assert_eq!(LogLevel::from_verbosity(1), LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(2).to_tracing_level(), Level::DEBUG);
        assert_eq!(LogLevel::from_verbosity(9), LogLevel::Trace);
    }

    #[test]
    fn test_explicit_level_beats_verbosity() {
        let config = LogConfig::default().with_overrides(2, Some(LogLevel::Error), None);
        assert_eq!(config.level, LogLevel::Error);

        let config = LogConfig::default().with_overrides(1, None, Some(LogFormat::Json));
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Json);

        // No flags: file settings survive
        let file = LogConfig {
            level: LogLevel::Debug,
            ..LogConfig::default()
        };
        assert_eq!(file.clone().with_overrides(0, None, None), file);
    }

    #[test]
    fn test_directives_include_scheduler_override() {
        let config = LogConfig {
            level: LogLevel::Debug,
            scheduler_level: Some(LogLevel::Warn),
            ..LogConfig::default()
        };
        let directives: Vec<String> = config
            .directives()
            .iter()
            .map(|d| d.to_string().to_lowercase())
            .collect();

        assert_eq!(
            directives,
            vec!["squadhealth=debug", "squadhealth::scheduler=warn"]
        );
        assert_eq!(LogConfig::default().directives().len(), 1);
    }

    #[test]
    fn test_log_config_from_toml_without_scheduler_level() {
        let config: LogConfig = toml::from_str(
            r#"
            level = "info"
            format = "compact"
            rotation = false
            include_spans = true
            "#,
        )
        .unwrap();

        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.scheduler_level, None);
        assert_eq!(config.file_path, None);
    }
}
