//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct C3Config {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where command declarations are loaded from.
    #[serde(default)]
    pub commands: CommandsConfig,

    /// How results are chunked for the host display.
    #[serde(default)]
    pub display: DisplayConfig,
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level; `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, used when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Include thread IDs in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in log lines.
    #[serde(default)]
    pub file_location: bool,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-module level overrides, e.g. `c3_core = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
            filters: BTreeMap::new(),
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Newline-delimited JSON (requires the `json-log` feature).
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    /// Default, so log lines never interleave with console output on stdout.
    #[default]
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

// =============================================================================
// Commands
// =============================================================================

/// Declaration directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Directories scanned for declaration files, in order.
    #[serde(default = "default_directories")]
    pub directories: Vec<PathBuf>,

    /// File extensions treated as declarations.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            directories: default_directories(),
            extensions: default_extensions(),
        }
    }
}

fn default_directories() -> Vec<PathBuf> {
    vec![PathBuf::from("commands")]
}

/// Extensions for every declaration format compiled in.
pub fn default_extensions() -> Vec<String> {
    let mut extensions = Vec::new();
    #[cfg(feature = "yaml-config")]
    extensions.extend(["yaml".to_string(), "yml".to_string()]);
    #[cfg(feature = "toml-config")]
    extensions.push("toml".to_string());
    extensions.push("json".to_string());
    extensions
}

// =============================================================================
// Display
// =============================================================================

/// Host display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Maximum bytes per printed chunk.
    #[serde(default = "default_width")]
    pub width: usize,

    /// Appended to every result before chunking.
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            separator: default_separator(),
        }
    }
}

fn default_width() -> usize {
    1024
}

fn default_separator() -> String {
    c3_core::DEFAULT_SEPARATOR.to_string()
}
