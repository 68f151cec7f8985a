//! C3 Runtime - host integration layer for the C3 console.
//!
//! This crate provides:
//! - Configuration loading (`C3Config`, `ConfigLoader`)
//! - Logging setup (`LoggingBuilder`, `init_from_config`)
//! - Declaration directory loading (`load_declarations`)
//! - The host-facing orchestrator (`C3Runtime`)
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: TOML config and declaration files
//! - `yaml-config` *(default)*: YAML config and declaration files
//! - `json-log`: newline-delimited JSON log output
//!
//! JSON declaration files are always supported.

pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{C3Config, ConfigError, ConfigLoader, ConfigResult};
pub use error::{LoadError, LoadResult, RuntimeError, RuntimeResult};
pub use loader::{LoadedDeclarations, load_declaration_file, load_declarations, load_directories};
pub use logging::{LoggingBuilder, SpanEvents, init_from_config};
pub use runtime::{C3Runtime, RuntimeBuilder};
