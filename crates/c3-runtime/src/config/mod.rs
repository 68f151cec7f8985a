//! Configuration module for the C3 runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for logging, declaration directories and output display settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, Profile, load_config, load_config_from_file};
pub use schema::{
    C3Config, CommandsConfig, DisplayConfig, LogFormat, LogLevel, LogOutput, LoggingConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
