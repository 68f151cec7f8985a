//! Runtime error types.

use std::path::PathBuf;

use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors from reading declaration files.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A configured declaration directory does not exist.
    #[error("Declaration directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// The directory exists but could not be listed.
    #[error("Failed to read declaration directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file's format is not compiled in.
    #[error("Unsupported declaration format: {0}")]
    UnsupportedFormat(PathBuf),

    /// The file could not be decoded into a command declaration.
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
}

impl LoadError {
    pub fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Errors that can occur while building or running a `C3Runtime`.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The script runtime collaborator was not supplied.
    #[error("No script runtime configured")]
    MissingScriptRuntime,

    /// The console host collaborator was not supplied.
    #[error("No console host configured")]
    MissingHost,

    /// No tokio runtime is running and a new one could not be created.
    #[error("Failed to start async runtime: {0}")]
    AsyncRuntime(#[source] std::io::Error),
}

/// Result type for declaration loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
