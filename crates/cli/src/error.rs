//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: engine error (unknown technique, GPU object or shader failure)
//! - 11: I/O error (config or shader file unreadable, output unwritable)
//! - 12: input error (malformed config, bad import directive)
//! - 13: serialization error

use raster_core::{ConfigError, PreprocessError, RasterError};
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
pub enum CliError {
    /// A rasterizer-level error (unknown technique, shader build failure).
    Engine(RasterError),
    /// An I/O error (config file, shader source or generated output).
    Io(String),
    /// A user input error (malformed config, bad import directive).
    Input(String),
    /// A serialization error (JSON output failure).
    Serialization(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Engine(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Engine(e) => write!(f, "{e}"),
            CliError::Io(msg) => write!(f, "{msg}"),
            CliError::Input(msg) => write!(f, "{msg}"),
            CliError::Serialization(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<RasterError> for CliError {
    fn from(e: RasterError) -> Self {
        CliError::Engine(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Io { .. } => CliError::Io(e.to_string()),
            ConfigError::Parse(_) => CliError::Input(e.to_string()),
        }
    }
}

impl From<PreprocessError> for CliError {
    fn from(e: PreprocessError) -> Self {
        match e {
            PreprocessError::Open { .. }
            | PreprocessError::Write(_)
            | PreprocessError::Include { .. } => CliError::Io(e.to_string()),
            PreprocessError::Unterminated { .. }
            | PreprocessError::Malformed { .. }
            | PreprocessError::NestedImport { .. }
            | PreprocessError::ConfigMismatch { .. } => CliError::Input(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
