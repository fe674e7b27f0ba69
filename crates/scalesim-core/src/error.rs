//! Error types for parameter handling and tick decoding.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while mutating parameters or loading `scalesim.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unrecognized parameter: {0}")]
    UnrecognizedParameter(String),

    #[error("invalid value for {parameter}: {raw:?} is not an integer")]
    InvalidValue { parameter: String, raw: String },

    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised while decoding a simulator response into ticks.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("response is not a JSON array of ticks: {0}")]
    NotASequence(String),

    #[error("tick {index} is malformed: {reason}")]
    Tick { index: usize, reason: String },
}
