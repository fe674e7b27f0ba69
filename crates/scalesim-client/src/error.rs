//! Simulation failures.

use scalesim_core::DecodeError;
use thiserror::Error;

pub type SimulationResult<T> = Result<T, SimulationError>;

/// A failed simulation run, carrying the underlying cause.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid simulator url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to connect to simulator at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("http handshake with simulator failed: {0}")]
    Handshake(#[source] hyper::Error),

    #[error("failed to encode simulation request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to build simulation request: {0}")]
    Build(#[from] http::Error),

    #[error("simulation request failed: {0}")]
    Request(#[source] hyper::Error),

    /// Transport failure, or a response larger than the configured limit.
    #[error("failed to read simulator response: {0}")]
    Body(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("simulator returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed simulator response: {0}")]
    Malformed(#[from] DecodeError),
}
