use thiserror::Error;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    /// The sequence violates a tick invariant; nothing is projected.
    #[error("malformed tick sequence at tick {tick}: {reason}")]
    MalformedTickSequence { tick: usize, reason: String },
}
