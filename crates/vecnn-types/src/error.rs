//! Error types for vecnn.

use thiserror::Error;

/// Coarse error categories surfaced to callers of the handle API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing arguments, unsupported distance/data type
    Parameter,
    /// Operation invoked in the wrong lifecycle state
    State,
    /// Position or identifier out of range
    Bounds,
    /// Persistence failures
    Io,
    /// Unrecognized space, method or parameter
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Parameter => "parameter",
            ErrorKind::State => "state",
            ErrorKind::Bounds => "bounds",
            ErrorKind::Io => "io",
            ErrorKind::Config => "config",
        }
    }
}

/// Unified error type for index operations.
#[derive(Debug, Error)]
pub enum VecnnError {
    /// Invalid argument
    #[error("Invalid parameter: {0}")]
    Parameter(String),

    /// Operation not valid in the current lifecycle state
    #[error("Invalid state: {0}")]
    State(String),

    /// Position outside the stored range
    #[error("Position {position} out of range: should be >= 0 and < {len}")]
    OutOfRange { position: i64, len: usize },

    /// Vector dimensionality differs from the stored vectors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Space name not registered
    #[error("Unknown space: {0}")]
    UnknownSpace(String),

    /// Method name not registered
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// Configuration error (unrecognized keys, settings loading)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Index construction failed
    #[error("Build error: {0}")]
    Build(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted index is corrupt or not an index file
    #[error("Index format error: {0}")]
    Format(String),

    /// Persisted index does not match the live configuration
    #[error("Index file incompatible with current configuration: {0}")]
    ParamMismatch(String),
}

impl VecnnError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VecnnError::Parameter(_) | VecnnError::DimensionMismatch { .. } => ErrorKind::Parameter,
            VecnnError::State(_) => ErrorKind::State,
            VecnnError::OutOfRange { .. } => ErrorKind::Bounds,
            VecnnError::Io(_) | VecnnError::Format(_) => ErrorKind::Io,
            VecnnError::UnknownSpace(_)
            | VecnnError::UnknownMethod(_)
            | VecnnError::Config(_)
            | VecnnError::Build(_)
            | VecnnError::ParamMismatch(_) => ErrorKind::Config,
        }
    }
}

/// Result alias used across vecnn crates.
pub type Result<T> = std::result::Result<T, VecnnError>;
