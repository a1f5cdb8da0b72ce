//! Host-facing error type.

use thiserror::Error;
use vecnn_types::{ErrorKind, VecnnError};

use crate::registry::IndexToken;

/// Every failure a host can observe through [`KnnService`](crate::KnnService).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] VecnnError),

    /// Token was never issued, or its index has been freed
    #[error("Invalid index handle: {0}")]
    InvalidHandle(IndexToken),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Core(e) => e.kind(),
            ServiceError::InvalidHandle(_) => ErrorKind::State,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
