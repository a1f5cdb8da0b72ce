//! # vecnn-service
//!
//! Handle-based API for hosts embedding vecnn.
//!
//! A host initializes the library once with [`init_library`], creates indexes
//! through a [`KnnService`] and refers to them by [`IndexToken`]. Tokens are
//! generation-checked: using one after `free_index` fails with
//! [`ServiceError::InvalidHandle`] instead of touching freed state.

pub mod error;
pub mod handle;
pub mod library;
pub mod registry;
pub mod service;

pub use error::{Result, ServiceError};
pub use handle::{HandleInfo, IndexHandle};
pub use library::{init_library, is_initialized, LibraryGuard, LogTarget};
pub use registry::{HandleRegistry, IndexToken, SharedHandle};
pub use service::KnnService;

pub use vecnn_search::{KnnMatrix, PAD_ID};
pub use vecnn_types::{DataType, DistType, ErrorKind, PointId, RowMajor};
