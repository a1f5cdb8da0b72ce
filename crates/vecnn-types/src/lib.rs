//! # vecnn-types
//!
//! Shared types for the vecnn nearest-neighbor index.
//!
//! - Errors: [`VecnnError`] and its coarse [`ErrorKind`]
//! - Parameters: ordered `key=value` lists ([`Params`], [`ParamReader`])
//! - Storage: the append-only [`VectorStore`]
//! - Batches: row-major views over contiguous buffers ([`RowMajor`])
//! - Settings: layered configuration ([`Settings`])

pub mod config;
pub mod error;
pub mod matrix;
pub mod params;
pub mod store;
pub mod tags;

pub use config::Settings;
pub use error::{ErrorKind, Result, VecnnError};
pub use matrix::{flatten_rows, RowMajor};
pub use params::{ParamReader, Params};
pub use store::{DataPoint, PointId, VectorStore};
pub use tags::{DataType, DistType};
