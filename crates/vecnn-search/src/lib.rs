//! # vecnn-search
//!
//! Query execution over a ready index.
//!
//! [`KnnSearchEngine`] answers one query and returns neighbors nearest first.
//! [`BatchQueryScheduler`] fans a row-major batch out over worker threads and
//! returns results in input order, optionally packed into a padded
//! [`KnnMatrix`].

pub mod batch;
pub mod engine;

pub use batch::{BatchQueryScheduler, KnnMatrix, MAX_MATRIX_IDS, PAD_ID};
pub use engine::KnnSearchEngine;
