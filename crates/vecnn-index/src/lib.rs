//! # vecnn-index
//!
//! Index methods for approximate kNN search.
//!
//! Every method is created unbuilt from a [`MethodRegistry`] and becomes a
//! searchable [`Index`] only through `build` or `restore`:
//!
//! - `brute_force` / `seq_search`: exhaustive scan, exact results
//! - `hnsw`: hierarchical navigable small world graph
//! - `usearch_hnsw`: usearch-backed HNSW (feature `usearch`)
//!
//! Searches fill a per-call [`KnnQuery`], so a ready index can serve any
//! number of concurrent queries.

pub mod brute_force;
pub mod format;
pub mod hnsw;
pub mod method;
pub mod query;
pub mod queue;
#[cfg(feature = "usearch")]
pub mod usearch_hnsw;

pub use brute_force::{BruteForceIndex, BruteForceMethod};
pub use format::{IndexHeader, FORMAT_VERSION, INDEX_MAGIC};
pub use hnsw::{HnswIndex, HnswMethod, HnswParams, MAX_EF, MAX_M};
pub use method::{Index, Method, MethodContext, MethodCtor, MethodRegistry};
pub use query::KnnQuery;
pub use queue::{KnnQueue, Neighbor};
#[cfg(feature = "usearch")]
pub use usearch_hnsw::{UsearchHnswIndex, UsearchMethod};
