//! Single-query execution.

use tracing::debug;
use vecnn_index::{Index, KnnQuery, Neighbor};
use vecnn_space::Space;
use vecnn_types::{PointId, Result, VecnnError};

/// Runs one kNN query against a ready index and drains the result queue.
///
/// The engine borrows everything it needs, so it is `Copy` and can be shared
/// by reference across worker threads.
#[derive(Clone, Copy)]
pub struct KnnSearchEngine<'a> {
    index: &'a dyn Index,
    space: &'a dyn Space,
    dimension: Option<usize>,
}

impl<'a> KnnSearchEngine<'a> {
    pub fn new(index: &'a dyn Index, space: &'a dyn Space) -> Self {
        Self {
            index,
            space,
            dimension: None,
        }
    }

    /// Reject queries whose length differs from `dimension`.
    pub fn with_dimension(mut self, dimension: Option<usize>) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn index(&self) -> &'a dyn Index {
        self.index
    }

    pub fn check_query(&self, query: &[f32], k: usize) -> Result<()> {
        if k < 1 {
            return Err(VecnnError::Parameter(format!(
                "k must be at least 1, got {}",
                k
            )));
        }
        if query.is_empty() {
            return Err(VecnnError::Parameter("query vector is empty".to_string()));
        }
        match self.dimension {
            Some(expected) if expected != query.len() => Err(VecnnError::DimensionMismatch {
                expected,
                actual: query.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Up to `k` neighbors, nearest first.
    pub fn search_with_distances(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check_query(query, k)?;
        let mut knn = KnnQuery::new(self.space, query, k);
        self.index.search(&mut knn)?;
        let computations = knn.distance_computations();
        let neighbors = knn.into_neighbors();
        debug!(
            method = self.index.method_name(),
            k = k,
            found = neighbors.len(),
            distance_computations = computations,
            "Query complete"
        );
        Ok(neighbors)
    }

    /// Identifiers of up to `k` neighbors, nearest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<PointId>> {
        Ok(self
            .search_with_distances(query, k)?
            .into_iter()
            .map(|n| n.id)
            .collect())
    }
}
