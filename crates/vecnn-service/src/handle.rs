//! A single index instance as seen by the host.
//!
//! The handle owns the space, the vector store and, once built or loaded, the
//! ready index. While unbuilt it is the sole owner of the store and points can
//! be appended. Building shares the store with the index, which freezes it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use vecnn_index::{Index, MethodRegistry, Neighbor};
use vecnn_search::{BatchQueryScheduler, KnnMatrix, KnnSearchEngine};
use vecnn_space::Space;
use vecnn_types::{
    DataType, DistType, Params, PointId, Result, RowMajor, VecnnError, VectorStore,
};

/// Read-only summary of a handle.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleInfo {
    pub space: String,
    pub method: String,
    pub data_type: DataType,
    pub dist_type: DistType,
    pub point_count: usize,
    pub dimension: Option<usize>,
    pub built: bool,
    pub query_params: Vec<String>,
}

pub struct IndexHandle {
    space: Arc<dyn Space>,
    method: String,
    data_type: DataType,
    dist_type: DistType,
    store: Arc<VectorStore>,
    index: Option<Box<dyn Index>>,
}

impl IndexHandle {
    pub fn new(
        space: Arc<dyn Space>,
        method: &str,
        data_type: DataType,
        dist_type: DistType,
    ) -> Self {
        Self {
            space,
            method: method.to_string(),
            data_type,
            dist_type,
            store: Arc::new(VectorStore::new()),
            index: None,
        }
    }

    pub fn is_built(&self) -> bool {
        self.index.is_some()
    }

    pub fn point_count(&self) -> usize {
        self.store.len()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.store.dimension()
    }

    pub fn space(&self) -> &dyn Space {
        self.space.as_ref()
    }

    fn store_mut(&mut self) -> Result<&mut VectorStore> {
        if self.index.is_some() {
            warn!(method = %self.method, "Rejected point insertion into a built index");
            return Err(VecnnError::State(
                "points cannot be added after the index is built".to_string(),
            ));
        }
        Arc::get_mut(&mut self.store).ok_or_else(|| {
            VecnnError::State("vector store is in use by a search".to_string())
        })
    }

    /// Append one point; returns its position.
    pub fn add_point(&mut self, id: PointId, vector: &[f32]) -> Result<usize> {
        self.store_mut()?.append(id, vector)
    }

    /// Append a batch. The whole batch is validated before anything is
    /// stored, so a rejected batch leaves the store unchanged.
    pub fn add_points(&mut self, ids: &[PointId], vectors: RowMajor<'_>) -> Result<usize> {
        if ids.len() != vectors.rows() {
            return Err(VecnnError::Parameter(format!(
                "got {} ids for {} vectors",
                ids.len(),
                vectors.rows()
            )));
        }
        let store = self.store_mut()?;
        if let Some(first) = vectors.iter().next() {
            store.check_vector(first)?;
        }
        store.reserve(vectors.rows());
        for (&id, vector) in ids.iter().zip(vectors.iter()) {
            store.append(id, vector)?;
        }
        Ok(vectors.rows())
    }

    /// Build a fresh index over the current points.
    ///
    /// The previous index, if any, is replaced only when the build succeeds.
    pub fn build(&mut self, methods: &MethodRegistry, params: &Params) -> Result<()> {
        let method = methods.create(&self.method, self.space.clone(), self.store.clone())?;
        let index = method.build(params)?;
        info!(
            method = %self.method,
            space = %self.space.descriptor(),
            points = index.len(),
            "Index built"
        );
        self.index = Some(index);
        Ok(())
    }

    /// Replace the index with one restored from `path`.
    pub fn load(&mut self, methods: &MethodRegistry, path: &Path) -> Result<()> {
        let method = methods.create(&self.method, self.space.clone(), self.store.clone())?;
        let index = method.restore(path)?;
        info!(
            method = %self.method,
            path = ?path,
            points = index.len(),
            "Index loaded"
        );
        self.index = Some(index);
        Ok(())
    }

    fn ready(&self) -> Result<&dyn Index> {
        self.index.as_deref().ok_or_else(|| {
            VecnnError::State("index has not been built or loaded".to_string())
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.ready()?.persist(path)
    }

    pub fn set_query_params(&mut self, params: &Params) -> Result<()> {
        let index = self.index.as_deref_mut().ok_or_else(|| {
            VecnnError::State("index has not been built or loaded".to_string())
        })?;
        index.set_query_params(params)
    }

    pub fn query_params(&self) -> Result<Params> {
        Ok(self.ready()?.query_params())
    }

    pub fn engine(&self) -> Result<KnnSearchEngine<'_>> {
        let index = self.ready()?;
        Ok(KnnSearchEngine::new(index, self.space.as_ref()).with_dimension(self.store.dimension()))
    }

    pub fn knn_query(&self, k: usize, query: &[f32]) -> Result<Vec<PointId>> {
        self.engine()?.search(query, k)
    }

    pub fn knn_query_with_distances(&self, k: usize, query: &[f32]) -> Result<Vec<Neighbor>> {
        self.engine()?.search_with_distances(query, k)
    }

    pub fn knn_query_batch(
        &self,
        num_threads: usize,
        k: usize,
        queries: RowMajor<'_>,
    ) -> Result<KnnMatrix> {
        let engine = self.engine()?;
        BatchQueryScheduler::new(num_threads)?.run_matrix(&engine, queries, k)
    }

    /// Copy of the vector stored at `position`.
    pub fn get_point(&self, position: i64) -> Result<Vec<f32>> {
        Ok(self.store.get(position)?.to_vec())
    }

    pub fn info(&self) -> HandleInfo {
        HandleInfo {
            space: self.space.descriptor(),
            method: self.method.clone(),
            data_type: self.data_type,
            dist_type: self.dist_type,
            point_count: self.store.len(),
            dimension: self.store.dimension(),
            built: self.index.is_some(),
            query_params: self
                .index
                .as_ref()
                .map(|i| i.query_params().to_strings())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexHandle")
            .field("space", &self.space.descriptor())
            .field("method", &self.method)
            .field("points", &self.store.len())
            .field("built", &self.index.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vecnn_space::L2Space;

    fn handle(method: &str) -> IndexHandle {
        IndexHandle::new(Arc::new(L2Space), method, DataType::Vector, DistType::Float)
    }

    #[test]
    fn test_query_before_build() {
        let mut h = handle("brute_force");
        h.add_point(1, &[0.0, 0.0]).unwrap();
        assert!(matches!(h.knn_query(1, &[0.0, 0.0]), Err(VecnnError::State(_))));
        assert!(matches!(
            h.set_query_params(&Params::new()),
            Err(VecnnError::State(_))
        ));
    }

    #[test]
    fn test_add_after_build_rejected() {
        let methods = MethodRegistry::with_defaults();
        let mut h = handle("brute_force");
        h.add_point(1, &[0.0, 0.0]).unwrap();
        h.build(&methods, &Params::new()).unwrap();
        assert!(matches!(h.add_point(2, &[1.0, 1.0]), Err(VecnnError::State(_))));
        assert_eq!(h.point_count(), 1);
    }

    #[test]
    fn test_batch_validated_before_append() {
        let mut h = handle("brute_force");
        h.add_point(1, &[0.0, 0.0]).unwrap();

        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let rows = RowMajor::new(&data, 2, 3).unwrap();
        assert!(matches!(
            h.add_points(&[2, 3], rows),
            Err(VecnnError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            h.add_points(&[2], rows),
            Err(VecnnError::Parameter(_))
        ));
        assert_eq!(h.point_count(), 1);
    }

    #[test]
    fn test_failed_build_keeps_previous_index() {
        let methods = MethodRegistry::with_defaults();
        let mut h = handle("hnsw");
        h.add_point(10, &[0.0, 0.0]).unwrap();
        h.add_point(11, &[1.0, 0.0]).unwrap();
        h.build(&methods, &Params::new()).unwrap();

        let bad = Params::parse(&["M=0"]).unwrap();
        assert!(h.build(&methods, &bad).is_err());
        assert!(h.is_built());
        assert_eq!(h.knn_query(1, &[0.9, 0.0]).unwrap(), vec![11]);
    }

    #[test]
    fn test_failed_load_keeps_previous_index() {
        let temp = TempDir::new().unwrap();
        let methods = MethodRegistry::with_defaults();
        let mut h = handle("brute_force");
        h.add_point(10, &[0.0, 0.0]).unwrap();
        h.build(&methods, &Params::new()).unwrap();

        assert!(h.load(&methods, &temp.path().join("missing.idx")).is_err());
        assert_eq!(h.knn_query(1, &[0.0, 0.0]).unwrap(), vec![10]);
    }

    #[test]
    fn test_info() {
        let methods = MethodRegistry::with_defaults();
        let mut h = handle("hnsw");
        h.add_point(1, &[0.5, 0.5]).unwrap();
        let info = h.info();
        assert!(!info.built);
        assert_eq!(info.dimension, Some(2));
        assert!(info.query_params.is_empty());

        h.build(&methods, &Params::parse(&["efSearch=20"]).unwrap()).unwrap();
        let info = h.info();
        assert!(info.built);
        assert_eq!(info.space, "l2");
        assert_eq!(info.query_params, vec!["efSearch=20".to_string()]);
    }
}
