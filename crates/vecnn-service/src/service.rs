//! The host-facing API.
//!
//! Every operation takes an [`IndexToken`] and validates it first. Queries
//! take a shared lock on the handle, so any number of them run at once;
//! mutation and configuration take an exclusive lock and therefore never
//! overlap an in-flight search.

use std::path::Path;

use tracing::{debug, info};
use vecnn_index::{MethodRegistry, Neighbor};
use vecnn_search::KnnMatrix;
use vecnn_space::SpaceRegistry;
use vecnn_types::{
    flatten_rows, DataType, DistType, Params, PointId, RowMajor, Settings, VecnnError,
};

use crate::error::Result;
use crate::handle::{HandleInfo, IndexHandle};
use crate::registry::{HandleRegistry, IndexToken};

/// Owns every live index and the space/method factories used to make them.
#[derive(Debug, Default)]
pub struct KnnService {
    spaces: SpaceRegistry,
    methods: MethodRegistry,
    handles: HandleRegistry,
}

impl KnnService {
    /// Service with every built-in space and method.
    pub fn new() -> Self {
        Self::default()
    }

    /// Service with custom factories.
    pub fn with_registries(spaces: SpaceRegistry, methods: MethodRegistry) -> Self {
        Self {
            spaces,
            methods,
            handles: HandleRegistry::new(),
        }
    }

    pub fn spaces(&self) -> &SpaceRegistry {
        &self.spaces
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    /// Create an empty, unbuilt index.
    pub fn create_index<S: AsRef<str>>(
        &self,
        space_name: &str,
        space_params: &[S],
        method_name: &str,
        data_type: DataType,
        dist_type: DistType,
    ) -> Result<IndexToken> {
        dist_type.ensure_supported()?;
        data_type.ensure_supported()?;
        if !self.methods.contains(method_name) {
            return Err(VecnnError::UnknownMethod(method_name.to_string()).into());
        }
        let params = Params::parse(space_params)?;
        let space = self.spaces.create(space_name, &params)?;

        let descriptor = space.descriptor();
        let token = self
            .handles
            .insert(IndexHandle::new(space, method_name, data_type, dist_type));
        info!(
            token = %token,
            space = %descriptor,
            method = method_name,
            "Index created"
        );
        Ok(token)
    }

    /// Create an index from the space, method and type tags in `settings`.
    pub fn create_index_from_settings(&self, settings: &Settings) -> Result<IndexToken> {
        self.create_index(
            &settings.space,
            &settings.space_params,
            &settings.method,
            settings.data_type,
            settings.dist_type,
        )
    }

    pub fn add_point(&self, token: IndexToken, id: PointId, vector: &[f32]) -> Result<()> {
        let handle = self.handles.get(token)?;
        handle.write().add_point(id, vector)?;
        Ok(())
    }

    /// Append a contiguous row-major batch.
    pub fn add_points_batch(
        &self,
        token: IndexToken,
        ids: &[PointId],
        vectors: RowMajor<'_>,
    ) -> Result<()> {
        let handle = self.handles.get(token)?;
        let added = handle.write().add_points(ids, vectors)?;
        debug!(token = %token, points = added, "Points added");
        Ok(())
    }

    /// Append a batch given as separate rows; ragged rows are rejected.
    pub fn add_points_rows<R: AsRef<[f32]>>(
        &self,
        token: IndexToken,
        ids: &[PointId],
        rows: &[R],
    ) -> Result<()> {
        let (data, cols) = flatten_rows(rows)?;
        let vectors = RowMajor::new(&data, rows.len(), cols)?;
        self.add_points_batch(token, ids, vectors)
    }

    pub fn build_index<S: AsRef<str>>(&self, token: IndexToken, build_params: &[S]) -> Result<()> {
        let params = Params::parse(build_params)?;
        let handle = self.handles.get(token)?;
        handle.write().build(&self.methods, &params)?;
        Ok(())
    }

    pub fn save_index(&self, token: IndexToken, path: &Path) -> Result<()> {
        let handle = self.handles.get(token)?;
        let guard = handle.read();
        guard.save(path)?;
        Ok(())
    }

    pub fn load_index(&self, token: IndexToken, path: &Path) -> Result<()> {
        let handle = self.handles.get(token)?;
        handle.write().load(&self.methods, path)?;
        Ok(())
    }

    pub fn set_query_params<S: AsRef<str>>(&self, token: IndexToken, params: &[S]) -> Result<()> {
        let params = Params::parse(params)?;
        let handle = self.handles.get(token)?;
        handle.write().set_query_params(&params)?;
        debug!(token = %token, params = %params, "Query parameters set");
        Ok(())
    }

    /// Up to `k` identifiers, nearest first.
    pub fn knn_query(&self, token: IndexToken, k: usize, query: &[f32]) -> Result<Vec<PointId>> {
        let handle = self.handles.get(token)?;
        let guard = handle.read();
        Ok(guard.knn_query(k, query)?)
    }

    pub fn knn_query_with_distances(
        &self,
        token: IndexToken,
        k: usize,
        query: &[f32],
    ) -> Result<Vec<Neighbor>> {
        let handle = self.handles.get(token)?;
        let guard = handle.read();
        Ok(guard.knn_query_with_distances(k, query)?)
    }

    /// Answer every row of `queries` with `num_threads` workers.
    pub fn knn_query_batch(
        &self,
        token: IndexToken,
        num_threads: usize,
        k: usize,
        queries: RowMajor<'_>,
    ) -> Result<KnnMatrix> {
        let handle = self.handles.get(token)?;
        let guard = handle.read();
        Ok(guard.knn_query_batch(num_threads, k, queries)?)
    }

    /// Copy of the vector at `position`.
    pub fn get_point(&self, token: IndexToken, position: i64) -> Result<Vec<f32>> {
        let handle = self.handles.get(token)?;
        let guard = handle.read();
        Ok(guard.get_point(position)?)
    }

    pub fn get_point_count(&self, token: IndexToken) -> Result<usize> {
        let handle = self.handles.get(token)?;
        let count = handle.read().point_count();
        Ok(count)
    }

    pub fn handle_info(&self, token: IndexToken) -> Result<HandleInfo> {
        let handle = self.handles.get(token)?;
        let info = handle.read().info();
        Ok(info)
    }

    /// Release the index. The token is rejected by every later call.
    pub fn free_index(&self, token: IndexToken) -> Result<()> {
        let handle = self.handles.remove(token)?;
        let points = handle.read().point_count();
        info!(token = %token, points = points, "Index freed");
        Ok(())
    }

    /// Tokens of every live index.
    pub fn live_handles(&self) -> Vec<IndexToken> {
        self.handles.tokens()
    }
}
