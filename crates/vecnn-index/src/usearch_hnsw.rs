//! HNSW backed by the usearch library.
//!
//! Keys handed to usearch are store positions. usearch ranks with its own
//! kernels, so every returned candidate is re-scored with the configured
//! space before it reaches the result queue.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;
use usearch::{Index as UsearchIndex, IndexOptions, MetricKind, ScalarKind};
use vecnn_space::Space;
use vecnn_types::{Params, Result, VecnnError, VectorStore};

use crate::format::{read_index, write_index, IndexHeader};
use crate::hnsw::{DEFAULT_EF_CONSTRUCTION, DEFAULT_EF_SEARCH, DEFAULT_M, MAX_EF, MAX_M};
use crate::method::{Index, Method, MethodContext};
use crate::query::KnnQuery;

const METHOD_NAME: &str = "usearch_hnsw";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct UsearchParams {
    connectivity: usize,
    expansion_add: usize,
    expansion_search: usize,
}

impl UsearchParams {
    fn from_params(params: &Params) -> Result<Self> {
        let mut reader = params.reader();
        let parsed = Self {
            connectivity: reader.get("M", DEFAULT_M)?,
            expansion_add: reader.get("efConstruction", DEFAULT_EF_CONSTRUCTION)?,
            expansion_search: reader.get("efSearch", DEFAULT_EF_SEARCH)?,
        };
        reader.finish()?;
        if !(2..=MAX_M).contains(&parsed.connectivity)
            || !(1..=MAX_EF).contains(&parsed.expansion_add)
            || !(1..=MAX_EF).contains(&parsed.expansion_search)
        {
            return Err(VecnnError::Parameter(format!(
                "invalid usearch parameters: M={}, efConstruction={}, efSearch={}",
                parsed.connectivity, parsed.expansion_add, parsed.expansion_search
            )));
        }
        Ok(parsed)
    }
}

/// usearch kernel matching a space name, if there is one.
fn metric_for(space: &dyn Space) -> Result<MetricKind> {
    match space.name() {
        "l2" => Ok(MetricKind::L2sq),
        "cosinesimil" => Ok(MetricKind::Cos),
        "negdotprod" => Ok(MetricKind::IP),
        other => Err(VecnnError::Config(format!(
            "space '{}' is not supported by {}",
            other, METHOD_NAME
        ))),
    }
}

fn new_index(metric: MetricKind, dimensions: usize, params: &UsearchParams) -> Result<UsearchIndex> {
    let options = IndexOptions {
        dimensions,
        metric,
        quantization: ScalarKind::F32,
        connectivity: params.connectivity,
        expansion_add: params.expansion_add,
        expansion_search: params.expansion_search,
        multi: false,
    };
    UsearchIndex::new(&options).map_err(|e| VecnnError::Build(e.to_string()))
}

/// Unbuilt usearch instance.
pub struct UsearchMethod {
    space: Arc<dyn Space>,
    store: Arc<VectorStore>,
}

impl UsearchMethod {
    pub fn new(ctx: MethodContext) -> Self {
        Self {
            space: ctx.space,
            store: ctx.store,
        }
    }
}

impl Method for UsearchMethod {
    fn name(&self) -> &'static str {
        METHOD_NAME
    }

    fn build(self: Box<Self>, params: &Params) -> Result<Box<dyn Index>> {
        let params = UsearchParams::from_params(params)?;
        let metric = metric_for(self.space.as_ref())?;
        let dimensions = self.store.dimension().ok_or_else(|| {
            VecnnError::Build(format!("{} cannot be built over an empty store", METHOD_NAME))
        })?;

        let start = Instant::now();
        let index = new_index(metric, dimensions, &params)?;
        index
            .reserve(self.store.len())
            .map_err(|e| VecnnError::Build(e.to_string()))?;
        for point in self.store.iter() {
            index
                .add(point.position as u64, point.vector)
                .map_err(|e| VecnnError::Build(e.to_string()))?;
        }
        info!(
            points = index.size(),
            connectivity = params.connectivity,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built usearch index"
        );

        Ok(Box::new(UsearchHnswIndex {
            space: self.space,
            store: self.store,
            params,
            index,
        }))
    }

    fn restore(self: Box<Self>, path: &Path) -> Result<Box<dyn Index>> {
        let metric = metric_for(self.space.as_ref())?;
        let expected = IndexHeader::describe(METHOD_NAME, self.space.as_ref(), &self.store);
        let body: UsearchBody = read_index(path, &expected)?;

        let dimensions = self.store.dimension().unwrap_or(0);
        let index = new_index(metric, dimensions, &body.params)
            .map_err(|e| VecnnError::Format(e.to_string()))?;
        index
            .load_from_buffer(&body.blob)
            .map_err(|e| VecnnError::Format(format!("cannot load usearch blob: {}", e)))?;
        if index.size() != self.store.len() {
            return Err(VecnnError::Format(format!(
                "usearch blob holds {} points, store holds {}",
                index.size(),
                self.store.len()
            )));
        }

        Ok(Box::new(UsearchHnswIndex {
            space: self.space,
            store: self.store,
            params: body.params,
            index,
        }))
    }
}

#[derive(Serialize, Deserialize)]
struct UsearchBody {
    params: UsearchParams,
    blob: Vec<u8>,
}

/// Ready usearch index.
pub struct UsearchHnswIndex {
    space: Arc<dyn Space>,
    store: Arc<VectorStore>,
    params: UsearchParams,
    index: UsearchIndex,
}

impl Index for UsearchHnswIndex {
    fn method_name(&self) -> &'static str {
        METHOD_NAME
    }

    fn len(&self) -> usize {
        self.index.size()
    }

    fn persist(&self, path: &Path) -> Result<()> {
        let mut blob = vec![0u8; self.index.serialized_length()];
        self.index
            .save_to_buffer(&mut blob)
            .map_err(|e| VecnnError::Format(format!("cannot serialize usearch index: {}", e)))?;
        let header = IndexHeader::describe(METHOD_NAME, self.space.as_ref(), &self.store);
        write_index(
            path,
            &header,
            &UsearchBody {
                params: self.params,
                blob,
            },
        )
    }

    fn set_query_params(&mut self, params: &Params) -> Result<()> {
        let mut reader = params.reader();
        let expansion: usize = reader.get("efSearch", DEFAULT_EF_SEARCH)?;
        reader.finish()?;
        if !(1..=MAX_EF).contains(&expansion) {
            return Err(VecnnError::Parameter(format!(
                "efSearch must be in [1, {}], got {}",
                MAX_EF, expansion
            )));
        }
        self.index.change_expansion_search(expansion);
        self.params.expansion_search = expansion;
        Ok(())
    }

    fn query_params(&self) -> Params {
        let mut params = Params::new();
        let _ = params.insert("efSearch", self.params.expansion_search.to_string());
        params
    }

    fn search(&self, query: &mut KnnQuery<'_>) -> Result<()> {
        let matches = self
            .index
            .search(query.vector(), query.k())
            .map_err(|e| VecnnError::Parameter(format!("usearch query failed: {}", e)))?;
        for key in matches.keys {
            let position = key as usize;
            if position < self.store.len() {
                query.check_and_add(self.store.point(position));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecnn_space::{L1Space, L2Space};

    fn store() -> Arc<VectorStore> {
        let mut store = VectorStore::new();
        for i in 0..64 {
            let x = i as f32;
            store.append(1000 + i, &[x, x * 0.5, 1.0]).unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn test_unsupported_space() {
        let method = Box::new(UsearchMethod::new(MethodContext {
            space: Arc::new(L1Space),
            store: store(),
        }));
        let err = method.build(&Params::new()).err().unwrap();
        assert!(matches!(err, VecnnError::Config(_)));
    }

    #[test]
    fn test_search_returns_store_ids() {
        let space: Arc<dyn Space> = Arc::new(L2Space);
        let method = Box::new(UsearchMethod::new(MethodContext {
            space: space.clone(),
            store: store(),
        }));
        let index = method.build(&Params::new()).unwrap();
        let q = [10.0, 5.0, 1.0];
        let mut query = KnnQuery::new(space.as_ref(), &q, 3);
        index.search(&mut query).unwrap();
        let neighbors = query.into_neighbors();
        assert_eq!(neighbors[0].id, 1010);
        assert_eq!(neighbors.len(), 3);
    }
}
