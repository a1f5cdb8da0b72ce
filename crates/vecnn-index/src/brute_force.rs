//! Exhaustive scan over the store.
//!
//! Registered as both `brute_force` and `seq_search`. There is no structure to
//! build, so persistence writes only the header; restore still validates it
//! against the live store.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use vecnn_space::Space;
use vecnn_types::{Params, Result, VectorStore};

use crate::format::{read_index, write_index, IndexHeader};
use crate::method::{Index, Method, MethodContext};
use crate::query::KnnQuery;

const METHOD_NAME: &str = "brute_force";

/// Unbuilt exhaustive-scan method.
pub struct BruteForceMethod {
    space: Arc<dyn Space>,
    store: Arc<VectorStore>,
}

impl BruteForceMethod {
    pub fn new(ctx: MethodContext) -> Self {
        Self {
            space: ctx.space,
            store: ctx.store,
        }
    }

    fn into_index(self) -> BruteForceIndex {
        BruteForceIndex {
            space: self.space,
            store: self.store,
        }
    }
}

impl Method for BruteForceMethod {
    fn name(&self) -> &'static str {
        METHOD_NAME
    }

    fn build(self: Box<Self>, params: &Params) -> Result<Box<dyn Index>> {
        params.reader().finish()?;
        debug!(points = self.store.len(), "Brute force index ready");
        Ok(Box::new(self.into_index()))
    }

    fn restore(self: Box<Self>, path: &Path) -> Result<Box<dyn Index>> {
        let expected = IndexHeader::describe(METHOD_NAME, self.space.as_ref(), &self.store);
        read_index::<()>(path, &expected)?;
        Ok(Box::new(self.into_index()))
    }
}

/// Ready exhaustive-scan index.
pub struct BruteForceIndex {
    space: Arc<dyn Space>,
    store: Arc<VectorStore>,
}

impl Index for BruteForceIndex {
    fn method_name(&self) -> &'static str {
        METHOD_NAME
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn persist(&self, path: &Path) -> Result<()> {
        let header = IndexHeader::describe(METHOD_NAME, self.space.as_ref(), &self.store);
        write_index(path, &header, &())
    }

    fn set_query_params(&mut self, params: &Params) -> Result<()> {
        params.reader().finish()
    }

    fn query_params(&self) -> Params {
        Params::new()
    }

    fn search(&self, query: &mut KnnQuery<'_>) -> Result<()> {
        for point in self.store.iter() {
            query.check_and_add(point);
        }
        Ok(())
    }
}
