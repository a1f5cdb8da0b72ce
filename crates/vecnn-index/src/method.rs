//! Index capability traits and the method factory.
//!
//! Construction is split by lifecycle state. A [`Method`] is an unbuilt
//! instance bound to a space and a frozen vector store; building or restoring
//! it consumes the instance and yields a ready [`Index`]. A ready index can be
//! searched but never rebuilt: rebuilding means creating a fresh `Method`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use vecnn_space::Space;
use vecnn_types::{Params, Result, VecnnError, VectorStore};

use crate::brute_force::BruteForceMethod;
use crate::hnsw::HnswMethod;
use crate::query::KnnQuery;

/// An unbuilt index instance.
pub trait Method: Send {
    /// Registered method name.
    fn name(&self) -> &'static str;

    /// Build the index structure from the store snapshot.
    fn build(self: Box<Self>, params: &Params) -> Result<Box<dyn Index>>;

    /// Load a previously persisted structure, bypassing `build`.
    fn restore(self: Box<Self>, path: &Path) -> Result<Box<dyn Index>>;
}

/// A ready index.
///
/// `search` takes `&self` and must keep all scratch state inside the call, so
/// any number of searches may run in parallel. `set_query_params` takes
/// `&mut self`; callers serialize it against searches.
pub trait Index: Send + Sync {
    fn method_name(&self) -> &'static str;

    /// Number of indexed points.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the index structure to `path`.
    fn persist(&self, path: &Path) -> Result<()>;

    /// Replace the query-time configuration.
    fn set_query_params(&mut self, params: &Params) -> Result<()>;

    /// Active query-time configuration.
    fn query_params(&self) -> Params;

    /// Fill `query`'s result queue with the closest points found.
    fn search(&self, query: &mut KnnQuery<'_>) -> Result<()>;
}

/// What every method is constructed from.
#[derive(Clone)]
pub struct MethodContext {
    pub space: Arc<dyn Space>,
    pub store: Arc<VectorStore>,
}

/// Constructor for an unbuilt method instance.
pub type MethodCtor = fn(MethodContext) -> Box<dyn Method>;

/// Registry mapping method names to constructors.
#[derive(Clone)]
pub struct MethodRegistry {
    ctors: BTreeMap<&'static str, MethodCtor>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self {
            ctors: BTreeMap::new(),
        }
    }

    /// Registry with every built-in method.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("brute_force", |ctx| -> Box<dyn Method> {
            Box::new(BruteForceMethod::new(ctx))
        });
        registry.register("seq_search", |ctx| -> Box<dyn Method> {
            Box::new(BruteForceMethod::new(ctx))
        });
        registry.register("hnsw", |ctx| -> Box<dyn Method> {
            Box::new(HnswMethod::new(ctx))
        });
        #[cfg(feature = "usearch")]
        registry.register("usearch_hnsw", |ctx| -> Box<dyn Method> {
            Box::new(crate::usearch_hnsw::UsearchMethod::new(ctx))
        });
        registry
    }

    pub fn register(&mut self, name: &'static str, ctor: MethodCtor) {
        self.ctors.insert(name, ctor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.ctors.keys().copied().collect()
    }

    /// Create a fresh, unbuilt instance of `name`.
    pub fn create(
        &self,
        name: &str,
        space: Arc<dyn Space>,
        store: Arc<VectorStore>,
    ) -> Result<Box<dyn Method>> {
        let ctor = self
            .ctors
            .get(name)
            .ok_or_else(|| VecnnError::UnknownMethod(name.to_string()))?;
        debug!(method = name, points = store.len(), "Creating method instance");
        Ok(ctor(MethodContext { space, store }))
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecnn_space::L2Space;

    #[test]
    fn test_unknown_method() {
        let registry = MethodRegistry::with_defaults();
        let result = registry.create(
            "sw-graph",
            Arc::new(L2Space),
            Arc::new(VectorStore::new()),
        );
        assert!(matches!(result, Err(VecnnError::UnknownMethod(_))));
    }

    #[test]
    fn test_default_methods() {
        let registry = MethodRegistry::with_defaults();
        assert!(registry.contains("brute_force"));
        assert!(registry.contains("seq_search"));
        assert!(registry.contains("hnsw"));
        let method = registry
            .create("hnsw", Arc::new(L2Space), Arc::new(VectorStore::new()))
            .unwrap();
        assert_eq!(method.name(), "hnsw");
    }
}
