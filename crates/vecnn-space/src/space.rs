//! Space trait and the name-based factory.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;
use vecnn_types::{Params, Result, VecnnError};

use crate::metrics::{
    lp_space, no_params, AngularSpace, CosineSpace, KlDivGenSpace, L1Space, L2Space, LInfSpace,
    NegDotProductSpace,
};

/// A configured distance function over vectors.
///
/// Implementations are stateless beyond their configuration and must be safe
/// to call from any number of threads. Asymmetric spaces are always evaluated
/// as `distance(data_point, query)`.
pub trait Space: Send + Sync + fmt::Debug {
    /// Registered family name.
    fn name(&self) -> &'static str;

    /// Canonical description including parameters, used to check that a
    /// persisted index was built for the same space.
    fn descriptor(&self) -> String {
        self.name().to_string()
    }

    /// Distance between a data point `a` and a query `b`.
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;

    /// Whether the family satisfies the metric axioms.
    fn is_metric(&self) -> bool;
}

/// Constructor for a space family from its parameter list.
pub type SpaceCtor = fn(&Params) -> Result<Arc<dyn Space>>;

/// Registry mapping space names to constructors.
#[derive(Clone)]
pub struct SpaceRegistry {
    ctors: BTreeMap<&'static str, SpaceCtor>,
}

impl SpaceRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            ctors: BTreeMap::new(),
        }
    }

    /// Registry with every built-in family.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("l2", no_params::<L2Space>);
        registry.register("l1", no_params::<L1Space>);
        registry.register("linf", no_params::<LInfSpace>);
        registry.register("lp", lp_space);
        registry.register("cosinesimil", no_params::<CosineSpace>);
        registry.register("angulardist", no_params::<AngularSpace>);
        registry.register("negdotprod", no_params::<NegDotProductSpace>);
        registry.register("kldivgenfast", no_params::<KlDivGenSpace>);
        registry
    }

    /// Register a family; replaces an existing entry with the same name.
    pub fn register(&mut self, name: &'static str, ctor: SpaceCtor) {
        self.ctors.insert(name, ctor);
    }

    /// Construct a space by name.
    pub fn create(&self, name: &str, params: &Params) -> Result<Arc<dyn Space>> {
        let ctor = self
            .ctors
            .get(name)
            .ok_or_else(|| VecnnError::UnknownSpace(name.to_string()))?;
        let space = ctor(params)?;
        debug!(space = %space.descriptor(), "Created space");
        Ok(space)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        self.ctors.keys().copied().collect()
    }
}

impl Default for SpaceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for SpaceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceRegistry")
            .field("spaces", &self.names())
            .finish()
    }
}

/// Construct a built-in space from a name and raw `key=value` strings.
pub fn create_space<S: AsRef<str>>(name: &str, params: &[S]) -> Result<Arc<dyn Space>> {
    SpaceRegistry::with_defaults().create(name, &Params::parse(params)?)
}
