//! Hierarchical navigable small world graph.
//!
//! Nodes are store positions. Each node is assigned a top layer drawn from an
//! exponential distribution (seeded, so builds are reproducible) and keeps up
//! to `M` links per upper layer and `2 * M` links on layer 0. Neighbor lists
//! are pruned with the diversity heuristic, then topped up with the closest
//! pruned candidates.
//!
//! All distances go through the configured [`Space`] as
//! `distance(data_point, query)`, so non-metric spaces work unchanged.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vecnn_space::Space;
use vecnn_types::{Params, Result, VecnnError, VectorStore};

use crate::format::{read_index, write_index, IndexHeader};
use crate::method::{Index, Method, MethodContext};
use crate::query::KnnQuery;

const METHOD_NAME: &str = "hnsw";

pub const DEFAULT_M: usize = 16;
pub const DEFAULT_EF_CONSTRUCTION: usize = 200;
pub const DEFAULT_EF_SEARCH: usize = 100;
pub const DEFAULT_SEED: u64 = 0x5eed;

/// Build-time configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswParams {
    /// Links per node on upper layers (layer 0 keeps twice as many).
    pub m: usize,
    /// Candidate list breadth while inserting.
    pub ef_construction: usize,
    /// Initial query-time candidate list breadth.
    pub ef_search: usize,
    /// Seed for level assignment.
    pub seed: u64,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: DEFAULT_M,
            ef_construction: DEFAULT_EF_CONSTRUCTION,
            ef_search: DEFAULT_EF_SEARCH,
            seed: DEFAULT_SEED,
        }
    }
}

/// Upper bound on `M`.
pub const MAX_M: usize = 1024;
/// Upper bound on `efConstruction` and `efSearch`.
pub const MAX_EF: usize = 1 << 20;

fn check_ef_search(ef_search: usize) -> Result<()> {
    if !(1..=MAX_EF).contains(&ef_search) {
        return Err(VecnnError::Parameter(format!(
            "efSearch must be in [1, {}], got {}",
            MAX_EF, ef_search
        )));
    }
    Ok(())
}

impl HnswParams {
    /// Parse `M`, `efConstruction`, `efSearch` and `seed`; anything else is
    /// rejected.
    pub fn from_params(params: &Params) -> Result<Self> {
        let defaults = Self::default();
        let mut reader = params.reader();
        let parsed = Self {
            m: reader.get("M", defaults.m)?,
            ef_construction: reader.get("efConstruction", defaults.ef_construction)?,
            ef_search: reader.get("efSearch", defaults.ef_search)?,
            seed: reader.get("seed", defaults.seed)?,
        };
        reader.finish()?;
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> Result<()> {
        if !(2..=MAX_M).contains(&self.m) {
            return Err(VecnnError::Parameter(format!(
                "M must be in [2, {}], got {}",
                MAX_M, self.m
            )));
        }
        if !(1..=MAX_EF).contains(&self.ef_construction) {
            return Err(VecnnError::Parameter(format!(
                "efConstruction must be in [1, {}], got {}",
                MAX_EF, self.ef_construction
            )));
        }
        check_ef_search(self.ef_search)
    }

    fn max_links(&self, layer: usize) -> usize {
        if layer == 0 {
            self.m.saturating_mul(2)
        } else {
            self.m
        }
    }

    /// Level multiplier `1 / ln(M)`.
    fn level_multiplier(&self) -> f64 {
        1.0 / (self.m as f64).ln()
    }
}

/// A node reached during traversal, ordered by distance then node.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f32,
    node: u32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.node.cmp(&other.node))
    }
}

/// One bit per node, allocated per traversal.
struct VisitedSet {
    words: Vec<u64>,
}

impl VisitedSet {
    fn new(nodes: usize) -> Self {
        Self {
            words: vec![0; nodes.div_ceil(64)],
        }
    }

    /// Mark `node`; returns `false` if it was already marked.
    fn insert(&mut self, node: u32) -> bool {
        let idx = node as usize;
        let word = &mut self.words[idx >> 6];
        let mask = 1u64 << (idx & 63);
        if *word & mask != 0 {
            return false;
        }
        *word |= mask;
        true
    }
}

/// The graph itself; this is what gets persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Graph {
    /// `links[node][layer]`; a node's top layer is `links[node].len() - 1`.
    links: Vec<Vec<Vec<u32>>>,
    entry_point: Option<u32>,
    max_layer: usize,
}

impl Graph {
    fn node_count(&self) -> usize {
        self.links.len()
    }

    fn neighbors(&self, node: u32, layer: usize) -> &[u32] {
        self.links[node as usize]
            .get(layer)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Best-first search of one layer.
    ///
    /// Returns up to `ef` nodes, nearest first.
    fn search_layer<F>(
        &self,
        distance: &mut F,
        entry_points: &[Candidate],
        ef: usize,
        layer: usize,
    ) -> Vec<Candidate>
    where
        F: FnMut(u32) -> f32,
    {
        let mut visited = VisitedSet::new(self.node_count());
        let mut candidates: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
        let mut results: BinaryHeap<Candidate> = BinaryHeap::new();

        for &ep in entry_points {
            if visited.insert(ep.node) {
                candidates.push(Reverse(ep));
                results.push(ep);
            }
        }
        while results.len() > ef {
            results.pop();
        }

        while let Some(Reverse(current)) = candidates.pop() {
            let farthest = results.peek().map_or(f32::INFINITY, |c| c.distance);
            if current.distance > farthest && results.len() >= ef {
                break;
            }
            for &next in self.neighbors(current.node, layer) {
                if !visited.insert(next) {
                    continue;
                }
                let d = distance(next);
                let farthest = results.peek().map_or(f32::INFINITY, |c| c.distance);
                if results.len() < ef || d < farthest {
                    let candidate = Candidate {
                        distance: d,
                        node: next,
                    };
                    candidates.push(Reverse(candidate));
                    results.push(candidate);
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        results.into_sorted_vec()
    }

    /// Check structural consistency of a graph read from disk.
    fn validate(&self, expected_nodes: usize) -> Result<()> {
        if self.links.len() != expected_nodes {
            return Err(VecnnError::Format(format!(
                "graph has {} nodes, expected {}",
                self.links.len(),
                expected_nodes
            )));
        }
        match self.entry_point {
            Some(ep) if (ep as usize) < expected_nodes => {
                if self.links[ep as usize].len() != self.max_layer + 1 {
                    return Err(VecnnError::Format(
                        "entry point does not reach the top layer".to_string(),
                    ));
                }
            }
            Some(ep) => {
                return Err(VecnnError::Format(format!(
                    "entry point {} out of range",
                    ep
                )));
            }
            None if expected_nodes > 0 => {
                return Err(VecnnError::Format("graph has no entry point".to_string()));
            }
            None => {}
        }
        for (node, layers) in self.links.iter().enumerate() {
            if layers.is_empty() || layers.len() > self.max_layer + 1 {
                return Err(VecnnError::Format(format!(
                    "node {} has invalid layer count {}",
                    node,
                    layers.len()
                )));
            }
            for (layer, links) in layers.iter().enumerate() {
                if let Some(&bad) = links.iter().find(|&&n| {
                    (n as usize) >= expected_nodes || self.links[n as usize].len() <= layer
                }) {
                    return Err(VecnnError::Format(format!(
                        "node {} links to invalid node {} on layer {}",
                        node, bad, layer
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Incremental graph construction over a frozen store.
struct GraphBuilder<'a> {
    space: &'a dyn Space,
    store: &'a VectorStore,
    params: HnswParams,
    graph: Graph,
    rng: StdRng,
}

impl<'a> GraphBuilder<'a> {
    fn new(space: &'a dyn Space, store: &'a VectorStore, params: HnswParams) -> Self {
        Self {
            space,
            store,
            params,
            graph: Graph {
                links: Vec::with_capacity(store.len()),
                entry_point: None,
                max_layer: 0,
            },
            rng: StdRng::seed_from_u64(params.seed),
        }
    }

    fn distance(&self, data: u32, query: u32) -> f32 {
        self.space.distance(
            self.store.vector(data as usize),
            self.store.vector(query as usize),
        )
    }

    fn random_level(&mut self) -> usize {
        let r: f64 = self.rng.random::<f64>().max(1e-15);
        (-r.ln() * self.params.level_multiplier()).floor() as usize
    }

    fn build(mut self) -> Graph {
        for position in 0..self.store.len() {
            self.insert(position as u32);
        }
        self.graph
    }

    fn insert(&mut self, node: u32) {
        let level = self.random_level();
        self.graph.links.push(vec![Vec::new(); level + 1]);

        let Some(entry) = self.graph.entry_point else {
            self.graph.entry_point = Some(node);
            self.graph.max_layer = level;
            return;
        };

        let space = self.space;
        let store = self.store;
        let query = store.vector(node as usize);
        let mut distance = |n: u32| space.distance(store.vector(n as usize), query);

        let mut current = vec![Candidate {
            distance: distance(entry),
            node: entry,
        }];
        let max_layer = self.graph.max_layer;
        for layer in ((level + 1)..=max_layer).rev() {
            current = self.graph.search_layer(&mut distance, &current, 1, layer);
        }

        for layer in (0..=level.min(max_layer)).rev() {
            let found = self.graph.search_layer(
                &mut distance,
                &current,
                self.params.ef_construction,
                layer,
            );
            let selected = self.select_neighbors(&found, self.params.m);
            self.graph.links[node as usize][layer] = selected.iter().map(|c| c.node).collect();
            for neighbor in &selected {
                self.connect(neighbor.node, node, layer);
            }
            current = found;
        }

        if level > self.graph.max_layer {
            self.graph.max_layer = level;
            self.graph.entry_point = Some(node);
        }
    }

    /// Diversity heuristic over `candidates` (nearest first).
    ///
    /// A candidate is kept if it is closer to the base point than to every
    /// neighbor kept so far; remaining slots are filled from the discarded
    /// candidates in distance order.
    fn select_neighbors(&self, candidates: &[Candidate], m: usize) -> Vec<Candidate> {
        let mut selected: Vec<Candidate> = Vec::with_capacity(m.min(candidates.len()));
        let mut pruned: Vec<Candidate> = Vec::new();
        for &candidate in candidates {
            if selected.len() >= m {
                break;
            }
            let diverse = selected
                .iter()
                .all(|s| self.distance(candidate.node, s.node) >= candidate.distance);
            if diverse {
                selected.push(candidate);
            } else {
                pruned.push(candidate);
            }
        }
        for candidate in pruned {
            if selected.len() >= m {
                break;
            }
            selected.push(candidate);
        }
        selected
    }

    /// Add a back link `target -> new_node`, pruning `target` if it overflows.
    fn connect(&mut self, target: u32, new_node: u32, layer: usize) {
        let max_links = self.params.max_links(layer);
        let links = &mut self.graph.links[target as usize][layer];
        if links.contains(&new_node) {
            return;
        }
        links.push(new_node);
        if links.len() <= max_links {
            return;
        }

        let mut candidates: Vec<Candidate> = links
            .iter()
            .map(|&n| Candidate {
                distance: self.space.distance(
                    self.store.vector(n as usize),
                    self.store.vector(target as usize),
                ),
                node: n,
            })
            .collect();
        candidates.sort();
        let kept = self.select_neighbors(&candidates, max_links);
        self.graph.links[target as usize][layer] = kept.iter().map(|c| c.node).collect();
    }
}

/// Unbuilt HNSW instance.
pub struct HnswMethod {
    space: Arc<dyn Space>,
    store: Arc<VectorStore>,
}

impl HnswMethod {
    pub fn new(ctx: MethodContext) -> Self {
        Self {
            space: ctx.space,
            store: ctx.store,
        }
    }
}

impl Method for HnswMethod {
    fn name(&self) -> &'static str {
        METHOD_NAME
    }

    fn build(self: Box<Self>, params: &Params) -> Result<Box<dyn Index>> {
        let params = HnswParams::from_params(params)?;
        if self.store.is_empty() {
            return Err(VecnnError::Build(
                "hnsw cannot be built over an empty store".to_string(),
            ));
        }

        let start = Instant::now();
        let graph = GraphBuilder::new(self.space.as_ref(), &self.store, params).build();
        info!(
            points = self.store.len(),
            layers = graph.max_layer + 1,
            m = params.m,
            ef_construction = params.ef_construction,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built HNSW index"
        );

        Ok(Box::new(HnswIndex {
            space: self.space,
            store: self.store,
            params,
            ef_search: params.ef_search,
            graph,
        }))
    }

    fn restore(self: Box<Self>, path: &Path) -> Result<Box<dyn Index>> {
        let expected = IndexHeader::describe(METHOD_NAME, self.space.as_ref(), &self.store);
        let body: HnswBody = read_index(path, &expected)?;
        body.params.validate().map_err(|e| VecnnError::Format(e.to_string()))?;
        body.graph.validate(self.store.len())?;
        debug!(
            points = body.graph.node_count(),
            layers = body.graph.max_layer + 1,
            "Restored HNSW graph"
        );

        Ok(Box::new(HnswIndex {
            space: self.space,
            store: self.store,
            params: body.params,
            ef_search: body.params.ef_search,
            graph: body.graph,
        }))
    }
}

#[derive(Serialize, Deserialize)]
struct HnswBody {
    params: HnswParams,
    graph: Graph,
}

/// Ready HNSW index.
pub struct HnswIndex {
    space: Arc<dyn Space>,
    store: Arc<VectorStore>,
    params: HnswParams,
    ef_search: usize,
    graph: Graph,
}

impl HnswIndex {
    pub fn params(&self) -> HnswParams {
        self.params
    }

    pub fn ef_search(&self) -> usize {
        self.ef_search
    }

    /// Number of layers in the graph.
    pub fn layer_count(&self) -> usize {
        self.graph.max_layer + 1
    }
}

impl Index for HnswIndex {
    fn method_name(&self) -> &'static str {
        METHOD_NAME
    }

    fn len(&self) -> usize {
        self.graph.node_count()
    }

    fn persist(&self, path: &Path) -> Result<()> {
        let header = IndexHeader::describe(METHOD_NAME, self.space.as_ref(), &self.store);
        let body = HnswBody {
            params: self.params,
            graph: self.graph.clone(),
        };
        write_index(path, &header, &body)
    }

    /// Accepts `efSearch`; when absent the build-time value is restored.
    fn set_query_params(&mut self, params: &Params) -> Result<()> {
        let mut reader = params.reader();
        let ef_search = reader.get("efSearch", self.params.ef_search)?;
        reader.finish()?;
        check_ef_search(ef_search)?;
        self.ef_search = ef_search;
        Ok(())
    }

    fn query_params(&self) -> Params {
        let mut params = Params::new();
        // Single fresh key, cannot collide.
        let _ = params.insert("efSearch", self.ef_search.to_string());
        params
    }

    fn search(&self, query: &mut KnnQuery<'_>) -> Result<()> {
        let Some(entry) = self.graph.entry_point else {
            return Ok(());
        };
        let ef = self.ef_search.max(query.k());
        let store = self.store.as_ref();

        let found = {
            let mut distance = |n: u32| query.distance_to(store.vector(n as usize));
            let mut current = vec![Candidate {
                distance: distance(entry),
                node: entry,
            }];
            for layer in (1..=self.graph.max_layer).rev() {
                current = self.graph.search_layer(&mut distance, &current, 1, layer);
            }
            self.graph.search_layer(&mut distance, &current, ef, 0)
        };

        for candidate in found {
            let position = candidate.node as usize;
            query.add(store.id(position), position, candidate.distance);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vecnn_space::{CosineSpace, L2Space};

    fn random_store(points: usize, dim: usize, seed: u64) -> VectorStore {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut store = VectorStore::with_capacity(points, dim);
        for i in 0..points {
            let v: Vec<f32> = (0..dim).map(|_| rng.random::<f32>()).collect();
            store.append(i as i32, &v).unwrap();
        }
        store
    }

    fn build(space: Arc<dyn Space>, store: Arc<VectorStore>, params: &[&str]) -> Box<dyn Index> {
        let method = Box::new(HnswMethod::new(MethodContext { space, store }));
        method.build(&Params::parse(params).unwrap()).unwrap()
    }

    fn ids(index: &dyn Index, space: &dyn Space, q: &[f32], k: usize) -> Vec<i32> {
        let mut query = KnnQuery::new(space, q, k);
        index.search(&mut query).unwrap();
        query.into_neighbors().iter().map(|n| n.id).collect()
    }

    fn exact(store: &VectorStore, space: &dyn Space, q: &[f32], k: usize) -> Vec<i32> {
        let mut query = KnnQuery::new(space, q, k);
        for point in store.iter() {
            query.check_and_add(point);
        }
        query.into_neighbors().iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_params_defaults_and_overrides() {
        let params = HnswParams::from_params(&Params::new()).unwrap();
        assert_eq!(params, HnswParams::default());

        let params =
            HnswParams::from_params(&Params::parse(&["M=8", "efConstruction=50"]).unwrap())
                .unwrap();
        assert_eq!(params.m, 8);
        assert_eq!(params.ef_construction, 50);
        assert_eq!(params.ef_search, DEFAULT_EF_SEARCH);
    }

    #[test]
    fn test_params_rejected() {
        let unknown = Params::parse(&["post=2"]).unwrap();
        assert!(matches!(
            HnswParams::from_params(&unknown),
            Err(VecnnError::Config(_))
        ));
        let small = Params::parse(&["M=1"]).unwrap();
        assert!(matches!(
            HnswParams::from_params(&small),
            Err(VecnnError::Parameter(_))
        ));
        let garbage = Params::parse(&["M=lots"]).unwrap();
        assert!(matches!(
            HnswParams::from_params(&garbage),
            Err(VecnnError::Parameter(_))
        ));
        for huge in [
            "M=2305843009213693951",
            "M=1025",
            "efConstruction=18446744073709551615",
            "efSearch=1048577",
        ] {
            let params = Params::parse(&[huge]).unwrap();
            assert!(
                matches!(HnswParams::from_params(&params), Err(VecnnError::Parameter(_))),
                "{}",
                huge
            );
        }
        let largest = Params::parse(&["M=1024", "efConstruction=1048576"]).unwrap();
        assert!(HnswParams::from_params(&largest).is_ok());
    }

    #[test]
    fn test_ties_resolved_by_store_position() {
        let mut store = VectorStore::new();
        for (id, v) in [(5, [0.0f32, 0.0]), (7, [1.0, 0.0]), (3, [0.0, 1.0]), (9, [-1.0, 0.0])] {
            store.append(id, &v).unwrap();
        }
        let store = Arc::new(store);
        let space: Arc<dyn Space> = Arc::new(L2Space);
        let index = build(space.clone(), store, &[]);
        assert_eq!(ids(index.as_ref(), space.as_ref(), &[0.0, 0.0], 4), vec![5, 7, 3, 9]);
    }

    #[test]
    fn test_huge_m_fails_build_without_panicking() {
        let store = Arc::new(random_store(4, 3, 12));
        let method = Box::new(HnswMethod::new(MethodContext {
            space: Arc::new(L2Space),
            store,
        }));
        let result = method.build(&Params::parse(&["M=2305843009213693951"]).unwrap());
        assert!(matches!(result, Err(VecnnError::Parameter(_))));
    }

    #[test]
    fn test_empty_store_is_build_error() {
        let method = Box::new(HnswMethod::new(MethodContext {
            space: Arc::new(L2Space),
            store: Arc::new(VectorStore::new()),
        }));
        let err = method.build(&Params::new()).err().unwrap();
        assert!(matches!(err, VecnnError::Build(_)));
    }

    #[test]
    fn test_single_point() {
        let mut store = VectorStore::new();
        store.append(42, &[1.0, 1.0]).unwrap();
        let space: Arc<dyn Space> = Arc::new(L2Space);
        let index = build(space.clone(), Arc::new(store), &[]);
        assert_eq!(ids(index.as_ref(), space.as_ref(), &[0.0, 0.0], 5), vec![42]);
    }

    #[test]
    fn test_finds_exact_point() {
        let store = Arc::new(random_store(500, 8, 7));
        let space: Arc<dyn Space> = Arc::new(L2Space);
        let index = build(space.clone(), store.clone(), &["M=8", "efConstruction=100"]);
        for position in [0usize, 123, 499] {
            let q = store.vector(position).to_vec();
            let found = ids(index.as_ref(), space.as_ref(), &q, 1);
            assert_eq!(found, vec![position as i32]);
        }
    }

    #[test]
    fn test_recall_against_exact_search() {
        let store = Arc::new(random_store(1000, 12, 11));
        let space: Arc<dyn Space> = Arc::new(L2Space);
        let index = build(space.clone(), store.clone(), &[]);

        let queries = random_store(50, 12, 99);
        let k = 10;
        let mut hits = 0;
        for q in queries.iter() {
            let approx = ids(index.as_ref(), space.as_ref(), q.vector, k);
            let truth = exact(&store, space.as_ref(), q.vector, k);
            assert_eq!(approx.len(), k);
            hits += approx.iter().filter(|id| truth.contains(id)).count();
        }
        let recall = hits as f64 / (queries.len() * k) as f64;
        assert!(recall >= 0.9, "recall {} too low", recall);
    }

    #[test]
    fn test_deterministic_build() {
        let store = Arc::new(random_store(300, 6, 3));
        let space: Arc<dyn Space> = Arc::new(CosineSpace);
        let a = build(space.clone(), store.clone(), &["seed=17"]);
        let b = build(space.clone(), store.clone(), &["seed=17"]);
        let q = [0.3, 0.1, 0.9, 0.4, 0.2, 0.5];
        assert_eq!(
            ids(a.as_ref(), space.as_ref(), &q, 10),
            ids(b.as_ref(), space.as_ref(), &q, 10)
        );
    }

    #[test]
    fn test_query_params() {
        let store = Arc::new(random_store(50, 4, 5));
        let mut index = build(Arc::new(L2Space), store, &["efSearch=40"]);
        assert_eq!(index.query_params().get("efSearch"), Some("40"));

        index
            .set_query_params(&Params::parse(&["efSearch=7"]).unwrap())
            .unwrap();
        assert_eq!(index.query_params().get("efSearch"), Some("7"));

        index.set_query_params(&Params::new()).unwrap();
        assert_eq!(index.query_params().get("efSearch"), Some("40"));

        let err = index
            .set_query_params(&Params::parse(&["ef=3"]).unwrap())
            .unwrap_err();
        assert!(matches!(err, VecnnError::Config(_)));
    }

    #[test]
    fn test_persist_and_restore() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hnsw.idx");
        let store = Arc::new(random_store(200, 5, 21));
        let space: Arc<dyn Space> = Arc::new(L2Space);
        let index = build(space.clone(), store.clone(), &["M=6"]);
        index.persist(&path).unwrap();

        let restored = Box::new(HnswMethod::new(MethodContext {
            space: space.clone(),
            store: store.clone(),
        }))
        .restore(&path)
        .unwrap();

        let queries = random_store(20, 5, 8);
        for q in queries.iter() {
            assert_eq!(
                ids(index.as_ref(), space.as_ref(), q.vector, 5),
                ids(restored.as_ref(), space.as_ref(), q.vector, 5)
            );
        }
    }

    #[test]
    fn test_graph_validation_rejects_dangling_links() {
        let graph = Graph {
            links: vec![vec![vec![1]], vec![vec![5]]],
            entry_point: Some(0),
            max_layer: 0,
        };
        assert!(matches!(graph.validate(2), Err(VecnnError::Format(_))));
        assert!(matches!(graph.validate(3), Err(VecnnError::Format(_))));
    }
}
