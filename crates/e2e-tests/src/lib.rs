//! End-to-end test infrastructure for vecnn.
//!
//! Provides a shared TestHarness and helper functions for E2E tests
//! covering the full create -> add -> build -> query pipeline.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use vecnn_service::{DataType, DistType, IndexToken, KnnService, PointId};

/// Methods every end-to-end property is checked against.
pub const METHODS: &[&str] = &["brute_force", "seq_search", "hnsw"];

/// Shared test harness for E2E tests.
///
/// Owns a service and a temp directory for saved indexes.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Service under test
    pub service: KnnService,
    /// Directory for index files
    pub index_dir: PathBuf,
}

impl TestHarness {
    /// Create a new test harness with a fresh service and temp directory.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let index_dir = temp_dir.path().join("indexes");
        std::fs::create_dir_all(&index_dir).expect("Failed to create index dir");

        Self {
            _temp_dir: temp_dir,
            service: KnnService::new(),
            index_dir,
        }
    }

    /// Path for an index file named `name` inside the harness directory.
    pub fn index_path(&self, name: &str) -> PathBuf {
        self.index_dir.join(name)
    }

    /// Create an empty float-vector index.
    pub fn create(&self, space: &str, space_params: &[&str], method: &str) -> IndexToken {
        self.service
            .create_index(
                space,
                space_params,
                method,
                DataType::Vector,
                DistType::Float,
            )
            .expect("Failed to create index")
    }

    /// Create an index, add `corpus` with ids `0..n`, and build it.
    pub fn build(
        &self,
        space: &str,
        method: &str,
        corpus: &[Vec<f32>],
        build_params: &[&str],
    ) -> IndexToken {
        let token = self.create(space, &[], method);
        self.service
            .add_points_rows(token, &sequential_ids(corpus.len()), corpus)
            .expect("Failed to add points");
        self.service
            .build_index(token, build_params)
            .expect("Failed to build index");
        token
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Ids `0..n`.
pub fn sequential_ids(n: usize) -> Vec<PointId> {
    (0..n as PointId).collect()
}

/// `count` vectors of `dim` components drawn uniformly from `[0, 1)`.
pub fn random_vectors(count: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dim).map(|_| rng.random::<f32>()).collect())
        .collect()
}

/// `count` vectors of `dim` strictly positive components, for divergence
/// spaces.
pub fn random_positive_vectors(count: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dim).map(|_| rng.random_range(0.05f32..1.0)).collect())
        .collect()
}

/// Flatten rows into one row-major buffer.
pub fn flatten(rows: &[Vec<f32>]) -> Vec<f32> {
    rows.iter().flatten().copied().collect()
}

/// Fraction of `truth` ids present in `approx`, averaged over queries.
pub fn recall(approx: &[Vec<PointId>], truth: &[Vec<PointId>]) -> f64 {
    let mut hits = 0usize;
    let mut total = 0usize;
    for (a, t) in approx.iter().zip(truth) {
        hits += a.iter().filter(|id| t.contains(id)).count();
        total += t.len();
    }
    if total == 0 {
        1.0
    } else {
        hits as f64 / total as f64
    }
}
