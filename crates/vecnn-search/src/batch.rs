//! Parallel batch queries.
//!
//! Query positions are pushed onto a closed work channel before any worker
//! starts; workers pull positions until the channel is drained and write each
//! answer into that position's slot. Output order therefore always matches
//! input order, whatever the worker count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::thread;
use std::time::Instant;

use crossbeam_channel::bounded;
use parking_lot::Mutex;
use tracing::{debug, warn};
use vecnn_index::Neighbor;
use vecnn_types::{PointId, Result, RowMajor, VecnnError};

use crate::engine::KnnSearchEngine;

/// Filler for rows that found fewer than `k` neighbors.
pub const PAD_ID: PointId = -1;

/// Largest padded matrix, in ids, a batch may ask for.
pub const MAX_MATRIX_IDS: usize = 1 << 28;

/// Fixed-width `rows × k` result matrix.
///
/// Row `i` answers query `i`. Rows with fewer than `k` neighbors are padded
/// with [`PAD_ID`]; `lens` records how many entries of each row are real.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnnMatrix {
    rows: usize,
    k: usize,
    ids: Vec<PointId>,
    lens: Vec<usize>,
}

impl KnnMatrix {
    /// Number of ids in a padded `rows × k` matrix, if it may be allocated.
    pub fn checked_len(rows: usize, k: usize) -> Result<usize> {
        rows.checked_mul(k)
            .filter(|&len| len <= MAX_MATRIX_IDS)
            .ok_or_else(|| {
                VecnnError::Parameter(format!(
                    "result matrix of {} rows x k={} exceeds {} ids",
                    rows, k, MAX_MATRIX_IDS
                ))
            })
    }

    pub fn from_results(results: &[Vec<Neighbor>], k: usize) -> Result<Self> {
        let mut ids = vec![PAD_ID; Self::checked_len(results.len(), k)?];
        let mut lens = Vec::with_capacity(results.len());
        for (row, neighbors) in results.iter().enumerate() {
            let len = neighbors.len().min(k);
            for (slot, neighbor) in ids[row * k..row * k + len].iter_mut().zip(neighbors) {
                *slot = neighbor.id;
            }
            lens.push(len);
        }
        Ok(Self {
            rows: results.len(),
            k,
            ids,
            lens,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Real neighbors of query `i`, without padding.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows()`.
    pub fn row(&self, i: usize) -> &[PointId] {
        &self.ids[i * self.k..i * self.k + self.lens[i]]
    }

    /// Full padded row `i`.
    pub fn padded_row(&self, i: usize) -> &[PointId] {
        &self.ids[i * self.k..(i + 1) * self.k]
    }

    /// Row-major padded buffer.
    pub fn ids(&self) -> &[PointId] {
        &self.ids
    }

    pub fn lens(&self) -> &[usize] {
        &self.lens
    }

    pub fn iter(&self) -> impl Iterator<Item = &[PointId]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }
}

/// Runs a batch of queries over a fixed number of worker threads.
#[derive(Debug, Clone, Copy)]
pub struct BatchQueryScheduler {
    num_threads: usize,
}

impl BatchQueryScheduler {
    pub fn new(num_threads: usize) -> Result<Self> {
        if num_threads < 1 {
            return Err(VecnnError::Parameter(format!(
                "number of threads must be at least 1, got {}",
                num_threads
            )));
        }
        Ok(Self { num_threads })
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Answer every row of `queries`; result `i` belongs to row `i`.
    ///
    /// The first failing query aborts the batch and its error is returned
    /// once all workers have stopped.
    pub fn run(
        &self,
        engine: &KnnSearchEngine<'_>,
        queries: RowMajor<'_>,
        k: usize,
    ) -> Result<Vec<Vec<Neighbor>>> {
        if k < 1 {
            return Err(VecnnError::Parameter(format!(
                "k must be at least 1, got {}",
                k
            )));
        }
        let total = queries.rows();
        if total == 0 {
            return Ok(Vec::new());
        }
        engine.check_query(queries.row(0), k)?;

        let workers = self.num_threads.min(total);
        let start = Instant::now();

        let (sender, receiver) = bounded::<usize>(total);
        for position in 0..total {
            sender
                .send(position)
                .map_err(|_| VecnnError::State("batch work queue closed".to_string()))?;
        }
        drop(sender);

        let slots: Vec<OnceLock<Vec<Neighbor>>> = (0..total).map(|_| OnceLock::new()).collect();
        let failed = AtomicBool::new(false);
        let first_error: Mutex<Option<VecnnError>> = Mutex::new(None);

        thread::scope(|scope| {
            for _ in 0..workers {
                let receiver = receiver.clone();
                let slots = &slots;
                let failed = &failed;
                let first_error = &first_error;
                scope.spawn(move || {
                    while let Ok(position) = receiver.recv() {
                        if failed.load(Ordering::Relaxed) {
                            break;
                        }
                        match engine.search_with_distances(queries.row(position), k) {
                            Ok(neighbors) => {
                                let _ = slots[position].set(neighbors);
                            }
                            Err(e) => {
                                failed.store(true, Ordering::Relaxed);
                                let mut slot = first_error.lock();
                                if slot.is_none() {
                                    *slot = Some(e);
                                }
                                break;
                            }
                        }
                    }
                });
            }
        });

        if let Some(e) = first_error.into_inner() {
            warn!(queries = total, error = %e, "Batch query failed");
            return Err(e);
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(position, slot)| {
                slot.into_inner().ok_or_else(|| {
                    VecnnError::State(format!("query {} produced no result", position))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            queries = total,
            workers = workers,
            k = k,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch query complete"
        );
        Ok(results)
    }

    /// Like [`run`](Self::run), packed into a padded [`KnnMatrix`].
    pub fn run_matrix(
        &self,
        engine: &KnnSearchEngine<'_>,
        queries: RowMajor<'_>,
        k: usize,
    ) -> Result<KnnMatrix> {
        KnnMatrix::checked_len(queries.rows(), k)?;
        let results = self.run(engine, queries, k)?;
        KnnMatrix::from_results(&results, k)
    }
}
