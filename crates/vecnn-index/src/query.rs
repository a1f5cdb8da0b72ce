//! Per-query search state.

use vecnn_space::Space;
use vecnn_types::{DataPoint, PointId};

use crate::queue::{KnnQueue, Neighbor};

/// A single kNN query: the query vector, the space it is evaluated in and
/// the bounded result queue the index fills.
///
/// Each query owns its queue, so concurrent searches never share mutable
/// state.
pub struct KnnQuery<'a> {
    space: &'a dyn Space,
    vector: &'a [f32],
    queue: KnnQueue,
    distance_computations: u64,
}

impl<'a> KnnQuery<'a> {
    pub fn new(space: &'a dyn Space, vector: &'a [f32], k: usize) -> Self {
        Self {
            space,
            vector,
            queue: KnnQueue::new(k),
            distance_computations: 0,
        }
    }

    pub fn k(&self) -> usize {
        self.queue.capacity()
    }

    pub fn vector(&self) -> &'a [f32] {
        self.vector
    }

    pub fn space(&self) -> &'a dyn Space {
        self.space
    }

    /// Distance from a data vector to the query.
    pub fn distance_to(&mut self, data: &[f32]) -> f32 {
        self.distance_computations += 1;
        self.space.distance(data, self.vector)
    }

    /// Compute the distance to `point` and offer it to the result queue.
    pub fn check_and_add(&mut self, point: DataPoint<'_>) -> f32 {
        let distance = self.distance_to(point.vector);
        self.queue.push(point.id, point.position, distance);
        distance
    }

    /// Offer a candidate whose distance was already computed.
    pub fn add(&mut self, id: PointId, position: usize, distance: f32) -> bool {
        self.queue.push(id, position, distance)
    }

    /// Current search radius: the farthest retained distance once `k`
    /// candidates are held, unbounded before that.
    pub fn radius(&self) -> f32 {
        if self.queue.is_full() {
            self.queue.top_distance().unwrap_or(f32::INFINITY)
        } else {
            f32::INFINITY
        }
    }

    pub fn result(&self) -> &KnnQueue {
        &self.queue
    }

    pub fn distance_computations(&self) -> u64 {
        self.distance_computations
    }

    /// Finish the query, returning neighbors nearest first.
    pub fn into_neighbors(self) -> Vec<Neighbor> {
        self.queue.into_ascending()
    }
}
