//! Append-only storage for indexed vectors.
//!
//! Vectors are kept in one contiguous row-major buffer. The dimensionality is
//! fixed by the first appended vector; later appends and queries must match it.

use crate::error::{Result, VecnnError};

/// Caller-supplied point identifier.
pub type PointId = i32;

/// A stored vector together with its identifier and ordinal position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint<'a> {
    pub id: PointId,
    pub position: usize,
    pub vector: &'a [f32],
}

/// Append-only corpus of vectors.
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    ids: Vec<PointId>,
    data: Vec<f32>,
    dimension: Option<usize>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with room for `points` vectors of `dimension` components.
    pub fn with_capacity(points: usize, dimension: usize) -> Self {
        Self {
            ids: Vec::with_capacity(points),
            data: Vec::with_capacity(points * dimension),
            dimension: None,
        }
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Dimensionality, known once the first vector is appended.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Reserve room for `additional` more points of the current dimension.
    pub fn reserve(&mut self, additional: usize) {
        self.ids.reserve(additional);
        if let Some(dim) = self.dimension {
            self.data.reserve(additional * dim);
        }
    }

    /// Append a vector and return its position.
    pub fn append(&mut self, id: PointId, vector: &[f32]) -> Result<usize> {
        self.check_vector(vector)?;
        self.dimension = Some(vector.len());
        self.ids.push(id);
        self.data.extend_from_slice(vector);
        Ok(self.ids.len() - 1)
    }

    /// Check that `vector` can be stored in or queried against this store.
    pub fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.is_empty() {
            return Err(VecnnError::Parameter(
                "vector must have at least one component".to_string(),
            ));
        }
        match self.dimension {
            Some(expected) if expected != vector.len() => Err(VecnnError::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Vector at `position`, failing with `OutOfRange` outside `[0, len)`.
    pub fn get(&self, position: i64) -> Result<&[f32]> {
        if position < 0 || position as u64 >= self.len() as u64 {
            return Err(VecnnError::OutOfRange {
                position,
                len: self.len(),
            });
        }
        Ok(self.vector(position as usize))
    }

    /// Vector at a position known to be valid.
    ///
    /// # Panics
    /// Panics if `position >= len()`.
    pub fn vector(&self, position: usize) -> &[f32] {
        let dim = self.dimension.unwrap_or(0);
        &self.data[position * dim..(position + 1) * dim]
    }

    /// Identifier at a position known to be valid.
    ///
    /// # Panics
    /// Panics if `position >= len()`.
    pub fn id(&self, position: usize) -> PointId {
        self.ids[position]
    }

    pub fn point(&self, position: usize) -> DataPoint<'_> {
        DataPoint {
            id: self.ids[position],
            position,
            vector: self.vector(position),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = DataPoint<'_>> {
        (0..self.len()).map(move |position| self.point(position))
    }
}
