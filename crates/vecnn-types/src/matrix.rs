//! Row-major batches of vectors.
//!
//! Host glue hands batches over as one contiguous buffer plus a row width.
//! [`RowMajor`] validates that layout once so consumers can slice rows freely.

use crate::error::{Result, VecnnError};

/// Borrowed `rows × cols` matrix stored row-major in a flat slice.
#[derive(Debug, Clone, Copy)]
pub struct RowMajor<'a> {
    data: &'a [f32],
    rows: usize,
    cols: usize,
}

impl<'a> RowMajor<'a> {
    /// Wrap `data` as `rows × cols`; the buffer length must match exactly.
    pub fn new(data: &'a [f32], rows: usize, cols: usize) -> Result<Self> {
        if cols == 0 && rows > 0 {
            return Err(VecnnError::Parameter(
                "rows must have at least one component".to_string(),
            ));
        }
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(VecnnError::Parameter(format!(
                "buffer of {} values is not a contiguous {} x {} row-major matrix",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { data, rows, cols })
    }

    /// Wrap `data` with row width `cols`, inferring the row count.
    pub fn from_flat(data: &'a [f32], cols: usize) -> Result<Self> {
        if cols == 0 {
            return Err(VecnnError::Parameter(
                "row width must be at least 1".to_string(),
            ));
        }
        if data.len() % cols != 0 {
            return Err(VecnnError::Parameter(format!(
                "buffer of {} values is not a multiple of row width {}",
                data.len(),
                cols
            )));
        }
        Self::new(data, data.len() / cols, cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Row `i`.
    ///
    /// # Panics
    /// Panics if `i >= rows()`.
    pub fn row(&self, i: usize) -> &'a [f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [f32]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }
}

/// Flatten nested rows into a contiguous buffer, rejecting ragged input.
///
/// Returns the buffer and the common row width.
pub fn flatten_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<(Vec<f32>, usize)> {
    let cols = rows.first().map_or(0, |r| r.as_ref().len());
    let mut data = Vec::with_capacity(rows.len() * cols);
    for (i, row) in rows.iter().enumerate() {
        let row = row.as_ref();
        if row.len() != cols {
            return Err(VecnnError::Parameter(format!(
                "row {} has {} elements whereas row 0 has {}",
                i,
                row.len(),
                cols
            )));
        }
        data.extend_from_slice(row);
    }
    Ok((data, cols))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_access() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let m = RowMajor::new(&data, 2, 3).unwrap();
        assert_eq!(m.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.iter().count(), 2);
    }

    #[test]
    fn test_layout_mismatch() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(RowMajor::new(&data, 2, 3).is_err());
        assert!(RowMajor::from_flat(&data, 3).is_err());
        assert!(RowMajor::from_flat(&data, 0).is_err());
    }

    #[test]
    fn test_empty_matrix() {
        let m = RowMajor::new(&[], 0, 4).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn test_flatten_rows() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let (data, cols) = flatten_rows(&rows).unwrap();
        assert_eq!(cols, 2);
        assert_eq!(data, vec![1.0, 2.0, 3.0, 4.0]);

        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(flatten_rows(&ragged).is_err());
    }
}
