//! Dense row-major matrix.
//!
//! The gradient convention throughout the crate stores the transposed
//! Jacobian: a gradient of an evaluation with input dimension d and
//! output dimension q is a d x q matrix. `transpose_apply` computes
//! `M^T . v` without materializing the transpose.

use serde::{Deserialize, Serialize};

use crate::error::ShapeError;
use crate::indices::Indices;
use crate::point::Point;

/// A dense rows x cols matrix of `f64`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a rows x cols matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Create the n x n identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut matrix = Matrix::zeros(n, n);
        for i in 0..n {
            matrix.set(i, i, 1.0);
        }
        matrix
    }

    /// Create a matrix from a flat row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, ShapeError> {
        if data.len() != rows * cols {
            return Err(ShapeError::InvalidShape {
                expected: rows * cols,
                got: data.len(),
            });
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element (i, j).
    ///
    /// Panics when out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.rows && j < self.cols, "({}, {}) out of bounds", i, j);
        self.data[i * self.cols + j]
    }

    /// Overwrite element (i, j).
    ///
    /// Panics when out of bounds.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        assert!(i < self.rows && j < self.cols, "({}, {}) out of bounds", i, j);
        self.data[i * self.cols + j] = value;
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(i < self.rows, "row {} out of bounds for {} rows", i, self.rows);
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Matrix-vector product `M . v` (v has `cols` components).
    ///
    /// Panics on mismatched dimensions.
    pub fn apply(&self, v: &Point) -> Point {
        assert_eq!(
            v.dimension(),
            self.cols,
            "apply: vector of dimension {} against {} columns",
            v.dimension(),
            self.cols
        );
        let mut out = vec![0.0; self.rows];
        for (i, out_i) in out.iter_mut().enumerate() {
            let row = self.row(i);
            *out_i = row.iter().zip(v.iter()).map(|(a, b)| a * b).sum();
        }
        Point::from(out)
    }

    /// Transposed product `M^T . v` (v has `rows` components).
    ///
    /// Panics on mismatched dimensions.
    pub fn transpose_apply(&self, v: &Point) -> Point {
        assert_eq!(
            v.dimension(),
            self.rows,
            "transpose_apply: vector of dimension {} against {} rows",
            v.dimension(),
            self.rows
        );
        let mut out = vec![0.0; self.cols];
        for i in 0..self.rows {
            let row = self.row(i);
            let vi = v[i];
            for (j, out_j) in out.iter_mut().enumerate() {
                *out_j += row[j] * vi;
            }
        }
        Point::from(out)
    }

    /// The transposed matrix.
    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.set(j, i, self.get(i, j));
            }
        }
        out
    }

    /// Extract the columns selected by `indices`, in order.
    pub fn select_columns(&self, indices: &Indices) -> Result<Matrix, ShapeError> {
        for &j in indices {
            if j >= self.cols {
                return Err(ShapeError::IndexOutOfBounds {
                    index: j,
                    size: self.cols,
                });
            }
        }
        let mut out = Matrix::zeros(self.rows, indices.len());
        for i in 0..self.rows {
            for (pos, &j) in indices.iter().enumerate() {
                out.set(i, pos, self.get(i, j));
            }
        }
        Ok(out)
    }

    /// The flat row-major buffer.
    pub fn data(&self) -> &[f64] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_and_transpose_apply() {
        // M = [[1, 2], [3, 4], [5, 6]] (3 rows, 2 cols)
        let m = Matrix::from_vec(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let v = Point::from_slice(&[1.0, -1.0]);
        assert_eq!(m.apply(&v), Point::from_slice(&[-1.0, -1.0, -1.0]));

        let w = Point::from_slice(&[1.0, 0.0, -1.0]);
        assert_eq!(m.transpose_apply(&w), Point::from_slice(&[-4.0, -4.0]));
    }

    #[test]
    fn transpose_swaps_shape() {
        let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let t = m.transpose();
        assert_eq!(t.rows(), 3);
        assert_eq!(t.cols(), 2);
        assert_eq!(t.get(2, 0), 3.0);
        assert_eq!(t.get(0, 1), 4.0);
    }

    #[test]
    fn select_columns_reorders() {
        let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let s = m.select_columns(&Indices::from(vec![2, 0])).unwrap();
        assert_eq!(s.cols(), 2);
        assert_eq!(s.row(0), &[3.0, 1.0]);
        assert_eq!(s.row(1), &[6.0, 4.0]);

        assert!(m.select_columns(&Indices::from(vec![7])).is_err());
    }

    #[test]
    fn identity_applies_as_noop() {
        let id = Matrix::identity(3);
        let v = Point::from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(id.apply(&v), v);
    }

    #[test]
    fn from_vec_rejects_bad_length() {
        assert!(Matrix::from_vec(2, 2, vec![0.0; 3]).is_err());
    }
}
