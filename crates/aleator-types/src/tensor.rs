//! Symmetric-per-sheet third-order tensor.
//!
//! A hessian of an evaluation with input dimension d and output
//! dimension q stacks q symmetric d x d sheets. Storage is the full
//! d * d * q buffer; `set` mirrors (i, j) and (j, i) so each sheet stays
//! symmetric by construction.

use serde::{Deserialize, Serialize};

use crate::error::ShapeError;
use crate::indices::Indices;
use crate::matrix::Matrix;

/// A d x d x q tensor whose sheets are symmetric d x d matrices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymmetricTensor {
    dimension: usize,
    sheets: usize,
    data: Vec<f64>,
}

impl SymmetricTensor {
    /// Create a d x d x q tensor filled with zeros.
    pub fn zeros(dimension: usize, sheets: usize) -> Self {
        SymmetricTensor {
            dimension,
            sheets,
            data: vec![0.0; dimension * dimension * sheets],
        }
    }

    /// Build a tensor from q square matrices of equal dimension.
    ///
    /// Only the lower triangle of each input sheet is read; the upper
    /// triangle is mirrored from it, so the result is symmetric even if
    /// the inputs are not.
    pub fn from_sheets(sheets: &[Matrix]) -> Result<Self, ShapeError> {
        let dimension = sheets.first().map_or(0, Matrix::rows);
        let mut tensor = SymmetricTensor::zeros(dimension, sheets.len());
        for (k, sheet) in sheets.iter().enumerate() {
            if sheet.rows() != dimension || sheet.cols() != dimension {
                return Err(ShapeError::DimensionMismatch {
                    expected: dimension,
                    got: sheet.rows().max(sheet.cols()),
                });
            }
            for i in 0..dimension {
                for j in 0..=i {
                    tensor.set(i, j, k, sheet.get(i, j));
                }
            }
        }
        Ok(tensor)
    }

    /// Sheet dimension d.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of sheets q.
    pub fn sheet_count(&self) -> usize {
        self.sheets
    }

    /// Element (i, j) of sheet k.
    ///
    /// Panics when out of bounds.
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[self.offset(i, j, k)]
    }

    /// Overwrite elements (i, j) and (j, i) of sheet k.
    ///
    /// Panics when out of bounds.
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f64) {
        let forward = self.offset(i, j, k);
        self.data[forward] = value;
        let mirror = self.offset(j, i, k);
        self.data[mirror] = value;
    }

    /// Sheet k as an owned matrix.
    pub fn sheet(&self, k: usize) -> Matrix {
        assert!(k < self.sheets, "sheet {} out of bounds for {} sheets", k, self.sheets);
        let mut out = Matrix::zeros(self.dimension, self.dimension);
        for i in 0..self.dimension {
            for j in 0..self.dimension {
                out.set(i, j, self.get(i, j, k));
            }
        }
        out
    }

    /// Extract the sheets selected by `indices`, in order.
    pub fn select_sheets(&self, indices: &Indices) -> Result<SymmetricTensor, ShapeError> {
        for &k in indices {
            if k >= self.sheets {
                return Err(ShapeError::IndexOutOfBounds {
                    index: k,
                    size: self.sheets,
                });
            }
        }
        let mut out = SymmetricTensor::zeros(self.dimension, indices.len());
        for (pos, &k) in indices.iter().enumerate() {
            for i in 0..self.dimension {
                for j in 0..=i {
                    out.set(i, j, pos, self.get(i, j, k));
                }
            }
        }
        Ok(out)
    }

    fn offset(&self, i: usize, j: usize, k: usize) -> usize {
        assert!(
            i < self.dimension && j < self.dimension && k < self.sheets,
            "({}, {}, {}) out of bounds",
            i,
            j,
            k
        );
        (k * self.dimension + i) * self.dimension + j
    }
}
