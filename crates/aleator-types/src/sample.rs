//! Batch of points sharing one dimension.
//!
//! `Sample` is the exchange type for batched evaluation: N rows of d
//! components stored contiguously in row-major order. Equality is exact
//! (`PartialEq` on the raw values), which the database evaluation relies
//! on for its reference-sample short-circuit.

use serde::{Deserialize, Serialize};

use crate::error::ShapeError;
use crate::indices::Indices;
use crate::point::Point;

/// N points of dimension d, stored row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    size: usize,
    dimension: usize,
    data: Vec<f64>,
}

impl Sample {
    /// Create an empty sample accepting rows of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Sample {
            size: 0,
            dimension,
            data: Vec::new(),
        }
    }

    /// Create a sample of `size` rows filled with zeros.
    pub fn zeros(size: usize, dimension: usize) -> Self {
        Sample {
            size,
            dimension,
            data: vec![0.0; size * dimension],
        }
    }

    /// Create a sample from a flat row-major buffer.
    ///
    /// Fails when the buffer does not hold exactly `size * dimension`
    /// elements.
    pub fn from_vec(size: usize, dimension: usize, data: Vec<f64>) -> Result<Self, ShapeError> {
        if data.len() != size * dimension {
            return Err(ShapeError::InvalidShape {
                expected: size * dimension,
                got: data.len(),
            });
        }
        Ok(Sample {
            size,
            dimension,
            data,
        })
    }

    /// Create a sample by stacking points of a common dimension.
    pub fn from_rows(rows: &[Point]) -> Result<Self, ShapeError> {
        let dimension = rows.first().map_or(0, Point::dimension);
        let mut sample = Sample::new(dimension);
        for row in rows {
            sample.push_point(row)?;
        }
        Ok(sample)
    }

    /// Number of rows.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of components per row.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// True when the sample has no rows.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Row `i` as a slice.
    ///
    /// Panics when `i` is out of bounds.
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(i < self.size, "row {} out of bounds for size {}", i, self.size);
        &self.data[i * self.dimension..(i + 1) * self.dimension]
    }

    /// Row `i` as an owned point.
    pub fn point(&self, i: usize) -> Point {
        Point::from_slice(self.row(i))
    }

    /// Append a row.
    ///
    /// Fails when the row dimension does not match the sample dimension.
    pub fn push_row(&mut self, row: &[f64]) -> Result<(), ShapeError> {
        if row.len() != self.dimension {
            return Err(ShapeError::DimensionMismatch {
                expected: self.dimension,
                got: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        self.size += 1;
        Ok(())
    }

    /// Append a point as a new row.
    pub fn push_point(&mut self, point: &Point) -> Result<(), ShapeError> {
        self.push_row(point.as_slice())
    }

    /// Overwrite row `i`.
    pub fn set_row(&mut self, i: usize, row: &[f64]) -> Result<(), ShapeError> {
        if i >= self.size {
            return Err(ShapeError::IndexOutOfBounds {
                index: i,
                size: self.size,
            });
        }
        if row.len() != self.dimension {
            return Err(ShapeError::DimensionMismatch {
                expected: self.dimension,
                got: row.len(),
            });
        }
        self.data[i * self.dimension..(i + 1) * self.dimension].copy_from_slice(row);
        Ok(())
    }

    /// Append every row of another sample of the same dimension.
    pub fn append(&mut self, other: &Sample) -> Result<(), ShapeError> {
        if other.dimension != self.dimension {
            return Err(ShapeError::DimensionMismatch {
                expected: self.dimension,
                got: other.dimension,
            });
        }
        self.data.extend_from_slice(&other.data);
        self.size += other.size;
        Ok(())
    }

    /// Extract the columns selected by `indices`, in order.
    pub fn marginal(&self, indices: &Indices) -> Result<Sample, ShapeError> {
        for &j in indices {
            if j >= self.dimension {
                return Err(ShapeError::IndexOutOfBounds {
                    index: j,
                    size: self.dimension,
                });
            }
        }
        let mut data = Vec::with_capacity(self.size * indices.len());
        for i in 0..self.size {
            let row = self.row(i);
            for &j in indices {
                data.push(row[j]);
            }
        }
        Ok(Sample {
            size: self.size,
            dimension: indices.len(),
            data,
        })
    }

    /// Iterate over the rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.size).map(move |i| self.row(i))
    }

    /// The flat row-major buffer.
    pub fn data(&self) -> &[f64] {
        &self.data
    }
}
