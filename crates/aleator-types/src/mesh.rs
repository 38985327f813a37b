//! Discretization support for field values.

use serde::{Deserialize, Serialize};

use crate::error::ShapeError;
use crate::indices::Indices;
use crate::sample::Sample;

/// A fixed set of vertices (with optional simplices) over which field
/// values are attached.
///
/// The composition layer only needs vertex bookkeeping; simplices are
/// carried for consumers that build interpolation on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    vertices: Sample,
    simplices: Vec<Indices>,
}

impl Mesh {
    /// Create a mesh from its vertices, with no simplices.
    pub fn new(vertices: Sample) -> Self {
        Mesh {
            vertices,
            simplices: Vec::new(),
        }
    }

    /// Create a mesh from vertices and simplices.
    ///
    /// Fails when a simplex references a vertex past the end.
    pub fn with_simplices(vertices: Sample, simplices: Vec<Indices>) -> Result<Self, ShapeError> {
        let bound = vertices.size();
        for simplex in &simplices {
            for &v in simplex {
                if v >= bound {
                    return Err(ShapeError::IndexOutOfBounds {
                        index: v,
                        size: bound,
                    });
                }
            }
        }
        Ok(Mesh {
            vertices,
            simplices,
        })
    }

    /// Build a one-dimensional regular grid of `count` vertices starting
    /// at `start` with spacing `step`, with consecutive-pair simplices.
    ///
    /// Fails when `count` is zero.
    pub fn regular_grid(start: f64, step: f64, count: usize) -> Result<Self, ShapeError> {
        if count == 0 {
            return Err(ShapeError::InvalidShape {
                expected: 1,
                got: 0,
            });
        }
        let data: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
        let vertices = Sample::from_vec(count, 1, data)?;
        let simplices = (0..count.saturating_sub(1))
            .map(|i| Indices::from(vec![i, i + 1]))
            .collect();
        Ok(Mesh {
            vertices,
            simplices,
        })
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.size()
    }

    /// Spatial dimension of the vertices.
    pub fn dimension(&self) -> usize {
        self.vertices.dimension()
    }

    /// All vertices.
    pub fn vertices(&self) -> &Sample {
        &self.vertices
    }

    /// Vertex `i` as a slice.
    pub fn vertex(&self, i: usize) -> &[f64] {
        self.vertices.row(i)
    }

    /// All simplices.
    pub fn simplices(&self) -> &[Indices] {
        &self.simplices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_grid_vertices() {
        let mesh = Mesh::regular_grid(0.0, 0.5, 3).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.dimension(), 1);
        assert_eq!(mesh.vertex(2), &[1.0]);
        assert_eq!(mesh.simplices().len(), 2);
    }

    #[test]
    fn regular_grid_rejects_empty() {
        assert!(Mesh::regular_grid(0.0, 1.0, 0).is_err());
    }

    #[test]
    fn with_simplices_checks_bounds() {
        let vertices = Sample::from_vec(2, 1, vec![0.0, 1.0]).unwrap();
        let err = Mesh::with_simplices(vertices, vec![Indices::from(vec![0, 2])]).unwrap_err();
        assert_eq!(err, ShapeError::IndexOutOfBounds { index: 2, size: 2 });
    }
}
