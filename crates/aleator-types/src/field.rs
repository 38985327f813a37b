//! Fields: values attached to mesh vertices, and collections of them.

use serde::{Deserialize, Serialize};

use crate::error::ShapeError;
use crate::mesh::Mesh;
use crate::sample::Sample;

/// A field: one value row per mesh vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    mesh: Mesh,
    values: Sample,
}

impl Field {
    /// Create a field from a mesh and one value row per vertex.
    ///
    /// Fails when the value count does not match the vertex count.
    pub fn new(mesh: Mesh, values: Sample) -> Result<Self, ShapeError> {
        if values.size() != mesh.vertex_count() {
            return Err(ShapeError::DimensionMismatch {
                expected: mesh.vertex_count(),
                got: values.size(),
            });
        }
        Ok(Field { mesh, values })
    }

    /// The underlying mesh.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// The per-vertex values.
    pub fn values(&self) -> &Sample {
        &self.values
    }

    /// Dimension of each value row.
    pub fn value_dimension(&self) -> usize {
        self.values.dimension()
    }

    /// Number of vertices (== number of value rows).
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }
}

/// A collection of fields sharing one mesh and one value dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSample {
    mesh: Mesh,
    dimension: usize,
    realizations: Vec<Sample>,
}

impl ProcessSample {
    /// Create an empty collection over `mesh` with the given value
    /// dimension.
    pub fn new(mesh: Mesh, dimension: usize) -> Self {
        ProcessSample {
            mesh,
            dimension,
            realizations: Vec::new(),
        }
    }

    /// Create a collection from fields sharing the same mesh and value
    /// dimension.
    ///
    /// Fails when `fields` is empty or a field disagrees on mesh or
    /// dimension.
    pub fn from_fields(fields: Vec<Field>) -> Result<Self, ShapeError> {
        let first = fields.first().ok_or(ShapeError::InvalidShape {
            expected: 1,
            got: 0,
        })?;
        let mut process = ProcessSample::new(first.mesh().clone(), first.value_dimension());
        for field in &fields {
            if field.mesh() != &process.mesh {
                return Err(ShapeError::DimensionMismatch {
                    expected: process.mesh.vertex_count(),
                    got: field.mesh().vertex_count(),
                });
            }
            process.push_values(field.values().clone())?;
        }
        Ok(process)
    }

    /// Append the values of one realization.
    ///
    /// Fails when the value count or dimension disagrees with the mesh
    /// and the declared dimension.
    pub fn push_values(&mut self, values: Sample) -> Result<(), ShapeError> {
        if values.size() != self.mesh.vertex_count() {
            return Err(ShapeError::DimensionMismatch {
                expected: self.mesh.vertex_count(),
                got: values.size(),
            });
        }
        if values.dimension() != self.dimension {
            return Err(ShapeError::DimensionMismatch {
                expected: self.dimension,
                got: values.dimension(),
            });
        }
        self.realizations.push(values);
        Ok(())
    }

    /// Append one realization as a field.
    ///
    /// Fails when the field mesh differs from the collection mesh.
    pub fn push(&mut self, field: Field) -> Result<(), ShapeError> {
        if field.mesh() != &self.mesh {
            return Err(ShapeError::DimensionMismatch {
                expected: self.mesh.vertex_count(),
                got: field.mesh().vertex_count(),
            });
        }
        self.push_values(field.values().clone())
    }

    /// Number of realizations.
    pub fn size(&self) -> usize {
        self.realizations.len()
    }

    /// True when no realization is stored.
    pub fn is_empty(&self) -> bool {
        self.realizations.is_empty()
    }

    /// The shared mesh.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Value dimension of every realization.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Values of realization `i`.
    ///
    /// Panics when out of bounds.
    pub fn values(&self, i: usize) -> &Sample {
        &self.realizations[i]
    }

    /// Realization `i` as an owned field.
    ///
    /// Panics when out of bounds.
    pub fn field(&self, i: usize) -> Field {
        Field {
            mesh: self.mesh.clone(),
            values: self.realizations[i].clone(),
        }
    }

    /// Iterate over the realizations' values.
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.realizations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid3() -> Mesh {
        Mesh::regular_grid(0.0, 1.0, 3).unwrap()
    }

    #[test]
    fn field_checks_vertex_count() {
        let values = Sample::from_vec(3, 2, vec![0.0; 6]).unwrap();
        let field = Field::new(grid3(), values).unwrap();
        assert_eq!(field.value_dimension(), 2);
        assert_eq!(field.vertex_count(), 3);

        let short = Sample::from_vec(2, 2, vec![0.0; 4]).unwrap();
        assert!(Field::new(grid3(), short).is_err());
    }

    #[test]
    fn process_sample_accumulates() {
        let mut process = ProcessSample::new(grid3(), 1);
        process
            .push_values(Sample::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap())
            .unwrap();
        process
            .push_values(Sample::from_vec(3, 1, vec![4.0, 5.0, 6.0]).unwrap())
            .unwrap();
        assert_eq!(process.size(), 2);
        assert_eq!(process.field(1).values().row(0), &[4.0]);

        let wrong_dim = Sample::from_vec(3, 2, vec![0.0; 6]).unwrap();
        assert!(process.push_values(wrong_dim).is_err());
        let wrong_size = Sample::from_vec(2, 1, vec![0.0; 2]).unwrap();
        assert!(process.push_values(wrong_size).is_err());
    }

    #[test]
    fn from_fields_requires_shared_mesh() {
        let values = Sample::from_vec(3, 1, vec![0.0; 3]).unwrap();
        let a = Field::new(grid3(), values.clone()).unwrap();
        let b = Field::new(grid3(), values).unwrap();
        let process = ProcessSample::from_fields(vec![a, b]).unwrap();
        assert_eq!(process.size(), 2);

        let other_mesh = Mesh::regular_grid(0.0, 2.0, 3).unwrap();
        let c = Field::new(other_mesh, Sample::from_vec(3, 1, vec![0.0; 3]).unwrap()).unwrap();
        let first = process.field(0);
        assert!(ProcessSample::from_fields(vec![first, c]).is_err());
    }
}
