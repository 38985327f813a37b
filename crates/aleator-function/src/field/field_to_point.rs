//! Functions collapsing fields to points.

use std::sync::atomic::{AtomicUsize, Ordering};

use aleator_types::{Description, Field, Indices, Mesh, Point, ProcessSample, Sample};

use crate::error::{FunctionError, Result};
use crate::field::connection::FieldToPointConnection;
use crate::field::field_function::{check_field, check_process_sample};

/// Per-component mean of the field values over the vertices.
#[derive(Debug, Clone)]
pub struct VertexMeanEvaluation {
    mesh: Mesh,
    dimension: usize,
    components: Indices,
}

impl VertexMeanEvaluation {
    /// Fails on a mesh with no vertex, where a mean is undefined.
    pub fn new(mesh: Mesh, dimension: usize) -> Result<Self> {
        if mesh.vertex_count() == 0 {
            return Err(FunctionError::EmptyInput(
                "vertex mean over a mesh with no vertex".to_string(),
            ));
        }
        Ok(VertexMeanEvaluation {
            mesh,
            dimension,
            components: Indices::from_range(dimension),
        })
    }

    pub(crate) fn evaluate(&self, field: &Field) -> Result<Point> {
        let count = self.mesh.vertex_count() as f64;
        let mut out = vec![0.0; self.components.len()];
        for row in field.values().rows() {
            for (slot, &component) in out.iter_mut().zip(self.components.iter()) {
                *slot += row[component];
            }
        }
        for slot in &mut out {
            *slot /= count;
        }
        Ok(Point::from(out))
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<VertexMeanEvaluation> {
        let components = Indices::from(
            indices
                .iter()
                .map(|&i| self.components[i])
                .collect::<Vec<usize>>(),
        );
        Ok(VertexMeanEvaluation {
            mesh: self.mesh.clone(),
            dimension: self.dimension,
            components,
        })
    }
}

/// The closed set of field-to-point implementations.
#[derive(Debug, Clone)]
pub enum FieldToPointKind {
    VertexMean(VertexMeanEvaluation),
    Connection(FieldToPointConnection),
}

impl FieldToPointKind {
    fn input_dimension(&self) -> usize {
        match self {
            FieldToPointKind::VertexMean(k) => k.dimension,
            FieldToPointKind::Connection(k) => k.input_dimension(),
        }
    }

    fn output_dimension(&self) -> usize {
        match self {
            FieldToPointKind::VertexMean(k) => k.components.len(),
            FieldToPointKind::Connection(k) => k.output_dimension(),
        }
    }

    fn mesh(&self) -> &Mesh {
        match self {
            FieldToPointKind::VertexMean(k) => &k.mesh,
            FieldToPointKind::Connection(k) => k.input_mesh(),
        }
    }

    fn evaluate(&self, field: &Field) -> Result<Point> {
        match self {
            FieldToPointKind::VertexMean(k) => k.evaluate(field),
            FieldToPointKind::Connection(k) => k.evaluate(field),
        }
    }

    fn evaluate_process_sample(&self, sample: &ProcessSample) -> Result<Sample> {
        match self {
            FieldToPointKind::VertexMean(k) => {
                let mut out = Sample::new(k.components.len());
                for i in 0..sample.size() {
                    out.push_point(&k.evaluate(&sample.field(i))?)?;
                }
                Ok(out)
            }
            FieldToPointKind::Connection(k) => k.evaluate_process_sample(sample),
        }
    }

    fn marginal(&self, indices: &Indices) -> Result<FieldToPointKind> {
        match self {
            FieldToPointKind::VertexMean(k) => {
                Ok(FieldToPointKind::VertexMean(k.marginal(indices)?))
            }
            FieldToPointKind::Connection(k) => {
                Ok(FieldToPointKind::Connection(k.marginal(indices)?))
            }
        }
    }
}

/// A function collapsing fields over a fixed mesh into points.
#[derive(Debug)]
pub struct FieldToPointFunction {
    kind: FieldToPointKind,
    input_description: Description,
    output_description: Description,
    calls: AtomicUsize,
}

impl FieldToPointFunction {
    pub fn new(kind: FieldToPointKind) -> Self {
        let input_description = Description::default_labels("x", kind.input_dimension());
        let output_description = Description::default_labels("y", kind.output_dimension());
        FieldToPointFunction {
            kind,
            input_description,
            output_description,
            calls: AtomicUsize::new(0),
        }
    }

    /// Per-component mean of the field values over the vertices.
    pub fn vertex_mean(mesh: Mesh, dimension: usize) -> Result<Self> {
        Ok(FieldToPointFunction::new(FieldToPointKind::VertexMean(
            VertexMeanEvaluation::new(mesh, dimension)?,
        )))
    }

    /// Wraps a composed collapse chain.
    pub fn connection(connection: FieldToPointConnection) -> Self {
        FieldToPointFunction::new(FieldToPointKind::Connection(connection))
    }

    pub fn kind(&self) -> &FieldToPointKind {
        &self.kind
    }

    /// Dimension of the input field values.
    pub fn input_dimension(&self) -> usize {
        self.kind.input_dimension()
    }

    /// Dimension of the output point.
    pub fn output_dimension(&self) -> usize {
        self.kind.output_dimension()
    }

    /// The mesh input fields live on.
    pub fn input_mesh(&self) -> &Mesh {
        self.kind.mesh()
    }

    pub fn input_description(&self) -> &Description {
        &self.input_description
    }

    pub fn output_description(&self) -> &Description {
        &self.output_description
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Collapses one field to a point.
    pub fn evaluate(&self, field: &Field) -> Result<Point> {
        check_field(field, self.input_dimension(), self.input_mesh())?;
        let out = self.kind.evaluate(field)?;
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(out)
    }

    /// Collapses every realization of a process sample, one output row
    /// per realization.
    pub fn evaluate_process_sample(&self, sample: &ProcessSample) -> Result<Sample> {
        check_process_sample(sample, self.input_dimension(), self.input_mesh())?;
        let out = self.kind.evaluate_process_sample(sample)?;
        self.calls.fetch_add(sample.size(), Ordering::Relaxed);
        Ok(out)
    }

    /// The function producing only the selected output components, with
    /// a fresh counter. Composed chains marginalize their outer side.
    pub fn marginal(&self, indices: impl Into<Indices>) -> Result<FieldToPointFunction> {
        let indices = indices.into();
        crate::evaluation::check_marginal(&indices, self.output_dimension())?;
        let kind = self.kind.marginal(&indices)?;
        let output_description = self.output_description.select(&indices)?;
        Ok(FieldToPointFunction {
            kind,
            input_description: self.input_description.clone(),
            output_description,
            calls: AtomicUsize::new(0),
        })
    }
}

impl Clone for FieldToPointFunction {
    fn clone(&self) -> Self {
        FieldToPointFunction {
            kind: self.kind.clone(),
            input_description: self.input_description.clone(),
            output_description: self.output_description.clone(),
            calls: AtomicUsize::new(self.calls.load(Ordering::Relaxed)),
        }
    }
}
