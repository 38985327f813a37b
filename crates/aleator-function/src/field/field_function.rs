//! Field-to-field functions.

use std::sync::atomic::{AtomicUsize, Ordering};

use aleator_types::{Description, Field, Indices, Mesh, ProcessSample, Sample};

use crate::error::{FunctionError, Result};
use crate::function::Function;

/// Applies a point function to each vertex's value row; the output
/// field lives over the same mesh.
#[derive(Debug, Clone)]
pub struct ValueMapEvaluation {
    function: Function,
    mesh: Mesh,
}

impl ValueMapEvaluation {
    pub fn new(function: Function, mesh: Mesh) -> Self {
        ValueMapEvaluation { function, mesh }
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub(crate) fn evaluate(&self, field: &Field) -> Result<Field> {
        let values = self.function.evaluate_sample(field.values())?;
        Ok(Field::new(self.mesh.clone(), values)?)
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<ValueMapEvaluation> {
        Ok(ValueMapEvaluation::new(
            self.function.marginal(indices.clone())?,
            self.mesh.clone(),
        ))
    }
}

/// Applies a point function to `[vertex ∥ value]` rows, so the
/// function sees where on the mesh each value sits.
#[derive(Debug, Clone)]
pub struct VertexValueMapEvaluation {
    function: Function,
    mesh: Mesh,
}

impl VertexValueMapEvaluation {
    /// The function input must cover the mesh coordinates plus at
    /// least one value component.
    pub fn new(function: Function, mesh: Mesh) -> Result<Self> {
        if function.input_dimension() <= mesh.dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "function input dimension {} leaves no room for values after {} mesh coordinates",
                function.input_dimension(),
                mesh.dimension()
            )));
        }
        Ok(VertexValueMapEvaluation { function, mesh })
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    fn value_dimension(&self) -> usize {
        self.function.input_dimension() - self.mesh.dimension()
    }

    pub(crate) fn evaluate(&self, field: &Field) -> Result<Field> {
        let mut joined = Sample::new(self.function.input_dimension());
        let mut row = Vec::with_capacity(self.function.input_dimension());
        for (vertex, values) in self.mesh.vertices().rows().zip(field.values().rows()) {
            row.clear();
            row.extend_from_slice(vertex);
            row.extend_from_slice(values);
            joined.push_row(&row)?;
        }
        let values = self.function.evaluate_sample(&joined)?;
        Ok(Field::new(self.mesh.clone(), values)?)
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<VertexValueMapEvaluation> {
        Ok(VertexValueMapEvaluation {
            function: self.function.marginal(indices.clone())?,
            mesh: self.mesh.clone(),
        })
    }
}

/// The closed set of field-function implementations.
#[derive(Debug, Clone)]
pub enum FieldFunctionKind {
    ValueMap(ValueMapEvaluation),
    VertexValueMap(VertexValueMapEvaluation),
}

impl FieldFunctionKind {
    fn input_dimension(&self) -> usize {
        match self {
            FieldFunctionKind::ValueMap(k) => k.function.input_dimension(),
            FieldFunctionKind::VertexValueMap(k) => k.value_dimension(),
        }
    }

    fn output_dimension(&self) -> usize {
        match self {
            FieldFunctionKind::ValueMap(k) => k.function.output_dimension(),
            FieldFunctionKind::VertexValueMap(k) => k.function.output_dimension(),
        }
    }

    fn mesh(&self) -> &Mesh {
        match self {
            FieldFunctionKind::ValueMap(k) => &k.mesh,
            FieldFunctionKind::VertexValueMap(k) => &k.mesh,
        }
    }

    fn evaluate(&self, field: &Field) -> Result<Field> {
        match self {
            FieldFunctionKind::ValueMap(k) => k.evaluate(field),
            FieldFunctionKind::VertexValueMap(k) => k.evaluate(field),
        }
    }

    fn marginal(&self, indices: &Indices) -> Result<FieldFunctionKind> {
        match self {
            FieldFunctionKind::ValueMap(k) => Ok(FieldFunctionKind::ValueMap(k.marginal(indices)?)),
            FieldFunctionKind::VertexValueMap(k) => {
                Ok(FieldFunctionKind::VertexValueMap(k.marginal(indices)?))
            }
        }
    }
}

/// A function mapping fields to fields over a fixed mesh.
#[derive(Debug)]
pub struct FieldFunction {
    kind: FieldFunctionKind,
    input_description: Description,
    output_description: Description,
    calls: AtomicUsize,
}

impl FieldFunction {
    pub fn new(kind: FieldFunctionKind) -> Self {
        let input_description = Description::default_labels("x", kind.input_dimension());
        let output_description = Description::default_labels("y", kind.output_dimension());
        FieldFunction {
            kind,
            input_description,
            output_description,
            calls: AtomicUsize::new(0),
        }
    }

    /// Point function applied to each vertex value row.
    pub fn value_map(function: Function, mesh: Mesh) -> Self {
        FieldFunction::new(FieldFunctionKind::ValueMap(ValueMapEvaluation::new(
            function, mesh,
        )))
    }

    /// Point function applied to `[vertex ∥ value]` rows.
    pub fn vertex_value_map(function: Function, mesh: Mesh) -> Result<Self> {
        Ok(FieldFunction::new(FieldFunctionKind::VertexValueMap(
            VertexValueMapEvaluation::new(function, mesh)?,
        )))
    }

    pub fn kind(&self) -> &FieldFunctionKind {
        &self.kind
    }

    /// Dimension of the input field values.
    pub fn input_dimension(&self) -> usize {
        self.kind.input_dimension()
    }

    /// Dimension of the output field values.
    pub fn output_dimension(&self) -> usize {
        self.kind.output_dimension()
    }

    /// The mesh both input and output fields live on.
    pub fn mesh(&self) -> &Mesh {
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

    /// Maps one field to another over the same mesh.
    pub fn evaluate(&self, field: &Field) -> Result<Field> {
        check_field(field, self.input_dimension(), self.mesh())?;
        let out = self.kind.evaluate(field)?;
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(out)
    }

    /// Maps every realization of a process sample.
    pub fn evaluate_process_sample(&self, sample: &ProcessSample) -> Result<ProcessSample> {
        check_process_sample(sample, self.input_dimension(), self.mesh())?;
        let mut out = ProcessSample::new(self.mesh().clone(), self.output_dimension());
        for i in 0..sample.size() {
            let mapped = self.kind.evaluate(&sample.field(i))?;
            out.push(mapped)?;
        }
        self.calls.fetch_add(sample.size(), Ordering::Relaxed);
        Ok(out)
    }

    /// The field function producing only the selected output value
    /// components, with a fresh counter.
    pub fn marginal(&self, indices: impl Into<Indices>) -> Result<FieldFunction> {
        let indices = indices.into();
        crate::evaluation::check_marginal(&indices, self.output_dimension())?;
        let kind = self.kind.marginal(&indices)?;
        let output_description = self.output_description.select(&indices)?;
        Ok(FieldFunction {
            kind,
            input_description: self.input_description.clone(),
            output_description,
            calls: AtomicUsize::new(0),
        })
    }
}

impl Clone for FieldFunction {
    fn clone(&self) -> Self {
        FieldFunction {
            kind: self.kind.clone(),
            input_description: self.input_description.clone(),
            output_description: self.output_description.clone(),
            calls: AtomicUsize::new(self.calls.load(Ordering::Relaxed)),
        }
    }
}

/// Shared call-time validation for field arguments.
pub(crate) fn check_field(field: &Field, value_dimension: usize, mesh: &Mesh) -> Result<()> {
    if field.value_dimension() != value_dimension {
        return Err(FunctionError::dimension(
            "field values",
            value_dimension,
            field.value_dimension(),
        ));
    }
    if field.mesh() != mesh {
        return Err(FunctionError::InvalidArgument(
            "input field lives on a different mesh".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_process_sample(
    sample: &ProcessSample,
    value_dimension: usize,
    mesh: &Mesh,
) -> Result<()> {
    if sample.dimension() != value_dimension {
        return Err(FunctionError::dimension(
            "process sample values",
            value_dimension,
            sample.dimension(),
        ));
    }
    if sample.mesh() != mesh {
        return Err(FunctionError::InvalidArgument(
            "process sample lives on a different mesh".to_string(),
        ));
    }
    Ok(())
}
