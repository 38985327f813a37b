//! Functions mapping points to fields over a fixed mesh.

use std::sync::atomic::{AtomicUsize, Ordering};

use aleator_types::{Description, Field, Indices, Mesh, Point, ProcessSample, Sample};

use crate::error::{FunctionError, Result};
use crate::function::Function;

/// Repeats selected input components at every vertex of the mesh.
#[derive(Debug, Clone)]
pub struct VertexBroadcastEvaluation {
    mesh: Mesh,
    dimension: usize,
    components: Indices,
}

impl VertexBroadcastEvaluation {
    pub fn new(mesh: Mesh, dimension: usize) -> Self {
        VertexBroadcastEvaluation {
            mesh,
            dimension,
            components: Indices::from_range(dimension),
        }
    }

    pub(crate) fn evaluate(&self, x: &Point) -> Result<Field> {
        let mut values = Sample::new(self.components.len());
        let row: Vec<f64> = self.components.iter().map(|&i| x[i]).collect();
        for _ in 0..self.mesh.vertex_count() {
            values.push_row(&row)?;
        }
        Ok(Field::new(self.mesh.clone(), values)?)
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<VertexBroadcastEvaluation> {
        let components = Indices::from(
            indices
                .iter()
                .map(|&i| self.components[i])
                .collect::<Vec<usize>>(),
        );
        Ok(VertexBroadcastEvaluation {
            mesh: self.mesh.clone(),
            dimension: self.dimension,
            components,
        })
    }
}

/// Evaluates a point function on `[vertex ∥ x]` at every vertex, so one
/// input point yields a whole trajectory.
#[derive(Debug, Clone)]
pub struct VertexParametricEvaluation {
    function: Function,
    mesh: Mesh,
}

impl VertexParametricEvaluation {
    /// The function input must cover the mesh coordinates plus at
    /// least one point component.
    pub fn new(function: Function, mesh: Mesh) -> Result<Self> {
        if function.input_dimension() <= mesh.dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "function input dimension {} leaves no room for the point after {} mesh coordinates",
                function.input_dimension(),
                mesh.dimension()
            )));
        }
        Ok(VertexParametricEvaluation { function, mesh })
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    fn point_dimension(&self) -> usize {
        self.function.input_dimension() - self.mesh.dimension()
    }

    pub(crate) fn evaluate(&self, x: &Point) -> Result<Field> {
        let mut joined = Sample::new(self.function.input_dimension());
        let mut row = Vec::with_capacity(self.function.input_dimension());
        for vertex in self.mesh.vertices().rows() {
            row.clear();
            row.extend_from_slice(vertex);
            row.extend_from_slice(x.as_slice());
            joined.push_row(&row)?;
        }
        let values = self.function.evaluate_sample(&joined)?;
        Ok(Field::new(self.mesh.clone(), values)?)
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<VertexParametricEvaluation> {
        Ok(VertexParametricEvaluation {
            function: self.function.marginal(indices.clone())?,
            mesh: self.mesh.clone(),
        })
    }
}

/// The closed set of point-to-field implementations.
#[derive(Debug, Clone)]
pub enum PointToFieldKind {
    VertexBroadcast(VertexBroadcastEvaluation),
    VertexParametric(VertexParametricEvaluation),
}

impl PointToFieldKind {
    fn input_dimension(&self) -> usize {
        match self {
            PointToFieldKind::VertexBroadcast(k) => k.dimension,
            PointToFieldKind::VertexParametric(k) => k.point_dimension(),
        }
    }

    fn output_dimension(&self) -> usize {
        match self {
            PointToFieldKind::VertexBroadcast(k) => k.components.len(),
            PointToFieldKind::VertexParametric(k) => k.function.output_dimension(),
        }
    }

    fn mesh(&self) -> &Mesh {
        match self {
            PointToFieldKind::VertexBroadcast(k) => &k.mesh,
            PointToFieldKind::VertexParametric(k) => &k.mesh,
        }
    }

    fn evaluate(&self, x: &Point) -> Result<Field> {
        match self {
            PointToFieldKind::VertexBroadcast(k) => k.evaluate(x),
            PointToFieldKind::VertexParametric(k) => k.evaluate(x),
        }
    }

    fn marginal(&self, indices: &Indices) -> Result<PointToFieldKind> {
        match self {
            PointToFieldKind::VertexBroadcast(k) => {
                Ok(PointToFieldKind::VertexBroadcast(k.marginal(indices)?))
            }
            PointToFieldKind::VertexParametric(k) => {
                Ok(PointToFieldKind::VertexParametric(k.marginal(indices)?))
            }
        }
    }
}

/// A function mapping points to fields over a fixed output mesh.
#[derive(Debug)]
pub struct PointToFieldFunction {
    kind: PointToFieldKind,
    input_description: Description,
    output_description: Description,
    calls: AtomicUsize,
}

impl PointToFieldFunction {
    pub fn new(kind: PointToFieldKind) -> Self {
        let input_description = Description::default_labels("x", kind.input_dimension());
        let output_description = Description::default_labels("y", kind.output_dimension());
        PointToFieldFunction {
            kind,
            input_description,
            output_description,
            calls: AtomicUsize::new(0),
        }
    }

    /// Repeats the input point at every vertex.
    pub fn vertex_broadcast(mesh: Mesh, dimension: usize) -> Self {
        PointToFieldFunction::new(PointToFieldKind::VertexBroadcast(
            VertexBroadcastEvaluation::new(mesh, dimension),
        ))
    }

    /// Point function evaluated on `[vertex ∥ x]` at every vertex.
    pub fn vertex_parametric(function: Function, mesh: Mesh) -> Result<Self> {
        Ok(PointToFieldFunction::new(PointToFieldKind::VertexParametric(
            VertexParametricEvaluation::new(function, mesh)?,
        )))
    }

    pub fn kind(&self) -> &PointToFieldKind {
        &self.kind
    }

    pub fn input_dimension(&self) -> usize {
        self.kind.input_dimension()
    }

    /// Dimension of the output field values.
    pub fn output_dimension(&self) -> usize {
        self.kind.output_dimension()
    }

    /// The mesh output fields live on.
    pub fn output_mesh(&self) -> &Mesh {
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

    /// Maps one point to a field.
    pub fn evaluate(&self, x: &Point) -> Result<Field> {
        if x.dimension() != self.input_dimension() {
            return Err(FunctionError::dimension(
                "point-to-field input",
                self.input_dimension(),
                x.dimension(),
            ));
        }
        let out = self.kind.evaluate(x)?;
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(out)
    }

    /// Maps every row of a sample to a realization.
    pub fn evaluate_sample(&self, sample: &Sample) -> Result<ProcessSample> {
        if sample.dimension() != self.input_dimension() {
            return Err(FunctionError::dimension(
                "point-to-field input sample",
                self.input_dimension(),
                sample.dimension(),
            ));
        }
        let mut out = ProcessSample::new(self.output_mesh().clone(), self.output_dimension());
        for row in sample.rows() {
            let field = self.kind.evaluate(&Point::from(row.to_vec()))?;
            out.push(field)?;
        }
        self.calls.fetch_add(sample.size(), Ordering::Relaxed);
        Ok(out)
    }

    /// The function producing only the selected output value
    /// components, with a fresh counter.
    pub fn marginal(&self, indices: impl Into<Indices>) -> Result<PointToFieldFunction> {
        let indices = indices.into();
        crate::evaluation::check_marginal(&indices, self.output_dimension())?;
        let kind = self.kind.marginal(&indices)?;
        let output_description = self.output_description.select(&indices)?;
        Ok(PointToFieldFunction {
            kind,
            input_description: self.input_description.clone(),
            output_description,
            calls: AtomicUsize::new(0),
        })
    }
}

impl Clone for PointToFieldFunction {
    fn clone(&self) -> Self {
        PointToFieldFunction {
            kind: self.kind.clone(),
            input_description: self.input_description.clone(),
            output_description: self.output_description.clone(),
            calls: AtomicUsize::new(self.calls.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aleator_types::Matrix;

    fn line_mesh(count: usize) -> Mesh {
        Mesh::regular_grid(0.0, 1.0, count).unwrap()
    }

    #[test]
    fn broadcast_repeats_the_point() {
        let p2f = PointToFieldFunction::vertex_broadcast(line_mesh(3), 2);
        let field = p2f.evaluate(&Point::from(vec![5.0, -1.0])).unwrap();
        assert_eq!(field.vertex_count(), 3);
        for row in field.values().rows() {
            assert_eq!(row, &[5.0, -1.0]);
        }
        assert_eq!(p2f.call_count(), 1);
    }

    #[test]
    fn broadcast_marginal_selects_components() {
        let p2f = PointToFieldFunction::vertex_broadcast(line_mesh(3), 3);
        let last = p2f.marginal(2).unwrap();
        // The input stays three-dimensional; only the output shrinks.
        assert_eq!(last.input_dimension(), 3);
        assert_eq!(last.output_dimension(), 1);
        let field = last.evaluate(&Point::from(vec![1.0, 2.0, 3.0])).unwrap();
        assert_eq!(field.values().row(0), &[3.0]);
        assert_eq!(p2f.call_count(), 0);
    }

    #[test]
    fn parametric_sees_vertex_and_point() {
        // f(t, a) = a·t over a 1-d mesh with vertices 0, 1, 2
        let function = Function::analytic(
            Description::from(vec!["t", "a"]),
            Description::from(vec!["y"]),
            vec!["a*t".to_string()],
            std::sync::Arc::new(
                crate::formula::ClosureFormulaEngine::new()
                    .define("a*t", |x: &[f64], _: &[(String, f64)]| Ok(x[0] * x[1])),
            ),
        )
        .unwrap();
        let p2f = PointToFieldFunction::vertex_parametric(function, line_mesh(3)).unwrap();
        assert_eq!(p2f.input_dimension(), 1);
        let field = p2f.evaluate(&Point::from(vec![2.0])).unwrap();
        assert_eq!(field.values().row(0), &[0.0]);
        assert_eq!(field.values().row(2), &[4.0]);
    }

    #[test]
    fn sample_batch_yields_a_process_sample() {
        let p2f = PointToFieldFunction::vertex_broadcast(line_mesh(2), 1);
        let mut sample = Sample::new(1);
        sample.push_row(&[1.0]).unwrap();
        sample.push_row(&[2.0]).unwrap();
        let ps = p2f.evaluate_sample(&sample).unwrap();
        assert_eq!(ps.size(), 2);
        assert_eq!(ps.values(1).row(0), &[2.0]);
        assert_eq!(p2f.call_count(), 2);
    }

    #[test]
    fn input_dimension_is_checked() {
        let p2f = PointToFieldFunction::vertex_broadcast(line_mesh(2), 2);
        assert!(matches!(
            p2f.evaluate(&Point::from(vec![1.0])),
            Err(FunctionError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn parametric_needs_room_for_the_point() {
        let function = Function::linear(
            Point::zeros(1),
            Point::zeros(1),
            Matrix::from_vec(1, 1, vec![1.0]).unwrap(),
        )
        .unwrap();
        assert!(matches!(
            PointToFieldFunction::vertex_parametric(function, line_mesh(2)),
            Err(FunctionError::InvalidArgument(_))
        ));
    }
}
