//! The evaluation capability and its concrete kinds.
//!
//! [`Evaluation`] is the single calling surface: it validates input
//! dimensions, counts calls, keeps the optional history and carries
//! the variable labels, then dispatches to one [`EvaluationKind`].
//! The kind set is closed on purpose; extension happens behind the
//! collaborator traits (formula engines, spatial indexes) and through
//! composition, not by adding open-ended subclasses.

mod algebraic;
mod analytic;
mod composed;
mod database;
mod mixture;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use aleator_types::{Description, Indices, Matrix, Point, Sample, SymmetricTensor};

use crate::error::{FunctionError, Result};
use crate::formula::FormulaEngine;
use crate::history::History;

pub use algebraic::{ConstantEvaluation, LinearEvaluation, QuadraticEvaluation};
pub use analytic::AnalyticEvaluation;
pub use composed::PointToPointEvaluation;
pub use database::DatabaseEvaluation;
pub use mixture::MixtureOfExpertsEvaluation;

/// The closed set of evaluation implementations.
#[derive(Debug, Clone)]
pub enum EvaluationKind {
    Constant(ConstantEvaluation),
    Linear(LinearEvaluation),
    Quadratic(QuadraticEvaluation),
    Analytic(AnalyticEvaluation),
    Database(DatabaseEvaluation),
    Mixture(MixtureOfExpertsEvaluation),
    Composed(PointToPointEvaluation),
}

impl EvaluationKind {
    pub fn input_dimension(&self) -> usize {
        match self {
            EvaluationKind::Constant(e) => e.input_dimension(),
            EvaluationKind::Linear(e) => e.input_dimension(),
            EvaluationKind::Quadratic(e) => e.input_dimension(),
            EvaluationKind::Analytic(e) => e.input_dimension(),
            EvaluationKind::Database(e) => e.input_dimension(),
            EvaluationKind::Mixture(e) => e.input_dimension(),
            EvaluationKind::Composed(e) => e.input_dimension(),
        }
    }

    pub fn output_dimension(&self) -> usize {
        match self {
            EvaluationKind::Constant(e) => e.output_dimension(),
            EvaluationKind::Linear(e) => e.output_dimension(),
            EvaluationKind::Quadratic(e) => e.output_dimension(),
            EvaluationKind::Analytic(e) => e.output_dimension(),
            EvaluationKind::Database(e) => e.output_dimension(),
            EvaluationKind::Mixture(e) => e.output_dimension(),
            EvaluationKind::Composed(e) => e.output_dimension(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EvaluationKind::Constant(_) => "constant",
            EvaluationKind::Linear(_) => "linear",
            EvaluationKind::Quadratic(_) => "quadratic",
            EvaluationKind::Analytic(_) => "analytic",
            EvaluationKind::Database(_) => "database",
            EvaluationKind::Mixture(_) => "mixture of experts",
            EvaluationKind::Composed(_) => "composed",
        }
    }

    /// True when the response is affine in the input.
    pub fn is_linear(&self) -> bool {
        match self {
            EvaluationKind::Constant(_) | EvaluationKind::Linear(_) => true,
            EvaluationKind::Composed(e) => e.is_linear(),
            _ => false,
        }
    }

    /// True when batch rows may be evaluated concurrently.
    pub fn is_parallel(&self) -> bool {
        match self {
            EvaluationKind::Mixture(e) => e.is_parallel(),
            EvaluationKind::Composed(e) => e.is_parallel(),
            _ => true,
        }
    }

    fn evaluate(&self, x: &Point) -> Result<Point> {
        match self {
            EvaluationKind::Constant(e) => Ok(e.evaluate()),
            EvaluationKind::Linear(e) => Ok(e.evaluate(x)),
            EvaluationKind::Quadratic(e) => Ok(e.evaluate(x)),
            EvaluationKind::Analytic(e) => e.evaluate(x),
            EvaluationKind::Database(e) => e.evaluate(x),
            EvaluationKind::Mixture(e) => e.evaluate(x),
            EvaluationKind::Composed(e) => e.evaluate(x),
        }
    }

    fn evaluate_sample(&self, sample: &Sample) -> Result<Sample> {
        match self {
            EvaluationKind::Analytic(e) => e.evaluate_sample(sample),
            EvaluationKind::Database(e) => e.evaluate_sample(sample),
            EvaluationKind::Mixture(e) => e.evaluate_sample(sample),
            EvaluationKind::Composed(e) => e.evaluate_sample(sample),
            _ => {
                let mut out = Sample::new(self.output_dimension());
                for i in 0..sample.size() {
                    out.push_point(&self.evaluate(&sample.point(i))?)?;
                }
                Ok(out)
            }
        }
    }

    fn marginal(&self, indices: &Indices) -> Result<EvaluationKind> {
        match self {
            EvaluationKind::Constant(e) => Ok(EvaluationKind::Constant(e.marginal(indices))),
            EvaluationKind::Linear(e) => Ok(EvaluationKind::Linear(e.marginal(indices)?)),
            EvaluationKind::Quadratic(e) => Ok(EvaluationKind::Quadratic(e.marginal(indices)?)),
            EvaluationKind::Analytic(e) => Ok(EvaluationKind::Analytic(e.marginal(indices)?)),
            EvaluationKind::Database(e) => Ok(EvaluationKind::Database(DatabaseEvaluation::new(
                e.input_sample().clone(),
                e.output_sample().marginal(indices)?,
                e.is_cache_enabled(),
            )?)),
            EvaluationKind::Mixture(e) => Ok(EvaluationKind::Mixture(e.marginal(indices)?)),
            EvaluationKind::Composed(e) => Ok(EvaluationKind::Composed(e.marginal(indices)?)),
        }
    }

    fn default_descriptions(&self) -> (Description, Description) {
        match self {
            EvaluationKind::Analytic(e) => (e.inputs().clone(), e.outputs().clone()),
            EvaluationKind::Mixture(e) => (
                e.experts()[0].input_description().clone(),
                e.experts()[0].output_description().clone(),
            ),
            EvaluationKind::Composed(e) => e.descriptions(),
            _ => (
                Description::default_labels("x", self.input_dimension()),
                Description::default_labels("y", self.output_dimension()),
            ),
        }
    }
}

/// A multivariate vector-valued evaluation with call counting,
/// optional history recording and named variables.
#[derive(Debug)]
pub struct Evaluation {
    kind: EvaluationKind,
    input_description: Description,
    output_description: Description,
    calls: AtomicUsize,
    history: Mutex<History>,
}

impl Evaluation {
    pub fn new(kind: EvaluationKind) -> Self {
        let (input_description, output_description) = kind.default_descriptions();
        let history = History::new(kind.input_dimension(), kind.output_dimension());
        Evaluation {
            kind,
            input_description,
            output_description,
            calls: AtomicUsize::new(0),
            history: Mutex::new(history),
        }
    }

    /// The evaluation returning `value` for every input of the given
    /// dimension.
    pub fn constant(value: Point, input_dimension: usize) -> Self {
        Evaluation::new(EvaluationKind::Constant(ConstantEvaluation::new(
            value,
            input_dimension,
        )))
    }

    /// `f(x) = constant + linearᵀ·(x − center)`.
    pub fn linear(center: Point, constant: Point, linear: Matrix) -> Result<Self> {
        Ok(Evaluation::new(EvaluationKind::Linear(
            LinearEvaluation::new(center, constant, linear)?,
        )))
    }

    /// `f(x) = constant + linearᵀ·Δ + 0.5·Δᵀ·quadratic·Δ`.
    pub fn quadratic(
        center: Point,
        constant: Point,
        linear: Matrix,
        quadratic: SymmetricTensor,
    ) -> Result<Self> {
        Ok(Evaluation::new(EvaluationKind::Quadratic(
            QuadraticEvaluation::new(center, constant, linear, quadratic)?,
        )))
    }

    /// Formulas compiled by `engine`, one per output label.
    pub fn analytic(
        inputs: Description,
        outputs: Description,
        formulas: Vec<String>,
        engine: Arc<dyn FormulaEngine>,
    ) -> Result<Self> {
        Ok(Evaluation::new(EvaluationKind::Analytic(
            AnalyticEvaluation::new(inputs, outputs, formulas, engine)?,
        )))
    }

    /// Formulas with named parameters bound to initial values.
    pub fn analytic_with_parameters(
        inputs: Description,
        parameters: Vec<(String, f64)>,
        outputs: Description,
        formulas: Vec<String>,
        engine: Arc<dyn FormulaEngine>,
    ) -> Result<Self> {
        Ok(Evaluation::new(EvaluationKind::Analytic(
            AnalyticEvaluation::with_parameters(inputs, parameters, outputs, formulas, engine)?,
        )))
    }

    /// Nearest-neighbour lookup over paired reference samples.
    pub fn database(input: Sample, output: Sample, activate_cache: bool) -> Result<Self> {
        Ok(Evaluation::new(EvaluationKind::Database(
            DatabaseEvaluation::new(input, output, activate_cache)?,
        )))
    }

    /// Expert functions behind a classifier.
    pub fn mixture(
        experts: Vec<crate::function::Function>,
        classifier: crate::function::Function,
    ) -> Result<Self> {
        Ok(Evaluation::new(EvaluationKind::Mixture(
            MixtureOfExpertsEvaluation::new(experts, classifier)?,
        )))
    }

    /// A validated composition.
    pub fn composed(composition: PointToPointEvaluation) -> Self {
        Evaluation::new(EvaluationKind::Composed(composition))
    }

    pub fn kind(&self) -> &EvaluationKind {
        &self.kind
    }

    pub fn input_dimension(&self) -> usize {
        self.kind.input_dimension()
    }

    pub fn output_dimension(&self) -> usize {
        self.kind.output_dimension()
    }

    pub fn input_description(&self) -> &Description {
        &self.input_description
    }

    pub fn output_description(&self) -> &Description {
        &self.output_description
    }

    pub fn set_input_description(&mut self, description: Description) -> Result<()> {
        if description.len() != self.input_dimension() {
            return Err(FunctionError::dimension(
                "input description",
                self.input_dimension(),
                description.len(),
            ));
        }
        self.input_description = description;
        Ok(())
    }

    pub fn set_output_description(&mut self, description: Description) -> Result<()> {
        if description.len() != self.output_dimension() {
            return Err(FunctionError::dimension(
                "output description",
                self.output_dimension(),
                description.len(),
            ));
        }
        self.output_description = description;
        Ok(())
    }

    pub fn is_linear(&self) -> bool {
        self.kind.is_linear()
    }

    pub fn is_parallel(&self) -> bool {
        self.kind.is_parallel()
    }

    /// Number of points evaluated so far, batch rows included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Evaluates one point.
    pub fn evaluate(&self, x: &Point) -> Result<Point> {
        if x.dimension() != self.input_dimension() {
            return Err(FunctionError::dimension(
                "evaluation input",
                self.input_dimension(),
                x.dimension(),
            ));
        }
        let y = self.kind.evaluate(x)?;
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.history.lock().record(x, &y);
        Ok(y)
    }

    /// Evaluates a batch, row for row equivalent to mapping
    /// [`Evaluation::evaluate`], with kind-specific fast paths.
    pub fn evaluate_sample(&self, sample: &Sample) -> Result<Sample> {
        if sample.dimension() != self.input_dimension() {
            return Err(FunctionError::dimension(
                "evaluation batch input",
                self.input_dimension(),
                sample.dimension(),
            ));
        }
        if sample.is_empty() {
            return Ok(Sample::new(self.output_dimension()));
        }
        let out = self.kind.evaluate_sample(sample)?;
        self.calls.fetch_add(sample.size(), Ordering::Relaxed);
        self.history.lock().record_sample(sample, &out);
        Ok(out)
    }

    /// The sub-evaluation producing only the selected output
    /// components. The result starts with a fresh call counter and
    /// disabled history.
    pub fn marginal(&self, indices: impl Into<Indices>) -> Result<Evaluation> {
        let indices = indices.into();
        check_marginal(&indices, self.output_dimension())?;
        if indices.is_full_identity(self.output_dimension()) {
            return Ok(Evaluation {
                kind: self.kind.clone(),
                input_description: self.input_description.clone(),
                output_description: self.output_description.clone(),
                calls: AtomicUsize::new(0),
                history: Mutex::new(History::new(
                    self.input_dimension(),
                    self.output_dimension(),
                )),
            });
        }
        let kind = self.kind.marginal(&indices)?;
        let output_description = self.output_description.select(&indices)?;
        let history = History::new(kind.input_dimension(), kind.output_dimension());
        Ok(Evaluation {
            kind,
            input_description: self.input_description.clone(),
            output_description,
            calls: AtomicUsize::new(0),
            history: Mutex::new(history),
        })
    }

    /// Rebinds the parameter vector on parametric kinds. Non-parametric
    /// kinds accept the empty vector and reject anything else.
    pub fn set_parameter(&mut self, p: &Point) -> Result<()> {
        match &mut self.kind {
            EvaluationKind::Analytic(inner) => inner.set_parameter(p),
            EvaluationKind::Composed(inner) => inner.set_parameter(p),
            kind => {
                if p.is_empty() {
                    Ok(())
                } else {
                    Err(FunctionError::NotImplemented {
                        operation: format!("set_parameter on a {} evaluation", kind.name()),
                    })
                }
            }
        }
    }

    /// Current parameter vector; empty for non-parametric kinds.
    pub fn parameter(&self) -> Point {
        match &self.kind {
            EvaluationKind::Analytic(inner) => inner.parameter(),
            EvaluationKind::Composed(inner) => inner.parameter(),
            _ => Point::zeros(0),
        }
    }

    pub fn enable_history(&mut self) {
        self.history.get_mut().enable();
    }

    pub fn disable_history(&mut self) {
        self.history.get_mut().disable();
    }

    pub fn clear_history(&mut self) {
        self.history.get_mut().clear();
    }

    pub fn is_history_enabled(&self) -> bool {
        self.history.lock().is_enabled()
    }

    pub fn history_inputs(&self) -> Sample {
        self.history.lock().inputs().clone()
    }

    pub fn history_outputs(&self) -> Sample {
        self.history.lock().outputs().clone()
    }

    /// Database-specific surface, for re-arming the reference samples
    /// or swapping the spatial index.
    pub fn as_database(&self) -> Option<&DatabaseEvaluation> {
        match &self.kind {
            EvaluationKind::Database(db) => Some(db),
            _ => None,
        }
    }

    pub fn as_database_mut(&mut self) -> Option<&mut DatabaseEvaluation> {
        match &mut self.kind {
            EvaluationKind::Database(db) => Some(db),
            _ => None,
        }
    }
}

impl Clone for Evaluation {
    fn clone(&self) -> Self {
        Evaluation {
            kind: self.kind.clone(),
            input_description: self.input_description.clone(),
            output_description: self.output_description.clone(),
            calls: AtomicUsize::new(self.calls.load(Ordering::Relaxed)),
            history: Mutex::new(self.history.lock().clone()),
        }
    }
}

/// Shared validation for marginal index sets.
pub(crate) fn check_marginal(indices: &Indices, output_dimension: usize) -> Result<()> {
    if indices.is_empty() {
        return Err(FunctionError::InvalidArgument(
            "marginal selection is empty".to_string(),
        ));
    }
    if !indices.check_bound(output_dimension) {
        return Err(FunctionError::InvalidArgument(format!(
            "marginal indices {:?} exceed the output dimension {}",
            indices.as_slice(),
            output_dimension
        )));
    }
    if indices.has_duplicates() {
        return Err(FunctionError::InvalidArgument(format!(
            "marginal indices {:?} contain duplicates",
            indices.as_slice()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn affine() -> Evaluation {
        // f(x) = 3 + [1, 2]·x
        Evaluation::linear(
            Point::zeros(2),
            Point::from(vec![3.0]),
            Matrix::from_vec(2, 1, vec![1.0, 2.0]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn dimension_mismatch_is_detected_before_evaluation() {
        let eval = affine();
        let err = eval.evaluate(&Point::zeros(3)).err().unwrap();
        assert!(matches!(err, FunctionError::DimensionMismatch { .. }));
        assert_eq!(eval.call_count(), 0);
    }

    #[test]
    fn counters_track_points_not_calls() {
        let eval = affine();
        eval.evaluate(&Point::zeros(2)).unwrap();
        let mut sample = Sample::new(2);
        for _ in 0..4 {
            sample.push_row(&[1.0, 1.0]).unwrap();
        }
        eval.evaluate_sample(&sample).unwrap();
        assert_eq!(eval.call_count(), 5);
    }

    #[test]
    fn empty_batches_cost_nothing() {
        let eval = affine();
        let out = eval.evaluate_sample(&Sample::new(2)).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.dimension(), 1);
        assert_eq!(eval.call_count(), 0);
    }

    #[test]
    fn history_records_only_while_enabled() {
        let mut eval = affine();
        eval.evaluate(&Point::zeros(2)).unwrap();
        eval.enable_history();
        eval.evaluate(&Point::from(vec![1.0, 1.0])).unwrap();
        eval.disable_history();
        eval.evaluate(&Point::zeros(2)).unwrap();
        assert_eq!(eval.history_inputs().size(), 1);
        assert_eq!(eval.history_outputs().row(0), &[6.0]);
    }

    #[test]
    fn default_labels_cover_both_sides() {
        let eval = affine();
        assert_eq!(eval.input_description().as_slice(), &["x0", "x1"]);
        assert_eq!(eval.output_description().as_slice(), &["y0"]);
    }

    #[test]
    fn description_lengths_are_validated() {
        let mut eval = affine();
        let err = eval
            .set_input_description(Description::from(vec!["a"]))
            .err()
            .unwrap();
        assert!(matches!(err, FunctionError::DimensionMismatch { .. }));
        eval.set_input_description(Description::from(vec!["a", "b"]))
            .unwrap();
        assert_eq!(eval.input_description().as_slice(), &["a", "b"]);
    }

    #[test]
    fn full_identity_marginal_is_a_fresh_clone() {
        let eval = affine();
        eval.evaluate(&Point::zeros(2)).unwrap();
        let marginal = eval.marginal(vec![0]).unwrap();
        assert_eq!(marginal.output_dimension(), 1);
        assert_eq!(marginal.call_count(), 0);
        assert_eq!(
            marginal.evaluate(&Point::from(vec![1.0, 1.0])).unwrap().as_slice(),
            &[6.0]
        );
    }

    #[test]
    fn marginal_rejects_bad_indices() {
        let eval = affine();
        assert!(matches!(
            eval.marginal(vec![1]),
            Err(FunctionError::InvalidArgument(_))
        ));
        assert!(matches!(
            eval.marginal(vec![0, 0]),
            Err(FunctionError::InvalidArgument(_))
        ));
        assert!(matches!(
            eval.marginal(Vec::<usize>::new()),
            Err(FunctionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn non_parametric_kinds_reject_parameters() {
        let mut eval = affine();
        eval.set_parameter(&Point::zeros(0)).unwrap();
        let err = eval.set_parameter(&Point::from(vec![1.0])).err().unwrap();
        assert!(matches!(err, FunctionError::NotImplemented { .. }));
        assert!(eval.parameter().is_empty());
    }

    #[test]
    fn clone_carries_the_counter_value() {
        let eval = affine();
        eval.evaluate(&Point::zeros(2)).unwrap();
        let copy = eval.clone();
        assert_eq!(copy.call_count(), 1);
        copy.evaluate(&Point::zeros(2)).unwrap();
        assert_eq!(copy.call_count(), 2);
        assert_eq!(eval.call_count(), 1);
    }
}
