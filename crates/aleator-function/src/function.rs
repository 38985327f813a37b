//! The function aggregate: one evaluation plus derivative
//! capabilities, a shared configuration and the derivative fallback.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::warn;

use aleator_types::{Description, Indices, Matrix, Point, Sample, SymmetricTensor};

use crate::config::{Config, ParameterPolicy};
use crate::error::{FunctionError, Result};
use crate::evaluation::{Evaluation, PointToPointEvaluation};
use crate::finite_difference::{CenteredFiniteDifferenceGradient, CenteredFiniteDifferenceHessian};
use crate::formula::FormulaEngine;
use crate::gradient::Gradient;
use crate::hessian::Hessian;

/// A multivariate vector-valued function.
///
/// Owns an [`Evaluation`] together with a [`Gradient`] and a
/// [`Hessian`]. When no explicit derivatives are supplied they are
/// synthesized as centered finite differences over a clone of the
/// evaluation. Either way, a failing derivative call is retried once
/// through a one-shot finite-difference estimate before giving up;
/// the configured object stays primary on later calls.
#[derive(Debug)]
pub struct Function {
    evaluation: Evaluation,
    gradient: Gradient,
    hessian: Hessian,
    use_default_gradient: bool,
    use_default_hessian: bool,
    config: Config,
    calls: AtomicUsize,
}

impl Function {
    /// Wraps `evaluation` with synthesized finite-difference
    /// derivatives under the default configuration.
    pub fn new(evaluation: Evaluation) -> Self {
        Function::assemble(evaluation, Config::default())
    }

    /// Like [`Function::new`] with an explicit configuration, which is
    /// validated first.
    pub fn with_config(evaluation: Evaluation, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Function::assemble(evaluation, config))
    }

    fn assemble(evaluation: Evaluation, config: Config) -> Self {
        let gradient =
            Gradient::centered_finite_difference(evaluation.clone(), config.gradient_epsilon);
        let hessian =
            Hessian::centered_finite_difference(evaluation.clone(), config.hessian_epsilon);
        Function {
            evaluation,
            gradient,
            hessian,
            use_default_gradient: true,
            use_default_hessian: true,
            config,
            calls: AtomicUsize::new(0),
        }
    }

    /// Wraps an explicit evaluation/gradient/hessian triple after
    /// cross-validating their dimensions.
    pub fn with_derivatives(
        evaluation: Evaluation,
        gradient: Gradient,
        hessian: Hessian,
    ) -> Result<Self> {
        Function::with_derivatives_and_config(evaluation, gradient, hessian, Config::default())
    }

    pub fn with_derivatives_and_config(
        evaluation: Evaluation,
        gradient: Gradient,
        hessian: Hessian,
        config: Config,
    ) -> Result<Self> {
        config.validate()?;
        check_member(
            "gradient",
            gradient.input_dimension(),
            gradient.output_dimension(),
            &evaluation,
        )?;
        check_member(
            "hessian",
            hessian.input_dimension(),
            hessian.output_dimension(),
            &evaluation,
        )?;
        Ok(Function {
            evaluation,
            gradient,
            hessian,
            use_default_gradient: false,
            use_default_hessian: false,
            config,
            calls: AtomicUsize::new(0),
        })
    }

    /// The function returning `value` everywhere, with exact zero
    /// derivatives.
    pub fn constant(value: Point, input_dimension: usize) -> Self {
        let output_dimension = value.dimension();
        Function {
            evaluation: Evaluation::constant(value, input_dimension),
            gradient: Gradient::constant(Matrix::zeros(input_dimension, output_dimension)),
            hessian: Hessian::constant(SymmetricTensor::zeros(input_dimension, output_dimension)),
            use_default_gradient: false,
            use_default_hessian: false,
            config: Config::default(),
            calls: AtomicUsize::new(0),
        }
    }

    /// `f(x) = constant + linearᵀ·(x − center)` with its exact
    /// derivatives.
    pub fn linear(center: Point, constant: Point, linear: Matrix) -> Result<Self> {
        let evaluation = Evaluation::linear(center, constant, linear.clone())?;
        let gradient = Gradient::constant(linear);
        let hessian = Hessian::constant(SymmetricTensor::zeros(
            evaluation.input_dimension(),
            evaluation.output_dimension(),
        ));
        Function::with_derivatives(evaluation, gradient, hessian)
    }

    /// `f(x) = constant + linearᵀ·Δ + 0.5·Δᵀ·quadratic·Δ` with its
    /// exact derivatives.
    pub fn quadratic(
        center: Point,
        constant: Point,
        linear: Matrix,
        quadratic: SymmetricTensor,
    ) -> Result<Self> {
        let evaluation =
            Evaluation::quadratic(center.clone(), constant, linear.clone(), quadratic.clone())?;
        let gradient = Gradient::linear(center, linear, quadratic.clone())?;
        let hessian = Hessian::constant(quadratic);
        Function::with_derivatives(evaluation, gradient, hessian)
    }

    /// Formula-backed function with finite-difference derivatives.
    pub fn analytic(
        inputs: Description,
        outputs: Description,
        formulas: Vec<String>,
        engine: Arc<dyn FormulaEngine>,
    ) -> Result<Self> {
        Ok(Function::new(Evaluation::analytic(
            inputs, outputs, formulas, engine,
        )?))
    }

    /// Formula-backed function with named parameters.
    pub fn analytic_with_parameters(
        inputs: Description,
        parameters: Vec<(String, f64)>,
        outputs: Description,
        formulas: Vec<String>,
        engine: Arc<dyn FormulaEngine>,
    ) -> Result<Self> {
        Ok(Function::new(Evaluation::analytic_with_parameters(
            inputs, parameters, outputs, formulas, engine,
        )?))
    }

    /// Nearest-neighbour lookup over reference samples; the cache
    /// activation comes from `config.database_cache`.
    pub fn from_database(input: Sample, output: Sample, config: Config) -> Result<Self> {
        let evaluation = Evaluation::database(input, output, config.database_cache)?;
        Function::with_config(evaluation, config)
    }

    /// `left ∘ right` with composed batch semantics.
    pub fn compose(left: Function, right: Function) -> Result<Self> {
        Ok(Function::new(Evaluation::composed(
            PointToPointEvaluation::of_functions(left, right)?,
        )))
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    pub fn evaluation_mut(&mut self) -> &mut Evaluation {
        &mut self.evaluation
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn input_dimension(&self) -> usize {
        self.evaluation.input_dimension()
    }

    pub fn output_dimension(&self) -> usize {
        self.evaluation.output_dimension()
    }

    pub fn input_description(&self) -> &Description {
        self.evaluation.input_description()
    }

    pub fn output_description(&self) -> &Description {
        self.evaluation.output_description()
    }

    pub fn is_linear(&self) -> bool {
        self.evaluation.is_linear()
    }

    pub fn is_parallel(&self) -> bool {
        self.evaluation.is_parallel()
    }

    pub fn uses_default_gradient(&self) -> bool {
        self.use_default_gradient
    }

    pub fn uses_default_hessian(&self) -> bool {
        self.use_default_hessian
    }

    /// Points evaluated through this aggregate. The owned Evaluation
    /// keeps its own counter, so a composition can distinguish outer
    /// calls from inner ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn evaluation_call_count(&self) -> usize {
        self.evaluation.call_count()
    }

    pub fn gradient_call_count(&self) -> usize {
        self.gradient.call_count()
    }

    pub fn hessian_call_count(&self) -> usize {
        self.hessian.call_count()
    }

    pub fn evaluate(&self, x: &Point) -> Result<Point> {
        let y = self.evaluation.evaluate(x)?;
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(y)
    }

    pub fn evaluate_sample(&self, sample: &Sample) -> Result<Sample> {
        let out = self.evaluation.evaluate_sample(sample)?;
        self.calls.fetch_add(sample.size(), Ordering::Relaxed);
        Ok(out)
    }

    /// The d×q gradient at `x`.
    ///
    /// A failing primary computation is retried once through a
    /// one-shot centered finite difference over the current
    /// evaluation; a second failure surfaces as `InternalError` naming
    /// the point.
    pub fn gradient(&self, x: &Point) -> Result<Matrix> {
        if x.dimension() != self.input_dimension() {
            return Err(FunctionError::dimension(
                "gradient input",
                self.input_dimension(),
                x.dimension(),
            ));
        }
        match self.gradient.gradient(x) {
            Ok(matrix) => Ok(matrix),
            Err(primary) => {
                warn!(
                    error = %primary,
                    "gradient evaluation failed, retrying with centered finite differences"
                );
                let fallback = CenteredFiniteDifferenceGradient::new(
                    self.evaluation.clone(),
                    self.config.gradient_epsilon,
                );
                fallback.gradient(x).map_err(|secondary| {
                    FunctionError::InternalError(format!(
                        "gradient failed at {x}: primary: {primary}; fallback: {secondary}"
                    ))
                })
            }
        }
    }

    /// The d×d×q hessian at `x`, with the same fallback policy as
    /// [`Function::gradient`]. Every call through a synthesized
    /// hessian logs a warning.
    pub fn hessian(&self, x: &Point) -> Result<SymmetricTensor> {
        if x.dimension() != self.input_dimension() {
            return Err(FunctionError::dimension(
                "hessian input",
                self.input_dimension(),
                x.dimension(),
            ));
        }
        if self.use_default_hessian {
            warn!(
                point = %x,
                "hessian evaluated through centered finite differences, expect limited accuracy"
            );
        }
        match self.hessian.hessian(x) {
            Ok(tensor) => Ok(tensor),
            Err(primary) => {
                warn!(
                    error = %primary,
                    "hessian evaluation failed, retrying with centered finite differences"
                );
                let fallback = CenteredFiniteDifferenceHessian::new(
                    self.evaluation.clone(),
                    self.config.hessian_epsilon,
                );
                fallback.hessian(x).map_err(|secondary| {
                    FunctionError::InternalError(format!(
                        "hessian failed at {x}: primary: {primary}; fallback: {secondary}"
                    ))
                })
            }
        }
    }

    /// The sub-function producing only the selected output components.
    ///
    /// Explicit derivatives marginalize alongside the evaluation;
    /// synthesized ones are rebuilt over the marginal evaluation. The
    /// result starts with fresh counters.
    pub fn marginal(&self, indices: impl Into<Indices>) -> Result<Function> {
        let indices = indices.into();
        let evaluation = self.evaluation.marginal(indices.clone())?;
        let gradient = if self.use_default_gradient {
            Gradient::centered_finite_difference(evaluation.clone(), self.config.gradient_epsilon)
        } else {
            self.gradient.marginal(indices.clone())?
        };
        let hessian = if self.use_default_hessian {
            Hessian::centered_finite_difference(evaluation.clone(), self.config.hessian_epsilon)
        } else {
            self.hessian.marginal(indices)?
        };
        Ok(Function {
            evaluation,
            gradient,
            hessian,
            use_default_gradient: self.use_default_gradient,
            use_default_hessian: self.use_default_hessian,
            config: self.config,
            calls: AtomicUsize::new(0),
        })
    }

    /// Propagates a new parameter vector to the evaluation, gradient
    /// and hessian under the configured [`ParameterPolicy`].
    pub fn set_parameter(&mut self, p: &Point) -> Result<()> {
        let lenient = self.config.parameter_policy == ParameterPolicy::Lenient;
        apply_parameter(self.evaluation.set_parameter(p), lenient)?;
        apply_parameter(self.gradient.set_parameter(p), lenient)?;
        apply_parameter(self.hessian.set_parameter(p), lenient)?;
        Ok(())
    }

    /// Current parameter vector; empty for non-parametric functions.
    pub fn parameter(&self) -> Point {
        self.evaluation.parameter()
    }
}

impl Clone for Function {
    fn clone(&self) -> Self {
        Function {
            evaluation: self.evaluation.clone(),
            gradient: self.gradient.clone(),
            hessian: self.hessian.clone(),
            use_default_gradient: self.use_default_gradient,
            use_default_hessian: self.use_default_hessian,
            config: self.config,
            calls: AtomicUsize::new(self.calls.load(Ordering::Relaxed)),
        }
    }
}

fn check_member(name: &str, input: usize, output: usize, evaluation: &Evaluation) -> Result<()> {
    if input != evaluation.input_dimension() || output != evaluation.output_dimension() {
        return Err(FunctionError::InvalidArgument(format!(
            "{} dimensions {}->{} do not match the evaluation's {}->{}",
            name,
            input,
            output,
            evaluation.input_dimension(),
            evaluation.output_dimension()
        )));
    }
    Ok(())
}

fn apply_parameter(result: Result<()>, lenient: bool) -> Result<()> {
    match result {
        Err(FunctionError::NotImplemented { .. }) if lenient => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    use crate::formula::ClosureFormulaEngine;

    /// f(x) = 3 + [1, 2]·x on two inputs.
    fn affine() -> Function {
        Function::linear(
            Point::zeros(2),
            Point::from(vec![3.0]),
            Matrix::from_vec(2, 1, vec![1.0, 2.0]).unwrap(),
        )
        .unwrap()
    }

    fn square() -> Evaluation {
        let engine = ClosureFormulaEngine::new().define("x0^2", |x, _| Ok(x[0] * x[0]));
        Evaluation::analytic(
            Description::from(vec!["x0"]),
            Description::from(vec!["y0"]),
            vec!["x0^2".to_string()],
            Arc::new(engine),
        )
        .unwrap()
    }

    /// An evaluation that fails at every point.
    fn poisoned(dimension: usize) -> Evaluation {
        let engine =
            ClosureFormulaEngine::new().define("boom", |_, _| Err("model exploded".to_string()));
        Evaluation::analytic(
            Description::default_labels("x", dimension),
            Description::from(vec!["y0"]),
            vec!["boom".to_string()],
            Arc::new(engine),
        )
        .unwrap()
    }

    #[test]
    fn affine_scenario_has_exact_derivatives() {
        let f = affine();
        assert_eq!(f.evaluate(&Point::zeros(2)).unwrap().as_slice(), &[3.0]);
        assert_eq!(
            f.evaluate(&Point::from(vec![1.0, 1.0])).unwrap().as_slice(),
            &[6.0]
        );
        let g = f.gradient(&Point::from(vec![-4.0, 11.0])).unwrap();
        assert_eq!(g.get(0, 0), 1.0);
        assert_eq!(g.get(1, 0), 2.0);
        let h = f.hessian(&Point::zeros(2)).unwrap();
        assert_eq!(h.get(0, 1, 0), 0.0);
        assert!(f.is_linear());
        assert!(!f.uses_default_gradient());
    }

    #[test]
    fn synthesized_gradient_approximates_the_derivative() {
        let f = Function::new(square());
        assert!(f.uses_default_gradient());
        let g = f.gradient(&Point::from(vec![3.0])).unwrap();
        assert_relative_eq!(g.get(0, 0), 6.0, epsilon = 1e-6);
    }

    #[test]
    fn failing_primary_gradient_falls_back_to_finite_differences() {
        // The gradient is wired to an evaluation that always fails;
        // the fallback runs over the healthy one.
        let f = Function::with_derivatives(
            square(),
            Gradient::centered_finite_difference(poisoned(1), 1e-5),
            Hessian::constant(SymmetricTensor::zeros(1, 1)),
        )
        .unwrap();
        let g = f.gradient(&Point::from(vec![2.0])).unwrap();
        assert_relative_eq!(g.get(0, 0), 4.0, epsilon = 1e-6);
    }

    #[test]
    fn double_failure_surfaces_as_internal_error() {
        let f = Function::new(poisoned(2));
        let err = f.gradient(&Point::from(vec![1.0, 2.0])).err().unwrap();
        match err {
            FunctionError::InternalError(message) => {
                assert!(message.contains("[1, 2]"), "message was: {message}");
            }
            other => panic!("expected InternalError, got {other:?}"),
        }
    }

    #[test]
    fn dimension_mismatch_is_not_laundered_by_the_fallback() {
        let f = Function::new(square());
        let err = f.gradient(&Point::zeros(3)).err().unwrap();
        assert!(matches!(err, FunctionError::DimensionMismatch { .. }));
    }

    #[test]
    fn explicit_member_dimensions_are_cross_validated() {
        let err = Function::with_derivatives(
            square(),
            Gradient::constant(Matrix::zeros(2, 1)),
            Hessian::constant(SymmetricTensor::zeros(1, 1)),
        )
        .err()
        .unwrap();
        assert!(matches!(err, FunctionError::InvalidArgument(_)));
    }

    #[test]
    fn counters_are_kept_per_capability() {
        let f = affine();
        f.evaluate(&Point::zeros(2)).unwrap();
        f.evaluate(&Point::zeros(2)).unwrap();
        f.gradient(&Point::zeros(2)).unwrap();
        assert_eq!(f.call_count(), 2);
        assert_eq!(f.evaluation_call_count(), 2);
        assert_eq!(f.gradient_call_count(), 1);
        assert_eq!(f.hessian_call_count(), 0);
    }

    #[test]
    fn marginal_of_explicit_derivatives_marginalizes_them() {
        // Two outputs: y0 = 3 + x0, y1 = -1 + 2·x1.
        let f = Function::linear(
            Point::zeros(2),
            Point::from(vec![3.0, -1.0]),
            Matrix::from_vec(2, 2, vec![1.0, 0.0, 0.0, 2.0]).unwrap(),
        )
        .unwrap();
        let m = f.marginal(1).unwrap();
        assert_eq!(m.output_dimension(), 1);
        assert_eq!(
            m.evaluate(&Point::from(vec![5.0, 1.0])).unwrap().as_slice(),
            &[1.0]
        );
        let g = m.gradient(&Point::zeros(2)).unwrap();
        assert_eq!(g.get(0, 0), 0.0);
        assert_eq!(g.get(1, 0), 2.0);
        assert!(!m.uses_default_gradient());
        assert_eq!(m.call_count(), 0);
    }

    #[test]
    fn strict_policy_rejects_parameters_on_constant_members() {
        let engine = ClosureFormulaEngine::new().define("a * x0", |x, p| Ok(p[0].1 * x[0]));
        let evaluation = Evaluation::analytic_with_parameters(
            Description::from(vec!["x0"]),
            vec![("a".to_string(), 2.0)],
            Description::from(vec!["y0"]),
            vec!["a * x0".to_string()],
            Arc::new(engine),
        )
        .unwrap();
        let mut strict = Function::with_derivatives(
            evaluation.clone(),
            Gradient::constant(Matrix::zeros(1, 1)),
            Hessian::constant(SymmetricTensor::zeros(1, 1)),
        )
        .unwrap();
        let err = strict.set_parameter(&Point::from(vec![5.0])).err().unwrap();
        assert!(matches!(err, FunctionError::NotImplemented { .. }));

        let lenient_config = Config {
            parameter_policy: ParameterPolicy::Lenient,
            ..Config::default()
        };
        let mut lenient = Function::with_derivatives_and_config(
            evaluation,
            Gradient::constant(Matrix::zeros(1, 1)),
            Hessian::constant(SymmetricTensor::zeros(1, 1)),
            lenient_config,
        )
        .unwrap();
        lenient.set_parameter(&Point::from(vec![5.0])).unwrap();
        assert_eq!(lenient.parameter().as_slice(), &[5.0]);
        assert_eq!(
            lenient.evaluate(&Point::from(vec![1.0])).unwrap().as_slice(),
            &[5.0]
        );
    }

    #[test]
    fn synthesized_members_follow_parameter_updates() {
        let engine = ClosureFormulaEngine::new().define("a * x0", |x, p| Ok(p[0].1 * x[0]));
        let mut f = Function::analytic_with_parameters(
            Description::from(vec!["x0"]),
            vec![("a".to_string(), 2.0)],
            Description::from(vec!["y0"]),
            vec!["a * x0".to_string()],
            Arc::new(engine),
        )
        .unwrap();
        f.set_parameter(&Point::from(vec![10.0])).unwrap();
        let g = f.gradient(&Point::from(vec![1.0])).unwrap();
        assert_relative_eq!(g.get(0, 0), 10.0, epsilon = 1e-6);
    }
}
