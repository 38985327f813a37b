//! The gradient capability and its concrete kinds.
//!
//! Gradients follow the transposed-Jacobian convention: a function
//! with input dimension d and output dimension q has a d×q gradient,
//! `G[i][k] = ∂f_k/∂x_i`.

use std::sync::atomic::{AtomicUsize, Ordering};

use aleator_types::{Indices, Matrix, Point, SymmetricTensor};

use crate::error::{FunctionError, Result};
use crate::evaluation::{check_marginal, Evaluation};
use crate::finite_difference::CenteredFiniteDifferenceGradient;

/// Gradient fixed at every point, the exact gradient of an affine
/// function.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantGradient {
    matrix: Matrix,
}

impl ConstantGradient {
    pub fn new(matrix: Matrix) -> Self {
        ConstantGradient { matrix }
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn input_dimension(&self) -> usize {
        self.matrix.rows()
    }

    pub fn output_dimension(&self) -> usize {
        self.matrix.cols()
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<ConstantGradient> {
        Ok(ConstantGradient::new(self.matrix.select_columns(indices)?))
    }
}

/// Gradient affine in the input, `G(x) = constant + quadratic·(x−center)`
/// sheet-wise. This is the exact gradient of a quadratic evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    center: Point,
    constant: Matrix,
    quadratic: SymmetricTensor,
}

impl LinearGradient {
    pub fn new(center: Point, constant: Matrix, quadratic: SymmetricTensor) -> Result<Self> {
        if constant.rows() != center.dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "constant term has {} rows but the center has dimension {}",
                constant.rows(),
                center.dimension()
            )));
        }
        if quadratic.dimension() != center.dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "quadratic term has dimension {} but the center has dimension {}",
                quadratic.dimension(),
                center.dimension()
            )));
        }
        if quadratic.sheet_count() != constant.cols() {
            return Err(FunctionError::InvalidArgument(format!(
                "quadratic term has {} sheets but the constant has {} columns",
                quadratic.sheet_count(),
                constant.cols()
            )));
        }
        Ok(LinearGradient {
            center,
            constant,
            quadratic,
        })
    }

    pub fn input_dimension(&self) -> usize {
        self.center.dimension()
    }

    pub fn output_dimension(&self) -> usize {
        self.constant.cols()
    }

    pub(crate) fn gradient(&self, x: &Point) -> Matrix {
        let shift = x - &self.center;
        let d = self.input_dimension();
        let q = self.output_dimension();
        let mut gradient = self.constant.clone();
        for i in 0..d {
            for k in 0..q {
                let mut acc = gradient.get(i, k);
                for j in 0..d {
                    acc += self.quadratic.get(i, j, k) * shift[j];
                }
                gradient.set(i, k, acc);
            }
        }
        gradient
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<LinearGradient> {
        LinearGradient::new(
            self.center.clone(),
            self.constant.select_columns(indices)?,
            self.quadratic.select_sheets(indices)?,
        )
    }
}

/// The closed set of gradient implementations.
#[derive(Debug, Clone)]
pub enum GradientKind {
    Constant(ConstantGradient),
    Linear(LinearGradient),
    CenteredFiniteDifference(CenteredFiniteDifferenceGradient),
}

impl GradientKind {
    pub fn input_dimension(&self) -> usize {
        match self {
            GradientKind::Constant(g) => g.input_dimension(),
            GradientKind::Linear(g) => g.input_dimension(),
            GradientKind::CenteredFiniteDifference(g) => g.input_dimension(),
        }
    }

    pub fn output_dimension(&self) -> usize {
        match self {
            GradientKind::Constant(g) => g.output_dimension(),
            GradientKind::Linear(g) => g.output_dimension(),
            GradientKind::CenteredFiniteDifference(g) => g.output_dimension(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GradientKind::Constant(_) => "constant",
            GradientKind::Linear(_) => "linear",
            GradientKind::CenteredFiniteDifference(_) => "centered finite-difference",
        }
    }

    fn gradient(&self, x: &Point) -> Result<Matrix> {
        match self {
            GradientKind::Constant(g) => Ok(g.matrix().clone()),
            GradientKind::Linear(g) => Ok(g.gradient(x)),
            GradientKind::CenteredFiniteDifference(g) => g.gradient(x),
        }
    }

    fn marginal(&self, indices: &Indices) -> Result<GradientKind> {
        match self {
            GradientKind::Constant(g) => Ok(GradientKind::Constant(g.marginal(indices)?)),
            GradientKind::Linear(g) => Ok(GradientKind::Linear(g.marginal(indices)?)),
            GradientKind::CenteredFiniteDifference(g) => Ok(
                GradientKind::CenteredFiniteDifference(g.marginal(indices)?),
            ),
        }
    }
}

/// The gradient capability, with its own call counter independent of
/// the evaluation's.
#[derive(Debug)]
pub struct Gradient {
    kind: GradientKind,
    calls: AtomicUsize,
}

impl Gradient {
    pub fn new(kind: GradientKind) -> Self {
        Gradient {
            kind,
            calls: AtomicUsize::new(0),
        }
    }

    /// The same d×q matrix at every point.
    pub fn constant(matrix: Matrix) -> Self {
        Gradient::new(GradientKind::Constant(ConstantGradient::new(matrix)))
    }

    /// The exact gradient of a quadratic evaluation.
    pub fn linear(center: Point, constant: Matrix, quadratic: SymmetricTensor) -> Result<Self> {
        Ok(Gradient::new(GradientKind::Linear(LinearGradient::new(
            center, constant, quadratic,
        )?)))
    }

    /// A centered finite-difference estimate over `evaluation`.
    pub fn centered_finite_difference(evaluation: Evaluation, epsilon: f64) -> Self {
        Gradient::new(GradientKind::CenteredFiniteDifference(
            CenteredFiniteDifferenceGradient::new(evaluation, epsilon),
        ))
    }

    pub fn kind(&self) -> &GradientKind {
        &self.kind
    }

    pub fn input_dimension(&self) -> usize {
        self.kind.input_dimension()
    }

    pub fn output_dimension(&self) -> usize {
        self.kind.output_dimension()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// The d×q gradient at `x`.
    pub fn gradient(&self, x: &Point) -> Result<Matrix> {
        if x.dimension() != self.input_dimension() {
            return Err(FunctionError::dimension(
                "gradient input",
                self.input_dimension(),
                x.dimension(),
            ));
        }
        let matrix = self.kind.gradient(x)?;
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(matrix)
    }

    /// The gradient of the selected output components, with a fresh
    /// call counter.
    pub fn marginal(&self, indices: impl Into<Indices>) -> Result<Gradient> {
        let indices = indices.into();
        check_marginal(&indices, self.output_dimension())?;
        Ok(Gradient::new(self.kind.marginal(&indices)?))
    }

    /// Forwards the parameter vector to a finite-difference inner
    /// evaluation; constant and linear kinds are non-parametric.
    pub fn set_parameter(&mut self, p: &Point) -> Result<()> {
        match &mut self.kind {
            GradientKind::CenteredFiniteDifference(g) => g.set_parameter(p),
            kind => {
                if p.is_empty() {
                    Ok(())
                } else {
                    Err(FunctionError::NotImplemented {
                        operation: format!("set_parameter on a {} gradient", kind.name()),
                    })
                }
            }
        }
    }
}

impl Clone for Gradient {
    fn clone(&self) -> Self {
        Gradient {
            kind: self.kind.clone(),
            calls: AtomicUsize::new(self.calls.load(Ordering::Relaxed)),
        }
    }
}
