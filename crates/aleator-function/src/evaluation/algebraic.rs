//! Constant, linear and quadratic evaluation kinds.

use aleator_types::{Indices, Matrix, Point, SymmetricTensor};

use crate::error::{FunctionError, Result};

/// Evaluation returning the same value at every point.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantEvaluation {
    input_dimension: usize,
    value: Point,
}

impl ConstantEvaluation {
    pub fn new(value: Point, input_dimension: usize) -> Self {
        ConstantEvaluation {
            input_dimension,
            value,
        }
    }

    pub fn input_dimension(&self) -> usize {
        self.input_dimension
    }

    pub fn output_dimension(&self) -> usize {
        self.value.dimension()
    }

    pub fn value(&self) -> &Point {
        &self.value
    }

    pub(crate) fn evaluate(&self) -> Point {
        self.value.clone()
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> ConstantEvaluation {
        ConstantEvaluation::new(select_components(&self.value, indices), self.input_dimension)
    }
}

/// `f(x) = constant + linearᵀ·(x − center)`.
///
/// The linear term is stored input-by-output, so it doubles as the
/// exact gradient of the evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearEvaluation {
    center: Point,
    constant: Point,
    linear: Matrix,
}

impl LinearEvaluation {
    pub fn new(center: Point, constant: Point, linear: Matrix) -> Result<Self> {
        if linear.rows() != center.dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "linear term has {} rows but the center has dimension {}",
                linear.rows(),
                center.dimension()
            )));
        }
        if linear.cols() != constant.dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "linear term has {} columns but the constant has dimension {}",
                linear.cols(),
                constant.dimension()
            )));
        }
        Ok(LinearEvaluation {
            center,
            constant,
            linear,
        })
    }

    pub fn input_dimension(&self) -> usize {
        self.center.dimension()
    }

    pub fn output_dimension(&self) -> usize {
        self.constant.dimension()
    }

    pub fn center(&self) -> &Point {
        &self.center
    }

    pub fn constant(&self) -> &Point {
        &self.constant
    }

    pub fn linear(&self) -> &Matrix {
        &self.linear
    }

    pub(crate) fn evaluate(&self, x: &Point) -> Point {
        let shift = x - &self.center;
        &self.constant + &self.linear.transpose_apply(&shift)
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<LinearEvaluation> {
        LinearEvaluation::new(
            self.center.clone(),
            select_components(&self.constant, indices),
            self.linear.select_columns(indices)?,
        )
    }
}

/// `f(x) = constant + linearᵀ·Δ + 0.5·Δᵀ·quadratic·Δ` with `Δ = x − center`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticEvaluation {
    center: Point,
    constant: Point,
    linear: Matrix,
    quadratic: SymmetricTensor,
}

impl QuadraticEvaluation {
    pub fn new(
        center: Point,
        constant: Point,
        linear: Matrix,
        quadratic: SymmetricTensor,
    ) -> Result<Self> {
        if linear.rows() != center.dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "linear term has {} rows but the center has dimension {}",
                linear.rows(),
                center.dimension()
            )));
        }
        if linear.cols() != constant.dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "linear term has {} columns but the constant has dimension {}",
                linear.cols(),
                constant.dimension()
            )));
        }
        if quadratic.dimension() != center.dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "quadratic term has dimension {} but the center has dimension {}",
                quadratic.dimension(),
                center.dimension()
            )));
        }
        if quadratic.sheet_count() != constant.dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "quadratic term has {} sheets but the constant has dimension {}",
                quadratic.sheet_count(),
                constant.dimension()
            )));
        }
        Ok(QuadraticEvaluation {
            center,
            constant,
            linear,
            quadratic,
        })
    }

    pub fn input_dimension(&self) -> usize {
        self.center.dimension()
    }

    pub fn output_dimension(&self) -> usize {
        self.constant.dimension()
    }

    pub fn center(&self) -> &Point {
        &self.center
    }

    pub fn constant(&self) -> &Point {
        &self.constant
    }

    pub fn linear(&self) -> &Matrix {
        &self.linear
    }

    pub fn quadratic(&self) -> &SymmetricTensor {
        &self.quadratic
    }

    pub(crate) fn evaluate(&self, x: &Point) -> Point {
        let shift = x - &self.center;
        let mut out = &self.constant + &self.linear.transpose_apply(&shift);
        for k in 0..self.output_dimension() {
            let mut acc = 0.0;
            for i in 0..shift.dimension() {
                for j in 0..shift.dimension() {
                    acc += self.quadratic.get(i, j, k) * shift[i] * shift[j];
                }
            }
            out[k] += 0.5 * acc;
        }
        out
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<QuadraticEvaluation> {
        QuadraticEvaluation::new(
            self.center.clone(),
            select_components(&self.constant, indices),
            self.linear.select_columns(indices)?,
            self.quadratic.select_sheets(indices)?,
        )
    }
}

/// Components of `p` addressed by `indices`, which the caller has
/// already validated against the point dimension.
fn select_components(p: &Point, indices: &Indices) -> Point {
    Point::from(indices.iter().map(|&i| p[i]).collect::<Vec<_>>())
}
