//! Centered finite-difference derivative kernels.
//!
//! Both kernels evaluate their whole stencil through a single
//! `evaluate_sample` call, so vectorized or short-circuiting
//! evaluations benefit and the inner call counter advances by the
//! stencil size.

use aleator_types::{Indices, Matrix, Point, Sample, SymmetricTensor};

use crate::error::{FunctionError, Result};
use crate::evaluation::Evaluation;

/// Gradient estimate `∂f_k/∂x_i ≈ (f(x+ε·e_i)_k − f(x−ε·e_i)_k) / 2ε`.
#[derive(Debug, Clone)]
pub struct CenteredFiniteDifferenceGradient {
    evaluation: Evaluation,
    epsilon: f64,
}

impl CenteredFiniteDifferenceGradient {
    pub fn new(evaluation: Evaluation, epsilon: f64) -> Self {
        CenteredFiniteDifferenceGradient {
            evaluation,
            epsilon,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    pub fn input_dimension(&self) -> usize {
        self.evaluation.input_dimension()
    }

    pub fn output_dimension(&self) -> usize {
        self.evaluation.output_dimension()
    }

    /// Estimates the d×q transposed Jacobian at `x` from 2·d stencil
    /// points evaluated in one batch.
    pub fn gradient(&self, x: &Point) -> Result<Matrix> {
        let d = self.input_dimension();
        let q = self.output_dimension();
        if x.dimension() != d {
            return Err(FunctionError::dimension("gradient input", d, x.dimension()));
        }
        let mut stencil = Sample::new(d);
        for i in 0..d {
            stencil.push_point(&shifted(x, i, self.epsilon))?;
            stencil.push_point(&shifted(x, i, -self.epsilon))?;
        }
        let values = self.evaluation.evaluate_sample(&stencil)?;
        let scale = 1.0 / (2.0 * self.epsilon);
        let mut gradient = Matrix::zeros(d, q);
        for i in 0..d {
            let plus = values.row(2 * i);
            let minus = values.row(2 * i + 1);
            for k in 0..q {
                gradient.set(i, k, (plus[k] - minus[k]) * scale);
            }
        }
        Ok(gradient)
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<CenteredFiniteDifferenceGradient> {
        Ok(CenteredFiniteDifferenceGradient::new(
            self.evaluation.marginal(indices.clone())?,
            self.epsilon,
        ))
    }

    pub(crate) fn set_parameter(&mut self, p: &Point) -> Result<()> {
        self.evaluation.set_parameter(p)
    }
}

/// Hessian estimate with diagonal terms
/// `(f(x+2εe_i) − 2f(x) + f(x−2εe_i)) / 4ε²` and cross terms
/// `(f(x+εe_i+εe_j) − f(x+εe_i−εe_j) − f(x−εe_i+εe_j) + f(x−εe_i−εe_j)) / 4ε²`.
#[derive(Debug, Clone)]
pub struct CenteredFiniteDifferenceHessian {
    evaluation: Evaluation,
    epsilon: f64,
}

impl CenteredFiniteDifferenceHessian {
    pub fn new(evaluation: Evaluation, epsilon: f64) -> Self {
        CenteredFiniteDifferenceHessian {
            evaluation,
            epsilon,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    pub fn input_dimension(&self) -> usize {
        self.evaluation.input_dimension()
    }

    pub fn output_dimension(&self) -> usize {
        self.evaluation.output_dimension()
    }

    /// Estimates the d×d×q symmetric tensor at `x`. The stencil holds
    /// `x` itself, two points per diagonal entry and four per strict
    /// lower-triangle pair, all evaluated in one batch.
    pub fn hessian(&self, x: &Point) -> Result<SymmetricTensor> {
        let d = self.input_dimension();
        let q = self.output_dimension();
        if x.dimension() != d {
            return Err(FunctionError::dimension("hessian input", d, x.dimension()));
        }
        let mut stencil = Sample::new(d);
        stencil.push_point(x)?;
        for i in 0..d {
            stencil.push_point(&shifted(x, i, 2.0 * self.epsilon))?;
            stencil.push_point(&shifted(x, i, -2.0 * self.epsilon))?;
        }
        for i in 0..d {
            for j in 0..i {
                stencil.push_point(&shifted2(x, i, self.epsilon, j, self.epsilon))?;
                stencil.push_point(&shifted2(x, i, self.epsilon, j, -self.epsilon))?;
                stencil.push_point(&shifted2(x, i, -self.epsilon, j, self.epsilon))?;
                stencil.push_point(&shifted2(x, i, -self.epsilon, j, -self.epsilon))?;
            }
        }
        let values = self.evaluation.evaluate_sample(&stencil)?;
        let scale = 1.0 / (4.0 * self.epsilon * self.epsilon);
        let mut tensor = SymmetricTensor::zeros(d, q);
        let base = values.row(0);
        for i in 0..d {
            let plus = values.row(1 + 2 * i);
            let minus = values.row(2 + 2 * i);
            for k in 0..q {
                tensor.set(i, i, k, (plus[k] - 2.0 * base[k] + minus[k]) * scale);
            }
        }
        let mut cursor = 1 + 2 * d;
        for i in 0..d {
            for j in 0..i {
                let pp = values.row(cursor);
                let pm = values.row(cursor + 1);
                let mp = values.row(cursor + 2);
                let mm = values.row(cursor + 3);
                cursor += 4;
                for k in 0..q {
                    tensor.set(i, j, k, (pp[k] - pm[k] - mp[k] + mm[k]) * scale);
                }
            }
        }
        Ok(tensor)
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<CenteredFiniteDifferenceHessian> {
        Ok(CenteredFiniteDifferenceHessian::new(
            self.evaluation.marginal(indices.clone())?,
            self.epsilon,
        ))
    }

    pub(crate) fn set_parameter(&mut self, p: &Point) -> Result<()> {
        self.evaluation.set_parameter(p)
    }
}

fn shifted(x: &Point, i: usize, delta: f64) -> Point {
    let mut p = x.clone();
    p[i] += delta;
    p
}

fn shifted2(x: &Point, i: usize, delta_i: f64, j: usize, delta_j: f64) -> Point {
    let mut p = x.clone();
    p[i] += delta_i;
    p[j] += delta_j;
    p
}
