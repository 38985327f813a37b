//! The hessian capability and its concrete kinds.

use std::sync::atomic::{AtomicUsize, Ordering};

use aleator_types::{Indices, Point, SymmetricTensor};

use crate::error::{FunctionError, Result};
use crate::evaluation::{check_marginal, Evaluation};
use crate::finite_difference::CenteredFiniteDifferenceHessian;

/// Hessian fixed at every point, the exact hessian of a quadratic
/// function and the zero tensor for affine ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantHessian {
    tensor: SymmetricTensor,
}

impl ConstantHessian {
    pub fn new(tensor: SymmetricTensor) -> Self {
        ConstantHessian { tensor }
    }

    pub fn tensor(&self) -> &SymmetricTensor {
        &self.tensor
    }

    pub fn input_dimension(&self) -> usize {
        self.tensor.dimension()
    }

    pub fn output_dimension(&self) -> usize {
        self.tensor.sheet_count()
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<ConstantHessian> {
        Ok(ConstantHessian::new(self.tensor.select_sheets(indices)?))
    }
}

/// The closed set of hessian implementations.
#[derive(Debug, Clone)]
pub enum HessianKind {
    Constant(ConstantHessian),
    CenteredFiniteDifference(CenteredFiniteDifferenceHessian),
}

impl HessianKind {
    pub fn input_dimension(&self) -> usize {
        match self {
            HessianKind::Constant(h) => h.input_dimension(),
            HessianKind::CenteredFiniteDifference(h) => h.input_dimension(),
        }
    }

    pub fn output_dimension(&self) -> usize {
        match self {
            HessianKind::Constant(h) => h.output_dimension(),
            HessianKind::CenteredFiniteDifference(h) => h.output_dimension(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HessianKind::Constant(_) => "constant",
            HessianKind::CenteredFiniteDifference(_) => "centered finite-difference",
        }
    }

    fn hessian(&self, x: &Point) -> Result<SymmetricTensor> {
        match self {
            HessianKind::Constant(h) => Ok(h.tensor().clone()),
            HessianKind::CenteredFiniteDifference(h) => h.hessian(x),
        }
    }

    fn marginal(&self, indices: &Indices) -> Result<HessianKind> {
        match self {
            HessianKind::Constant(h) => Ok(HessianKind::Constant(h.marginal(indices)?)),
            HessianKind::CenteredFiniteDifference(h) => Ok(
                HessianKind::CenteredFiniteDifference(h.marginal(indices)?),
            ),
        }
    }
}

/// The hessian capability, with its own call counter independent of
/// the evaluation's and the gradient's.
#[derive(Debug)]
pub struct Hessian {
    kind: HessianKind,
    calls: AtomicUsize,
}

impl Hessian {
    pub fn new(kind: HessianKind) -> Self {
        Hessian {
            kind,
            calls: AtomicUsize::new(0),
        }
    }

    /// The same d×d×q tensor at every point.
    pub fn constant(tensor: SymmetricTensor) -> Self {
        Hessian::new(HessianKind::Constant(ConstantHessian::new(tensor)))
    }

    /// A centered finite-difference estimate over `evaluation`.
    pub fn centered_finite_difference(evaluation: Evaluation, epsilon: f64) -> Self {
        Hessian::new(HessianKind::CenteredFiniteDifference(
            CenteredFiniteDifferenceHessian::new(evaluation, epsilon),
        ))
    }

    pub fn kind(&self) -> &HessianKind {
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

    /// The d×d×q hessian at `x`, symmetric sheet by sheet.
    pub fn hessian(&self, x: &Point) -> Result<SymmetricTensor> {
        if x.dimension() != self.input_dimension() {
            return Err(FunctionError::dimension(
                "hessian input",
                self.input_dimension(),
                x.dimension(),
            ));
        }
        let tensor = self.kind.hessian(x)?;
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(tensor)
    }

    /// The hessian of the selected output components, with a fresh
    /// call counter.
    pub fn marginal(&self, indices: impl Into<Indices>) -> Result<Hessian> {
        let indices = indices.into();
        check_marginal(&indices, self.output_dimension())?;
        Ok(Hessian::new(self.kind.marginal(&indices)?))
    }

    /// Forwards the parameter vector to a finite-difference inner
    /// evaluation; the constant kind is non-parametric.
    pub fn set_parameter(&mut self, p: &Point) -> Result<()> {
        match &mut self.kind {
            HessianKind::CenteredFiniteDifference(h) => h.set_parameter(p),
            kind => {
                if p.is_empty() {
                    Ok(())
                } else {
                    Err(FunctionError::NotImplemented {
                        operation: format!("set_parameter on a {} hessian", kind.name()),
                    })
                }
            }
        }
    }
}

impl Clone for Hessian {
    fn clone(&self) -> Self {
        Hessian {
            kind: self.kind.clone(),
            calls: AtomicUsize::new(self.calls.load(Ordering::Relaxed)),
        }
    }
}
