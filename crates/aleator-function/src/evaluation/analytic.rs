//! Formula-backed evaluation kind.

use std::fmt;
use std::sync::Arc;

use aleator_types::{Description, Indices, Point, Sample};

use crate::error::{FunctionError, Result};
use crate::formula::{CompiledFormula, FormulaEngine};

/// Evaluation delegating to formulas compiled by an external engine.
///
/// Construction binds one formula per output label against the named
/// inputs and the current parameter values. Updating a parameter
/// recompiles, so the engine always sees the values in effect.
#[derive(Clone)]
pub struct AnalyticEvaluation {
    inputs: Description,
    outputs: Description,
    formulas: Vec<String>,
    parameters: Vec<(String, f64)>,
    engine: Arc<dyn FormulaEngine>,
    compiled: Arc<dyn CompiledFormula>,
}

impl AnalyticEvaluation {
    pub fn new(
        inputs: Description,
        outputs: Description,
        formulas: Vec<String>,
        engine: Arc<dyn FormulaEngine>,
    ) -> Result<Self> {
        AnalyticEvaluation::with_parameters(inputs, Vec::new(), outputs, formulas, engine)
    }

    pub fn with_parameters(
        inputs: Description,
        parameters: Vec<(String, f64)>,
        outputs: Description,
        formulas: Vec<String>,
        engine: Arc<dyn FormulaEngine>,
    ) -> Result<Self> {
        if formulas.len() != outputs.len() {
            return Err(FunctionError::dimension(
                "analytic formula count",
                outputs.len(),
                formulas.len(),
            ));
        }
        let compiled: Arc<dyn CompiledFormula> =
            engine.compile(&inputs, &parameters, &formulas)?.into();
        Ok(AnalyticEvaluation {
            inputs,
            outputs,
            formulas,
            parameters,
            engine,
            compiled,
        })
    }

    pub fn input_dimension(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_dimension(&self) -> usize {
        self.outputs.len()
    }

    pub fn inputs(&self) -> &Description {
        &self.inputs
    }

    pub fn outputs(&self) -> &Description {
        &self.outputs
    }

    pub fn formulas(&self) -> &[String] {
        &self.formulas
    }

    /// Current parameter values, in registration order.
    pub fn parameter(&self) -> Point {
        Point::from(
            self.parameters
                .iter()
                .map(|(_, value)| *value)
                .collect::<Vec<_>>(),
        )
    }

    /// Parameter names, in registration order.
    pub fn parameter_description(&self) -> Description {
        Description::from(
            self.parameters
                .iter()
                .map(|(name, _)| name.clone())
                .collect::<Vec<_>>(),
        )
    }

    /// Rebinds the parameter values and recompiles the formulas.
    pub(crate) fn set_parameter(&mut self, p: &Point) -> Result<()> {
        if p.dimension() != self.parameters.len() {
            return Err(FunctionError::dimension(
                "analytic parameter",
                self.parameters.len(),
                p.dimension(),
            ));
        }
        if self.parameters.is_empty() {
            return Ok(());
        }
        for (slot, value) in self.parameters.iter_mut().zip(p.iter()) {
            slot.1 = *value;
        }
        self.compiled = self
            .engine
            .compile(&self.inputs, &self.parameters, &self.formulas)?
            .into();
        Ok(())
    }

    pub(crate) fn evaluate(&self, x: &Point) -> Result<Point> {
        let y = self.compiled.evaluate(x)?;
        if y.dimension() != self.outputs.len() {
            return Err(FunctionError::InternalError(format!(
                "formula engine produced dimension {} where {} was declared",
                y.dimension(),
                self.outputs.len()
            )));
        }
        Ok(y)
    }

    pub(crate) fn evaluate_sample(&self, sample: &Sample) -> Result<Sample> {
        let out = self.compiled.evaluate_sample(sample)?;
        if out.dimension() != self.outputs.len() || out.size() != sample.size() {
            return Err(FunctionError::InternalError(format!(
                "formula engine produced a {}x{} sample where {}x{} was declared",
                out.size(),
                out.dimension(),
                sample.size(),
                self.outputs.len()
            )));
        }
        Ok(out)
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<AnalyticEvaluation> {
        let outputs = self.outputs.select(indices)?;
        let formulas = indices
            .iter()
            .map(|&i| self.formulas[i].clone())
            .collect();
        AnalyticEvaluation::with_parameters(
            self.inputs.clone(),
            self.parameters.clone(),
            outputs,
            formulas,
            Arc::clone(&self.engine),
        )
    }
}

impl fmt::Debug for AnalyticEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticEvaluation")
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("formulas", &self.formulas)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
