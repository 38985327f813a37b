//! Formula-engine interface used by analytic evaluations.
//!
//! The engine itself is an external collaborator: this crate only
//! compiles formula strings through [`FormulaEngine`] and evaluates
//! the result through [`CompiledFormula`]. A registry-backed
//! [`ClosureFormulaEngine`] ships in-tree for tests and for embedding
//! native closures without a parser.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use aleator_types::{Description, Point, Sample};

use crate::error::{FunctionError, Result};

/// A set of formulas compiled against fixed input variables and
/// parameter values.
pub trait CompiledFormula: Send + Sync {
    /// Number of values produced per evaluation.
    fn output_dimension(&self) -> usize;

    /// Evaluates every formula at one point.
    fn evaluate(&self, x: &Point) -> Result<Point>;

    /// Evaluates every formula over a batch, row by row unless the
    /// engine provides something better.
    fn evaluate_sample(&self, sample: &Sample) -> Result<Sample> {
        let mut out = Sample::new(self.output_dimension());
        for i in 0..sample.size() {
            out.push_point(&self.evaluate(&sample.point(i))?)?;
        }
        Ok(out)
    }
}

/// Compiles formula strings against named inputs and parameters.
///
/// Engines are consumed as black boxes: any failure they report is
/// surfaced as [`FunctionError::FormulaEngine`] without
/// interpretation.
pub trait FormulaEngine: Send + Sync {
    fn compile(
        &self,
        inputs: &Description,
        parameters: &[(String, f64)],
        formulas: &[String],
    ) -> Result<Box<dyn CompiledFormula>>;
}

type FormulaFn = dyn Fn(&[f64], &[(String, f64)]) -> std::result::Result<f64, String> + Send + Sync;

/// A formula engine backed by named closures.
///
/// Each registered name stands for one scalar formula over the input
/// components and the current parameter values. Compiling a formula
/// list resolves every string against the registry; unknown names fail
/// the compilation.
#[derive(Clone, Default)]
pub struct ClosureFormulaEngine {
    definitions: HashMap<String, Arc<FormulaFn>>,
}

impl ClosureFormulaEngine {
    pub fn new() -> Self {
        ClosureFormulaEngine::default()
    }

    /// Registers `formula` as the name of a scalar closure.
    pub fn define<F>(mut self, formula: &str, body: F) -> Self
    where
        F: Fn(&[f64], &[(String, f64)]) -> std::result::Result<f64, String>
            + Send
            + Sync
            + 'static,
    {
        self.definitions.insert(formula.to_string(), Arc::new(body));
        self
    }
}

impl fmt::Debug for ClosureFormulaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ClosureFormulaEngine")
            .field("formulas", &names)
            .finish()
    }
}

impl FormulaEngine for ClosureFormulaEngine {
    fn compile(
        &self,
        inputs: &Description,
        parameters: &[(String, f64)],
        formulas: &[String],
    ) -> Result<Box<dyn CompiledFormula>> {
        let mut bodies = Vec::with_capacity(formulas.len());
        for formula in formulas {
            let body = self.definitions.get(formula).ok_or_else(|| {
                FunctionError::FormulaEngine(format!("unknown formula '{formula}'"))
            })?;
            bodies.push(Arc::clone(body));
        }
        Ok(Box::new(CompiledClosures {
            input_dimension: inputs.len(),
            parameters: parameters.to_vec(),
            bodies,
        }))
    }
}

struct CompiledClosures {
    input_dimension: usize,
    parameters: Vec<(String, f64)>,
    bodies: Vec<Arc<FormulaFn>>,
}

impl CompiledFormula for CompiledClosures {
    fn output_dimension(&self) -> usize {
        self.bodies.len()
    }

    fn evaluate(&self, x: &Point) -> Result<Point> {
        if x.dimension() != self.input_dimension {
            return Err(FunctionError::dimension(
                "compiled formula input",
                self.input_dimension,
                x.dimension(),
            ));
        }
        let mut values = Vec::with_capacity(self.bodies.len());
        for body in &self.bodies {
            values.push(body(x.as_slice(), &self.parameters).map_err(FunctionError::FormulaEngine)?);
        }
        Ok(Point::from(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ClosureFormulaEngine {
        ClosureFormulaEngine::new()
            .define("x0 + x1", |x, _| Ok(x[0] + x[1]))
            .define("a * x0", |x, params| {
                let a = params
                    .iter()
                    .find(|(name, _)| name == "a")
                    .map(|(_, value)| *value)
                    .ok_or_else(|| "parameter 'a' is not bound".to_string())?;
                Ok(a * x[0])
            })
    }

    #[test]
    fn compiles_and_evaluates_registered_formulas() {
        let inputs = Description::from(vec!["x0", "x1"]);
        let compiled = engine()
            .compile(&inputs, &[], &["x0 + x1".to_string()])
            .unwrap();
        let y = compiled.evaluate(&Point::from(vec![2.0, 3.0])).unwrap();
        assert_eq!(y.as_slice(), &[5.0]);
    }

    #[test]
    fn parameters_are_read_at_call_time() {
        let inputs = Description::from(vec!["x0", "x1"]);
        let compiled = engine()
            .compile(&inputs, &[("a".to_string(), 4.0)], &["a * x0".to_string()])
            .unwrap();
        let y = compiled.evaluate(&Point::from(vec![2.0, 0.0])).unwrap();
        assert_eq!(y.as_slice(), &[8.0]);
    }

    #[test]
    fn unknown_formula_fails_compilation() {
        let inputs = Description::from(vec!["x0"]);
        let err = engine()
            .compile(&inputs, &[], &["nope".to_string()])
            .err()
            .unwrap();
        assert!(matches!(err, FunctionError::FormulaEngine(_)));
    }

    #[test]
    fn missing_parameter_surfaces_the_engine_message() {
        let inputs = Description::from(vec!["x0", "x1"]);
        let compiled = engine()
            .compile(&inputs, &[], &["a * x0".to_string()])
            .unwrap();
        let err = compiled.evaluate(&Point::from(vec![1.0, 1.0])).err().unwrap();
        assert_eq!(
            err,
            FunctionError::FormulaEngine("parameter 'a' is not bound".to_string())
        );
    }
}
