//! Function layer of the Aleator uncertainty toolkit.
//!
//! A [`Function`] bundles three capabilities behind one calling
//! surface: an [`Evaluation`], a [`Gradient`] and a [`Hessian`]. Each
//! capability is a closed sum type over concrete kinds (algebraic
//! forms, compiled formulas, reference databases, mixtures,
//! compositions); extension happens behind collaborator traits
//! ([`FormulaEngine`], [`NearestNeighbour`]) and through composition.
//!
//! Derivatives not supplied at construction are synthesized by
//! centered finite differences, and a failing explicit derivative
//! falls back to the same scheme with a logged warning. Compositions
//! that route points through field realizations stream batches in
//! fixed-size blocks to bound peak memory.
//!
//! # Modules
//!
//! - `function`: the three-capability aggregate with fallback
//! - `evaluation`: evaluation kinds and the counting wrapper
//! - `gradient`, `hessian`: derivative kinds and wrappers
//! - `finite_difference`: centered-difference synthesis kernels
//! - `field`: functions whose input or output is a field over a mesh
//! - `formula`: the engine trait behind analytic evaluations
//! - `nearest`: the spatial index trait behind database evaluations
//! - `config`: injected defaults (epsilons, block sizes, policies)

pub mod config;
pub mod error;
pub mod evaluation;
pub mod field;
pub mod finite_difference;
pub mod formula;
pub mod function;
pub mod gradient;
pub mod hessian;
mod history;
pub mod nearest;

// Re-exports
pub use config::{Config, ParameterPolicy};
pub use error::{FunctionError, Result};
pub use evaluation::{
    AnalyticEvaluation, ConstantEvaluation, DatabaseEvaluation, Evaluation, EvaluationKind,
    LinearEvaluation, MixtureOfExpertsEvaluation, PointToPointEvaluation, QuadraticEvaluation,
};
pub use field::{
    FieldFunction, FieldToPointConnection, FieldToPointFunction, PointToFieldFunction,
};
pub use finite_difference::{CenteredFiniteDifferenceGradient, CenteredFiniteDifferenceHessian};
pub use formula::{ClosureFormulaEngine, CompiledFormula, FormulaEngine};
pub use function::Function;
pub use gradient::{ConstantGradient, Gradient, GradientKind, LinearGradient};
pub use hessian::{ConstantHessian, Hessian, HessianKind};
pub use nearest::{BruteForceNearestNeighbour, NearestNeighbour};
