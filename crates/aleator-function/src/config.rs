//! Numeric and behavioural knobs, passed explicitly to the
//! constructors that need them.
//!
//! There is no global registry: a [`Config`] travels by value into
//! [`crate::function::Function`] and the composition constructors, and
//! whatever it contained at construction time stays in effect for the
//! lifetime of the object.

use crate::error::{FunctionError, Result};

/// How [`crate::function::Function::set_parameter`] treats members that
/// reject a parameter update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterPolicy {
    /// Fail on the first member that rejects the update.
    Strict,
    /// Skip members that do not support parameters; still fail on any
    /// other error.
    Lenient,
}

/// Tunable defaults for derivatives, block streaming and caching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Step used by the centered finite-difference gradient.
    pub gradient_epsilon: f64,
    /// Step used by the centered finite-difference hessian.
    pub hessian_epsilon: f64,
    /// Largest number of points held in flight by a through-field
    /// point composition.
    pub point_block_size: usize,
    /// Largest number of field realizations held in flight by a
    /// field-to-point connection.
    pub field_block_size: usize,
    /// Whether database evaluations built from this config start with
    /// the exact-match cache armed.
    pub database_cache: bool,
    /// Parameter propagation policy for function aggregates.
    pub parameter_policy: ParameterPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gradient_epsilon: 1e-5,
            hessian_epsilon: 1e-4,
            point_block_size: 256,
            field_block_size: 256,
            database_cache: false,
            parameter_policy: ParameterPolicy::Strict,
        }
    }
}

impl Config {
    /// Rejects steps and block sizes that would make the consumers
    /// divide by zero or spin without progress.
    pub fn validate(&self) -> Result<()> {
        if !(self.gradient_epsilon.is_finite() && self.gradient_epsilon > 0.0) {
            return Err(FunctionError::InvalidArgument(format!(
                "gradient epsilon must be finite and positive, got {}",
                self.gradient_epsilon
            )));
        }
        if !(self.hessian_epsilon.is_finite() && self.hessian_epsilon > 0.0) {
            return Err(FunctionError::InvalidArgument(format!(
                "hessian epsilon must be finite and positive, got {}",
                self.hessian_epsilon
            )));
        }
        if self.point_block_size == 0 {
            return Err(FunctionError::InvalidArgument(
                "point block size must be at least 1".to_string(),
            ));
        }
        if self.field_block_size == 0 {
            return Err(FunctionError::InvalidArgument(
                "field block size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
