//! Composed collapse chains from fields to points.

use aleator_types::{Field, Indices, Mesh, Point, ProcessSample, Sample};

use crate::config::Config;
use crate::error::{FunctionError, Result};
use crate::field::field_function::FieldFunction;
use crate::field::field_to_point::FieldToPointFunction;
use crate::function::Function;

/// A field-to-point function composed from two stages.
///
/// `OfFunction` runs a point function after the collapse; batches
/// collapse every realization first and finish with a single point
/// batch. `OfFieldFunction` runs a field function before the collapse,
/// the memory-heavy stage, so batches stream through fixed-size blocks
/// instead of materializing every intermediate field at once.
#[derive(Debug, Clone)]
pub enum FieldToPointConnection {
    OfFunction {
        function: Box<Function>,
        field_to_point: Box<FieldToPointFunction>,
    },
    OfFieldFunction {
        field_to_point: Box<FieldToPointFunction>,
        field_function: Box<FieldFunction>,
        block_size: usize,
    },
}

impl FieldToPointConnection {
    /// `function ∘ field_to_point`, the point function last.
    pub fn of_function(function: Function, field_to_point: FieldToPointFunction) -> Result<Self> {
        if field_to_point.output_dimension() != function.input_dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "collapse output dimension {} cannot feed a function of input dimension {}",
                field_to_point.output_dimension(),
                function.input_dimension()
            )));
        }
        Ok(FieldToPointConnection::OfFunction {
            function: Box::new(function),
            field_to_point: Box::new(field_to_point),
        })
    }

    /// `field_to_point ∘ field_function`, the field function first.
    /// Batches stream through blocks of `config.field_block_size`
    /// realizations.
    pub fn of_field_function(
        field_to_point: FieldToPointFunction,
        field_function: FieldFunction,
        config: &Config,
    ) -> Result<Self> {
        config.validate()?;
        if field_function.output_dimension() != field_to_point.input_dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "field function output dimension {} cannot feed a collapse of input dimension {}",
                field_function.output_dimension(),
                field_to_point.input_dimension()
            )));
        }
        if field_function.mesh() != field_to_point.input_mesh() {
            return Err(FunctionError::InvalidArgument(
                "field function and collapse live on different meshes".to_string(),
            ));
        }
        Ok(FieldToPointConnection::OfFieldFunction {
            field_to_point: Box::new(field_to_point),
            field_function: Box::new(field_function),
            block_size: config.field_block_size,
        })
    }

    /// Dimension of the input field values.
    pub fn input_dimension(&self) -> usize {
        match self {
            FieldToPointConnection::OfFunction { field_to_point, .. } => {
                field_to_point.input_dimension()
            }
            FieldToPointConnection::OfFieldFunction { field_function, .. } => {
                field_function.input_dimension()
            }
        }
    }

    /// Dimension of the output point.
    pub fn output_dimension(&self) -> usize {
        match self {
            FieldToPointConnection::OfFunction { function, .. } => function.output_dimension(),
            FieldToPointConnection::OfFieldFunction { field_to_point, .. } => {
                field_to_point.output_dimension()
            }
        }
    }

    /// The mesh input fields live on.
    pub fn input_mesh(&self) -> &Mesh {
        match self {
            FieldToPointConnection::OfFunction { field_to_point, .. } => {
                field_to_point.input_mesh()
            }
            FieldToPointConnection::OfFieldFunction { field_function, .. } => field_function.mesh(),
        }
    }

    pub(crate) fn evaluate(&self, field: &Field) -> Result<Point> {
        match self {
            FieldToPointConnection::OfFunction {
                function,
                field_to_point,
            } => function.evaluate(&field_to_point.evaluate(field)?),
            FieldToPointConnection::OfFieldFunction {
                field_to_point,
                field_function,
                ..
            } => field_to_point.evaluate(&field_function.evaluate(field)?),
        }
    }

    pub(crate) fn evaluate_process_sample(&self, sample: &ProcessSample) -> Result<Sample> {
        match self {
            FieldToPointConnection::OfFunction {
                function,
                field_to_point,
            } => {
                let collapsed = field_to_point.evaluate_process_sample(sample)?;
                function.evaluate_sample(&collapsed)
            }
            FieldToPointConnection::OfFieldFunction {
                field_to_point,
                field_function,
                block_size,
            } => {
                let size = sample.size();
                let mut out = Sample::zeros(size, field_to_point.output_dimension());
                let mut remaining = size;
                while remaining > 0 {
                    let current = remaining.min(*block_size);
                    // Blocks walk from the tail, filled in reverse row
                    // order; write-back restores original positions.
                    let mut block =
                        ProcessSample::new(sample.mesh().clone(), sample.dimension());
                    for i in 0..current {
                        block.push_values(sample.values(remaining - 1 - i).clone())?;
                    }
                    let mapped = field_function.evaluate_process_sample(&block)?;
                    let collapsed = field_to_point.evaluate_process_sample(&mapped)?;
                    for i in 0..current {
                        out.set_row(remaining - 1 - i, collapsed.row(i))?;
                    }
                    remaining -= current;
                }
                Ok(out)
            }
        }
    }

    /// The connection producing only the selected output components,
    /// marginalizing the outer stage and leaving the inner one intact.
    pub(crate) fn marginal(&self, indices: &Indices) -> Result<FieldToPointConnection> {
        match self {
            FieldToPointConnection::OfFunction {
                function,
                field_to_point,
            } => Ok(FieldToPointConnection::OfFunction {
                function: Box::new(function.marginal(indices.clone())?),
                field_to_point: field_to_point.clone(),
            }),
            FieldToPointConnection::OfFieldFunction {
                field_to_point,
                field_function,
                block_size,
            } => Ok(FieldToPointConnection::OfFieldFunction {
                field_to_point: Box::new(field_to_point.marginal(indices.clone())?),
                field_function: field_function.clone(),
                block_size: *block_size,
            }),
        }
    }
}
