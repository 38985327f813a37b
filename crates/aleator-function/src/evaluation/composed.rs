//! Point-to-point compositions.

use aleator_types::{Description, Indices, Point, Sample};

use crate::config::Config;
use crate::error::{FunctionError, Result};
use crate::field::{FieldToPointFunction, PointToFieldFunction};
use crate::function::Function;

/// A point function composed from two stages.
///
/// `OfFunctions` chains two point functions; batches run the whole
/// intermediate sample in one shot. `ThroughField` routes the point
/// through a field realization and back, the memory-heavy path, so
/// batches stream through fixed-size blocks instead of materializing
/// one field per row at once.
#[derive(Debug, Clone)]
pub enum PointToPointEvaluation {
    OfFunctions {
        left: Box<Function>,
        right: Box<Function>,
    },
    ThroughField {
        field_to_point: Box<FieldToPointFunction>,
        point_to_field: Box<PointToFieldFunction>,
        block_size: usize,
    },
}

impl PointToPointEvaluation {
    /// `left ∘ right`.
    pub fn of_functions(left: Function, right: Function) -> Result<Self> {
        if right.output_dimension() != left.input_dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "inner output dimension {} cannot feed an outer function of input dimension {}",
                right.output_dimension(),
                left.input_dimension()
            )));
        }
        Ok(PointToPointEvaluation::OfFunctions {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// `field_to_point ∘ point_to_field`. Batches stream through
    /// blocks of `config.point_block_size` rows.
    pub fn through_field(
        field_to_point: FieldToPointFunction,
        point_to_field: PointToFieldFunction,
        config: &Config,
    ) -> Result<Self> {
        config.validate()?;
        if point_to_field.output_dimension() != field_to_point.input_dimension() {
            return Err(FunctionError::InvalidArgument(format!(
                "field stage output dimension {} cannot feed a collapse of input dimension {}",
                point_to_field.output_dimension(),
                field_to_point.input_dimension()
            )));
        }
        if point_to_field.output_mesh() != field_to_point.input_mesh() {
            return Err(FunctionError::InvalidArgument(
                "field stage and collapse live on different meshes".to_string(),
            ));
        }
        Ok(PointToPointEvaluation::ThroughField {
            field_to_point: Box::new(field_to_point),
            point_to_field: Box::new(point_to_field),
            block_size: config.point_block_size,
        })
    }

    pub fn input_dimension(&self) -> usize {
        match self {
            PointToPointEvaluation::OfFunctions { right, .. } => right.input_dimension(),
            PointToPointEvaluation::ThroughField { point_to_field, .. } => {
                point_to_field.input_dimension()
            }
        }
    }

    pub fn output_dimension(&self) -> usize {
        match self {
            PointToPointEvaluation::OfFunctions { left, .. } => left.output_dimension(),
            PointToPointEvaluation::ThroughField { field_to_point, .. } => {
                field_to_point.output_dimension()
            }
        }
    }

    /// Affine only when both stages are; field round trips never are.
    pub fn is_linear(&self) -> bool {
        match self {
            PointToPointEvaluation::OfFunctions { left, right } => {
                left.is_linear() && right.is_linear()
            }
            PointToPointEvaluation::ThroughField { .. } => false,
        }
    }

    pub fn is_parallel(&self) -> bool {
        match self {
            PointToPointEvaluation::OfFunctions { left, right } => {
                left.is_parallel() && right.is_parallel()
            }
            PointToPointEvaluation::ThroughField { .. } => false,
        }
    }

    pub fn descriptions(&self) -> (Description, Description) {
        match self {
            PointToPointEvaluation::OfFunctions { left, right } => (
                right.input_description().clone(),
                left.output_description().clone(),
            ),
            PointToPointEvaluation::ThroughField {
                field_to_point,
                point_to_field,
                ..
            } => (
                point_to_field.input_description().clone(),
                field_to_point.output_description().clone(),
            ),
        }
    }

    pub(crate) fn evaluate(&self, x: &Point) -> Result<Point> {
        match self {
            PointToPointEvaluation::OfFunctions { left, right } => {
                left.evaluate(&right.evaluate(x)?)
            }
            PointToPointEvaluation::ThroughField {
                field_to_point,
                point_to_field,
                ..
            } => field_to_point.evaluate(&point_to_field.evaluate(x)?),
        }
    }

    pub(crate) fn evaluate_sample(&self, sample: &Sample) -> Result<Sample> {
        match self {
            PointToPointEvaluation::OfFunctions { left, right } => {
                left.evaluate_sample(&right.evaluate_sample(sample)?)
            }
            PointToPointEvaluation::ThroughField {
                field_to_point,
                point_to_field,
                block_size,
            } => {
                let size = sample.size();
                let mut out = Sample::zeros(size, field_to_point.output_dimension());
                let mut remaining = size;
                while remaining > 0 {
                    let current = remaining.min(*block_size);
                    // Blocks walk from the tail, filled in reverse row
                    // order; write-back restores original positions.
                    let mut block = Sample::new(point_to_field.input_dimension());
                    for i in 0..current {
                        block.push_row(sample.row(remaining - 1 - i))?;
                    }
                    let fields = point_to_field.evaluate_sample(&block)?;
                    let collapsed = field_to_point.evaluate_process_sample(&fields)?;
                    for i in 0..current {
                        out.set_row(remaining - 1 - i, collapsed.row(i))?;
                    }
                    remaining -= current;
                }
                Ok(out)
            }
        }
    }

    /// The composition producing only the selected output components,
    /// marginalizing the outer stage and leaving the inner one intact.
    pub(crate) fn marginal(&self, indices: &Indices) -> Result<PointToPointEvaluation> {
        match self {
            PointToPointEvaluation::OfFunctions { left, right } => {
                Ok(PointToPointEvaluation::OfFunctions {
                    left: Box::new(left.marginal(indices.clone())?),
                    right: right.clone(),
                })
            }
            PointToPointEvaluation::ThroughField {
                field_to_point,
                point_to_field,
                block_size,
            } => Ok(PointToPointEvaluation::ThroughField {
                field_to_point: Box::new(field_to_point.marginal(indices.clone())?),
                point_to_field: point_to_field.clone(),
                block_size: *block_size,
            }),
        }
    }

    /// Rebinds `[left ∥ right]`, split by each stage's parameter
    /// dimension. Field compositions carry no parameter.
    pub(crate) fn set_parameter(&mut self, p: &Point) -> Result<()> {
        match self {
            PointToPointEvaluation::OfFunctions { left, right } => {
                let left_dimension = left.parameter().dimension();
                let right_dimension = right.parameter().dimension();
                if p.dimension() != left_dimension + right_dimension {
                    return Err(FunctionError::dimension(
                        "composed parameter",
                        left_dimension + right_dimension,
                        p.dimension(),
                    ));
                }
                left.set_parameter(&Point::from(p.as_slice()[..left_dimension].to_vec()))?;
                right.set_parameter(&Point::from(p.as_slice()[left_dimension..].to_vec()))
            }
            PointToPointEvaluation::ThroughField { .. } => {
                if p.is_empty() {
                    Ok(())
                } else {
                    Err(FunctionError::NotImplemented {
                        operation: "set_parameter on a field composition".to_string(),
                    })
                }
            }
        }
    }

    /// `[left ∥ right]`; empty for field compositions.
    pub(crate) fn parameter(&self) -> Point {
        match self {
            PointToPointEvaluation::OfFunctions { left, right } => {
                let mut data = Vec::from(left.parameter());
                data.extend(Vec::from(right.parameter()));
                Point::from(data)
            }
            PointToPointEvaluation::ThroughField { .. } => Point::zeros(0),
        }
    }
}
