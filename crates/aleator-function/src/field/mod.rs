//! Functions whose input or output is a field over a mesh.

mod connection;
mod field_function;
mod field_to_point;
mod point_to_field;

pub use connection::FieldToPointConnection;
pub use field_function::{
    FieldFunction, FieldFunctionKind, ValueMapEvaluation, VertexValueMapEvaluation,
};
pub use field_to_point::{FieldToPointFunction, FieldToPointKind, VertexMeanEvaluation};
pub use point_to_field::{
    PointToFieldFunction, PointToFieldKind, VertexBroadcastEvaluation, VertexParametricEvaluation,
};
