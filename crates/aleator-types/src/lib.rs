//! Dense value types for the Aleator uncertainty toolkit.
//!
//! Points, samples, matrices, symmetric tensors, meshes and fields,
//! plus the index/label bookkeeping the function layer builds on.
//! Every type serializes through serde so storage collaborators can
//! round-trip attributes without knowing their internals.

pub mod description;
pub mod error;
pub mod field;
pub mod indices;
pub mod matrix;
pub mod mesh;
pub mod point;
pub mod sample;
pub mod tensor;

// Re-exports
pub use description::Description;
pub use error::ShapeError;
pub use field::{Field, ProcessSample};
pub use indices::Indices;
pub use matrix::Matrix;
pub use mesh::Mesh;
pub use point::Point;
pub use sample::Sample;
pub use tensor::SymmetricTensor;
