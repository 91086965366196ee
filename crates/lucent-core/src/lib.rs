//! Core tensor infrastructure for the lucent workspace.
//!
//! This crate holds the pieces the layer crates build on: a CPU tensor type
//! backed by `ndarray`, shape handling with numpy-style broadcasting, the
//! shared error type, and the numeric kernels (reductions, axis
//! manipulation, normalization statistics) that the layer definitions in
//! `lucent-nn` delegate to.

pub mod error;
pub mod ops;
pub mod shape;
pub mod tensor;

pub use error::{Result, TensorError};
pub use shape::Shape;
pub use tensor::{astype, Tensor};
