//! Numeric kernels operating on [`crate::Tensor`].

pub mod manipulation;
pub mod normalization;
pub mod reduction;

pub use manipulation::{chunk_axis, reverse};
pub use normalization::{batch_norm, group_norm, instance_norm, layer_norm, RunningStats};
pub use reduction::{mean, norm_except, sum, variance};
