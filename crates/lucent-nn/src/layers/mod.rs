//! Layer implementations, grouped by family.

pub mod normalization;

pub use normalization::{BatchNorm, GroupNorm, InstanceNorm, LayerNorm, WeightNorm};
