//! Tracked-array representations and compatibility shims.
//!
//! A reverse-mode backend can view a tensor of tracked intermediates two
//! ways: one tracked array ([`TrackedTensor`]), or an array whose elements
//! are each tracked on their own (`Tensor<Tracked<T>>`). Most of the
//! workspace assumes the former; the [`compat`] module adapts generic
//! operations that would otherwise fail or silently misbehave on the
//! array-of-trackables form, repacking their results into the tracked-array
//! convention.

pub mod compat;
pub mod tracked;

pub use tracked::{Tracked, TrackedTensor};
