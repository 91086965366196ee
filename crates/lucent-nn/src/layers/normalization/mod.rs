//! Normalization layers.
//!
//! Four variants of one abstraction, differing in which axes the statistics
//! pool over and whether running statistics persist across calls, plus a
//! weight-normalization wrapper that reparameterizes another layer's
//! parameters into magnitude/direction pairs.
//!
//! All variants expect batch-first, channel-last inputs
//! (`[batch, spatial..., channels]`) and apply their configured elementwise
//! activation to the normalized result.

pub mod batch_norm;
pub mod group_norm;
pub mod instance_norm;
pub mod layer_norm;
pub mod weight_norm;

pub use batch_norm::BatchNorm;
pub use group_norm::GroupNorm;
pub use instance_norm::InstanceNorm;
pub use layer_norm::LayerNorm;
pub use weight_norm::WeightNorm;

use lucent_core::{Result, TensorError};
use num_traits::FromPrimitive;

/// Cast an `f64` hyperparameter to the working element type.
pub(crate) fn cast_hyper<T: FromPrimitive>(value: f64, operation: &str) -> Result<T> {
    T::from_f64(value).ok_or_else(|| {
        TensorError::invalid_argument(
            operation,
            format!("hyperparameter {value} does not fit the element type"),
        )
    })
}
