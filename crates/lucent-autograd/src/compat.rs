//! Shims for generic operations on the array-of-trackables representation.
//!
//! `reverse` and `chunk_axis` in `lucent-core` are element-type generic, so
//! they run fine on `Tensor<Tracked<T>>` — but their results would stay in
//! the element-wise representation and break code expecting one tracked
//! array. The functions here perform the generic operation and repack the
//! result. Element-type conversion is the one case that cannot be shimmed:
//! the backend has no way to retype per-element trace nodes mid-trace, so
//! it degrades to a no-op with a one-time diagnostic instead of failing the
//! whole computation.

use crate::tracked::{Tracked, TrackedTensor};
use lucent_core::ops::{chunk_axis, reverse as reverse_generic};
use lucent_core::{Result, Tensor};
use num_traits::Zero;
use std::sync::Once;

static ELTYPE_WARNING: Once = Once::new();

/// Reverse an array-of-trackables along `axis`, repacked as one tracked
/// array.
pub fn reverse<T>(x: &Tensor<Tracked<T>>, axis: usize) -> Result<TrackedTensor<T>>
where
    T: Copy + Zero,
{
    Ok(TrackedTensor::collect(&reverse_generic(x, axis)?))
}

/// Split an array-of-trackables into `n` equal contiguous gates along the
/// leading axis, each repacked as one tracked array.
pub fn multigate<T>(x: &Tensor<Tracked<T>>, n: usize) -> Result<Vec<TrackedTensor<T>>>
where
    T: Copy + Zero,
{
    let gates = chunk_axis(x, 0, n)?;
    Ok(gates.iter().map(TrackedTensor::collect).collect())
}

/// Element-type conversion on an array-of-trackables: intentionally a
/// no-op. Warns once per process.
pub fn match_eltype<T>(x: &Tensor<Tracked<T>>) -> Tensor<Tracked<T>>
where
    T: Copy,
{
    ELTYPE_WARNING.call_once(|| {
        log::warn!(
            "element-type conversion is not supported for arrays of tracked \
             scalars; leaving the input unchanged"
        );
    });
    x.clone()
}
