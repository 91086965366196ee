//! Axis manipulation: reversal and contiguous chunk slicing.
//!
//! Both are element-type generic so they also work on arrays whose elements
//! are tracked scalars from an autodiff backend.

use crate::{Result, Tensor, TensorError};
use ndarray::{Axis, Slice};

/// Reverse the order of entries along `axis`.
pub fn reverse<T>(x: &Tensor<T>, axis: usize) -> Result<Tensor<T>>
where
    T: Clone,
{
    if axis >= x.rank() {
        return Err(TensorError::InvalidAxis {
            operation: "reverse".to_string(),
            axis: axis as i64,
            ndim: x.rank(),
        });
    }
    let mut data = x.array().clone();
    data.invert_axis(Axis(axis));
    // Re-materialize so downstream code sees a standard-layout array.
    Ok(Tensor::from_array(data.as_standard_layout().to_owned()))
}

/// Split `x` into `n` equal contiguous chunks along `axis`.
///
/// This is the gate-slicing primitive used for recurrent-cell gate splits;
/// the axis length must be divisible by `n`.
pub fn chunk_axis<T>(x: &Tensor<T>, axis: usize, n: usize) -> Result<Vec<Tensor<T>>>
where
    T: Clone,
{
    if axis >= x.rank() {
        return Err(TensorError::InvalidAxis {
            operation: "chunk_axis".to_string(),
            axis: axis as i64,
            ndim: x.rank(),
        });
    }
    if n == 0 {
        return Err(TensorError::invalid_argument(
            "chunk_axis",
            "chunk count must be positive",
        ));
    }
    let len = x.shape().dims()[axis];
    if len % n != 0 {
        return Err(TensorError::invalid_argument(
            "chunk_axis",
            format!("axis length {len} is not divisible into {n} chunks"),
        ));
    }
    let chunk = len / n;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let start = (i * chunk) as isize;
        let stop = start + chunk as isize;
        let view = x
            .array()
            .slice_axis(Axis(axis), Slice::new(start, Some(stop), 1));
        out.push(Tensor::from_array(view.to_owned()));
    }
    Ok(out)
}
