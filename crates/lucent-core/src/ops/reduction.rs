//! Axis reductions: sum, mean, variance and the partial L2 norm used by
//! weight normalization.

use crate::{Result, Tensor, TensorError};
use ndarray::{ArrayD, Axis};
use num_traits::{Float, FromPrimitive};

fn check_axes(op: &str, axes: &[usize], ndim: usize) -> Result<Vec<usize>> {
    let mut sorted = axes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    for &ax in &sorted {
        if ax >= ndim {
            return Err(TensorError::InvalidAxis {
                operation: op.to_string(),
                axis: ax as i64,
                ndim,
            });
        }
    }
    Ok(sorted)
}

/// Number of elements pooled by a reduction over `axes`.
pub(crate) fn reduce_count(dims: &[usize], axes: &[usize]) -> usize {
    axes.iter().map(|&a| dims[a]).product()
}

/// Sum over the given axes (all axes when `None`).
pub fn sum<T>(x: &Tensor<T>, axes: Option<&[usize]>, keepdims: bool) -> Result<Tensor<T>>
where
    T: Float,
{
    let ndim = x.rank();
    match axes {
        Some(axes) => {
            let sorted = check_axes("sum", axes, ndim)?;
            let mut result = x.array().clone();
            // Highest axis first so the remaining indices stay valid.
            for &ax in sorted.iter().rev() {
                result = result.sum_axis(Axis(ax));
                if keepdims {
                    result = result.insert_axis(Axis(ax));
                }
            }
            Ok(Tensor::from_array(result))
        }
        None => {
            let total = x.array().iter().fold(T::zero(), |acc, v| acc + *v);
            let result = if keepdims {
                ArrayD::from_elem(vec![1; ndim], total)
            } else {
                ArrayD::from_elem(vec![], total)
            };
            Ok(Tensor::from_array(result))
        }
    }
}

/// Arithmetic mean over the given axes (all axes when `None`).
pub fn mean<T>(x: &Tensor<T>, axes: Option<&[usize]>, keepdims: bool) -> Result<Tensor<T>>
where
    T: Float + FromPrimitive,
{
    let count = match axes {
        Some(axes) => reduce_count(x.shape().dims(), &check_axes("mean", axes, x.rank())?),
        None => x.len(),
    };
    if count == 0 {
        return Err(TensorError::invalid_argument(
            "mean",
            "cannot take the mean over zero elements",
        ));
    }
    let inv = T::one()
        / T::from_usize(count).ok_or_else(|| {
            TensorError::invalid_argument("mean", "element count does not fit the element type")
        })?;
    Ok(sum(x, axes, keepdims)?.mul_scalar(inv))
}

/// Biased variance `E[(x - E[x])^2]` over the given axes.
pub fn variance<T>(x: &Tensor<T>, axes: Option<&[usize]>, keepdims: bool) -> Result<Tensor<T>>
where
    T: Float + FromPrimitive,
{
    let mu = mean(x, axes, true)?;
    let centered = x.sub(&mu)?;
    let squared = centered.mul(&centered)?;
    mean(&squared, axes, keepdims)
}

/// L2 norm over every axis except `keep_axis` (over all axes when `None`).
///
/// The result keeps the input rank: reduced axes collapse to size 1 and the
/// kept axis retains its length, so the output broadcasts cleanly against
/// the input. This is the magnitude reduction of weight normalization.
pub fn norm_except<T>(x: &Tensor<T>, keep_axis: Option<usize>) -> Result<Tensor<T>>
where
    T: Float,
{
    let ndim = x.rank();
    if let Some(axis) = keep_axis {
        if axis >= ndim {
            return Err(TensorError::InvalidAxis {
                operation: "norm_except".to_string(),
                axis: axis as i64,
                ndim,
            });
        }
    }
    let axes: Vec<usize> = (0..ndim).filter(|a| Some(*a) != keep_axis).collect();
    let squared = x.mul(x)?;
    let pooled = if axes.is_empty() {
        squared
    } else {
        sum(&squared, Some(&axes), true)?
    };
    pooled.sqrt()
}
