//! Normalization statistics kernels.
//!
//! Inputs use the batch-first, channel-last layout `[batch, spatial...,
//! channels]`. Each kernel computes mean/variance over its variant's axis
//! set, normalizes, and applies optional per-channel scale and bias. Only
//! `batch_norm` deals with running statistics; the other kernels are pure.

use crate::ops::reduction::{mean, reduce_count, variance};
use crate::{Result, Tensor, TensorError};
use num_traits::{Float, FromPrimitive};

/// Exponentially averaged statistics carried across `batch_norm` calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningStats<T> {
    pub mean: Tensor<T>,
    pub variance: Tensor<T>,
}

fn affine<T>(y: Tensor<T>, scale: Option<&Tensor<T>>, bias: Option<&Tensor<T>>) -> Result<Tensor<T>>
where
    T: Float,
{
    let y = match scale {
        Some(scale) => y.mul(scale)?,
        None => y,
    };
    match bias {
        Some(bias) => y.add(bias),
        None => Ok(y),
    }
}

fn standardize<T>(
    x: &Tensor<T>,
    mu: &Tensor<T>,
    var: &Tensor<T>,
    epsilon: T,
) -> Result<Tensor<T>>
where
    T: Float,
{
    let std = var.add_scalar(epsilon).sqrt()?;
    x.sub(mu)?.div(&std)
}

/// Batch normalization: statistics over every axis except the channel axis.
///
/// When `training`, batch statistics normalize the input and, if `running`
/// is given, updated running statistics are returned:
/// `new = (1 - momentum) * old + momentum * batch_stat`, where the variance
/// contribution carries the unbiased `n/(n-1)` correction. When not
/// training, running statistics normalize the input if present; otherwise
/// batch statistics are used.
pub fn batch_norm<T>(
    x: &Tensor<T>,
    scale: Option<&Tensor<T>>,
    bias: Option<&Tensor<T>>,
    running: Option<&RunningStats<T>>,
    training: bool,
    momentum: T,
    epsilon: T,
) -> Result<(Tensor<T>, Option<RunningStats<T>>)>
where
    T: Float + FromPrimitive,
{
    let ndim = x.rank();
    if ndim < 2 {
        return Err(TensorError::invalid_shape(
            "batch_norm",
            format!("expected at least 2D input, got {ndim}D"),
            Some(x.shape().dims().to_vec()),
        ));
    }
    let axes: Vec<usize> = (0..ndim - 1).collect();

    let (mu, var) = match running {
        Some(stats) if !training => (stats.mean.clone(), stats.variance.clone()),
        _ => (
            mean(x, Some(&axes), false)?,
            variance(x, Some(&axes), false)?,
        ),
    };

    let y = standardize(x, &mu, &var, epsilon)?;
    let y = affine(y, scale, bias)?;

    let updated = match (training, running) {
        (true, Some(stats)) => {
            let n = reduce_count(x.shape().dims(), &axes);
            let n_t = T::from_usize(n).ok_or_else(|| {
                TensorError::invalid_argument("batch_norm", "pooled count overflows element type")
            })?;
            // Running variance accumulates the unbiased batch variance.
            let correction = if n > 1 {
                n_t / (n_t - T::one())
            } else {
                T::one()
            };
            let keep = T::one() - momentum;
            let new_mean = stats
                .mean
                .mul_scalar(keep)
                .add(&mu.mul_scalar(momentum))?;
            let new_var = stats
                .variance
                .mul_scalar(keep)
                .add(&var.mul_scalar(momentum * correction))?;
            Some(RunningStats {
                mean: new_mean,
                variance: new_var,
            })
        }
        _ => None,
    };

    Ok((y, updated))
}

/// Group normalization: statistics per sample and channel group.
pub fn group_norm<T>(
    x: &Tensor<T>,
    groups: usize,
    scale: Option<&Tensor<T>>,
    bias: Option<&Tensor<T>>,
    epsilon: T,
) -> Result<Tensor<T>>
where
    T: Float + FromPrimitive,
{
    let ndim = x.rank();
    if ndim < 2 {
        return Err(TensorError::invalid_shape(
            "group_norm",
            format!("expected at least 2D input, got {ndim}D"),
            Some(x.shape().dims().to_vec()),
        ));
    }
    let dims = x.shape().dims();
    let channels = dims[ndim - 1];
    if groups == 0 || channels % groups != 0 {
        return Err(TensorError::invalid_argument(
            "group_norm",
            format!("channels ({channels}) must be divisible by groups ({groups})"),
        ));
    }

    // Channels are contiguous in memory, so splitting the channel axis into
    // (groups, channels/groups) is a pure reshape.
    let mut grouped_dims = dims[..ndim - 1].to_vec();
    grouped_dims.push(groups);
    grouped_dims.push(channels / groups);
    let grouped = x.reshape(&grouped_dims)?;

    // Reduce the spatial axes and the within-group channel axis; keep the
    // batch and group axes.
    let mut axes: Vec<usize> = (1..ndim - 1).collect();
    axes.push(grouped_dims.len() - 1);

    let mu = mean(&grouped, Some(&axes), true)?;
    let var = variance(&grouped, Some(&axes), true)?;
    let y = standardize(&grouped, &mu, &var, epsilon)?.reshape(dims)?;
    affine(y, scale, bias)
}

/// Instance normalization: statistics per sample and channel.
pub fn instance_norm<T>(
    x: &Tensor<T>,
    scale: Option<&Tensor<T>>,
    bias: Option<&Tensor<T>>,
    epsilon: T,
) -> Result<Tensor<T>>
where
    T: Float + FromPrimitive,
{
    let ndim = x.rank();
    if ndim < 3 {
        return Err(TensorError::invalid_shape(
            "instance_norm",
            format!("expected at least 3D input (batch, spatial, channels), got {ndim}D"),
            Some(x.shape().dims().to_vec()),
        ));
    }
    let axes: Vec<usize> = (1..ndim - 1).collect();
    let mu = mean(x, Some(&axes), true)?;
    let var = variance(x, Some(&axes), true)?;
    let y = standardize(x, &mu, &var, epsilon)?;
    affine(y, scale, bias)
}

/// Layer normalization: statistics over an explicit axis set.
pub fn layer_norm<T>(
    x: &Tensor<T>,
    axes: &[usize],
    scale: Option<&Tensor<T>>,
    bias: Option<&Tensor<T>>,
    epsilon: T,
) -> Result<Tensor<T>>
where
    T: Float + FromPrimitive,
{
    let mu = mean(x, Some(axes), true)?;
    let var = variance(x, Some(axes), true)?;
    let y = standardize(x, &mu, &var, epsilon)?;
    affine(y, scale, bias)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_batch_norm_zero_mean_unit_var() {
        let x = Tensor::from_vec(vec![1.0f64, 2.0, 3.0, 4.0], &[4, 1]).unwrap();
        let (y, stats) = batch_norm(&x, None, None, None, true, 0.1, 0.0).unwrap();
        assert!(stats.is_none());
        let m: f64 = y.as_slice().unwrap().iter().sum::<f64>() / 4.0;
        assert_relative_eq!(m, 0.0, epsilon = 1e-12);
        let v: f64 = y.as_slice().unwrap().iter().map(|a| a * a).sum::<f64>() / 4.0;
        assert_relative_eq!(v, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_batch_norm_running_update_recurrence() {
        let x = Tensor::from_vec(vec![1.0f64, 3.0, 5.0, 7.0], &[4, 1]).unwrap();
        let stats = RunningStats {
            mean: Tensor::zeros(&[1]),
            variance: Tensor::ones(&[1]),
        };
        let m = 0.1;
        let (_, updated) = batch_norm(&x, None, None, Some(&stats), true, m, 1e-5).unwrap();
        let updated = updated.unwrap();
        // batch mean 4, biased variance 5, unbiased 5 * 4/3.
        assert_relative_eq!(updated.mean.get(&[0]).unwrap(), 0.9 * 0.0 + 0.1 * 4.0);
        assert_relative_eq!(
            updated.variance.get(&[0]).unwrap(),
            0.9 * 1.0 + 0.1 * 5.0 * (4.0 / 3.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_batch_norm_eval_uses_running_stats() {
        let x = Tensor::from_vec(vec![1.0f64, 2.0], &[2, 1]).unwrap();
        let stats = RunningStats {
            mean: Tensor::from_vec(vec![1.0], &[1]).unwrap(),
            variance: Tensor::from_vec(vec![4.0], &[1]).unwrap(),
        };
        let (y, updated) = batch_norm(&x, None, None, Some(&stats), false, 0.1, 0.0).unwrap();
        assert!(updated.is_none());
        assert_relative_eq!(y.get(&[0, 0]).unwrap(), 0.0);
        assert_relative_eq!(y.get(&[1, 0]).unwrap(), 0.5);
    }

    #[test]
    fn test_group_norm_rejects_uneven_groups() {
        let x = Tensor::<f64>::ones(&[1, 2, 6]);
        assert!(group_norm(&x, 4, None, None, 1e-5).is_err());
    }

    #[test]
    fn test_group_norm_normalizes_per_group() {
        // One sample, shape (1, spatial=2, channels=2), one channel per
        // group. Group 0 pools {1, 10}, group 1 pools {3, 30}; each group
        // must normalize independently to {-1, +1}.
        let x = Tensor::from_vec(vec![1.0f64, 3.0, 10.0, 30.0], &[1, 2, 2]).unwrap();
        let y = group_norm(&x, 2, None, None, 0.0).unwrap();
        assert_relative_eq!(y.get(&[0, 0, 0]).unwrap(), -1.0, epsilon = 1e-9);
        assert_relative_eq!(y.get(&[0, 1, 0]).unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(y.get(&[0, 0, 1]).unwrap(), -1.0, epsilon = 1e-9);
        assert_relative_eq!(y.get(&[0, 1, 1]).unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_instance_norm_independent_per_sample() {
        let x = Tensor::from_vec(vec![1.0f64, 3.0, 100.0, 300.0], &[2, 2, 1]).unwrap();
        let y = instance_norm(&x, None, None, 0.0).unwrap();
        assert_relative_eq!(y.get(&[0, 0, 0]).unwrap(), -1.0, epsilon = 1e-9);
        assert_relative_eq!(y.get(&[1, 0, 0]).unwrap(), -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_layer_norm_constant_rows_zero() {
        let x = Tensor::from_vec(vec![5.0f64, 5.0, 5.0, -2.0, -2.0, -2.0], &[2, 3]).unwrap();
        let y = layer_norm(&x, &[1], None, None, 1e-5).unwrap();
        for v in y.as_slice().unwrap() {
            assert_relative_eq!(*v, 0.0, epsilon = 1e-9);
        }
    }
}
