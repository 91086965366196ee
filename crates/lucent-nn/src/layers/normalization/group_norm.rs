//! Group normalization.
//!
//! Channels split into contiguous groups; statistics pool per sample and
//! group over the spatial axes and the within-group channels. No running
//! statistics are ever kept: the state record passes through unchanged.

use crate::activation::Activation;
use crate::init::{ones_init, zeros_init, Initializer};
use crate::layer::Layer;
use crate::record::{ParamRecord, StateRecord};
use lucent_core::ops::group_norm;
use lucent_core::{Result, Tensor, TensorError};
use num_traits::{Float, FromPrimitive};
use rand::rngs::StdRng;

use super::cast_hyper;

/// Group normalization over `[batch, spatial..., channels]` inputs.
#[derive(Debug, Clone)]
pub struct GroupNorm<T, const AFFINE: bool = true>
where
    T: Float,
{
    groups: usize,
    num_channels: usize,
    epsilon: f64,
    activation: Activation,
    scale_init: Initializer<T>,
    bias_init: Initializer<T>,
}

impl<T, const AFFINE: bool> GroupNorm<T, AFFINE>
where
    T: Float + FromPrimitive,
{
    /// Fails when `num_channels` is not divisible by `groups`: group
    /// statistics require an even partition of the channels.
    pub fn new(groups: usize, num_channels: usize) -> Result<Self> {
        if groups == 0 || num_channels % groups != 0 {
            return Err(TensorError::invalid_argument(
                "group_norm",
                format!("num_channels ({num_channels}) must be divisible by groups ({groups})"),
            ));
        }
        Ok(Self {
            groups,
            num_channels,
            epsilon: 1e-5,
            activation: Activation::Identity,
            scale_init: ones_init,
            bias_init: zeros_init,
        })
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_initializers(
        mut self,
        scale_init: Initializer<T>,
        bias_init: Initializer<T>,
    ) -> Self {
        self.scale_init = scale_init;
        self.bias_init = bias_init;
        self
    }

    pub fn groups(&self) -> usize {
        self.groups
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn parameter_count(&self) -> usize {
        if AFFINE {
            2 * self.num_channels
        } else {
            0
        }
    }
}

impl<T, const AFFINE: bool> Layer<T> for GroupNorm<T, AFFINE>
where
    T: Float + FromPrimitive,
{
    const HAS_AFFINE: bool = AFFINE;

    fn init_parameters(&self, rng: &mut StdRng) -> Result<ParamRecord<T>> {
        let mut params = ParamRecord::new();
        if AFFINE {
            params.insert_tensor("scale", (self.scale_init)(rng, &[self.num_channels])?);
            params.insert_tensor("bias", (self.bias_init)(rng, &[self.num_channels])?);
        }
        Ok(params)
    }

    fn init_state(&self, _rng: &mut StdRng) -> Result<StateRecord<T>> {
        Ok(StateRecord::new())
    }

    fn forward(
        &self,
        input: &Tensor<T>,
        params: &ParamRecord<T>,
        state: &StateRecord<T>,
    ) -> Result<(Tensor<T>, StateRecord<T>)> {
        let ndim = input.rank();
        if ndim >= 2 && input.shape().dims()[ndim - 1] != self.num_channels {
            return Err(TensorError::shape_mismatch(
                "group_norm",
                format!("{} channels", self.num_channels),
                format!("{} channels", input.shape().dims()[ndim - 1]),
            ));
        }

        let scale = if AFFINE {
            Some(params.tensor("scale")?)
        } else {
            None
        };
        let bias = if AFFINE {
            Some(params.tensor("bias")?)
        } else {
            None
        };

        let y = group_norm(
            input,
            self.groups,
            scale,
            bias,
            cast_hyper(self.epsilon, "group_norm")?,
        )?;
        Ok((self.activation.apply(&y)?, state.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{has_affine, tracks_running_stats};
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0)
    }

    #[test]
    fn test_indivisible_channels_rejected() {
        assert!(GroupNorm::<f32>::new(7, 64).is_err());
        assert!(GroupNorm::<f32>::new(0, 64).is_err());
        assert!(GroupNorm::<f32>::new(8, 64).is_ok());
    }

    #[test]
    fn test_partition_covers_all_channels() {
        let layer = GroupNorm::<f32>::new(4, 32).unwrap();
        assert_eq!(layer.groups() * (layer.num_channels() / layer.groups()), 32);
    }

    #[test]
    fn test_capability_flags() {
        let layer = GroupNorm::<f32>::new(2, 4).unwrap();
        assert!(has_affine(&layer));
        assert!(!tracks_running_stats(&layer));
        let plain = GroupNorm::<f32, false>::new(2, 4).unwrap();
        assert!(!has_affine(&plain));
    }

    #[test]
    fn test_parameters_and_count() {
        let layer = GroupNorm::<f64>::new(2, 6).unwrap();
        let ps = layer.init_parameters(&mut rng()).unwrap();
        assert_eq!(ps.tensor("scale").unwrap().shape().dims(), &[6]);
        assert_eq!(layer.parameter_count(), 12);
        assert!(GroupNorm::<f64, false>::new(2, 6)
            .unwrap()
            .init_parameters(&mut rng())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_state_passes_through() {
        let layer = GroupNorm::<f64>::new(1, 2).unwrap();
        let ps = layer.init_parameters(&mut rng()).unwrap();
        let st = layer.init_state(&mut rng()).unwrap();
        let x = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 2, 2]).unwrap();
        let (_, new_st) = layer.forward(&x, &ps, &st).unwrap();
        assert_eq!(st, new_st);
    }

    #[test]
    fn test_normalizes_within_group() {
        let layer = GroupNorm::<f64>::new(2, 2).unwrap();
        let ps = layer.init_parameters(&mut rng()).unwrap();
        let st = layer.init_state(&mut rng()).unwrap();
        // (1, spatial 2, channels 2): each channel is its own group.
        let x = Tensor::from_vec(vec![1.0, 5.0, 3.0, 9.0], &[1, 2, 2]).unwrap();
        let (y, _) = layer.forward(&x, &ps, &st).unwrap();
        // Channel 0 pools {1, 3} -> {-1, 1}; channel 1 pools {5, 9} -> {-1, 1}.
        assert_relative_eq!(y.get(&[0, 0, 0]).unwrap(), -1.0, epsilon = 1e-3);
        assert_relative_eq!(y.get(&[0, 1, 0]).unwrap(), 1.0, epsilon = 1e-3);
        assert_relative_eq!(y.get(&[0, 0, 1]).unwrap(), -1.0, epsilon = 1e-3);
        assert_relative_eq!(y.get(&[0, 1, 1]).unwrap(), 1.0, epsilon = 1e-3);
    }
}
