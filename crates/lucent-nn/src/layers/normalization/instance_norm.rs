//! Instance normalization.
//!
//! Statistics pool per sample and channel over the spatial axes only —
//! unlike batch normalization there is no pooling across the batch. No
//! running statistics; the state record passes through unchanged.

use crate::activation::Activation;
use crate::init::{ones_init, zeros_init, Initializer};
use crate::layer::Layer;
use crate::record::{ParamRecord, StateRecord};
use lucent_core::ops::instance_norm;
use lucent_core::{Result, Tensor, TensorError};
use num_traits::{Float, FromPrimitive};
use rand::rngs::StdRng;

use super::cast_hyper;

/// Instance normalization over `[batch, spatial..., channels]` inputs.
#[derive(Debug, Clone)]
pub struct InstanceNorm<T, const AFFINE: bool = true>
where
    T: Float,
{
    num_channels: usize,
    epsilon: f64,
    activation: Activation,
    scale_init: Initializer<T>,
    bias_init: Initializer<T>,
}

impl<T, const AFFINE: bool> InstanceNorm<T, AFFINE>
where
    T: Float + FromPrimitive,
{
    pub fn new(num_channels: usize) -> Self {
        Self {
            num_channels,
            epsilon: 1e-5,
            activation: Activation::Identity,
            scale_init: ones_init,
            bias_init: zeros_init,
        }
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

impl<T, const AFFINE: bool> Layer<T> for InstanceNorm<T, AFFINE>
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
        if ndim >= 1 && input.shape().dims()[ndim - 1] != self.num_channels {
            return Err(TensorError::shape_mismatch(
                "instance_norm",
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

        let y = instance_norm(input, scale, bias, cast_hyper(self.epsilon, "instance_norm")?)?;
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
    fn test_capability_flags() {
        let layer = InstanceNorm::<f32>::new(4);
        assert!(has_affine(&layer));
        assert!(!tracks_running_stats(&layer));
        assert!(!has_affine(&InstanceNorm::<f32, false>::new(4)));
    }

    #[test]
    fn test_parameter_shapes() {
        let layer = InstanceNorm::<f64>::new(5);
        let ps = layer.init_parameters(&mut rng()).unwrap();
        assert_eq!(ps.tensor("scale").unwrap().shape().dims(), &[5]);
        assert_eq!(ps.tensor("bias").unwrap().shape().dims(), &[5]);
        assert_eq!(layer.parameter_count(), 10);
    }

    #[test]
    fn test_no_pooling_across_batch() {
        let layer = InstanceNorm::<f64>::new(1);
        let ps = layer.init_parameters(&mut rng()).unwrap();
        let st = layer.init_state(&mut rng()).unwrap();
        // Two samples with wildly different magnitudes; each must normalize
        // to the same {-1, +1} pattern independently.
        let x = Tensor::from_vec(vec![1.0, 3.0, 1000.0, 3000.0], &[2, 2, 1]).unwrap();
        let (y, new_st) = layer.forward(&x, &ps, &st).unwrap();
        assert_relative_eq!(y.get(&[0, 0, 0]).unwrap(), -1.0, epsilon = 1e-3);
        assert_relative_eq!(y.get(&[1, 0, 0]).unwrap(), -1.0, epsilon = 1e-3);
        assert_eq!(st, new_st);
    }

    #[test]
    fn test_requires_spatial_axis() {
        let layer = InstanceNorm::<f64>::new(2);
        let ps = layer.init_parameters(&mut rng()).unwrap();
        let st = layer.init_state(&mut rng()).unwrap();
        let x = Tensor::<f64>::ones(&[4, 2]);
        assert!(layer.forward(&x, &ps, &st).is_err());
    }
}
