//! Layer normalization.
//!
//! Statistics pool over a configurable axis set, by default the trailing
//! axes covered by the configured `shape`. Affine parameters default to on
//! and are shaped `[1, shape...]` — the leading singleton broadcasts over
//! the batch axis, keeping scale and bias at input rank. Never tracks
//! running statistics.

use crate::activation::Activation;
use crate::init::{ones_init, zeros_init, Initializer};
use crate::layer::Layer;
use crate::record::{ParamRecord, StateRecord};
use lucent_core::ops::layer_norm;
use lucent_core::{Result, Tensor, TensorError};
use num_traits::{Float, FromPrimitive};
use rand::rngs::StdRng;

use super::cast_hyper;

/// Layer normalization over the trailing `shape` axes of the input.
#[derive(Debug, Clone)]
pub struct LayerNorm<T, const AFFINE: bool = true>
where
    T: Float,
{
    shape: Vec<usize>,
    dims: Option<Vec<usize>>,
    epsilon: f64,
    activation: Activation,
    scale_init: Initializer<T>,
    bias_init: Initializer<T>,
}

impl<T, const AFFINE: bool> LayerNorm<T, AFFINE>
where
    T: Float + FromPrimitive,
{
    /// `shape` is the trailing normalized shape of expected inputs.
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            dims: None,
            epsilon: 1e-5,
            activation: Activation::Identity,
            scale_init: ones_init,
            bias_init: zeros_init,
        }
    }

    /// Override which input axes the statistics pool over. The default is
    /// every axis covered by `shape`, i.e. all non-batch axes.
    pub fn with_dims(mut self, dims: Vec<usize>) -> Self {
        self.dims = Some(dims);
        self
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

    pub fn normalized_shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn parameter_count(&self) -> usize {
        if AFFINE {
            2 * self.shape.iter().product::<usize>()
        } else {
            0
        }
    }

    fn param_dims(&self) -> Vec<usize> {
        let mut dims = vec![1];
        dims.extend_from_slice(&self.shape);
        dims
    }

    fn check_input(&self, input: &Tensor<T>) -> Result<Vec<usize>> {
        let ndim = input.rank();
        let norm_rank = self.shape.len();
        if ndim < norm_rank + 1 {
            return Err(TensorError::invalid_shape(
                "layer_norm",
                format!(
                    "input rank {ndim} cannot hold a batch axis plus normalized shape {:?}",
                    self.shape
                ),
                Some(input.shape().dims().to_vec()),
            ));
        }
        let trailing = &input.shape().dims()[ndim - norm_rank..];
        if trailing != self.shape.as_slice() {
            return Err(TensorError::shape_mismatch(
                "layer_norm",
                format!("trailing dimensions {:?}", self.shape),
                format!("{trailing:?}"),
            ));
        }
        Ok(match &self.dims {
            Some(axes) => axes.clone(),
            None => (ndim - norm_rank..ndim).collect(),
        })
    }
}

impl<T, const AFFINE: bool> Layer<T> for LayerNorm<T, AFFINE>
where
    T: Float + FromPrimitive,
{
    const HAS_AFFINE: bool = AFFINE;

    fn init_parameters(&self, rng: &mut StdRng) -> Result<ParamRecord<T>> {
        let mut params = ParamRecord::new();
        if AFFINE {
            let dims = self.param_dims();
            params.insert_tensor("scale", (self.scale_init)(rng, &dims)?);
            params.insert_tensor("bias", (self.bias_init)(rng, &dims)?);
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
        let axes = self.check_input(input)?;

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

        let y = layer_norm(
            input,
            &axes,
            scale,
            bias,
            cast_hyper(self.epsilon, "layer_norm")?,
        )?;
        Ok((self.activation.apply(&y)?, state.clone()))
    }
}
