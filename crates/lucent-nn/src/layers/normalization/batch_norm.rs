//! Batch normalization.
//!
//! Statistics pool over every axis except the channel axis, batch included.
//! With `TRACK_STATS` the layer carries exponentially averaged mean and
//! variance in its state record and uses them instead of batch statistics
//! at evaluation time.

use crate::activation::Activation;
use crate::init::{ones_init, zeros_init, Initializer};
use crate::layer::Layer;
use crate::record::{ParamRecord, StateRecord};
use lucent_core::ops::{batch_norm, RunningStats};
use lucent_core::{Result, Tensor, TensorError};
use num_traits::{Float, FromPrimitive};
use rand::rngs::StdRng;

use super::cast_hyper;

/// Batch normalization over `[batch, spatial..., channels]` inputs.
///
/// The capability flags are const generics: `AFFINE` controls whether
/// `scale`/`bias` parameters exist, `TRACK_STATS` whether running
/// statistics are kept. Both default to on.
#[derive(Debug, Clone)]
pub struct BatchNorm<T, const AFFINE: bool = true, const TRACK_STATS: bool = true>
where
    T: Float,
{
    num_features: usize,
    epsilon: f64,
    momentum: f64,
    activation: Activation,
    scale_init: Initializer<T>,
    bias_init: Initializer<T>,
}

impl<T, const AFFINE: bool, const TRACK_STATS: bool> BatchNorm<T, AFFINE, TRACK_STATS>
where
    T: Float + FromPrimitive,
{
    pub fn new(num_features: usize) -> Self {
        Self {
            num_features,
            epsilon: 1e-5,
            momentum: 0.1,
            activation: Activation::Identity,
            scale_init: ones_init,
            bias_init: zeros_init,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Momentum of the running-statistics moving average.
    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
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

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn parameter_count(&self) -> usize {
        if AFFINE {
            2 * self.num_features
        } else {
            0
        }
    }

    fn check_input(&self, input: &Tensor<T>) -> Result<()> {
        let ndim = input.rank();
        if ndim < 2 {
            return Err(TensorError::invalid_shape(
                "batch_norm",
                format!("expected at least 2D input, got {ndim}D"),
                Some(input.shape().dims().to_vec()),
            ));
        }
        let features = input.shape().dims()[ndim - 1];
        if features != self.num_features {
            return Err(TensorError::shape_mismatch(
                "batch_norm",
                format!("{} channels", self.num_features),
                format!("{features} channels"),
            ));
        }
        Ok(())
    }
}

impl<T, const AFFINE: bool, const TRACK_STATS: bool> Layer<T>
    for BatchNorm<T, AFFINE, TRACK_STATS>
where
    T: Float + FromPrimitive,
{
    const HAS_AFFINE: bool = AFFINE;
    const TRACKS_RUNNING_STATS: bool = TRACK_STATS;

    fn init_parameters(&self, rng: &mut StdRng) -> Result<ParamRecord<T>> {
        let mut params = ParamRecord::new();
        if AFFINE {
            params.insert_tensor("scale", (self.scale_init)(rng, &[self.num_features])?);
            params.insert_tensor("bias", (self.bias_init)(rng, &[self.num_features])?);
        }
        Ok(params)
    }

    fn init_state(&self, _rng: &mut StdRng) -> Result<StateRecord<T>> {
        let mut state = StateRecord::new();
        if TRACK_STATS {
            state.insert("running_mean", Tensor::zeros(&[self.num_features]));
            state.insert("running_var", Tensor::ones(&[self.num_features]));
        }
        Ok(state)
    }

    fn forward(
        &self,
        input: &Tensor<T>,
        params: &ParamRecord<T>,
        state: &StateRecord<T>,
    ) -> Result<(Tensor<T>, StateRecord<T>)> {
        self.check_input(input)?;

        // A single-sample batch yields a singular (zero-variance) statistic.
        if state.training() && input.shape().dims()[0] == 1 {
            return Err(TensorError::invalid_argument(
                "batch_norm",
                "batch size 1 during training is disallowed",
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
        let running = if TRACK_STATS {
            Some(RunningStats {
                mean: state.get("running_mean")?.clone(),
                variance: state.get("running_var")?.clone(),
            })
        } else {
            None
        };

        let (y, updated) = batch_norm(
            input,
            scale,
            bias,
            running.as_ref(),
            state.training(),
            cast_hyper(self.momentum, "batch_norm")?,
            cast_hyper(self.epsilon, "batch_norm")?,
        )?;

        let mut new_state = state.clone();
        if let Some(stats) = updated {
            new_state.insert("running_mean", stats.mean);
            new_state.insert("running_var", stats.variance);
        }

        Ok((self.activation.apply(&y)?, new_state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{apply, has_affine, testmode, tracks_running_stats};
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0)
    }

    #[test]
    fn test_capability_flags() {
        let full = BatchNorm::<f32>::new(4);
        assert!(has_affine(&full));
        assert!(tracks_running_stats(&full));

        let bare = BatchNorm::<f32, false, false>::new(4);
        assert!(!has_affine(&bare));
        assert!(!tracks_running_stats(&bare));
    }

    #[test]
    fn test_init_parameters_shapes() {
        let layer = BatchNorm::<f32>::new(8);
        let ps = layer.init_parameters(&mut rng()).unwrap();
        assert_eq!(ps.tensor("scale").unwrap().shape().dims(), &[8]);
        assert_eq!(ps.tensor("bias").unwrap().shape().dims(), &[8]);
        assert_eq!(layer.parameter_count(), 16);

        let plain = BatchNorm::<f32, false, true>::new(8);
        assert!(plain.init_parameters(&mut rng()).unwrap().is_empty());
        assert_eq!(plain.parameter_count(), 0);
    }

    #[test]
    fn test_init_state() {
        let layer = BatchNorm::<f64>::new(3);
        let st = layer.init_state(&mut rng()).unwrap();
        assert!(st.training());
        assert!(st.get("running_mean").unwrap().is_all_zero());
        assert_eq!(st.get("running_var").unwrap().as_slice().unwrap(), &[1.0; 3]);

        let untracked = BatchNorm::<f64, true, false>::new(3);
        assert!(untracked.init_state(&mut rng()).unwrap().is_empty());
    }

    #[test]
    fn test_batch_size_one_rejected_in_training() {
        let layer = BatchNorm::<f64>::new(2);
        let ps = layer.init_parameters(&mut rng()).unwrap();
        let st = layer.init_state(&mut rng()).unwrap();
        let x = Tensor::ones(&[1, 2]);
        assert!(layer.forward(&x, &ps, &st).is_err());

        // Fine in eval mode, and with batch size >= 2 in training.
        let eval = testmode(st.clone());
        assert!(layer.forward(&x, &ps, &eval).is_ok());
        let x2 = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        assert!(layer.forward(&x2, &ps, &st).is_ok());
    }

    #[test]
    fn test_moving_average_recurrence() {
        let layer = BatchNorm::<f64>::new(1).with_momentum(0.25);
        let ps = layer.init_parameters(&mut rng()).unwrap();
        let mut st = layer.init_state(&mut rng()).unwrap();

        let batches = [
            Tensor::from_vec(vec![1.0, 3.0], &[2, 1]).unwrap(),
            Tensor::from_vec(vec![0.0, 8.0], &[2, 1]).unwrap(),
            Tensor::from_vec(vec![-2.0, 2.0], &[2, 1]).unwrap(),
        ];
        let mut expected_mean = 0.0;
        let mut expected_var = 1.0;
        for x in &batches {
            let data = x.as_slice().unwrap();
            let mu = (data[0] + data[1]) / 2.0;
            let biased = ((data[0] - mu).powi(2) + (data[1] - mu).powi(2)) / 2.0;
            let unbiased = biased * 2.0; // n/(n-1) with n = 2
            expected_mean = 0.75 * expected_mean + 0.25 * mu;
            expected_var = 0.75 * expected_var + 0.25 * unbiased;

            let (_, next) = apply(&layer, x, &ps, &st).unwrap();
            st = next;
            assert_relative_eq!(
                st.get("running_mean").unwrap().get(&[0]).unwrap(),
                expected_mean,
                epsilon = 1e-12
            );
            assert_relative_eq!(
                st.get("running_var").unwrap().get(&[0]).unwrap(),
                expected_var,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_eval_mode_is_idempotent() {
        let layer = BatchNorm::<f64>::new(2);
        let ps = layer.init_parameters(&mut rng()).unwrap();
        let mut st = layer.init_state(&mut rng()).unwrap();

        // Accumulate some running statistics first.
        let x = Tensor::from_vec(vec![1.0, -1.0, 3.0, 5.0], &[2, 2]).unwrap();
        let (_, next) = layer.forward(&x, &ps, &st).unwrap();
        st = testmode(next);

        let (y1, st1) = layer.forward(&x, &ps, &st).unwrap();
        let (y2, st2) = layer.forward(&x, &ps, &st1).unwrap();
        assert_eq!(y1, y2);
        assert_eq!(st1, st2);
        assert_eq!(
            st.get("running_mean").unwrap(),
            st2.get("running_mean").unwrap()
        );
    }

    #[test]
    fn test_training_normalizes_batch() {
        let layer = BatchNorm::<f64>::new(1);
        let ps = layer.init_parameters(&mut rng()).unwrap();
        let st = layer.init_state(&mut rng()).unwrap();
        let x = Tensor::from_vec(vec![2.0, 4.0, 6.0, 8.0], &[4, 1]).unwrap();
        let (y, _) = layer.forward(&x, &ps, &st).unwrap();
        let out = y.as_slice().unwrap();
        let mean: f64 = out.iter().sum::<f64>() / 4.0;
        assert_relative_eq!(mean, 0.0, epsilon = 1e-9);
    }
}
