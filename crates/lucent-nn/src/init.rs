//! Parameter initializers.
//!
//! An [`Initializer`] is a plain function from a seeded RNG and a shape to
//! a tensor; layers store one per parameter so callers can swap in their
//! own.

use lucent_core::{Result, Tensor, TensorError};
use num_traits::{Float, FromPrimitive};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

pub type Initializer<T> = fn(&mut StdRng, &[usize]) -> Result<Tensor<T>>;

fn cast<T: FromPrimitive>(value: f64, op: &str) -> Result<T> {
    T::from_f64(value)
        .ok_or_else(|| TensorError::invalid_argument(op, "value does not fit the element type"))
}

pub fn zeros_init<T>(_rng: &mut StdRng, dims: &[usize]) -> Result<Tensor<T>>
where
    T: Float,
{
    Ok(Tensor::zeros(dims))
}

pub fn ones_init<T>(_rng: &mut StdRng, dims: &[usize]) -> Result<Tensor<T>>
where
    T: Float,
{
    Ok(Tensor::ones(dims))
}

/// Standard normal draws.
pub fn normal_init<T>(rng: &mut StdRng, dims: &[usize]) -> Result<Tensor<T>>
where
    T: Float + FromPrimitive,
{
    let count: usize = dims.iter().product();
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let sample: f64 = rng.sample(StandardNormal);
        values.push(cast(sample, "normal_init")?);
    }
    Tensor::from_vec(values, dims)
}

/// Xavier/Glorot uniform draws in `[-sqrt(6/(fan_in+fan_out)), +...]`.
pub fn glorot_uniform<T>(rng: &mut StdRng, dims: &[usize]) -> Result<Tensor<T>>
where
    T: Float + FromPrimitive,
{
    let (fan_in, fan_out) = match dims {
        [] => (1, 1),
        [n] => (*n, *n),
        _ => (dims[0], dims[dims.len() - 1]),
    };
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    let count: usize = dims.iter().product();
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(cast(rng.gen_range(-limit..=limit), "glorot_uniform")?);
    }
    Tensor::from_vec(values, dims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_zeros_ones_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        let z: Tensor<f32> = zeros_init(&mut rng, &[3, 2]).unwrap();
        assert_eq!(z.shape().dims(), &[3, 2]);
        assert!(z.is_all_zero());
        let o: Tensor<f32> = ones_init(&mut rng, &[4]).unwrap();
        assert!(o.as_slice().unwrap().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_normal_is_seeded() {
        let a: Tensor<f64> = normal_init(&mut StdRng::seed_from_u64(7), &[16]).unwrap();
        let b: Tensor<f64> = normal_init(&mut StdRng::seed_from_u64(7), &[16]).unwrap();
        assert_eq!(a.as_slice().unwrap(), b.as_slice().unwrap());
    }

    #[test]
    fn test_glorot_within_limit() {
        let mut rng = StdRng::seed_from_u64(1);
        let w: Tensor<f32> = glorot_uniform(&mut rng, &[8, 4]).unwrap();
        let limit = (6.0f32 / 12.0).sqrt();
        assert!(w.as_slice().unwrap().iter().all(|v| v.abs() <= limit));
    }
}
