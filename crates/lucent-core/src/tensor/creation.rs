use super::Tensor;
use crate::{Result, Shape, TensorError};
use ndarray::{ArrayD, IxDyn};
use num_traits::{One, Zero};

impl<T> Tensor<T> {
    /// Wrap an existing `ndarray` array.
    pub fn from_array(data: ArrayD<T>) -> Self {
        let shape = Shape::from_slice(data.shape());
        Self { data, shape }
    }

    /// Rank-0 tensor holding a single value.
    pub fn from_scalar(value: T) -> Self
    where
        T: Clone,
    {
        Self::from_array(ArrayD::from_elem(IxDyn(&[]), value))
    }

    pub fn from_vec(values: Vec<T>, dims: &[usize]) -> Result<Self> {
        let expected: usize = dims.iter().product();
        if values.len() != expected {
            return Err(TensorError::shape_mismatch(
                "from_vec",
                format!("{expected} elements for shape {dims:?}"),
                format!("{} elements", values.len()),
            ));
        }
        let data = ArrayD::from_shape_vec(IxDyn(dims), values).map_err(|e| {
            TensorError::invalid_shape("from_vec", e.to_string(), Some(dims.to_vec()))
        })?;
        Ok(Self::from_array(data))
    }

    pub fn full(dims: &[usize], value: T) -> Self
    where
        T: Clone,
    {
        Self::from_array(ArrayD::from_elem(IxDyn(dims), value))
    }

    pub fn zeros(dims: &[usize]) -> Self
    where
        T: Clone + Zero,
    {
        Self::full(dims, T::zero())
    }

    pub fn ones(dims: &[usize]) -> Self
    where
        T: Clone + One,
    {
        Self::full(dims, T::one())
    }

    /// Reinterpret the data with a new shape of equal element count.
    pub fn reshape(&self, dims: &[usize]) -> Result<Self>
    where
        T: Clone,
    {
        let expected: usize = dims.iter().product();
        if expected != self.len() {
            return Err(TensorError::shape_mismatch(
                "reshape",
                format!("{} elements", self.len()),
                format!("shape {dims:?} with {expected} elements"),
            ));
        }
        let data = self
            .data
            .clone()
            .into_shape_with_order(IxDyn(dims))
            .map_err(|e| {
                TensorError::invalid_shape("reshape", e.to_string(), Some(dims.to_vec()))
            })?;
        Ok(Self::from_array(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_and_ones() {
        let z = Tensor::<f32>::zeros(&[2, 3]);
        assert_eq!(z.shape().dims(), &[2, 3]);
        assert!(z.as_slice().unwrap().iter().all(|&v| v == 0.0));

        let o = Tensor::<f32>::ones(&[4]);
        assert!(o.as_slice().unwrap().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_from_vec_shape_checked() {
        assert!(Tensor::from_vec(vec![1.0f32, 2.0, 3.0], &[2, 2]).is_err());
        let t = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        assert_eq!(t.get(&[1, 0]), Some(3.0));
    }

    #[test]
    fn test_reshape_preserves_order() {
        let t = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        let r = t.reshape(&[3, 2]).unwrap();
        assert_eq!(r.as_slice().unwrap(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(t.reshape(&[4, 2]).is_err());
    }

    #[test]
    fn test_scalar_value() {
        let s = Tensor::from_scalar(2.5f64);
        assert_eq!(s.rank(), 0);
        assert_eq!(s.scalar_value(), Some(2.5));
    }
}
