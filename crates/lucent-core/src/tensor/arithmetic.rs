use super::Tensor;
use crate::{Result, TensorError};
use ndarray::{IxDyn, Zip};
use num_traits::{Float, FromPrimitive, ToPrimitive};

impl<T> Tensor<T>
where
    T: Clone,
{
    fn binary_op<F>(&self, other: &Self, op: &str, f: F) -> Result<Self>
    where
        F: Fn(&T, &T) -> T,
    {
        let out_shape = self.shape.broadcast_shape(&other.shape).ok_or_else(|| {
            TensorError::shape_mismatch(op, self.shape.to_string(), other.shape.to_string())
        })?;
        let dims = out_shape.dims();
        let lhs = self.data.broadcast(IxDyn(dims)).ok_or_else(|| {
            TensorError::shape_mismatch(op, out_shape.to_string(), self.shape.to_string())
        })?;
        let rhs = other.data.broadcast(IxDyn(dims)).ok_or_else(|| {
            TensorError::shape_mismatch(op, out_shape.to_string(), other.shape.to_string())
        })?;
        let data = Zip::from(&lhs).and(&rhs).map_collect(|a, b| f(a, b));
        Ok(Self::from_array(data))
    }

    /// Apply `f` to every element.
    pub fn map<U, F>(&self, f: F) -> Tensor<U>
    where
        F: Fn(&T) -> U,
    {
        Tensor::from_array(self.data.map(f))
    }
}

impl<T> Tensor<T>
where
    T: Float,
{
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.binary_op(other, "add", |a, b| *a + *b)
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.binary_op(other, "sub", |a, b| *a - *b)
    }

    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.binary_op(other, "mul", |a, b| *a * *b)
    }

    pub fn div(&self, other: &Self) -> Result<Self> {
        self.binary_op(other, "div", |a, b| *a / *b)
    }

    pub fn add_scalar(&self, value: T) -> Self {
        self.map(|a| *a + value)
    }

    pub fn mul_scalar(&self, value: T) -> Self {
        self.map(|a| *a * value)
    }

    pub fn sqrt(&self) -> Result<Self> {
        Ok(self.map(|a| a.sqrt()))
    }

    pub fn neg(&self) -> Self {
        self.map(|a| a.neg())
    }

    /// True when every element is exactly zero.
    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|v| *v == T::zero())
    }
}

/// Convert the element type, going through `f64`.
///
/// This is the "match element type" utility used to align an input's
/// precision with a layer's parameters before normalization.
pub fn astype<T, U>(x: &Tensor<T>) -> Result<Tensor<U>>
where
    T: Clone + ToPrimitive,
    U: FromPrimitive,
{
    let mut out = Vec::with_capacity(x.len());
    for v in x.array().iter() {
        let wide = v.to_f64().ok_or_else(|| {
            TensorError::invalid_argument("astype", "source value is not representable as f64")
        })?;
        out.push(U::from_f64(wide).ok_or_else(|| {
            TensorError::invalid_argument("astype", "value does not fit the target element type")
        })?);
    }
    Tensor::from_vec(out, x.shape().dims())
}
