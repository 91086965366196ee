//! The CPU tensor type.
//!
//! `Tensor<T>` pairs an `ndarray::ArrayD` with a [`Shape`]. Construction
//! lives in [`creation`], elementwise arithmetic in [`arithmetic`]; axis
//! reductions and the normalization kernels are in [`crate::ops`].

mod arithmetic;
mod creation;

pub use arithmetic::astype;

use crate::Shape;
use ndarray::ArrayD;

/// Dense, row-major, CPU-resident tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    pub(crate) data: ArrayD<T>,
    pub(crate) shape: Shape,
}

impl<T> Tensor<T> {
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn len(&self) -> usize {
        self.shape.elements()
    }

    pub fn is_empty(&self) -> bool {
        self.shape.elements() == 0
    }

    /// Borrow the underlying `ndarray` storage.
    pub fn array(&self) -> &ArrayD<T> {
        &self.data
    }

    /// Contiguous view of the data, if the layout allows one.
    pub fn as_slice(&self) -> Option<&[T]> {
        self.data.as_slice()
    }

    /// Value at a multi-dimensional index, `None` when out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<T>
    where
        T: Clone,
    {
        self.data.get(index).cloned()
    }

    /// Value of a rank-0 or single-element tensor.
    pub fn scalar_value(&self) -> Option<T>
    where
        T: Clone,
    {
        if self.len() == 1 {
            self.data.iter().next().cloned()
        } else {
            None
        }
    }
}
