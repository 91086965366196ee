//! The two tracked representations.

use lucent_core::Tensor;
use num_traits::Zero;
use std::cell::{Cell, RefCell};

/// A single scalar tracked by the reverse-mode backend.
///
/// Holds the forward value plus the gradient accumulated for it during the
/// backward sweep. An array of these (`Tensor<Tracked<T>>`) is the
/// element-wise tracked representation the [`crate::compat`] shims exist
/// for.
#[derive(Debug, Clone)]
pub struct Tracked<T: Copy> {
    value: T,
    grad: Cell<T>,
}

impl<T: Copy + Zero> Tracked<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            grad: Cell::new(T::zero()),
        }
    }

    pub fn value(&self) -> T {
        self.value
    }

    pub fn grad(&self) -> T {
        self.grad.get()
    }

    /// Add a contribution to the accumulated gradient.
    pub fn accumulate(&self, delta: T)
    where
        T: std::ops::Add<Output = T>,
    {
        self.grad.set(self.grad.get() + delta);
    }
}

impl<T: Copy + PartialEq> PartialEq for Tracked<T> {
    /// Equality of the forward values only; gradients are bookkeeping.
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// One tracked array: the representation the rest of the workspace expects.
#[derive(Debug)]
pub struct TrackedTensor<T> {
    value: Tensor<T>,
    grad: RefCell<Option<Tensor<T>>>,
}

impl<T> TrackedTensor<T> {
    pub fn new(value: Tensor<T>) -> Self {
        Self {
            value,
            grad: RefCell::new(None),
        }
    }

    pub fn value(&self) -> &Tensor<T> {
        &self.value
    }

    pub fn into_value(self) -> Tensor<T> {
        self.value
    }

    pub fn grad(&self) -> Option<Tensor<T>>
    where
        T: Clone,
    {
        self.grad.borrow().clone()
    }

    pub fn set_grad(&self, grad: Tensor<T>) {
        *self.grad.borrow_mut() = Some(grad);
    }
}

impl<T> TrackedTensor<T>
where
    T: Copy + Zero,
{
    /// Repack an array-of-trackables into a single tracked array.
    ///
    /// Element order is preserved; per-element gradients are dropped, as
    /// repacking marks a fresh node in the trace.
    pub fn collect(elements: &Tensor<Tracked<T>>) -> Self {
        Self::new(elements.map(|t| t.value()))
    }
}

/// Lift a plain tensor into the array-of-trackables representation.
pub fn track_elements<T: Copy + Zero>(x: &Tensor<T>) -> Tensor<Tracked<T>> {
    x.map(|v| Tracked::new(*v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_scalar_accumulates() {
        let t = Tracked::new(3.0f64);
        assert_eq!(t.value(), 3.0);
        assert_eq!(t.grad(), 0.0);
        t.accumulate(0.5);
        t.accumulate(0.25);
        assert_eq!(t.grad(), 0.75);
    }

    #[test]
    fn test_collect_preserves_values_and_shape() {
        let x = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let elems = track_elements(&x);
        let packed = TrackedTensor::collect(&elems);
        assert_eq!(packed.value(), &x);
        assert!(packed.grad().is_none());
    }
}
