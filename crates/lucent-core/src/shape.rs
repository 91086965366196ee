#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Tensor shape: an ordered list of dimension sizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    pub fn from_slice(dims: &[usize]) -> Self {
        Self {
            dims: dims.to_vec(),
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of elements.
    pub fn elements(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Numpy-style broadcast of two shapes, aligned at the trailing axes.
    /// Returns `None` when the shapes are incompatible.
    pub fn broadcast_shape(&self, other: &Self) -> Option<Self> {
        let rank = self.rank().max(other.rank());
        let mut result = vec![1; rank];

        for i in 0..self.rank() {
            result[rank - self.rank() + i] = self.dims[i];
        }

        for i in 0..other.rank() {
            let idx = rank - other.rank() + i;
            if result[idx] == 1 {
                result[idx] = other.dims[i];
            } else if other.dims[i] != 1 && result[idx] != other.dims[i] {
                return None;
            }
        }

        Some(Self::new(result))
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::from_slice(dims)
    }
}
