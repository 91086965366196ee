use lucent_core::{Result, Tensor};
use num_traits::{Float, FromPrimitive};

/// Elementwise activation applied after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// Identity (no activation).
    #[default]
    Identity,
    Relu,
    Sigmoid,
    Tanh,
    /// Tanh-approximated GELU.
    Gelu,
}

impl Activation {
    pub fn apply<T>(&self, input: &Tensor<T>) -> Result<Tensor<T>>
    where
        T: Float + FromPrimitive,
    {
        Ok(match self {
            Activation::Identity => input.clone(),
            Activation::Relu => input.map(|v| v.max(T::zero())),
            Activation::Sigmoid => input.map(|v| T::one() / (T::one() + (-*v).exp())),
            Activation::Tanh => input.map(|v| v.tanh()),
            Activation::Gelu => {
                // 0.5 * x * (1 + tanh(sqrt(2/pi) * (x + 0.044715 * x^3)))
                let half = T::from(0.5).expect("representable constant");
                let c = T::from(0.797_884_560_802_865_4).expect("representable constant");
                let k = T::from(0.044715).expect("representable constant");
                input.map(|v| {
                    let x = *v;
                    half * x * (T::one() + (c * (x + k * x * x * x)).tanh())
                })
            }
        })
    }
}
