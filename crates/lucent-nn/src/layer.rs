//! The layer contract and generic driver.

use crate::record::{ParamRecord, StateRecord};
use lucent_core::{Result, Tensor};
use rand::rngs::StdRng;

/// A stateless-by-construction layer.
///
/// The struct itself is immutable configuration. Everything learnable or
/// mutable is created by the `init_*` methods and passed back in on every
/// call; `forward` returns a fresh state record instead of mutating.
///
/// `HAS_AFFINE` and `TRACKS_RUNNING_STATS` are part of the layer's static
/// type, so capability branches resolve at compile time and an autodiff
/// backend can treat them as constants rather than traced data.
pub trait Layer<T> {
    const HAS_AFFINE: bool = false;
    const TRACKS_RUNNING_STATS: bool = false;

    /// Draw the initial parameter record for this configuration.
    fn init_parameters(&self, rng: &mut StdRng) -> Result<ParamRecord<T>>;

    /// Build the initial state record for this configuration.
    fn init_state(&self, rng: &mut StdRng) -> Result<StateRecord<T>>;

    /// Run the layer. Returns the output and the state to use next call.
    fn forward(
        &self,
        input: &Tensor<T>,
        params: &ParamRecord<T>,
        state: &StateRecord<T>,
    ) -> Result<(Tensor<T>, StateRecord<T>)>;
}

/// Does the layer type carry learnable scale/bias parameters?
pub fn has_affine<T, L: Layer<T>>(_layer: &L) -> bool {
    L::HAS_AFFINE
}

/// Does the layer type persist running statistics across calls?
pub fn tracks_running_stats<T, L: Layer<T>>(_layer: &L) -> bool {
    L::TRACKS_RUNNING_STATS
}

/// Generic forward driver. Wrappers such as weight normalization call this
/// recursively to invoke the layer they wrap.
pub fn apply<T, L: Layer<T>>(
    layer: &L,
    input: &Tensor<T>,
    params: &ParamRecord<T>,
    state: &StateRecord<T>,
) -> Result<(Tensor<T>, StateRecord<T>)> {
    layer.forward(input, params, state)
}

/// Switch a state record into training mode.
pub fn trainmode<T>(state: StateRecord<T>) -> StateRecord<T> {
    state.with_training(true)
}

/// Switch a state record into evaluation mode.
pub fn testmode<T>(state: StateRecord<T>) -> StateRecord<T> {
    state.with_training(false)
}
