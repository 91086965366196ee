//! Functional neural-network layers.
//!
//! Layers in this crate are immutable configuration values. Learnable
//! parameters and bookkeeping state live in explicit records created by
//! `init_parameters`/`init_state` and threaded through every `forward`
//! call, which returns the output together with a new state record. No
//! layer mutates shared memory; the caller owns persisting the returned
//! state.
//!
//! ```rust,ignore
//! use lucent_nn::{apply, BatchNorm, Layer};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let layer = BatchNorm::<f32>::new(64);
//! let mut rng = StdRng::seed_from_u64(0);
//! let ps = layer.init_parameters(&mut rng)?;
//! let st = layer.init_state(&mut rng)?;
//! let (y, st) = apply(&layer, &x, &ps, &st)?;
//! ```

pub mod activation;
pub mod init;
pub mod layer;
pub mod layers;
pub mod record;

pub use activation::Activation;
pub use layer::{apply, has_affine, testmode, tracks_running_stats, trainmode, Layer};
pub use layers::normalization::{BatchNorm, GroupNorm, InstanceNorm, LayerNorm, WeightNorm};
pub use record::{parameter_count, ParamEntry, ParamRecord, StateRecord};
