//! Weight normalization.
//!
//! A higher-order layer that wraps another layer and reparameterizes a
//! chosen subset of its parameters into magnitude/direction pairs,
//! `w = v * g / ||v||`, recombining them on every call before delegating
//! to the wrapped layer. Decoupling magnitude from direction gives the
//! optimizer independent control over the two (Salimans & Kingma, 2016).

use crate::layer::{apply, Layer};
use crate::record::{ParamEntry, ParamRecord, StateRecord};
use lucent_core::ops::norm_except;
use lucent_core::{Result, Tensor, TensorError};
use num_traits::Float;
use rand::rngs::StdRng;
use std::marker::PhantomData;

/// Wraps `L`, reparameterizing the named parameters.
///
/// The parameter record produced by [`Layer::init_parameters`] has two
/// groups: `normalized` holds, for each chosen name `k` in declaration
/// order, the magnitude `{k}_g` and the full-shape direction `{k}_v`
/// (initialized to the original value); `unnormalized` holds every other
/// parameter of the wrapped layer untouched. The wrapper adds no state of
/// its own.
#[derive(Debug, Clone)]
pub struct WeightNorm<T, L>
where
    T: Float,
    L: Layer<T>,
{
    layer: L,
    which_params: Vec<&'static str>,
    dims: Option<Vec<usize>>,
    _element: PhantomData<T>,
}

impl<T, L> WeightNorm<T, L>
where
    T: Float,
    L: Layer<T>,
{
    /// Wrap `layer`, reparameterizing `which_params`.
    ///
    /// `dims`, when given, names one kept axis per chosen parameter: the
    /// magnitude then has one value per slice along that axis. Without it
    /// the norm pools the whole tensor into a single magnitude. Nothing
    /// about the wrapped layer is validated here; that happens when
    /// parameters are initialized.
    pub fn new(
        layer: L,
        which_params: Vec<&'static str>,
        dims: Option<Vec<usize>>,
    ) -> Result<Self> {
        if which_params.is_empty() {
            return Err(TensorError::invalid_argument(
                "weight_norm",
                "which_params must name at least one parameter",
            ));
        }
        if let Some(dims) = &dims {
            if dims.len() != which_params.len() {
                return Err(TensorError::invalid_argument(
                    "weight_norm",
                    format!(
                        "dims has {} entries for {} chosen parameters",
                        dims.len(),
                        which_params.len()
                    ),
                ));
            }
        }
        Ok(Self {
            layer,
            which_params,
            dims,
            _element: PhantomData,
        })
    }

    pub fn inner(&self) -> &L {
        &self.layer
    }

    pub fn which_params(&self) -> &[&'static str] {
        &self.which_params
    }

    fn kept_axis(&self, index: usize) -> Option<usize> {
        self.dims.as_ref().map(|d| d[index])
    }

    /// Rebuild the chosen parameters from their `(g, v)` pairs, in
    /// declaration order, and append the untouched remainder. The loop is
    /// monomorphized per wrapped-layer type; `T::epsilon()` guards the
    /// division against a near-degenerate direction.
    #[inline]
    fn recombine(&self, params: &ParamRecord<T>) -> Result<ParamRecord<T>> {
        let normalized = params.record("normalized")?;
        let unnormalized = params.record("unnormalized")?;

        let mut rebuilt = ParamRecord::new();
        for (index, name) in self.which_params.iter().enumerate() {
            let g = normalized.tensor(&format!("{name}_g"))?;
            let v = normalized.tensor(&format!("{name}_v"))?;
            let norm = norm_except(v, self.kept_axis(index))?;
            let w = v.mul(&g.div(&norm.add_scalar(T::epsilon()))?)?;
            rebuilt.insert_tensor(*name, w);
        }
        for (name, entry) in unnormalized.iter() {
            rebuilt.insert(name.clone(), entry.clone());
        }
        Ok(rebuilt)
    }
}

impl<T, L> Layer<T> for WeightNorm<T, L>
where
    T: Float,
    L: Layer<T>,
{
    // The wrapper is transparent to capability queries.
    const HAS_AFFINE: bool = L::HAS_AFFINE;
    const TRACKS_RUNNING_STATS: bool = L::TRACKS_RUNNING_STATS;

    fn init_parameters(&self, rng: &mut StdRng) -> Result<ParamRecord<T>> {
        let mut inner = self.layer.init_parameters(rng)?;

        let mut normalized = ParamRecord::new();
        for (index, name) in self.which_params.iter().enumerate() {
            let value = match inner.remove(name) {
                Some(ParamEntry::Tensor(t)) => t,
                Some(ParamEntry::Record(_)) => {
                    return Err(TensorError::unsupported_operation(
                        "weight_norm",
                        format!("parameter '{name}' is a nested record"),
                    ))
                }
                None => {
                    return Err(TensorError::invalid_argument(
                        "weight_norm",
                        format!("wrapped layer has no parameter '{name}'"),
                    ))
                }
            };
            // A zero direction has no defined gradient under ||v||.
            if value.is_all_zero() {
                return Err(TensorError::invalid_argument(
                    "weight_norm",
                    format!("parameter '{name}' is identically zero at initialization"),
                ));
            }
            normalized.insert_tensor(
                format!("{name}_g"),
                norm_except(&value, self.kept_axis(index))?,
            );
            normalized.insert_tensor(format!("{name}_v"), value);
        }

        let mut params = ParamRecord::new();
        params.insert_record("normalized", normalized);
        params.insert_record("unnormalized", inner);
        Ok(params)
    }

    fn init_state(&self, rng: &mut StdRng) -> Result<StateRecord<T>> {
        self.layer.init_state(rng)
    }

    fn forward(
        &self,
        input: &Tensor<T>,
        params: &ParamRecord<T>,
        state: &StateRecord<T>,
    ) -> Result<(Tensor<T>, StateRecord<T>)> {
        let rebuilt = self.recombine(params)?;
        apply(&self.layer, input, &rebuilt, state)
    }
}
