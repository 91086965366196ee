//! Parameter and state records.
//!
//! A [`ParamRecord`] is an insertion-ordered mapping from parameter name to
//! either a tensor or a nested record (weight normalization groups its
//! entries into `normalized`/`unnormalized` sub-records). A [`StateRecord`]
//! holds non-learnable bookkeeping (running statistics) plus the train/eval
//! flag. Both are plain values: "updating" one means building a new record.

use lucent_core::{Result, Tensor, TensorError};

/// One entry of a parameter record.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamEntry<T> {
    Tensor(Tensor<T>),
    Record(ParamRecord<T>),
}

/// Insertion-ordered name → entry mapping for learnable parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRecord<T> {
    entries: Vec<(String, ParamEntry<T>)>,
}

impl<T> Default for ParamRecord<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ParamRecord<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Insert an entry, replacing any existing entry of the same name in
    /// place (insertion order of the original is kept).
    pub fn insert(&mut self, name: impl Into<String>, entry: ParamEntry<T>) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = entry;
        } else {
            self.entries.push((name, entry));
        }
    }

    pub fn insert_tensor(&mut self, name: impl Into<String>, tensor: Tensor<T>) {
        self.insert(name, ParamEntry::Tensor(tensor));
    }

    pub fn insert_record(&mut self, name: impl Into<String>, record: ParamRecord<T>) {
        self.insert(name, ParamEntry::Record(record));
    }

    pub fn get(&self, name: &str) -> Option<&ParamEntry<T>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamEntry<T>> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Look up a tensor entry by name.
    pub fn tensor(&self, name: &str) -> Result<&Tensor<T>> {
        match self.get(name) {
            Some(ParamEntry::Tensor(t)) => Ok(t),
            Some(ParamEntry::Record(_)) => Err(TensorError::invalid_argument(
                "param_record",
                format!("parameter '{name}' is a nested record, not a tensor"),
            )),
            None => Err(TensorError::invalid_argument(
                "param_record",
                format!("missing parameter '{name}'"),
            )),
        }
    }

    /// Look up a nested record entry by name.
    pub fn record(&self, name: &str) -> Result<&ParamRecord<T>> {
        match self.get(name) {
            Some(ParamEntry::Record(r)) => Ok(r),
            Some(ParamEntry::Tensor(_)) => Err(TensorError::invalid_argument(
                "param_record",
                format!("parameter '{name}' is a tensor, not a nested record"),
            )),
            None => Err(TensorError::invalid_argument(
                "param_record",
                format!("missing parameter group '{name}'"),
            )),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamEntry<T>)> {
        self.entries.iter().map(|(n, e)| (n, e))
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|(n, _)| n)
    }
}

/// Total number of scalar parameters in a record, nested groups included.
pub fn parameter_count<T>(record: &ParamRecord<T>) -> usize {
    record
        .iter()
        .map(|(_, entry)| match entry {
            ParamEntry::Tensor(t) => t.len(),
            ParamEntry::Record(r) => parameter_count(r),
        })
        .sum()
}

/// Non-learnable layer state: named tensors plus the train/eval flag.
///
/// The flag is only toggled from outside a forward pass, via
/// [`crate::trainmode`]/[`crate::testmode`]; `forward` reads it but never
/// flips it.
#[derive(Debug, Clone, PartialEq)]
pub struct StateRecord<T> {
    entries: Vec<(String, Tensor<T>)>,
    training: bool,
}

impl<T> Default for StateRecord<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StateRecord<T> {
    /// Fresh state: no entries, training mode on.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            training: true,
        }
    }

    pub fn training(&self) -> bool {
        self.training
    }

    pub fn with_training(mut self, training: bool) -> Self {
        self.training = training;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor<T>) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = tensor;
        } else {
            self.entries.push((name, tensor));
        }
    }

    pub fn get(&self, name: &str) -> Result<&Tensor<T>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| {
                TensorError::invalid_argument(
                    "state_record",
                    format!("missing state entry '{name}'"),
                )
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Tensor<T>)> {
        self.entries.iter().map(|(n, t)| (n, t))
    }
}
