//! The record: an ordered key/value mapping that flows through the
//! pipeline. Keys are a shared, reference-counted key sequence (either the
//! current header keeper's, for explicit-header records, or a freshly
//! synthesized positional sequence, for implicit-header records); values
//! are per-field, individually borrowed-or-owned (see [`crate::field`]).

use crate::field::Field;
use std::sync::Arc;

/// A record's ordered key sequence: a header keeper's keys, shared by every
/// record of that schema, or a synthesized positional sequence.
pub type Keys = Arc<[Arc<str>]>;

#[derive(Debug, Clone)]
pub struct Record<'src> {
    pub keys: Keys,
    values: Vec<Field<'src>>,
}

impl<'src> Record<'src> {
    pub fn new(keys: Keys, values: Vec<Field<'src>>) -> Self {
        debug_assert_eq!(keys.len(), values.len(), "record keys/values length mismatch");
        Record { keys, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field<'src>)> {
        self.keys.iter().map(|k| k.as_ref()).zip(self.values.iter())
    }

    pub fn get(&self, key: &str) -> Option<&Field<'src>> {
        self.keys.iter().position(|k| k.as_ref() == key).map(|i| &self.values[i])
    }

    /// Appends a field under a brand-new key, detaching this record's keys
    /// from any shared header keeper (used by mappers that decorate a
    /// record with new fields, e.g. `<f>_fraction`).
    pub fn push_owned(&mut self, key: impl Into<Arc<str>>, value: Field<'src>) {
        let mut keys: Vec<Arc<str>> = self.keys.iter().cloned().collect();
        keys.push(key.into());
        self.keys = Arc::from(keys.into_boxed_slice());
        self.values.push(value);
    }

    pub fn values(&self) -> &[Field<'src>] {
        &self.values
    }
}
