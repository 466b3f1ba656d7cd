//! A reusable, per-parser scratch list of field slices.
//!
//! Each entry is tagged with whether its bytes are borrowed from the source
//! region or were copied out during escape processing (see
//! [`crate::strbuilder::StringBuilder`]). The list is reset between
//! records without deallocating its spine, so steady-state parsing of a
//! uniform-width CSV does no further allocation for the field list itself.

/// One field's value, tagged by where its bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<'src> {
    /// Bytes borrowed directly from the mapped/buffered source region.
    Borrowed(&'src str),
    /// Bytes that had to be copied out (quote-escape de-duplication).
    Owned(String),
}

impl<'src> Field<'src> {
    pub fn as_str(&self) -> &str {
        match self {
            Field::Borrowed(s) => s,
            Field::Owned(s) => s,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Field::Owned(_))
    }

    pub fn into_owned(self) -> String {
        match self {
            Field::Borrowed(s) => s.to_string(),
            Field::Owned(s) => s,
        }
    }
}

/// Per-parser scratch field list, reused record-to-record.
#[derive(Debug, Default)]
pub struct FieldList<'src> {
    entries: Vec<Field<'src>>,
}

impl<'src> FieldList<'src> {
    pub fn new() -> Self {
        FieldList { entries: Vec::with_capacity(16) }
    }

    pub fn push(&mut self, field: Field<'src>) {
        self.entries.push(field);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field<'src>> {
        self.entries.iter()
    }

    /// Resets the list for the next record, reusing the spine's capacity.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Transfers ownership of the entries out, leaving the list empty
    /// (spine capacity retained) for the caller to fill again. Plain
    /// `mem::take` would hand back a fresh zero-capacity `Vec`, defeating
    /// the whole point of reuse -- the replacement spine keeps the same
    /// capacity so next record's pushes don't reallocate from scratch.
    pub fn take(&mut self) -> Vec<Field<'src>> {
        let cap = self.entries.capacity();
        std::mem::replace(&mut self.entries, Vec::with_capacity(cap))
    }
}
