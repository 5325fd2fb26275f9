//! The value representation look-up seam.
//!
//! Under the implicit VR encoding the stream carries no value representation,
//! so the decoder cannot always tell a sequence from a primitive value.
//! A [`VrLookup`] lets the caller supply the typical VR of an attribute,
//! which then takes precedence over any guessing.
//! Data dictionary storage itself is left to the caller.

use crate::header::{Tag, VR};
use std::collections::HashMap;

/// Type trait for anything that can translate a tag to its typical
/// value representation.
pub trait VrLookup {
    /// Retrieve the value representation of the attribute with the given tag,
    /// or `None` if it is not known.
    fn vr_of(&self, tag: Tag) -> Option<VR>;
}

impl<F> VrLookup for F
where
    F: Fn(Tag) -> Option<VR>,
{
    fn vr_of(&self, tag: Tag) -> Option<VR> {
        self(tag)
    }
}

/// A small owned table of tag to VR associations,
/// which can be filled in programmatically or from command line arguments.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VrTable {
    entries: HashMap<Tag, VR>,
}

impl VrTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the value representation of an attribute.
    pub fn insert(&mut self, tag: Tag, vr: VR) -> &mut Self {
        self.entries.insert(tag, vr);
        self
    }

    /// The number of recorded attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no attribute was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Tag, VR)> for VrTable {
    fn from_iter<T: IntoIterator<Item = (Tag, VR)>>(iter: T) -> Self {
        VrTable {
            entries: iter.into_iter().collect(),
        }
    }
}

impl VrLookup for VrTable {
    fn vr_of(&self, tag: Tag) -> Option<VR> {
        self.entries.get(&tag).copied()
    }
}
