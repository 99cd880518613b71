// id.rs — Stable identities for interned names
//
// A `Name` is a dense index into the repository's name table. Names are
// allocated in creation order and never reused, so comparing or hashing them
// is as cheap as comparing integers and they may be cached by value for the
// lifetime of the repository.

use std::fmt;

/// Identity of one interned or derived identifier.
///
/// The total order equals creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Name(pub u32);

impl Name {
    /// The interned empty label. Always the first entry of a repository.
    pub const EMPTY: Name = Name(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        Name(u32::try_from(index).expect("internal: name table exceeds u32 range"))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index into the label store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(pub u32);

impl LabelId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        LabelId(u32::try_from(index).expect("internal: label store exceeds u32 range"))
    }
}

/// One slot of the name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Spelling is known: refers to a label in the label store.
    Defined(LabelId),
    /// Anonymous alias of a base name; spelling is chosen by label generation.
    Derived(Name),
}

impl Entry {
    pub fn is_derived(self) -> bool {
        matches!(self, Entry::Derived(_))
    }
}
