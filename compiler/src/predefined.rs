// predefined.rs — Canonical names resolved once per repository
//
// `PredefinedNames` caches identities that optimizer passes compare against
// constantly (the empty name, the verbatim marker, boolean/default types,
// a handful of reserved operations and literal placeholders).
// `PredefinedBuiltins` keeps the dialect's canonical per-type operations as
// arrays parallel to the type registry.

use crate::dialect::{BuiltinFunction, Dialect};
use crate::id::Name;

/// Label of the marker all verbatim builtins derive from.
pub const VERBATIM_MARKER: &str = "@ verbatim";

/// Placeholder labels for literal values used by code transforms.
pub const PLACEHOLDER_ZERO: &str = "@ 0";
pub const PLACEHOLDER_ONE: &str = "@ 1";
pub const PLACEHOLDER_THIRTY_TWO: &str = "@ 32";

/// Identities fixed at construction.
///
/// The reserved operations are `None` when the dialect neither provides them
/// as builtins nor reserves their spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredefinedNames {
    pub empty: Name,
    pub verbatim: Name,
    pub bool_type: Name,
    pub default_type: Name,

    pub dataoffset: Option<Name>,
    pub datasize: Option<Name>,
    pub selfdestruct: Option<Name>,
    pub tstore: Option<Name>,
    pub memoryguard: Option<Name>,
    pub eq: Option<Name>,
    pub add: Option<Name>,
    pub sub: Option<Name>,

    pub placeholder_zero: Name,
    pub placeholder_one: Name,
    pub placeholder_thirty_two: Name,
}

/// Labels of the reserved operations, in resolution order.
pub(crate) const RESERVED_OPERATIONS: [&str; 8] = [
    "dataoffset",
    "datasize",
    "selfdestruct",
    "tstore",
    "memoryguard",
    "eq",
    "add",
    "sub",
];

impl PredefinedNames {
    /// Store the resolved reserved operations, ordered as `RESERVED_OPERATIONS`.
    pub(crate) fn set_reserved_operations(&mut self, resolved: [Option<Name>; 8]) {
        let [dataoffset, datasize, selfdestruct, tstore, memoryguard, eq, add, sub] = resolved;
        self.dataoffset = dataoffset;
        self.datasize = datasize;
        self.selfdestruct = selfdestruct;
        self.tstore = tstore;
        self.memoryguard = memoryguard;
        self.eq = eq;
        self.add = add;
        self.sub = sub;
    }
}

/// Canonical builtin operations per type. Every vector is indexed by the
/// type's position in the type registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredefinedBuiltins {
    pub boolean_negation: Option<Name>,
    pub discard: Vec<Option<Name>>,
    pub equality: Vec<Option<Name>>,
    pub memory_load: Vec<Option<Name>>,
    pub memory_store: Vec<Option<Name>>,
    pub storage_load: Vec<Option<Name>>,
    pub storage_store: Vec<Option<Name>>,
    pub hash: Vec<Option<Name>>,
}

impl PredefinedBuiltins {
    /// Resolve the canonical operations of every registered type.
    ///
    /// `builtin_name` maps a builtin label to its identity.
    pub(crate) fn resolve<'t>(
        dialect: &dyn Dialect,
        type_labels: impl IntoIterator<Item = &'t str>,
        builtin_name: impl Fn(&str) -> Option<Name>,
    ) -> Self {
        let lookup = |f: Option<&BuiltinFunction>| f.and_then(|f| builtin_name(&f.name));

        let mut result = PredefinedBuiltins {
            boolean_negation: lookup(dialect.boolean_negation_function()),
            ..Default::default()
        };
        for label in type_labels {
            result.discard.push(lookup(dialect.discard_function(label)));
            result.equality.push(lookup(dialect.equality_function(label)));
            result.memory_load.push(lookup(dialect.memory_load_function(label)));
            result.memory_store.push(lookup(dialect.memory_store_function(label)));
            result.storage_load.push(lookup(dialect.storage_load_function(label)));
            result.storage_store.push(lookup(dialect.storage_store_function(label)));
            result.hash.push(lookup(dialect.hash_function(label)));
        }
        result
    }
}
