// dialect.rs — Contract between a dialect and the name repository
//
// A dialect supplies its declared types, builtin operations, reserved words
// and canonical per-type operations. The repository only reads the dialect
// during construction and keeps borrowed references into it afterwards, so
// the dialect must outlive every repository built from it.

use serde::{Deserialize, Serialize};

/// Prefix shared by the family of raw-code injection builtins.
pub const VERBATIM_PREFIX: &str = "verbatim";

/// Declaration of one builtin operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuiltinFunction {
    pub name: String,
    /// Parameter type labels. An empty label means "untyped".
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Return type labels.
    #[serde(default)]
    pub returns: Vec<String>,
}

impl BuiltinFunction {
    pub fn new(name: impl Into<String>, parameters: Vec<String>, returns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            parameters,
            returns,
        }
    }

    /// Builtins of the verbatim family are distinguished only by arity.
    pub fn is_verbatim(&self) -> bool {
        self.name.starts_with(VERBATIM_PREFIX)
    }

    /// `(parameter count, return count)`.
    pub fn arity(&self) -> (usize, usize) {
        (self.parameters.len(), self.returns.len())
    }
}

/// Target-specific view of a dialect, for callers that need more than the
/// generic contract (e.g. an execution-target variant with object access).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetInfo {
    /// Target revision the dialect was built for.
    pub version: String,
    /// Whether object-access builtins (data offsets, sizes) are available.
    #[serde(default)]
    pub object_access: bool,
}

/// The dialect contract consumed by `NameRepository`.
pub trait Dialect {
    /// Declared type labels in order. Empty for a typeless dialect.
    fn types(&self) -> &[String];

    fn bool_type(&self) -> &str;

    fn default_type(&self) -> &str;

    /// Labels of all builtins, in a stable order. Members of the verbatim
    /// family are not listed; they are resolved on demand through `builtin`.
    fn builtin_names(&self) -> Vec<&str>;

    fn builtin(&self, label: &str) -> Option<&BuiltinFunction>;

    fn reserved_identifier(&self, label: &str) -> bool;

    fn discard_function(&self, type_label: &str) -> Option<&BuiltinFunction>;

    fn equality_function(&self, type_label: &str) -> Option<&BuiltinFunction>;

    fn memory_load_function(&self, type_label: &str) -> Option<&BuiltinFunction>;

    fn memory_store_function(&self, type_label: &str) -> Option<&BuiltinFunction>;

    fn storage_load_function(&self, type_label: &str) -> Option<&BuiltinFunction>;

    fn storage_store_function(&self, type_label: &str) -> Option<&BuiltinFunction>;

    fn hash_function(&self, type_label: &str) -> Option<&BuiltinFunction>;

    fn boolean_negation_function(&self) -> Option<&BuiltinFunction>;

    /// Capability query for the target-specific view. `None` for generic dialects.
    fn target(&self) -> Option<&TargetInfo> {
        None
    }
}
