// table_dialect.rs — Data-driven dialect loaded from JSON definitions
//
// A `DialectDef` lists types, builtins, reserved words and the canonical
// per-type operations. `TableDialect` validates a definition once and then
// answers the `Dialect` queries from lookup tables.
//
// Preconditions: none.
// Postconditions: every builtin, type and canonical reference of a loaded
//                 dialect resolves; verbatim builtins exist for every arity
//                 pair up to `verbatim_max_arity`.
// Failure modes: I/O, malformed JSON, or inconsistent definitions produce a
//                `DialectError`.
// Side effects: `load` reads one file.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dialect::{BuiltinFunction, Dialect, TargetInfo, VERBATIM_PREFIX};

// ── Definition format ───────────────────────────────────────────────────────

/// Canonical operations of one type. Each entry names a builtin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanonicalOps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_load: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_store: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_load: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_store: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl CanonicalOps {
    fn entries(&self) -> [(&'static str, Option<&str>); 7] {
        [
            ("discard", self.discard.as_deref()),
            ("equality", self.equality.as_deref()),
            ("memory_load", self.memory_load.as_deref()),
            ("memory_store", self.memory_store.as_deref()),
            ("storage_load", self.storage_load.as_deref()),
            ("storage_store", self.storage_store.as_deref()),
            ("hash", self.hash.as_deref()),
        ]
    }
}

/// On-disk dialect definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DialectDef {
    pub name: String,
    /// Declared types. Empty means the dialect is typeless.
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub bool_type: String,
    #[serde(default)]
    pub default_type: String,
    pub builtins: Vec<BuiltinFunction>,
    #[serde(default)]
    pub reserved: Vec<String>,
    /// Canonical operations keyed by type label (`""` for typeless dialects).
    #[serde(default)]
    pub canonical: BTreeMap<String, CanonicalOps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_negation: Option<String>,
    /// Synthesize `verbatim_{p}i_{r}o` for all `p, r <= n`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbatim_max_arity: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetInfo>,
}

/// Largest accepted `verbatim_max_arity`. Verbatim builtins are synthesized
/// eagerly, `(n + 1)^2` of them.
pub const MAX_VERBATIM_ARITY: usize = 99;

// ── Errors ──────────────────────────────────────────────────────────────────

/// Errors that can occur while loading or validating a dialect.
#[derive(Debug)]
pub enum DialectError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    JsonError {
        path: PathBuf,
        source: serde_json::Error,
    },
    DuplicateBuiltin {
        name: String,
    },
    DuplicateType {
        type_label: String,
    },
    TypeNamedLikeBuiltin {
        type_label: String,
    },
    VerbatimArityTooLarge {
        max: usize,
    },
    ReservedPrefix {
        name: String,
    },
    UnknownType {
        context: String,
        type_label: String,
    },
    UnknownBuiltin {
        context: String,
        name: String,
    },
}

impl fmt::Display for DialectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialectError::IoError { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            DialectError::JsonError { path, source } => {
                write!(f, "{}: invalid dialect definition: {}", path.display(), source)
            }
            DialectError::DuplicateBuiltin { name } => {
                write!(f, "duplicate builtin '{}'", name)
            }
            DialectError::DuplicateType { type_label } => {
                write!(f, "duplicate type '{}'", type_label)
            }
            DialectError::TypeNamedLikeBuiltin { type_label } => {
                write!(f, "type '{}' has the same name as a builtin", type_label)
            }
            DialectError::VerbatimArityTooLarge { max } => {
                write!(
                    f,
                    "verbatim_max_arity {} exceeds the limit of {}",
                    max, MAX_VERBATIM_ARITY
                )
            }
            DialectError::ReservedPrefix { name } => {
                write!(
                    f,
                    "builtin '{}' uses the reserved '{}' prefix; use verbatim_max_arity instead",
                    name, VERBATIM_PREFIX
                )
            }
            DialectError::UnknownType {
                context,
                type_label,
            } => {
                write!(f, "{}: unknown type '{}'", context, type_label)
            }
            DialectError::UnknownBuiltin { context, name } => {
                write!(f, "{}: unknown builtin '{}'", context, name)
            }
        }
    }
}

impl std::error::Error for DialectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DialectError::IoError { source, .. } => Some(source),
            DialectError::JsonError { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ── Dialect ─────────────────────────────────────────────────────────────────

/// A validated, table-backed dialect.
#[derive(Debug)]
pub struct TableDialect {
    def: DialectDef,
    builtins: BTreeMap<String, BuiltinFunction>,
    verbatim: BTreeMap<String, BuiltinFunction>,
    reserved: HashSet<String>,
}

impl TableDialect {
    /// Load and validate a JSON dialect definition.
    pub fn load(path: &Path) -> Result<Self, DialectError> {
        let source = std::fs::read_to_string(path).map_err(|e| DialectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&source, path)
    }

    /// Parse a definition from a string. `path` is only used in error messages.
    pub fn parse(source: &str, path: &Path) -> Result<Self, DialectError> {
        let def: DialectDef =
            serde_json::from_str(source).map_err(|e| DialectError::JsonError {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::from_def(def)
    }

    pub fn from_def(def: DialectDef) -> Result<Self, DialectError> {
        let declared: HashSet<&str> = def.types.iter().map(String::as_str).collect();
        let check_type = |context: String, type_label: &str| {
            if type_label.is_empty() || declared.contains(type_label) {
                Ok(())
            } else {
                Err(DialectError::UnknownType {
                    context,
                    type_label: type_label.to_string(),
                })
            }
        };

        check_type("bool_type".to_string(), &def.bool_type)?;
        check_type("default_type".to_string(), &def.default_type)?;

        let mut builtins = BTreeMap::new();
        for builtin in &def.builtins {
            if builtin.is_verbatim() {
                return Err(DialectError::ReservedPrefix {
                    name: builtin.name.clone(),
                });
            }
            for ty in builtin.parameters.iter().chain(&builtin.returns) {
                check_type(format!("builtin '{}'", builtin.name), ty)?;
            }
            if builtins
                .insert(builtin.name.clone(), builtin.clone())
                .is_some()
            {
                return Err(DialectError::DuplicateBuiltin {
                    name: builtin.name.clone(),
                });
            }
        }

        let mut seen_types = HashSet::new();
        for ty in &def.types {
            if !seen_types.insert(ty.as_str()) {
                return Err(DialectError::DuplicateType {
                    type_label: ty.clone(),
                });
            }
            if builtins.contains_key(ty) {
                return Err(DialectError::TypeNamedLikeBuiltin {
                    type_label: ty.clone(),
                });
            }
        }

        for (type_label, ops) in &def.canonical {
            check_type("canonical".to_string(), type_label)?;
            for (family, op) in ops.entries() {
                if let Some(op) = op {
                    if !builtins.contains_key(op) {
                        return Err(DialectError::UnknownBuiltin {
                            context: format!("canonical {} for type '{}'", family, type_label),
                            name: op.to_string(),
                        });
                    }
                }
            }
        }

        if let Some(negation) = &def.boolean_negation {
            if !builtins.contains_key(negation) {
                return Err(DialectError::UnknownBuiltin {
                    context: "boolean_negation".to_string(),
                    name: negation.clone(),
                });
            }
        }

        let mut verbatim = BTreeMap::new();
        if let Some(max) = def.verbatim_max_arity {
            if max > MAX_VERBATIM_ARITY {
                return Err(DialectError::VerbatimArityTooLarge { max });
            }
            for params in 0..=max {
                for rets in 0..=max {
                    let name = format!("{}_{}i_{}o", VERBATIM_PREFIX, params, rets);
                    let f = BuiltinFunction::new(
                        name.clone(),
                        vec![def.default_type.clone(); params],
                        vec![def.default_type.clone(); rets],
                    );
                    verbatim.insert(name, f);
                }
            }
        }

        let reserved = def.reserved.iter().cloned().collect();

        Ok(TableDialect {
            def,
            builtins,
            verbatim,
            reserved,
        })
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn def(&self) -> &DialectDef {
        &self.def
    }

    /// Compact JSON of the definition, stable across formatting of the source file.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(&self.def).unwrap_or_default()
    }

    /// SHA-256 of `canonical_json()` as 64 hex characters.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};

        let digest = Sha256::digest(self.canonical_json().as_bytes());
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn canonical(
        &self,
        type_label: &str,
        pick: fn(&CanonicalOps) -> Option<&String>,
    ) -> Option<&BuiltinFunction> {
        let ops = self.def.canonical.get(type_label)?;
        self.builtins.get(pick(ops)?)
    }
}

impl Dialect for TableDialect {
    fn types(&self) -> &[String] {
        &self.def.types
    }

    fn bool_type(&self) -> &str {
        &self.def.bool_type
    }

    fn default_type(&self) -> &str {
        &self.def.default_type
    }

    fn builtin_names(&self) -> Vec<&str> {
        self.builtins.keys().map(String::as_str).collect()
    }

    fn builtin(&self, label: &str) -> Option<&BuiltinFunction> {
        self.builtins
            .get(label)
            .or_else(|| self.verbatim.get(label))
    }

    fn reserved_identifier(&self, label: &str) -> bool {
        self.reserved.contains(label) || self.builtins.contains_key(label)
    }

    fn discard_function(&self, type_label: &str) -> Option<&BuiltinFunction> {
        self.canonical(type_label, |ops| ops.discard.as_ref())
    }

    fn equality_function(&self, type_label: &str) -> Option<&BuiltinFunction> {
        self.canonical(type_label, |ops| ops.equality.as_ref())
    }

    fn memory_load_function(&self, type_label: &str) -> Option<&BuiltinFunction> {
        self.canonical(type_label, |ops| ops.memory_load.as_ref())
    }

    fn memory_store_function(&self, type_label: &str) -> Option<&BuiltinFunction> {
        self.canonical(type_label, |ops| ops.memory_store.as_ref())
    }

    fn storage_load_function(&self, type_label: &str) -> Option<&BuiltinFunction> {
        self.canonical(type_label, |ops| ops.storage_load.as_ref())
    }

    fn storage_store_function(&self, type_label: &str) -> Option<&BuiltinFunction> {
        self.canonical(type_label, |ops| ops.storage_store.as_ref())
    }

    fn hash_function(&self, type_label: &str) -> Option<&BuiltinFunction> {
        self.canonical(type_label, |ops| ops.hash.as_ref())
    }

    fn boolean_negation_function(&self) -> Option<&BuiltinFunction> {
        self.builtins.get(self.def.boolean_negation.as_ref()?)
    }

    fn target(&self) -> Option<&TargetInfo> {
        self.def.target.as_ref()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
