// repository.rs — Name table, type/builtin registries and reverse lookups
//
// One `NameRepository` is built per dialect. Construction interns the empty
// label, the dialect's types, the verbatim marker and every builtin, then
// resolves the predefined names. Optimizer passes afterwards intern source
// spellings and derive anonymous names; `generate_labels` (labels.rs) gives
// the surviving derived names their final spelling.
//
// Preconditions: the dialect outlives the repository and does not change.
// Postconditions: `Name(0)` is the empty label; types occupy
//                 `boundaries().types`, builtins `boundaries().builtins`;
//                 every derived entry chains to a defined entry.
// Failure modes: contract violations (unknown type labels, asking for the
//                label of an unlabeled name) panic with an `internal:` message.
// Side effects: none.

use std::fmt;
use std::ops::Range;

use rustc_hash::FxHashMap;

use crate::dialect::{BuiltinFunction, Dialect, TargetInfo};
use crate::id::{Entry, LabelId, Name};
use crate::predefined::{
    PredefinedBuiltins, PredefinedNames, PLACEHOLDER_ONE, PLACEHOLDER_THIRTY_TWO,
    PLACEHOLDER_ZERO, RESERVED_OPERATIONS, VERBATIM_MARKER,
};

// ── Public types ────────────────────────────────────────────────────────────

/// A builtin resolved against the repository: parameter and return types are
/// names, the definition stays owned by the dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinHandle<'a> {
    pub name: Name,
    pub parameters: Vec<Name>,
    pub returns: Vec<Name>,
    pub definition: &'a BuiltinFunction,
}

/// Index ranges of the type and builtin names. Everything at or above
/// `builtins.end` is a user or derived name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Boundaries {
    pub types: Range<usize>,
    pub builtins: Range<usize>,
}

// ── Repository ──────────────────────────────────────────────────────────────

pub struct NameRepository<'a> {
    dialect: &'a dyn Dialect,
    target: Option<&'a TargetInfo>,

    pub(crate) labels: Vec<String>,
    /// Most recent label slot per spelling.
    pub(crate) label_slots: FxHashMap<String, LabelId>,
    pub(crate) entries: Vec<Entry>,
    pub(crate) boundaries: Boundaries,

    types: Vec<(Name, String)>,
    builtins: FxHashMap<Name, BuiltinHandle<'a>>,
    builtin_names: FxHashMap<&'a str, Name>,
    verbatim: FxHashMap<(usize, usize), Name>,

    predefined: PredefinedNames,
    predefined_builtins: PredefinedBuiltins,
}

impl<'a> NameRepository<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        let mut repo = NameRepository {
            dialect,
            target: dialect.target(),
            labels: Vec::new(),
            label_slots: FxHashMap::default(),
            entries: Vec::new(),
            boundaries: Boundaries::default(),
            types: Vec::new(),
            builtins: FxHashMap::default(),
            builtin_names: FxHashMap::default(),
            verbatim: FxHashMap::default(),
            predefined: PredefinedNames::default(),
            predefined_builtins: PredefinedBuiltins::default(),
        };

        repo.predefined.empty = repo.push_defined("");
        debug_assert_eq!(repo.predefined.empty, Name::EMPTY);

        // Types. A typeless dialect gets the empty sentinel at index 0.
        let declared = dialect.types();
        let types_begin = if declared.is_empty() || declared.iter().any(|t| t.is_empty()) {
            0
        } else {
            1
        };
        if declared.is_empty() {
            repo.types.push((Name::EMPTY, String::new()));
        }
        for ty in declared {
            let name = if ty.is_empty() {
                Name::EMPTY
            } else {
                repo.intern(ty)
            };
            repo.types.push((name, ty.clone()));
        }
        repo.boundaries.types = types_begin..repo.entries.len();

        // Builtins, preceded by the verbatim marker so that verbatim names
        // count as builtins.
        let builtins_begin = repo.entries.len();
        repo.predefined.verbatim = repo.push_defined(VERBATIM_MARKER);
        repo.builtin_names
            .insert(VERBATIM_MARKER, repo.predefined.verbatim);
        for label in dialect.builtin_names() {
            if label.is_empty() || repo.builtin_names.contains_key(label) {
                continue;
            }
            let definition = dialect.builtin(label);
            if definition.is_some_and(BuiltinFunction::is_verbatim) {
                continue;
            }
            let name = repo.push_defined(label);
            repo.builtin_names.insert(label, name);
            if let Some(definition) = definition {
                let handle = repo.convert_builtin(name, definition);
                repo.builtins.insert(name, handle);
            }
        }
        repo.boundaries.builtins = builtins_begin..repo.entries.len();

        repo.predefined.bool_type = repo.resolve_type(dialect.bool_type());
        repo.predefined.default_type = repo.resolve_type(dialect.default_type());
        let reserved = RESERVED_OPERATIONS.map(|label| repo.reserved_operation(label));
        repo.predefined.set_reserved_operations(reserved);

        repo.predefined_builtins = PredefinedBuiltins::resolve(
            dialect,
            repo.types.iter().map(|(_, label)| label.as_str()),
            |label| repo.identity_of_builtin(label),
        );

        repo.predefined.placeholder_zero = repo.intern(PLACEHOLDER_ZERO);
        repo.predefined.placeholder_one = repo.intern(PLACEHOLDER_ONE);
        repo.predefined.placeholder_thirty_two = repo.intern(PLACEHOLDER_THIRTY_TWO);

        tracing::debug!(
            types = repo.types.len(),
            builtins = repo.boundaries.builtins.len(),
            names = repo.entries.len(),
            target = repo.target.is_some(),
            "name repository constructed"
        );
        repo
    }

    // ── Interning ───────────────────────────────────────────────────────────

    /// Intern a spelling. Repeated calls with the same label return the same
    /// name; builtin spellings resolve to their builtin name, and verbatim
    /// builtins to one shared name per arity.
    pub fn intern(&mut self, label: &str) -> Name {
        let dialect = self.dialect;
        if let Some(definition) = dialect.builtin(label) {
            if definition.is_verbatim() {
                return self.verbatim_name(definition);
            }
            if let Some(name) = self.identity_of_builtin(label) {
                return name;
            }
        }
        if let Some(name) = self.identity_of_label(label) {
            return name;
        }
        self.push_defined(label)
    }

    /// Mint a fresh, unlabeled alias of `name`'s base.
    pub fn derive(&mut self, name: Name) -> Name {
        let base = self.base_name_of(name);
        self.entries.push(Entry::Derived(base));
        Name::from_index(self.entries.len() - 1)
    }

    fn verbatim_name(&mut self, definition: &'a BuiltinFunction) -> Name {
        let key = definition.arity();
        if let Some(&name) = self.verbatim.get(&key) {
            return name;
        }
        let name = self.derive(self.predefined.verbatim);
        let handle = self.convert_builtin(name, definition);
        self.builtins.insert(name, handle);
        self.verbatim.insert(key, name);
        name
    }

    pub(crate) fn push_label(&mut self, label: &str) -> LabelId {
        self.labels.push(label.to_string());
        let id = LabelId::from_index(self.labels.len() - 1);
        self.label_slots.insert(label.to_string(), id);
        id
    }

    fn push_defined(&mut self, label: &str) -> Name {
        let id = self.push_label(label);
        self.entries.push(Entry::Defined(id));
        Name::from_index(self.entries.len() - 1)
    }

    fn reserved_operation(&mut self, label: &str) -> Option<Name> {
        if let Some(name) = self.identity_of_builtin(label) {
            Some(name)
        } else if self.dialect.reserved_identifier(label) {
            Some(self.intern(label))
        } else {
            None
        }
    }

    fn convert_builtin(&self, name: Name, definition: &'a BuiltinFunction) -> BuiltinHandle<'a> {
        BuiltinHandle {
            name,
            parameters: definition
                .parameters
                .iter()
                .map(|ty| self.resolve_type(ty))
                .collect(),
            returns: definition
                .returns
                .iter()
                .map(|ty| self.resolve_type(ty))
                .collect(),
            definition,
        }
    }

    /// Type label → type name, where untyped labels and typeless dialects
    /// resolve to the empty name.
    fn resolve_type(&self, label: &str) -> Name {
        if label.is_empty() || self.dialect.types().is_empty() {
            Name::EMPTY
        } else {
            self.identity_of_type(label)
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    pub fn entry(&self, name: Name) -> Entry {
        self.entries[name.index()]
    }

    pub fn is_derived(&self, name: Name) -> bool {
        self.entry(name).is_derived()
    }

    pub fn base_name_of(&self, mut name: Name) -> Name {
        while let Entry::Derived(base) = self.entry(name) {
            name = base;
        }
        name
    }

    pub fn is_type(&self, name: Name) -> bool {
        self.boundaries.types.contains(&name.index())
    }

    pub fn is_builtin(&self, name: Name) -> bool {
        self.boundaries
            .builtins
            .contains(&self.base_name_of(name).index())
    }

    pub fn is_verbatim(&self, name: Name) -> bool {
        self.base_name_of(name) == self.predefined.verbatim
    }

    pub fn type_count(&self) -> usize {
        self.boundaries.types.len()
    }

    /// The spelling of `name`, if it has one. Verbatim names report the
    /// label of their builtin definition; other derived names have none.
    pub fn label_of(&self, name: Name) -> Option<&str> {
        match self.entry(name) {
            Entry::Defined(id) => Some(self.labels[id.index()].as_str()),
            Entry::Derived(_) if self.is_verbatim(name) => self
                .builtins
                .get(&name)
                .map(|handle| handle.definition.name.as_str()),
            Entry::Derived(_) => None,
        }
    }

    pub fn required_label_of(&self, name: Name) -> &str {
        match self.label_of(name) {
            Some(label) => label,
            None => panic!("internal: name {} has no defined label", name),
        }
    }

    /// Label of the defined name at the end of `name`'s derivation chain.
    pub fn base_label_of(&self, name: Name) -> &str {
        match self.entry(self.base_name_of(name)) {
            Entry::Defined(id) => self.labels[id.index()].as_str(),
            Entry::Derived(_) => unreachable!("derivation chains end at defined names"),
        }
    }

    pub fn builtin(&self, name: Name) -> Option<&BuiltinHandle<'a>> {
        self.builtins.get(&name)
    }

    fn typed_function(&self, ty: Name, family: &[Option<Name>]) -> Option<&BuiltinHandle<'a>> {
        let name = family[self.index_of_type(ty)]?;
        self.builtin(name)
    }

    pub fn discard_function(&self, ty: Name) -> Option<&BuiltinHandle<'a>> {
        self.typed_function(ty, &self.predefined_builtins.discard)
    }

    pub fn equality_function(&self, ty: Name) -> Option<&BuiltinHandle<'a>> {
        self.typed_function(ty, &self.predefined_builtins.equality)
    }

    pub fn memory_load_function(&self, ty: Name) -> Option<&BuiltinHandle<'a>> {
        self.typed_function(ty, &self.predefined_builtins.memory_load)
    }

    pub fn memory_store_function(&self, ty: Name) -> Option<&BuiltinHandle<'a>> {
        self.typed_function(ty, &self.predefined_builtins.memory_store)
    }

    pub fn storage_load_function(&self, ty: Name) -> Option<&BuiltinHandle<'a>> {
        self.typed_function(ty, &self.predefined_builtins.storage_load)
    }

    pub fn storage_store_function(&self, ty: Name) -> Option<&BuiltinHandle<'a>> {
        self.typed_function(ty, &self.predefined_builtins.storage_store)
    }

    pub fn hash_function(&self, ty: Name) -> Option<Name> {
        self.predefined_builtins.hash[self.index_of_type(ty)]
    }

    pub fn boolean_negation_function(&self) -> Option<&BuiltinHandle<'a>> {
        self.builtin(self.predefined_builtins.boolean_negation?)
    }

    // ── Reverse lookup ──────────────────────────────────────────────────────

    /// The name currently defined with exactly `label`, if any.
    pub fn identity_of_label(&self, label: &str) -> Option<Name> {
        let slot = *self.label_slots.get(label)?;
        let defined = Entry::Defined(slot);
        // Usually the name and its label share an index.
        if self.entries.get(slot.index()) == Some(&defined) {
            return Some(Name::from_index(slot.index()));
        }
        self.entries
            .iter()
            .rposition(|entry| *entry == defined)
            .map(Name::from_index)
    }

    pub fn identity_of_builtin(&self, label: &str) -> Option<Name> {
        self.builtin_names.get(label).copied()
    }

    /// Name of a declared type. Panics for labels the dialect did not declare;
    /// a typeless dialect only resolves the empty label.
    pub fn identity_of_type(&self, label: &str) -> Name {
        match self.types.iter().find(|(_, ty)| ty == label) {
            Some(&(name, _)) => name,
            None => panic!("internal: type '{}' is not defined for this dialect", label),
        }
    }

    /// Position of `ty` in the type registry. Always 0 for a typeless dialect.
    pub fn index_of_type(&self, ty: Name) -> usize {
        if self.dialect.types().is_empty() {
            return 0;
        }
        match self.types.iter().position(|&(name, _)| name == ty) {
            Some(index) => index,
            None => panic!("internal: {} is not a type of this dialect", ty),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    /// Target-specific view of the dialect, when it provides one.
    pub fn target(&self) -> Option<&'a TargetInfo> {
        self.target
    }

    pub fn predefined(&self) -> &PredefinedNames {
        &self.predefined
    }

    pub fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    /// The type registry: `(name, label)` in declaration order.
    pub fn types(&self) -> &[(Name, String)] {
        &self.types
    }

    /// Number of names allocated so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = Name> {
        (0..self.entries.len()).map(Name::from_index)
    }
}

impl fmt::Debug for NameRepository<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameRepository")
            .field("names", &self.entries.len())
            .field("labels", &self.labels.len())
            .field("boundaries", &self.boundaries)
            .field("predefined", &self.predefined)
            .finish()
    }
}

/// Table dump, one name per line.
impl fmt::Display for NameRepository<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Boundaries { types, builtins } = &self.boundaries;
        writeln!(f, "types    [{}, {})", types.start, types.end)?;
        writeln!(f, "builtins [{}, {})", builtins.start, builtins.end)?;
        for name in self.names() {
            match self.entry(name) {
                Entry::Defined(id) => write!(f, "{} {:?}", name, self.labels[id.index()])?,
                Entry::Derived(base) => {
                    write!(f, "{} ~ {}", name, base)?;
                    if let Some(label) = self.label_of(name) {
                        write!(f, " {:?}", label)?;
                    }
                }
            }
            if self.is_type(name) {
                write!(f, " (type)")?;
            } else if builtins.contains(&name.index()) {
                write!(f, " (builtin)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
