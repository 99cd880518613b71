// labels.rs — Final label assignment for derived names
//
// Runs once per compilation unit, right before emission. Every derived name
// in the used set receives a spelling built from its base label plus the
// smallest free numeric suffix (`tmp`, `tmp_1`, `tmp_2`, ...).
//
// Preconditions: `used` holds the names still alive after optimization;
//                `reserved` holds spellings the backend cannot emit.
// Postconditions: labels of distinct used names differ and none is reserved.
//                 Entries of resolved names are rewritten to `Defined`.
// Failure modes: none recoverable; committing a reserved label is a bug and
//                panics.
// Side effects: appends to the label store and rewrites name table entries.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use crate::id::{Entry, Name};
use crate::repository::NameRepository;

impl NameRepository<'_> {
    /// Assign collision-free labels to every derived name in `used`.
    ///
    /// Names are visited in creation order and suffixes probed in ascending
    /// order, so the result depends only on `used`, `reserved` and the
    /// repository contents. A defined name whose label clashes with another
    /// used name or with `reserved` (possible when this runs more than once)
    /// is re-derived from its own label. When the chosen spelling already
    /// belongs to an unused defined name, the derived name is merged into that
    /// spelling instead of minting a new label.
    #[tracing::instrument(level = "debug", skip_all, fields(used = used.len(), reserved = reserved.len()))]
    pub fn generate_labels(&mut self, used: &BTreeSet<Name>, reserved: &BTreeSet<String>) {
        let builtins_end = self.boundaries.builtins.end;
        let mut occupied: FxHashSet<String> = self.entries[..builtins_end]
            .iter()
            .filter_map(|entry| match entry {
                Entry::Defined(id) => Some(self.labels[id.index()].clone()),
                Entry::Derived(_) => None,
            })
            .collect();

        let mut forced = FxHashSet::default();
        for &name in used {
            if self.has_fixed_label(name) {
                let label = self.required_label_of(name);
                if !occupied.insert(label.to_string()) || reserved.contains(label) {
                    forced.insert(name);
                }
            }
        }

        let mut queued: Vec<(String, Name)> = Vec::new();
        let mut merged = 0usize;
        for name in used.range(Name::from_index(builtins_end)..) {
            let name = *name;
            if self.has_fixed_label(name) && !forced.contains(&name) {
                continue;
            }

            let stem = self.base_label_of(name).to_string();
            let mut label = stem.clone();
            let mut bump = 1usize;
            while occupied.contains(&label) || reserved.contains(&label) {
                label = format!("{}_{}", stem, bump);
                bump += 1;
            }

            if let Some(existing) = self.identity_of_label(&label) {
                let Entry::Defined(id) = self.entry(existing) else {
                    unreachable!("identity_of_label only returns defined names");
                };
                tracing::trace!(%name, %existing, label = %label, "merged into existing label");
                self.entries[name.index()] = Entry::Defined(id);
                merged += 1;
            } else {
                queued.push((label.clone(), name));
            }
            occupied.insert(label);
        }

        let committed = queued.len();
        for (label, name) in queued {
            assert!(
                !reserved.contains(&label),
                "internal: generated label '{}' is reserved",
                label
            );
            tracing::trace!(%name, label = %label, "label committed");
            let id = self.push_label(&label);
            self.entries[name.index()] = Entry::Defined(id);
        }

        tracing::debug!(
            forced = forced.len(),
            committed,
            merged,
            "labels generated"
        );
    }

    /// Defined names and verbatim builtins keep their spelling unless forced.
    /// Aliases derived from a verbatim name carry no handle and are labelled
    /// like any other derived name.
    fn has_fixed_label(&self, name: Name) -> bool {
        !self.is_derived(name) || self.builtin(name).is_some()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
