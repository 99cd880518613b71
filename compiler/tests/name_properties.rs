// Property-based tests for name table invariants.
//
// Three categories:
// 1. Interning: idempotent per spelling, defined names resolve back by label
// 2. Label generation: used labels are distinct, never reserved, and stable
//    across reruns
// 3. Verbatim grouping: one shared name per arity pair
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::OnceLock;

use irnames::{Name, NameRepository, TableDialect};
use proptest::prelude::*;

// ── Test helpers ────────────────────────────────────────────────────────────

fn stack_dialect() -> &'static TableDialect {
    static DIALECT: OnceLock<TableDialect> = OnceLock::new();
    DIALECT.get_or_init(|| {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/stack.json");
        TableDialect::load(&path)
            .unwrap_or_else(|e| panic!("failed to load {}: {}", path.display(), e))
    })
}

/// Spellings an optimizer might intern: user identifiers (some shaped like
/// generated labels), builtins, and verbatim builtins.
const LABELS: &[&str] = &[
    "tmp",
    "tmp_1",
    "tmp_2",
    "x",
    "x_1",
    "y",
    "i",
    "i_2",
    "add",
    "pop",
    "datasize",
    "verbatim_1i_1o",
    "verbatim_0i_2o",
];

/// Reserved words. Disjoint from builtin and verbatim spellings.
const RESERVED: &[&str] = &["tmp_1", "tmp_2", "x_1", "x_2", "y", "i_1", "let", "function"];

#[derive(Debug, Clone)]
enum Op {
    Intern(&'static str),
    /// Derive from the name produced by an earlier op (index taken modulo).
    Derive(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::sample::select(LABELS).prop_map(Op::Intern),
        (0usize..64).prop_map(Op::Derive),
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(arb_op(), 1..40)
}

fn arb_reserved() -> impl Strategy<Value = BTreeSet<String>> {
    prop::sample::subsequence(RESERVED, 0..=RESERVED.len())
        .prop_map(|words| words.into_iter().map(str::to_string).collect())
}

fn apply(repo: &mut NameRepository<'_>, ops: &[Op]) -> Vec<Name> {
    let mut names: Vec<Name> = Vec::with_capacity(ops.len());
    for op in ops {
        let name = match *op {
            Op::Intern(label) => repo.intern(label),
            Op::Derive(i) if !names.is_empty() => repo.derive(names[i % names.len()]),
            Op::Derive(_) => repo.intern("tmp"),
        };
        names.push(name);
    }
    names
}

fn select_used(names: &[Name], mask: &[bool]) -> BTreeSet<Name> {
    names
        .iter()
        .zip(mask.iter().cycle())
        .filter(|(_, &keep)| keep)
        .map(|(&name, _)| name)
        .collect()
}

/// Check the label-generation postconditions for `used`.
fn check_labels(
    repo: &NameRepository<'_>,
    used: &BTreeSet<Name>,
    reserved: &BTreeSet<String>,
) -> Result<(), TestCaseError> {
    let mut seen = HashSet::new();
    for &name in used {
        let label = repo.label_of(name);
        prop_assert!(label.is_some(), "used name {} has no label", name);
        let label = label.unwrap_or_default();
        prop_assert!(
            !reserved.contains(label),
            "used name {} got reserved label '{}'",
            name,
            label
        );
        prop_assert!(
            seen.insert(label.to_string()),
            "label '{}' assigned to more than one used name",
            label
        );
    }
    Ok(())
}

// ── 1. Interning ────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn intern_is_idempotent(ops in arb_ops()) {
        let mut repo = NameRepository::new(stack_dialect());
        apply(&mut repo, &ops);

        for label in LABELS {
            let first = repo.intern(label);
            let len = repo.len();
            prop_assert_eq!(repo.intern(label), first);
            prop_assert_eq!(repo.len(), len, "re-interning '{}' allocated a name", label);
        }
    }

    #[test]
    fn defined_names_resolve_back(ops in arb_ops()) {
        let mut repo = NameRepository::new(stack_dialect());
        let names = apply(&mut repo, &ops);

        for name in names {
            if repo.is_derived(name) {
                prop_assert!(repo.base_name_of(name) != name);
                prop_assert!(!repo.is_derived(repo.base_name_of(name)));
                continue;
            }
            let label = repo.required_label_of(name).to_string();
            prop_assert_eq!(repo.identity_of_label(&label), Some(name));
        }
    }
}

// ── 2. Label generation ─────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn generated_labels_are_unique_and_unreserved(
        ops in arb_ops(),
        mask in prop::collection::vec(any::<bool>(), 1..16),
        reserved in arb_reserved(),
    ) {
        let mut repo = NameRepository::new(stack_dialect());
        let names = apply(&mut repo, &ops);
        let used = select_used(&names, &mask);

        repo.generate_labels(&used, &reserved);
        check_labels(&repo, &used, &reserved)?;

        // Builtin spellings never move.
        let add = repo.identity_of_builtin("add");
        prop_assert_eq!(add.and_then(|n| repo.label_of(n)), Some("add"));
    }

    #[test]
    fn rerun_with_new_reserved_words_keeps_invariants(
        ops in arb_ops(),
        mask in prop::collection::vec(any::<bool>(), 1..16),
        first in arb_reserved(),
        second in arb_reserved(),
    ) {
        let mut repo = NameRepository::new(stack_dialect());
        let names = apply(&mut repo, &ops);
        let used = select_used(&names, &mask);

        repo.generate_labels(&used, &first);
        repo.generate_labels(&used, &second);
        check_labels(&repo, &used, &second)?;
    }

    #[test]
    fn rerun_with_same_input_is_stable(
        ops in arb_ops(),
        mask in prop::collection::vec(any::<bool>(), 1..16),
        reserved in arb_reserved(),
    ) {
        let mut repo = NameRepository::new(stack_dialect());
        let names = apply(&mut repo, &ops);
        let used = select_used(&names, &mask);

        repo.generate_labels(&used, &reserved);
        let before = repo.to_string();
        repo.generate_labels(&used, &reserved);
        prop_assert_eq!(repo.to_string(), before);
    }

    #[test]
    fn unused_derived_names_stay_derived(
        ops in arb_ops(),
        mask in prop::collection::vec(any::<bool>(), 1..16),
    ) {
        let mut repo = NameRepository::new(stack_dialect());
        let names = apply(&mut repo, &ops);
        let used = select_used(&names, &mask);
        let derived_before: Vec<Name> = names
            .iter()
            .copied()
            .filter(|&n| repo.is_derived(n) && !used.contains(&n))
            .collect();

        repo.generate_labels(&used, &BTreeSet::new());

        for name in derived_before {
            prop_assert!(repo.is_derived(name), "unused name {} was relabelled", name);
        }
    }
}

// ── 3. Verbatim grouping ────────────────────────────────────────────────────

#[test]
fn verbatim_arities_are_grouped() {
    let mut repo = NameRepository::new(stack_dialect());
    let mut seen = HashSet::new();

    for params in 0..=4 {
        for rets in 0..=4 {
            let label = format!("verbatim_{}i_{}o", params, rets);
            let name = repo.intern(&label);
            assert_eq!(repo.intern(&label), name);
            assert!(repo.is_verbatim(name));
            assert!(repo.is_builtin(name));
            assert_eq!(repo.label_of(name), Some(label.as_str()));

            let handle = repo.builtin(name).expect("verbatim handle");
            assert_eq!(handle.parameters.len(), params);
            assert_eq!(handle.returns.len(), rets);
            assert!(seen.insert(name), "{} shared across arities", label);
        }
    }

    // Past the synthesized range the spelling is an ordinary identifier.
    let plain = repo.intern("verbatim_5i_0o");
    assert!(!repo.is_verbatim(plain));
    assert!(!repo.is_builtin(plain));
}
