// script.rs — Replayable batches of name operations
//
// A `NameScript` records what an optimizer would do to the name table
// (intern spellings, derive aliases) plus the backend's reserved words. The
// CLI and tests replay scripts against a repository and then run label
// generation over the resulting names.
//
// Preconditions: `derive_step` only references earlier steps.
// Postconditions: `finalize` leaves every used derived name labelled.
// Failure modes: out-of-range step references produce `ScriptError`.
// Side effects: mutates the repository passed in.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::id::Name;
use crate::repository::NameRepository;

// ── Script format ───────────────────────────────────────────────────────────

/// One operation against the name table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Intern a spelling.
    Intern(String),
    /// Derive a fresh alias of an interned spelling.
    Derive(String),
    /// Derive a fresh alias of the name produced by an earlier step.
    DeriveStep(usize),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Intern(label) => write!(f, "intern {}", label),
            Step::Derive(label) => write!(f, "derive {}", label),
            Step::DeriveStep(step) => write!(f, "derive @{}", step),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameScript {
    /// Spellings the backend cannot emit.
    #[serde(default)]
    pub reserved: Vec<String>,
    pub steps: Vec<Step>,
    /// Step indices whose names are dropped before label generation.
    #[serde(default)]
    pub unused: Vec<usize>,
}

/// Final state of one step after label generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStep {
    pub step: usize,
    pub operation: String,
    pub name: u32,
    pub label: Option<String>,
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ScriptError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    JsonError {
        path: PathBuf,
        source: serde_json::Error,
    },
    StepOutOfRange {
        step: usize,
        target: usize,
    },
    UnusedOutOfRange {
        target: usize,
    },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::IoError { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            ScriptError::JsonError { path, source } => {
                write!(f, "{}: invalid name script: {}", path.display(), source)
            }
            ScriptError::StepOutOfRange { step, target } => {
                write!(
                    f,
                    "step {} references step {}, which does not precede it",
                    step, target
                )
            }
            ScriptError::UnusedOutOfRange { target } => {
                write!(f, "unused step {} does not exist", target)
            }
        }
    }
}

impl std::error::Error for ScriptError {}

// ── Replay ──────────────────────────────────────────────────────────────────

impl NameScript {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let source = std::fs::read_to_string(path).map_err(|e| ScriptError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&source).map_err(|e| ScriptError::JsonError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn reserved_set(&self) -> BTreeSet<String> {
        self.reserved.iter().cloned().collect()
    }
}

/// Apply every step in order. Returns the name produced by each step.
pub fn replay(
    repo: &mut NameRepository<'_>,
    script: &NameScript,
) -> Result<Vec<Name>, ScriptError> {
    let mut names = Vec::with_capacity(script.steps.len());
    for (step, op) in script.steps.iter().enumerate() {
        let name = match op {
            Step::Intern(label) => repo.intern(label),
            Step::Derive(label) => {
                let base = repo.intern(label);
                repo.derive(base)
            }
            Step::DeriveStep(target) => {
                let base = *names
                    .get(*target)
                    .ok_or(ScriptError::StepOutOfRange {
                        step,
                        target: *target,
                    })?;
                repo.derive(base)
            }
        };
        names.push(name);
    }
    tracing::debug!(steps = names.len(), "name script replayed");
    Ok(names)
}

/// Replay `script`, generate labels for every step's name except those listed
/// as unused, and report each step's final state.
pub fn finalize(
    repo: &mut NameRepository<'_>,
    script: &NameScript,
    extra_reserved: &[String],
) -> Result<Vec<ResolvedStep>, ScriptError> {
    if let Some(&target) = script.unused.iter().find(|&&i| i >= script.steps.len()) {
        return Err(ScriptError::UnusedOutOfRange { target });
    }
    let names = replay(repo, script)?;

    let mut used: BTreeSet<Name> = names.iter().copied().collect();
    for &step in &script.unused {
        used.remove(&names[step]);
    }

    let mut reserved = script.reserved_set();
    reserved.extend(extra_reserved.iter().cloned());
    repo.generate_labels(&used, &reserved);

    Ok(script
        .steps
        .iter()
        .zip(&names)
        .enumerate()
        .map(|(step, (op, &name))| ResolvedStep {
            step,
            operation: op.to_string(),
            name: name.0,
            label: repo.label_of(name).map(str::to_string),
        })
        .collect())
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_dialect::TableDialect;

    fn dialect() -> TableDialect {
        TableDialect::parse(
            r#"{"name": "stack", "builtins": [{"name": "add", "parameters": ["", ""], "returns": [""]}]}"#,
            Path::new("test.json"),
        )
        .expect("dialect")
    }

    #[test]
    fn parse_script_steps() {
        let script: NameScript = serde_json::from_str(
            r#"{"reserved": ["tmp_1"], "steps": [{"intern": "tmp"}, {"derive": "tmp"}, {"derive_step": 1}]}"#,
        )
        .unwrap();
        assert_eq!(
            script.steps,
            vec![
                Step::Intern("tmp".to_string()),
                Step::Derive("tmp".to_string()),
                Step::DeriveStep(1),
            ]
        );
        assert!(script.unused.is_empty());
        assert_eq!(script.steps[2].to_string(), "derive @1");
    }

    #[test]
    fn finalize_labels_every_step() {
        let d = dialect();
        let mut repo = NameRepository::new(&d);
        let script = NameScript {
            reserved: vec!["tmp_1".to_string()],
            steps: vec![
                Step::Intern("tmp".to_string()),
                Step::Derive("tmp".to_string()),
                Step::DeriveStep(1),
            ],
            unused: vec![],
        };

        let resolved = finalize(&mut repo, &script, &[]).unwrap();
        let labels: Vec<_> = resolved.iter().map(|r| r.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("tmp"), Some("tmp_2"), Some("tmp_3")]);
        assert_eq!(resolved[1].operation, "derive tmp");
    }

    #[test]
    fn unused_steps_keep_no_label() {
        let d = dialect();
        let mut repo = NameRepository::new(&d);
        let script = NameScript {
            reserved: vec![],
            steps: vec![Step::Intern("x".to_string()), Step::Derive("x".to_string())],
            unused: vec![1],
        };

        let resolved = finalize(&mut repo, &script, &[]).unwrap();
        assert_eq!(resolved[0].label.as_deref(), Some("x"));
        assert_eq!(resolved[1].label, None);
    }

    #[test]
    fn extra_reserved_words_apply() {
        let d = dialect();
        let mut repo = NameRepository::new(&d);
        let script = NameScript {
            reserved: vec![],
            steps: vec![Step::Intern("x".to_string()), Step::Derive("x".to_string())],
            unused: vec![],
        };

        let resolved = finalize(&mut repo, &script, &["x_1".to_string()]).unwrap();
        assert_eq!(resolved[1].label.as_deref(), Some("x_2"));
    }

    #[test]
    fn forward_step_reference_is_rejected() {
        let d = dialect();
        let mut repo = NameRepository::new(&d);
        let script = NameScript {
            reserved: vec![],
            steps: vec![Step::DeriveStep(0)],
            unused: vec![],
        };

        let err = replay(&mut repo, &script).unwrap_err();
        assert_eq!(
            err.to_string(),
            "step 0 references step 0, which does not precede it"
        );
    }

    #[test]
    fn unknown_unused_step_is_rejected() {
        let d = dialect();
        let mut repo = NameRepository::new(&d);
        let script = NameScript {
            reserved: vec![],
            steps: vec![Step::Intern("x".to_string())],
            unused: vec![4],
        };

        let len = repo.len();
        let err = finalize(&mut repo, &script, &[]).unwrap_err();
        assert!(matches!(err, ScriptError::UnusedOutOfRange { target: 4 }));
        // Rejected before any step touched the table.
        assert_eq!(repo.len(), len);
        assert_eq!(repo.identity_of_label("x"), None);
    }
}
