//! Layout checker — referential closure and duplicate detection
//!
//! The canonicalizer trusts its input: a slot that names a type missing from
//! the type map is passed through unchanged and stays dangling. The checker
//! finds such problems up front. It accumulates every diagnostic rather than
//! stopping at the first one.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::layout::StorageLayout;

// ── Check Result Types ────────────────────────────────────

/// Result of a layout check — accumulates all diagnostics
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no errors were found (warnings are OK)
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect()
    }

    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect()
    }

    /// Turn a failed check into an error listing every problem
    pub fn into_result(self) -> crate::Result<()> {
        if self.is_valid() {
            return Ok(());
        }
        let messages: Vec<String> = self.errors().iter().map(|d| d.to_string()).collect();
        Err(crate::Error::Check(messages.join("; ")))
    }

    fn add(&mut self, severity: Severity, kind: DiagnosticKind, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            kind,
            message,
        });
    }
}

/// A single check diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{} [{}]: {}", prefix, self.kind, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Category of layout issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// A type reference that is not a key of the type map
    Dangling,
    /// Two slots declared with the same AST id
    Duplicate,
    /// A type entry nothing refers to
    Orphan,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DiagnosticKind::Dangling => write!(f, "dangling"),
            DiagnosticKind::Duplicate => write!(f, "duplicate"),
            DiagnosticKind::Orphan => write!(f, "orphan"),
        }
    }
}

// ── Public API ────────────────────────────────────────────

/// Check a layout for dangling type references, duplicate slot AST ids and
/// unreferenced types.
pub fn check(layout: &StorageLayout) -> CheckResult {
    let mut result = CheckResult::new();
    check_slots(layout, &mut result);
    check_types(layout, &mut result);
    check_orphans(layout, &mut result);
    result
}

fn check_slots(layout: &StorageLayout, result: &mut CheckResult) {
    let mut first_label: BTreeMap<u64, &str> = BTreeMap::new();
    for slot in &layout.storage {
        if !layout.types.contains_key(&slot.type_id) {
            result.add(
                Severity::Error,
                DiagnosticKind::Dangling,
                format!("slot '{}' references unknown type '{}'", slot.label, slot.type_id),
            );
        }
        if let Some(previous) = first_label.insert(slot.ast_id, &slot.label) {
            result.add(
                Severity::Warning,
                DiagnosticKind::Duplicate,
                format!(
                    "slots '{}' and '{}' share AST id {}",
                    previous, slot.label, slot.ast_id
                ),
            );
        }
    }
}

fn check_types(layout: &StorageLayout, result: &mut CheckResult) {
    for (name, info) in &layout.types {
        for (field, reference) in [("key", &info.key), ("value", &info.value), ("base", &info.base)] {
            if !reference.is_empty() && !layout.types.contains_key(reference) {
                result.add(
                    Severity::Error,
                    DiagnosticKind::Dangling,
                    format!("{} of '{}' references unknown type '{}'", field, name, reference),
                );
            }
        }
    }
}

fn check_orphans(layout: &StorageLayout, result: &mut CheckResult) {
    let referenced: BTreeSet<&str> = layout.referenced_types().collect();
    for name in layout.types.keys() {
        if !referenced.contains(name.as_str()) {
            result.add(
                Severity::Warning,
                DiagnosticKind::Orphan,
                format!("type '{}' is not referenced", name),
            );
        }
    }
}

// ── Tests ─────────────────────────────────────────────────
