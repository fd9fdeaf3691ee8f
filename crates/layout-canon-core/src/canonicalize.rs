//! Storage-layout canonicalizer — renumbers AST ids deterministically
//!
//! solc stamps every storage slot and every struct/enum/contract type with
//! the AST id of its declaration. Those ids shift whenever any source file
//! changes, so regenerating an otherwise identical layout produces noisy
//! diffs. The canonicalizer replaces them with ids assigned in layout order
//! and strips checkout-specific prefixes from absolute contract paths.
//!
//! # Pipeline
//!
//! ```text
//! StorageLayout → Remapping::build (ast-id table + type table)
//!               → Remapping::apply (slots, types, contract paths)
//!               → StorageLayout
//! ```
//!
//! # Guarantees
//!
//! - **Deterministic**: identical input yields byte-identical output,
//!   regardless of the order the type map was populated in
//! - **Closed**: every type reference in the output resolves, provided it
//!   resolved in the input
//! - **Pure**: the input is never mutated and no state survives the call

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, trace};

use crate::layout::{StorageLayout, StorageSlot, TypeInfo};
use crate::rewrite::{rewrite, TypeTable};
use crate::type_id::TypeId;

/// First canonical id. Large enough not to collide with small numbers
/// (line/column positions, array lengths) that appear in generated output.
pub const DEFAULT_BASE_ID: u64 = 1000;

/// Largest accepted base id. Leaves room for one id per slot and type
/// without overflowing `u64`.
pub const MAX_BASE_ID: u64 = u64::MAX / 2;

/// Directory component marking the repository root in absolute paths
pub const DEFAULT_ROOT_MARKER: &str = "optimism";

// ── Configuration ─────────────────────────────────────────

/// Canonicalization settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CanonicalizeOptions {
    pub base_id: u64,
    pub root_marker: String,
}

impl Default for CanonicalizeOptions {
    fn default() -> Self {
        Self {
            base_id: DEFAULT_BASE_ID,
            root_marker: DEFAULT_ROOT_MARKER.to_string(),
        }
    }
}

impl CanonicalizeOptions {
    pub fn with_base_id(mut self, base_id: u64) -> Self {
        self.base_id = base_id;
        self
    }

    pub fn with_root_marker(mut self, marker: impl Into<String>) -> Self {
        self.root_marker = marker.into();
        self
    }
}

// ── Public API ─────────────────────────────────────────────

/// Canonicalize a layout with the default options
pub fn canonicalize(input: &StorageLayout) -> StorageLayout {
    canonicalize_with(input, &CanonicalizeOptions::default())
}

/// Canonicalize a layout.
///
/// Returns a new layout whose slot AST ids and type identifiers are
/// renumbered from `options.base_id` and whose absolute contract paths are
/// made relative to `options.root_marker`.
#[tracing::instrument(level = "debug", skip_all, fields(
    slots = input.storage.len(),
    types = input.types.len(),
))]
pub fn canonicalize_with(input: &StorageLayout, options: &CanonicalizeOptions) -> StorageLayout {
    let remapping = Remapping::build(input, options.base_id);
    debug!(
        ast_ids = remapping.ast_ids().len(),
        types = remapping.types().len(),
        "built remapping tables"
    );
    remapping.apply(input, &options.root_marker)
}

// ── Id allocation ─────────────────────────────────────────

/// Monotonic source of canonical ids, shared by slot and type remapping
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Start at `base`, clamped to [`MAX_BASE_ID`]
    pub fn new(base: u64) -> Self {
        Self {
            next: base.min(MAX_BASE_ID),
        }
    }

    /// Hand out the next id
    pub fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next `allocate` call will return
    pub fn peek(&self) -> u64 {
        self.next
    }
}

// ── Remapping tables ──────────────────────────────────────

/// Replacement tables for one canonicalization call
#[derive(Debug, Clone, Default)]
pub struct Remapping {
    ast_ids: BTreeMap<u64, u64>,
    types: TypeTable,
    sorted_types: Vec<String>,
}

impl Remapping {
    /// Phase 1: discover AST ids and build both tables.
    ///
    /// Slots are numbered first, in layout order. Type identifiers follow,
    /// in lexicographic order, continuing from the same counter.
    pub fn build(input: &StorageLayout, base_id: u64) -> Self {
        let mut ids = IdAllocator::new(base_id);

        // One id per slot; a repeated source id keeps the last one assigned.
        let mut ast_ids = BTreeMap::new();
        for slot in &input.storage {
            ast_ids.insert(slot.ast_id, ids.allocate());
        }

        let sorted_types = sorted_type_keys(input.types.keys());
        let types = remap_types(&sorted_types, &mut ids);

        Self {
            ast_ids,
            types,
            sorted_types,
        }
    }

    /// Source AST id → canonical id
    pub fn ast_ids(&self) -> &BTreeMap<u64, u64> {
        &self.ast_ids
    }

    /// Old type identifier → canonical type identifier
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// Phase 2: build the canonical layout from `input`.
    ///
    /// `input` must be the layout the tables were built from. A slot whose
    /// AST id is unknown to the table keeps its id.
    pub fn apply(&self, input: &StorageLayout, root_marker: &str) -> StorageLayout {
        let storage = input
            .storage
            .iter()
            .map(|slot| StorageSlot {
                ast_id: self.ast_ids.get(&slot.ast_id).copied().unwrap_or(slot.ast_id),
                contract: normalize_contract_path(&slot.contract, root_marker),
                label: slot.label.clone(),
                offset: slot.offset,
                slot: slot.slot,
                type_id: rewrite(&self.types, &slot.type_id),
            })
            .collect();

        let mut types = BTreeMap::new();
        for old in &self.sorted_types {
            let Some(info) = input.types.get(old) else {
                continue;
            };
            let rewritten = TypeInfo {
                encoding: info.encoding.clone(),
                label: info.label.clone(),
                number_of_bytes: info.number_of_bytes,
                key: rewrite(&self.types, &info.key),
                value: rewrite(&self.types, &info.value),
                base: if info.base.is_empty() {
                    String::new()
                } else {
                    rewrite(&self.types, &info.base)
                },
            };
            types.insert(rewrite(&self.types, old), rewritten);
        }

        StorageLayout { storage, types }
    }
}

/// Type-map keys in lexicographic order, whatever order `keys` yields them in
fn sorted_type_keys<'a>(keys: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut sorted: Vec<String> = keys.into_iter().cloned().collect();
    sorted.sort();
    sorted
}

/// Assign new ids to the remappable leaf types of `sorted`, in order
fn remap_types(sorted: &[String], ids: &mut IdAllocator) -> TypeTable {
    let mut types = TypeTable::new();
    for old in sorted {
        if old.is_empty() || types.contains_key(old) {
            continue;
        }
        let Some(parsed) = TypeId::parse(old) else {
            continue;
        };
        if !parsed.is_remappable() {
            trace!(ty = %old, "skipping storage type without user-type marker");
            continue;
        }

        let new = parsed.with_ast_id(ids.allocate());
        debug!(old = %old, new = %new, "remapped type");
        types.insert(old.clone(), new);
    }
    types
}

// ── Contract paths ────────────────────────────────────────

/// Make an absolute contract path relative to the repository root.
///
/// solc falls back to absolute paths when two imported contracts share a
/// name, which leaks the build machine's checkout location. The components
/// after the first `root_marker` component are kept. Relative paths, paths
/// without the marker, and paths ending at the marker are returned as is.
/// Components are rejoined as written; `..` is not cleaned.
pub fn normalize_contract_path(contract: &str, root_marker: &str) -> String {
    let path = Path::new(contract);
    if !path.is_absolute() {
        return contract.to_string();
    }

    let mut components = path.components();
    let found = components
        .by_ref()
        .any(|c| matches!(c, Component::Normal(name) if name == root_marker));
    if !found {
        return contract.to_string();
    }

    let relative: PathBuf = components.collect();
    match relative.to_str() {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => contract.to_string(),
    }
}
