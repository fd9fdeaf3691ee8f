//! Layout Canon Core - deterministic solc storage layouts
//!
//! solc embeds AST ids and, occasionally, absolute checkout paths in the
//! storage layouts it emits. Both change between otherwise identical builds,
//! so committed layout snapshots churn. This crate rewrites a layout into a
//! canonical form that only changes when the storage itself changes.
//!
//! # Architecture
//!
//! ```text
//! solc JSON → StorageLayout → Canonicalizer → canonical StorageLayout → JSON
//!                                  ↓
//!                     TypeId grammar + substring rewrite
//!
//! StorageLayout → Checker → closure diagnostics
//! StorageLayout → Canonicalizer → SHA-256 → semantic hash
//! ```
//!
//! # Guarantees
//!
//! - **Deterministic**: same input always produces byte-identical output
//! - **Closed**: type references that resolved before still resolve after
//! - **Pure**: no I/O, no global state; the input is never mutated

pub mod canonicalize;
pub mod check;
pub mod error;
pub mod hash;
pub mod layout;
pub mod rewrite;
pub mod type_id;

pub use canonicalize::{
    canonicalize, canonicalize_with, normalize_contract_path, CanonicalizeOptions, Remapping,
};
pub use check::{check, CheckResult};
pub use error::{Error, Result};
pub use hash::semantic_hash;
pub use layout::{StorageLayout, StorageSlot, TypeInfo};

/// Parse, canonicalize and re-encode a solc storage-layout JSON document
pub fn canonicalize_json(json: &str, options: &CanonicalizeOptions) -> Result<String> {
    let layout = StorageLayout::from_json(json)?;
    canonicalize_with(&layout, options).to_json_pretty()
}
