//! Semantic hash of a storage layout
//!
//! The hash is SHA-256 over the canonical JSON encoding, so layouts that
//! differ only in AST ids or checkout location hash identically.

use sha2::{Digest, Sha256};

use crate::canonicalize::{canonicalize_with, CanonicalizeOptions};
use crate::layout::StorageLayout;
use crate::Result;

/// Compute the semantic hash with default canonicalization options
pub fn semantic_hash(layout: &StorageLayout) -> Result<String> {
    semantic_hash_with(layout, &CanonicalizeOptions::default())
}

/// Compute the lowercase hex SHA-256 of the canonical pretty JSON
pub fn semantic_hash_with(layout: &StorageLayout, options: &CanonicalizeOptions) -> Result<String> {
    let canonical = canonicalize_with(layout, options).to_json_pretty()?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: &str = r#"{
        "storage": [
            {"astId": 101, "contract": "/ci/runner/optimism/src/Vault.sol:Vault", "label": "token",
             "offset": 0, "slot": "0", "type": "t_contract(IERC20)77"}
        ],
        "types": {
            "t_contract(IERC20)77": {"encoding": "inplace", "label": "contract IERC20", "numberOfBytes": "20"}
        }
    }"#;

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = semantic_hash(&StorageLayout::from_json(LAYOUT).unwrap()).unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_covers_canonical_json_bytes() {
        let layout = StorageLayout::from_json(LAYOUT).unwrap();
        let canonical = canonicalize_with(&layout, &CanonicalizeOptions::default())
            .to_json_pretty()
            .unwrap();
        let expected: String = Sha256::digest(canonical.as_bytes())
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        assert_eq!(semantic_hash(&layout).unwrap(), expected);
    }

    #[test]
    fn test_hash_ignores_ast_ids_and_checkout_path() {
        let a = StorageLayout::from_json(LAYOUT).unwrap();
        let b = StorageLayout::from_json(
            &LAYOUT
                .replace("101", "9001")
                .replace("IERC20)77", "IERC20)312")
                .replace("/ci/runner/", "/home/dev/src/"),
        )
        .unwrap();
        assert_ne!(a, b);
        assert_eq!(semantic_hash(&a).unwrap(), semantic_hash(&b).unwrap());
    }

    #[test]
    fn test_hash_changes_with_layout() {
        let a = StorageLayout::from_json(LAYOUT).unwrap();
        let b = StorageLayout::from_json(&LAYOUT.replace("\"slot\": \"0\"", "\"slot\": \"1\"")).unwrap();
        assert_ne!(semantic_hash(&a).unwrap(), semantic_hash(&b).unwrap());
    }

    #[test]
    fn test_hash_is_deterministic() {
        let layout = StorageLayout::from_json(LAYOUT).unwrap();
        let first = semantic_hash(&layout).unwrap();
        for _ in 0..10 {
            assert_eq!(semantic_hash(&layout).unwrap(), first);
        }
    }
}
