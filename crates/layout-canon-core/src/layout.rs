//! Storage-layout data model
//!
//! Mirrors the `storageLayout` object solc emits per contract: an ordered
//! list of storage slots plus a map from type identifier to type info.
//! Field names and encodings follow solc exactly so that a layout survives
//! a deserialize/serialize round trip unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::Result;

/// A contract's storage layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLayout {
    #[serde(default, deserialize_with = "null_as_default")]
    pub storage: Vec<StorageSlot>,
    /// Sorted so that serialization is byte-stable
    #[serde(default, deserialize_with = "null_as_default")]
    pub types: BTreeMap<String, TypeInfo>,
}

/// One declared storage variable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSlot {
    #[serde(rename = "astId")]
    pub ast_id: u64,
    pub contract: String,
    pub label: String,
    pub offset: u64,
    #[serde(with = "decimal_string")]
    pub slot: u64,
    #[serde(rename = "type")]
    pub type_id: String,
}

/// Description of one distinct type referenced by storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub encoding: String,
    pub label: String,
    #[serde(rename = "numberOfBytes", with = "decimal_string")]
    pub number_of_bytes: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base: String,
}

impl StorageLayout {
    /// Parse a layout from solc's JSON encoding
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty JSON with 2-space indentation and a trailing newline
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Every type identifier the layout refers to, slots first, then
    /// type members, in deterministic order. May contain duplicates.
    pub fn referenced_types(&self) -> impl Iterator<Item = &str> {
        self.storage
            .iter()
            .map(|slot| slot.type_id.as_str())
            .chain(self.types.values().flat_map(TypeInfo::references))
    }
}

impl TypeInfo {
    /// Non-empty `key`, `value` and `base` references, in that order
    pub fn references(&self) -> impl Iterator<Item = &str> {
        [self.key.as_str(), self.value.as_str(), self.base.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
    }
}

/// solc emits `"types": null` for contracts without storage
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Integers that solc encodes as decimal strings (`slot`, `numberOfBytes`).
/// Plain JSON numbers are accepted on input as well.
mod decimal_string {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Decimal::deserialize(deserializer)? {
            Decimal::Number(n) => Ok(n),
            Decimal::Text(s) => s
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid decimal integer '{}'", s))),
        }
    }
}
