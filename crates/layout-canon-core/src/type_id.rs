//! Type-identifier grammar
//!
//! solc names storage types with strings such as `t_uint256`,
//! `t_struct(Layout)4711_storage` or
//! `t_mapping(t_address,t_struct(Layout)4711_storage)`. Some of them embed
//! the AST id of the declaring node, which changes whenever unrelated source
//! is edited. This module parses the *leaf* form that carries such an id:
//!
//! ```text
//! t_<kind>(<name>)<ast-id>[_<suffix>]
//! ```
//!
//! `<kind>`, `<name>` and `<suffix>` are runs of word characters
//! (`[A-Za-z0-9_]`), `<ast-id>` a run of ASCII digits. Composite type
//! strings never parse; their embedded leaves are rewritten by substring
//! substitution instead (see [`crate::rewrite`]).

/// Kinds whose storage references carry a genuine AST id
const USER_TYPE_KINDS: [&str; 2] = ["struct", "userDefinedValueType"];

/// A parsed leaf type identifier, borrowing from the original string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeId<'a> {
    raw: &'a str,
    kind: &'a str,
    name: &'a str,
    ast_id: &'a str,
    suffix: Option<&'a str>,
}

impl<'a> TypeId<'a> {
    /// Parse a leaf type identifier. Returns `None` for anything that does
    /// not match the grammar exactly, including composite and id-less types.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let rest = raw.strip_prefix("t_")?;

        let open = rest.find('(')?;
        let kind = &rest[..open];
        let rest = &rest[open + 1..];

        let close = rest.find(')')?;
        let name = &rest[..close];
        let rest = &rest[close + 1..];

        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let ast_id = &rest[..digits_end];
        let rest = &rest[digits_end..];

        let suffix = if rest.is_empty() {
            None
        } else {
            let suffix = rest.strip_prefix('_')?;
            if !is_word(suffix) {
                return None;
            }
            Some(suffix)
        };

        if !is_word(kind) || !is_word(name) || ast_id.is_empty() {
            return None;
        }

        Some(TypeId {
            raw,
            kind,
            name,
            ast_id,
            suffix,
        })
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn kind(&self) -> &'a str {
        self.kind
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The embedded AST id, as written
    pub fn ast_id(&self) -> &'a str {
        self.ast_id
    }

    /// Text after the `_` following the id, e.g. `storage` or `memory_ptr`
    pub fn suffix(&self) -> Option<&'a str> {
        self.suffix
    }

    /// Whether the identifier mentions `storage` anywhere
    pub fn mentions_storage(&self) -> bool {
        self.raw.contains("storage")
    }

    /// A storage reference to a struct or user-defined value type, whose
    /// digits are an AST id rather than a fixed array length
    pub fn is_user_type_storage_ref(&self) -> bool {
        USER_TYPE_KINDS.contains(&self.kind)
            && self.suffix.is_some_and(|s| s.starts_with("storage"))
    }

    /// Whether the embedded digits may be renumbered.
    ///
    /// Fixed-size storage arrays carry their length in a digit run that is
    /// indistinguishable from an AST id, so storage types are only touched
    /// when they reference a user type.
    pub fn is_remappable(&self) -> bool {
        !self.mentions_storage() || self.is_user_type_storage_ref()
    }

    /// Render the same identifier with a different AST id
    pub fn with_ast_id(&self, ast_id: u64) -> String {
        let mut out = String::with_capacity(self.raw.len() + 4);
        out.push_str("t_");
        out.push_str(self.kind);
        out.push('(');
        out.push_str(self.name);
        out.push(')');
        out.push_str(&ast_id.to_string());
        if let Some(suffix) = self.suffix {
            out.push('_');
            out.push_str(suffix);
        }
        out
    }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
