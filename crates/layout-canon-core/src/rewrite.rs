//! Substring rewriting of type identifiers
//!
//! Composite types embed other type identifiers
//! (`t_mapping(t_address,t_struct(Foo)500_storage)`), so renumbering a leaf
//! means rewriting every string that contains it. The lookup is a linear
//! scan over the table for each non-exact string, which is fine for layouts
//! with hundreds of slots.

use std::collections::BTreeMap;

use tracing::trace;

/// Old type identifier → canonical type identifier
pub type TypeTable = BTreeMap<String, String>;

/// Rewrite `s` through `table`.
///
/// An exact key returns its mapping directly. Otherwise every entry whose
/// old string occurs in `s` contributes one replacement span. Spans are
/// chosen longest old string first, then leftmost: each entry takes its
/// first occurrence that does not overlap a span already chosen, so
/// `t_enum(E)12` never matches inside `t_enum(E)123`. All spans refer to
/// the input, never to inserted text, and the result does not depend on
/// table order. Strings with no match are returned unchanged.
pub fn rewrite(table: &TypeTable, s: &str) -> String {
    if let Some(new) = table.get(s) {
        return new.clone();
    }

    let mut candidates: Vec<(usize, &str, &str)> = table
        .iter()
        .filter_map(|(old, new)| s.find(old.as_str()).map(|pos| (pos, old.as_str(), new.as_str())))
        .collect();

    if candidates.is_empty() {
        return s.to_string();
    }

    candidates.sort_by(|a, b| {
        b.1.len()
            .cmp(&a.1.len())
            .then(a.0.cmp(&b.0))
            .then(a.1.cmp(b.1))
    });

    // (start, end, replacement) against the input string
    let mut spans: Vec<(usize, usize, &str)> = Vec::with_capacity(candidates.len());
    for (_, old, new) in candidates {
        let free = s
            .match_indices(old)
            .map(|(pos, _)| (pos, pos + old.len()))
            .find(|&(start, end)| spans.iter().all(|&(s0, e0, _)| end <= s0 || start >= e0));
        if let Some((start, end)) = free {
            spans.push((start, end, new));
        }
    }
    spans.sort_by_key(|&(start, _, _)| start);

    if spans.len() > 1 {
        trace!(input = s, spans = spans.len(), "rewriting composite type");
    }

    let mut out = String::with_capacity(s.len() + spans.len() * 4);
    let mut cursor = 0;
    for (start, end, new) in spans {
        out.push_str(&s[cursor..start]);
        out.push_str(new);
        cursor = end;
    }
    out.push_str(&s[cursor..]);
    out
}
