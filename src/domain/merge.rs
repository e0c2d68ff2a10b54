//! Set-like merges over ordered string collections.
//!
//! Multi-valued entity fields (listed addresses, adapter ids, event ids,
//! contribution ids) are kept duplicate-free with first-seen order.

use std::collections::HashSet;

/// `existing` followed by every element of `incoming` not seen before.
///
/// Duplicates inside `incoming` collapse as well, so applying the same
/// `incoming` twice yields the same result as applying it once.
pub fn union_dedup<S: AsRef<str>>(existing: &[String], incoming: &[S]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(existing.len() + incoming.len());
    let mut out = Vec::with_capacity(existing.len() + incoming.len());

    for item in existing.iter().map(|s| s.as_str()).chain(incoming.iter().map(|s| s.as_ref())) {
        if seen.insert(item) {
            out.push(item.to_string());
        }
    }

    out
}

/// Elements of `existing` not present in `to_remove`, order preserved.
pub fn difference<S: AsRef<str>>(existing: &[String], to_remove: &[S]) -> Vec<String> {
    let remove: HashSet<&str> = to_remove.iter().map(|s| s.as_ref()).collect();
    existing
        .iter()
        .filter(|item| !remove.contains(item.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn v(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_union_preserves_first_seen_order() {
        assert_eq!(union_dedup(&v(&["a", "b"]), &["b", "c"]), v(&["a", "b", "c"]));
        assert_eq!(union_dedup(&v(&[]), &["c", "a", "c"]), v(&["c", "a"]));
    }

    #[test]
    fn test_union_is_idempotent() {
        let once = union_dedup(&v(&["a"]), &["b", "c"]);
        let twice = union_dedup(&once, &["b", "c"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_union_membership_is_set_union() {
        let a = v(&["x", "y", "x"]);
        let b = v(&["z", "y"]);
        let merged: BTreeSet<String> = union_dedup(&a, &b).into_iter().collect();
        let expected: BTreeSet<String> = a.iter().chain(b.iter()).cloned().collect();
        assert_eq!(merged, expected);

        let swapped: BTreeSet<String> = union_dedup(&b, &a).into_iter().collect();
        assert_eq!(merged, swapped);
    }

    #[test]
    fn test_union_collapses_duplicates_in_existing() {
        assert_eq!(union_dedup::<&str>(&v(&["a", "a"]), &[]), v(&["a"]));
    }

    #[test]
    fn test_difference_preserves_order() {
        assert_eq!(difference(&v(&["a", "b", "c"]), &["b"]), v(&["a", "c"]));
        assert_eq!(difference(&v(&["a", "b"]), &["z"]), v(&["a", "b"]));
        assert_eq!(difference::<&str>(&v(&["a"]), &[]), v(&["a"]));
    }

    #[test]
    fn test_difference_undoes_disjoint_union() {
        let s = v(&["a", "b"]);
        let x = v(&["c", "d"]);
        assert_eq!(difference(&union_dedup(&s, &x), &x), s);
    }

    #[test]
    fn test_membership_scenario() {
        let listed = v(&["a", "b"]);
        let listed = union_dedup(&listed, &["b", "c"]);
        assert_eq!(listed, v(&["a", "b", "c"]));
        let listed = difference(&listed, &["a"]);
        assert_eq!(listed, v(&["b", "c"]));
    }
}
