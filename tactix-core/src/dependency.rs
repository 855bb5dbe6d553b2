//! Dependency sets for unsat-core tracking.

use crate::ast::TermId;
use std::sync::Arc;

/// Immutable shared set of tracked assumptions.
///
/// Stored as a sorted, deduplicated slice, so union is a merge and equality
/// is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DependencySet {
    items: Arc<[TermId]>,
}

impl DependencySet {
    /// The empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Singleton set.
    pub fn leaf(t: TermId) -> Self {
        Self {
            items: Arc::from([t]),
        }
    }

    /// Set of the given assumptions.
    pub fn from_terms(terms: impl IntoIterator<Item = TermId>) -> Self {
        let mut v: Vec<TermId> = terms.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        Self { items: v.into() }
    }

    /// Union of two sets.
    pub fn union(&self, other: &DependencySet) -> DependencySet {
        if other.items.is_empty() || Arc::ptr_eq(&self.items, &other.items) {
            return self.clone();
        }
        if self.items.is_empty() {
            return other.clone();
        }
        let (a, b) = (&self.items, &other.items);
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        Self { items: out.into() }
    }

    /// Union of optional sets; `None` is the empty set.
    pub fn join(a: Option<&DependencySet>, b: Option<&DependencySet>) -> Option<DependencySet> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        }
    }

    /// Whether `t` is a member.
    pub fn contains(&self, t: TermId) -> bool {
        self.items.binary_search(&t).is_ok()
    }

    /// Members in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = TermId> + '_ {
        self.items.iter().copied()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_sorted_dedup() {
        let a = DependencySet::from_terms([TermId(5), TermId(1)]);
        let b = DependencySet::from_terms([TermId(3), TermId(5)]);
        let u = a.union(&b);
        assert_eq!(u.iter().collect::<Vec<_>>(), vec![TermId(1), TermId(3), TermId(5)]);
        assert_eq!(u, b.union(&a));
        assert!(u.contains(TermId(3)));
    }

    #[test]
    fn test_join_options() {
        let a = DependencySet::leaf(TermId(2));
        assert_eq!(DependencySet::join(None, None), None);
        assert_eq!(DependencySet::join(Some(&a), None), Some(a.clone()));
        assert!(DependencySet::empty().union(&a).contains(TermId(2)));
    }
}
