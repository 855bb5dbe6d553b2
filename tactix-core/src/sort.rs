//! Sorts (types) of terms.

use lasso::Spur;
use rustc_hash::FxHashMap;

/// Index of an interned sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SortId(pub u32);

/// Kind of a sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SortKind {
    /// Booleans
    Bool,
    /// Mathematical integers
    Int,
    /// Mathematical reals
    Real,
    /// Fixed-width bit-vectors
    BitVec(u32),
    /// Arrays from `domain` to `range`
    Array {
        /// Index sort
        domain: SortId,
        /// Element sort
        range: SortId,
    },
    /// Uninterpreted sort with a name
    Uninterpreted(Spur),
}

/// A sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// The kind of sort
    pub kind: SortKind,
}

impl Sort {
    /// Whether this is the boolean sort.
    pub fn is_bool(&self) -> bool {
        matches!(self.kind, SortKind::Bool)
    }

    /// Whether this is the integer sort.
    pub fn is_int(&self) -> bool {
        matches!(self.kind, SortKind::Int)
    }

    /// Whether this is the real sort.
    pub fn is_real(&self) -> bool {
        matches!(self.kind, SortKind::Real)
    }

    /// Whether this is `Int` or `Real`.
    pub fn is_arith(&self) -> bool {
        matches!(self.kind, SortKind::Int | SortKind::Real)
    }

    /// Width if this is a bit-vector sort.
    pub fn bitvec_width(&self) -> Option<u32> {
        match self.kind {
            SortKind::BitVec(w) => Some(w),
            _ => None,
        }
    }
}

/// Interning table for sorts.
#[derive(Debug)]
pub struct SortManager {
    sorts: Vec<Sort>,
    cache: FxHashMap<SortKind, SortId>,
    /// The boolean sort
    pub bool_sort: SortId,
    /// The integer sort
    pub int_sort: SortId,
    /// The real sort
    pub real_sort: SortId,
}

impl Default for SortManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SortManager {
    /// Create a sort manager with the built-in sorts.
    pub fn new() -> Self {
        let mut mgr = Self {
            sorts: Vec::new(),
            cache: FxHashMap::default(),
            bool_sort: SortId(0),
            int_sort: SortId(0),
            real_sort: SortId(0),
        };
        mgr.bool_sort = mgr.intern(SortKind::Bool);
        mgr.int_sort = mgr.intern(SortKind::Int);
        mgr.real_sort = mgr.intern(SortKind::Real);
        mgr
    }

    /// Intern a sort kind.
    pub fn intern(&mut self, kind: SortKind) -> SortId {
        if let Some(&id) = self.cache.get(&kind) {
            return id;
        }
        let id = SortId(self.sorts.len() as u32);
        self.sorts.push(Sort { kind: kind.clone() });
        self.cache.insert(kind, id);
        id
    }

    /// Bit-vector sort of the given width.
    pub fn bitvec(&mut self, width: u32) -> SortId {
        self.intern(SortKind::BitVec(width))
    }

    /// Array sort.
    pub fn array(&mut self, domain: SortId, range: SortId) -> SortId {
        self.intern(SortKind::Array { domain, range })
    }

    /// Look up a sort.
    pub fn get(&self, id: SortId) -> Option<&Sort> {
        self.sorts.get(id.0 as usize)
    }

    /// Width of a bit-vector sort.
    pub fn bitvec_width(&self, id: SortId) -> Option<u32> {
        self.get(id).and_then(Sort::bitvec_width)
    }

    /// Whether `id` is `Int` or `Real`.
    pub fn is_arith(&self, id: SortId) -> bool {
        id == self.int_sort || id == self.real_sort
    }

    /// Number of interned sorts.
    pub fn len(&self) -> usize {
        self.sorts.len()
    }

    /// Always false: the built-in sorts are interned on creation.
    pub fn is_empty(&self) -> bool {
        self.sorts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sorts_distinct() {
        let sm = SortManager::new();
        assert_ne!(sm.bool_sort, sm.int_sort);
        assert_ne!(sm.int_sort, sm.real_sort);
        assert!(sm.get(sm.real_sort).is_some_and(Sort::is_real));
    }

    #[test]
    fn test_bitvec_interning() {
        let mut sm = SortManager::new();
        let a = sm.bitvec(8);
        let b = sm.bitvec(8);
        let c = sm.bitvec(16);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(sm.bitvec_width(c), Some(16));
    }
}
