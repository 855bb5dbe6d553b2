//! Models: assignments of values to uninterpreted constants.
//!
//! Entries keep their insertion order so that printing a model is
//! deterministic. Evaluation substitutes the assigned values and normalizes
//! the result with the theory rewriter.

use crate::ast::traversal::{free_constants, substitute};
use crate::ast::{TermId, TermManager};
use crate::error::Result;
use crate::rewrite::ThRewriter;
use crate::sort::SortKind;
use num_rational::BigRational;
use num_traits::Zero;
use rustc_hash::FxHashMap;
use std::fmt;

/// A (partial) assignment of values to constants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    entries: Vec<(TermId, TermId)>,
    index: FxHashMap<TermId, usize>,
}

impl Model {
    /// Empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` to `var`, replacing a previous assignment in place.
    pub fn register(&mut self, var: TermId, value: TermId) {
        match self.index.get(&var) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(var, self.entries.len());
                self.entries.push((var, value));
            }
        }
    }

    /// Value assigned to `var`.
    pub fn get(&self, var: TermId) -> Option<TermId> {
        self.index.get(&var).map(|&i| self.entries[i].1)
    }

    /// Whether `var` is assigned.
    pub fn contains(&self, var: TermId) -> bool {
        self.index.contains_key(&var)
    }

    /// Drop the assignment of `var`, returning its value.
    pub fn remove(&mut self, var: TermId) -> Option<TermId> {
        let i = self.index.remove(&var)?;
        let (_, value) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(value)
    }

    /// Number of assignments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is assigned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assignments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, TermId)> + '_ {
        self.entries.iter().copied()
    }

    /// Value of `t` under the model.
    ///
    /// With `completion`, constants without an assignment evaluate to the
    /// default value of their sort (`false`, `0`, the zero bit-vector);
    /// otherwise they stay symbolic.
    pub fn eval(&self, tm: &mut TermManager, t: TermId, completion: bool) -> Result<TermId> {
        let mut map: FxHashMap<TermId, TermId> = self.entries.iter().copied().collect();
        if completion {
            for c in free_constants(tm, t) {
                if !map.contains_key(&c)
                    && let Some(v) = default_value(tm, c)
                {
                    map.insert(c, v);
                }
            }
        }
        let s = substitute(tm, t, &map);
        ThRewriter::default().rewrite(tm, s)
    }

    /// Printer listing the assignments.
    pub fn display<'a>(&'a self, tm: &'a TermManager) -> ModelDisplay<'a> {
        ModelDisplay { model: self, tm }
    }
}

/// Default value of the sort of `c`, if the sort has one.
fn default_value(tm: &mut TermManager, c: TermId) -> Option<TermId> {
    let sort = tm.sort_of(c)?;
    let kind = tm.sorts.get(sort)?.kind.clone();
    match kind {
        SortKind::Bool => Some(tm.mk_false()),
        SortKind::Int => Some(tm.mk_int(0)),
        SortKind::Real => Some(tm.mk_real(BigRational::zero())),
        SortKind::BitVec(w) => Some(tm.mk_bv(0, w)),
        _ => None,
    }
}

/// Display adapter returned by [`Model::display`].
pub struct ModelDisplay<'a> {
    model: &'a Model,
    tm: &'a TermManager,
}

impl fmt::Display for ModelDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(model")?;
        for (var, value) in self.model.iter() {
            write!(
                f,
                "\n  (define-fun {} {})",
                self.tm.display(var),
                self.tm.display(value)
            )?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactix_math::rational::rat;

    #[test]
    fn test_register_keeps_order() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let one = tm.mk_int(1);
        let two = tm.mk_int(2);
        let mut m = Model::new();
        m.register(y, one);
        m.register(x, two);
        m.register(y, two);
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![(y, two), (x, two)]);
        assert_eq!(m.remove(y), Some(two));
        assert_eq!(m.get(x), Some(two));
        assert!(!m.contains(y));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_eval_substitutes_and_simplifies() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let two = tm.mk_int(2);
        let sum = tm.mk_add([x, y, two]);
        let mut m = Model::new();
        let three = tm.mk_int(3);
        m.register(x, three);

        let partial = m.eval(&mut tm, sum, false).unwrap();
        assert_eq!(tm.display(partial).to_string(), "(+ 5 y)");
        let full = m.eval(&mut tm, sum, true).unwrap();
        assert_eq!(tm.numeral(full), Some(rat(5)));
    }

    #[test]
    fn test_completion_defaults() {
        let mut tm = TermManager::new();
        let p = tm.mk_var("p", tm.sorts.bool_sort);
        let bv = tm.sorts.bitvec(8);
        let b = tm.mk_var("b", bv);
        let m = Model::new();
        let got = m.eval(&mut tm, p, true).unwrap();
        assert!(tm.is_false(got));
        let zero = tm.mk_bv(0, 8);
        assert_eq!(m.eval(&mut tm, b, true).unwrap(), zero);
        assert_eq!(m.eval(&mut tm, p, false).unwrap(), p);
    }

    #[test]
    fn test_display() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let one = tm.mk_int(1);
        let mut m = Model::new();
        m.register(x, one);
        assert_eq!(m.display(&tm).to_string(), "(model\n  (define-fun x 1))");
    }
}
