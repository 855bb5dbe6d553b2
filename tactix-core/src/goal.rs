//! Goals: conjunctions of formulas with provenance.
//!
//! A goal stores formulas together with an optional proof and an optional
//! dependency set per formula. Which of the two are tracked is fixed when
//! the goal is created: proofs and unsat cores are mutually exclusive.
//!
//! Asserting a formula flattens conjunctions and negated disjunctions and
//! drops `true`. Asserting `false` makes the goal *inconsistent*; from then
//! on it holds the single formula `false` with its justification and
//! ignores further assertions.

use crate::ast::traversal::collect_subterms;
use crate::ast::{TermId, TermKind, TermManager};
use crate::dependency::DependencySet;
use crate::error::{Result, TactixError};
use crate::proof::Proof;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

/// A conjunction of formulas to be transformed by tactics.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    forms: Vec<TermId>,
    proofs: Vec<Option<Proof>>,
    deps: Vec<Option<DependencySet>>,
    models_enabled: bool,
    proofs_enabled: bool,
    cores_enabled: bool,
    inconsistent: bool,
    depth: u32,
}

impl Goal {
    /// Empty goal with the given tracking flags.
    ///
    /// Fails with [`TactixError::InvalidGoal`] when both proofs and unsat
    /// cores are requested.
    pub fn new(models: bool, proofs: bool, cores: bool) -> Result<Self> {
        if proofs && cores {
            return Err(TactixError::InvalidGoal(
                "proofs and unsat cores cannot be enabled together".to_string(),
            ));
        }
        Ok(Self {
            forms: Vec::new(),
            proofs: Vec::new(),
            deps: Vec::new(),
            models_enabled: models,
            proofs_enabled: proofs,
            cores_enabled: cores,
            inconsistent: false,
            depth: 0,
        })
    }

    /// Empty goal with the same flags and depth as `self`.
    pub fn empty_copy(&self) -> Goal {
        Goal {
            forms: Vec::new(),
            proofs: Vec::new(),
            deps: Vec::new(),
            inconsistent: false,
            ..*self
        }
    }

    /// Whether models are requested.
    pub fn models_enabled(&self) -> bool {
        self.models_enabled
    }

    /// Whether proofs are requested.
    pub fn proofs_enabled(&self) -> bool {
        self.proofs_enabled
    }

    /// Whether unsat cores are requested.
    pub fn unsat_core_enabled(&self) -> bool {
        self.cores_enabled
    }

    /// Whether the goal contains `false`.
    pub fn is_inconsistent(&self) -> bool {
        self.inconsistent
    }

    /// Number of transformations applied so far.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Record one more transformation.
    pub fn inc_depth(&mut self) {
        self.depth += 1;
    }

    /// Number of formulas.
    pub fn size(&self) -> usize {
        self.forms.len()
    }

    /// Whether the goal holds no formula.
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Number of distinct subterms over all formulas.
    pub fn num_exprs(&self, tm: &TermManager) -> usize {
        let mut seen = FxHashSet::default();
        for &f in &self.forms {
            seen.extend(collect_subterms(tm, f));
        }
        seen.len()
    }

    /// The i-th formula.
    pub fn form(&self, i: usize) -> TermId {
        self.forms[i]
    }

    /// Proof of the i-th formula, if proofs are tracked.
    pub fn pr(&self, i: usize) -> Option<&Proof> {
        self.proofs.get(i).and_then(Option::as_ref)
    }

    /// Dependencies of the i-th formula, if cores are tracked.
    pub fn dep(&self, i: usize) -> Option<&DependencySet> {
        self.deps.get(i).and_then(Option::as_ref)
    }

    /// All formulas in order.
    pub fn formulas(&self) -> &[TermId] {
        &self.forms
    }

    /// No formulas left and not inconsistent.
    pub fn is_decided_sat(&self) -> bool {
        self.forms.is_empty() && !self.inconsistent
    }

    /// The goal was refuted.
    pub fn is_decided_unsat(&self) -> bool {
        self.inconsistent
    }

    /// Whether the goal was decided either way.
    pub fn is_decided(&self) -> bool {
        self.is_decided_sat() || self.is_decided_unsat()
    }

    /// Dependencies of the whole goal.
    pub fn all_deps(&self) -> Option<DependencySet> {
        self.deps
            .iter()
            .fold(None, |acc, d| DependencySet::join(acc.as_ref(), d.as_ref()))
    }

    fn keep_pr(&self, pr: Option<Proof>) -> Option<Proof> {
        if self.proofs_enabled { pr } else { None }
    }

    fn keep_dep(&self, dep: Option<DependencySet>) -> Option<DependencySet> {
        if self.cores_enabled { dep } else { None }
    }

    fn push_back(&mut self, f: TermId, pr: Option<Proof>, dep: Option<DependencySet>) {
        self.forms.push(f);
        self.proofs.push(pr);
        self.deps.push(dep);
    }

    fn set_inconsistent(&mut self, tm: &TermManager, pr: Option<Proof>, dep: Option<DependencySet>) {
        self.forms.clear();
        self.proofs.clear();
        self.deps.clear();
        self.inconsistent = true;
        self.push_back(tm.mk_false(), pr, dep);
    }

    /// Split `f` into flattened conjuncts, paired with their proofs.
    fn flatten(
        &self,
        tm: &mut TermManager,
        f: TermId,
        pr: Option<Proof>,
        out: &mut Vec<(TermId, Option<Proof>)>,
    ) {
        let mut stack = vec![(f, pr)];
        while let Some((f, pr)) = stack.pop() {
            match tm.kind(f).cloned() {
                Some(TermKind::True) => {}
                Some(TermKind::And(args)) => {
                    for &a in args.iter().rev() {
                        let p = pr.clone().map(|p| Proof::and_elim(p, a));
                        stack.push((a, p));
                    }
                }
                Some(TermKind::Not(inner)) => match tm.kind(inner).cloned() {
                    Some(TermKind::Or(args)) => {
                        for &a in args.iter().rev() {
                            let na = tm.mk_not(a);
                            let p = pr.clone().map(|p| Proof::not_or_elim(p, na));
                            stack.push((na, p));
                        }
                    }
                    Some(TermKind::False) => {}
                    _ => out.push((f, pr)),
                },
                _ => out.push((f, pr)),
            }
        }
    }

    /// Assert a formula with its justification.
    pub fn assert_formula(
        &mut self,
        tm: &mut TermManager,
        f: TermId,
        pr: Option<Proof>,
        dep: Option<DependencySet>,
    ) {
        if self.inconsistent {
            return;
        }
        let pr = self.keep_pr(pr);
        let dep = self.keep_dep(dep);
        let mut parts = Vec::new();
        self.flatten(tm, f, pr, &mut parts);
        for (g, p) in parts {
            if tm.is_false(g) {
                self.set_inconsistent(tm, p, dep);
                return;
            }
            self.push_back(g, p, dep.clone());
        }
    }

    /// Assert an input formula, justified by `asserted` when proofs are on.
    pub fn assert_expr(&mut self, tm: &mut TermManager, f: TermId) {
        let pr = self.proofs_enabled.then(|| Proof::asserted(f));
        self.assert_formula(tm, f, pr, None);
    }

    /// Assert a tracked assumption: its dependency set is the formula itself.
    pub fn assert_tracked(&mut self, tm: &mut TermManager, f: TermId) {
        let pr = self.proofs_enabled.then(|| Proof::asserted(f));
        let dep = self.cores_enabled.then(|| DependencySet::leaf(f));
        self.assert_formula(tm, f, pr, dep);
    }

    /// Replace the i-th formula.
    ///
    /// A conjunction keeps its first conjunct in slot `i` and appends the
    /// rest; `true` leaves `true` in the slot for [`Goal::elim_redundancies`].
    pub fn update(
        &mut self,
        tm: &mut TermManager,
        i: usize,
        f: TermId,
        pr: Option<Proof>,
        dep: Option<DependencySet>,
    ) {
        if self.inconsistent {
            return;
        }
        let pr = self.keep_pr(pr);
        let dep = self.keep_dep(dep);
        let mut parts = Vec::new();
        self.flatten(tm, f, pr.clone(), &mut parts);
        if let Some(pos) = parts.iter().position(|(g, _)| tm.is_false(*g)) {
            let (_, p) = parts.swap_remove(pos);
            self.set_inconsistent(tm, p, dep);
            return;
        }
        let mut parts = parts.into_iter();
        match parts.next() {
            Some((g, p)) => {
                self.forms[i] = g;
                self.proofs[i] = p;
                self.deps[i] = dep.clone();
            }
            None => {
                self.forms[i] = tm.mk_true();
                self.proofs[i] = pr;
                self.deps[i] = dep.clone();
            }
        }
        for (g, p) in parts {
            self.push_back(g, p, dep.clone());
        }
    }

    /// Remove `true` and duplicate formulas; detect complementary literals.
    pub fn elim_redundancies(&mut self, tm: &mut TermManager) {
        if self.inconsistent {
            return;
        }
        // literal -> index in the compacted vectors
        let mut pos_lits: FxHashMap<TermId, usize> = FxHashMap::default();
        let mut neg_lits: FxHashMap<TermId, usize> = FxHashMap::default();
        let mut forms: Vec<TermId> = Vec::with_capacity(self.forms.len());
        let mut proofs: Vec<Option<Proof>> = Vec::with_capacity(self.forms.len());
        let mut deps: Vec<Option<DependencySet>> = Vec::with_capacity(self.forms.len());
        let old_forms = std::mem::take(&mut self.forms);
        let old_proofs = std::mem::take(&mut self.proofs);
        let old_deps = std::mem::take(&mut self.deps);
        for ((f, pr), dep) in old_forms.into_iter().zip(old_proofs).zip(old_deps) {
            if tm.is_true(f) {
                continue;
            }
            let (atom, negated) = match tm.kind(f) {
                Some(TermKind::Not(a)) => (*a, true),
                _ => (f, false),
            };
            let (same, other) = if negated {
                (&mut neg_lits, &pos_lits)
            } else {
                (&mut pos_lits, &neg_lits)
            };
            if same.contains_key(&atom) {
                continue;
            }
            if let Some(&j) = other.get(&atom) {
                let pr = match (pr, proofs[j].clone()) {
                    (Some(p1), Some(p2)) => {
                        Some(Proof::unit_resolution(vec![p2, p1], tm.mk_false()))
                    }
                    _ => None,
                };
                let dep = DependencySet::join(dep.as_ref(), deps[j].as_ref());
                self.set_inconsistent(tm, pr, dep);
                return;
            }
            same.insert(atom, forms.len());
            forms.push(f);
            proofs.push(pr);
            deps.push(dep);
        }
        self.forms = forms;
        self.proofs = proofs;
        self.deps = deps;
    }

    /// Remove all formulas, keeping the flags and the depth.
    pub fn reset(&mut self) {
        self.forms.clear();
        self.proofs.clear();
        self.deps.clear();
        self.inconsistent = false;
    }

    /// The goal as a single conjunction.
    pub fn to_formula(&self, tm: &mut TermManager) -> TermId {
        tm.mk_and(self.forms.iter().copied())
    }

    /// Printer listing the formulas.
    pub fn display<'a>(&'a self, tm: &'a TermManager) -> GoalDisplay<'a> {
        GoalDisplay { goal: self, tm }
    }
}

/// Display adapter returned by [`Goal::display`].
pub struct GoalDisplay<'a> {
    goal: &'a Goal,
    tm: &'a TermManager,
}

impl fmt::Display for GoalDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(goal")?;
        for &form in &self.goal.forms {
            write!(f, "\n  {}", self.tm.display(form))?;
        }
        write!(f, "\n  :depth {})", self.goal.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::ProofRule;

    fn bools(tm: &mut TermManager, names: &[&str]) -> Vec<TermId> {
        names
            .iter()
            .map(|n| tm.mk_var(n, tm.sorts.bool_sort))
            .collect()
    }

    #[test]
    fn test_proofs_and_cores_rejected() {
        assert!(matches!(
            Goal::new(true, true, true),
            Err(TactixError::InvalidGoal(_))
        ));
        assert!(Goal::new(true, true, false).is_ok());
    }

    #[test]
    fn test_assert_flattens() {
        let mut tm = TermManager::new();
        let v = bools(&mut tm, &["a", "b", "c"]);
        let t = tm.mk_true();
        let or_bc = tm.mk_or([v[1], v[2]]);
        let not_or = tm.mk_not(or_bc);
        let f = tm.mk_and([v[0], t, not_or]);
        let mut g = Goal::new(false, true, false).unwrap();
        g.assert_expr(&mut tm, f);
        let nb = tm.mk_not(v[1]);
        let nc = tm.mk_not(v[2]);
        assert_eq!(g.formulas(), &[v[0], nb, nc]);
        assert_eq!(g.pr(1).map(Proof::rule), Some(ProofRule::NotOrElim));
        assert_eq!(g.pr(0).map(Proof::rule), Some(ProofRule::AndElim));
    }

    #[test]
    fn test_false_makes_inconsistent() {
        let mut tm = TermManager::new();
        let v = bools(&mut tm, &["a"]);
        let mut g = Goal::new(false, false, true).unwrap();
        g.assert_expr(&mut tm, v[0]);
        let f = tm.mk_false();
        g.assert_tracked(&mut tm, f);
        assert!(g.is_decided_unsat());
        assert_eq!(g.formulas(), &[f]);
        assert!(g.dep(0).is_some_and(|d| d.contains(f)));
        g.assert_expr(&mut tm, v[0]);
        assert_eq!(g.size(), 1);
    }

    #[test]
    fn test_update_with_conjunction() {
        let mut tm = TermManager::new();
        let v = bools(&mut tm, &["a", "b", "c", "d"]);
        let mut g = Goal::new(false, false, false).unwrap();
        g.assert_expr(&mut tm, v[0]);
        g.assert_expr(&mut tm, v[1]);
        let conj = tm.mk_and([v[2], v[3]]);
        g.update(&mut tm, 0, conj, None, None);
        assert_eq!(g.formulas(), &[v[2], v[1], v[3]]);
    }

    #[test]
    fn test_elim_redundancies() {
        let mut tm = TermManager::new();
        let v = bools(&mut tm, &["a", "b"]);
        let mut g = Goal::new(false, false, true).unwrap();
        g.assert_tracked(&mut tm, v[0]);
        g.assert_tracked(&mut tm, v[1]);
        g.assert_tracked(&mut tm, v[0]);
        let t = tm.mk_true();
        g.update(&mut tm, 1, t, None, None);
        g.elim_redundancies(&mut tm);
        assert_eq!(g.formulas(), &[v[0]]);

        let na = tm.mk_not(v[0]);
        g.assert_tracked(&mut tm, na);
        g.elim_redundancies(&mut tm);
        assert!(g.is_decided_unsat());
        let d = g.dep(0).cloned().unwrap_or_default();
        assert!(d.contains(v[0]) && d.contains(na));
    }

    #[test]
    fn test_decided_sat() {
        let g = Goal::new(true, false, false).unwrap();
        assert!(g.is_decided_sat());
        assert!(!g.is_decided_unsat());
    }
}
