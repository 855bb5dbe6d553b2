//! Property-based tests for tactic composition and correctness
//!
//! Random clause sets over a handful of propositional atoms are pushed
//! through tactic pipelines. The checks are:
//! - `and_then` is associative
//! - `split-clause` produces one subgoal per literal, in order
//! - models reconstructed by `solve-eqs` satisfy the input goal

use proptest::prelude::*;
use tactix_core::ast::{TermId, TermKind, TermManager};
use tactix_core::model::Model;
use tactix_core::resource::TacticContext;
use tactix_core::tactic::{
    ApplyResult, Tactic, and_then, mk_simplify_tactic, mk_solve_eqs_tactic,
    mk_split_clause_tactic, or_else, skip,
};
use tactix_core::Goal;

const ATOMS: [&str; 4] = ["p", "q", "r", "s"];

/// A literal is an atom index and a polarity.
fn clause_strategy() -> impl Strategy<Value = Vec<(usize, bool)>> {
    prop::collection::vec((0..ATOMS.len(), proptest::bool::ANY), 1..4)
}

fn clauses_strategy() -> impl Strategy<Value = Vec<Vec<(usize, bool)>>> {
    prop::collection::vec(clause_strategy(), 1..5)
}

fn mk_clause(tm: &mut TermManager, atoms: &[TermId], lits: &[(usize, bool)]) -> TermId {
    let lits: Vec<TermId> = lits
        .iter()
        .map(|&(i, pos)| if pos { atoms[i] } else { tm.mk_not(atoms[i]) })
        .collect();
    tm.mk_or(lits)
}

fn setup(clauses: &[Vec<(usize, bool)>]) -> (TermManager, Vec<TermId>, Vec<TermId>, Goal) {
    let mut tm = TermManager::new();
    let b = tm.sorts.bool_sort;
    let atoms: Vec<TermId> = ATOMS.iter().map(|n| tm.mk_var(n, b)).collect();
    let forms: Vec<TermId> = clauses
        .iter()
        .map(|c| mk_clause(&mut tm, &atoms, c))
        .collect();
    let mut g = Goal::new(true, false, false).unwrap();
    for &f in &forms {
        g.assert_expr(&mut tm, f);
    }
    (tm, atoms, forms, g)
}

fn run(t: &mut Box<dyn Tactic>, tm: &mut TermManager, g: Goal) -> ApplyResult {
    let mut ctx = TacticContext::new(tm);
    t.apply(g, &mut ctx).unwrap()
}

proptest! {
    /// `(a & b) & c` and `a & (b & c)` produce the same subgoals.
    #[test]
    fn and_then_associative(clauses in clauses_strategy()) {
        let (mut tm, _, _, g) = setup(&clauses);
        let split = || or_else(mk_split_clause_tactic(), skip());
        let mut left = and_then(and_then(mk_simplify_tactic(), split()), mk_solve_eqs_tactic());
        let mut right = and_then(mk_simplify_tactic(), and_then(split(), mk_solve_eqs_tactic()));
        let rl = run(&mut left, &mut tm, g.clone());
        let rr = run(&mut right, &mut tm, g);
        prop_assert_eq!(rl.subgoals, rr.subgoals);
    }

    /// Splitting the first clause yields one subgoal per literal.
    #[test]
    fn split_clause_one_subgoal_per_literal(clauses in clauses_strategy()) {
        let (mut tm, _, _, g) = setup(&clauses);
        let Some(&clause) = g
            .formulas()
            .iter()
            .find(|&&f| matches!(tm.kind(f), Some(TermKind::Or(_))))
        else {
            return Ok(());
        };
        let lits = tm.kind(clause).map(|k| k.children().to_vec()).unwrap_or_default();
        let size = g.size();
        let r = run(&mut mk_split_clause_tactic(), &mut tm, g);
        prop_assert_eq!(r.subgoals.len(), lits.len());
        for (sub, lit) in r.subgoals.iter().zip(&lits) {
            prop_assert_eq!(sub.size(), size);
            prop_assert_eq!(sub.formulas().last(), Some(lit));
        }
    }

    /// A model of a decided-sat result satisfies every input clause.
    #[test]
    fn solved_models_satisfy_input(clauses in clauses_strategy()) {
        let (mut tm, _, forms, g) = setup(&clauses);
        let mut t = and_then(mk_simplify_tactic(), mk_solve_eqs_tactic());
        let r = run(&mut t, &mut tm, g);
        if r.is_decided_sat() {
            let mut m = Model::new();
            if let Some(mc) = &r.mc {
                mc.apply(&mut tm, &mut m, 0).unwrap();
            }
            for &f in &forms {
                let v = m.eval(&mut tm, f, true).unwrap();
                prop_assert!(tm.is_true(v));
            }
        }
    }
}
