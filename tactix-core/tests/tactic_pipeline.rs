//! End-to-end tests of tactic pipelines over the public API.

use num_rational::BigRational;
use tactix_core::ast::traversal::{contains_term, free_constants};
use tactix_core::ast::{TermId, TermKind, TermManager};
use tactix_core::model::Model;
use tactix_core::resource::{CancellationToken, TacticContext};
use tactix_core::tactic::{
    ApplyResult, Tactic, TacticRegistry, and_then, mk_bit_blast_tactic, mk_simplify_tactic,
    mk_solve_eqs_tactic, mk_split_clause_tactic, or_else, repeat, skip,
};
use tactix_core::{Goal, Params, SolveResult, TactixError, mk_solver};
use tracing_subscriber::EnvFilter;

/// Route tactic reports to the test output, filtered by `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn goal_of(tm: &mut TermManager, forms: &[TermId]) -> Goal {
    let mut g = Goal::new(true, false, false).unwrap();
    for &f in forms {
        g.assert_expr(tm, f);
    }
    g
}

fn run(tactic: &mut Box<dyn Tactic>, tm: &mut TermManager, g: Goal) -> ApplyResult {
    let mut ctx = TacticContext::new(tm);
    tactic.apply(g, &mut ctx).unwrap()
}

fn rat(n: i64) -> BigRational {
    BigRational::from_integer(n.into())
}

#[test]
fn and_then_is_associative() {
    init_tracing();
    let mut tm = TermManager::new();
    let b = tm.sorts.bool_sort;
    let [p, q, r] = ["p", "q", "r"].map(|n| tm.mk_var(n, b));
    let x = tm.mk_var("x", tm.sorts.int_sort);
    let five = tm.mk_int(5);
    let eq = tm.mk_eq(x, five);
    let nq = tm.mk_not(q);
    let c1 = tm.mk_or([p, q]);
    let c2 = tm.mk_or([nq, r]);
    let g = goal_of(&mut tm, &[c1, c2, eq]);

    let split = || or_else(mk_split_clause_tactic(), skip());
    let mut left = and_then(and_then(mk_simplify_tactic(), split()), mk_solve_eqs_tactic());
    let mut right = and_then(mk_simplify_tactic(), and_then(split(), mk_solve_eqs_tactic()));
    let rl = run(&mut left, &mut tm, g.clone());
    let rr = run(&mut right, &mut tm, g);

    assert_eq!(rl.subgoals, rr.subgoals);
    // the q branch is solved outright and short-circuits the split
    assert!(rl.is_decided_sat());
    let mut ml = Model::new();
    let mut mr = Model::new();
    rl.mc.as_ref().unwrap().apply(&mut tm, &mut ml, 0).unwrap();
    rr.mc.as_ref().unwrap().apply(&mut tm, &mut mr, 0).unwrap();
    for v in [x, q, r] {
        assert_eq!(ml.get(v), mr.get(v));
    }
    assert_eq!(ml.get(x), Some(five));
    assert_eq!(ml.get(r), Some(tm.mk_true()));
}

#[test]
fn repeat_split_on_clause_free_goal_is_identity() {
    let mut tm = TermManager::new();
    let p = tm.mk_var("p", tm.sorts.bool_sort);
    let x = tm.mk_var("x", tm.sorts.int_sort);
    let zero = tm.mk_int(0);
    let le = tm.mk_le(x, zero);
    let g = goal_of(&mut tm, &[p, le]);

    let mut t = repeat(or_else(mk_split_clause_tactic(), skip()), None);
    let r = run(&mut t, &mut tm, g.clone());
    assert_eq!(r.subgoals.len(), 1);
    assert_eq!(r.subgoals[0].formulas(), g.formulas());
    assert!(r.mc.is_none());
}

#[test]
fn repeat_split_enumerates_cases() {
    let mut tm = TermManager::new();
    let b = tm.sorts.bool_sort;
    let [p, q, r, s] = ["p", "q", "r", "s"].map(|n| tm.mk_var(n, b));
    let c1 = tm.mk_or([p, q]);
    let c2 = tm.mk_or([r, s]);
    let g = goal_of(&mut tm, &[c1, c2]);

    let mut t = repeat(or_else(mk_split_clause_tactic(), skip()), None);
    let res = run(&mut t, &mut tm, g);
    assert_eq!(res.subgoals.len(), 4);
    assert!(
        res.subgoals
            .iter()
            .all(|sub| sub.formulas().iter().all(|&f| tm.is_var(f)))
    );
}

#[test]
fn bit_blast_rerun_after_cancel_matches_cold_run() {
    init_tracing();
    let mut tm = TermManager::new();
    let bv8 = tm.sorts.bitvec(8);
    let x = tm.mk_var("x", bv8);
    let y = tm.mk_var("y", bv8);
    let sum = tm.mk_app(TermKind::BvAdd(x, y));
    let three = tm.mk_bv(3, 8);
    let f = tm.mk_eq(sum, three);
    let g = goal_of(&mut tm, &[f]);

    let cold = run(&mut mk_bit_blast_tactic(), &mut tm, g.clone());

    let mut t = mk_bit_blast_tactic();
    let token = CancellationToken::new();
    token.cancel();
    let mut ctx = TacticContext::with_token(&mut tm, token);
    assert_eq!(t.apply(g.clone(), &mut ctx).unwrap_err(), TactixError::Canceled);
    t.cleanup();
    let warm = run(&mut t, &mut tm, g);

    assert_eq!(warm.subgoals, cold.subgoals);
    assert_eq!(warm.mc, cold.mc);
    assert!(
        warm.subgoals[0]
            .formulas()
            .iter()
            .all(|&f| !contains_term(&tm, f, x) && !contains_term(&tm, f, y))
    );
}

#[test]
fn bit_blast_rerun_after_step_limit_matches_cold_run() {
    let mut tm = TermManager::new();
    let bv8 = tm.sorts.bitvec(8);
    let x = tm.mk_var("x", bv8);
    let y = tm.mk_var("y", bv8);
    let lt = tm.mk_app(TermKind::BvUlt(x, y));
    let sum = tm.mk_app(TermKind::BvAdd(x, y));
    let three = tm.mk_bv(3, 8);
    let eq = tm.mk_eq(sum, three);
    let g = goal_of(&mut tm, &[lt, eq]);

    let cold = run(&mut mk_bit_blast_tactic(), &mut tm, g.clone());

    // the limit trips while the second formula is being blasted
    let mut t = mk_bit_blast_tactic();
    let mut params = Params::new();
    params.set_uint("max-steps", 4);
    t.update_params(&params).unwrap();
    let mut ctx = TacticContext::new(&mut tm);
    assert!(matches!(
        t.apply(g.clone(), &mut ctx),
        Err(TactixError::StepsExceeded { limit: 4 })
    ));
    t.cleanup();
    params.set_uint("max-steps", u64::MAX);
    t.update_params(&params).unwrap();
    let warm = run(&mut t, &mut tm, g);

    assert_eq!(warm.subgoals, cold.subgoals);
    assert_eq!(warm.mc, cold.mc);
}

#[test]
fn solver_reused_across_term_managers() {
    let mut solver = mk_solver(and_then(mk_simplify_tactic(), mk_solve_eqs_tactic()));

    let mut tm1 = TermManager::new();
    let x = tm1.mk_var("x", tm1.sorts.int_sort);
    let y = tm1.mk_var("y", tm1.sorts.int_sort);
    let sum = tm1.mk_add([x, y, x]);
    let le = tm1.mk_le(sum, y);
    solver.push();
    solver.assert(le);
    assert_eq!(solver.check_sat(&mut tm1), SolveResult::Unknown);
    solver.pop();

    let mut tm2 = TermManager::new();
    let b = tm2.sorts.bool_sort;
    let [p, q] = ["p", "q"].map(|n| tm2.mk_var(n, b));
    let z = tm2.mk_var("z", tm2.sorts.int_sort);
    let three = tm2.mk_int(3);
    let clause = tm2.mk_or([p, q]);
    let eq = tm2.mk_eq(z, three);
    solver.assert(clause);
    solver.assert(eq);
    assert_eq!(solver.check_sat(&mut tm2), SolveResult::Unknown);
    assert_eq!(solver.reason_unknown(), Some("incomplete"));

    let g = goal_of(&mut tm2, &[clause, eq]);
    let fresh = run(
        &mut and_then(mk_simplify_tactic(), mk_solve_eqs_tactic()),
        &mut tm2,
        g,
    );
    assert_eq!(fresh.subgoals[0].formulas(), &[clause]);

    solver.reset();
    solver.assert(eq);
    assert_eq!(solver.check_sat(&mut tm2), SolveResult::Sat);
    assert_eq!(solver.model().and_then(|m| m.get(z)), Some(three));
}

#[test]
fn proofs_and_cores_are_exclusive() {
    assert!(matches!(
        Goal::new(true, true, true),
        Err(TactixError::InvalidGoal(_))
    ));
    assert!(Goal::new(false, true, false).is_ok());
    assert!(Goal::new(false, false, true).is_ok());
}

#[test]
fn simplify_then_solve_eqs_keeps_y_and_reconstructs_x() {
    init_tracing();
    let mut tm = TermManager::new();
    let x = tm.mk_var("x", tm.sorts.real_sort);
    let y = tm.mk_var("y", tm.sorts.real_sort);
    let zero = tm.mk_real(rat(0));
    let two = tm.mk_real(rat(2));
    let f1 = tm.mk_gt(x, zero);
    let f2 = tm.mk_gt(y, zero);
    let y2 = tm.mk_add([y, two]);
    let f3 = tm.mk_eq(x, y2);
    let g = goal_of(&mut tm, &[f1, f2, f3]);

    let mut t = and_then(mk_simplify_tactic(), mk_solve_eqs_tactic());
    let r = run(&mut t, &mut tm, g);
    assert_eq!(r.subgoals.len(), 1);
    let sub = &r.subgoals[0];
    assert!(!sub.is_decided());
    for &f in sub.formulas() {
        assert_eq!(free_constants(&tm, f), vec![y]);
    }

    let mut m = Model::new();
    let half = tm.mk_real(BigRational::new(1.into(), 2.into()));
    m.register(y, half);
    r.mc.unwrap().apply(&mut tm, &mut m, 0).unwrap();
    let expected = tm.mk_real(BigRational::new(5.into(), 2.into()));
    assert_eq!(m.get(x), Some(expected));
}

#[test]
fn registry_strategy_through_solver() {
    init_tracing();
    let mut tm = TermManager::new();
    let registry = TacticRegistry::default();
    let x = tm.mk_var("x", tm.sorts.int_sort);
    let y = tm.mk_var("y", tm.sorts.int_sort);
    let seven = tm.mk_int(7);
    let sum = tm.mk_add([x, y]);
    let f1 = tm.mk_eq(sum, seven);
    let f2 = tm.mk_eq(y, seven);

    let strategy = and_then(
        registry.mk_tactic("simplify").unwrap(),
        repeat(registry.mk_tactic("solve-eqs").unwrap(), None),
    );
    let mut solver = mk_solver(strategy);
    solver.assert(f1);
    solver.assert(f2);
    assert_eq!(solver.check_sat(&mut tm), SolveResult::Sat);
    let model = solver.model().unwrap();
    let mut values = Vec::new();
    for v in [x, y] {
        let value = model.get(v).and_then(|t| tm.numeral(t));
        values.push(value);
    }
    assert_eq!(values, vec![Some(rat(0)), Some(rat(7))]);
}
