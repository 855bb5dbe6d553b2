//! The `split-clause` tactic: case split on a disjunction of the goal.
//!
//! For a clause `l1 ∨ ... ∨ ln` the goal is replaced by `n` subgoals, the
//! i-th asserting `li` in place of the clause. Refutations of all subgoals
//! combine into a refutation of the input by discharging each `li` as a
//! hypothesis and resolving the resulting lemmas `¬li` against the clause.
//!
//! ## References
//!
//! - Z3's `tactic/core/split_clause_tactic.cpp`

use super::{ApplyResult, Tactic, TacticReport};
use crate::ast::{TermId, TermKind, TermManager};
use crate::converter::ProofConverter;
use crate::error::{Result, TactixError};
use crate::goal::Goal;
use crate::params::{ParamDescrs, Params};
use crate::proof::Proof;
use crate::resource::TacticContext;
use smallvec::SmallVec;

/// Splits the first (or the largest) clause of a goal.
#[derive(Debug, Clone, Default)]
pub struct SplitClauseTactic {
    largest: bool,
}

impl SplitClauseTactic {
    /// Tactic splitting the largest clause when `largest`, else the first.
    pub fn new(largest: bool) -> Self {
        Self { largest }
    }

    /// Index and literals of the clause to split.
    fn select(&self, goal: &Goal, tm: &TermManager) -> Option<(usize, SmallVec<[TermId; 4]>)> {
        let mut best: Option<(usize, SmallVec<[TermId; 4]>)> = None;
        for (i, &f) in goal.formulas().iter().enumerate() {
            let Some(TermKind::Or(lits)) = tm.kind(f) else {
                continue;
            };
            if !self.largest {
                return Some((i, lits.clone()));
            }
            if best.as_ref().is_none_or(|(_, b)| lits.len() > b.len()) {
                best = Some((i, lits.clone()));
            }
        }
        best
    }
}

impl Tactic for SplitClauseTactic {
    fn name(&self) -> &str {
        "split-clause"
    }

    fn description(&self) -> &str {
        "case split on a clause of the goal"
    }

    fn apply(&mut self, goal: Goal, ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        let report = TacticReport::new(self.name(), &goal, ctx.tm);
        let Some((idx, lits)) = self.select(&goal, ctx.tm) else {
            return Err(TactixError::tactic_failed(
                "split-clause tactic failed, goal does not contain any clause",
            ));
        };
        let clause = goal.form(idx);
        let clause_pr = goal.pr(idx).cloned();
        let clause_dep = goal.dep(idx).cloned();

        let mut base = goal.empty_copy();
        for i in 0..goal.size() {
            if i != idx {
                base.assert_formula(
                    ctx.tm,
                    goal.form(i),
                    goal.pr(i).cloned(),
                    goal.dep(i).cloned(),
                );
            }
        }
        base.inc_depth();

        let mut subgoals = Vec::with_capacity(lits.len());
        for &lit in &lits {
            ctx.check()?;
            let mut sub = base.clone();
            let pr = goal.proofs_enabled().then(|| Proof::hypothesis(lit));
            sub.assert_formula(ctx.tm, lit, pr, clause_dep.clone());
            subgoals.push(sub);
        }

        let pc = clause_pr.map(|clause_proof| ProofConverter::SplitClause {
            clause,
            clause_proof,
        });
        let result = ApplyResult::new(subgoals, None, pc);
        report.finish(&result, ctx.tm);
        Ok(result)
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        descrs.insert_bool("split-largest-clause", false, "split the clause with most literals");
    }

    fn update_params(&mut self, params: &Params) -> Result<()> {
        self.largest = params.get_bool("split-largest-clause", self.largest)?;
        Ok(())
    }

    fn params(&self) -> Params {
        let mut p = Params::new();
        p.set_bool("split-largest-clause", self.largest);
        p
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(self.clone())
    }
}

/// The `split-clause` tactic with default settings.
pub fn mk_split_clause_tactic() -> Box<dyn Tactic> {
    Box::new(SplitClauseTactic::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::ProofRule;

    #[test]
    fn test_splits_first_clause() {
        let mut tm = TermManager::new();
        let b = tm.sorts.bool_sort;
        let [p, q, r, s] = ["p", "q", "r", "s"].map(|n| tm.mk_var(n, b));
        let pq = tm.mk_or([p, q]);
        let rsp = tm.mk_or([r, s, p]);
        let mut g = Goal::new(true, false, false).unwrap();
        g.assert_expr(&mut tm, pq);
        g.assert_expr(&mut tm, rsp);

        let mut t = SplitClauseTactic::default();
        let mut ctx = TacticContext::new(&mut tm);
        let res = t.apply(g.clone(), &mut ctx).unwrap();
        assert_eq!(res.subgoals.len(), 2);
        assert_eq!(res.subgoals[0].formulas(), &[rsp, p]);
        assert_eq!(res.subgoals[1].formulas(), &[rsp, q]);
        assert!(res.pc.is_none());

        t.update_params(Params::new().set_bool("split-largest-clause", true))
            .unwrap();
        let res = t.apply(g, &mut ctx).unwrap();
        assert_eq!(res.subgoals.len(), 3);
        assert_eq!(res.subgoals[2].formulas(), &[pq, p]);
    }

    #[test]
    fn test_no_clause_fails() {
        let mut tm = TermManager::new();
        let p = tm.mk_var("p", tm.sorts.bool_sort);
        let mut g = Goal::new(true, false, false).unwrap();
        g.assert_expr(&mut tm, p);
        let mut ctx = TacticContext::new(&mut tm);
        let err = mk_split_clause_tactic().apply(g, &mut ctx).unwrap_err();
        assert!(err.is_tactic_exception());
        assert_eq!(
            err.to_string(),
            "split-clause tactic failed, goal does not contain any clause"
        );
    }

    #[test]
    fn test_subgoals_carry_hypotheses() {
        let mut tm = TermManager::new();
        let b = tm.sorts.bool_sort;
        let p = tm.mk_var("p", b);
        let q = tm.mk_var("q", b);
        let pq = tm.mk_or([p, q]);
        let mut g = Goal::new(true, true, false).unwrap();
        g.assert_expr(&mut tm, pq);

        let mut ctx = TacticContext::new(&mut tm);
        let res = mk_split_clause_tactic().apply(g, &mut ctx).unwrap();
        for (sub, lit) in res.subgoals.iter().zip([p, q]) {
            let pr = sub.pr(0).unwrap();
            assert_eq!(pr.rule(), ProofRule::Hypothesis);
            assert_eq!(pr.conclusion(), lit);
        }
        assert!(matches!(res.pc, Some(ProofConverter::SplitClause { clause, .. }) if clause == pq));
    }
}
