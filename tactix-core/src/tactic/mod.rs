//! Tactic framework.
//!
//! Tactics are transformers that take a [`Goal`] and produce subgoals
//! together with converters that map models and proofs of the subgoals
//! back to the input goal. They form the strategy layer of the solver and
//! are composed with the combinators of [`combinators`].
//!
//! A tactic owns its working state (rewriter caches, counters). After an
//! interrupted run, [`Tactic::cleanup`] drops that state so the next run
//! starts cold.
//!
//! ## References
//!
//! - Z3's `tactic/tactic.h`, `tactic/tactical.cpp`

pub mod bit_blast;
pub mod combinators;
pub mod probe;
pub mod registry;
pub mod simplify;
pub mod solve_eqs;
pub mod split_clause;

pub use bit_blast::{BitBlastConfig, BitBlastTactic, mk_bit_blast_tactic};
pub use combinators::{
    and_then, cond, fail, fail_if, fail_if_undecided, or_else, or_else_all, repeat, skip,
    then_all, try_for, using_params, when,
};
pub use probe::{Probe, ProbeRef};
pub use registry::TacticRegistry;
pub use simplify::{SimplifyTactic, mk_elim_and_tactic, mk_simplify_tactic};
pub use solve_eqs::{SolveEqsConfig, SolveEqsTactic, mk_solve_eqs_tactic};
pub use split_clause::{SplitClauseTactic, mk_split_clause_tactic};

use crate::ast::TermManager;
use crate::converter::{ModelConverter, ProofConverter};
use crate::dependency::DependencySet;
use crate::error::Result;
use crate::goal::Goal;
use crate::params::{ParamDescrs, Params};
use crate::resource::TacticContext;
use std::fmt;
use std::time::Instant;
use tracing::debug;

/// Outcome of a successful tactic application.
#[derive(Debug, Clone)]
pub struct ApplyResult {
    /// Subgoals, in generation order
    pub subgoals: Vec<Goal>,
    /// Maps a model of subgoal `i` to a model of the input goal
    pub mc: Option<ModelConverter>,
    /// Maps refutations of the subgoals to a refutation of the input goal
    pub pc: Option<ProofConverter>,
    /// Tracked assumptions consumed by subgoals the tactic closed
    pub core: Option<DependencySet>,
}

impl ApplyResult {
    /// Subgoals with converters.
    pub fn new(subgoals: Vec<Goal>, mc: Option<ModelConverter>, pc: Option<ProofConverter>) -> Self {
        Self {
            subgoals,
            mc,
            pc,
            core: None,
        }
    }

    /// Attach a dependency core.
    pub fn with_core(mut self, core: Option<DependencySet>) -> Self {
        self.core = core;
        self
    }

    /// A single subgoal without converters.
    pub fn single(goal: Goal) -> Self {
        Self::new(vec![goal], None, None)
    }

    /// No subgoal left: the input goal is satisfiable.
    pub fn is_decided_sat(&self) -> bool {
        match self.subgoals.as_slice() {
            [] => true,
            [g] => g.is_decided_sat(),
            _ => false,
        }
    }

    /// A single refuted subgoal.
    pub fn is_decided_unsat(&self) -> bool {
        matches!(self.subgoals.as_slice(), [g] if g.is_decided_unsat())
    }

    /// Total number of formulas over all subgoals.
    pub fn total_size(&self) -> usize {
        self.subgoals.iter().map(Goal::size).sum()
    }
}

/// A goal-to-subgoals transformation.
pub trait Tactic: Send {
    /// Name used in reports and the registry.
    fn name(&self) -> &str;

    /// One-line description.
    fn description(&self) -> &str {
        ""
    }

    /// Transform `goal`.
    fn apply(&mut self, goal: Goal, ctx: &mut TacticContext<'_>) -> Result<ApplyResult>;

    /// Drop working state left by an earlier (possibly interrupted) run.
    fn cleanup(&mut self) {}

    /// Describe the parameters the tactic understands.
    fn collect_param_descrs(&self, _descrs: &mut ParamDescrs) {}

    /// Overwrite the parameters present in `params`.
    fn update_params(&mut self, _params: &Params) -> Result<()> {
        Ok(())
    }

    /// Current values of all parameters.
    fn params(&self) -> Params {
        Params::new()
    }

    /// Fresh copy with the same configuration and no working state.
    fn box_clone(&self) -> Box<dyn Tactic>;
}

impl Clone for Box<dyn Tactic> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

impl fmt::Debug for dyn Tactic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tactic").field("name", &self.name()).finish()
    }
}

/// Size and timing summary of one tactic run, logged at `debug` level.
#[derive(Debug)]
pub struct TacticReport {
    name: String,
    size_before: usize,
    exprs_before: usize,
    start: Instant,
}

impl TacticReport {
    /// Start timing a run of `name` on `goal`.
    pub fn new(name: &str, goal: &Goal, tm: &TermManager) -> Self {
        Self {
            name: name.to_string(),
            size_before: goal.size(),
            exprs_before: goal.num_exprs(tm),
            start: Instant::now(),
        }
    }

    /// Log the run.
    pub fn finish(self, result: &ApplyResult, tm: &TermManager) {
        let exprs_after: usize = result.subgoals.iter().map(|g| g.num_exprs(tm)).sum();
        debug!(
            tactic = %self.name,
            size_before = self.size_before,
            size_after = result.total_size(),
            exprs_before = self.exprs_before,
            exprs_after,
            subgoals = result.subgoals.len(),
            elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0,
            "tactic report"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_result_verdicts() {
        let mut tm = TermManager::new();
        let g = Goal::new(true, false, false).unwrap();
        assert!(ApplyResult::new(vec![], None, None).is_decided_sat());
        assert!(ApplyResult::single(g.clone()).is_decided_sat());

        let mut unsat = g.clone();
        let f = tm.mk_false();
        unsat.assert_expr(&mut tm, f);
        let r = ApplyResult::single(unsat.clone());
        assert!(r.is_decided_unsat());
        assert!(!r.is_decided_sat());
        assert!(!ApplyResult::new(vec![unsat.clone(), unsat], None, None).is_decided_unsat());
    }

    #[test]
    fn test_box_clone_keeps_name() {
        let t: Box<dyn Tactic> = mk_simplify_tactic();
        let c = t.clone();
        assert_eq!(c.name(), "simplify");
        assert_eq!(format!("{:?}", &*c), "Tactic { name: \"simplify\" }");
    }
}
