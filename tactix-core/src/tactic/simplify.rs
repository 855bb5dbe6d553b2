//! The `simplify` tactic: rewrite every formula of a goal in place.
//!
//! ## References
//!
//! - Z3's `tactic/core/simplify_tactic.cpp`

use super::{ApplyResult, Tactic, TacticReport};
use crate::error::Result;
use crate::goal::Goal;
use crate::params::{ParamDescrs, Params};
use crate::proof::Proof;
use crate::resource::TacticContext;
use crate::rewrite::{RewriterConfig, ThRewriter};

/// Rewrites each formula with the theory rewriter.
#[derive(Debug, Clone)]
pub struct SimplifyTactic {
    rw: ThRewriter,
    name: &'static str,
}

impl SimplifyTactic {
    /// Tactic with the given rewriter configuration.
    pub fn new(config: RewriterConfig) -> Self {
        Self {
            rw: ThRewriter::new(config),
            name: "simplify",
        }
    }

    /// Tactic configured from parameters.
    pub fn from_params(params: &Params) -> Result<Self> {
        Ok(Self::new(RewriterConfig::from_params(params)?))
    }

    /// The rewriter configuration.
    pub fn config(&self) -> &RewriterConfig {
        self.rw.config()
    }

    fn simplify(&mut self, goal: &mut Goal, ctx: &mut TacticContext<'_>) -> Result<()> {
        let mut i = 0;
        while i < goal.size() && !goal.is_inconsistent() {
            let f = goal.form(i);
            let (r, pr) = if goal.proofs_enabled() {
                let (r, eq) = self.rw.rewrite_with_proof(ctx, f)?;
                let pr = match (goal.pr(i).cloned(), eq) {
                    (Some(old), Some(eq)) => Some(Proof::modus_ponens(old, eq, r)),
                    (old, _) => old,
                };
                (r, pr)
            } else {
                (self.rw.rewrite_in(ctx, f)?, None)
            };
            if r != f {
                let dep = goal.dep(i).cloned();
                goal.update(ctx.tm, i, r, pr, dep);
            }
            ctx.check()?;
            i += 1;
        }
        goal.elim_redundancies(ctx.tm);
        Ok(())
    }
}

impl Default for SimplifyTactic {
    fn default() -> Self {
        Self::new(RewriterConfig::default())
    }
}

impl Tactic for SimplifyTactic {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "apply the theory rewriter to every formula"
    }

    fn apply(&mut self, mut goal: Goal, ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        let report = TacticReport::new(self.name, &goal, ctx.tm);
        self.rw.reset();
        if !goal.is_inconsistent() {
            self.simplify(&mut goal, ctx)?;
        }
        goal.inc_depth();
        let result = ApplyResult::single(goal);
        report.finish(&result, ctx.tm);
        Ok(result)
    }

    fn cleanup(&mut self) {
        self.rw.reset();
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        RewriterConfig::collect_param_descrs(descrs);
    }

    fn update_params(&mut self, params: &Params) -> Result<()> {
        let mut config = self.rw.config().clone();
        config.update(params)?;
        if &config != self.rw.config() {
            self.rw.set_config(config);
        }
        Ok(())
    }

    fn params(&self) -> Params {
        self.rw.config().to_params()
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(self.clone())
    }
}

/// The `simplify` tactic with default settings.
pub fn mk_simplify_tactic() -> Box<dyn Tactic> {
    Box::new(SimplifyTactic::default())
}

/// `simplify` that replaces conjunctions by negated disjunctions.
pub fn mk_elim_and_tactic() -> Box<dyn Tactic> {
    let config = RewriterConfig {
        elim_and: true,
        ..RewriterConfig::default()
    };
    Box::new(SimplifyTactic {
        rw: ThRewriter::new(config),
        name: "elim-and",
    })
}
