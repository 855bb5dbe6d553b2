//! Tactic combinators.
//!
//! Sequential composition is the core of the strategy language: `then`
//! applies its second tactic to every subgoal of its first and composes the
//! converters so that models and proofs flow back to the input goal. The
//! remaining combinators choose between tactics (`or-else`, `cond`),
//! iterate (`repeat`) or change the environment of one run (`try-for`,
//! `using-params`).

use super::probe::ProbeRef;
use super::{ApplyResult, Tactic};
use crate::converter::{Branch, ModelConverter, ProofConverter};
use crate::dependency::DependencySet;
use crate::error::{Result, TactixError};
use crate::goal::Goal;
use crate::params::{ParamDescrs, Params};
use crate::resource::{Deadline, TacticContext};
use tracing::debug;

fn split_mc(parent: Option<ModelConverter>, branches: Vec<Branch>) -> Option<ModelConverter> {
    if parent.is_none() && branches.iter().all(|b| b.child.is_none()) {
        return None;
    }
    Some(ModelConverter::Split {
        parent: parent.map(Box::new),
        branches,
    })
}

fn concat_pc(
    parent: Option<ProofConverter>,
    mut children: Vec<Option<ProofConverter>>,
    counts: Vec<usize>,
) -> Option<ProofConverter> {
    if parent.is_none() {
        if children.iter().all(Option::is_none) {
            return None;
        }
        if children.len() == 1 {
            return children.pop().flatten();
        }
    }
    Some(ProofConverter::Concat {
        parent: parent.map(Box::new),
        children,
        counts,
    })
}

/// Apply `next` to every subgoal of `first` and compose the results.
///
/// A subgoal decided satisfiable by `next` becomes the only result. When
/// every resulting subgoal is refuted they collapse into one refuted goal
/// whose proof and dependencies combine those of the parts.
pub(crate) fn sequence<F>(
    first: ApplyResult,
    ctx: &mut TacticContext<'_>,
    mut next: F,
) -> Result<ApplyResult>
where
    F: FnMut(Goal, &mut TacticContext<'_>) -> Result<ApplyResult>,
{
    let ApplyResult {
        mut subgoals,
        mc,
        pc,
        mut core,
    } = first;
    if subgoals.len() == 1
        && let Some(goal) = subgoals.pop()
    {
        let r = next(goal, ctx)?;
        let pc = concat_pc(pc, vec![r.pc], vec![r.subgoals.len()]);
        let core = DependencySet::join(core.as_ref(), r.core.as_ref());
        return Ok(
            ApplyResult::new(r.subgoals, ModelConverter::concat(mc, r.mc), pc).with_core(core),
        );
    }
    if subgoals.is_empty() {
        return Ok(ApplyResult::new(subgoals, mc, pc).with_core(core));
    }

    let mut out = Vec::new();
    let mut branches = Vec::with_capacity(subgoals.len());
    let mut child_pcs = Vec::with_capacity(subgoals.len());
    let mut counts = Vec::with_capacity(subgoals.len());
    for (i, goal) in subgoals.into_iter().enumerate() {
        ctx.check()?;
        let template = goal.empty_copy();
        let r = next(goal, ctx)?;
        core = DependencySet::join(core.as_ref(), r.core.as_ref());
        if r.is_decided_sat() {
            let sat = r.subgoals.into_iter().next().unwrap_or(template);
            let branch = Branch {
                parent_idx: i,
                child: r.mc,
                count: 1,
            };
            return Ok(ApplyResult::new(vec![sat], split_mc(mc, vec![branch]), None).with_core(core));
        }
        counts.push(r.subgoals.len());
        branches.push(Branch {
            parent_idx: i,
            child: r.mc,
            count: r.subgoals.len(),
        });
        child_pcs.push(r.pc);
        out.extend(r.subgoals);
    }

    let pc = concat_pc(pc, child_pcs, counts);
    if !out.is_empty() && out.iter().all(Goal::is_decided_unsat) {
        let mut refuted = out[0].empty_copy();
        let proofs: Option<Vec<_>> = out.iter().map(|g| g.pr(0).cloned()).collect();
        let proof = match (&pc, proofs) {
            (Some(pc), Some(prs)) if refuted.proofs_enabled() => Some(pc.apply(ctx.tm, &prs)?),
            _ => None,
        };
        let deps = out
            .iter()
            .fold(None, |acc, g| DependencySet::join(acc.as_ref(), g.all_deps().as_ref()));
        let f = ctx.tm.mk_false();
        refuted.assert_formula(ctx.tm, f, proof, deps);
        return Ok(ApplyResult::single(refuted).with_core(core));
    }
    Ok(ApplyResult::new(out, split_mc(mc, branches), pc).with_core(core))
}

/// `first` followed by `second` on each of its subgoals.
#[derive(Debug, Clone)]
pub struct AndThen {
    first: Box<dyn Tactic>,
    second: Box<dyn Tactic>,
}

impl Tactic for AndThen {
    fn name(&self) -> &str {
        "then"
    }

    fn description(&self) -> &str {
        "apply the second tactic to every subgoal of the first"
    }

    fn apply(&mut self, goal: Goal, ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        let r = self.first.apply(goal, ctx)?;
        let second = &mut self.second;
        sequence(r, ctx, |g, ctx| second.apply(g, ctx))
    }

    fn cleanup(&mut self) {
        self.first.cleanup();
        self.second.cleanup();
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        self.first.collect_param_descrs(descrs);
        self.second.collect_param_descrs(descrs);
    }

    fn update_params(&mut self, params: &Params) -> Result<()> {
        self.first.update_params(params)?;
        self.second.update_params(params)
    }

    fn params(&self) -> Params {
        let mut p = self.first.params();
        p.merge(&self.second.params());
        p
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(self.clone())
    }
}

/// Sequential composition of two tactics.
pub fn and_then(first: Box<dyn Tactic>, second: Box<dyn Tactic>) -> Box<dyn Tactic> {
    Box::new(AndThen { first, second })
}

/// Sequential composition of a list of tactics; `skip` for an empty list.
pub fn then_all(tactics: Vec<Box<dyn Tactic>>) -> Box<dyn Tactic> {
    tactics.into_iter().reduce(and_then).unwrap_or_else(skip)
}

/// First alternative that does not raise a tactic exception.
#[derive(Debug, Clone)]
pub struct OrElse {
    tactics: Vec<Box<dyn Tactic>>,
}

impl Tactic for OrElse {
    fn name(&self) -> &str {
        "or-else"
    }

    fn description(&self) -> &str {
        "try alternatives in order until one succeeds"
    }

    fn apply(&mut self, goal: Goal, ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        let n = self.tactics.len();
        for (i, t) in self.tactics.iter_mut().enumerate() {
            if i + 1 == n {
                return t.apply(goal, ctx);
            }
            match t.apply(goal.clone(), ctx) {
                Err(e) if e.is_tactic_exception() => {
                    debug!(tactic = t.name(), error = %e, "or-else: trying next alternative");
                    t.cleanup();
                }
                r => return r,
            }
        }
        Err(TactixError::tactic_failed("or-else has no alternatives"))
    }

    fn cleanup(&mut self) {
        self.tactics.iter_mut().for_each(|t| t.cleanup());
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        for t in &self.tactics {
            t.collect_param_descrs(descrs);
        }
    }

    fn update_params(&mut self, params: &Params) -> Result<()> {
        self.tactics
            .iter_mut()
            .try_for_each(|t| t.update_params(params))
    }

    fn params(&self) -> Params {
        let mut p = Params::new();
        for t in &self.tactics {
            p.merge(&t.params());
        }
        p
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(self.clone())
    }
}

/// `first`, or `second` on the original goal if `first` raises a tactic
/// exception.
pub fn or_else(first: Box<dyn Tactic>, second: Box<dyn Tactic>) -> Box<dyn Tactic> {
    or_else_all(vec![first, second])
}

/// N-ary [`or_else`].
pub fn or_else_all(tactics: Vec<Box<dyn Tactic>>) -> Box<dyn Tactic> {
    Box::new(OrElse { tactics })
}

/// Choose a tactic by a probe.
#[derive(Debug, Clone)]
pub struct Cond {
    probe: ProbeRef,
    then: Box<dyn Tactic>,
    otherwise: Box<dyn Tactic>,
}

impl Tactic for Cond {
    fn name(&self) -> &str {
        "cond"
    }

    fn description(&self) -> &str {
        "apply one of two tactics depending on a probe"
    }

    fn apply(&mut self, goal: Goal, ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        if self.probe.evaluate(&goal, ctx.tm) != 0.0 {
            self.then.apply(goal, ctx)
        } else {
            self.otherwise.apply(goal, ctx)
        }
    }

    fn cleanup(&mut self) {
        self.then.cleanup();
        self.otherwise.cleanup();
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        self.then.collect_param_descrs(descrs);
        self.otherwise.collect_param_descrs(descrs);
    }

    fn update_params(&mut self, params: &Params) -> Result<()> {
        self.then.update_params(params)?;
        self.otherwise.update_params(params)
    }

    fn params(&self) -> Params {
        let mut p = self.then.params();
        p.merge(&self.otherwise.params());
        p
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(self.clone())
    }
}

/// `then` if `probe` holds, else `otherwise`.
pub fn cond(probe: ProbeRef, then: Box<dyn Tactic>, otherwise: Box<dyn Tactic>) -> Box<dyn Tactic> {
    Box::new(Cond {
        probe,
        then,
        otherwise,
    })
}

/// `t` if `probe` holds, else `skip`.
pub fn when(probe: ProbeRef, t: Box<dyn Tactic>) -> Box<dyn Tactic> {
    cond(probe, t, skip())
}

/// Fails when a probe holds.
#[derive(Debug, Clone)]
pub struct FailIf {
    probe: ProbeRef,
}

impl Tactic for FailIf {
    fn name(&self) -> &str {
        "fail-if"
    }

    fn apply(&mut self, goal: Goal, ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        if self.probe.evaluate(&goal, ctx.tm) != 0.0 {
            return Err(TactixError::tactic_failed("fail-if tactic"));
        }
        Ok(ApplyResult::single(goal))
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(self.clone())
    }
}

/// Fail if `probe` holds, else `skip`.
pub fn fail_if(probe: ProbeRef) -> Box<dyn Tactic> {
    Box::new(FailIf { probe })
}

/// Apply a tactic to its own subgoals until nothing changes.
#[derive(Debug, Clone)]
pub struct Repeat {
    inner: Box<dyn Tactic>,
    max_depth: Option<u32>,
}

impl Repeat {
    fn run(&mut self, goal: Goal, depth: u32, ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        ctx.check()?;
        if goal.is_decided() || self.max_depth.is_some_and(|m| depth >= m) {
            return Ok(ApplyResult::single(goal));
        }
        let before = goal.formulas().to_vec();
        let r = self.inner.apply(goal, ctx)?;
        if let [g] = r.subgoals.as_slice()
            && g.formulas() == before.as_slice()
        {
            return Ok(r);
        }
        sequence(r, ctx, |g, ctx| self.run(g, depth + 1, ctx))
    }
}

impl Tactic for Repeat {
    fn name(&self) -> &str {
        "repeat"
    }

    fn description(&self) -> &str {
        "apply a tactic to its subgoals until a fixpoint or the depth limit"
    }

    fn apply(&mut self, goal: Goal, ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        self.run(goal, 0, ctx)
    }

    fn cleanup(&mut self) {
        self.inner.cleanup();
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        self.inner.collect_param_descrs(descrs);
    }

    fn update_params(&mut self, params: &Params) -> Result<()> {
        self.inner.update_params(params)
    }

    fn params(&self) -> Params {
        self.inner.params()
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(self.clone())
    }
}

/// Repeat `t` on its subgoals up to `max_depth` levels (unbounded for `None`).
pub fn repeat(t: Box<dyn Tactic>, max_depth: Option<u32>) -> Box<dyn Tactic> {
    Box::new(Repeat {
        inner: t,
        max_depth,
    })
}

/// Run a tactic under a deadline.
#[derive(Debug, Clone)]
pub struct TryFor {
    inner: Box<dyn Tactic>,
    ms: u64,
}

impl Tactic for TryFor {
    fn name(&self) -> &str {
        "try-for"
    }

    fn description(&self) -> &str {
        "fail with a timeout if the tactic does not finish in time"
    }

    fn apply(&mut self, goal: Goal, ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        let deadline = Deadline::tightest(ctx.deadline(), Some(Deadline::after_ms(self.ms)));
        let prev = ctx.set_deadline(deadline);
        let r = self.inner.apply(goal, ctx);
        ctx.set_deadline(prev);
        r
    }

    fn cleanup(&mut self) {
        self.inner.cleanup();
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        self.inner.collect_param_descrs(descrs);
    }

    fn update_params(&mut self, params: &Params) -> Result<()> {
        self.inner.update_params(params)
    }

    fn params(&self) -> Params {
        self.inner.params()
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(self.clone())
    }
}

/// Run `t` with a budget of `ms` milliseconds.
pub fn try_for(t: Box<dyn Tactic>, ms: u64) -> Box<dyn Tactic> {
    Box::new(TryFor { inner: t, ms })
}

/// Run a tactic with overridden parameters.
#[derive(Debug, Clone)]
pub struct UsingParams {
    inner: Box<dyn Tactic>,
    params: Params,
}

impl Tactic for UsingParams {
    fn name(&self) -> &str {
        "using-params"
    }

    fn description(&self) -> &str {
        "apply a tactic with the given parameters"
    }

    fn apply(&mut self, goal: Goal, ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        let saved = self.inner.params();
        self.inner.update_params(&self.params)?;
        let r = self.inner.apply(goal, ctx);
        let restored = self.inner.update_params(&saved);
        let r = r?;
        restored?;
        Ok(r)
    }

    fn cleanup(&mut self) {
        self.inner.cleanup();
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        self.inner.collect_param_descrs(descrs);
    }

    fn update_params(&mut self, params: &Params) -> Result<()> {
        self.inner.update_params(params)
    }

    fn params(&self) -> Params {
        self.inner.params()
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(self.clone())
    }
}

/// Apply `t` with `params` overriding its configuration for each run.
///
/// Fails with [`TactixError::InvalidParameter`] when `t` does not describe
/// one of the parameters or a type does not match.
pub fn using_params(t: Box<dyn Tactic>, params: Params) -> Result<Box<dyn Tactic>> {
    let mut descrs = ParamDescrs::new();
    t.collect_param_descrs(&mut descrs);
    descrs.validate(&params)?;
    Ok(Box::new(UsingParams { inner: t, params }))
}

/// Returns the goal unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Skip;

impl Tactic for Skip {
    fn name(&self) -> &str {
        "skip"
    }

    fn description(&self) -> &str {
        "do nothing"
    }

    fn apply(&mut self, goal: Goal, _ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        Ok(ApplyResult::single(goal))
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(*self)
    }
}

/// The identity tactic.
pub fn skip() -> Box<dyn Tactic> {
    Box::new(Skip)
}

/// Always fails.
#[derive(Debug, Clone)]
pub struct Fail {
    msg: String,
}

impl Tactic for Fail {
    fn name(&self) -> &str {
        "fail"
    }

    fn description(&self) -> &str {
        "always fail"
    }

    fn apply(&mut self, _goal: Goal, _ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        Err(TactixError::tactic_failed(self.msg.clone()))
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(self.clone())
    }
}

/// A tactic failing with `msg`.
pub fn fail(msg: &str) -> Box<dyn Tactic> {
    Box::new(Fail {
        msg: msg.to_string(),
    })
}

/// Fails unless the goal is decided.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailIfUndecided;

impl Tactic for FailIfUndecided {
    fn name(&self) -> &str {
        "fail-if-undecided"
    }

    fn description(&self) -> &str {
        "fail if the goal is neither empty nor refuted"
    }

    fn apply(&mut self, goal: Goal, _ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        if goal.is_decided() {
            Ok(ApplyResult::single(goal))
        } else {
            Err(TactixError::tactic_failed("undecided"))
        }
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(*self)
    }
}

/// Fail unless the goal is decided.
pub fn fail_if_undecided() -> Box<dyn Tactic> {
    Box::new(FailIfUndecided)
}
