//! Term rewriting.
//!
//! Rewriting is split between per-operator *rules* and a *driver*. A rule
//! looks at one application whose arguments are already normalized and
//! reports what it did through a [`BrResult`]:
//!
//! - `Failed`: no rule applies, keep the application as is.
//! - `Done`: the result is in normal form.
//! - `Rewrite1..3`: the result must be revisited to depth 1, 2 or 3.
//! - `RewriteFull`: the result must be revisited completely.
//!
//! [`ThRewriter`] is the driver. It rewrites bottom-up, interprets the
//! status, caches full rewrites, counts steps against `max-steps` and polls
//! the resource guard in every iteration.
//!
//! ## References
//!
//! - Z3's `rewriter/rewriter_types.h` (`br_status`)
//! - Z3's `rewriter/th_rewriter.cpp`

pub mod arith;
pub mod boolean;
pub mod bv;
pub mod poly;

pub use arith::{ArithRewriter, ArithRewriterConfig, ArithStats};
pub use boolean::BoolRewriter;
pub use bv::BvRewriter;

use crate::ast::{TermId, TermManager};
use crate::error::{Result, TactixError};
use crate::params::{ParamDescrs, Params};
use crate::proof::Proof;
use crate::resource::{ResourceGuard, TacticContext};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

/// Status of a rule application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrStatus {
    /// No rule applied
    Failed,
    /// Result is in normal form
    Done,
    /// Revisit the result to depth 1
    Rewrite1,
    /// Revisit the result to depth 2
    Rewrite2,
    /// Revisit the result to depth 3
    Rewrite3,
    /// Revisit the result completely
    RewriteFull,
}

impl BrStatus {
    /// Depth to which a result with this status is revisited.
    /// `None` means unbounded; `Some(0)` means not at all.
    fn revisit_depth(self) -> Option<u32> {
        match self {
            BrStatus::Failed | BrStatus::Done => Some(0),
            BrStatus::Rewrite1 => Some(1),
            BrStatus::Rewrite2 => Some(2),
            BrStatus::Rewrite3 => Some(3),
            BrStatus::RewriteFull => None,
        }
    }
}

/// Outcome of a rule: a status and, unless the rule failed, a result term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrResult {
    status: BrStatus,
    term: Option<TermId>,
}

impl BrResult {
    /// No rule applied.
    pub const FAILED: BrResult = BrResult {
        status: BrStatus::Failed,
        term: None,
    };

    /// No rule applied.
    pub fn failed() -> Self {
        Self::FAILED
    }

    /// Rule produced `term` with the given status.
    pub fn new(status: BrStatus, term: TermId) -> Self {
        debug_assert!(status != BrStatus::Failed, "failed results carry no term");
        Self {
            status,
            term: Some(term),
        }
    }

    /// Result in normal form.
    pub fn done(term: TermId) -> Self {
        Self::new(BrStatus::Done, term)
    }

    /// Result to revisit to depth 1.
    pub fn rewrite1(term: TermId) -> Self {
        Self::new(BrStatus::Rewrite1, term)
    }

    /// Result to revisit to depth 2.
    pub fn rewrite2(term: TermId) -> Self {
        Self::new(BrStatus::Rewrite2, term)
    }

    /// Result to revisit to depth 3.
    pub fn rewrite3(term: TermId) -> Self {
        Self::new(BrStatus::Rewrite3, term)
    }

    /// Result to revisit completely.
    pub fn full(term: TermId) -> Self {
        Self::new(BrStatus::RewriteFull, term)
    }

    /// Status.
    pub fn status(&self) -> BrStatus {
        self.status
    }

    /// Result term; `None` exactly when the rule failed.
    pub fn term(&self) -> Option<TermId> {
        self.term
    }

    /// Whether the rule failed.
    pub fn is_failed(&self) -> bool {
        self.status == BrStatus::Failed
    }
}

/// A family of rewrite rules, keyed on the operator of the application.
pub trait RewriteRules: Send {
    /// Name used in traces.
    fn name(&self) -> &'static str;

    /// Apply the rules to `t`, whose arguments are already normalized.
    /// Operators outside the family yield [`BrResult::FAILED`].
    fn reduce(&mut self, tm: &mut TermManager, t: TermId) -> BrResult;

    /// Drop transient state.
    fn reset(&mut self) {}
}

/// Configuration of the rewriter driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriterConfig {
    /// Maximum number of rewrite steps per call
    pub max_steps: u64,
    /// Flatten nested conjunctions and disjunctions
    pub flat: bool,
    /// Replace conjunctions by negated disjunctions
    pub elim_and: bool,
    /// Arithmetic rules
    pub arith: ArithRewriterConfig,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            max_steps: u64::MAX,
            flat: true,
            elim_and: false,
            arith: ArithRewriterConfig::default(),
        }
    }
}

impl RewriterConfig {
    /// Describe the parameters understood by the rewriter.
    pub fn collect_param_descrs(descrs: &mut ParamDescrs) {
        descrs.insert_uint("max-steps", u64::MAX, "maximum number of rewrite steps");
        descrs.insert_bool("flat", true, "flatten nested and/or");
        descrs.insert_bool("elim-and", false, "replace (and a b) by (not (or (not a) (not b)))");
        ArithRewriterConfig::collect_param_descrs(descrs);
    }

    /// Overwrite fields present in `params`.
    pub fn update(&mut self, params: &Params) -> Result<()> {
        self.max_steps = params.get_uint("max-steps", self.max_steps)?;
        self.flat = params.get_bool("flat", self.flat)?;
        self.elim_and = params.get_bool("elim-and", self.elim_and)?;
        self.arith.update(params)
    }

    /// Build from parameters, starting from the defaults.
    pub fn from_params(params: &Params) -> Result<Self> {
        let mut c = Self::default();
        c.update(params)?;
        Ok(c)
    }

    /// Current values as parameters.
    pub fn to_params(&self) -> Params {
        let mut p = self.arith.to_params();
        p.set_uint("max-steps", self.max_steps);
        p.set_bool("flat", self.flat);
        p.set_bool("elim-and", self.elim_and);
        p
    }
}

/// Counters of the rewriter driver.
#[derive(Debug, Clone, Default)]
pub struct RewriteStats {
    /// Terms visited, including cache hits.
    pub terms_visited: u64,
    /// Rule applications that did not fail.
    pub terms_rewritten: u64,
    /// Full-mode cache hits.
    pub cache_hits: u64,
}

/// Bottom-up rewriter over the boolean, arithmetic and bit-vector rules.
#[derive(Debug)]
pub struct ThRewriter {
    config: RewriterConfig,
    bool_rw: BoolRewriter,
    arith_rw: ArithRewriter,
    bv_rw: BvRewriter,
    cache: FxHashMap<TermId, TermId>,
    steps: u64,
    max_steps: u64,
    stats: RewriteStats,
}

impl Default for ThRewriter {
    fn default() -> Self {
        Self::new(RewriterConfig::default())
    }
}

impl Clone for ThRewriter {
    fn clone(&self) -> Self {
        Self::new(self.config.clone())
    }
}

impl ThRewriter {
    /// Rewriter with the given configuration.
    pub fn new(config: RewriterConfig) -> Self {
        Self {
            bool_rw: BoolRewriter::new(config.flat, config.elim_and),
            arith_rw: ArithRewriter::new(config.arith.clone()),
            bv_rw: BvRewriter::new(),
            max_steps: config.max_steps,
            config,
            cache: FxHashMap::default(),
            steps: 0,
            stats: RewriteStats::default(),
        }
    }

    /// Rewriter configured from parameters.
    pub fn from_params(params: &Params) -> Result<Self> {
        Ok(Self::new(RewriterConfig::from_params(params)?))
    }

    /// Current configuration.
    pub fn config(&self) -> &RewriterConfig {
        &self.config
    }

    /// Replace the configuration, dropping cached results.
    pub fn set_config(&mut self, config: RewriterConfig) {
        *self = Self::new(config);
    }

    /// Driver counters.
    pub fn stats(&self) -> &RewriteStats {
        &self.stats
    }

    /// Arithmetic rule counters.
    pub fn arith_stats(&self) -> &ArithStats {
        self.arith_rw.stats()
    }

    /// Steps taken by the last call.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Number of cached full rewrites.
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Drop the cache and all transient rule state.
    ///
    /// Cached results are term ids of one [`TermManager`]; call this before
    /// rewriting terms of another one.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.steps = 0;
        self.bool_rw.reset();
        self.arith_rw.reset();
        self.bv_rw.reset();
    }

    /// Rewrite without resource checks other than `max-steps`.
    pub fn rewrite(&mut self, tm: &mut TermManager, t: TermId) -> Result<TermId> {
        self.max_steps = self.config.max_steps;
        self.run(tm, &ResourceGuard::unbounded(), t)
    }

    /// Rewrite under the interrupts and limits of `ctx`.
    pub fn rewrite_in(&mut self, ctx: &mut TacticContext<'_>, t: TermId) -> Result<TermId> {
        self.max_steps = ctx
            .limits
            .max_steps
            .map_or(self.config.max_steps, |m| m.min(self.config.max_steps));
        let guard = ctx.guard();
        self.run(ctx.tm, &guard, t)
    }

    /// Rewrite `t`, returning a proof of `t = t'` when it changed.
    pub fn rewrite_with_proof(
        &mut self,
        ctx: &mut TacticContext<'_>,
        t: TermId,
    ) -> Result<(TermId, Option<Proof>)> {
        let r = self.rewrite_in(ctx, t)?;
        let pr = (r != t).then(|| Proof::rewrite(ctx.tm, t, r));
        Ok((r, pr))
    }

    fn run(&mut self, tm: &mut TermManager, guard: &ResourceGuard, t: TermId) -> Result<TermId> {
        self.steps = 0;
        self.visit(tm, guard, t, None)
    }

    fn step(&mut self, tm: &TermManager, guard: &ResourceGuard) -> Result<()> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(TactixError::StepsExceeded {
                limit: self.max_steps,
            });
        }
        guard.check(tm)
    }

    /// Rewrite `t` to `depth` (`None` for unbounded).
    fn visit(
        &mut self,
        tm: &mut TermManager,
        guard: &ResourceGuard,
        t: TermId,
        depth: Option<u32>,
    ) -> Result<TermId> {
        if depth == Some(0) {
            return Ok(t);
        }
        self.stats.terms_visited += 1;
        if depth.is_none()
            && let Some(&r) = self.cache.get(&t)
        {
            self.stats.cache_hits += 1;
            return Ok(r);
        }
        self.step(tm, guard)?;
        let Some(kind) = tm.kind(t).cloned() else {
            return Err(TactixError::Internal(format!("unknown term id {}", t.0)));
        };
        let children = kind.children();
        let child_depth = depth.map(|d| d - 1);
        let mut new_children: SmallVec<[TermId; 4]> = SmallVec::with_capacity(children.len());
        for &c in &children {
            new_children.push(self.visit(tm, guard, c, child_depth)?);
        }
        let t1 = tm.rebuild(t, &new_children);
        let res = self.reduce_app(tm, t1);
        let out = match (res.status(), res.term()) {
            (BrStatus::Failed, _) | (_, None) => t1,
            (BrStatus::Done, Some(r)) => r,
            (status, Some(r)) => {
                trace!(
                    from = %tm.display(t1),
                    to = %tm.display(r),
                    ?status,
                    "rewrite"
                );
                self.visit(tm, guard, r, status.revisit_depth())?
            }
        };
        if depth.is_none() {
            self.cache.insert(t, out);
        }
        Ok(out)
    }

    fn reduce_app(&mut self, tm: &mut TermManager, t: TermId) -> BrResult {
        let rules: [&mut dyn RewriteRules; 3] =
            [&mut self.bool_rw, &mut self.arith_rw, &mut self.bv_rw];
        for rule in rules {
            let r = rule.reduce(tm, t);
            if !r.is_failed() {
                self.stats.terms_rewritten += 1;
                return r;
            }
        }
        BrResult::FAILED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{CancellationToken, ResourceLimits};

    #[test]
    fn test_failed_carries_no_term() {
        assert_eq!(BrResult::failed().term(), None);
        assert!(BrResult::FAILED.is_failed());
        assert_eq!(BrResult::rewrite2(TermId(3)).term(), Some(TermId(3)));
    }

    #[test]
    fn test_rewrite_normalizes_nested() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let one = tm.mk_int(1);
        let two = tm.mk_int(2);
        // (x + 1) + (x + 2) -> 3 + 2*x
        let a = tm.mk_add([x, one]);
        let b = tm.mk_add([x, two]);
        let s = tm.mk_add([a, b]);
        let mut rw = ThRewriter::default();
        let r = rw.rewrite(&mut tm, s).unwrap();
        assert_eq!(tm.display(r).to_string(), "(+ 3 (* 2 x))");
        // a second pass is a fixpoint
        assert_eq!(rw.rewrite(&mut tm, r).unwrap(), r);
    }

    #[test]
    fn test_max_steps() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let one = tm.mk_int(1);
        let mut t = x;
        for _ in 0..10 {
            t = tm.mk_add([t, one]);
        }
        let mut rw = ThRewriter::new(RewriterConfig {
            max_steps: 3,
            ..RewriterConfig::default()
        });
        assert_eq!(
            rw.rewrite(&mut tm, t),
            Err(TactixError::StepsExceeded { limit: 3 })
        );
    }

    #[test]
    fn test_canceled_context() {
        let mut tm = TermManager::new();
        let p = tm.mk_var("p", tm.sorts.bool_sort);
        let token = CancellationToken::new();
        token.cancel();
        let mut ctx = TacticContext::with_token(&mut tm, token).with_limits(ResourceLimits::default());
        let mut rw = ThRewriter::default();
        assert_eq!(rw.rewrite_in(&mut ctx, p), Err(TactixError::Canceled));
    }

    #[test]
    fn test_proof_only_when_changed() {
        let mut tm = TermManager::new();
        let p = tm.mk_var("p", tm.sorts.bool_sort);
        let np = tm.mk_not(p);
        let nnp = tm.mk_not(np);
        let mut ctx = TacticContext::new(&mut tm);
        let mut rw = ThRewriter::default();
        let (r, pr) = rw.rewrite_with_proof(&mut ctx, nnp).unwrap();
        assert_eq!(r, p);
        assert!(pr.is_some());
        let (_, none) = rw.rewrite_with_proof(&mut ctx, p).unwrap();
        assert!(none.is_none());
    }
}
