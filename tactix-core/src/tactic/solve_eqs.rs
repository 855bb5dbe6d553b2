//! The `solve-eqs` tactic: eliminate constants defined by equations.
//!
//! A formula `x = t` where `x` does not occur in `t` is dropped and `x` is
//! replaced by `t` in the rest of the goal. Boolean literals `p` and `¬p`
//! define `p`. With the theory solver enabled, linear equations are solved
//! for a variable with a unit coefficient (integers) or any non-zero
//! coefficient (reals). The eliminated definitions become a model
//! extension, so models of the subgoal extend to models of the input.
//!
//! ## References
//!
//! - Z3's `tactic/core/solve_eqs_tactic.cpp`

use super::{ApplyResult, Tactic, TacticReport};
use crate::ast::traversal::{contains_term, substitute};
use crate::ast::{TermId, TermKind, TermManager};
use crate::converter::ModelConverter;
use crate::dependency::DependencySet;
use crate::error::Result;
use crate::goal::Goal;
use crate::params::{ParamDescrs, Params};
use crate::proof::Proof;
use crate::resource::TacticContext;
use crate::rewrite::ThRewriter;
use crate::rewrite::poly::LinearForm;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Configuration of [`SolveEqsTactic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveEqsConfig {
    /// Skip variables occurring in more formulas than this
    pub max_occs: u64,
    /// Solve linear arithmetic equations
    pub theory_solver: bool,
}

impl Default for SolveEqsConfig {
    fn default() -> Self {
        Self {
            max_occs: u64::MAX,
            theory_solver: true,
        }
    }
}

impl SolveEqsConfig {
    /// Describe the parameters of the tactic.
    pub fn collect_param_descrs(descrs: &mut ParamDescrs) {
        descrs.insert_uint(
            "solve-eqs-max-occs",
            u64::MAX,
            "maximum number of formulas a variable may occur in to be eliminated",
        );
        descrs.insert_bool("theory-solver", true, "solve linear arithmetic equations");
    }

    /// Overwrite fields present in `params`.
    pub fn update(&mut self, params: &Params) -> Result<()> {
        self.max_occs = params.get_uint("solve-eqs-max-occs", self.max_occs)?;
        self.theory_solver = params.get_bool("theory-solver", self.theory_solver)?;
        Ok(())
    }

    /// Current values as parameters.
    pub fn to_params(&self) -> Params {
        let mut p = Params::new();
        p.set_uint("solve-eqs-max-occs", self.max_occs)
            .set_bool("theory-solver", self.theory_solver);
        p
    }
}

/// Gaussian-style elimination of defined constants.
#[derive(Debug, Clone, Default)]
pub struct SolveEqsTactic {
    config: SolveEqsConfig,
    rw: ThRewriter,
    num_eliminated: usize,
}

impl SolveEqsTactic {
    /// Tactic with the given configuration.
    pub fn new(config: SolveEqsConfig) -> Self {
        Self {
            config,
            rw: ThRewriter::default(),
            num_eliminated: 0,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &SolveEqsConfig {
        &self.config
    }

    /// Variables eliminated by the last run.
    pub fn num_eliminated(&self) -> usize {
        self.num_eliminated
    }

    /// `var := def` read off `f` for a variable accepted by `admit`.
    fn solve(
        &self,
        tm: &mut TermManager,
        f: TermId,
        admit: &dyn Fn(&TermManager, TermId) -> bool,
    ) -> Option<(TermId, TermId)> {
        match tm.kind(f).cloned()? {
            TermKind::Var(_) if tm.is_bool(f) && admit(tm, f) => Some((f, tm.mk_true())),
            TermKind::Not(a) if tm.is_var(a) && admit(tm, a) => Some((a, tm.mk_false())),
            TermKind::Eq(a, b) => solve_direct(tm, a, b)
                .filter(|(x, _)| admit(tm, *x))
                .or_else(|| solve_direct(tm, b, a).filter(|(x, _)| admit(tm, *x)))
                .or_else(|| {
                    (self.config.theory_solver && tm.is_arith(a))
                        .then(|| solve_linear(tm, a, b, admit))
                        .flatten()
                }),
            _ => None,
        }
    }

    fn next_candidate(&self, goal: &Goal, tm: &mut TermManager) -> Option<(usize, TermId, TermId)> {
        let max_occs = self.config.max_occs;
        let admit = |tm: &TermManager, var: TermId| {
            let occs = goal
                .formulas()
                .iter()
                .filter(|&&f| contains_term(tm, f, var))
                .count() as u64;
            occs <= max_occs
        };
        (0..goal.size()).find_map(|i| {
            let (var, def) = self.solve(tm, goal.form(i), &admit)?;
            Some((i, var, def))
        })
    }

    /// Drop formula `i` and replace `var` by `def` everywhere else.
    fn eliminate(
        &mut self,
        goal: &mut Goal,
        ctx: &mut TacticContext<'_>,
        i: usize,
        var: TermId,
        def: TermId,
    ) -> Result<()> {
        let eq_pr = goal.pr(i).cloned();
        let eq_dep = goal.dep(i).cloned();
        let t = ctx.tm.mk_true();
        goal.update(ctx.tm, i, t, None, None);

        let mut map = FxHashMap::default();
        map.insert(var, def);
        let mut j = 0;
        while j < goal.size() && !goal.is_inconsistent() {
            let f = goal.form(j);
            if j != i && contains_term(ctx.tm, f, var) {
                let g = substitute(ctx.tm, f, &map);
                let g = self.rw.rewrite_in(ctx, g)?;
                let pr = match (goal.pr(j).cloned(), &eq_pr) {
                    (Some(p), Some(e)) => Some(Proof::substitution(vec![p, e.clone()], g)),
                    _ => None,
                };
                let dep = DependencySet::join(goal.dep(j), eq_dep.as_ref());
                goal.update(ctx.tm, j, g, pr, dep);
            }
            j += 1;
        }
        Ok(())
    }
}

/// `x := t` when `x` is a variable not occurring in `t`.
fn solve_direct(tm: &TermManager, x: TermId, t: TermId) -> Option<(TermId, TermId)> {
    (tm.is_var(x) && tm.sort_of(x) == tm.sort_of(t) && !contains_term(tm, t, x)).then_some((x, t))
}

/// Solve `a = b` for a variable of the linear form `a - b`.
fn solve_linear(
    tm: &mut TermManager,
    a: TermId,
    b: TermId,
    admit: &dyn Fn(&TermManager, TermId) -> bool,
) -> Option<(TermId, TermId)> {
    let lhs = LinearForm::of(tm, a);
    let rhs = LinearForm::of(tm, b);
    let constant = lhs.constant - rhs.constant;
    let mut monomials = lhs.monomials;
    for (c, pp) in rhs.monomials.iter() {
        monomials.add(-c, pp.clone());
    }
    monomials.retain_nonzero();
    let monomials = monomials.into_vec();

    let pick = monomials.iter().position(|(c, pp)| {
        let [x] = pp.as_slice() else {
            return false;
        };
        let coeff_ok = if tm.is_int(*x) {
            c.abs().is_one() && constant.is_integer()
        } else {
            tm.is_real(*x)
        };
        coeff_ok
            && tm.is_var(*x)
            && admit(tm, *x)
            && monomials
                .iter()
                .filter(|(_, other)| other != pp)
                .all(|(d, other)| {
                    (!tm.is_int(*x) || d.is_integer())
                        && other.iter().all(|&f| !contains_term(tm, f, *x))
                })
    })?;

    let (ck, pp) = &monomials[pick];
    let x = pp[0];
    let is_int = tm.is_int(x);
    let mut parts = Vec::with_capacity(monomials.len());
    let c0 = -&constant / ck;
    if !c0.is_zero() {
        parts.push(tm.mk_numeral(c0, is_int));
    }
    for (k, (c, pp)) in monomials.iter().enumerate() {
        if k == pick {
            continue;
        }
        let coeff = -c / ck;
        let product = if pp.len() == 1 { pp[0] } else { tm.mk_mul(pp.iter().copied()) };
        if coeff.is_one() {
            parts.push(product);
        } else {
            let n = tm.mk_numeral(coeff, is_int);
            parts.push(tm.mk_mul([n, product]));
        }
    }
    let def = if parts.is_empty() {
        tm.mk_numeral(BigRational::zero(), is_int)
    } else {
        tm.mk_add(parts)
    };
    Some((x, def))
}

impl Tactic for SolveEqsTactic {
    fn name(&self) -> &str {
        "solve-eqs"
    }

    fn description(&self) -> &str {
        "eliminate variables defined by equations"
    }

    fn apply(&mut self, mut goal: Goal, ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        let report = TacticReport::new(self.name(), &goal, ctx.tm);
        self.rw.reset();
        self.num_eliminated = 0;
        let mut defs = Vec::new();
        if !goal.is_inconsistent() {
            while let Some((i, var, def)) = self.next_candidate(&goal, ctx.tm) {
                ctx.check()?;
                let def = self.rw.rewrite_in(ctx, def)?;
                trace!(var = %ctx.tm.display(var), def = %ctx.tm.display(def), "solved");
                self.eliminate(&mut goal, ctx, i, var, def)?;
                defs.push((var, def));
                if goal.is_inconsistent() {
                    break;
                }
            }
            goal.elim_redundancies(ctx.tm);
        }
        self.num_eliminated = defs.len();
        goal.inc_depth();
        let mc = (goal.models_enabled() && !defs.is_empty()).then(|| ModelConverter::Extension(defs));
        let result = ApplyResult::new(vec![goal], mc, None);
        report.finish(&result, ctx.tm);
        Ok(result)
    }

    fn cleanup(&mut self) {
        self.rw.reset();
        self.num_eliminated = 0;
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        SolveEqsConfig::collect_param_descrs(descrs);
    }

    fn update_params(&mut self, params: &Params) -> Result<()> {
        self.config.update(params)
    }

    fn params(&self) -> Params {
        self.config.to_params()
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(Self::new(self.config.clone()))
    }
}

/// The `solve-eqs` tactic with default settings.
pub fn mk_solve_eqs_tactic() -> Box<dyn Tactic> {
    Box::new(SolveEqsTactic::default())
}
