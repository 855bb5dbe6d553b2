//! Arithmetic rewriting rules.
//!
//! Rules for the integer and real operators, given normalized arguments:
//!
//! - **Polynomials**: `+ - * uminus` normalize to sums of monomials
//!   (see [`crate::rewrite::poly`])
//! - **Comparisons**: `<= >= < > =` cancel common monomials, detect bounds
//!   and round integer constants ([`compare`])
//! - **Powers**: exact folding and root extraction ([`power`])
//! - **Division**: `/ div mod rem` with SMT-LIB Euclidean semantics
//! - **Casts**: `to_real to_int is_int`
//! - **Transcendentals**: exact values at rational multiples of pi and
//!   inverse/periodicity identities ([`trig`])
//!
//! Irrational numerals are handled exactly through an
//! [`AlgebraicManager`]; any operation that would exceed `max-degree` makes
//! the rule fail instead of approximating.
//!
//! ## References
//!
//! - Z3's `rewriter/arith_rewriter.cpp`
//! - de Moura & Passmore, "Computation in Real Closed Infinitesimal and
//!   Transcendental Extensions of the Rationals" (CADE 2013)

pub mod compare;
pub mod power;
pub mod trig;

use super::{BrResult, RewriteRules};
use crate::ast::{TermId, TermKind, TermManager};
use crate::error::{Result, TactixError};
use crate::params::{ParamDescrs, Params};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use tactix_math::algebraic::{AlgebraicConfig, AlgebraicError, AlgebraicManager, Numeral};
use tactix_math::rational::{div_euclid, floor, mod_euclid, rem_signed};
use tracing::trace;

use compare::Cmp;

/// Configuration of the arithmetic rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithRewriterConfig {
    /// Move every monomial of a comparison to the left-hand side
    pub arith_lhs: bool,
    /// Divide integer comparisons by the gcd of their coefficients
    pub gcd_rounding: bool,
    /// Rewrite `a = b` to `a <= b and a >= b`
    pub eq2ineq: bool,
    /// Drop `to_real` from comparisons over integer terms
    pub elim_to_real: bool,
    /// Push `to_real` over `+` and `*`
    pub push_to_real: bool,
    /// Order the monomials of sums by power product
    pub sort_sums: bool,
    /// Largest exponent folded or expanded, and algebraic degree cap
    pub max_degree: u32,
    /// Expand `t^k` into a product
    pub expand_power: bool,
    /// Collapse repeated factors into powers
    pub mul_to_power: bool,
    /// Rewrite `tan x` to `sin x / cos x`
    pub expand_tan: bool,
    /// Replace `rem` by `mod` under a sign case split
    pub elim_rem: bool,
    /// Evaluate irrational algebraic numerals
    pub algebraic_number_evaluator: bool,
    /// Sum-of-monomials normal form: distribute `*` over `+`
    pub som: bool,
}

impl Default for ArithRewriterConfig {
    fn default() -> Self {
        Self {
            arith_lhs: false,
            gcd_rounding: false,
            eq2ineq: false,
            elim_to_real: false,
            push_to_real: true,
            sort_sums: false,
            max_degree: 64,
            expand_power: false,
            mul_to_power: false,
            expand_tan: false,
            elim_rem: false,
            algebraic_number_evaluator: true,
            som: false,
        }
    }
}

impl ArithRewriterConfig {
    /// Describe the parameters understood by the arithmetic rules.
    pub fn collect_param_descrs(descrs: &mut ParamDescrs) {
        descrs.insert_bool("arith-lhs", false, "all monomials are moved to the left-hand side");
        descrs.insert_bool("gcd-rounding", false, "use gcd rounding on integer comparisons");
        descrs.insert_bool("eq2ineq", false, "split arithmetic equalities into two inequalities");
        descrs.insert_bool("elim-to-real", false, "eliminate to_real from comparisons over integers");
        descrs.insert_bool("push-to-real", true, "distribute to_real over * and +");
        descrs.insert_bool("sort-sums", false, "sort the arguments of + by power product");
        descrs.insert_uint("max-degree", 64, "maximum degree of folded powers and algebraic numbers");
        descrs.insert_bool("expand-power", false, "expand (^ t k) into t*...*t for 1 < k <= max-degree");
        descrs.insert_bool("mul-to-power", false, "collapse repeated factors into powers");
        descrs.insert_bool("expand-tan", false, "replace (tan x) by (/ (sin x) (cos x))");
        descrs.insert_bool("elim-rem", false, "replace rem by mod with a case split on the divisor sign");
        descrs.insert_bool(
            "algebraic-number-evaluator",
            true,
            "simplify and evaluate expressions containing algebraic irrational numbers",
        );
        descrs.insert_bool("som", false, "put polynomials in sum-of-monomials form");
    }

    /// Overwrite fields present in `params`.
    pub fn update(&mut self, params: &Params) -> Result<()> {
        self.arith_lhs = params.get_bool("arith-lhs", self.arith_lhs)?;
        self.gcd_rounding = params.get_bool("gcd-rounding", self.gcd_rounding)?;
        self.eq2ineq = params.get_bool("eq2ineq", self.eq2ineq)?;
        self.elim_to_real = params.get_bool("elim-to-real", self.elim_to_real)?;
        self.push_to_real = params.get_bool("push-to-real", self.push_to_real)?;
        self.sort_sums = params.get_bool("sort-sums", self.sort_sums)?;
        let max_degree = params.get_uint("max-degree", u64::from(self.max_degree))?;
        self.max_degree = u32::try_from(max_degree)
            .map_err(|_| TactixError::invalid_parameter("max-degree", "value does not fit in 32 bits"))?;
        self.expand_power = params.get_bool("expand-power", self.expand_power)?;
        self.mul_to_power = params.get_bool("mul-to-power", self.mul_to_power)?;
        self.expand_tan = params.get_bool("expand-tan", self.expand_tan)?;
        self.elim_rem = params.get_bool("elim-rem", self.elim_rem)?;
        self.algebraic_number_evaluator =
            params.get_bool("algebraic-number-evaluator", self.algebraic_number_evaluator)?;
        self.som = params.get_bool("som", self.som)?;
        Ok(())
    }

    /// Current values as parameters.
    pub fn to_params(&self) -> Params {
        let mut p = Params::new();
        p.set_bool("arith-lhs", self.arith_lhs)
            .set_bool("gcd-rounding", self.gcd_rounding)
            .set_bool("eq2ineq", self.eq2ineq)
            .set_bool("elim-to-real", self.elim_to_real)
            .set_bool("push-to-real", self.push_to_real)
            .set_bool("sort-sums", self.sort_sums)
            .set_uint("max-degree", u64::from(self.max_degree))
            .set_bool("expand-power", self.expand_power)
            .set_bool("mul-to-power", self.mul_to_power)
            .set_bool("expand-tan", self.expand_tan)
            .set_bool("elim-rem", self.elim_rem)
            .set_bool("algebraic-number-evaluator", self.algebraic_number_evaluator)
            .set_bool("som", self.som);
        p
    }
}

/// Counters of the arithmetic rules.
#[derive(Debug, Clone, Default)]
pub struct ArithStats {
    /// Rule applications that did not fail
    pub rewrites: u64,
    /// Comparisons decided to `true` or `false`
    pub comparisons_decided: u64,
    /// Comparisons tightened by gcd rounding
    pub gcd_roundings: u64,
    /// Numeral operations abandoned at the algebraic degree cap
    pub degree_cap_hits: u64,
}

/// Arithmetic rule family.
#[derive(Debug, Clone)]
pub struct ArithRewriter {
    pub(crate) config: ArithRewriterConfig,
    pub(crate) am: AlgebraicManager,
    pub(crate) stats: ArithStats,
}

impl Default for ArithRewriter {
    fn default() -> Self {
        Self::new(ArithRewriterConfig::default())
    }
}

impl ArithRewriter {
    /// Rules with the given configuration.
    pub fn new(config: ArithRewriterConfig) -> Self {
        let am = AlgebraicManager::new(AlgebraicConfig {
            max_degree: config.max_degree as usize,
            ..AlgebraicConfig::default()
        });
        Self {
            config,
            am,
            stats: ArithStats::default(),
        }
    }

    /// Configuration.
    pub fn config(&self) -> &ArithRewriterConfig {
        &self.config
    }

    /// Counters.
    pub fn stats(&self) -> &ArithStats {
        &self.stats
    }

    /// Exact value of a numeral term. Irrational numerals only count when
    /// the algebraic evaluator is enabled.
    pub(crate) fn numeral_value(&self, tm: &TermManager, t: TermId) -> Option<Numeral> {
        if let Some(r) = tm.numeral(t) {
            return Some(Numeral::Rational(r));
        }
        if self.config.algebraic_number_evaluator {
            return tm.algebraic(t).cloned().map(Numeral::Irrational);
        }
        None
    }

    pub(crate) fn note_algebraic_failure(&mut self, e: &AlgebraicError) {
        if matches!(e, AlgebraicError::DegreeExceeded { .. }) {
            self.stats.degree_cap_hits += 1;
        }
        trace!(error = %e, "algebraic operation abandoned");
    }

    /// Run a numeral operation, failing the rule on error.
    pub(crate) fn eval<T>(&mut self, r: tactix_math::algebraic::Result<T>) -> Option<T> {
        match r {
            Ok(v) => Some(v),
            Err(e) => {
                self.note_algebraic_failure(&e);
                None
            }
        }
    }

    fn int_value(tm: &TermManager, t: TermId) -> Option<BigInt> {
        tm.numeral(t).filter(|r| r.is_integer()).map(|r| r.to_integer())
    }

    fn mk_div_core(&mut self, tm: &mut TermManager, a: TermId, b: TermId) -> BrResult {
        let Some(vb) = self.numeral_value(tm, b) else {
            return self.mk_div_products(tm, a, b);
        };
        if vb.is_zero() {
            return BrResult::FAILED;
        }
        if let Some(va) = self.numeral_value(tm, a) {
            let q = self.am.div(&va, &vb);
            return match self.eval(q) {
                Some(q) => BrResult::done(Self::mk_num(tm, q, false)),
                None => BrResult::FAILED,
            };
        }
        // t / v  ->  (1/v) * t
        let inv = self.am.inv(&vb);
        let Some(inv) = self.eval(inv) else {
            return BrResult::FAILED;
        };
        let c = Self::mk_num(tm, inv, false);
        BrResult::rewrite1(tm.mk_mul([c, a]))
    }

    /// `(v1 * b) / (v2 * d)` -> `(v1 / v2) * (b / d)`.
    fn mk_div_products(&mut self, tm: &mut TermManager, a: TermId, b: TermId) -> BrResult {
        let split = |tm: &TermManager, t: TermId| -> Option<(BigRational, TermId)> {
            let Some(TermKind::Mul(xs)) = tm.kind(t) else {
                return None;
            };
            let c = tm.numeral(xs[0])?;
            (xs.len() == 2).then(|| (c, xs[1]))
        };
        let (Some((v1, rest_a)), Some((v2, rest_b))) = (split(tm, a), split(tm, b)) else {
            return BrResult::FAILED;
        };
        if v2.is_zero() {
            return BrResult::FAILED;
        }
        let c = tm.mk_real(v1 / v2);
        let q = tm.mk_div(rest_a, rest_b);
        BrResult::rewrite2(tm.mk_mul([c, q]))
    }

    fn mk_idiv_core(&mut self, tm: &mut TermManager, a: TermId, b: TermId) -> BrResult {
        let Some(k) = Self::int_value(tm, b) else {
            return BrResult::FAILED;
        };
        if k.is_zero() {
            return BrResult::FAILED;
        }
        if let Some(n) = Self::int_value(tm, a)
            && let Some(q) = div_euclid(&n, &k)
        {
            return BrResult::done(tm.mk_int(q));
        }
        if k.is_one() {
            return BrResult::done(a);
        }
        BrResult::FAILED
    }

    fn mk_mod_core(&mut self, tm: &mut TermManager, a: TermId, b: TermId) -> BrResult {
        let Some(k) = Self::int_value(tm, b) else {
            return BrResult::FAILED;
        };
        if k.is_zero() {
            return BrResult::FAILED;
        }
        if let Some(n) = Self::int_value(tm, a)
            && let Some(m) = mod_euclid(&n, &k)
        {
            return BrResult::done(tm.mk_int(m));
        }
        if k.abs().is_one() {
            return BrResult::done(tm.mk_int(0));
        }
        // mod (mod t k) k
        if let Some(TermKind::Mod(_, k2)) = tm.kind(a)
            && *k2 == b
        {
            return BrResult::done(a);
        }
        if k.is_positive() {
            return self.push_mod(tm, a, b, &k);
        }
        BrResult::FAILED
    }

    /// Reduce numeral arguments of a sum or product modulo `k` and drop
    /// inner `mod k`.
    fn push_mod(&mut self, tm: &mut TermManager, a: TermId, b: TermId, k: &BigInt) -> BrResult {
        let (args, is_add) = match tm.kind(a) {
            Some(TermKind::Add(xs)) => (xs.clone(), true),
            Some(TermKind::Mul(xs)) => (xs.clone(), false),
            _ => return BrResult::FAILED,
        };
        let mut changed = false;
        let mut new_args = Vec::with_capacity(args.len());
        for &x in &args {
            let reduced = self.reduce_mod_arg(tm, x, b, k);
            changed |= reduced != x;
            new_args.push(reduced);
        }
        if !changed {
            return BrResult::FAILED;
        }
        let inner = if is_add {
            tm.mk_add(new_args)
        } else {
            tm.mk_mul(new_args)
        };
        BrResult::rewrite3(tm.mk_mod(inner, b))
    }

    fn reduce_mod_arg(&mut self, tm: &mut TermManager, x: TermId, b: TermId, k: &BigInt) -> TermId {
        if let Some(n) = Self::int_value(tm, x) {
            let m = mod_euclid(&n, k).unwrap_or(n);
            return tm.mk_int(m);
        }
        match tm.kind(x).cloned() {
            Some(TermKind::Mod(u, k2)) if k2 == b => u,
            Some(TermKind::Mul(xs)) => {
                let Some(c) = Self::int_value(tm, xs[0]) else {
                    return x;
                };
                let m = mod_euclid(&c, k).unwrap_or(c.clone());
                if m == c {
                    return x;
                }
                let lead = tm.mk_int(m);
                tm.mk_mul(std::iter::once(lead).chain(xs[1..].iter().copied()))
            }
            _ => x,
        }
    }

    fn mk_rem_core(&mut self, tm: &mut TermManager, a: TermId, b: TermId) -> BrResult {
        if let Some(k) = Self::int_value(tm, b) {
            if k.is_zero() {
                return BrResult::FAILED;
            }
            if let Some(n) = Self::int_value(tm, a)
                && let Some(r) = rem_signed(&n, &k)
            {
                return BrResult::done(tm.mk_int(r));
            }
            if k.abs().is_one() {
                return BrResult::done(tm.mk_int(0));
            }
            let m = tm.mk_mod(a, b);
            if k.is_negative() {
                let m1 = tm.mk_int(-1);
                return BrResult::rewrite2(tm.mk_mul([m1, m]));
            }
            return BrResult::rewrite1(m);
        }
        if self.config.elim_rem {
            let zero = tm.mk_int(0);
            let cond = tm.mk_ge(b, zero);
            let m = tm.mk_mod(a, b);
            let neg = tm.mk_neg(m);
            return BrResult::full(tm.mk_ite(cond, m, neg));
        }
        BrResult::FAILED
    }

    fn mk_to_int_core(&mut self, tm: &mut TermManager, a: TermId) -> BrResult {
        if let Some(v) = self.numeral_value(tm, a) {
            let f = match &v {
                Numeral::Rational(r) => Some(floor(r)),
                irrational => {
                    let f = self.am.floor(irrational);
                    self.eval(f)
                }
            };
            return match f {
                Some(f) => BrResult::done(tm.mk_int(f)),
                None => BrResult::FAILED,
            };
        }
        match tm.kind(a) {
            Some(TermKind::ToReal(u)) => BrResult::done(*u),
            _ => BrResult::FAILED,
        }
    }

    fn mk_to_real_core(&mut self, tm: &mut TermManager, a: TermId) -> BrResult {
        if let Some(r) = tm.numeral(a) {
            return BrResult::done(tm.mk_real(r));
        }
        if !tm.is_int(a) {
            // to_real over a real term is the identity
            return BrResult::done(a);
        }
        if self.config.push_to_real {
            let pushed = match tm.kind(a).cloned() {
                Some(TermKind::Add(xs)) => {
                    let ys: Vec<TermId> = xs.iter().map(|&x| tm.mk_to_real(x)).collect();
                    Some(tm.mk_add(ys))
                }
                Some(TermKind::Mul(xs)) => {
                    let ys: Vec<TermId> = xs.iter().map(|&x| tm.mk_to_real(x)).collect();
                    Some(tm.mk_mul(ys))
                }
                _ => None,
            };
            if let Some(p) = pushed {
                return BrResult::rewrite2(p);
            }
        }
        BrResult::FAILED
    }

    fn mk_is_int_core(&mut self, tm: &mut TermManager, a: TermId) -> BrResult {
        if let Some(v) = self.numeral_value(tm, a) {
            return BrResult::done(tm.mk_bool(self.am.is_int(&v)));
        }
        if tm.is_int(a) || matches!(tm.kind(a), Some(TermKind::ToReal(_))) {
            return BrResult::done(tm.mk_true());
        }
        let ti = tm.mk_to_int(a);
        let tr = tm.mk_to_real(ti);
        BrResult::rewrite3(tm.mk_eq(tr, a))
    }
}

impl RewriteRules for ArithRewriter {
    fn name(&self) -> &'static str {
        "arith"
    }

    fn reduce(&mut self, tm: &mut TermManager, t: TermId) -> BrResult {
        let Some(kind) = tm.kind(t).cloned() else {
            return BrResult::FAILED;
        };
        let r = match kind {
            TermKind::Add(args) => self.mk_add_core(tm, t, &args),
            TermKind::Mul(args) => self.mk_mul_core(tm, t, &args),
            TermKind::Neg(a) => self.mk_uminus(tm, t, a),
            TermKind::Sub(a, b) => self.mk_sub_core(tm, t, a, b),
            TermKind::Div(a, b) => self.mk_div_core(tm, a, b),
            TermKind::IntDiv(a, b) => self.mk_idiv_core(tm, a, b),
            TermKind::Mod(a, b) => self.mk_mod_core(tm, a, b),
            TermKind::Rem(a, b) => self.mk_rem_core(tm, a, b),
            TermKind::Power(a, b) => self.mk_power_core(tm, t, a, b),
            TermKind::Le(a, b) => self.mk_le_ge_eq_core(tm, t, Cmp::Le, a, b),
            TermKind::Ge(a, b) => self.mk_le_ge_eq_core(tm, t, Cmp::Ge, a, b),
            TermKind::Eq(a, b) if tm.is_arith(a) => self.mk_le_ge_eq_core(tm, t, Cmp::Eq, a, b),
            TermKind::Lt(a, b) => {
                let le = tm.mk_le(b, a);
                BrResult::rewrite2(tm.mk_not(le))
            }
            TermKind::Gt(a, b) => {
                let le = tm.mk_le(a, b);
                BrResult::rewrite2(tm.mk_not(le))
            }
            TermKind::ToInt(a) => self.mk_to_int_core(tm, a),
            TermKind::ToReal(a) => self.mk_to_real_core(tm, a),
            TermKind::IsInt(a) => self.mk_is_int_core(tm, a),
            TermKind::Sin(_)
            | TermKind::Cos(_)
            | TermKind::Tan(_)
            | TermKind::Asin(_)
            | TermKind::Acos(_)
            | TermKind::Atan(_)
            | TermKind::Sinh(_)
            | TermKind::Cosh(_)
            | TermKind::Tanh(_)
            | TermKind::Asinh(_)
            | TermKind::Acosh(_)
            | TermKind::Atanh(_) => self.mk_trig_core(tm, &kind),
            _ => BrResult::FAILED,
        };
        if !r.is_failed() {
            self.stats.rewrites += 1;
        }
        r
    }

    fn reset(&mut self) {
        self.am.reset_stats();
    }
}
