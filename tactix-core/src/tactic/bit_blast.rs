//! The `bit-blast` tactic: reduce bit-vector atoms to propositional logic.
//!
//! Every bit-vector constant `x` of width `w` is replaced by boolean
//! constants `x!0 .. x!{w-1}` (least significant first), and every
//! bit-vector operation by a circuit over those bits:
//!
//! ```text
//! x + y (4-bit)  becomes:
//! s[0] = x[0] ⊕ y[0]
//! c[0] = x[0] ∧ y[0]
//! s[1] = x[1] ⊕ y[1] ⊕ c[0]
//! c[1] = (x[1] ∧ y[1]) ∨ ((x[1] ⊕ y[1]) ∧ c[0])
//! ...
//! ```
//!
//! Atoms the configuration does not allow to blast (adders without
//! `blast-add`, multipliers without `blast-mul`, uninterpreted applications
//! without `blast-full`, quantifiers without `blast-quant`, arrays) are kept
//! as they are. A blasted constant that still occurs in a kept atom is tied
//! to its bits by `x = concat(ite(x!{w-1}, #b1, #b0), ..)`.
//!
//! Circuits fold constant bits, so blasting a goal twice yields the same
//! terms.
//!
//! ## References
//!
//! - Brummayer & Biere: "Boolector: An Efficient SMT Solver for Bit-Vectors and Arrays" (TACAS 2009)
//! - Z3's `tactic/bv/bit_blaster_tactic.cpp`

use super::{ApplyResult, Tactic, TacticReport};
use crate::ast::traversal::free_constants;
use crate::ast::{TermId, TermKind, TermManager};
use crate::converter::ModelConverter;
use crate::error::{Result, TactixError};
use crate::goal::Goal;
use crate::params::{ParamDescrs, Params};
use crate::proof::{Proof, ProofRule};
use crate::resource::{ResourceGuard, TacticContext};
use crate::sort::SortId;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bits of a bit-vector term, least significant first.
type Bits = Vec<TermId>;

/// Interrupts are polled every this many steps.
const CHECK_INTERVAL: u64 = 256;

/// Configuration of [`BitBlastTactic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitBlastConfig {
    /// Blast adders, subtractors and negation
    pub blast_add: bool,
    /// Blast multipliers
    pub blast_mul: bool,
    /// Blast variables bound by quantifiers
    pub blast_quant: bool,
    /// Blast bit-vector applications of uninterpreted functions
    pub blast_full: bool,
    /// Memory limit in megabytes
    pub max_memory: u64,
    /// Maximum number of blasting steps per run
    pub max_steps: u64,
}

impl Default for BitBlastConfig {
    fn default() -> Self {
        Self {
            blast_add: true,
            blast_mul: true,
            blast_quant: false,
            blast_full: false,
            max_memory: u64::MAX,
            max_steps: u64::MAX,
        }
    }
}

impl BitBlastConfig {
    /// Describe the parameters of the tactic.
    pub fn collect_param_descrs(descrs: &mut ParamDescrs) {
        descrs.insert_uint("max-memory", u64::MAX, "maximum amount of memory in megabytes");
        descrs.insert_uint("max-steps", u64::MAX, "maximum number of steps");
        descrs.insert_bool("blast-add", true, "bit-blast adders");
        descrs.insert_bool("blast-mul", true, "bit-blast multipliers");
        descrs.insert_bool("blast-quant", false, "bit-blast quantified variables");
        descrs.insert_bool(
            "blast-full",
            false,
            "bit-blast any term with bit-vector sort, including uninterpreted applications",
        );
    }

    /// Overwrite fields present in `params`.
    pub fn update(&mut self, params: &Params) -> Result<()> {
        self.max_memory = params.get_uint("max-memory", self.max_memory)?;
        self.max_steps = params.get_uint("max-steps", self.max_steps)?;
        self.blast_add = params.get_bool("blast-add", self.blast_add)?;
        self.blast_mul = params.get_bool("blast-mul", self.blast_mul)?;
        self.blast_quant = params.get_bool("blast-quant", self.blast_quant)?;
        self.blast_full = params.get_bool("blast-full", self.blast_full)?;
        Ok(())
    }

    /// Current values as parameters.
    pub fn to_params(&self) -> Params {
        let mut p = Params::new();
        p.set_uint("max-memory", self.max_memory)
            .set_uint("max-steps", self.max_steps)
            .set_bool("blast-add", self.blast_add)
            .set_bool("blast-mul", self.blast_mul)
            .set_bool("blast-quant", self.blast_quant)
            .set_bool("blast-full", self.blast_full);
        p
    }

    fn memory_limit(&self) -> Option<usize> {
        (self.max_memory != u64::MAX).then(|| {
            usize::try_from(self.max_memory.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
        })
    }
}

/// Statistics for bit-blasting.
#[derive(Debug, Clone, Default)]
pub struct BitBlastStats {
    /// Bit-vector constants replaced by bits
    pub consts_blasted: u64,
    /// Boolean constants introduced
    pub bits_generated: u64,
    /// Atoms turned into circuits
    pub atoms_blasted: u64,
    /// Atoms left untouched
    pub atoms_kept: u64,
    /// Steps of the last run
    pub steps: u64,
}

/// A quantifier whose bit-vector variables are being blasted.
#[derive(Debug, Default)]
struct Scope {
    bound: FxHashMap<TermId, Bits>,
    escaped: bool,
    term_cache: FxHashMap<TermId, Bits>,
    formula_cache: FxHashMap<TermId, TermId>,
}

/// Bit-blasting tactic.
#[derive(Debug, Default)]
pub struct BitBlastTactic {
    config: BitBlastConfig,
    stats: BitBlastStats,
    consts: Vec<(TermId, Bits)>,
    const_index: FxHashMap<TermId, usize>,
    apps: Vec<(TermId, Bits)>,
    kept: FxHashSet<TermId>,
    support: FxHashMap<TermId, bool>,
    /// Innermost last; the first entry is the quantifier-free scope
    scopes: Vec<Scope>,
    guard: ResourceGuard,
    steps: u64,
}

impl Clone for BitBlastTactic {
    fn clone(&self) -> Self {
        Self::new(self.config.clone())
    }
}

impl BitBlastTactic {
    /// Tactic with the given configuration.
    pub fn new(config: BitBlastConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The configuration.
    pub fn config(&self) -> &BitBlastConfig {
        &self.config
    }

    /// Statistics, accumulated over runs.
    pub fn stats(&self) -> &BitBlastStats {
        &self.stats
    }

    fn reset_run(&mut self) {
        self.consts.clear();
        self.const_index.clear();
        self.apps.clear();
        self.kept.clear();
        self.support.clear();
        self.scopes.clear();
        self.steps = 0;
    }

    fn step(&mut self, tm: &TermManager) -> Result<()> {
        self.steps += 1;
        if self.steps > self.config.max_steps {
            return Err(TactixError::StepsExceeded {
                limit: self.config.max_steps,
            });
        }
        if self.steps % CHECK_INTERVAL == 0 {
            if let Some(limit) = self.config.memory_limit()
                && tm.memory_estimate() > limit
            {
                return Err(TactixError::MemoryExceeded { limit });
            }
            self.guard.check(tm)?;
        }
        Ok(())
    }

    fn scope(&mut self) -> &mut Scope {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::default());
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn bound_bits(&self, t: TermId) -> Option<&Bits> {
        self.scopes.iter().rev().find_map(|s| s.bound.get(&t))
    }

    /// Whether every operation of the bit-vector term `t` can be blasted.
    fn supported(&mut self, tm: &TermManager, t: TermId) -> bool {
        if let Some(&s) = self.support.get(&t) {
            return s;
        }
        let s = match tm.kind(t) {
            Some(TermKind::BitVecConst { .. } | TermKind::Var(_)) => true,
            Some(
                TermKind::BvNot(a)
                | TermKind::BvExtract { arg: a, .. },
            ) => self.supported(tm, *a),
            Some(
                TermKind::BvAnd(a, b)
                | TermKind::BvOr(a, b)
                | TermKind::BvXor(a, b)
                | TermKind::BvConcat(a, b)
                | TermKind::Ite(_, a, b),
            ) => self.supported(tm, *a) && self.supported(tm, *b),
            Some(TermKind::BvNeg(a)) => self.config.blast_add && self.supported(tm, *a),
            Some(TermKind::BvAdd(a, b) | TermKind::BvSub(a, b)) => {
                self.config.blast_add && self.supported(tm, *a) && self.supported(tm, *b)
            }
            Some(TermKind::BvMul(a, b)) => {
                self.config.blast_mul && self.supported(tm, *a) && self.supported(tm, *b)
            }
            Some(TermKind::Apply { .. }) => self.config.blast_full,
            _ => false,
        };
        self.support.insert(t, s);
        s
    }

    /// Bits of the bit-vector constant `t`, introducing them on first use.
    fn var_bits(&mut self, tm: &mut TermManager, t: TermId) -> Result<Bits> {
        if let Some(bits) = self.bound_bits(t) {
            return Ok(bits.clone());
        }
        if let Some(&i) = self.const_index.get(&t) {
            return Ok(self.consts[i].1.clone());
        }
        let (Some(name), Some(w)) = (tm.var_name(t).map(str::to_string), bv_width(tm, t)) else {
            return Err(TactixError::Internal(format!("term {} is not a bit-vector constant", t.0)));
        };
        let b = tm.sorts.bool_sort;
        let bits: Bits = (0..w).map(|i| tm.mk_var(&format!("{name}!{i}"), b)).collect();
        self.stats.consts_blasted += 1;
        self.stats.bits_generated += u64::from(w);
        self.const_index.insert(t, self.consts.len());
        self.consts.push((t, bits.clone()));
        Ok(bits)
    }

    /// Fresh bits standing for an uninterpreted application.
    fn app_bits(&mut self, tm: &mut TermManager, t: TermId) -> Result<Bits> {
        if let Some((_, bits)) = self.apps.iter().find(|(a, _)| *a == t) {
            return Ok(bits.clone());
        }
        let w = bv_width(tm, t)
            .ok_or_else(|| TactixError::Internal(format!("term {} is not a bit-vector", t.0)))?;
        let b = tm.sorts.bool_sort;
        let bits: Bits = (0..w).map(|_| tm.mk_fresh("bv", b)).collect();
        self.stats.bits_generated += u64::from(w);
        self.keep(tm, t);
        self.apps.push((t, bits.clone()));
        Ok(bits)
    }

    /// Blast the bit-vector term `t`, which must be [`Self::supported`].
    fn bits(&mut self, tm: &mut TermManager, t: TermId) -> Result<Bits> {
        if let Some(bits) = self.scope().term_cache.get(&t) {
            return Ok(bits.clone());
        }
        self.step(tm)?;
        let kind = tm
            .kind(t)
            .cloned()
            .ok_or_else(|| TactixError::Internal(format!("unknown term id {}", t.0)))?;
        let out = match kind {
            TermKind::BitVecConst { value, width } => (0..width)
                .map(|i| if value.bit(u64::from(i)) { tm.mk_true() } else { tm.mk_false() })
                .collect(),
            TermKind::Var(_) => self.var_bits(tm, t)?,
            TermKind::BvNot(a) => {
                let a = self.bits(tm, a)?;
                a.into_iter().map(|x| not(tm, x)).collect()
            }
            TermKind::BvAnd(a, b) => self.bitwise(tm, a, b, and2)?,
            TermKind::BvOr(a, b) => self.bitwise(tm, a, b, or2)?,
            TermKind::BvXor(a, b) => self.bitwise(tm, a, b, xor2)?,
            TermKind::BvNeg(a) => {
                let a = self.bits(tm, a)?;
                let zero = vec![tm.mk_false(); a.len()];
                sub(tm, &zero, &a)
            }
            TermKind::BvAdd(a, b) => {
                let (a, b) = (self.bits(tm, a)?, self.bits(tm, b)?);
                let f = tm.mk_false();
                add(tm, &a, &b, f)
            }
            TermKind::BvSub(a, b) => {
                let (a, b) = (self.bits(tm, a)?, self.bits(tm, b)?);
                sub(tm, &a, &b)
            }
            TermKind::BvMul(a, b) => {
                let (a, b) = (self.bits(tm, a)?, self.bits(tm, b)?);
                mul(tm, &a, &b)
            }
            TermKind::BvConcat(high, low) => {
                let mut out = self.bits(tm, low)?;
                out.extend(self.bits(tm, high)?);
                out
            }
            TermKind::BvExtract { high, low, arg } => {
                let a = self.bits(tm, arg)?;
                a.get(low as usize..=high as usize)
                    .ok_or_else(|| TactixError::Internal("extract out of range".to_string()))?
                    .to_vec()
            }
            TermKind::Ite(c, a, b) => {
                let c = self.formula(tm, c)?;
                let (a, b) = (self.bits(tm, a)?, self.bits(tm, b)?);
                a.into_iter()
                    .zip(b)
                    .map(|(x, y)| mux(tm, c, x, y))
                    .collect()
            }
            TermKind::Apply { .. } => self.app_bits(tm, t)?,
            _ => {
                return Err(TactixError::Internal(format!(
                    "cannot blast {}",
                    tm.display(t)
                )));
            }
        };
        self.scope().term_cache.insert(t, out.clone());
        Ok(out)
    }

    fn bitwise(
        &mut self,
        tm: &mut TermManager,
        a: TermId,
        b: TermId,
        op: fn(&mut TermManager, TermId, TermId) -> TermId,
    ) -> Result<Bits> {
        let (a, b) = (self.bits(tm, a)?, self.bits(tm, b)?);
        Ok(a.into_iter().zip(b).map(|(x, y)| op(tm, x, y)).collect())
    }

    /// Record that `f` stays in the goal as it is.
    fn keep(&mut self, tm: &TermManager, f: TermId) {
        for c in free_constants(tm, f) {
            if bv_width(tm, c).is_none() {
                continue;
            }
            let mut in_scope = false;
            for scope in self.scopes.iter_mut().skip(1) {
                if scope.bound.contains_key(&c) {
                    scope.escaped = true;
                    in_scope = true;
                }
            }
            if !in_scope {
                self.kept.insert(c);
            }
        }
    }

    /// Blast a bit-vector predicate over `args`, or keep it.
    fn atom(
        &mut self,
        tm: &mut TermManager,
        f: TermId,
        args: &[TermId],
        circuit: impl FnOnce(&mut TermManager, &[Bits]) -> TermId,
    ) -> Result<TermId> {
        if !args.iter().all(|&a| self.supported(tm, a)) {
            self.stats.atoms_kept += 1;
            self.keep(tm, f);
            return Ok(f);
        }
        let bits = args
            .iter()
            .map(|&a| self.bits(tm, a))
            .collect::<Result<Vec<_>>>()?;
        self.stats.atoms_blasted += 1;
        Ok(circuit(tm, &bits))
    }

    /// Blast the bit-vector atoms of the formula `f`.
    fn formula(&mut self, tm: &mut TermManager, f: TermId) -> Result<TermId> {
        if let Some(&r) = self.scope().formula_cache.get(&f) {
            return Ok(r);
        }
        self.step(tm)?;
        let kind = tm
            .kind(f)
            .cloned()
            .ok_or_else(|| TactixError::Internal(format!("unknown term id {}", f.0)))?;
        let is_bv_arg = |tm: &TermManager, a: TermId| bv_width(tm, a).is_some();
        let r = match kind {
            TermKind::Not(_)
            | TermKind::And(_)
            | TermKind::Or(_)
            | TermKind::Implies(..)
            | TermKind::Xor(..) => self.connective(tm, f, &kind)?,
            TermKind::Ite(..) if tm.is_bool(f) => self.connective(tm, f, &kind)?,
            TermKind::Eq(a, _) if tm.is_bool(a) => self.connective(tm, f, &kind)?,
            TermKind::Eq(a, b) if is_bv_arg(tm, a) => self.atom(tm, f, &[a, b], |tm, bits| {
                let eqs: Vec<_> = bits[0]
                    .iter()
                    .zip(&bits[1])
                    .map(|(&x, &y)| iff(tm, x, y))
                    .collect();
                and_all(tm, eqs)
            })?,
            TermKind::Distinct(args) if args.first().is_some_and(|&a| is_bv_arg(tm, a)) => {
                self.atom(tm, f, &args, |tm, bits| {
                    let mut diffs = Vec::new();
                    for (i, x) in bits.iter().enumerate() {
                        for y in &bits[i + 1..] {
                            let eqs: Vec<_> =
                                x.iter().zip(y).map(|(&p, &q)| iff(tm, p, q)).collect();
                            let eq = and_all(tm, eqs);
                            diffs.push(not(tm, eq));
                        }
                    }
                    and_all(tm, diffs)
                })?
            }
            TermKind::BvUlt(a, b) => self.atom(tm, f, &[a, b], |tm, bits| ult(tm, &bits[0], &bits[1]))?,
            TermKind::BvUle(a, b) => self.atom(tm, f, &[a, b], |tm, bits| {
                let gt = ult(tm, &bits[1], &bits[0]);
                not(tm, gt)
            })?,
            TermKind::BvSlt(a, b) => self.atom(tm, f, &[a, b], |tm, bits| slt(tm, &bits[0], &bits[1]))?,
            TermKind::BvSle(a, b) => self.atom(tm, f, &[a, b], |tm, bits| {
                let gt = slt(tm, &bits[1], &bits[0]);
                not(tm, gt)
            })?,
            TermKind::Forall { ref vars, body } | TermKind::Exists { ref vars, body } => {
                let forall = matches!(kind, TermKind::Forall { .. });
                let vars: Vec<_> = vars.iter().copied().collect();
                self.quantifier(tm, f, &vars, body, forall)?
            }
            _ => {
                self.keep(tm, f);
                f
            }
        };
        self.scope().formula_cache.insert(f, r);
        Ok(r)
    }

    fn connective(&mut self, tm: &mut TermManager, f: TermId, kind: &TermKind) -> Result<TermId> {
        let children = kind.children();
        let mut new = Vec::with_capacity(children.len());
        for &c in &children {
            new.push(self.formula(tm, c)?);
        }
        Ok(if new.as_slice() == children.as_slice() {
            f
        } else {
            tm.rebuild(f, &new)
        })
    }

    fn quantifier(
        &mut self,
        tm: &mut TermManager,
        f: TermId,
        vars: &[(lasso::Spur, SortId)],
        body: TermId,
        forall: bool,
    ) -> Result<TermId> {
        let has_bv = vars
            .iter()
            .any(|(_, s)| tm.sorts.bitvec_width(*s).is_some());
        if !self.config.blast_quant || !has_bv {
            self.stats.atoms_kept += 1;
            self.keep(tm, f);
            return Ok(f);
        }
        let b = tm.sorts.bool_sort;
        let mut scope = Scope::default();
        let mut new_vars: Vec<(String, SortId)> = Vec::new();
        for &(sym, sort) in vars {
            let name = tm.resolve(sym).to_string();
            match tm.sorts.bitvec_width(sort) {
                Some(w) => {
                    let v = tm.mk_var(&name, sort);
                    let bits = (0..w)
                        .map(|i| {
                            let n = format!("{name}!{i}");
                            let bit = tm.mk_var(&n, b);
                            new_vars.push((n, b));
                            bit
                        })
                        .collect();
                    scope.bound.insert(v, bits);
                }
                None => new_vars.push((name, sort)),
            }
        }
        self.scope();
        self.scopes.push(scope);
        let r = self.formula(tm, body);
        let escaped = self.scopes.pop().is_some_and(|s| s.escaped);
        let body = r?;
        if escaped {
            debug!(quantifier = %tm.display(f), "bound bit-vector escapes a kept atom");
            self.keep(tm, f);
            return Ok(f);
        }
        let refs: Vec<(&str, SortId)> = new_vars.iter().map(|(n, s)| (n.as_str(), *s)).collect();
        Ok(if forall {
            tm.mk_forall(&refs, body)
        } else {
            tm.mk_exists(&refs, body)
        })
    }

    /// `t = concat(ite(bits[w-1], #b1, #b0), .., ite(bits[0], #b1, #b0))`.
    fn link(tm: &mut TermManager, t: TermId, bits: &[TermId]) -> Option<TermId> {
        let one = tm.mk_bv(1, 1);
        let zero = tm.mk_bv(0, 1);
        let mut acc: Option<TermId> = None;
        for &bit in bits {
            let v = mux(tm, bit, one, zero);
            acc = Some(match acc {
                None => v,
                Some(low) => tm.mk_app(TermKind::BvConcat(v, low)),
            });
        }
        acc.map(|v| tm.mk_eq(t, v))
    }
}

fn bv_width(tm: &TermManager, t: TermId) -> Option<u32> {
    tm.sort_of(t).and_then(|s| tm.sorts.bitvec_width(s))
}

fn not(tm: &mut TermManager, a: TermId) -> TermId {
    if tm.is_true(a) {
        return tm.mk_false();
    }
    if tm.is_false(a) {
        return tm.mk_true();
    }
    if let Some(TermKind::Not(x)) = tm.kind(a) {
        return *x;
    }
    tm.mk_not(a)
}

fn and2(tm: &mut TermManager, a: TermId, b: TermId) -> TermId {
    if tm.is_false(a) || tm.is_false(b) {
        return tm.mk_false();
    }
    if tm.is_true(a) || a == b {
        return b;
    }
    if tm.is_true(b) {
        return a;
    }
    tm.mk_and([a, b])
}

fn or2(tm: &mut TermManager, a: TermId, b: TermId) -> TermId {
    if tm.is_true(a) || tm.is_true(b) {
        return tm.mk_true();
    }
    if tm.is_false(a) || a == b {
        return b;
    }
    if tm.is_false(b) {
        return a;
    }
    tm.mk_or([a, b])
}

fn xor2(tm: &mut TermManager, a: TermId, b: TermId) -> TermId {
    if a == b {
        return tm.mk_false();
    }
    if tm.is_false(a) {
        return b;
    }
    if tm.is_false(b) {
        return a;
    }
    if tm.is_true(a) {
        return not(tm, b);
    }
    if tm.is_true(b) {
        return not(tm, a);
    }
    tm.mk_xor(a, b)
}

fn iff(tm: &mut TermManager, a: TermId, b: TermId) -> TermId {
    let x = xor2(tm, a, b);
    not(tm, x)
}

fn mux(tm: &mut TermManager, c: TermId, t: TermId, e: TermId) -> TermId {
    if tm.is_true(c) || t == e {
        return t;
    }
    if tm.is_false(c) {
        return e;
    }
    tm.mk_ite(c, t, e)
}

fn and_all(tm: &mut TermManager, xs: Vec<TermId>) -> TermId {
    if xs.iter().any(|&x| tm.is_false(x)) {
        return tm.mk_false();
    }
    let xs: Vec<_> = xs.into_iter().filter(|&x| !tm.is_true(x)).collect();
    tm.mk_and(xs)
}

/// Ripple-carry adder.
fn add(tm: &mut TermManager, a: &[TermId], b: &[TermId], mut carry: TermId) -> Bits {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let t = xor2(tm, x, y);
            let s = xor2(tm, t, carry);
            let c1 = and2(tm, x, y);
            let c2 = and2(tm, t, carry);
            carry = or2(tm, c1, c2);
            s
        })
        .collect()
}

fn sub(tm: &mut TermManager, a: &[TermId], b: &[TermId]) -> Bits {
    let nb: Bits = b.iter().map(|&y| not(tm, y)).collect();
    let t = tm.mk_true();
    add(tm, a, &nb, t)
}

/// Shift-and-add multiplier, truncated to the operand width.
fn mul(tm: &mut TermManager, a: &[TermId], b: &[TermId]) -> Bits {
    debug_assert_eq!(a.len(), b.len());
    let w = a.len();
    let f = tm.mk_false();
    let mut acc = vec![f; w];
    for (i, &bi) in b.iter().enumerate() {
        if tm.is_false(bi) {
            continue;
        }
        let shifted: Bits = (0..w)
            .map(|j| if j < i { f } else { and2(tm, bi, a[j - i]) })
            .collect();
        acc = add(tm, &acc, &shifted, f);
    }
    acc
}

/// Unsigned `a < b`, scanning from the least significant bit.
fn ult(tm: &mut TermManager, a: &[TermId], b: &[TermId]) -> TermId {
    debug_assert_eq!(a.len(), b.len());
    let mut lt = tm.mk_false();
    for (&x, &y) in a.iter().zip(b) {
        let nx = not(tm, x);
        let here = and2(tm, nx, y);
        let same = iff(tm, x, y);
        let below = and2(tm, same, lt);
        lt = or2(tm, here, below);
    }
    lt
}

/// Signed `a < b`: unsigned comparison with the sign bits flipped.
fn slt(tm: &mut TermManager, a: &[TermId], b: &[TermId]) -> TermId {
    let flip = |tm: &mut TermManager, v: &[TermId]| -> Bits {
        let mut v = v.to_vec();
        if let Some(msb) = v.last_mut() {
            *msb = not(tm, *msb);
        }
        v
    };
    let (a, b) = (flip(tm, a), flip(tm, b));
    ult(tm, &a, &b)
}

impl Tactic for BitBlastTactic {
    fn name(&self) -> &str {
        "bit-blast"
    }

    fn description(&self) -> &str {
        "reduce bit-vector constraints to propositional logic"
    }

    fn apply(&mut self, mut goal: Goal, ctx: &mut TacticContext<'_>) -> Result<ApplyResult> {
        if goal.proofs_enabled() && self.config.blast_quant {
            return Err(TactixError::unsupported(
                "quantified variable blasting does not support proof generation",
            ));
        }
        let report = TacticReport::new(self.name(), &goal, ctx.tm);
        // a run aborted without cleanup leaves circuits keyed by stale ids
        self.reset_run();
        self.guard = ctx.guard();

        let size = goal.size();
        for i in 0..size {
            if goal.is_inconsistent() {
                break;
            }
            ctx.check()?;
            let f = goal.form(i);
            let r = self.formula(ctx.tm, f)?;
            if r != f {
                let pr = goal.pr(i).cloned().map(|p| Proof::bit_blast(p, r));
                let dep = goal.dep(i).cloned();
                goal.update(ctx.tm, i, r, pr, dep);
            }
        }

        goal.elim_redundancies(ctx.tm);
        if !goal.is_inconsistent() {
            let linked: Vec<(TermId, Bits)> = self
                .consts
                .iter()
                .filter(|(c, _)| self.kept.contains(c))
                .chain(&self.apps)
                .cloned()
                .collect();
            for (t, bits) in linked {
                if let Some(link) = Self::link(ctx.tm, t, &bits) {
                    let pr = goal
                        .proofs_enabled()
                        .then(|| Proof::new(ProofRule::BitBlast, Vec::new(), link));
                    goal.assert_formula(ctx.tm, link, pr, None);
                }
            }
        }

        let mc = if goal.models_enabled() {
            let blasted = (!self.consts.is_empty())
                .then(|| ModelConverter::BitBlast(std::mem::take(&mut self.consts)));
            let hidden: Vec<TermId> = self.apps.iter().flat_map(|(_, b)| b.iter().copied()).collect();
            let filter = (!hidden.is_empty()).then(|| ModelConverter::Filter(hidden));
            ModelConverter::concat(blasted, filter)
        } else {
            None
        };
        goal.inc_depth();
        self.stats.steps = self.steps;
        self.reset_run();

        let result = ApplyResult::new(vec![goal], mc, None);
        report.finish(&result, ctx.tm);
        Ok(result)
    }

    fn cleanup(&mut self) {
        self.reset_run();
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        BitBlastConfig::collect_param_descrs(descrs);
    }

    fn update_params(&mut self, params: &Params) -> Result<()> {
        self.config.update(params)
    }

    fn params(&self) -> Params {
        self.config.to_params()
    }

    fn box_clone(&self) -> Box<dyn Tactic> {
        Box::new(self.clone())
    }
}

/// The `bit-blast` tactic with default settings.
pub fn mk_bit_blast_tactic() -> Box<dyn Tactic> {
    Box::new(BitBlastTactic::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use crate::resource::CancellationToken;

    fn bv_var(tm: &mut TermManager, name: &str, w: u32) -> TermId {
        let s = tm.sorts.bitvec(w);
        tm.mk_var(name, s)
    }

    fn goal_of(tm: &mut TermManager, forms: &[TermId]) -> Goal {
        let mut g = Goal::new(true, false, false).unwrap();
        for &f in forms {
            g.assert_expr(tm, f);
        }
        g
    }

    /// Model assigning the bits of `name` from `value`.
    fn assign_bits(tm: &mut TermManager, m: &mut Model, name: &str, value: u64, w: u32) {
        let b = tm.sorts.bool_sort;
        for i in 0..w {
            let bit = tm.mk_var(&format!("{name}!{i}"), b);
            let v = if value >> i & 1 == 1 { tm.mk_true() } else { tm.mk_false() };
            m.register(bit, v);
        }
    }

    fn holds(tm: &mut TermManager, m: &Model, g: &Goal) -> bool {
        let f = g.to_formula(tm);
        let v = m.eval(tm, f, true).unwrap();
        tm.is_true(v)
    }

    fn blast(tm: &mut TermManager, t: &mut BitBlastTactic, g: Goal) -> ApplyResult {
        let mut ctx = TacticContext::new(tm);
        t.apply(g, &mut ctx).unwrap()
    }

    #[test]
    fn test_adder_circuit() {
        let mut tm = TermManager::new();
        let x = bv_var(&mut tm, "x", 8);
        let y = bv_var(&mut tm, "y", 8);
        let sum = tm.mk_app(TermKind::BvAdd(x, y));
        let three = tm.mk_bv(3, 8);
        let f = tm.mk_eq(sum, three);
        let g = goal_of(&mut tm, &[f]);

        let r = blast(&mut tm, &mut BitBlastTactic::default(), g);
        let sub = &r.subgoals[0];
        assert!(
            sub.formulas()
                .iter()
                .all(|&f| free_constants(&tm, f).iter().all(|&c| bv_width(&tm, c).is_none()))
        );

        let mut m = Model::new();
        assign_bits(&mut tm, &mut m, "x", 1, 8);
        assign_bits(&mut tm, &mut m, "y", 2, 8);
        assert!(holds(&mut tm, &m, sub));
        r.mc.unwrap().apply(&mut tm, &mut m, 0).unwrap();
        assert_eq!(m.get(x), Some(tm.mk_bv(1, 8)));
        assert_eq!(m.get(y), Some(tm.mk_bv(2, 8)));
        assert_eq!(m.len(), 2);

        let mut wrong = Model::new();
        assign_bits(&mut tm, &mut wrong, "x", 2, 8);
        assign_bits(&mut tm, &mut wrong, "y", 2, 8);
        assert!(!holds(&mut tm, &wrong, sub));
    }

    #[test]
    fn test_wraparound_mul_and_signed() {
        let mut tm = TermManager::new();
        let x = bv_var(&mut tm, "x", 4);
        let three = tm.mk_bv(3, 4);
        let prod = tm.mk_app(TermKind::BvMul(x, three));
        let one = tm.mk_bv(1, 4);
        // 11 * 3 = 33 = 1 (mod 16)
        let f1 = tm.mk_eq(prod, one);
        let zero = tm.mk_bv(0, 4);
        let f2 = tm.mk_app(TermKind::BvSlt(x, zero));
        let g = goal_of(&mut tm, &[f1, f2]);
        let r = blast(&mut tm, &mut BitBlastTactic::default(), g);

        let mut m = Model::new();
        assign_bits(&mut tm, &mut m, "x", 11, 4);
        assert!(holds(&mut tm, &m, &r.subgoals[0]));
        let mut m = Model::new();
        assign_bits(&mut tm, &mut m, "x", 3, 4);
        assert!(!holds(&mut tm, &m, &r.subgoals[0]));
    }

    #[test]
    fn test_concat_extract_ule() {
        let mut tm = TermManager::new();
        let a = bv_var(&mut tm, "a", 2);
        let b = bv_var(&mut tm, "b", 2);
        let cat = tm.mk_app(TermKind::BvConcat(a, b));
        let hi = tm.mk_extract(3, 2, cat);
        let f1 = tm.mk_eq(hi, a);
        let swapped = tm.mk_app(TermKind::BvConcat(b, a));
        let f2 = tm.mk_app(TermKind::BvUle(cat, swapped));
        let g = goal_of(&mut tm, &[f1]);
        let r = blast(&mut tm, &mut BitBlastTactic::default(), g);
        assert!(r.subgoals[0].is_decided_sat());

        // 4a + b <= 4b + a iff a <= b
        let g = goal_of(&mut tm, &[f2]);
        let r = blast(&mut tm, &mut BitBlastTactic::default(), g);
        let mut m = Model::new();
        assign_bits(&mut tm, &mut m, "a", 1, 2);
        assign_bits(&mut tm, &mut m, "b", 0, 2);
        assert!(!holds(&mut tm, &m, &r.subgoals[0]));
        let mut m = Model::new();
        assign_bits(&mut tm, &mut m, "b", 3, 2);
        assert!(holds(&mut tm, &m, &r.subgoals[0]));
    }

    #[test]
    fn test_kept_adder_is_linked() {
        let mut tm = TermManager::new();
        let x = bv_var(&mut tm, "x", 4);
        let y = bv_var(&mut tm, "y", 4);
        let sum = tm.mk_app(TermKind::BvAdd(x, y));
        let three = tm.mk_bv(3, 4);
        let kept = tm.mk_eq(sum, three);
        let five = tm.mk_bv(5, 4);
        let lt = tm.mk_app(TermKind::BvUlt(x, five));
        let g = goal_of(&mut tm, &[kept, lt]);

        let mut t = BitBlastTactic::new(BitBlastConfig {
            blast_add: false,
            ..BitBlastConfig::default()
        });
        let r = blast(&mut tm, &mut t, g);
        let sub = &r.subgoals[0];
        assert_eq!(sub.form(0), kept);
        assert_eq!(t.stats().atoms_kept, 1);
        let link = sub.form(sub.size() - 1);
        assert!(matches!(tm.kind(link), Some(TermKind::Eq(lhs, _)) if *lhs == x));
        let Some(ModelConverter::BitBlast(consts)) = r.mc else {
            panic!("expected a bit-blast converter");
        };
        assert_eq!(consts.len(), 1);
        assert_eq!(consts[0].0, x);
    }

    #[test]
    fn test_quantifier_blasting() {
        let mut tm = TermManager::new();
        let bv2 = tm.sorts.bitvec(2);
        let x = tm.mk_var("x", bv2);
        let body = tm.mk_app(TermKind::BvUle(x, x));
        let q = tm.mk_forall(&[("x", bv2)], body);

        let g = goal_of(&mut tm, &[q]);
        let r = blast(&mut tm, &mut BitBlastTactic::default(), g.clone());
        assert_eq!(r.subgoals[0].form(0), q);
        assert!(r.mc.is_none());

        let mut t = BitBlastTactic::new(BitBlastConfig {
            blast_quant: true,
            ..BitBlastConfig::default()
        });
        let r = blast(&mut tm, &mut t, g);
        let out = r.subgoals[0].form(0);
        let Some(TermKind::Forall { vars, .. }) = tm.kind(out) else {
            panic!("expected a quantifier");
        };
        assert_eq!(vars.len(), 2);
        assert!(vars.iter().all(|(_, s)| *s == tm.sorts.bool_sort));

        let mut proofs = Goal::new(true, true, false).unwrap();
        proofs.assert_expr(&mut tm, q);
        let mut ctx = TacticContext::new(&mut tm);
        assert_eq!(
            t.apply(proofs, &mut ctx).unwrap_err(),
            TactixError::unsupported("quantified variable blasting does not support proof generation")
        );
    }

    #[test]
    fn test_proofs_and_step_limit() {
        let mut tm = TermManager::new();
        let x = bv_var(&mut tm, "x", 4);
        let y = bv_var(&mut tm, "y", 4);
        let f = tm.mk_app(TermKind::BvUlt(x, y));
        let mut g = Goal::new(true, true, false).unwrap();
        g.assert_expr(&mut tm, f);

        let r = blast(&mut tm, &mut BitBlastTactic::default(), g.clone());
        let pr = r.subgoals[0].pr(0).unwrap();
        assert_eq!(pr.rule(), ProofRule::BitBlast);

        let mut t = BitBlastTactic::default();
        t.update_params(Params::new().set_uint("max-steps", 2)).unwrap();
        let mut ctx = TacticContext::new(&mut tm);
        assert_eq!(
            t.apply(g, &mut ctx).unwrap_err(),
            TactixError::StepsExceeded { limit: 2 }
        );
    }

    #[test]
    fn test_cleanup_after_cancel() {
        let mut tm = TermManager::new();
        let x = bv_var(&mut tm, "x", 8);
        let y = bv_var(&mut tm, "y", 8);
        let sum = tm.mk_app(TermKind::BvAdd(x, y));
        let three = tm.mk_bv(3, 8);
        let f = tm.mk_eq(sum, three);
        let g = goal_of(&mut tm, &[f]);

        let cold = blast(&mut tm, &mut BitBlastTactic::default(), g.clone());

        let mut t = BitBlastTactic::default();
        let token = CancellationToken::new();
        token.cancel();
        let mut ctx = TacticContext::with_token(&mut tm, token.clone());
        assert_eq!(t.apply(g.clone(), &mut ctx).unwrap_err(), TactixError::Canceled);
        token.reset();
        t.cleanup();
        let warm = t.apply(g, &mut ctx).unwrap();
        assert_eq!(warm.subgoals, cold.subgoals);
        assert_eq!(warm.mc, cold.mc);
    }

    #[test]
    fn test_rerun_after_step_limit_matches_cold_run() {
        let mut tm = TermManager::new();
        let x = bv_var(&mut tm, "x", 8);
        let y = bv_var(&mut tm, "y", 8);
        let lt = tm.mk_app(TermKind::BvUlt(x, y));
        let sum = tm.mk_app(TermKind::BvAdd(x, y));
        let three = tm.mk_bv(3, 8);
        let eq = tm.mk_eq(sum, three);
        let g = goal_of(&mut tm, &[lt, eq]);

        let cold = blast(&mut tm, &mut BitBlastTactic::default(), g.clone());

        let mut t = BitBlastTactic::default();
        t.update_params(Params::new().set_uint("max-steps", 4)).unwrap();
        let mut ctx = TacticContext::new(&mut tm);
        assert_eq!(
            t.apply(g.clone(), &mut ctx).unwrap_err(),
            TactixError::StepsExceeded { limit: 4 }
        );
        assert!(t.stats().consts_blasted > 0);
        t.cleanup();
        t.update_params(Params::new().set_uint("max-steps", u64::MAX)).unwrap();
        let warm = t.apply(g, &mut ctx).unwrap();
        assert_eq!(warm.subgoals, cold.subgoals);
        assert_eq!(warm.mc, cold.mc);
    }

    #[test]
    fn test_reuse_on_another_term_manager() {
        let mut tm1 = TermManager::new();
        let a = bv_var(&mut tm1, "a", 4);
        let b = bv_var(&mut tm1, "b", 4);
        let f = tm1.mk_app(TermKind::BvUlt(a, b));
        let g1 = goal_of(&mut tm1, &[f]);
        let mut t = BitBlastTactic::default();
        blast(&mut tm1, &mut t, g1);

        let mut tm2 = TermManager::new();
        let p = tm2.mk_var("p", tm2.sorts.bool_sort);
        let x = bv_var(&mut tm2, "x", 4);
        let y = bv_var(&mut tm2, "y", 4);
        let f = tm2.mk_app(TermKind::BvUle(x, y));
        let g2 = goal_of(&mut tm2, &[p, f]);
        let reused = blast(&mut tm2, &mut t, g2.clone());
        let fresh = blast(&mut tm2, &mut BitBlastTactic::default(), g2);
        assert_eq!(reused.subgoals, fresh.subgoals);
        assert_eq!(reused.mc, fresh.mc);
    }
}
