//! Polynomial normal form for sums and products.
//!
//! A *monomial* is a rational coefficient times a *power product*, the list
//! of non-numeral factors of a normalized product. Sums keep one monomial
//! per power product, numerals folded into a leading constant; products keep
//! one leading numeral coefficient and the remaining factors ordered by term
//! id. Normalizing a sum or product that is already in normal form fails,
//! so the driver reaches a fixpoint.
//!
//! ## References
//!
//! - Z3's `rewriter/poly_rewriter_def.h`

use super::BrResult;
use super::arith::ArithRewriter;
use crate::ast::{Args, TermId, TermKind, TermManager};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use rustc_hash::FxHashMap;
use smallvec::smallvec;
use tactix_math::algebraic::Numeral;

/// Split `t` into its rational coefficient and power product.
pub fn monomial(tm: &TermManager, t: TermId) -> (BigRational, Args) {
    if let Some(TermKind::Mul(args)) = tm.kind(t) {
        if let Some((first, rest)) = args.split_first()
            && let Some(c) = tm.numeral(*first)
        {
            return (c, rest.iter().copied().collect());
        }
        return (BigRational::one(), args.clone());
    }
    (BigRational::one(), smallvec![t])
}

/// Arguments of `t` if it is a sum, else `t` alone; nested sums are
/// flattened.
pub fn flatten_add(tm: &TermManager, t: TermId) -> Vec<TermId> {
    let mut out = Vec::new();
    let mut stack = vec![t];
    while let Some(u) = stack.pop() {
        match tm.kind(u) {
            Some(TermKind::Add(xs)) => stack.extend(xs.iter().rev()),
            _ => out.push(u),
        }
    }
    out
}

fn flatten_mul(tm: &TermManager, args: &[TermId]) -> Vec<TermId> {
    let mut out = Vec::with_capacity(args.len());
    let mut stack: Vec<TermId> = args.iter().rev().copied().collect();
    while let Some(u) = stack.pop() {
        match tm.kind(u) {
            Some(TermKind::Mul(xs)) => stack.extend(xs.iter().rev()),
            _ => out.push(u),
        }
    }
    out
}

/// Monomials indexed by power product, in first-occurrence order.
#[derive(Debug, Clone, Default)]
pub struct Monomials {
    entries: Vec<(BigRational, Args)>,
    index: FxHashMap<Args, usize>,
}

impl Monomials {
    /// Add `c * pp`, merging with an existing monomial over `pp`.
    pub fn add(&mut self, c: BigRational, pp: Args) {
        if let Some(&i) = self.index.get(&pp) {
            self.entries[i].0 += c;
        } else {
            self.index.insert(pp.clone(), self.entries.len());
            self.entries.push((c, pp));
        }
    }

    /// Coefficient of `pp`, if present.
    pub fn coeff(&self, pp: &Args) -> Option<&BigRational> {
        self.index.get(pp).map(|&i| &self.entries[i].0)
    }

    /// Remove the monomial over `pp`, returning its coefficient.
    pub fn take(&mut self, pp: &Args) -> Option<BigRational> {
        let i = self.index.remove(pp)?;
        Some(std::mem::replace(&mut self.entries[i].0, BigRational::zero()))
    }

    /// Drop zero monomials.
    pub fn retain_nonzero(&mut self) {
        self.entries.retain(|(c, _)| !c.is_zero());
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (_, pp))| (pp.clone(), i))
            .collect();
    }

    /// Order monomials by power product.
    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.1.cmp(&b.1));
        self.retain_nonzero();
    }

    /// Monomials in order.
    pub fn iter(&self) -> impl Iterator<Item = &(BigRational, Args)> {
        self.entries.iter()
    }

    /// Number of monomials.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no monomials.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume into the ordered list.
    pub fn into_vec(self) -> Vec<(BigRational, Args)> {
        self.entries
    }
}

/// A sum split into a rational constant and monomials.
#[derive(Debug, Clone)]
pub struct LinearForm {
    /// Sum of the rational numerals
    pub constant: BigRational,
    /// Remaining monomials
    pub monomials: Monomials,
}

impl LinearForm {
    /// Decompose `t`; irrational numerals stay as power products.
    pub fn of(tm: &TermManager, t: TermId) -> Self {
        let mut lf = LinearForm {
            constant: BigRational::zero(),
            monomials: Monomials::default(),
        };
        for u in flatten_add(tm, t) {
            if let Some(r) = tm.numeral(u) {
                lf.constant += r;
            } else {
                let (c, pp) = monomial(tm, u);
                lf.monomials.add(c, pp);
            }
        }
        lf.monomials.retain_nonzero();
        lf
    }
}

impl ArithRewriter {
    /// Numeral term of the given sort family.
    pub(crate) fn mk_num(tm: &mut TermManager, n: Numeral, is_int: bool) -> TermId {
        match n {
            Numeral::Rational(r) => tm.mk_numeral(r, is_int),
            irrational => tm.mk_real_numeral(irrational),
        }
    }

    /// `c * pp` as a normalized term.
    pub(crate) fn mk_monomial(
        &mut self,
        tm: &mut TermManager,
        c: &BigRational,
        pp: &[TermId],
        is_int: bool,
    ) -> TermId {
        if pp.is_empty() {
            return tm.mk_numeral(c.clone(), is_int);
        }
        if c.is_one() {
            return tm.mk_mul(pp.iter().copied());
        }
        if self.config.algebraic_number_evaluator
            && let Some(a) = tm.algebraic(pp[0]).cloned()
            && let Ok(folded) = self.am.mul(&Numeral::from(c.clone()), &Numeral::Irrational(a))
        {
            let lead = Self::mk_num(tm, folded, false);
            return tm.mk_mul(std::iter::once(lead).chain(pp[1..].iter().copied()));
        }
        let lead = tm.mk_numeral(c.clone(), is_int);
        tm.mk_mul(std::iter::once(lead).chain(pp.iter().copied()))
    }

    /// Sum of monomials with an optional leading constant. Empty means 0.
    pub(crate) fn mk_sum_of(
        &mut self,
        tm: &mut TermManager,
        constant: Option<TermId>,
        monomials: &[(BigRational, Args)],
        is_int: bool,
    ) -> TermId {
        let mut args: Vec<TermId> = constant.into_iter().collect();
        for (c, pp) in monomials {
            args.push(self.mk_monomial(tm, c, pp, is_int));
        }
        if args.is_empty() {
            return tm.mk_numeral(BigRational::zero(), is_int);
        }
        tm.mk_add(args)
    }

    /// Flatten, fold numerals, merge monomials.
    pub(crate) fn mk_add_core(&mut self, tm: &mut TermManager, t: TermId, args: &[TermId]) -> BrResult {
        let is_int = tm.is_int(t);
        let mut constant: Option<Numeral> = None;
        let mut monos = Monomials::default();
        for &a in args {
            for u in flatten_add(tm, a) {
                if let Some(v) = self.numeral_value(tm, u) {
                    constant = match constant {
                        None => Some(v),
                        Some(acc) => match self.am.add(&acc, &v) {
                            Ok(s) => Some(s),
                            Err(e) => {
                                self.note_algebraic_failure(&e);
                                return BrResult::FAILED;
                            }
                        },
                    };
                } else {
                    let (c, pp) = monomial(tm, u);
                    monos.add(c, pp);
                }
            }
        }
        monos.retain_nonzero();
        if self.config.sort_sums {
            monos.sort();
        }
        let constant = constant
            .filter(|c| !c.is_zero())
            .map(|c| Self::mk_num(tm, c, is_int));
        let mut out: Vec<TermId> = constant.into_iter().collect();
        for (c, pp) in monos.iter() {
            out.push(self.mk_monomial(tm, c, pp, is_int));
        }
        if out.as_slice() == args {
            return BrResult::FAILED;
        }
        match out.len() {
            0 => BrResult::done(tm.mk_numeral(BigRational::zero(), is_int)),
            _ => BrResult::done(tm.mk_add(out)),
        }
    }

    /// Flatten, fold the numeral coefficient, order the factors.
    pub(crate) fn mk_mul_core(&mut self, tm: &mut TermManager, t: TermId, args: &[TermId]) -> BrResult {
        let is_int = tm.is_int(t);
        let mut coeff = Numeral::from(BigRational::one());
        let mut factors: Vec<TermId> = Vec::with_capacity(args.len());
        for u in flatten_mul(tm, args) {
            match self.numeral_value(tm, u) {
                Some(v) if v.is_zero() => {
                    return BrResult::done(tm.mk_numeral(BigRational::zero(), is_int));
                }
                Some(v) => match self.am.mul(&coeff, &v) {
                    Ok(p) => coeff = p,
                    Err(e) => {
                        self.note_algebraic_failure(&e);
                        return BrResult::FAILED;
                    }
                },
                None => factors.push(u),
            }
        }
        factors.sort_unstable();
        if self.config.mul_to_power {
            factors = self.group_powers(tm, &factors);
        }
        let is_one = coeff.as_rational().is_some_and(|c| c.is_one());

        if self.config.som && factors.iter().any(|&f| matches!(tm.kind(f), Some(TermKind::Add(_)))) {
            return BrResult::rewrite2(self.distribute(tm, coeff, &factors, is_int));
        }
        if !is_one
            && factors.len() == 1
            && let Some(TermKind::Add(xs)) = tm.kind(factors[0]).cloned()
        {
            let lead = Self::mk_num(tm, coeff, is_int);
            let prods: Vec<TermId> = xs.iter().map(|&x| tm.mk_mul([lead, x])).collect();
            return BrResult::rewrite2(tm.mk_add(prods));
        }

        let mut out = Vec::with_capacity(factors.len() + 1);
        if !is_one {
            out.push(Self::mk_num(tm, coeff, is_int));
        }
        out.extend(factors);
        if out.as_slice() == args {
            return BrResult::FAILED;
        }
        match out.len() {
            0 => BrResult::done(tm.mk_numeral(BigRational::one(), is_int)),
            _ => BrResult::done(tm.mk_mul(out)),
        }
    }

    /// Merge repeated bases, including existing integer powers.
    fn group_powers(&mut self, tm: &mut TermManager, factors: &[TermId]) -> Vec<TermId> {
        let mut order: Vec<TermId> = Vec::new();
        let mut exps: FxHashMap<TermId, BigInt> = FxHashMap::default();
        for &f in factors {
            let (base, k) = match tm.kind(f) {
                Some(TermKind::Power(b, e)) => match tm.numeral(*e) {
                    Some(r) if r.is_integer() && r.is_positive() => (*b, r.to_integer()),
                    _ => (f, BigInt::one()),
                },
                _ => (f, BigInt::one()),
            };
            match exps.get_mut(&base) {
                Some(acc) => *acc += k,
                None => {
                    order.push(base);
                    exps.insert(base, k);
                }
            }
        }
        let mut out: Vec<TermId> = Vec::with_capacity(order.len());
        for base in order {
            let k = exps.remove(&base).unwrap_or_else(BigInt::one);
            if k.is_one() {
                out.push(base);
            } else {
                let e = tm.mk_int(k);
                out.push(tm.mk_power(base, e));
            }
        }
        out.sort_unstable();
        out
    }

    /// Multiply out every sum among `factors`.
    fn distribute(&mut self, tm: &mut TermManager, coeff: Numeral, factors: &[TermId], is_int: bool) -> TermId {
        let lead = Self::mk_num(tm, coeff, is_int);
        let mut products: Vec<Vec<TermId>> = vec![vec![lead]];
        for &f in factors {
            let summands = flatten_add(tm, f);
            products = products
                .into_iter()
                .flat_map(|p| {
                    summands.iter().map(move |&s| {
                        let mut q = p.clone();
                        q.push(s);
                        q
                    })
                })
                .collect();
        }
        let terms: Vec<TermId> = products.into_iter().map(|p| tm.mk_mul(p)).collect();
        tm.mk_add(terms)
    }

    /// `-t` as `-1 * t`.
    pub(crate) fn mk_uminus(&mut self, tm: &mut TermManager, t: TermId, a: TermId) -> BrResult {
        let is_int = tm.is_int(t);
        if let Some(v) = self.numeral_value(tm, a) {
            let n = self.am.neg(&v);
            return BrResult::done(Self::mk_num(tm, n, is_int));
        }
        let m1 = tm.mk_numeral(-BigRational::one(), is_int);
        BrResult::rewrite1(tm.mk_mul([m1, a]))
    }

    /// `a - b` as `a + -1 * b`.
    pub(crate) fn mk_sub_core(&mut self, tm: &mut TermManager, t: TermId, a: TermId, b: TermId) -> BrResult {
        let is_int = tm.is_int(t);
        let m1 = tm.mk_numeral(-BigRational::one(), is_int);
        let nb = tm.mk_mul([m1, b]);
        BrResult::rewrite2(tm.mk_add([a, nb]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::{ArithRewriterConfig, RewriterConfig, ThRewriter};
    use tactix_math::rational::rat;

    fn rewriter(arith: ArithRewriterConfig) -> ThRewriter {
        ThRewriter::new(RewriterConfig {
            arith,
            ..RewriterConfig::default()
        })
    }

    #[test]
    fn test_monomial_split() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let three = tm.mk_int(3);
        let m = tm.mk_mul([three, x, y]);
        let (c, pp) = monomial(&tm, m);
        assert_eq!(c, rat(3));
        assert_eq!(pp.as_slice(), &[x, y]);
        let (c, pp) = monomial(&tm, x);
        assert_eq!(c, rat(1));
        assert_eq!(pp.as_slice(), &[x]);
    }

    #[test]
    fn test_sub_cancels() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.real_sort);
        let y = tm.mk_var("y", tm.sorts.real_sort);
        let s = tm.mk_add([x, y]);
        let d = tm.mk_sub(s, x);
        let mut rw = ThRewriter::default();
        assert_eq!(rw.rewrite(&mut tm, d).unwrap(), y);
    }

    #[test]
    fn test_mul_zero_and_order() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let two = tm.mk_int(2);
        let three = tm.mk_int(3);
        let zero = tm.mk_int(0);
        let mut rw = ThRewriter::default();
        let p = tm.mk_mul([y, two, x, three]);
        let r = rw.rewrite(&mut tm, p).unwrap();
        let six = tm.mk_int(6);
        assert_eq!(r, tm.mk_mul([six, x, y]));
        let z = tm.mk_mul([x, zero]);
        let got = rw.rewrite(&mut tm, z).unwrap();
        assert!(tm.is_zero(got));
    }

    #[test]
    fn test_neg_of_sum_distributes() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let one = tm.mk_int(1);
        let s = tm.mk_add([x, one]);
        let n = tm.mk_neg(s);
        let mut rw = ThRewriter::default();
        let r = rw.rewrite(&mut tm, n).unwrap();
        assert_eq!(tm.display(r).to_string(), "(+ (- 1) (* (- 1) x))");
    }

    #[test]
    fn test_som_distributes_products() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let one = tm.mk_int(1);
        let a = tm.mk_add([x, one]);
        let b = tm.mk_add([y, one]);
        let p = tm.mk_mul([a, b]);
        let mut rw = rewriter(ArithRewriterConfig {
            som: true,
            ..ArithRewriterConfig::default()
        });
        let r = rw.rewrite(&mut tm, p).unwrap();
        // products come out in distribution order
        let xy = tm.mk_mul([x, y]);
        assert_eq!(r, tm.mk_add([one, y, x, xy]));
    }

    #[test]
    fn test_mul_to_power() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.real_sort);
        let p = tm.mk_mul([x, x, x]);
        let mut rw = rewriter(ArithRewriterConfig {
            mul_to_power: true,
            ..ArithRewriterConfig::default()
        });
        let r = rw.rewrite(&mut tm, p).unwrap();
        let three = tm.mk_int(3);
        assert_eq!(r, tm.mk_power(x, three));
    }

    #[test]
    fn test_sort_sums() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let s = tm.mk_add([y, x]);
        let mut rw = rewriter(ArithRewriterConfig {
            sort_sums: true,
            ..ArithRewriterConfig::default()
        });
        assert_eq!(rw.rewrite(&mut tm, s).unwrap(), tm.mk_add([x, y]));
    }
}
