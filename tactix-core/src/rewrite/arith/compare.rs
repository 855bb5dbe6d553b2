//! Normalization of `<=`, `>=` and arithmetic `=`.
//!
//! Both sides are read as linear forms over power products. Common
//! monomials cancel, the constant ends up on the right, and a single
//! monomial against a constant becomes a bound on its power product. Integer
//! bounds are rounded, and with `gcd-rounding` integer comparisons are
//! divided by the gcd of their coefficients.

use super::ArithRewriter;
use crate::ast::{Args, TermId, TermKind, TermManager};
use crate::rewrite::BrResult;
use crate::rewrite::poly::{LinearForm, Monomials, flatten_add};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::cmp::Ordering;
use tactix_math::rational::{ceil, floor, gcd_all};

/// Relation of a normalized comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `=`
    Eq,
}

impl Cmp {
    /// Relation after exchanging the sides.
    pub fn flip(self) -> Cmp {
        match self {
            Cmp::Le => Cmp::Ge,
            Cmp::Ge => Cmp::Le,
            Cmp::Eq => Cmp::Eq,
        }
    }

    /// Whether `ord` (left compared with right) satisfies the relation.
    pub fn holds(self, ord: Ordering) -> bool {
        match self {
            Cmp::Le => ord != Ordering::Greater,
            Cmp::Ge => ord != Ordering::Less,
            Cmp::Eq => ord == Ordering::Equal,
        }
    }

    /// Build `a R b`.
    pub fn mk(self, tm: &mut TermManager, a: TermId, b: TermId) -> TermId {
        match self {
            Cmp::Le => tm.mk_le(a, b),
            Cmp::Ge => tm.mk_ge(a, b),
            Cmp::Eq => tm.mk_eq(a, b),
        }
    }
}

impl ArithRewriter {
    pub(crate) fn mk_le_ge_eq_core(
        &mut self,
        tm: &mut TermManager,
        t: TermId,
        cmp: Cmp,
        a: TermId,
        b: TermId,
    ) -> BrResult {
        if let (Some(va), Some(vb)) = (self.numeral_value(tm, a), self.numeral_value(tm, b)) {
            let ord = self.am.compare(&va, &vb);
            return match self.eval(ord) {
                Some(ord) => self.decided(tm, cmp.holds(ord)),
                None => BrResult::FAILED,
            };
        }
        if let Some(r) = self.reduce_zero_power(tm, cmp, a, b) {
            return r;
        }
        if self.config.elim_to_real
            && let (Some((a2, ca)), Some((b2, cb))) = (strip_to_real(tm, a), strip_to_real(tm, b))
            && (ca || cb)
        {
            return BrResult::full(cmp.mk(tm, a2, b2));
        }
        let is_int = tm.is_int(a) && tm.is_int(b);
        let (lhs, k, cmp) = self.cancel_monomials(tm, cmp, a, b);
        let Some((mut lhs, rhs)) = lhs else {
            // no monomials left: 0 R k
            let ord = BigRational::zero().cmp(&k);
            return self.decided(tm, cmp.holds(ord));
        };

        // a * x R k
        if rhs.is_empty() && lhs.len() == 1 {
            let (c, pp) = lhs.into_vec().remove(0);
            return self.mk_bound(tm, t, cmp, &c, &pp, &(k / &c), is_int);
        }

        let mut k = k;
        let mut rhs = rhs;
        if self.config.gcd_rounding && is_int && k.is_integer() {
            let coeffs: Vec<BigInt> = lhs
                .iter()
                .chain(rhs.iter())
                .filter(|(c, _)| c.is_integer())
                .map(|(c, _)| c.to_integer())
                .collect();
            if coeffs.len() == lhs.len() + rhs.len() {
                // lhs - rhs is integral, so dividing by g and rounding k is exact
                let g = gcd_all(coeffs.iter());
                if g > BigInt::one() {
                    let gr = BigRational::from_integer(g.clone());
                    let q = &k / &gr;
                    let rounded = match cmp {
                        Cmp::Le => floor(&q),
                        Cmp::Ge => ceil(&q),
                        Cmp::Eq if !k.to_integer().is_multiple_of(&g) => {
                            return self.decided(tm, false);
                        }
                        Cmp::Eq => q.to_integer(),
                    };
                    self.stats.gcd_roundings += 1;
                    k = BigRational::from_integer(rounded);
                    let scale = |ms: &Monomials| {
                        let mut scaled = Monomials::default();
                        for (c, pp) in ms.iter() {
                            scaled.add(c / &gr, pp.clone());
                        }
                        scaled
                    };
                    lhs = scale(&lhs);
                    rhs = scale(&rhs);
                }
            }
        }

        let monos: Vec<(BigRational, Args)> = lhs.into_vec();
        let lhs_t = self.mk_sum_of(tm, None, &monos, is_int);
        let kt = (!k.is_zero() || rhs.is_empty()).then(|| tm.mk_numeral(k.clone(), is_int));
        let rhs_monos: Vec<(BigRational, Args)> = rhs.into_vec();
        let rhs_t = match (kt, rhs_monos.is_empty()) {
            (Some(kt), true) => kt,
            (kt, _) => self.mk_sum_of(tm, kt, &rhs_monos, is_int),
        };
        let r = cmp.mk(tm, lhs_t, rhs_t);
        if cmp == Cmp::Eq && self.config.eq2ineq {
            let le = tm.mk_le(lhs_t, rhs_t);
            let ge = tm.mk_ge(lhs_t, rhs_t);
            return BrResult::rewrite2(tm.mk_and([le, ge]));
        }
        if r == t {
            BrResult::FAILED
        } else {
            BrResult::done(r)
        }
    }

    fn decided(&mut self, tm: &TermManager, b: bool) -> BrResult {
        self.stats.comparisons_decided += 1;
        BrResult::done(tm.mk_bool(b))
    }

    /// Cancel monomials common to both sides and move the constant right.
    ///
    /// Returns the left and right monomials (`None` when both are empty),
    /// the right-hand constant and the relation, which flips when the sides
    /// are exchanged.
    #[allow(clippy::type_complexity)]
    fn cancel_monomials(
        &mut self,
        tm: &TermManager,
        cmp: Cmp,
        a: TermId,
        b: TermId,
    ) -> (Option<(Monomials, Monomials)>, BigRational, Cmp) {
        let l = LinearForm::of(tm, a);
        let r = LinearForm::of(tm, b);
        let mut k = r.constant - l.constant;
        let mut rhs = r.monomials;
        let mut lhs = Monomials::default();
        for (c, pp) in l.monomials.iter() {
            let c = match rhs.take(pp) {
                Some(d) => c - d,
                None => c.clone(),
            };
            lhs.add(c, pp.clone());
        }
        lhs.retain_nonzero();
        rhs.retain_nonzero();
        if self.config.arith_lhs {
            for (c, pp) in rhs.iter() {
                lhs.add(-c, pp.clone());
            }
            lhs.retain_nonzero();
            rhs = Monomials::default();
        }
        let mut cmp = cmp;
        if lhs.is_empty() {
            if rhs.is_empty() {
                return (None, k, cmp);
            }
            std::mem::swap(&mut lhs, &mut rhs);
            k = -k;
            cmp = cmp.flip();
        }
        (Some((lhs, rhs)), k, cmp)
    }

    /// `c * pp R k`, with `bound = k / c`.
    #[allow(clippy::too_many_arguments)]
    fn mk_bound(
        &mut self,
        tm: &mut TermManager,
        t: TermId,
        cmp: Cmp,
        c: &BigRational,
        pp: &[TermId],
        bound: &BigRational,
        is_int: bool,
    ) -> BrResult {
        let cmp = if c.is_negative() { cmp.flip() } else { cmp };
        let x = tm.mk_mul(pp.iter().copied());
        let bound = if is_int {
            match cmp {
                Cmp::Le => BigRational::from_integer(floor(bound)),
                Cmp::Ge => BigRational::from_integer(ceil(bound)),
                Cmp::Eq if !bound.is_integer() => return self.decided(tm, false),
                Cmp::Eq => bound.clone(),
            }
        } else {
            bound.clone()
        };
        let kt = tm.mk_numeral(bound, is_int);
        let r = cmp.mk(tm, x, kt);
        if cmp == Cmp::Eq && self.config.eq2ineq {
            let le = tm.mk_le(x, kt);
            let ge = tm.mk_ge(x, kt);
            return BrResult::rewrite2(tm.mk_and([le, ge]));
        }
        if r == t {
            BrResult::FAILED
        } else {
            BrResult::done(r)
        }
    }

    /// `0 R x^k * ...`: powers of odd degree become the base and powers of
    /// even degree become squares; for `=` every power becomes the base.
    fn reduce_zero_power(&mut self, tm: &mut TermManager, cmp: Cmp, a: TermId, b: TermId) -> Option<BrResult> {
        let (p, zero_left) = if tm.is_zero(a) {
            (b, true)
        } else if tm.is_zero(b) {
            (a, false)
        } else {
            return None;
        };
        let factors: Vec<TermId> = match tm.kind(p) {
            Some(TermKind::Mul(xs)) => xs.to_vec(),
            Some(TermKind::Power(..)) => vec![p],
            _ => return None,
        };
        let is_int = tm.is_int(p);
        let mut changed = false;
        let mut out = Vec::with_capacity(factors.len());
        for f in factors {
            let reduced = match tm.kind(f).cloned() {
                Some(TermKind::Power(base, e)) => match tm.numeral(e) {
                    Some(k) if k.is_integer() && k > BigRational::one() => {
                        let k = k.to_integer();
                        if cmp == Cmp::Eq {
                            Some(base)
                        } else if k > BigInt::from(2) {
                            if k.is_odd() {
                                Some(base)
                            } else {
                                let two = tm.mk_int(2);
                                Some(tm.mk_power(base, two))
                            }
                        } else {
                            None
                        }
                    }
                    _ => None,
                },
                _ => None,
            };
            changed |= reduced.is_some();
            out.push(reduced.unwrap_or(f));
        }
        if !changed {
            return None;
        }
        let p2 = tm.mk_mul(out);
        let zero = tm.mk_numeral(BigRational::zero(), is_int);
        let r = if zero_left {
            cmp.mk(tm, zero, p2)
        } else {
            cmp.mk(tm, p2, zero)
        };
        Some(BrResult::full(r))
    }
}

/// Integer counterpart of a real side built from `to_real` casts and
/// integral numerals, and whether it mentions a cast.
fn strip_to_real(tm: &mut TermManager, t: TermId) -> Option<(TermId, bool)> {
    if !tm.is_real(t) {
        return None;
    }
    let mut out = Vec::new();
    let mut found = false;
    for s in flatten_add(tm, t) {
        let factors: Vec<TermId> = match tm.kind(s) {
            Some(TermKind::Mul(xs)) => xs.to_vec(),
            _ => vec![s],
        };
        let mut ints = Vec::with_capacity(factors.len());
        for f in factors {
            if let Some(r) = tm.numeral(f) {
                if !r.is_integer() {
                    return None;
                }
                ints.push(tm.mk_int(r.to_integer()));
            } else if let Some(TermKind::ToReal(u)) = tm.kind(f) {
                found = true;
                ints.push(*u);
            } else {
                return None;
            }
        }
        out.push(tm.mk_mul(ints));
    }
    Some((tm.mk_add(out), found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::{ArithRewriterConfig, RewriterConfig, ThRewriter};
    use tactix_math::rational::rat;

    fn with(arith: ArithRewriterConfig) -> ThRewriter {
        ThRewriter::new(RewriterConfig {
            arith,
            ..RewriterConfig::default()
        })
    }

    #[test]
    fn test_int_bounds_round() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let two = tm.mk_int(2);
        let five = tm.mk_int(5);
        let tx = tm.mk_mul([two, x]);
        let mut rw = ThRewriter::default();

        let le = tm.mk_le(tx, five);
        let r = rw.rewrite(&mut tm, le).unwrap();
        assert_eq!(tm.display(r).to_string(), "(<= x 2)");

        let ge = tm.mk_ge(tx, five);
        let r = rw.rewrite(&mut tm, ge).unwrap();
        let three = tm.mk_int(3);
        assert_eq!(r, tm.mk_ge(x, three));

        let eq = tm.mk_eq(tx, five);
        let got = rw.rewrite(&mut tm, eq).unwrap();
        assert!(tm.is_false(got));
    }

    #[test]
    fn test_normal_form_is_fixpoint() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let two = tm.mk_int(2);
        let le = tm.mk_le(x, two);
        let mut arith = ArithRewriter::default();
        assert!(arith.mk_le_ge_eq_core(&mut tm, le, Cmp::Le, x, two).is_failed());
    }

    #[test]
    fn test_constant_on_left_flips() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let two = tm.mk_int(2);
        let le = tm.mk_le(two, x);
        let mut rw = ThRewriter::default();
        let r = rw.rewrite(&mut tm, le).unwrap();
        assert_eq!(r, tm.mk_ge(x, two));
    }

    #[test]
    fn test_negative_coefficient_flips() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.real_sort);
        let m2 = tm.mk_real(rat(-2));
        let three = tm.mk_real(rat(3));
        let p = tm.mk_mul([m2, x]);
        let le = tm.mk_le(p, three);
        let mut rw = ThRewriter::default();
        let r = rw.rewrite(&mut tm, le).unwrap();
        let b = tm.mk_real(BigRational::new(BigInt::from(-3), BigInt::from(2)));
        assert_eq!(r, tm.mk_ge(x, b));
    }

    #[test]
    fn test_gcd_rounding() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let two = tm.mk_int(2);
        let four = tm.mk_int(4);
        let seven = tm.mk_int(7);
        let a = tm.mk_mul([two, x]);
        let b = tm.mk_mul([four, y]);
        let s = tm.mk_add([a, b]);
        let mut rw = with(ArithRewriterConfig {
            gcd_rounding: true,
            ..ArithRewriterConfig::default()
        });
        let y2 = tm.mk_mul([two, y]);
        let lhs = tm.mk_add([x, y2]);

        let le = tm.mk_le(s, seven);
        let three = tm.mk_int(3);
        assert_eq!(rw.rewrite(&mut tm, le).unwrap(), tm.mk_le(lhs, three));

        let ge = tm.mk_ge(s, seven);
        assert_eq!(rw.rewrite(&mut tm, ge).unwrap(), tm.mk_ge(lhs, four));

        let eq = tm.mk_eq(s, seven);
        let got = rw.rewrite(&mut tm, eq).unwrap();
        assert!(tm.is_false(got));
        assert!(rw.arith_stats().gcd_roundings >= 2);

        // 2x <= 4y + 7  ~>  x <= 3 + 2y
        let rhs = tm.mk_add([b, seven]);
        let le = tm.mk_le(a, rhs);
        let bound = tm.mk_add([three, y2]);
        let expected = tm.mk_le(x, bound);
        assert_eq!(rw.rewrite(&mut tm, le).unwrap(), expected);

        let eq = tm.mk_eq(a, rhs);
        let got = rw.rewrite(&mut tm, eq).unwrap();
        assert!(tm.is_false(got));
    }

    #[test]
    fn test_cancel_common_monomials() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.real_sort);
        let y = tm.mk_var("y", tm.sorts.real_sort);
        let one = tm.mk_real(rat(1));
        let a = tm.mk_add([x, y, one]);
        let b = tm.mk_add([y, x]);
        let le = tm.mk_le(a, b);
        let mut rw = ThRewriter::default();
        let got = rw.rewrite(&mut tm, le).unwrap();
        assert!(tm.is_false(got));
    }

    #[test]
    fn test_lt_becomes_negated_le() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.real_sort);
        let y = tm.mk_var("y", tm.sorts.real_sort);
        let lt = tm.mk_lt(x, y);
        let mut rw = with(ArithRewriterConfig {
            arith_lhs: true,
            ..ArithRewriterConfig::default()
        });
        let r = rw.rewrite(&mut tm, lt).unwrap();
        // not (y <= x) with everything moved left: not (y + -1*x <= 0)
        let m1 = tm.mk_real(rat(-1));
        let mx = tm.mk_mul([m1, x]);
        let lhs = tm.mk_add([y, mx]);
        let zero = tm.mk_real(rat(0));
        let le = tm.mk_le(lhs, zero);
        assert_eq!(r, tm.mk_not(le));
    }

    #[test]
    fn test_zero_power() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.real_sort);
        let three = tm.mk_int(3);
        let p = tm.mk_power(x, three);
        let zero = tm.mk_real(rat(0));
        let eq = tm.mk_eq(p, zero);
        let mut rw = ThRewriter::default();
        assert_eq!(rw.rewrite(&mut tm, eq).unwrap(), tm.mk_eq(x, zero));
        let le = tm.mk_le(p, zero);
        assert_eq!(rw.rewrite(&mut tm, le).unwrap(), tm.mk_le(x, zero));
    }

    #[test]
    fn test_eq2ineq() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.real_sort);
        let y = tm.mk_var("y", tm.sorts.real_sort);
        let eq = tm.mk_eq(x, y);
        let mut rw = with(ArithRewriterConfig {
            eq2ineq: true,
            ..ArithRewriterConfig::default()
        });
        let r = rw.rewrite(&mut tm, eq).unwrap();
        let le = tm.mk_le(x, y);
        let ge = tm.mk_ge(x, y);
        assert_eq!(r, tm.mk_and([le, ge]));
    }

    #[test]
    fn test_elim_to_real() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let tx = tm.mk_to_real(x);
        let three = tm.mk_real(rat(3));
        let le = tm.mk_le(tx, three);
        let mut rw = with(ArithRewriterConfig {
            elim_to_real: true,
            ..ArithRewriterConfig::default()
        });
        let r = rw.rewrite(&mut tm, le).unwrap();
        let i3 = tm.mk_int(3);
        assert_eq!(r, tm.mk_le(x, i3));
    }
}
