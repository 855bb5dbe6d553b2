//! Rules for `^`.

use super::ArithRewriter;
use crate::ast::{TermId, TermKind, TermManager};
use crate::rewrite::BrResult;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use tactix_math::algebraic::Numeral;
use tactix_math::rational::{pow_int, rational_root};

impl ArithRewriter {
    pub(crate) fn mk_power_core(&mut self, tm: &mut TermManager, t: TermId, base: TermId, exp: TermId) -> BrResult {
        let is_int = tm.is_int(t);
        if tm.is_one(base) {
            return BrResult::done(tm.mk_numeral(BigRational::one(), is_int));
        }
        let Some(y) = tm.numeral(exp) else {
            return BrResult::FAILED;
        };
        if y.is_one() {
            return BrResult::done(base);
        }
        if y.is_zero() {
            // 0^0 is left uninterpreted
            if tm.is_zero(base) {
                return BrResult::FAILED;
            }
            return BrResult::done(tm.mk_numeral(BigRational::one(), is_int));
        }
        if tm.is_zero(base) && y.is_positive() {
            return BrResult::done(tm.mk_numeral(BigRational::zero(), is_int));
        }
        let max_degree = i64::from(self.config.max_degree);

        if let Some(v) = self.numeral_value(tm, base) {
            return self.fold_numeral_power(tm, &v, &y, is_int, max_degree);
        }

        if !y.is_integer() {
            // t^(p/q) -> (t^(1/q))^p
            let p = y.numer().clone();
            if p.is_one() {
                return BrResult::FAILED;
            }
            let inv_q = tm.mk_real(BigRational::new(BigInt::one(), y.denom().clone()));
            let root = tm.mk_power(base, inv_q);
            let pt = tm.mk_int(p);
            return BrResult::rewrite1(tm.mk_power(root, pt));
        }

        // (t^y2)^y
        if let Some(TermKind::Power(inner, e2)) = tm.kind(base).cloned()
            && let Some(y2) = tm.numeral(e2)
            && y2.is_integer()
        {
            let e = tm.mk_numeral(&y2 * &y, true);
            return BrResult::rewrite1(tm.mk_power(inner, e));
        }

        let k = y.to_integer();
        if k.is_negative() {
            if !tm.is_real(t) {
                return BrResult::FAILED;
            }
            let one = tm.mk_real(BigRational::one());
            let pk = tm.mk_int(-k);
            let p = tm.mk_power(base, pk);
            return BrResult::rewrite2(tm.mk_div(one, p));
        }

        let is_sum = matches!(tm.kind(base), Some(TermKind::Add(_)));
        if (self.config.expand_power || (self.config.som && is_sum)) && !self.config.mul_to_power {
            if let Some(n) = k.to_i64().filter(|n| *n <= max_degree) {
                let copies = vec![base; n as usize];
                return BrResult::rewrite1(tm.mk_mul(copies));
            }
        }
        BrResult::FAILED
    }

    fn fold_numeral_power(
        &mut self,
        tm: &mut TermManager,
        v: &Numeral,
        y: &BigRational,
        is_int: bool,
        max_degree: i64,
    ) -> BrResult {
        let in_range = |n: &BigInt| n.to_i64().is_some_and(|n| n.abs() <= max_degree);
        if !in_range(y.numer()) || !in_range(y.denom()) {
            return BrResult::FAILED;
        }
        let (p, q) = match (y.numer().to_i64(), y.denom().to_u32()) {
            (Some(p), Some(q)) => (p, q),
            _ => return BrResult::FAILED,
        };
        if p < 0 && is_int {
            return BrResult::FAILED;
        }
        if q % 2 == 0 && self.am.sign(v) == Ordering::Less {
            return BrResult::FAILED;
        }

        if let Numeral::Rational(r) = v {
            let root = if q == 1 { Some(r.clone()) } else { rational_root(r, q) };
            if let Some(s) = root
                && let Some(val) = pow_int(&s, p)
            {
                return BrResult::done(tm.mk_numeral(val, is_int));
            }
            if !self.config.algebraic_number_evaluator {
                return BrResult::FAILED;
            }
        }

        let root = self.am.root(v, q);
        let Some(root) = self.eval(root) else {
            return BrResult::FAILED;
        };
        let powered = self.am.power(&root, p.unsigned_abs() as u32);
        let Some(mut val) = self.eval(powered) else {
            return BrResult::FAILED;
        };
        if p < 0 {
            let inv = self.am.inv(&val);
            let Some(inv) = self.eval(inv) else {
                return BrResult::FAILED;
            };
            val = inv;
        }
        BrResult::done(Self::mk_num(tm, val, is_int))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::TermManager;
    use crate::rewrite::{ArithRewriterConfig, RewriterConfig, ThRewriter};
    use tactix_math::rational::{rat, rat2};

    #[test]
    fn test_fold_integer_power() {
        let mut tm = TermManager::new();
        let two = tm.mk_int(2);
        let ten = tm.mk_int(10);
        let p = tm.mk_power(two, ten);
        let mut rw = ThRewriter::default();
        let r = rw.rewrite(&mut tm, p).unwrap();
        assert_eq!(tm.numeral(r), Some(rat(1024)));
        assert!(tm.is_int(r));
    }

    #[test]
    fn test_unit_exponents() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.real_sort);
        let one = tm.mk_int(1);
        let zero = tm.mk_int(0);
        let mut rw = ThRewriter::default();
        let p1 = tm.mk_power(x, one);
        assert_eq!(rw.rewrite(&mut tm, p1).unwrap(), x);
        let p0 = tm.mk_power(x, zero);
        let got = rw.rewrite(&mut tm, p0).unwrap();
        assert!(tm.is_one(got));
        let zr = tm.mk_real(rat(0));
        let zz = tm.mk_power(zr, zero);
        assert_eq!(rw.rewrite(&mut tm, zz).unwrap(), zz);
    }

    #[test]
    fn test_cube_root_of_negative() {
        let mut tm = TermManager::new();
        let m8 = tm.mk_real(rat(-8));
        let third = tm.mk_real(rat2(1, 3));
        let p = tm.mk_power(m8, third);
        let mut rw = ThRewriter::default();
        let r = rw.rewrite(&mut tm, p).unwrap();
        assert_eq!(tm.numeral(r), Some(rat(-2)));
    }

    #[test]
    fn test_even_root_of_negative_fails() {
        let mut tm = TermManager::new();
        let m4 = tm.mk_real(rat(-4));
        let half = tm.mk_real(rat2(1, 2));
        let p = tm.mk_power(m4, half);
        let mut rw = ThRewriter::default();
        assert_eq!(rw.rewrite(&mut tm, p).unwrap(), p);
    }

    #[test]
    fn test_sqrt_two_is_algebraic() {
        let mut tm = TermManager::new();
        let two = tm.mk_real(rat(2));
        let half = tm.mk_real(rat2(1, 2));
        let p = tm.mk_power(two, half);
        let mut rw = ThRewriter::default();
        let r = rw.rewrite(&mut tm, p).unwrap();
        assert!(tm.algebraic(r).is_some());
        // sqrt(2) * sqrt(2) = 2
        let sq = tm.mk_mul([r, r]);
        let r2 = rw.rewrite(&mut tm, sq).unwrap();
        assert_eq!(tm.numeral(r2), Some(rat(2)));
    }

    #[test]
    fn test_negative_exponent_on_real() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.real_sort);
        let m2 = tm.mk_int(-2);
        let p = tm.mk_power(x, m2);
        let mut rw = ThRewriter::default();
        let r = rw.rewrite(&mut tm, p).unwrap();
        let one = tm.mk_real(rat(1));
        let two = tm.mk_int(2);
        let sq = tm.mk_power(x, two);
        assert_eq!(r, tm.mk_div(one, sq));
    }

    #[test]
    fn test_expand_power() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.real_sort);
        let three = tm.mk_int(3);
        let p = tm.mk_power(x, three);
        let mut rw = ThRewriter::new(RewriterConfig {
            arith: ArithRewriterConfig {
                expand_power: true,
                ..ArithRewriterConfig::default()
            },
            ..RewriterConfig::default()
        });
        let r = rw.rewrite(&mut tm, p).unwrap();
        assert_eq!(r, tm.mk_mul([x, x, x]));
        // the default configuration keeps the power
        let mut plain = ThRewriter::default();
        assert_eq!(plain.rewrite(&mut tm, p).unwrap(), p);
    }

    #[test]
    fn test_nested_powers_merge() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.real_sort);
        let two = tm.mk_int(2);
        let three = tm.mk_int(3);
        let inner = tm.mk_power(x, two);
        let outer = tm.mk_power(inner, three);
        let mut rw = ThRewriter::default();
        let six = tm.mk_int(6);
        assert_eq!(rw.rewrite(&mut tm, outer).unwrap(), tm.mk_power(x, six));
    }
}
