//! Trigonometric and hyperbolic functions.
//!
//! Exact values are known at rational multiples `k*pi` whose denominator
//! divides 12. They are written as sums `c1 * n1^(1/2) + ...` and handed
//! back for a full rewrite, so the power and sum rules turn them into
//! algebraic numerals.

use super::ArithRewriter;
use crate::ast::{TermId, TermKind, TermManager};
use crate::rewrite::BrResult;
use crate::rewrite::poly::monomial;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use tactix_math::rational::{floor, rat, rat2};

/// `sum c_i * sqrt(n_i)`; radicand 1 stands for a rational term.
type SurdSum = Vec<(BigRational, u32)>;

/// `sin(k*pi)` for `k` with a denominator dividing 12.
fn sin_pi_multiple(k: &BigRational) -> Option<SurdSum> {
    let two = rat(2);
    let mut k = k - &two * BigRational::from_integer(floor(&(k / &two)));
    let mut sign = rat(1);
    if k >= rat(1) {
        k -= rat(1);
        sign = -sign;
    }
    if k > rat2(1, 2) {
        k = rat(1) - k;
    }
    let twelfths = (&k * rat(12)).to_integer().to_u32()?;
    if !(&k * rat(12)).is_integer() {
        return None;
    }
    let v: SurdSum = match twelfths {
        0 => vec![],
        1 => vec![(rat2(1, 4), 6), (rat2(-1, 4), 2)],
        2 => vec![(rat2(1, 2), 1)],
        3 => vec![(rat2(1, 2), 2)],
        4 => vec![(rat2(1, 2), 3)],
        5 => vec![(rat2(1, 4), 6), (rat2(1, 4), 2)],
        6 => vec![(rat(1), 1)],
        _ => return None,
    };
    Some(v.into_iter().map(|(c, n)| (c * &sign, n)).collect())
}

/// `tan(k*pi)`; undefined at odd multiples of `pi/2`.
fn tan_pi_multiple(k: &BigRational) -> Option<SurdSum> {
    let mut k = k - BigRational::from_integer(floor(k));
    let mut sign = rat(1);
    if k > rat2(1, 2) {
        k = rat(1) - k;
        sign = -sign;
    }
    if !(&k * rat(12)).is_integer() {
        return None;
    }
    let v: SurdSum = match (&k * rat(12)).to_integer().to_u32()? {
        0 => vec![],
        1 => vec![(rat(2), 1), (rat(-1), 3)],
        2 => vec![(rat2(1, 3), 3)],
        3 => vec![(rat(1), 1)],
        4 => vec![(rat(1), 3)],
        5 => vec![(rat(2), 1), (rat(1), 3)],
        _ => return None,
    };
    Some(v.into_iter().map(|(c, n)| (c * &sign, n)).collect())
}

/// `asin(v) / pi` at the exact points.
fn asin_over_pi(v: &BigRational) -> Option<BigRational> {
    let a = v.abs();
    let r = if a.is_zero() {
        rat(0)
    } else if a == rat2(1, 2) {
        rat2(1, 6)
    } else if a.is_one() {
        rat2(1, 2)
    } else {
        return None;
    };
    Some(if v.is_negative() { -r } else { r })
}

/// `atan(v) / pi` at the exact points.
fn atan_over_pi(v: &BigRational) -> Option<BigRational> {
    if v.is_zero() {
        Some(rat(0))
    } else if v.abs().is_one() {
        Some(if v.is_negative() { rat2(-1, 4) } else { rat2(1, 4) })
    } else {
        None
    }
}

/// Which function a rule is about; carries no argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fun {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
}

impl Fun {
    fn of(kind: &TermKind) -> Option<(Fun, TermId)> {
        Some(match *kind {
            TermKind::Sin(a) => (Fun::Sin, a),
            TermKind::Cos(a) => (Fun::Cos, a),
            TermKind::Tan(a) => (Fun::Tan, a),
            TermKind::Asin(a) => (Fun::Asin, a),
            TermKind::Acos(a) => (Fun::Acos, a),
            TermKind::Atan(a) => (Fun::Atan, a),
            TermKind::Sinh(a) => (Fun::Sinh, a),
            TermKind::Cosh(a) => (Fun::Cosh, a),
            TermKind::Tanh(a) => (Fun::Tanh, a),
            TermKind::Asinh(a) => (Fun::Asinh, a),
            TermKind::Acosh(a) => (Fun::Acosh, a),
            TermKind::Atanh(a) => (Fun::Atanh, a),
            _ => return None,
        })
    }

    fn apply(self, tm: &mut TermManager, a: TermId) -> TermId {
        tm.mk_app(match self {
            Fun::Sin => TermKind::Sin(a),
            Fun::Cos => TermKind::Cos(a),
            Fun::Tan => TermKind::Tan(a),
            Fun::Asin => TermKind::Asin(a),
            Fun::Acos => TermKind::Acos(a),
            Fun::Atan => TermKind::Atan(a),
            Fun::Sinh => TermKind::Sinh(a),
            Fun::Cosh => TermKind::Cosh(a),
            Fun::Tanh => TermKind::Tanh(a),
            Fun::Asinh => TermKind::Asinh(a),
            Fun::Acosh => TermKind::Acosh(a),
            Fun::Atanh => TermKind::Atanh(a),
        })
    }

    /// Inverse function whose application this function cancels.
    fn cancels(self) -> Option<Fun> {
        match self {
            Fun::Sin => Some(Fun::Asin),
            Fun::Cos => Some(Fun::Acos),
            Fun::Tan => Some(Fun::Atan),
            Fun::Sinh => Some(Fun::Asinh),
            Fun::Cosh => Some(Fun::Acosh),
            Fun::Tanh => Some(Fun::Atanh),
            _ => None,
        }
    }

    /// `Some(true)` for odd, `Some(false)` for even functions.
    fn parity(self) -> Option<bool> {
        match self {
            Fun::Sin | Fun::Tan | Fun::Sinh | Fun::Tanh | Fun::Asin | Fun::Atan | Fun::Asinh
            | Fun::Atanh => Some(true),
            Fun::Cos | Fun::Cosh => Some(false),
            Fun::Acos | Fun::Acosh => None,
        }
    }
}

/// `k` such that `t = k*pi`.
fn pi_multiple(tm: &TermManager, t: TermId) -> Option<BigRational> {
    if tm.is_zero(t) {
        return Some(rat(0));
    }
    match tm.kind(t)? {
        TermKind::Pi => Some(rat(1)),
        TermKind::Mul(xs) if xs.len() == 2 && matches!(tm.kind(xs[1]), Some(TermKind::Pi)) => {
            tm.numeral(xs[0])
        }
        _ => None,
    }
}

/// `k` such that `t = k * pi * to_real(n)` for an integer term `n`.
fn pi_int_multiple(tm: &TermManager, t: TermId) -> Option<BigRational> {
    let (c, pp) = monomial(tm, t);
    if pp.len() != 2 {
        return None;
    }
    let is_pi = |u: TermId| matches!(tm.kind(u), Some(TermKind::Pi));
    let is_cast = |u: TermId| matches!(tm.kind(u), Some(TermKind::ToReal(_)));
    ((is_pi(pp[0]) && is_cast(pp[1])) || (is_pi(pp[1]) && is_cast(pp[0]))).then_some(c)
}

impl ArithRewriter {
    fn mk_surd_sum(&self, tm: &mut TermManager, v: &SurdSum) -> Option<BrResult> {
        if v.is_empty() {
            return Some(BrResult::done(tm.mk_real(BigRational::zero())));
        }
        if let [(c, 1)] = v.as_slice() {
            return Some(BrResult::done(tm.mk_real(c.clone())));
        }
        if !self.config.algebraic_number_evaluator {
            return None;
        }
        let half = tm.mk_real(rat2(1, 2));
        let parts: Vec<TermId> = v
            .iter()
            .map(|(c, n)| {
                let cn = tm.mk_real(c.clone());
                if *n == 1 {
                    return cn;
                }
                let radicand = tm.mk_real(rat(i64::from(*n)));
                let root = tm.mk_power(radicand, half);
                tm.mk_mul([cn, root])
            })
            .collect();
        Some(BrResult::full(tm.mk_add(parts)))
    }

    fn mk_pi_times(&self, tm: &mut TermManager, k: BigRational) -> TermId {
        if k.is_zero() {
            return tm.mk_real(k);
        }
        let pi = tm.mk_pi();
        if k.is_one() {
            return pi;
        }
        let c = tm.mk_real(k);
        tm.mk_mul([c, pi])
    }

    fn mk_negated(tm: &mut TermManager, t: TermId) -> TermId {
        let m1 = tm.mk_real(-BigRational::one());
        tm.mk_mul([m1, t])
    }

    pub(crate) fn mk_trig_core(&mut self, tm: &mut TermManager, kind: &TermKind) -> BrResult {
        let Some((f, a)) = Fun::of(kind) else {
            return BrResult::FAILED;
        };

        // exact values
        if let Some(k) = pi_multiple(tm, a) {
            let v = match f {
                Fun::Sin => sin_pi_multiple(&k),
                Fun::Cos => sin_pi_multiple(&(k + rat2(1, 2))),
                Fun::Tan => tan_pi_multiple(&k),
                _ => None,
            };
            if let Some(v) = v
                && let Some(r) = self.mk_surd_sum(tm, &v)
            {
                return r;
            }
        }
        if let Some(v) = tm.numeral(a)
            && let Some(r) = self.mk_at_numeral(tm, f, &v)
        {
            return r;
        }

        // f(f^-1(x)) = x
        if let Some(inv) = f.cancels()
            && let Some(kind_a) = tm.kind(a)
            && let Some((g, x)) = Fun::of(kind_a)
            && g == inv
        {
            return BrResult::done(x);
        }

        // f(-x)
        if let Some(odd) = f.parity() {
            let (c, pp) = monomial(tm, a);
            if c.is_negative() && !pp.is_empty() && !tm.is_numeral(a) {
                let neg_c = -c;
                let pos = if neg_c.is_one() {
                    tm.mk_mul(pp.iter().copied())
                } else {
                    let lead = tm.mk_real(neg_c);
                    tm.mk_mul(std::iter::once(lead).chain(pp.iter().copied()))
                };
                let fx = f.apply(tm, pos);
                if odd {
                    return BrResult::rewrite2(Self::mk_negated(tm, fx));
                }
                return BrResult::rewrite1(fx);
            }
        }

        if matches!(f, Fun::Sin | Fun::Cos | Fun::Tan)
            && let Some(r) = self.shift_period(tm, f, a)
        {
            return r;
        }

        if f == Fun::Tan && self.config.expand_tan {
            let s = Fun::Sin.apply(tm, a);
            let c = Fun::Cos.apply(tm, a);
            return BrResult::rewrite2(tm.mk_div(s, c));
        }
        BrResult::FAILED
    }

    fn mk_at_numeral(&mut self, tm: &mut TermManager, f: Fun, v: &BigRational) -> Option<BrResult> {
        let zero = v.is_zero();
        match f {
            Fun::Sinh | Fun::Tanh | Fun::Asinh | Fun::Atanh if zero => {
                Some(BrResult::done(tm.mk_real(rat(0))))
            }
            Fun::Cosh if zero => Some(BrResult::done(tm.mk_real(rat(1)))),
            Fun::Acosh if v.is_one() => Some(BrResult::done(tm.mk_real(rat(0)))),
            Fun::Asin => {
                let k = asin_over_pi(v)?;
                Some(BrResult::done(self.mk_pi_times(tm, k)))
            }
            Fun::Acos => {
                let k = rat2(1, 2) - asin_over_pi(v)?;
                Some(BrResult::done(self.mk_pi_times(tm, k)))
            }
            Fun::Atan => {
                let k = atan_over_pi(v)?;
                Some(BrResult::done(self.mk_pi_times(tm, k)))
            }
            _ => None,
        }
    }

    /// Remove one multiple of the period from a sum argument.
    fn shift_period(&mut self, tm: &mut TermManager, f: Fun, a: TermId) -> Option<BrResult> {
        let Some(TermKind::Add(xs)) = tm.kind(a).cloned() else {
            return None;
        };
        for (i, &x) in xs.iter().enumerate() {
            let rest: Vec<TermId> = xs
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, &y)| y)
                .collect();
            if let Some(c) = pi_int_multiple(tm, x) {
                let period = if f == Fun::Tan { rat(1) } else { rat(2) };
                if (&c / &period).is_integer() {
                    let r = tm.mk_add(rest);
                    return Some(BrResult::rewrite2(f.apply(tm, r)));
                }
                continue;
            }
            let Some(c) = pi_multiple(tm, x) else {
                continue;
            };
            let r = tm.mk_add(rest);
            if c.is_integer() {
                let odd = c.to_integer().is_odd();
                let fr = f.apply(tm, r);
                if f == Fun::Tan || !odd {
                    return Some(BrResult::rewrite2(fr));
                }
                return Some(BrResult::rewrite3(Self::mk_negated(tm, fr)));
            }
            if f != Fun::Tan && (&c * rat(2)).is_integer() {
                // c = n + 1/2: sin(x + c*pi) = (-1)^n cos x, cos(x + c*pi) = (-1)^(n+1) sin x
                let n: BigInt = floor(&c);
                let (g, negate) = match f {
                    Fun::Sin => (Fun::Cos, n.is_odd()),
                    _ => (Fun::Sin, n.is_even()),
                };
                let gr = g.apply(tm, r);
                if negate {
                    return Some(BrResult::rewrite3(Self::mk_negated(tm, gr)));
                }
                return Some(BrResult::rewrite2(gr));
            }
        }
        None
    }
}
