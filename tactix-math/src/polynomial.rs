//! Dense univariate polynomials over the rationals.
//!
//! Coefficients are stored lowest degree first with no trailing zeros, so
//! structural equality is polynomial equality. Root counting uses Sturm
//! sequences; resultants use the Euclidean remainder sequence over Q.
//!
//! ## References
//!
//! - Basu, Pollack, Roy: "Algorithms in Real Algebraic Geometry", ch. 2 and 4

use crate::rational::gcd_all;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::cmp::Ordering;
use std::fmt;

/// A univariate polynomial `c0 + c1*x + ... + cn*x^n`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct UPoly {
    coeffs: Vec<BigRational>,
}

impl UPoly {
    /// The zero polynomial.
    pub fn zero() -> Self {
        Self { coeffs: Vec::new() }
    }

    /// The constant one.
    pub fn one() -> Self {
        Self::constant(BigRational::one())
    }

    /// A constant polynomial.
    pub fn constant(c: BigRational) -> Self {
        Self::from_coeffs(vec![c])
    }

    /// The identity polynomial `x`.
    pub fn x() -> Self {
        Self::monomial(BigRational::one(), 1)
    }

    /// `c * x^deg`.
    pub fn monomial(c: BigRational, deg: usize) -> Self {
        let mut coeffs = vec![BigRational::zero(); deg + 1];
        coeffs[deg] = c;
        Self::from_coeffs(coeffs)
    }

    /// Build from coefficients, lowest degree first.
    pub fn from_coeffs(mut coeffs: Vec<BigRational>) -> Self {
        while coeffs.last().is_some_and(Zero::is_zero) {
            coeffs.pop();
        }
        Self { coeffs }
    }

    /// Build from machine-integer coefficients, lowest degree first.
    pub fn from_ints(coeffs: &[i64]) -> Self {
        Self::from_coeffs(
            coeffs
                .iter()
                .map(|&c| BigRational::from_integer(BigInt::from(c)))
                .collect(),
        )
    }

    /// Coefficients, lowest degree first.
    pub fn coeffs(&self) -> &[BigRational] {
        &self.coeffs
    }

    /// Whether this is the zero polynomial.
    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Whether this is a constant (including zero).
    pub fn is_constant(&self) -> bool {
        self.coeffs.len() <= 1
    }

    /// Degree; the zero polynomial has degree 0.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Leading coefficient, `None` for zero.
    pub fn leading_coeff(&self) -> Option<&BigRational> {
        self.coeffs.last()
    }

    /// Coefficient of `x^i`.
    pub fn coeff(&self, i: usize) -> BigRational {
        self.coeffs.get(i).cloned().unwrap_or_else(BigRational::zero)
    }

    /// Evaluate with Horner's scheme.
    pub fn eval(&self, x: &BigRational) -> BigRational {
        let mut acc = BigRational::zero();
        for c in self.coeffs.iter().rev() {
            acc = acc * x + c;
        }
        acc
    }

    /// Sign of `p(x)`.
    pub fn sign_at(&self, x: &BigRational) -> Ordering {
        self.eval(x).cmp(&BigRational::zero())
    }

    /// Sum.
    pub fn add(&self, other: &UPoly) -> UPoly {
        let n = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..n).map(|i| self.coeff(i) + other.coeff(i)).collect();
        UPoly::from_coeffs(coeffs)
    }

    /// Difference.
    pub fn sub(&self, other: &UPoly) -> UPoly {
        self.add(&other.neg())
    }

    /// Negation.
    pub fn neg(&self) -> UPoly {
        UPoly {
            coeffs: self.coeffs.iter().map(|c| -c).collect(),
        }
    }

    /// Product.
    pub fn mul(&self, other: &UPoly) -> UPoly {
        if self.is_zero() || other.is_zero() {
            return UPoly::zero();
        }
        let mut coeffs = vec![BigRational::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        UPoly::from_coeffs(coeffs)
    }

    /// Multiply every coefficient by `c`.
    pub fn scale(&self, c: &BigRational) -> UPoly {
        UPoly::from_coeffs(self.coeffs.iter().map(|a| a * c).collect())
    }

    /// Quotient and remainder; `None` when dividing by zero.
    pub fn div_rem(&self, divisor: &UPoly) -> Option<(UPoly, UPoly)> {
        let lc = divisor.leading_coeff()?.clone();
        let dd = divisor.degree();
        let mut rem = self.coeffs.clone();
        if rem.len() <= dd {
            return Some((UPoly::zero(), self.clone()));
        }
        let mut quot = vec![BigRational::zero(); rem.len() - dd];
        for k in (0..quot.len()).rev() {
            let c = &rem[k + dd] / &lc;
            if c.is_zero() {
                continue;
            }
            for (j, d) in divisor.coeffs.iter().enumerate() {
                rem[k + j] -= &c * d;
            }
            quot[k] = c;
        }
        rem.truncate(dd);
        Some((UPoly::from_coeffs(quot), UPoly::from_coeffs(rem)))
    }

    /// Remainder of division; `self` when the divisor is zero.
    pub fn rem(&self, divisor: &UPoly) -> UPoly {
        match self.div_rem(divisor) {
            Some((_, r)) => r,
            None => self.clone(),
        }
    }

    /// Exact quotient, assuming `divisor` divides `self`.
    pub fn exact_div(&self, divisor: &UPoly) -> UPoly {
        match self.div_rem(divisor) {
            Some((q, r)) => {
                debug_assert!(r.is_zero());
                q
            }
            None => self.clone(),
        }
    }

    /// Monic associate (zero stays zero).
    pub fn monic(&self) -> UPoly {
        match self.leading_coeff() {
            Some(lc) => self.scale(&lc.recip()),
            None => UPoly::zero(),
        }
    }

    /// Monic greatest common divisor.
    pub fn gcd(&self, other: &UPoly) -> UPoly {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let r = a.rem(&b);
            a = b;
            b = r;
        }
        a.monic()
    }

    /// Formal derivative.
    pub fn derivative(&self) -> UPoly {
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, c)| c * BigRational::from_integer(BigInt::from(i)))
            .collect();
        UPoly::from_coeffs(coeffs)
    }

    /// Square-free part: same roots, all simple.
    pub fn square_free(&self) -> UPoly {
        if self.degree() < 2 {
            return self.clone();
        }
        let g = self.gcd(&self.derivative());
        if g.is_constant() {
            self.clone()
        } else {
            self.exact_div(&g)
        }
    }

    /// Integer coefficients with content 1 and a positive leading
    /// coefficient, scaled from `self`.
    pub fn primitive_int(&self) -> Vec<BigInt> {
        let mut lcm = BigInt::one();
        for c in &self.coeffs {
            lcm = lcm.lcm(c.denom());
        }
        let mut ints: Vec<BigInt> = self
            .coeffs
            .iter()
            .map(|c| (c * BigRational::from_integer(lcm.clone())).to_integer())
            .collect();
        let g = gcd_all(ints.iter());
        if !g.is_zero() && !g.is_one() {
            for c in &mut ints {
                *c = &*c / &g;
            }
        }
        if ints.last().is_some_and(Signed::is_negative) {
            for c in &mut ints {
                *c = -&*c;
            }
        }
        ints
    }

    /// Primitive integer associate as a polynomial.
    pub fn primitive(&self) -> UPoly {
        UPoly::from_coeffs(
            self.primitive_int()
                .into_iter()
                .map(BigRational::from_integer)
                .collect(),
        )
    }

    /// `p(a*x + b)`.
    pub fn compose_linear(&self, a: &BigRational, b: &BigRational) -> UPoly {
        let lin = UPoly::from_coeffs(vec![b.clone(), a.clone()]);
        let mut acc = UPoly::zero();
        for c in self.coeffs.iter().rev() {
            acc = acc.mul(&lin).add(&UPoly::constant(c.clone()));
        }
        acc
    }

    /// `p(-x)`.
    pub fn reflect(&self) -> UPoly {
        UPoly::from_coeffs(
            self.coeffs
                .iter()
                .enumerate()
                .map(|(i, c)| if i % 2 == 1 { -c } else { c.clone() })
                .collect(),
        )
    }

    /// `x^n * p(1/x)` where `n` is the degree.
    pub fn reverse(&self) -> UPoly {
        let mut coeffs = self.coeffs.clone();
        coeffs.reverse();
        while coeffs.last().is_some_and(Zero::is_zero) {
            coeffs.pop();
        }
        UPoly::from_coeffs(coeffs)
    }

    /// `p(x^k)`.
    pub fn substitute_power(&self, k: usize) -> UPoly {
        if self.is_zero() || k == 0 {
            return UPoly::constant(self.coeffs.iter().cloned().sum());
        }
        let mut coeffs = vec![BigRational::zero(); self.degree() * k + 1];
        for (i, c) in self.coeffs.iter().enumerate() {
            coeffs[i * k] = c.clone();
        }
        UPoly::from_coeffs(coeffs)
    }

    /// Divide out every factor `x`.
    pub fn strip_zero_roots(&self) -> UPoly {
        let skip = self.coeffs.iter().take_while(|c| c.is_zero()).count();
        UPoly::from_coeffs(self.coeffs[skip..].to_vec())
    }

    /// Strict Cauchy bound: every real root `r` satisfies `|r| < bound`.
    pub fn root_bound(&self) -> BigRational {
        let Some(lc) = self.leading_coeff() else {
            return BigRational::one();
        };
        let mut max = BigRational::zero();
        for c in &self.coeffs[..self.coeffs.len() - 1] {
            let q = (c / lc).abs();
            if q > max {
                max = q;
            }
        }
        max + BigRational::one()
    }

    /// Sturm sequence `p, p', -rem(p, p'), ...`.
    pub fn sturm_sequence(&self) -> Vec<UPoly> {
        let mut seq = vec![self.clone()];
        let d = self.derivative();
        if d.is_zero() {
            return seq;
        }
        seq.push(d);
        loop {
            let n = seq.len();
            let r = seq[n - 2].rem(&seq[n - 1]).neg();
            if r.is_zero() {
                break;
            }
            seq.push(r);
        }
        seq
    }

    /// Number of distinct real roots in `(lo, hi]`.
    pub fn count_roots(sturm: &[UPoly], lo: &BigRational, hi: &BigRational) -> usize {
        let vl = sign_variations(sturm, lo);
        let vh = sign_variations(sturm, hi);
        vl.saturating_sub(vh)
    }

    /// Resultant of two polynomials over Q.
    pub fn resultant(a: &UPoly, b: &UPoly) -> BigRational {
        if a.is_zero() || b.is_zero() {
            return BigRational::zero();
        }
        let mut a = a.clone();
        let mut b = b.clone();
        let mut acc = BigRational::one();
        loop {
            let da = a.degree();
            let db = b.degree();
            let lc_b = b.coeffs[db].clone();
            if db == 0 {
                return acc * pow_usize(&lc_b, da);
            }
            let r = a.rem(&b);
            if r.is_zero() {
                return BigRational::zero();
            }
            if (da * db) % 2 == 1 {
                acc = -acc;
            }
            acc *= pow_usize(&lc_b, da - r.degree());
            a = b;
            b = r;
        }
    }

    /// Polynomial through the given points (Newton divided differences).
    ///
    /// The abscissae must be pairwise distinct.
    pub fn interpolate(xs: &[BigRational], ys: &[BigRational]) -> UPoly {
        debug_assert_eq!(xs.len(), ys.len());
        let n = xs.len();
        let mut dd: Vec<BigRational> = ys.to_vec();
        for level in 1..n {
            for i in (level..n).rev() {
                dd[i] = (&dd[i] - &dd[i - 1]) / (&xs[i] - &xs[i - level]);
            }
        }
        let mut acc = UPoly::zero();
        for i in (0..n).rev() {
            let factor = UPoly::from_coeffs(vec![-xs[i].clone(), BigRational::one()]);
            acc = acc.mul(&factor).add(&UPoly::constant(dd[i].clone()));
        }
        acc
    }
}

fn pow_usize(r: &BigRational, k: usize) -> BigRational {
    let mut acc = BigRational::one();
    for _ in 0..k {
        acc *= r;
    }
    acc
}

fn sign_variations(seq: &[UPoly], x: &BigRational) -> usize {
    let mut count = 0;
    let mut last: Option<bool> = None;
    for p in seq {
        let v = p.eval(x);
        if v.is_zero() {
            continue;
        }
        let pos = v.is_positive();
        if last.is_some_and(|l| l != pos) {
            count += 1;
        }
        last = Some(pos);
    }
    count
}

impl fmt::Display for UPoly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut first = true;
        for (i, c) in self.coeffs.iter().enumerate().rev() {
            if c.is_zero() {
                continue;
            }
            if !first {
                write!(f, " + ")?;
            }
            first = false;
            match i {
                0 => write!(f, "{c}")?,
                1 => write!(f, "{c}*x")?,
                _ => write!(f, "{c}*x^{i}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::{rat, rat2};

    #[test]
    fn test_div_rem() {
        // (x^3 - 1) = (x - 1)(x^2 + x + 1)
        let p = UPoly::from_ints(&[-1, 0, 0, 1]);
        let d = UPoly::from_ints(&[-1, 1]);
        let (q, r) = p.div_rem(&d).unwrap();
        assert_eq!(q, UPoly::from_ints(&[1, 1, 1]));
        assert!(r.is_zero());
    }

    #[test]
    fn test_square_free() {
        // (x - 1)^2 (x + 2)
        let p = UPoly::from_ints(&[-1, 1]).mul(&UPoly::from_ints(&[-1, 1]));
        let p = p.mul(&UPoly::from_ints(&[2, 1]));
        let sf = p.square_free().primitive();
        assert_eq!(sf, UPoly::from_ints(&[-2, 1, 1]));
    }

    #[test]
    fn test_sturm_counts_roots() {
        // x^2 - 2 has roots at +-1.414...
        let p = UPoly::from_ints(&[-2, 0, 1]);
        let s = p.sturm_sequence();
        assert_eq!(UPoly::count_roots(&s, &rat(-2), &rat(2)), 2);
        assert_eq!(UPoly::count_roots(&s, &rat(0), &rat(2)), 1);
        assert_eq!(UPoly::count_roots(&s, &rat2(3, 2), &rat(2)), 0);
    }

    #[test]
    fn test_resultant_detects_common_root() {
        let a = UPoly::from_ints(&[-2, 1]);
        let b = UPoly::from_ints(&[-4, 0, 1]);
        assert!(UPoly::resultant(&a, &b).is_zero());
        let c = UPoly::from_ints(&[-3, 1]);
        // Res(x - 3, x^2 - 4) = 3^2 - 4
        assert_eq!(UPoly::resultant(&c, &b), rat(5));
    }

    #[test]
    fn test_interpolate() {
        let p = UPoly::from_ints(&[1, -2, 3]);
        let xs: Vec<_> = (0..3).map(rat).collect();
        let ys: Vec<_> = xs.iter().map(|x| p.eval(x)).collect();
        assert_eq!(UPoly::interpolate(&xs, &ys), p);
    }

    #[test]
    fn test_compose_and_reverse() {
        let p = UPoly::from_ints(&[-2, 0, 1]);
        // p(x + 1) = x^2 + 2x - 1
        assert_eq!(
            p.compose_linear(&rat(1), &rat(1)),
            UPoly::from_ints(&[-1, 2, 1])
        );
        assert_eq!(p.reverse(), UPoly::from_ints(&[1, 0, -2]));
        assert_eq!(p.substitute_power(2), UPoly::from_ints(&[-2, 0, 0, 0, 1]));
    }
}
