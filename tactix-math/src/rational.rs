//! Rational and integer helpers.
//!
//! Integer division follows SMT-LIB: `div`/`mod` are Euclidean, so the
//! remainder is always in `[0, |b|)` and `a = b * div(a, b) + mod(a, b)`.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Rational from a machine integer.
pub fn rat(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

/// Rational `n/d` from machine integers.
///
/// `d` must be non-zero.
pub fn rat2(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

/// Largest integer not greater than `r`.
pub fn floor(r: &BigRational) -> BigInt {
    r.floor().to_integer()
}

/// Smallest integer not less than `r`.
pub fn ceil(r: &BigRational) -> BigInt {
    r.ceil().to_integer()
}

/// Euclidean quotient. Returns `None` for a zero divisor.
pub fn div_euclid(a: &BigInt, b: &BigInt) -> Option<BigInt> {
    let m = mod_euclid(a, b)?;
    Some((a - m) / b)
}

/// Euclidean remainder, always non-negative. Returns `None` for a zero divisor.
pub fn mod_euclid(a: &BigInt, b: &BigInt) -> Option<BigInt> {
    if b.is_zero() {
        return None;
    }
    Some(a.mod_floor(&b.abs()))
}

/// `rem` as defined by the arithmetic theory: the remainder carries the sign
/// of the divisor, `rem(a, b) = sign(b) * mod(a, b)`.
pub fn rem_signed(a: &BigInt, b: &BigInt) -> Option<BigInt> {
    let m = mod_euclid(a, b)?;
    Some(if b.is_negative() { -m } else { m })
}

/// Gcd of the absolute values of a sequence of integers (zero for an empty one).
pub fn gcd_all<'a>(values: impl IntoIterator<Item = &'a BigInt>) -> BigInt {
    let mut g = BigInt::zero();
    for v in values {
        g = g.gcd(v);
        if g.is_one() {
            break;
        }
    }
    g
}

/// Exact k-th root of an integer, if it exists.
///
/// Negative radicands only have (odd) roots when `k` is odd.
pub fn integer_root(n: &BigInt, k: u32) -> Option<BigInt> {
    if k == 0 {
        return None;
    }
    if n.is_negative() {
        if k % 2 == 0 {
            return None;
        }
        return integer_root(&-n, k).map(|r| -r);
    }
    let r = n.nth_root(k);
    if &r.pow(k) == n { Some(r) } else { None }
}

/// Exact k-th root of a rational, if it is itself rational.
pub fn rational_root(r: &BigRational, k: u32) -> Option<BigRational> {
    let n = integer_root(r.numer(), k)?;
    let d = integer_root(r.denom(), k)?;
    Some(BigRational::new(n, d))
}

/// `r^e` for an integer exponent. `None` when `r` is zero and `e` negative.
pub fn pow_int(r: &BigRational, e: i64) -> Option<BigRational> {
    let k = u32::try_from(e.unsigned_abs()).ok()?;
    let p = BigRational::new(r.numer().pow(k), r.denom().pow(k));
    if e < 0 {
        if p.is_zero() {
            return None;
        }
        Some(p.recip())
    } else {
        Some(p)
    }
}

/// The rational with the smallest denominator in the closed interval `[lo, hi]`.
///
/// Ties on the denominator go to the value of least magnitude; the result is
/// the Stern-Brocot simplest element of the interval.
pub fn simplest_between(lo: &BigRational, hi: &BigRational) -> BigRational {
    debug_assert!(lo <= hi);
    if !lo.is_positive() && !hi.is_negative() {
        return BigRational::zero();
    }
    if hi.is_negative() {
        return -simplest_between(&-hi, &-lo);
    }
    let fl = lo.floor();
    if &fl == lo {
        return fl;
    }
    let next = &fl + BigRational::one();
    if &next <= hi {
        return next;
    }
    let inner = simplest_between(&(hi - &fl).recip(), &(lo - &fl).recip());
    fl + inner.recip()
}

/// Whether `r` is an integer.
pub fn is_integral(r: &BigRational) -> bool {
    r.is_integer()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_division() {
        let cases = [(7, 2, 3, 1), (-7, 2, -4, 1), (7, -2, -3, 1), (-7, -2, 4, 1)];
        for (a, b, q, m) in cases {
            let (a, b) = (BigInt::from(a), BigInt::from(b));
            assert_eq!(div_euclid(&a, &b), Some(BigInt::from(q)));
            assert_eq!(mod_euclid(&a, &b), Some(BigInt::from(m)));
        }
        assert_eq!(div_euclid(&BigInt::from(3), &BigInt::zero()), None);
    }

    #[test]
    fn test_rem_sign_follows_divisor() {
        assert_eq!(
            rem_signed(&BigInt::from(7), &BigInt::from(-2)),
            Some(BigInt::from(-1))
        );
        assert_eq!(
            rem_signed(&BigInt::from(-7), &BigInt::from(2)),
            Some(BigInt::from(1))
        );
    }

    #[test]
    fn test_roots() {
        assert_eq!(integer_root(&BigInt::from(-8), 3), Some(BigInt::from(-2)));
        assert_eq!(integer_root(&BigInt::from(-8), 2), None);
        assert_eq!(integer_root(&BigInt::from(10), 2), None);
        assert_eq!(rational_root(&rat2(4, 9), 2), Some(rat2(2, 3)));
    }

    #[test]
    fn test_pow_int() {
        assert_eq!(pow_int(&rat(2), 10), Some(rat(1024)));
        assert_eq!(pow_int(&rat(2), -2), Some(rat2(1, 4)));
        assert_eq!(pow_int(&rat(0), -1), None);
    }

    #[test]
    fn test_simplest_between() {
        assert_eq!(simplest_between(&rat2(1, 3), &rat2(1, 2)), rat2(1, 2));
        assert_eq!(simplest_between(&rat2(13, 10), &rat2(14, 10)), rat2(4, 3));
        assert_eq!(simplest_between(&rat(-3), &rat(5)), rat(0));
        assert_eq!(simplest_between(&rat2(-7, 5), &rat2(-13, 10)), rat2(-4, 3));
        assert_eq!(simplest_between(&rat(2), &rat(2)), rat(2));
    }

    #[test]
    fn test_floor_ceil() {
        assert_eq!(floor(&rat2(-5, 2)), BigInt::from(-3));
        assert_eq!(ceil(&rat2(-5, 2)), BigInt::from(-2));
        assert_eq!(floor(&rat2(5, 2)), BigInt::from(2));
    }
}
