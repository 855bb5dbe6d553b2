//! Closed rational intervals with exact endpoint arithmetic.

use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::fmt;

/// A closed interval `[lo, hi]` with rational endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    lo: BigRational,
    hi: BigRational,
}

impl Interval {
    /// Create an interval; the endpoints are swapped if given out of order.
    pub fn new(lo: BigRational, hi: BigRational) -> Self {
        if lo <= hi {
            Self { lo, hi }
        } else {
            Self { lo: hi, hi: lo }
        }
    }

    /// Degenerate interval `[v, v]`.
    pub fn point(v: BigRational) -> Self {
        Self {
            lo: v.clone(),
            hi: v,
        }
    }

    /// Lower endpoint.
    pub fn lo(&self) -> &BigRational {
        &self.lo
    }

    /// Upper endpoint.
    pub fn hi(&self) -> &BigRational {
        &self.hi
    }

    /// Width `hi - lo`.
    pub fn width(&self) -> BigRational {
        &self.hi - &self.lo
    }

    /// Midpoint.
    pub fn midpoint(&self) -> BigRational {
        (&self.lo + &self.hi) / BigRational::from_integer(2.into())
    }

    /// Whether the interval is a single point.
    pub fn is_point(&self) -> bool {
        self.lo == self.hi
    }

    /// Whether `v` lies in the closed interval.
    pub fn contains(&self, v: &BigRational) -> bool {
        &self.lo <= v && v <= &self.hi
    }

    /// Whether the interval contains zero.
    pub fn contains_zero(&self) -> bool {
        !self.lo.is_positive() && !self.hi.is_negative()
    }

    /// Whether two closed intervals intersect.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.lo <= other.hi && other.lo <= self.hi
    }

    /// Smallest interval containing both.
    pub fn hull(&self, other: &Interval) -> Interval {
        Interval {
            lo: self.lo.clone().min(other.lo.clone()),
            hi: self.hi.clone().max(other.hi.clone()),
        }
    }

    /// Replace the lower endpoint. Caller keeps `lo <= hi`.
    pub fn set_lo(&mut self, lo: BigRational) {
        debug_assert!(lo <= self.hi);
        self.lo = lo;
    }

    /// Replace the upper endpoint. Caller keeps `lo <= hi`.
    pub fn set_hi(&mut self, hi: BigRational) {
        debug_assert!(self.lo <= hi);
        self.hi = hi;
    }

    /// Interval sum.
    pub fn add(&self, other: &Interval) -> Interval {
        Interval {
            lo: &self.lo + &other.lo,
            hi: &self.hi + &other.hi,
        }
    }

    /// Interval negation.
    pub fn neg(&self) -> Interval {
        Interval {
            lo: -&self.hi,
            hi: -&self.lo,
        }
    }

    /// Interval product.
    pub fn mul(&self, other: &Interval) -> Interval {
        let products = [
            &self.lo * &other.lo,
            &self.lo * &other.hi,
            &self.hi * &other.lo,
            &self.hi * &other.hi,
        ];
        let mut lo = products[0].clone();
        let mut hi = products[0].clone();
        for p in &products[1..] {
            if p < &lo {
                lo = p.clone();
            }
            if p > &hi {
                hi = p.clone();
            }
        }
        Interval { lo, hi }
    }

    /// Interval reciprocal; `None` when zero is inside the interval.
    pub fn recip(&self) -> Option<Interval> {
        if self.contains_zero() {
            return None;
        }
        Some(Interval {
            lo: self.hi.recip(),
            hi: self.lo.recip(),
        })
    }

    /// Image under `x -> x^k`.
    pub fn pow(&self, k: u32) -> Interval {
        if k == 0 {
            return Interval::point(BigRational::one());
        }
        let lo_k = pow_u32(&self.lo, k);
        let hi_k = pow_u32(&self.hi, k);
        if k % 2 == 1 || !self.lo.is_negative() {
            Interval::new(lo_k, hi_k)
        } else if !self.hi.is_positive() {
            Interval::new(hi_k, lo_k)
        } else {
            Interval {
                lo: BigRational::zero(),
                hi: lo_k.max(hi_k),
            }
        }
    }
}

fn pow_u32(r: &BigRational, k: u32) -> BigRational {
    BigRational::new(r.numer().pow(k), r.denom().pow(k))
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::{rat, rat2};

    #[test]
    fn test_mul_mixed_signs() {
        let a = Interval::new(rat(-1), rat(2));
        let b = Interval::new(rat(3), rat(4));
        assert_eq!(a.mul(&b), Interval::new(rat(-4), rat(8)));
    }

    #[test]
    fn test_even_power_across_zero() {
        let a = Interval::new(rat(-3), rat(2));
        assert_eq!(a.pow(2), Interval::new(rat(0), rat(9)));
        assert_eq!(a.pow(3), Interval::new(rat(-27), rat(8)));
    }

    #[test]
    fn test_recip() {
        let a = Interval::new(rat(2), rat(4));
        assert_eq!(a.recip(), Some(Interval::new(rat2(1, 4), rat2(1, 2))));
        assert_eq!(Interval::new(rat(-1), rat(1)).recip(), None);
    }
}
