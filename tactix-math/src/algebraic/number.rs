//! Irrational real algebraic numbers and the [`Numeral`] sum type.

use crate::interval::Interval;
use crate::polynomial::UPoly;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An irrational real algebraic number.
///
/// Represented by a square-free primitive integer polynomial `p` with
/// `p(0) != 0`, the index of the root among the real roots of `p` in
/// increasing order, and an isolating interval `[lo, hi]` such that the
/// number is the only root of `p` in it and neither endpoint is a root.
///
/// Equality and hashing use `(p, root index)` only; the interval is a
/// refinable cache.
#[derive(Debug, Clone)]
pub struct AlgebraicNumber {
    poly: UPoly,
    root_index: usize,
    interval: Interval,
}

impl AlgebraicNumber {
    /// Assemble from an already-validated representation.
    pub(crate) fn from_parts(poly: UPoly, root_index: usize, interval: Interval) -> Self {
        debug_assert!(!poly.eval(interval.lo()).is_zero());
        debug_assert!(!poly.eval(interval.hi()).is_zero());
        Self {
            poly,
            root_index,
            interval,
        }
    }

    /// Defining polynomial.
    pub fn polynomial(&self) -> &UPoly {
        &self.poly
    }

    /// Zero-based index among the real roots of [`Self::polynomial`].
    pub fn root_index(&self) -> usize {
        self.root_index
    }

    /// Current isolating interval.
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Degree of the defining polynomial.
    pub fn degree(&self) -> usize {
        self.poly.degree()
    }

    /// Halve the isolating interval.
    pub fn refine(&mut self) {
        let mid = self.interval.midpoint();
        let s_mid = self.poly.sign_at(&mid);
        debug_assert_ne!(s_mid, Ordering::Equal, "irrational root hit a rational midpoint");
        if self.poly.sign_at(self.interval.lo()) == s_mid {
            self.interval.set_lo(mid);
        } else {
            self.interval.set_hi(mid);
        }
    }

    /// Refine until the interval is narrower than `width`.
    pub fn refine_below(&mut self, width: &BigRational) {
        while &self.interval.width() >= width {
            self.refine();
        }
    }

    /// Sign of the number; never zero.
    pub fn sign(&mut self) -> Ordering {
        while self.interval.contains_zero() {
            self.refine();
        }
        if self.interval.lo().is_positive() {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    }

    /// Floating-point approximation of the midpoint.
    pub fn to_f64(&self) -> f64 {
        self.interval.midpoint().to_f64().unwrap_or(f64::NAN)
    }
}

impl PartialEq for AlgebraicNumber {
    fn eq(&self, other: &Self) -> bool {
        self.root_index == other.root_index && self.poly == other.poly
    }
}

impl Eq for AlgebraicNumber {}

impl Hash for AlgebraicNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.poly.hash(state);
        self.root_index.hash(state);
    }
}

impl fmt::Display for AlgebraicNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(root-obj ({}) {})", self.poly, self.root_index + 1)
    }
}

/// A real numeral: exact rational or irrational algebraic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Numeral {
    /// Exact rational value.
    Rational(BigRational),
    /// Irrational algebraic value.
    Irrational(AlgebraicNumber),
}

impl Numeral {
    /// Whether the value is rational.
    pub fn is_rational(&self) -> bool {
        matches!(self, Numeral::Rational(_))
    }

    /// The rational value, if any.
    pub fn as_rational(&self) -> Option<&BigRational> {
        match self {
            Numeral::Rational(r) => Some(r),
            Numeral::Irrational(_) => None,
        }
    }

    /// Whether the value is zero.
    pub fn is_zero(&self) -> bool {
        matches!(self, Numeral::Rational(r) if r.is_zero())
    }

    /// Enclosing interval (a point for rationals).
    pub fn interval(&self) -> Interval {
        match self {
            Numeral::Rational(r) => Interval::point(r.clone()),
            Numeral::Irrational(a) => a.interval().clone(),
        }
    }

    /// Refine the enclosing interval; no-op for rationals.
    pub fn refine(&mut self) {
        if let Numeral::Irrational(a) = self {
            a.refine();
        }
    }
}

impl From<BigRational> for Numeral {
    fn from(r: BigRational) -> Self {
        Numeral::Rational(r)
    }
}

impl From<AlgebraicNumber> for Numeral {
    fn from(a: AlgebraicNumber) -> Self {
        Numeral::Irrational(a)
    }
}

impl fmt::Display for Numeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeral::Rational(r) => write!(f, "{r}"),
            Numeral::Irrational(a) => write!(f, "{a}"),
        }
    }
}
