//! Degree-capped arithmetic over [`Numeral`]s.

use super::isolate::{RootFilter, bisect, isolate_roots, rational_detection_width, roots_below};
use super::number::{AlgebraicNumber, Numeral};
use super::{AlgebraicConfig, AlgebraicError, Result};
use crate::interval::Interval;
use crate::polynomial::UPoly;
use crate::rational::{floor, pow_int, rational_root, simplest_between};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::cmp::Ordering;

/// Statistics for algebraic number operations.
#[derive(Debug, Clone, Default)]
pub struct AlgebraicStats {
    /// Resultant polynomials computed.
    pub resultants: u64,
    /// Root isolations performed.
    pub isolations: u64,
    /// Root selection refinement rounds.
    pub refinements: u64,
    /// Irrational comparisons.
    pub comparisons: u64,
}

/// Arithmetic on real algebraic numbers with a bounded degree.
#[derive(Debug, Clone, Default)]
pub struct AlgebraicManager {
    config: AlgebraicConfig,
    stats: AlgebraicStats,
}

impl AlgebraicManager {
    /// Create a manager with the given configuration.
    pub fn new(config: AlgebraicConfig) -> Self {
        Self {
            config,
            stats: AlgebraicStats::default(),
        }
    }

    /// Create a manager with a specific degree cap.
    pub fn with_max_degree(max_degree: usize) -> Self {
        Self::new(AlgebraicConfig {
            max_degree,
            ..AlgebraicConfig::default()
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &AlgebraicConfig {
        &self.config
    }

    /// Change the degree cap.
    pub fn set_max_degree(&mut self, max_degree: usize) {
        self.config.max_degree = max_degree;
    }

    /// Statistics.
    pub fn stats(&self) -> &AlgebraicStats {
        &self.stats
    }

    /// Reset statistics.
    pub fn reset_stats(&mut self) {
        self.stats = AlgebraicStats::default();
    }

    /// `-a`.
    pub fn neg(&mut self, a: &Numeral) -> Numeral {
        match a {
            Numeral::Rational(r) => Numeral::Rational(-r),
            Numeral::Irrational(x) => {
                let p = x.polynomial().reflect().primitive();
                let iv = x.interval().neg();
                let idx = roots_below(&p, iv.lo());
                Numeral::Irrational(AlgebraicNumber::from_parts(p, idx, iv))
            }
        }
    }

    /// `a + b`.
    pub fn add(&mut self, a: &Numeral, b: &Numeral) -> Result<Numeral> {
        match (a, b) {
            (Numeral::Rational(r), Numeral::Rational(s)) => Ok(Numeral::Rational(r + s)),
            (Numeral::Rational(r), Numeral::Irrational(x))
            | (Numeral::Irrational(x), Numeral::Rational(r)) => Ok(self.shift(x, r)),
            (Numeral::Irrational(x), Numeral::Irrational(y)) => {
                let (p, q) = (x.polynomial(), y.polynomial());
                let bound = self.check_degree(p.degree() * q.degree())?;
                let res = self.compose_resultant(p, bound, |xi| {
                    q.compose_linear(&-BigRational::one(), xi)
                });
                let mut filter = SumFilter {
                    a: a.clone(),
                    b: b.clone(),
                };
                self.select_root(res, &mut filter)
            }
        }
    }

    /// `a - b`.
    pub fn sub(&mut self, a: &Numeral, b: &Numeral) -> Result<Numeral> {
        let nb = self.neg(b);
        self.add(a, &nb)
    }

    /// `a * b`.
    pub fn mul(&mut self, a: &Numeral, b: &Numeral) -> Result<Numeral> {
        if a.is_zero() || b.is_zero() {
            return Ok(Numeral::Rational(BigRational::zero()));
        }
        match (a, b) {
            (Numeral::Rational(r), Numeral::Rational(s)) => Ok(Numeral::Rational(r * s)),
            (Numeral::Rational(r), Numeral::Irrational(x))
            | (Numeral::Irrational(x), Numeral::Rational(r)) => Ok(self.scale(x, r)),
            (Numeral::Irrational(x), Numeral::Irrational(y)) => {
                let (p, q) = (x.polynomial(), y.polynomial());
                let bound = self.check_degree(p.degree() * q.degree())?;
                let dq = q.degree();
                let res = self.compose_resultant(p, bound, |xi| {
                    // y^dq * q(xi / y)
                    let mut coeffs = vec![BigRational::zero(); dq + 1];
                    let mut xi_pow = BigRational::one();
                    for (j, c) in q.coeffs().iter().enumerate() {
                        coeffs[dq - j] = c * &xi_pow;
                        xi_pow *= xi;
                    }
                    UPoly::from_coeffs(coeffs)
                });
                let mut filter = ProductFilter {
                    a: a.clone(),
                    b: b.clone(),
                };
                self.select_root(res, &mut filter)
            }
        }
    }

    /// `1 / a`.
    pub fn inv(&mut self, a: &Numeral) -> Result<Numeral> {
        match a {
            Numeral::Rational(r) if r.is_zero() => Err(AlgebraicError::DivisionByZero),
            Numeral::Rational(r) => Ok(Numeral::Rational(r.recip())),
            Numeral::Irrational(x) => {
                let mut x = x.clone();
                x.sign();
                let p = x.polynomial().reverse().primitive();
                let iv = x
                    .interval()
                    .recip()
                    .ok_or(AlgebraicError::DivisionByZero)?;
                let idx = roots_below(&p, iv.lo());
                Ok(Numeral::Irrational(AlgebraicNumber::from_parts(p, idx, iv)))
            }
        }
    }

    /// `a / b`.
    pub fn div(&mut self, a: &Numeral, b: &Numeral) -> Result<Numeral> {
        let ib = self.inv(b)?;
        self.mul(a, &ib)
    }

    /// `a^k`.
    pub fn power(&mut self, a: &Numeral, k: u32) -> Result<Numeral> {
        match (a, k) {
            (_, 0) => Ok(Numeral::Rational(BigRational::one())),
            (_, 1) => Ok(a.clone()),
            (Numeral::Rational(r), _) => pow_int(r, i64::from(k))
                .map(Numeral::Rational)
                .ok_or(AlgebraicError::DivisionByZero),
            (Numeral::Irrational(x), _) => {
                let p = x.polynomial();
                let bound = self.check_degree(p.degree())?;
                let res = self.compose_resultant(p, bound, |xi| {
                    UPoly::constant(xi.clone()).sub(&UPoly::monomial(BigRational::one(), k as usize))
                });
                let mut filter = PowerFilter {
                    base: a.clone(),
                    k,
                };
                self.select_root(res, &mut filter)
            }
        }
    }

    /// Principal real `k`-th root of `a`.
    ///
    /// Even roots of negative numbers have no real value.
    pub fn root(&mut self, a: &Numeral, k: u32) -> Result<Numeral> {
        if k == 0 {
            return Err(AlgebraicError::DivisionByZero);
        }
        if k == 1 || a.is_zero() {
            return Ok(a.clone());
        }
        if k % 2 == 0 && self.sign(a) == Ordering::Less {
            return Err(AlgebraicError::NoRealRoot);
        }
        let q = match a {
            Numeral::Rational(r) => {
                if let Some(exact) = rational_root(r, k) {
                    return Ok(Numeral::Rational(exact));
                }
                self.check_degree(k as usize)?;
                UPoly::monomial(BigRational::one(), k as usize).sub(&UPoly::constant(r.clone()))
            }
            Numeral::Irrational(x) => {
                self.check_degree(x.degree() * k as usize)?;
                x.polynomial().substitute_power(k as usize)
            }
        };
        let mut filter = RootOfFilter {
            base: a.clone(),
            k,
        };
        self.select_root(q, &mut filter)
    }

    /// Exact comparison.
    pub fn compare(&mut self, a: &Numeral, b: &Numeral) -> Result<Ordering> {
        match (a, b) {
            (Numeral::Rational(r), Numeral::Rational(s)) => Ok(r.cmp(s)),
            (Numeral::Irrational(x), Numeral::Rational(r)) => self.compare_rational(x, r),
            (Numeral::Rational(r), Numeral::Irrational(x)) => {
                Ok(self.compare_rational(x, r)?.reverse())
            }
            (Numeral::Irrational(x), Numeral::Irrational(y)) => self.compare_irrational(x, y),
        }
    }

    /// Sign as an ordering against zero.
    pub fn sign(&self, a: &Numeral) -> Ordering {
        match a {
            Numeral::Rational(r) => r.cmp(&BigRational::zero()),
            Numeral::Irrational(x) => x.clone().sign(),
        }
    }

    /// Largest integer not greater than `a`.
    pub fn floor(&mut self, a: &Numeral) -> Result<BigInt> {
        match a {
            Numeral::Rational(r) => Ok(floor(r)),
            Numeral::Irrational(x) => {
                let mut x = x.clone();
                for _ in 0..self.config.max_refinements {
                    let lo = floor(x.interval().lo());
                    if lo == floor(x.interval().hi()) {
                        return Ok(lo);
                    }
                    x.refine();
                }
                Err(AlgebraicError::RefinementLimit(self.config.max_refinements))
            }
        }
    }

    /// Whether `a` is an integer.
    pub fn is_int(&self, a: &Numeral) -> bool {
        matches!(a, Numeral::Rational(r) if r.is_integer())
    }

    fn check_degree(&self, degree: usize) -> Result<usize> {
        if degree > self.config.max_degree {
            tracing::trace!(degree, max = self.config.max_degree, "algebraic degree cap hit");
            return Err(AlgebraicError::DegreeExceeded {
                degree,
                max: self.config.max_degree,
            });
        }
        Ok(degree)
    }

    fn shift(&mut self, x: &AlgebraicNumber, r: &BigRational) -> Numeral {
        let p = x
            .polynomial()
            .compose_linear(&BigRational::one(), &-r)
            .primitive();
        let iv = x.interval().add(&Interval::point(r.clone()));
        Numeral::Irrational(AlgebraicNumber::from_parts(p, x.root_index(), iv))
    }

    fn scale(&mut self, x: &AlgebraicNumber, r: &BigRational) -> Numeral {
        let p = x
            .polynomial()
            .compose_linear(&r.recip(), &BigRational::zero())
            .primitive();
        let iv = x.interval().mul(&Interval::point(r.clone()));
        let idx = if r.is_positive() {
            x.root_index()
        } else {
            roots_below(&p, iv.lo())
        };
        Numeral::Irrational(AlgebraicNumber::from_parts(p, idx, iv))
    }

    /// `Res_y(p(y), g_x(y))` as a polynomial in `x`, by evaluation at
    /// `degree_bound + 1` points and interpolation.
    fn compose_resultant(
        &mut self,
        p: &UPoly,
        degree_bound: usize,
        specialize: impl Fn(&BigRational) -> UPoly,
    ) -> UPoly {
        self.stats.resultants += 1;
        let xs: Vec<BigRational> = (0..=degree_bound)
            .map(|i| BigRational::from_integer(BigInt::from(i)))
            .collect();
        let ys: Vec<BigRational> = xs
            .iter()
            .map(|xi| UPoly::resultant(p, &specialize(xi)))
            .collect();
        UPoly::interpolate(&xs, &ys)
    }

    fn select_root(&mut self, q: UPoly, filter: &mut dyn RootFilter) -> Result<Numeral> {
        let q = q.square_free().primitive();
        self.check_degree(q.degree())?;
        self.stats.isolations += 1;
        let mut candidates = isolate_roots(&q);
        for _ in 0..self.config.max_refinements {
            candidates.retain(|c| filter.admits(c));
            match candidates.len() {
                0 => return Err(AlgebraicError::NoRealRoot),
                1 => {
                    let iv = candidates.swap_remove(0);
                    return Ok(self.finish(q, iv));
                }
                _ => {}
            }
            for c in &mut candidates {
                bisect(&q, c);
            }
            filter.refine();
            self.stats.refinements += 1;
        }
        Err(AlgebraicError::RefinementLimit(self.config.max_refinements))
    }

    /// Turn the selected isolating interval into a numeral, detecting
    /// rational roots exactly.
    fn finish(&mut self, q: UPoly, mut iv: Interval) -> Numeral {
        let width = match q.leading_coeff() {
            Some(lc) => rational_detection_width(lc),
            None => BigRational::one(),
        };
        while !iv.is_point() && iv.width() >= width {
            bisect(&q, &mut iv);
        }
        if iv.is_point() {
            return Numeral::Rational(iv.lo().clone());
        }
        let s = simplest_between(iv.lo(), iv.hi());
        if q.eval(&s).is_zero() {
            return Numeral::Rational(s);
        }
        let p = q.strip_zero_roots();
        let idx = roots_below(&p, iv.lo());
        Numeral::Irrational(AlgebraicNumber::from_parts(p, idx, iv))
    }

    fn compare_rational(&mut self, x: &AlgebraicNumber, r: &BigRational) -> Result<Ordering> {
        let mut x = x.clone();
        for _ in 0..self.config.max_refinements {
            if r < x.interval().lo() {
                return Ok(Ordering::Greater);
            }
            if r > x.interval().hi() {
                return Ok(Ordering::Less);
            }
            x.refine();
        }
        Err(AlgebraicError::RefinementLimit(self.config.max_refinements))
    }

    fn compare_irrational(&mut self, x: &AlgebraicNumber, y: &AlgebraicNumber) -> Result<Ordering> {
        if x == y {
            return Ok(Ordering::Equal);
        }
        self.stats.comparisons += 1;
        let mut x = x.clone();
        let mut y = y.clone();
        let g = x.polynomial().gcd(y.polynomial());
        let g_sturm = g.sturm_sequence();
        let root_of_g = |n: &AlgebraicNumber| {
            UPoly::count_roots(&g_sturm, n.interval().lo(), n.interval().hi()) == 1
        };
        let shared = !g.is_constant() && root_of_g(&x) && root_of_g(&y);
        for _ in 0..self.config.max_refinements {
            if x.interval().hi() < y.interval().lo() {
                return Ok(Ordering::Less);
            }
            if y.interval().hi() < x.interval().lo() {
                return Ok(Ordering::Greater);
            }
            if shared {
                let h = x.interval().hull(y.interval());
                if UPoly::count_roots(&g_sturm, h.lo(), h.hi()) == 1 {
                    return Ok(Ordering::Equal);
                }
            }
            x.refine();
            y.refine();
        }
        Err(AlgebraicError::RefinementLimit(self.config.max_refinements))
    }
}

struct SumFilter {
    a: Numeral,
    b: Numeral,
}

impl RootFilter for SumFilter {
    fn admits(&self, candidate: &Interval) -> bool {
        candidate.overlaps(&self.a.interval().add(&self.b.interval()))
    }

    fn refine(&mut self) {
        self.a.refine();
        self.b.refine();
    }
}

struct ProductFilter {
    a: Numeral,
    b: Numeral,
}

impl RootFilter for ProductFilter {
    fn admits(&self, candidate: &Interval) -> bool {
        candidate.overlaps(&self.a.interval().mul(&self.b.interval()))
    }

    fn refine(&mut self) {
        self.a.refine();
        self.b.refine();
    }
}

struct PowerFilter {
    base: Numeral,
    k: u32,
}

impl RootFilter for PowerFilter {
    fn admits(&self, candidate: &Interval) -> bool {
        candidate.overlaps(&self.base.interval().pow(self.k))
    }

    fn refine(&mut self) {
        self.base.refine();
    }
}

struct RootOfFilter {
    base: Numeral,
    k: u32,
}

impl RootFilter for RootOfFilter {
    fn admits(&self, candidate: &Interval) -> bool {
        // even roots are principal (non-negative)
        (self.k % 2 == 1 || candidate.hi().is_positive())
            && candidate.pow(self.k).overlaps(&self.base.interval())
    }

    fn refine(&mut self) {
        self.base.refine();
    }
}
