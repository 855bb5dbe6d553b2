//! Real root isolation and root selection.

use crate::interval::Interval;
use crate::polynomial::UPoly;
use num_rational::BigRational;
use num_traits::{One, Zero};
use std::cmp::Ordering;

/// Isolate the distinct real roots of a square-free polynomial.
///
/// Returns intervals sorted by position. A point interval is an exact
/// rational root; every other interval contains exactly one root and has
/// non-root endpoints.
pub(crate) fn isolate_roots(p: &UPoly) -> Vec<Interval> {
    if p.is_constant() {
        return Vec::new();
    }
    let sturm = p.sturm_sequence();
    let bound = p.root_bound();
    let mut out = Vec::new();
    let mut stack = vec![(-bound.clone(), bound)];
    let two = BigRational::from_integer(2.into());
    let four = BigRational::from_integer(4.into());

    while let Some((lo, hi)) = stack.pop() {
        match UPoly::count_roots(&sturm, &lo, &hi) {
            0 => {}
            1 => {
                if p.eval(&hi).is_zero() {
                    out.push(Interval::point(hi));
                } else {
                    out.push(Interval::new(lo, hi));
                }
            }
            _ => {
                let mid = (&lo + &hi) / &two;
                if !p.eval(&mid).is_zero() {
                    stack.push((mid.clone(), hi));
                    stack.push((lo, mid));
                    continue;
                }
                // gap around the rational root so neither side starts on it
                let mut eps = (&hi - &lo) / &four;
                loop {
                    let left = &mid - &eps;
                    let right = &mid + &eps;
                    if UPoly::count_roots(&sturm, &left, &right) == 1
                        && !p.eval(&left).is_zero()
                        && !p.eval(&right).is_zero()
                    {
                        break;
                    }
                    eps = eps / &two;
                }
                out.push(Interval::point(mid.clone()));
                stack.push((&mid + &eps, hi));
                stack.push((lo, &mid - &eps));
            }
        }
    }
    out.sort_by(|a, b| a.lo().cmp(b.lo()));
    out
}

/// Halve a candidate interval that isolates one root of `p`.
///
/// Collapses to a point when the midpoint is the root.
pub(crate) fn bisect(p: &UPoly, iv: &mut Interval) {
    if iv.is_point() {
        return;
    }
    let mid = iv.midpoint();
    let s_mid = p.sign_at(&mid);
    if s_mid == Ordering::Equal {
        *iv = Interval::point(mid);
    } else if p.sign_at(iv.lo()) == s_mid {
        iv.set_lo(mid);
    } else {
        iv.set_hi(mid);
    }
}

/// Number of real roots of `p` strictly below `x`, for `x` not a root.
pub(crate) fn roots_below(p: &UPoly, x: &BigRational) -> usize {
    let sturm = p.sturm_sequence();
    let bound = p.root_bound();
    UPoly::count_roots(&sturm, &-bound, x)
}

/// Predicate used to pick the root that equals some derived quantity.
///
/// `admits` must hold for the candidate containing the true value at every
/// refinement level; `refine` tightens whatever enclosure the filter uses.
pub(crate) trait RootFilter {
    fn admits(&self, candidate: &Interval) -> bool;
    fn refine(&mut self);
}

/// Width below which the simplest rational in an isolating interval of a
/// primitive integer polynomial with leading coefficient `lc` must be the
/// root, if that root is rational.
pub(crate) fn rational_detection_width(lc: &BigRational) -> BigRational {
    let lc2 = lc * lc;
    if lc2.is_zero() {
        BigRational::one()
    } else {
        lc2.recip()
    }
}
