//! Property-based tests for the tactix-math numeral domain
//!
//! Run with: cargo test -p tactix-math --test property_based

use num_bigint::BigInt;
use num_rational::BigRational;
use proptest::prelude::*;
use std::cmp::Ordering;
use tactix_math::rational::{div_euclid, integer_root, mod_euclid, pow_int, rem_signed};
use tactix_math::{AlgebraicManager, Numeral, UPoly};

fn small_poly() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-9i64..=9, 1..6)
}

proptest! {
    /// `a = b * (a div b) + (a mod b)` with `0 <= a mod b < |b|`.
    #[test]
    fn euclidean_division(a in -1000i64..=1000, b in -50i64..=50) {
        prop_assume!(b != 0);
        let (a, b) = (BigInt::from(a), BigInt::from(b));
        let q = div_euclid(&a, &b).unwrap();
        let r = mod_euclid(&a, &b).unwrap();
        prop_assert_eq!(&b * &q + &r, a.clone());
        prop_assert!(r >= BigInt::from(0));
        prop_assert!(r < BigInt::from(b.magnitude().clone()));
        let rem = rem_signed(&a, &b).unwrap();
        prop_assert_eq!(rem.magnitude(), r.magnitude());
    }

    /// Exact roots invert powers, including odd roots of negatives.
    #[test]
    fn integer_roots_invert_powers(n in -40i64..=40, k in 1u32..=5) {
        let base = BigInt::from(n);
        let p = base.pow(k);
        let root = integer_root(&p, k);
        if k % 2 == 0 {
            prop_assert_eq!(root, Some(BigInt::from(n.abs())));
        } else {
            prop_assert_eq!(root, Some(base));
        }
    }

    /// Negative exponents are reciprocals.
    #[test]
    fn pow_int_reciprocal(n in 1i64..=20, d in 1i64..=20, e in 0i64..=6) {
        let r = BigRational::new(n.into(), d.into());
        let pos = pow_int(&r, e).unwrap();
        let neg = pow_int(&r, -e).unwrap();
        prop_assert_eq!(pos * neg, BigRational::from_integer(1.into()));
    }

    /// Division with remainder reconstructs the dividend.
    #[test]
    fn poly_div_rem(a in small_poly(), b in small_poly()) {
        let a = UPoly::from_ints(&a);
        let b = UPoly::from_ints(&b);
        prop_assume!(!b.is_zero());
        let (q, r) = a.div_rem(&b).unwrap();
        prop_assert_eq!(q.mul(&b).add(&r), a);
        prop_assert!(r.is_zero() || r.degree() < b.degree());
    }

    /// The gcd divides both arguments.
    #[test]
    fn poly_gcd_divides(a in small_poly(), b in small_poly()) {
        let a = UPoly::from_ints(&a);
        let b = UPoly::from_ints(&b);
        prop_assume!(!a.is_zero() && !b.is_zero());
        let g = a.gcd(&b);
        prop_assert!(a.rem(&g).is_zero());
        prop_assert!(b.rem(&g).is_zero());
    }

    /// Square roots are monotone and exact on perfect squares.
    #[test]
    fn sqrt_monotone(a in 1i64..=60, b in 1i64..=60) {
        let mut am = AlgebraicManager::default();
        let na = Numeral::from(BigRational::from_integer(a.into()));
        let nb = Numeral::from(BigRational::from_integer(b.into()));
        let ra = am.root(&na, 2).unwrap();
        let rb = am.root(&nb, 2).unwrap();
        prop_assert_eq!(am.compare(&ra, &rb).unwrap(), a.cmp(&b));

        let sq = Numeral::from(BigRational::from_integer((a * a).into()));
        let root = am.root(&sq, 2).unwrap();
        prop_assert_eq!(root.as_rational(), Some(&BigRational::from_integer(a.into())));
        prop_assert_eq!(am.compare(&root, &na).unwrap(), Ordering::Equal);
    }
}
