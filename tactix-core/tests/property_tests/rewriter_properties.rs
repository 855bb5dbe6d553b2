//! Property-based tests for rewriter correctness
//!
//! Rewriting must preserve the value of a formula under every assignment
//! and must reach a fixpoint in one pass.

use num_bigint::BigInt;
use num_rational::BigRational;
use proptest::prelude::*;
use tactix_core::ast::{TermId, TermManager};
use tactix_core::model::Model;
use tactix_core::rewrite::{ArithRewriterConfig, RewriterConfig, ThRewriter};

#[derive(Debug, Clone, Copy)]
enum Cmp {
    Le,
    Ge,
    Eq,
}

fn cmp_strategy() -> impl Strategy<Value = Cmp> {
    prop_oneof![Just(Cmp::Le), Just(Cmp::Ge), Just(Cmp::Eq)]
}

fn mk_cmp(tm: &mut TermManager, cmp: Cmp, a: TermId, b: TermId) -> TermId {
    match cmp {
        Cmp::Le => tm.mk_le(a, b),
        Cmp::Ge => tm.mk_ge(a, b),
        Cmp::Eq => tm.mk_eq(a, b),
    }
}

/// `a*x + c*y <cmp> b` over integers.
fn linear_atom(tm: &mut TermManager, a: i64, c: i64, cmp: Cmp, b: i64) -> (TermId, TermId, TermId) {
    let x = tm.mk_var("x", tm.sorts.int_sort);
    let y = tm.mk_var("y", tm.sorts.int_sort);
    let na = tm.mk_int(a);
    let nc = tm.mk_int(c);
    let nb = tm.mk_int(b);
    let ax = tm.mk_mul([na, x]);
    let cy = tm.mk_mul([nc, y]);
    let lhs = tm.mk_add([ax, cy]);
    (x, y, mk_cmp(tm, cmp, lhs, nb))
}

fn truth(tm: &mut TermManager, f: TermId, assignment: &[(TermId, i64)]) -> Option<bool> {
    let mut m = Model::new();
    for &(v, n) in assignment {
        let value = tm.mk_int(n);
        m.register(v, value);
    }
    let r = m.eval(tm, f, true).ok()?;
    if tm.is_true(r) {
        Some(true)
    } else if tm.is_false(r) {
        Some(false)
    } else {
        None
    }
}

fn gcd_rewriter() -> ThRewriter {
    ThRewriter::new(RewriterConfig {
        arith: ArithRewriterConfig {
            gcd_rounding: true,
            ..ArithRewriterConfig::default()
        },
        ..RewriterConfig::default()
    })
}

#[test]
fn ground_comparison_folds() {
    let mut tm = TermManager::new();
    let two = tm.mk_int(2);
    let three = tm.mk_int(3);
    let le = tm.mk_le(two, three);
    let r = ThRewriter::default().rewrite(&mut tm, le).unwrap();
    assert!(tm.is_true(r));
}

proptest! {
    /// Rewriting `a*x + c*y <cmp> b` keeps its truth value at every point.
    #[test]
    fn linear_atoms_keep_their_value(
        a in -6i64..=6,
        c in -6i64..=6,
        b in -30i64..=30,
        cmp in cmp_strategy(),
        vx in -8i64..=8,
        vy in -8i64..=8,
        gcd in proptest::bool::ANY,
    ) {
        let mut tm = TermManager::new();
        let (x, y, f) = linear_atom(&mut tm, a, c, cmp, b);
        let mut rw = if gcd { gcd_rewriter() } else { ThRewriter::default() };
        let r = rw.rewrite(&mut tm, f).unwrap();
        let point = [(x, vx), (y, vy)];
        let before = truth(&mut tm, f, &point);
        let after = truth(&mut tm, r, &point);
        prop_assert!(before.is_some());
        prop_assert_eq!(before, after);
    }

    /// A rewritten term is its own normal form.
    #[test]
    fn rewriting_is_idempotent(
        a in -6i64..=6,
        c in -6i64..=6,
        b in -30i64..=30,
        cmp in cmp_strategy(),
        gcd in proptest::bool::ANY,
    ) {
        let mut tm = TermManager::new();
        let (_, _, f) = linear_atom(&mut tm, a, c, cmp, b);
        let mut rw = if gcd { gcd_rewriter() } else { ThRewriter::default() };
        let once = rw.rewrite(&mut tm, f).unwrap();
        rw.reset();
        let twice = rw.rewrite(&mut tm, once).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Integer `div` and `mod` fold to the Euclidean quotient and remainder.
    #[test]
    fn div_mod_fold_euclidean(a in -60i64..=60, b in -9i64..=9) {
        prop_assume!(b != 0);
        let mut tm = TermManager::new();
        let na = tm.mk_int(a);
        let nb = tm.mk_int(b);
        let d = tm.mk_idiv(na, nb);
        let m = tm.mk_mod(na, nb);
        let mut rw = ThRewriter::default();
        let q = rw.rewrite(&mut tm, d).unwrap();
        let r = rw.rewrite(&mut tm, m).unwrap();
        let q = tm.numeral(q).unwrap();
        let r = tm.numeral(r).unwrap();
        let zero = BigRational::from_integer(BigInt::from(0));
        prop_assert!(r >= zero);
        prop_assert!(r < BigRational::from_integer(BigInt::from(b.abs())));
        prop_assert_eq!(
            BigRational::from_integer(BigInt::from(a)),
            BigRational::from_integer(BigInt::from(b)) * q + r
        );
    }

    /// Integer powers with small exponents fold exactly.
    #[test]
    fn integer_power_folds(base in -5i64..=5, exp in 0u32..=12) {
        prop_assume!(base != 0 || exp != 0);
        let mut tm = TermManager::new();
        let nb = tm.mk_int(base);
        let ne = tm.mk_int(exp);
        let p = tm.mk_power(nb, ne);
        let r = ThRewriter::default().rewrite(&mut tm, p).unwrap();
        let expected = BigRational::from_integer(BigInt::from(base).pow(exp));
        prop_assert_eq!(tm.numeral(r), Some(expected));
    }
}
