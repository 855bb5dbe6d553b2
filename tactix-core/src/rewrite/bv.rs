//! Bit-vector rewriting rules.
//!
//! Constant folding for every bit-vector operator plus a few neutral and
//! absorbing element identities:
//!
//! - **Folding**: literals combine modulo `2^width`
//! - **Algebraic**: `x + 0 = x`, `x * 1 = x`, `x * 0 = 0`, `x & x = x`
//! - **Structural**: `extract[w-1:0] x = x`
//!
//! ## References
//!
//! - Z3's `rewriter/bv_rewriter.cpp`

use super::{BrResult, RewriteRules};
use crate::ast::{TermId, TermKind, TermManager};
use num_bigint::BigInt;
use num_traits::{One, Zero};

/// Rules for the bit-vector operators.
#[derive(Debug, Clone, Default)]
pub struct BvRewriter {
    folded: u64,
}

/// Two's complement reading of a `width`-bit value.
fn to_signed(v: &BigInt, width: u32) -> BigInt {
    if width > 0 && v.bit(u64::from(width - 1)) {
        v - (BigInt::one() << width)
    } else {
        v.clone()
    }
}

fn all_ones(width: u32) -> BigInt {
    (BigInt::one() << width) - BigInt::one()
}

impl BvRewriter {
    /// Fresh rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of constant folds performed.
    pub fn folded(&self) -> u64 {
        self.folded
    }

    fn value(tm: &TermManager, t: TermId) -> Option<(BigInt, u32)> {
        tm.bv_value(t).map(|(v, w)| (v.clone(), w))
    }

    fn fold(&mut self, tm: &mut TermManager, v: BigInt, width: u32) -> BrResult {
        self.folded += 1;
        BrResult::done(tm.mk_bv(v, width))
    }

    fn fold_cmp(&mut self, tm: &mut TermManager, b: bool) -> BrResult {
        self.folded += 1;
        BrResult::done(tm.mk_bool(b))
    }

    fn binary(&mut self, tm: &mut TermManager, kind: &TermKind, a: TermId, b: TermId) -> BrResult {
        let va = Self::value(tm, a);
        let vb = Self::value(tm, b);
        if let (Some((x, w)), Some((y, _))) = (&va, &vb) {
            let w = *w;
            return match kind {
                TermKind::BvAnd(..) => self.fold(tm, x & y, w),
                TermKind::BvOr(..) => self.fold(tm, x | y, w),
                TermKind::BvXor(..) => self.fold(tm, x ^ y, w),
                TermKind::BvAdd(..) => self.fold(tm, x + y, w),
                TermKind::BvSub(..) => self.fold(tm, x - y, w),
                TermKind::BvMul(..) => self.fold(tm, x * y, w),
                TermKind::BvUlt(..) => self.fold_cmp(tm, x < y),
                TermKind::BvUle(..) => self.fold_cmp(tm, x <= y),
                TermKind::BvSlt(..) => self.fold_cmp(tm, to_signed(x, w) < to_signed(y, w)),
                TermKind::BvSle(..) => self.fold_cmp(tm, to_signed(x, w) <= to_signed(y, w)),
                _ => BrResult::FAILED,
            };
        }
        let zero_a = va.as_ref().is_some_and(|(v, _)| v.is_zero());
        let zero_b = vb.as_ref().is_some_and(|(v, _)| v.is_zero());
        let one_a = va.as_ref().is_some_and(|(v, _)| v.is_one());
        let one_b = vb.as_ref().is_some_and(|(v, _)| v.is_one());
        match kind {
            TermKind::BvAdd(..) | TermKind::BvOr(..) | TermKind::BvXor(..) if zero_b => {
                BrResult::done(a)
            }
            TermKind::BvAdd(..) | TermKind::BvOr(..) | TermKind::BvXor(..) if zero_a => {
                BrResult::done(b)
            }
            TermKind::BvSub(..) if zero_b => BrResult::done(a),
            TermKind::BvMul(..) if one_b => BrResult::done(a),
            TermKind::BvMul(..) if one_a => BrResult::done(b),
            TermKind::BvMul(..) | TermKind::BvAnd(..) if zero_a => BrResult::done(a),
            TermKind::BvMul(..) | TermKind::BvAnd(..) if zero_b => BrResult::done(b),
            TermKind::BvAnd(..) | TermKind::BvOr(..) if a == b => BrResult::done(a),
            TermKind::BvXor(..) | TermKind::BvSub(..) if a == b => {
                let w = tm
                    .sort_of(a)
                    .and_then(|s| tm.sorts.bitvec_width(s))
                    .unwrap_or(0);
                BrResult::done(tm.mk_bv(0, w))
            }
            TermKind::BvUle(..) | TermKind::BvSle(..) if a == b => BrResult::done(tm.mk_true()),
            TermKind::BvUlt(..) | TermKind::BvSlt(..) if a == b => {
                BrResult::done(tm.mk_false())
            }
            TermKind::BvUle(..) if zero_a => BrResult::done(tm.mk_true()),
            _ => BrResult::FAILED,
        }
    }
}

impl RewriteRules for BvRewriter {
    fn name(&self) -> &'static str {
        "bv"
    }

    fn reduce(&mut self, tm: &mut TermManager, t: TermId) -> BrResult {
        let Some(kind) = tm.kind(t).cloned() else {
            return BrResult::FAILED;
        };
        match kind {
            TermKind::BvNot(a) => match Self::value(tm, a) {
                Some((v, w)) => self.fold(tm, all_ones(w) ^ v, w),
                None => match tm.kind(a) {
                    Some(TermKind::BvNot(b)) => BrResult::done(*b),
                    _ => BrResult::FAILED,
                },
            },
            TermKind::BvNeg(a) => match Self::value(tm, a) {
                Some((v, w)) => self.fold(tm, -v, w),
                None => match tm.kind(a) {
                    Some(TermKind::BvNeg(b)) => BrResult::done(*b),
                    _ => BrResult::FAILED,
                },
            },
            TermKind::BvConcat(a, b) => match (Self::value(tm, a), Self::value(tm, b)) {
                (Some((x, wa)), Some((y, wb))) => self.fold(tm, (x << wb) | y, wa + wb),
                _ => BrResult::FAILED,
            },
            TermKind::BvExtract { high, low, arg } => {
                if let Some((v, _)) = Self::value(tm, arg) {
                    let w = high - low + 1;
                    return self.fold(tm, (v >> low) & all_ones(w), w);
                }
                let width = tm
                    .sort_of(arg)
                    .and_then(|s| tm.sorts.bitvec_width(s))
                    .unwrap_or(0);
                if low == 0 && high + 1 == width {
                    return BrResult::done(arg);
                }
                BrResult::FAILED
            }
            TermKind::BvAnd(a, b)
            | TermKind::BvOr(a, b)
            | TermKind::BvXor(a, b)
            | TermKind::BvAdd(a, b)
            | TermKind::BvSub(a, b)
            | TermKind::BvMul(a, b)
            | TermKind::BvUlt(a, b)
            | TermKind::BvUle(a, b)
            | TermKind::BvSlt(a, b)
            | TermKind::BvSle(a, b) => self.binary(tm, &kind, a, b),
            _ => BrResult::FAILED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_wraps() {
        let mut tm = TermManager::new();
        let a = tm.mk_bv(200, 8);
        let b = tm.mk_bv(100, 8);
        let add = tm.mk_app(TermKind::BvAdd(a, b));
        let mut rw = BvRewriter::new();
        let r = rw.reduce(&mut tm, add).term().unwrap();
        assert_eq!(tm.bv_value(r), Some((&BigInt::from(44), 8)));
        assert_eq!(rw.folded(), 1);
    }

    #[test]
    fn test_signed_compare() {
        let mut tm = TermManager::new();
        let m1 = tm.mk_bv(255, 8);
        let one = tm.mk_bv(1, 8);
        let slt = tm.mk_app(TermKind::BvSlt(m1, one));
        let ult = tm.mk_app(TermKind::BvUlt(m1, one));
        let mut rw = BvRewriter::new();
        let got = rw.reduce(&mut tm, slt).term().unwrap();
        assert!(tm.is_true(got));
        let got = rw.reduce(&mut tm, ult).term().unwrap();
        assert!(tm.is_false(got));
    }

    #[test]
    fn test_neutral_elements() {
        let mut tm = TermManager::new();
        let bv8 = tm.sorts.bitvec(8);
        let x = tm.mk_var("x", bv8);
        let zero = tm.mk_bv(0, 8);
        let one = tm.mk_bv(1, 8);
        let mut rw = BvRewriter::new();
        let add = tm.mk_app(TermKind::BvAdd(x, zero));
        assert_eq!(rw.reduce(&mut tm, add).term(), Some(x));
        let mul = tm.mk_app(TermKind::BvMul(one, x));
        assert_eq!(rw.reduce(&mut tm, mul).term(), Some(x));
        let ext = tm.mk_extract(7, 0, x);
        assert_eq!(rw.reduce(&mut tm, ext).term(), Some(x));
        let c = tm.mk_bv(0xab, 8);
        let hi = tm.mk_extract(7, 4, c);
        let r = rw.reduce(&mut tm, hi).term().unwrap();
        assert_eq!(tm.bv_value(r), Some((&BigInt::from(0xa), 4)));
    }
}
