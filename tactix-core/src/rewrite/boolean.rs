//! Boolean connectives, equality and if-then-else.

use super::{BrResult, RewriteRules};
use crate::ast::{Args, TermId, TermKind, TermManager};
use rustc_hash::FxHashSet;

/// Rules for `not`, `and`, `or`, `=>`, `xor`, `ite`, `=` and `distinct`.
#[derive(Debug, Clone)]
pub struct BoolRewriter {
    flat: bool,
    elim_and: bool,
}

impl Default for BoolRewriter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl BoolRewriter {
    /// Rules with the given flattening and `and` elimination behavior.
    pub fn new(flat: bool, elim_and: bool) -> Self {
        Self { flat, elim_and }
    }

    fn mk_not_core(&self, tm: &mut TermManager, a: TermId) -> BrResult {
        match tm.kind(a) {
            Some(TermKind::True) => BrResult::done(tm.mk_false()),
            Some(TermKind::False) => BrResult::done(tm.mk_true()),
            Some(TermKind::Not(b)) => BrResult::done(*b),
            _ => BrResult::FAILED,
        }
    }

    /// Shared core of `and`/`or`: `unit` is the neutral element, `zero`
    /// the absorbing one.
    fn mk_nary_core(
        &self,
        tm: &mut TermManager,
        args: &[TermId],
        is_and: bool,
    ) -> BrResult {
        let (unit, zero) = if is_and {
            (tm.mk_true(), tm.mk_false())
        } else {
            (tm.mk_false(), tm.mk_true())
        };
        let mut out: Vec<TermId> = Vec::with_capacity(args.len());
        let mut seen = FxHashSet::default();
        let mut stack: Vec<TermId> = args.iter().rev().copied().collect();
        while let Some(a) = stack.pop() {
            if a == unit || !seen.insert(a) {
                continue;
            }
            if a == zero {
                return BrResult::done(zero);
            }
            if self.flat {
                let nested = match tm.kind(a) {
                    Some(TermKind::And(xs)) if is_and => Some(xs.clone()),
                    Some(TermKind::Or(xs)) if !is_and => Some(xs.clone()),
                    _ => None,
                };
                if let Some(xs) = nested {
                    stack.extend(xs.iter().rev());
                    continue;
                }
            }
            out.push(a);
        }
        // complementary literals
        for &a in &out {
            if let Some(TermKind::Not(b)) = tm.kind(a)
                && seen.contains(b)
                && out.contains(b)
            {
                return BrResult::done(zero);
            }
        }
        if out.as_slice() == args {
            return BrResult::FAILED;
        }
        let r = if is_and { tm.mk_and(out) } else { tm.mk_or(out) };
        BrResult::done(r)
    }

    fn mk_and_core(&self, tm: &mut TermManager, t: TermId, args: &Args) -> BrResult {
        let r = self.mk_nary_core(tm, args, true);
        if !self.elim_and {
            return r;
        }
        let conj = r.term().unwrap_or(t);
        let Some(TermKind::And(xs)) = tm.kind(conj).cloned() else {
            return r;
        };
        let negs: Vec<TermId> = xs.iter().map(|&x| tm.mk_not(x)).collect();
        let disj = tm.mk_or(negs);
        BrResult::rewrite3(tm.mk_not(disj))
    }

    fn mk_ite_core(&self, tm: &mut TermManager, c: TermId, th: TermId, el: TermId) -> BrResult {
        if tm.is_true(c) {
            return BrResult::done(th);
        }
        if tm.is_false(c) {
            return BrResult::done(el);
        }
        if th == el {
            return BrResult::done(th);
        }
        if let Some(TermKind::Not(c2)) = tm.kind(c).cloned() {
            return BrResult::rewrite1(tm.mk_ite(c2, el, th));
        }
        if !tm.is_bool(th) {
            return BrResult::FAILED;
        }
        // boolean branches
        if tm.is_true(th) && tm.is_false(el) {
            return BrResult::done(c);
        }
        if tm.is_false(th) && tm.is_true(el) {
            return BrResult::rewrite1(tm.mk_not(c));
        }
        if tm.is_true(th) {
            return BrResult::rewrite1(tm.mk_or([c, el]));
        }
        if tm.is_false(el) {
            return BrResult::rewrite1(tm.mk_and([c, th]));
        }
        if tm.is_false(th) {
            let nc = tm.mk_not(c);
            return BrResult::rewrite2(tm.mk_and([nc, el]));
        }
        if tm.is_true(el) {
            let nc = tm.mk_not(c);
            return BrResult::rewrite2(tm.mk_or([nc, th]));
        }
        BrResult::FAILED
    }

    fn mk_eq_core(&self, tm: &mut TermManager, a: TermId, b: TermId) -> BrResult {
        if a == b {
            return BrResult::done(tm.mk_true());
        }
        if tm.is_value(a) && tm.is_value(b) && tm.sort_of(a) == tm.sort_of(b) {
            // hash-consing makes distinct literals distinct values
            return BrResult::done(tm.mk_false());
        }
        if tm.is_bool(a) {
            for (x, y) in [(a, b), (b, a)] {
                if tm.is_true(y) {
                    return BrResult::done(x);
                }
                if tm.is_false(y) {
                    return BrResult::rewrite1(tm.mk_not(x));
                }
                if let Some(TermKind::Not(z)) = tm.kind(y)
                    && *z == x
                {
                    return BrResult::done(tm.mk_false());
                }
            }
        }
        BrResult::FAILED
    }

    fn mk_distinct_core(&self, tm: &mut TermManager, args: &Args) -> BrResult {
        if args.len() <= 1 {
            return BrResult::done(tm.mk_true());
        }
        let mut seen = FxHashSet::default();
        if args.iter().any(|a| !seen.insert(*a)) {
            return BrResult::done(tm.mk_false());
        }
        if args.len() == 2 {
            let eq = tm.mk_eq(args[0], args[1]);
            return BrResult::rewrite2(tm.mk_not(eq));
        }
        if args.iter().all(|&a| tm.is_value(a)) {
            return BrResult::done(tm.mk_true());
        }
        BrResult::FAILED
    }
}

impl RewriteRules for BoolRewriter {
    fn name(&self) -> &'static str {
        "bool"
    }

    fn reduce(&mut self, tm: &mut TermManager, t: TermId) -> BrResult {
        let Some(kind) = tm.kind(t).cloned() else {
            return BrResult::FAILED;
        };
        match kind {
            TermKind::Not(a) => self.mk_not_core(tm, a),
            TermKind::And(args) => self.mk_and_core(tm, t, &args),
            TermKind::Or(args) => self.mk_nary_core(tm, &args, false),
            TermKind::Implies(a, b) => {
                let na = tm.mk_not(a);
                BrResult::rewrite2(tm.mk_or([na, b]))
            }
            TermKind::Xor(a, b) => {
                let eq = tm.mk_eq(a, b);
                BrResult::rewrite2(tm.mk_not(eq))
            }
            TermKind::Ite(c, th, el) => self.mk_ite_core(tm, c, th, el),
            TermKind::Eq(a, b) => self.mk_eq_core(tm, a, b),
            TermKind::Distinct(args) => self.mk_distinct_core(tm, &args),
            _ => BrResult::FAILED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::ThRewriter;

    fn setup() -> (TermManager, TermId, TermId, TermId) {
        let mut tm = TermManager::new();
        let b = tm.sorts.bool_sort;
        let p = tm.mk_var("p", b);
        let q = tm.mk_var("q", b);
        let r = tm.mk_var("r", b);
        (tm, p, q, r)
    }

    #[test]
    fn test_and_flatten_and_absorb() {
        let (mut tm, p, q, r) = setup();
        let t = tm.mk_true();
        let inner = tm.mk_and([q, r]);
        let f = tm.mk_and([p, t, inner, p]);
        let mut rw = ThRewriter::default();
        let out = rw.rewrite(&mut tm, f).unwrap();
        assert_eq!(out, tm.mk_and([p, q, r]));

        let np = tm.mk_not(p);
        let g = tm.mk_or([p, q, np]);
        let got = rw.rewrite(&mut tm, g).unwrap();
        assert!(tm.is_true(got));
    }

    #[test]
    fn test_elim_and() {
        let (mut tm, p, q, _) = setup();
        let f = tm.mk_and([p, q]);
        let mut rw = BoolRewriter::new(true, true);
        let r = rw.reduce(&mut tm, f);
        let np = tm.mk_not(p);
        let nq = tm.mk_not(q);
        let or = tm.mk_or([np, nq]);
        assert_eq!(r.term(), Some(tm.mk_not(or)));
    }

    #[test]
    fn test_ite_and_eq() {
        let (mut tm, p, q, r) = setup();
        let t = tm.mk_true();
        let f = tm.mk_false();
        let ite = tm.mk_ite(p, t, f);
        let mut rw = ThRewriter::default();
        assert_eq!(rw.rewrite(&mut tm, ite).unwrap(), p);
        let np = tm.mk_not(p);
        let ite2 = tm.mk_ite(np, q, r);
        assert_eq!(rw.rewrite(&mut tm, ite2).unwrap(), tm.mk_ite(p, r, q));
        let eq = tm.mk_eq(q, f);
        assert_eq!(rw.rewrite(&mut tm, eq).unwrap(), tm.mk_not(q));
        let one = tm.mk_int(1);
        let two = tm.mk_int(2);
        let eq2 = tm.mk_eq(one, two);
        let got = rw.rewrite(&mut tm, eq2).unwrap();
        assert!(tm.is_false(got));
    }

    #[test]
    fn test_implies_to_or() {
        let (mut tm, p, q, _) = setup();
        let imp = tm.mk_implies(p, q);
        let mut rw = ThRewriter::default();
        let np = tm.mk_not(p);
        assert_eq!(rw.rewrite(&mut tm, imp).unwrap(), tm.mk_or([np, q]));
    }
}
