//! Generic traversal over term structure: children, rebuilding,
//! substitution and subterm collection.

use super::{Args, TermId, TermKind, TermManager};
use lasso::Spur;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::{SmallVec, smallvec};

impl TermKind {
    /// Direct subterms in argument order.
    pub fn children(&self) -> SmallVec<[TermId; 4]> {
        use TermKind::*;
        match self {
            True | False | Var(_) | IntConst(_) | RealConst(_) | Algebraic(_) | Pi
            | BitVecConst { .. } => SmallVec::new(),
            Not(a) | Neg(a) | ToReal(a) | ToInt(a) | IsInt(a) | Sin(a) | Cos(a) | Tan(a)
            | Asin(a) | Acos(a) | Atan(a) | Sinh(a) | Cosh(a) | Tanh(a) | Asinh(a)
            | Acosh(a) | Atanh(a) | BvNot(a) | BvNeg(a) => smallvec![*a],
            BvExtract { arg, .. } => smallvec![*arg],
            Implies(a, b) | Xor(a, b) | Eq(a, b) | Sub(a, b) | Div(a, b) | IntDiv(a, b)
            | Mod(a, b) | Rem(a, b) | Power(a, b) | Le(a, b) | Lt(a, b) | Ge(a, b)
            | Gt(a, b) | BvAnd(a, b) | BvOr(a, b) | BvXor(a, b) | BvAdd(a, b)
            | BvSub(a, b) | BvMul(a, b) | BvConcat(a, b) | BvUlt(a, b) | BvUle(a, b)
            | BvSlt(a, b) | BvSle(a, b) | Select(a, b) => smallvec![*a, *b],
            Ite(a, b, c) | Store(a, b, c) => smallvec![*a, *b, *c],
            And(args) | Or(args) | Distinct(args) | Add(args) | Mul(args) => args.clone(),
            Apply { args, .. } => args.clone(),
            Forall { body, .. } | Exists { body, .. } => smallvec![*body],
        }
    }

    /// Same operator with new children (same count as [`Self::children`]).
    pub fn with_children(&self, ch: &[TermId]) -> TermKind {
        use TermKind::*;
        debug_assert_eq!(ch.len(), self.children().len());
        match self {
            True | False | Var(_) | IntConst(_) | RealConst(_) | Algebraic(_) | Pi
            | BitVecConst { .. } => self.clone(),
            Not(_) => Not(ch[0]),
            Neg(_) => Neg(ch[0]),
            ToReal(_) => ToReal(ch[0]),
            ToInt(_) => ToInt(ch[0]),
            IsInt(_) => IsInt(ch[0]),
            Sin(_) => Sin(ch[0]),
            Cos(_) => Cos(ch[0]),
            Tan(_) => Tan(ch[0]),
            Asin(_) => Asin(ch[0]),
            Acos(_) => Acos(ch[0]),
            Atan(_) => Atan(ch[0]),
            Sinh(_) => Sinh(ch[0]),
            Cosh(_) => Cosh(ch[0]),
            Tanh(_) => Tanh(ch[0]),
            Asinh(_) => Asinh(ch[0]),
            Acosh(_) => Acosh(ch[0]),
            Atanh(_) => Atanh(ch[0]),
            BvNot(_) => BvNot(ch[0]),
            BvNeg(_) => BvNeg(ch[0]),
            BvExtract { high, low, .. } => BvExtract {
                high: *high,
                low: *low,
                arg: ch[0],
            },
            Implies(..) => Implies(ch[0], ch[1]),
            Xor(..) => Xor(ch[0], ch[1]),
            Eq(..) => Eq(ch[0], ch[1]),
            Sub(..) => Sub(ch[0], ch[1]),
            Div(..) => Div(ch[0], ch[1]),
            IntDiv(..) => IntDiv(ch[0], ch[1]),
            Mod(..) => Mod(ch[0], ch[1]),
            Rem(..) => Rem(ch[0], ch[1]),
            Power(..) => Power(ch[0], ch[1]),
            Le(..) => Le(ch[0], ch[1]),
            Lt(..) => Lt(ch[0], ch[1]),
            Ge(..) => Ge(ch[0], ch[1]),
            Gt(..) => Gt(ch[0], ch[1]),
            BvAnd(..) => BvAnd(ch[0], ch[1]),
            BvOr(..) => BvOr(ch[0], ch[1]),
            BvXor(..) => BvXor(ch[0], ch[1]),
            BvAdd(..) => BvAdd(ch[0], ch[1]),
            BvSub(..) => BvSub(ch[0], ch[1]),
            BvMul(..) => BvMul(ch[0], ch[1]),
            BvConcat(..) => BvConcat(ch[0], ch[1]),
            BvUlt(..) => BvUlt(ch[0], ch[1]),
            BvUle(..) => BvUle(ch[0], ch[1]),
            BvSlt(..) => BvSlt(ch[0], ch[1]),
            BvSle(..) => BvSle(ch[0], ch[1]),
            Select(..) => Select(ch[0], ch[1]),
            Ite(..) => Ite(ch[0], ch[1], ch[2]),
            Store(..) => Store(ch[0], ch[1], ch[2]),
            And(_) => And(Args::from_slice(ch)),
            Or(_) => Or(Args::from_slice(ch)),
            Distinct(_) => Distinct(Args::from_slice(ch)),
            Add(_) => Add(Args::from_slice(ch)),
            Mul(_) => Mul(Args::from_slice(ch)),
            Apply { func, .. } => Apply {
                func: *func,
                args: Args::from_slice(ch),
            },
            Forall { vars, .. } => Forall {
                vars: vars.clone(),
                body: ch[0],
            },
            Exists { vars, .. } => Exists {
                vars: vars.clone(),
                body: ch[0],
            },
        }
    }

    /// Whether this is a leaf (no children).
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Whether this is a quantifier.
    pub fn is_quantifier(&self) -> bool {
        matches!(self, TermKind::Forall { .. } | TermKind::Exists { .. })
    }
}

impl TermManager {
    /// Rebuild `id` with new children, keeping its sort for explicitly
    /// sorted leaves and applications.
    pub fn rebuild(&mut self, id: TermId, children: &[TermId]) -> TermId {
        let Some(term) = self.get(id) else {
            return id;
        };
        let kind = term.kind.clone();
        let sort = term.sort;
        if kind.children().as_slice() == children {
            return id;
        }
        let new_kind = kind.with_children(children);
        match kind {
            TermKind::Apply { .. } | TermKind::Forall { .. } | TermKind::Exists { .. } => {
                self.intern(new_kind, sort)
            }
            _ => self.mk_app(new_kind),
        }
    }
}

/// All distinct subterms of `root` in post-order (children first).
pub fn collect_subterms(tm: &TermManager, root: TermId) -> Vec<TermId> {
    let mut out = Vec::new();
    let mut seen = FxHashSet::default();
    let mut stack = vec![(root, false)];
    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            out.push(id);
            continue;
        }
        if !seen.insert(id) {
            continue;
        }
        stack.push((id, true));
        if let Some(t) = tm.get(id) {
            for c in t.kind.children().into_iter().rev() {
                if !seen.contains(&c) {
                    stack.push((c, false));
                }
            }
        }
    }
    out
}

/// Whether `target` occurs in `root`.
pub fn contains_term(tm: &TermManager, root: TermId, target: TermId) -> bool {
    let mut seen = FxHashSet::default();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if id == target {
            return true;
        }
        if !seen.insert(id) {
            continue;
        }
        if let Some(t) = tm.get(id) {
            stack.extend(t.kind.children());
        }
    }
    false
}

/// Uninterpreted constants occurring free in `root`, in first-occurrence order.
pub fn free_constants(tm: &TermManager, root: TermId) -> Vec<TermId> {
    let mut out = Vec::new();
    let mut seen = FxHashSet::default();
    collect_free(tm, root, &mut Vec::new(), &mut seen, &mut out);
    out
}

fn collect_free(
    tm: &TermManager,
    id: TermId,
    bound: &mut Vec<Spur>,
    seen: &mut FxHashSet<(TermId, usize)>,
    out: &mut Vec<TermId>,
) {
    if !seen.insert((id, bound.len())) {
        return;
    }
    let Some(t) = tm.get(id) else {
        return;
    };
    match &t.kind {
        TermKind::Var(s) => {
            if !bound.contains(s) && !out.contains(&id) {
                out.push(id);
            }
        }
        TermKind::Forall { vars, body } | TermKind::Exists { vars, body } => {
            let n = bound.len();
            bound.extend(vars.iter().map(|(s, _)| *s));
            collect_free(tm, *body, bound, seen, out);
            bound.truncate(n);
        }
        kind => {
            for c in kind.children() {
                collect_free(tm, c, bound, seen, out);
            }
        }
    }
}

/// Replace subterms according to `map`, bottom-up, without rewriting.
///
/// Keys that are constants bound by an enclosing quantifier are not
/// replaced under that quantifier.
pub fn substitute(tm: &mut TermManager, root: TermId, map: &FxHashMap<TermId, TermId>) -> TermId {
    if map.is_empty() {
        return root;
    }
    let mut cache = FxHashMap::default();
    substitute_rec(tm, root, map, &mut cache)
}

fn substitute_rec(
    tm: &mut TermManager,
    id: TermId,
    map: &FxHashMap<TermId, TermId>,
    cache: &mut FxHashMap<TermId, TermId>,
) -> TermId {
    if let Some(&r) = map.get(&id) {
        return r;
    }
    if let Some(&r) = cache.get(&id) {
        return r;
    }
    let Some(kind) = tm.kind(id).cloned() else {
        return id;
    };
    let result = match &kind {
        TermKind::Forall { vars, body } | TermKind::Exists { vars, body } => {
            let shadowed: FxHashMap<TermId, TermId> = map
                .iter()
                .filter(|(k, _)| match tm.kind(**k) {
                    Some(TermKind::Var(s)) => !vars.iter().any(|(v, _)| v == s),
                    _ => true,
                })
                .map(|(k, v)| (*k, *v))
                .collect();
            let mut inner_cache = FxHashMap::default();
            let new_body = substitute_rec(tm, *body, &shadowed, &mut inner_cache);
            tm.rebuild(id, &[new_body])
        }
        _ => {
            let children = kind.children();
            let new_children: SmallVec<[TermId; 4]> = children
                .iter()
                .map(|&c| substitute_rec(tm, c, map, cache))
                .collect();
            tm.rebuild(id, &new_children)
        }
    };
    cache.insert(id, result);
    result
}

/// Number of distinct subterms.
pub fn term_size(tm: &TermManager, root: TermId) -> usize {
    collect_subterms(tm, root).len()
}

/// Height of the term DAG (leaves have depth 1).
pub fn term_depth(tm: &TermManager, root: TermId) -> usize {
    let mut depth: FxHashMap<TermId, usize> = FxHashMap::default();
    for id in collect_subterms(tm, root) {
        let d = tm
            .get(id)
            .map(|t| {
                t.kind
                    .children()
                    .iter()
                    .map(|c| depth.get(c).copied().unwrap_or(0))
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        depth.insert(id, d + 1);
    }
    depth.get(&root).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_roundtrip() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let le = tm.mk_le(x, y);
        let kind = tm.kind(le).cloned().unwrap();
        assert_eq!(kind.children().as_slice(), &[x, y]);
        let swapped = kind.with_children(&[y, x]);
        assert_eq!(swapped, TermKind::Le(y, x));
    }

    #[test]
    fn test_substitute() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let zero = tm.mk_int(0);
        let gt = tm.mk_gt(x, zero);
        let mut map = FxHashMap::default();
        map.insert(x, y);
        let r = substitute(&mut tm, gt, &map);
        let expected = tm.mk_gt(y, zero);
        assert_eq!(r, expected);
    }

    #[test]
    fn test_substitute_respects_binders() {
        let mut tm = TermManager::new();
        let int = tm.sorts.int_sort;
        let x = tm.mk_var("x", int);
        let zero = tm.mk_int(0);
        let body = tm.mk_ge(x, zero);
        let q = tm.mk_forall(&[("x", int)], body);
        let mut map = FxHashMap::default();
        map.insert(x, zero);
        assert_eq!(substitute(&mut tm, q, &map), q);
        assert!(free_constants(&tm, q).is_empty());
    }

    #[test]
    fn test_collect_and_depth() {
        let mut tm = TermManager::new();
        let p = tm.mk_var("p", tm.sorts.bool_sort);
        let q = tm.mk_var("q", tm.sorts.bool_sort);
        let np = tm.mk_not(p);
        let f = tm.mk_and([np, q, p]);
        let subs = collect_subterms(&tm, f);
        assert_eq!(subs.last(), Some(&f));
        assert_eq!(subs.len(), 4);
        assert_eq!(term_depth(&tm, f), 3);
        assert!(contains_term(&tm, f, p));
        assert_eq!(free_constants(&tm, f), vec![p, q]);
    }
}
