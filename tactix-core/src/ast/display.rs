//! SMT-LIB style printing of terms.

use super::{TermId, TermKind, TermManager};
use crate::sort::{SortId, SortKind};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Signed;
use std::fmt;

/// Display adapter returned by [`TermManager::display`].
pub struct TermDisplay<'a> {
    tm: &'a TermManager,
    id: TermId,
}

impl<'a> TermDisplay<'a> {
    pub(super) fn new(tm: &'a TermManager, id: TermId) -> Self {
        Self { tm, id }
    }

    fn sub(&self, id: TermId) -> TermDisplay<'a> {
        TermDisplay { tm: self.tm, id }
    }

    fn app(&self, f: &mut fmt::Formatter<'_>, op: &str, args: &[TermId]) -> fmt::Result {
        write!(f, "({op}")?;
        for &a in args {
            write!(f, " {}", self.sub(a))?;
        }
        write!(f, ")")
    }
}

fn write_int(f: &mut fmt::Formatter<'_>, n: &BigInt) -> fmt::Result {
    if n.is_negative() {
        write!(f, "(- {})", -n)
    } else {
        write!(f, "{n}")
    }
}

fn write_real(f: &mut fmt::Formatter<'_>, r: &BigRational) -> fmt::Result {
    if r.is_integer() {
        if r.is_negative() {
            return write!(f, "(- {}.0)", -r.to_integer());
        }
        return write!(f, "{}.0", r.to_integer());
    }
    if r.is_negative() {
        write!(f, "(- (/ {} {}))", -r.numer(), r.denom())
    } else {
        write!(f, "(/ {} {})", r.numer(), r.denom())
    }
}

fn write_sort(f: &mut fmt::Formatter<'_>, tm: &TermManager, id: SortId) -> fmt::Result {
    match tm.sorts.get(id).map(|s| &s.kind) {
        Some(SortKind::Bool) => write!(f, "Bool"),
        Some(SortKind::Int) => write!(f, "Int"),
        Some(SortKind::Real) => write!(f, "Real"),
        Some(SortKind::BitVec(w)) => write!(f, "(_ BitVec {w})"),
        Some(SortKind::Array { domain, range }) => {
            write!(f, "(Array ")?;
            write_sort(f, tm, *domain)?;
            write!(f, " ")?;
            write_sort(f, tm, *range)?;
            write!(f, ")")
        }
        Some(SortKind::Uninterpreted(name)) => write!(f, "{}", tm.resolve(*name)),
        None => write!(f, "<sort:{}>", id.0),
    }
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TermKind::*;
        let Some(term) = self.tm.get(self.id) else {
            return write!(f, "<invalid:{}>", self.id.0);
        };
        let ch = term.kind.children();
        match &term.kind {
            True => write!(f, "true"),
            False => write!(f, "false"),
            Var(s) => write!(f, "{}", self.tm.resolve(*s)),
            IntConst(n) => write_int(f, n),
            RealConst(r) => write_real(f, r),
            Algebraic(a) => write!(f, "{a}"),
            Pi => write!(f, "pi"),
            BitVecConst { value, width } => write!(f, "(_ bv{value} {width})"),
            Not(_) => self.app(f, "not", &ch),
            And(_) => self.app(f, "and", &ch),
            Or(_) => self.app(f, "or", &ch),
            Implies(..) => self.app(f, "=>", &ch),
            Xor(..) => self.app(f, "xor", &ch),
            Ite(..) => self.app(f, "ite", &ch),
            Eq(..) => self.app(f, "=", &ch),
            Distinct(_) => self.app(f, "distinct", &ch),
            Neg(_) | Sub(..) => self.app(f, "-", &ch),
            Add(_) => self.app(f, "+", &ch),
            Mul(_) => self.app(f, "*", &ch),
            Div(..) => self.app(f, "/", &ch),
            IntDiv(..) => self.app(f, "div", &ch),
            Mod(..) => self.app(f, "mod", &ch),
            Rem(..) => self.app(f, "rem", &ch),
            Power(..) => self.app(f, "^", &ch),
            Le(..) => self.app(f, "<=", &ch),
            Lt(..) => self.app(f, "<", &ch),
            Ge(..) => self.app(f, ">=", &ch),
            Gt(..) => self.app(f, ">", &ch),
            ToReal(_) => self.app(f, "to_real", &ch),
            ToInt(_) => self.app(f, "to_int", &ch),
            IsInt(_) => self.app(f, "is_int", &ch),
            Sin(_) => self.app(f, "sin", &ch),
            Cos(_) => self.app(f, "cos", &ch),
            Tan(_) => self.app(f, "tan", &ch),
            Asin(_) => self.app(f, "asin", &ch),
            Acos(_) => self.app(f, "acos", &ch),
            Atan(_) => self.app(f, "atan", &ch),
            Sinh(_) => self.app(f, "sinh", &ch),
            Cosh(_) => self.app(f, "cosh", &ch),
            Tanh(_) => self.app(f, "tanh", &ch),
            Asinh(_) => self.app(f, "asinh", &ch),
            Acosh(_) => self.app(f, "acosh", &ch),
            Atanh(_) => self.app(f, "atanh", &ch),
            BvNot(_) => self.app(f, "bvnot", &ch),
            BvNeg(_) => self.app(f, "bvneg", &ch),
            BvAnd(..) => self.app(f, "bvand", &ch),
            BvOr(..) => self.app(f, "bvor", &ch),
            BvXor(..) => self.app(f, "bvxor", &ch),
            BvAdd(..) => self.app(f, "bvadd", &ch),
            BvSub(..) => self.app(f, "bvsub", &ch),
            BvMul(..) => self.app(f, "bvmul", &ch),
            BvConcat(..) => self.app(f, "concat", &ch),
            BvExtract { high, low, .. } => {
                self.app(f, &format!("(_ extract {high} {low})"), &ch)
            }
            BvUlt(..) => self.app(f, "bvult", &ch),
            BvUle(..) => self.app(f, "bvule", &ch),
            BvSlt(..) => self.app(f, "bvslt", &ch),
            BvSle(..) => self.app(f, "bvsle", &ch),
            Select(..) => self.app(f, "select", &ch),
            Store(..) => self.app(f, "store", &ch),
            Apply { func, args } => {
                if args.is_empty() {
                    write!(f, "{}", self.tm.resolve(*func))
                } else {
                    self.app(f, self.tm.resolve(*func), args)
                }
            }
            Forall { vars, body } | Exists { vars, body } => {
                let q = if matches!(term.kind, Forall { .. }) {
                    "forall"
                } else {
                    "exists"
                };
                write!(f, "({q} (")?;
                for (i, (name, sort)) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "({} ", self.tm.resolve(*name))?;
                    write_sort(f, self.tm, *sort)?;
                    write!(f, ")")?;
                }
                write!(f, ") {})", self.sub(*body))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_arith() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let m3 = tm.mk_int(-3);
        let sum = tm.mk_add([x, m3]);
        let half = tm.mk_real(BigRational::new(1.into(), 2.into()));
        let le = tm.mk_le(sum, x);
        assert_eq!(tm.display(le).to_string(), "(<= (+ x (- 3)) x)");
        assert_eq!(tm.display(half).to_string(), "(/ 1 2)");
    }
}
