//! Abstract syntax for terms and formulas.
//!
//! Terms live in an arena owned by [`TermManager`] and are referred to by
//! [`TermId`]. Construction is hash-consed: building the same application
//! twice yields the same id, so structural equality is id equality. Terms
//! are never freed individually; the arena is session-scoped.

mod display;
pub mod traversal;

pub use display::TermDisplay;

use crate::sort::{SortId, SortKind, SortManager};
use lasso::{Rodeo, Spur};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tactix_math::{AlgebraicNumber, Numeral};

/// Identifier of an interned term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub u32);

impl TermId {
    /// Raw index into the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Argument list of an n-ary application.
pub type Args = SmallVec<[TermId; 4]>;

/// The operator and arguments of a term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// `true`
    True,
    /// `false`
    False,
    /// Uninterpreted constant, or a bound variable under a quantifier
    Var(Spur),
    /// Integer numeral
    IntConst(BigInt),
    /// Real numeral
    RealConst(BigRational),
    /// Irrational algebraic numeral (real sort)
    Algebraic(AlgebraicNumber),
    /// The constant pi (real sort)
    Pi,
    /// Bit-vector literal; `value` is in `[0, 2^width)`
    BitVecConst {
        /// Unsigned value
        value: BigInt,
        /// Width in bits
        width: u32,
    },

    /// Negation
    Not(TermId),
    /// Conjunction
    And(Args),
    /// Disjunction
    Or(Args),
    /// Implication
    Implies(TermId, TermId),
    /// Exclusive or
    Xor(TermId, TermId),
    /// If-then-else
    Ite(TermId, TermId, TermId),
    /// Equality (and boolean equivalence)
    Eq(TermId, TermId),
    /// Pairwise disequality
    Distinct(Args),

    /// Arithmetic negation
    Neg(TermId),
    /// Sum
    Add(Args),
    /// Binary subtraction
    Sub(TermId, TermId),
    /// Product
    Mul(Args),
    /// Real division
    Div(TermId, TermId),
    /// Integer division (Euclidean)
    IntDiv(TermId, TermId),
    /// Integer modulus (Euclidean)
    Mod(TermId, TermId),
    /// Integer remainder (sign of the divisor)
    Rem(TermId, TermId),
    /// Power
    Power(TermId, TermId),
    /// `<=`
    Le(TermId, TermId),
    /// `<`
    Lt(TermId, TermId),
    /// `>=`
    Ge(TermId, TermId),
    /// `>`
    Gt(TermId, TermId),
    /// Integer to real cast
    ToReal(TermId),
    /// Real to integer (floor)
    ToInt(TermId),
    /// Integrality test
    IsInt(TermId),
    /// sine
    Sin(TermId),
    /// cosine
    Cos(TermId),
    /// tangent
    Tan(TermId),
    /// arcsine
    Asin(TermId),
    /// arccosine
    Acos(TermId),
    /// arctangent
    Atan(TermId),
    /// hyperbolic sine
    Sinh(TermId),
    /// hyperbolic cosine
    Cosh(TermId),
    /// hyperbolic tangent
    Tanh(TermId),
    /// inverse hyperbolic sine
    Asinh(TermId),
    /// inverse hyperbolic cosine
    Acosh(TermId),
    /// inverse hyperbolic tangent
    Atanh(TermId),

    /// Bitwise not
    BvNot(TermId),
    /// Two's complement negation
    BvNeg(TermId),
    /// Bitwise and
    BvAnd(TermId, TermId),
    /// Bitwise or
    BvOr(TermId, TermId),
    /// Bitwise xor
    BvXor(TermId, TermId),
    /// Modular addition
    BvAdd(TermId, TermId),
    /// Modular subtraction
    BvSub(TermId, TermId),
    /// Modular multiplication
    BvMul(TermId, TermId),
    /// Concatenation (first argument is the high part)
    BvConcat(TermId, TermId),
    /// Bit range `[high:low]`
    BvExtract {
        /// Highest bit, inclusive
        high: u32,
        /// Lowest bit, inclusive
        low: u32,
        /// Argument
        arg: TermId,
    },
    /// Unsigned less-than
    BvUlt(TermId, TermId),
    /// Unsigned less-or-equal
    BvUle(TermId, TermId),
    /// Signed less-than
    BvSlt(TermId, TermId),
    /// Signed less-or-equal
    BvSle(TermId, TermId),

    /// Array read
    Select(TermId, TermId),
    /// Array write
    Store(TermId, TermId, TermId),

    /// Application of an uninterpreted function
    Apply {
        /// Function symbol
        func: Spur,
        /// Arguments
        args: Args,
    },
    /// Universal quantifier
    Forall {
        /// Bound variables
        vars: SmallVec<[(Spur, SortId); 2]>,
        /// Body
        body: TermId,
    },
    /// Existential quantifier
    Exists {
        /// Bound variables
        vars: SmallVec<[(Spur, SortId); 2]>,
        /// Body
        body: TermId,
    },
}

/// An interned term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// Identifier
    pub id: TermId,
    /// Operator and arguments
    pub kind: TermKind,
    /// Sort
    pub sort: SortId,
}

/// Arena and hash-consing table for terms.
#[derive(Debug)]
pub struct TermManager {
    terms: Vec<Term>,
    cache: FxHashMap<(TermKind, SortId), TermId>,
    interner: Rodeo,
    /// Sort table
    pub sorts: SortManager,
    fresh_counter: u32,
    true_id: TermId,
    false_id: TermId,
}

impl Default for TermManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TermManager {
    /// Create an empty term manager.
    pub fn new() -> Self {
        let sorts = SortManager::new();
        let bool_sort = sorts.bool_sort;
        let mut tm = Self {
            terms: Vec::new(),
            cache: FxHashMap::default(),
            interner: Rodeo::default(),
            sorts,
            fresh_counter: 0,
            true_id: TermId(0),
            false_id: TermId(0),
        };
        tm.true_id = tm.intern(TermKind::True, bool_sort);
        tm.false_id = tm.intern(TermKind::False, bool_sort);
        tm
    }

    /// Look up a term.
    pub fn get(&self, id: TermId) -> Option<&Term> {
        self.terms.get(id.index())
    }

    /// Kind of a term.
    pub fn kind(&self, id: TermId) -> Option<&TermKind> {
        self.get(id).map(|t| &t.kind)
    }

    /// Sort of a term.
    pub fn sort_of(&self, id: TermId) -> Option<SortId> {
        self.get(id).map(|t| t.sort)
    }

    /// Number of interned terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Never true: `true` and `false` are interned on creation.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Rough footprint of the arena in bytes, used for memory thresholds.
    pub fn memory_estimate(&self) -> usize {
        let per_term = std::mem::size_of::<Term>()
            + std::mem::size_of::<(TermKind, SortId)>()
            + std::mem::size_of::<TermId>();
        self.terms.len() * per_term
    }

    /// Intern a symbol name.
    pub fn intern_symbol(&mut self, name: &str) -> Spur {
        self.interner.get_or_intern(name)
    }

    /// Resolve a symbol.
    pub fn resolve(&self, sym: Spur) -> &str {
        self.interner.resolve(&sym)
    }

    /// Name of an uninterpreted constant.
    pub fn var_name(&self, id: TermId) -> Option<&str> {
        match self.kind(id)? {
            TermKind::Var(s) => Some(self.resolve(*s)),
            _ => None,
        }
    }

    /// Intern a term with an explicit sort.
    pub fn intern(&mut self, kind: TermKind, sort: SortId) -> TermId {
        let key = (kind, sort);
        if let Some(&id) = self.cache.get(&key) {
            return id;
        }
        let id = TermId(self.terms.len() as u32);
        self.terms.push(Term {
            id,
            kind: key.0.clone(),
            sort,
        });
        self.cache.insert(key, id);
        id
    }

    /// Build an application whose sort follows from its arguments.
    ///
    /// Leaves that need an explicit sort (`Var`, `Apply`, quantifiers) keep
    /// their usual constructors; passing them here gives them the boolean
    /// sort, which is only right for boolean atoms.
    pub fn mk_app(&mut self, kind: TermKind) -> TermId {
        let sort = self.infer_sort(&kind);
        self.intern(kind, sort)
    }

    fn arith_join(&self, args: &[TermId]) -> SortId {
        let all_int = args
            .iter()
            .all(|&a| self.sort_of(a) == Some(self.sorts.int_sort));
        if all_int {
            self.sorts.int_sort
        } else {
            self.sorts.real_sort
        }
    }

    fn sort_or_bool(&self, id: TermId) -> SortId {
        self.sort_of(id).unwrap_or(self.sorts.bool_sort)
    }

    fn bv_width(&self, id: TermId) -> u32 {
        self.sort_of(id)
            .and_then(|s| self.sorts.bitvec_width(s))
            .unwrap_or(0)
    }

    fn infer_sort(&mut self, kind: &TermKind) -> SortId {
        let (int_sort, real_sort, bool_sort) =
            (self.sorts.int_sort, self.sorts.real_sort, self.sorts.bool_sort);
        match kind {
            TermKind::IntConst(_)
            | TermKind::IntDiv(..)
            | TermKind::Mod(..)
            | TermKind::Rem(..)
            | TermKind::ToInt(_) => int_sort,
            TermKind::RealConst(_)
            | TermKind::Algebraic(_)
            | TermKind::Pi
            | TermKind::Div(..)
            | TermKind::ToReal(_)
            | TermKind::Sin(_)
            | TermKind::Cos(_)
            | TermKind::Tan(_)
            | TermKind::Asin(_)
            | TermKind::Acos(_)
            | TermKind::Atan(_)
            | TermKind::Sinh(_)
            | TermKind::Cosh(_)
            | TermKind::Tanh(_)
            | TermKind::Asinh(_)
            | TermKind::Acosh(_)
            | TermKind::Atanh(_) => real_sort,
            TermKind::Neg(a) => self.arith_join(&[*a]),
            TermKind::Add(args) | TermKind::Mul(args) => self.arith_join(args),
            TermKind::Sub(a, b) | TermKind::Power(a, b) => self.arith_join(&[*a, *b]),
            TermKind::Ite(_, t, _) => self.sort_or_bool(*t),
            TermKind::Store(a, _, _) => self.sort_or_bool(*a),
            TermKind::Select(a, _) => {
                let range = self
                    .sort_of(*a)
                    .and_then(|id| self.sorts.get(id))
                    .and_then(|sort| match sort.kind {
                        SortKind::Array { range, .. } => Some(range),
                        _ => None,
                    });
                range.unwrap_or(self.sorts.bool_sort)
            }
            TermKind::BitVecConst { width, .. } => self.sorts.bitvec(*width),
            TermKind::BvNot(a) | TermKind::BvNeg(a) => self.sort_or_bool(*a),
            TermKind::BvAnd(a, _)
            | TermKind::BvOr(a, _)
            | TermKind::BvXor(a, _)
            | TermKind::BvAdd(a, _)
            | TermKind::BvSub(a, _)
            | TermKind::BvMul(a, _) => self.sort_or_bool(*a),
            TermKind::BvConcat(a, b) => {
                let w = self.bv_width(*a) + self.bv_width(*b);
                self.sorts.bitvec(w)
            }
            TermKind::BvExtract { high, low, .. } => self.sorts.bitvec(high - low + 1),
            _ => bool_sort,
        }
    }

    // ----- leaves -----

    /// `true`.
    pub fn mk_true(&self) -> TermId {
        self.true_id
    }

    /// `false`.
    pub fn mk_false(&self) -> TermId {
        self.false_id
    }

    /// Boolean literal.
    pub fn mk_bool(&self, b: bool) -> TermId {
        if b { self.true_id } else { self.false_id }
    }

    /// Uninterpreted constant.
    pub fn mk_var(&mut self, name: &str, sort: SortId) -> TermId {
        let sym = self.intern_symbol(name);
        self.intern(TermKind::Var(sym), sort)
    }

    /// Constant with a name not used before in this manager.
    pub fn mk_fresh(&mut self, prefix: &str, sort: SortId) -> TermId {
        loop {
            let name = format!("{prefix}!{}", self.fresh_counter);
            self.fresh_counter += 1;
            if self.interner.get(&name).is_none() {
                return self.mk_var(&name, sort);
            }
        }
    }

    /// Integer numeral.
    pub fn mk_int(&mut self, n: impl Into<BigInt>) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern(TermKind::IntConst(n.into()), sort)
    }

    /// Real numeral.
    pub fn mk_real(&mut self, r: BigRational) -> TermId {
        let sort = self.sorts.real_sort;
        self.intern(TermKind::RealConst(r), sort)
    }

    /// Numeral of integer sort (when `is_int` and integral) or real sort.
    pub fn mk_numeral(&mut self, r: BigRational, is_int: bool) -> TermId {
        if is_int && r.is_integer() {
            self.mk_int(r.to_integer())
        } else {
            self.mk_real(r)
        }
    }

    /// Real numeral from an exact [`Numeral`].
    pub fn mk_real_numeral(&mut self, n: Numeral) -> TermId {
        match n {
            Numeral::Rational(r) => self.mk_real(r),
            Numeral::Irrational(a) => self.mk_app(TermKind::Algebraic(a)),
        }
    }

    /// The constant pi.
    pub fn mk_pi(&mut self) -> TermId {
        self.mk_app(TermKind::Pi)
    }

    /// Bit-vector literal; `value` is reduced modulo `2^width`.
    pub fn mk_bv(&mut self, value: impl Into<BigInt>, width: u32) -> TermId {
        let modulus = BigInt::one() << width;
        let mut v: BigInt = value.into() % &modulus;
        if v.is_negative() {
            v += modulus;
        }
        self.mk_app(TermKind::BitVecConst { value: v, width })
    }

    // ----- boolean structure -----

    /// Negation.
    pub fn mk_not(&mut self, a: TermId) -> TermId {
        self.mk_app(TermKind::Not(a))
    }

    /// Conjunction; `true` for no arguments, the argument itself for one.
    pub fn mk_and(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let args: Args = args.into_iter().collect();
        match args.len() {
            0 => self.mk_true(),
            1 => args[0],
            _ => self.mk_app(TermKind::And(args)),
        }
    }

    /// Disjunction; `false` for no arguments, the argument itself for one.
    pub fn mk_or(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let args: Args = args.into_iter().collect();
        match args.len() {
            0 => self.mk_false(),
            1 => args[0],
            _ => self.mk_app(TermKind::Or(args)),
        }
    }

    /// Implication.
    pub fn mk_implies(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(TermKind::Implies(a, b))
    }

    /// Exclusive or.
    pub fn mk_xor(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(TermKind::Xor(a, b))
    }

    /// If-then-else.
    pub fn mk_ite(&mut self, c: TermId, t: TermId, e: TermId) -> TermId {
        self.mk_app(TermKind::Ite(c, t, e))
    }

    /// Equality.
    pub fn mk_eq(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(TermKind::Eq(a, b))
    }

    /// Pairwise disequality.
    pub fn mk_distinct(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        self.mk_app(TermKind::Distinct(args.into_iter().collect()))
    }

    // ----- arithmetic -----

    /// Sum; the argument itself for a single argument.
    pub fn mk_add(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let args: Args = args.into_iter().collect();
        debug_assert!(!args.is_empty(), "empty sum");
        if args.len() == 1 {
            return args[0];
        }
        self.mk_app(TermKind::Add(args))
    }

    /// Product; the argument itself for a single argument.
    pub fn mk_mul(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let args: Args = args.into_iter().collect();
        debug_assert!(!args.is_empty(), "empty product");
        if args.len() == 1 {
            return args[0];
        }
        self.mk_app(TermKind::Mul(args))
    }

    /// Binary subtraction.
    pub fn mk_sub(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(TermKind::Sub(a, b))
    }

    /// Arithmetic negation.
    pub fn mk_neg(&mut self, a: TermId) -> TermId {
        self.mk_app(TermKind::Neg(a))
    }

    /// Real division.
    pub fn mk_div(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(TermKind::Div(a, b))
    }

    /// Integer division.
    pub fn mk_idiv(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(TermKind::IntDiv(a, b))
    }

    /// Integer modulus.
    pub fn mk_mod(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(TermKind::Mod(a, b))
    }

    /// Integer remainder.
    pub fn mk_rem(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(TermKind::Rem(a, b))
    }

    /// Power.
    pub fn mk_power(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(TermKind::Power(a, b))
    }

    /// `a <= b`.
    pub fn mk_le(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(TermKind::Le(a, b))
    }

    /// `a < b`.
    pub fn mk_lt(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(TermKind::Lt(a, b))
    }

    /// `a >= b`.
    pub fn mk_ge(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(TermKind::Ge(a, b))
    }

    /// `a > b`.
    pub fn mk_gt(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(TermKind::Gt(a, b))
    }

    /// Integer to real cast.
    pub fn mk_to_real(&mut self, a: TermId) -> TermId {
        self.mk_app(TermKind::ToReal(a))
    }

    /// Real to integer cast.
    pub fn mk_to_int(&mut self, a: TermId) -> TermId {
        self.mk_app(TermKind::ToInt(a))
    }

    /// Integrality test.
    pub fn mk_is_int(&mut self, a: TermId) -> TermId {
        self.mk_app(TermKind::IsInt(a))
    }

    // ----- bit-vectors, arrays, functions, quantifiers -----

    /// Bit range `[high:low]` of `arg`.
    pub fn mk_extract(&mut self, high: u32, low: u32, arg: TermId) -> TermId {
        debug_assert!(high >= low);
        self.mk_app(TermKind::BvExtract { high, low, arg })
    }

    /// Application of an uninterpreted function with result sort `range`.
    pub fn mk_apply(
        &mut self,
        func: &str,
        args: impl IntoIterator<Item = TermId>,
        range: SortId,
    ) -> TermId {
        let func = self.intern_symbol(func);
        let args = args.into_iter().collect();
        self.intern(TermKind::Apply { func, args }, range)
    }

    /// Universal quantifier over named variables.
    pub fn mk_forall(&mut self, vars: &[(&str, SortId)], body: TermId) -> TermId {
        let vars = vars
            .iter()
            .map(|(n, s)| (self.intern_symbol(n), *s))
            .collect();
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Forall { vars, body }, sort)
    }

    /// Existential quantifier over named variables.
    pub fn mk_exists(&mut self, vars: &[(&str, SortId)], body: TermId) -> TermId {
        let vars = vars
            .iter()
            .map(|(n, s)| (self.intern_symbol(n), *s))
            .collect();
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Exists { vars, body }, sort)
    }

    // ----- queries -----

    /// Whether the term is `true`.
    pub fn is_true(&self, id: TermId) -> bool {
        id == self.true_id
    }

    /// Whether the term is `false`.
    pub fn is_false(&self, id: TermId) -> bool {
        id == self.false_id
    }

    /// Whether the term has boolean sort.
    pub fn is_bool(&self, id: TermId) -> bool {
        self.sort_of(id) == Some(self.sorts.bool_sort)
    }

    /// Whether the term has integer sort.
    pub fn is_int(&self, id: TermId) -> bool {
        self.sort_of(id) == Some(self.sorts.int_sort)
    }

    /// Whether the term has real sort.
    pub fn is_real(&self, id: TermId) -> bool {
        self.sort_of(id) == Some(self.sorts.real_sort)
    }

    /// Whether the term is `Int` or `Real` sorted.
    pub fn is_arith(&self, id: TermId) -> bool {
        self.is_int(id) || self.is_real(id)
    }

    /// Value of a rational numeral (integer or real literal).
    pub fn numeral(&self, id: TermId) -> Option<BigRational> {
        match self.kind(id)? {
            TermKind::IntConst(n) => Some(BigRational::from_integer(n.clone())),
            TermKind::RealConst(r) => Some(r.clone()),
            _ => None,
        }
    }

    /// Whether the term is a rational numeral.
    pub fn is_numeral(&self, id: TermId) -> bool {
        matches!(
            self.kind(id),
            Some(TermKind::IntConst(_) | TermKind::RealConst(_))
        )
    }

    /// Whether the term is the numeral zero.
    pub fn is_zero(&self, id: TermId) -> bool {
        self.numeral(id).is_some_and(|r| r.is_zero())
    }

    /// Whether the term is the numeral one.
    pub fn is_one(&self, id: TermId) -> bool {
        self.numeral(id).is_some_and(|r| r.is_one())
    }

    /// Irrational algebraic numeral, if the term is one.
    pub fn algebraic(&self, id: TermId) -> Option<&AlgebraicNumber> {
        match self.kind(id)? {
            TermKind::Algebraic(a) => Some(a),
            _ => None,
        }
    }

    /// Rational or algebraic value of a numeral term.
    pub fn exact_numeral(&self, id: TermId) -> Option<Numeral> {
        if let Some(r) = self.numeral(id) {
            return Some(Numeral::Rational(r));
        }
        self.algebraic(id).cloned().map(Numeral::Irrational)
    }

    /// Value and width of a bit-vector literal.
    pub fn bv_value(&self, id: TermId) -> Option<(&BigInt, u32)> {
        match self.kind(id)? {
            TermKind::BitVecConst { value, width } => Some((value, *width)),
            _ => None,
        }
    }

    /// Whether the term is an uninterpreted constant.
    pub fn is_var(&self, id: TermId) -> bool {
        matches!(self.kind(id), Some(TermKind::Var(_)))
    }

    /// Whether the term is a value literal (boolean, numeral, bit-vector).
    pub fn is_value(&self, id: TermId) -> bool {
        matches!(
            self.kind(id),
            Some(
                TermKind::True
                    | TermKind::False
                    | TermKind::IntConst(_)
                    | TermKind::RealConst(_)
                    | TermKind::Algebraic(_)
                    | TermKind::BitVecConst { .. }
            )
        )
    }

    /// Display adapter printing the term in SMT-LIB syntax.
    pub fn display(&self, id: TermId) -> TermDisplay<'_> {
        TermDisplay::new(self, id)
    }
}
