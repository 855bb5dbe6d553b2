//! Probes: pure measurements over goals.
//!
//! A probe maps a goal to a number; boolean probes return `0.0` or `1.0`.
//! Probes drive the conditional combinators (`cond`, `when`, `fail_if`).
//!
//! Fragment probes (`is-qflia`, `is-qfbv`, ...) classify a goal with a
//! single pass over its distinct subterms that stops at the first subterm
//! outside the fragment.
//!
//! ## References
//!
//! - Z3's `tactic/probe.cpp`, `tactic/arith/probe_arith.cpp`

use crate::ast::traversal::{collect_subterms, free_constants};
use crate::ast::{TermId, TermKind, TermManager};
use crate::goal::Goal;
use num_traits::Signed;
use rustc_hash::FxHashSet;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

/// A measurement over a goal.
pub trait Probe: Send + Sync + fmt::Debug {
    /// Name of the probe.
    fn name(&self) -> &str;

    /// Evaluate the probe.
    fn evaluate(&self, goal: &Goal, tm: &TermManager) -> f64;
}

/// Shared probe handle used by combinators.
pub type ProbeRef = Arc<dyn Probe>;

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

// ----- goal measures -----

/// Simple goal measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Number of formulas
    Size,
    /// Number of distinct subterms
    NumExprs,
    /// Number of uninterpreted constants
    NumConsts,
    /// Number of transformations applied so far
    Depth,
    /// The goal contains `false`
    IsInconsistent,
    /// The goal is empty
    IsDecidedSat,
    /// The goal is refuted
    IsDecidedUnsat,
    /// Proof generation is on
    ProduceProofs,
    /// Model generation is on
    ProduceModels,
    /// Unsat core tracking is on
    ProduceUnsatCores,
    /// Some formula contains a quantifier
    HasQuantifiers,
}

impl Measure {
    fn name(self) -> &'static str {
        match self {
            Measure::Size => "size",
            Measure::NumExprs => "num-exprs",
            Measure::NumConsts => "num-consts",
            Measure::Depth => "depth",
            Measure::IsInconsistent => "is-inconsistent",
            Measure::IsDecidedSat => "is-decided-sat",
            Measure::IsDecidedUnsat => "is-decided-unsat",
            Measure::ProduceProofs => "produce-proofs",
            Measure::ProduceModels => "produce-models",
            Measure::ProduceUnsatCores => "produce-unsat-cores",
            Measure::HasQuantifiers => "has-quantifiers",
        }
    }
}

/// Probe over a [`Measure`].
#[derive(Debug, Clone, Copy)]
pub struct MeasureProbe(pub Measure);

impl Probe for MeasureProbe {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn evaluate(&self, goal: &Goal, tm: &TermManager) -> f64 {
        match self.0 {
            Measure::Size => goal.size() as f64,
            Measure::NumExprs => goal.num_exprs(tm) as f64,
            Measure::NumConsts => {
                let mut consts = FxHashSet::default();
                for &f in goal.formulas() {
                    consts.extend(free_constants(tm, f));
                }
                consts.len() as f64
            }
            Measure::Depth => f64::from(goal.depth()),
            Measure::IsInconsistent => flag(goal.is_inconsistent()),
            Measure::IsDecidedSat => flag(goal.is_decided_sat()),
            Measure::IsDecidedUnsat => flag(goal.is_decided_unsat()),
            Measure::ProduceProofs => flag(goal.proofs_enabled()),
            Measure::ProduceModels => flag(goal.models_enabled()),
            Measure::ProduceUnsatCores => flag(goal.unsat_core_enabled()),
            Measure::HasQuantifiers => flag(
                subterms(goal, tm)
                    .iter()
                    .any(|&t| tm.kind(t).is_some_and(TermKind::is_quantifier)),
            ),
        }
    }
}

/// Distinct subterms of all formulas.
fn subterms(goal: &Goal, tm: &TermManager) -> Vec<TermId> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for &f in goal.formulas() {
        for t in collect_subterms(tm, f) {
            if seen.insert(t) {
                out.push(t);
            }
        }
    }
    out
}

// ----- fragments -----

/// Logic fragments recognized by [`FragmentProbe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    /// Boolean structure over boolean constants
    Propositional,
    /// Quantifier-free bit-vectors
    QfBv,
    /// Quantifier-free linear integer arithmetic
    QfLia,
    /// Quantifier-free linear real arithmetic
    QfLra,
    /// Quantifier-free linear mixed arithmetic
    QfLira,
    /// Conjunction of linear integer constraints
    Ilp,
    /// Conjunction of linear mixed constraints
    Mip,
    /// Quantifier-free nonlinear integer arithmetic
    QfNia,
    /// Quantifier-free nonlinear real arithmetic
    QfNra,
    /// Nonlinear integer arithmetic with quantifiers
    Nia,
    /// Nonlinear real arithmetic with quantifiers
    Nra,
}

/// What a fragment admits.
#[derive(Debug, Clone, Copy)]
struct Admits {
    quantifiers: bool,
    bool_structure: bool,
    int: bool,
    real: bool,
    nonlinear: bool,
    bv: bool,
    atoms_only: bool,
}

impl Fragment {
    fn name(self) -> &'static str {
        match self {
            Fragment::Propositional => "is-propositional",
            Fragment::QfBv => "is-qfbv",
            Fragment::QfLia => "is-qflia",
            Fragment::QfLra => "is-qflra",
            Fragment::QfLira => "is-qflira",
            Fragment::Ilp => "is-ilp",
            Fragment::Mip => "is-mip",
            Fragment::QfNia => "is-qfnia",
            Fragment::QfNra => "is-qfnra",
            Fragment::Nia => "is-nia",
            Fragment::Nra => "is-nra",
        }
    }

    fn admits(self) -> Admits {
        let base = Admits {
            quantifiers: false,
            bool_structure: true,
            int: false,
            real: false,
            nonlinear: false,
            bv: false,
            atoms_only: false,
        };
        match self {
            Fragment::Propositional => base,
            Fragment::QfBv => Admits { bv: true, ..base },
            Fragment::QfLia => Admits { int: true, ..base },
            Fragment::QfLra => Admits { real: true, ..base },
            Fragment::QfLira => Admits {
                int: true,
                real: true,
                ..base
            },
            Fragment::Ilp => Admits {
                int: true,
                bool_structure: false,
                atoms_only: true,
                ..base
            },
            Fragment::Mip => Admits {
                int: true,
                real: true,
                bool_structure: false,
                atoms_only: true,
                ..base
            },
            Fragment::QfNia => Admits {
                int: true,
                nonlinear: true,
                ..base
            },
            Fragment::QfNra => Admits {
                real: true,
                nonlinear: true,
                ..base
            },
            Fragment::Nia => Admits {
                int: true,
                nonlinear: true,
                quantifiers: true,
                ..base
            },
            Fragment::Nra => Admits {
                real: true,
                nonlinear: true,
                quantifiers: true,
                ..base
            },
        }
    }
}

impl Admits {
    fn arith(&self) -> bool {
        self.int || self.real
    }

    fn sort_ok(&self, tm: &TermManager, t: TermId) -> bool {
        if tm.is_bool(t) {
            return self.bool_structure || !self.atoms_only;
        }
        if tm.is_int(t) {
            return self.int;
        }
        if tm.is_real(t) {
            return self.real;
        }
        self.bv
            && tm
                .sort_of(t)
                .and_then(|s| tm.sorts.bitvec_width(s))
                .is_some()
    }

    fn visit(&self, tm: &TermManager, t: TermId) -> ControlFlow<()> {
        let Some(kind) = tm.kind(t) else {
            return ControlFlow::Break(());
        };
        let ok = match kind {
            TermKind::True | TermKind::False => true,
            TermKind::Var(_) => self.sort_ok(tm, t),
            TermKind::IntConst(_) => self.arith(),
            TermKind::RealConst(_) => self.real,
            TermKind::Algebraic(_) => self.real && self.nonlinear,
            TermKind::Not(_)
            | TermKind::And(_)
            | TermKind::Or(_)
            | TermKind::Implies(..)
            | TermKind::Xor(..)
            | TermKind::Ite(..) => self.bool_structure,
            TermKind::Eq(a, _) => self.sort_ok(tm, *a),
            TermKind::Distinct(_) => self.bool_structure,
            TermKind::Neg(_)
            | TermKind::Add(_)
            | TermKind::Sub(..)
            | TermKind::Le(..)
            | TermKind::Lt(..)
            | TermKind::Ge(..)
            | TermKind::Gt(..) => self.arith(),
            TermKind::Mul(args) => {
                self.arith()
                    && (self.nonlinear
                        || args.iter().filter(|&&a| !tm.is_numeral(a)).count() <= 1)
            }
            TermKind::Div(_, b) => self.real && (self.nonlinear || tm.is_numeral(*b)),
            TermKind::IntDiv(_, b) | TermKind::Mod(_, b) | TermKind::Rem(_, b) => {
                self.int && (self.nonlinear || tm.is_numeral(*b))
            }
            TermKind::Power(..) => self.arith() && self.nonlinear,
            TermKind::ToReal(_) | TermKind::ToInt(_) | TermKind::IsInt(_) => self.int && self.real,
            TermKind::BitVecConst { .. }
            | TermKind::BvNot(_)
            | TermKind::BvNeg(_)
            | TermKind::BvAnd(..)
            | TermKind::BvOr(..)
            | TermKind::BvXor(..)
            | TermKind::BvAdd(..)
            | TermKind::BvSub(..)
            | TermKind::BvMul(..)
            | TermKind::BvConcat(..)
            | TermKind::BvExtract { .. }
            | TermKind::BvUlt(..)
            | TermKind::BvUle(..)
            | TermKind::BvSlt(..)
            | TermKind::BvSle(..) => self.bv,
            TermKind::Forall { .. } | TermKind::Exists { .. } => self.quantifiers,
            _ => false,
        };
        if ok {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }
}

fn is_arith_atom(tm: &TermManager, f: TermId) -> bool {
    match tm.kind(f) {
        Some(
            TermKind::Le(a, _)
            | TermKind::Lt(a, _)
            | TermKind::Ge(a, _)
            | TermKind::Gt(a, _)
            | TermKind::Eq(a, _),
        ) => tm.is_arith(*a),
        _ => false,
    }
}

/// Whether `goal` lies in `fragment`.
pub fn in_fragment(goal: &Goal, tm: &TermManager, fragment: Fragment) -> bool {
    let admits = fragment.admits();
    if admits.atoms_only && !goal.formulas().iter().all(|&f| is_arith_atom(tm, f)) {
        return false;
    }
    subterms(goal, tm)
        .into_iter()
        .try_for_each(|t| admits.visit(tm, t))
        .is_continue()
}

/// Boolean probe over a [`Fragment`].
#[derive(Debug, Clone, Copy)]
pub struct FragmentProbe(pub Fragment);

impl Probe for FragmentProbe {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn evaluate(&self, goal: &Goal, tm: &TermManager) -> f64 {
        flag(in_fragment(goal, tm, self.0))
    }
}

// ----- arithmetic statistics -----

/// Statistic over the arithmetic atoms of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithStat {
    /// Largest polynomial degree
    MaxDeg,
    /// Average polynomial degree
    AvgDeg,
    /// Largest numeral bit width
    MaxBw,
    /// Average numeral bit width
    AvgBw,
}

/// Probe over an [`ArithStat`].
#[derive(Debug, Clone, Copy)]
pub struct ArithProbe(pub ArithStat);

fn degree(tm: &TermManager, t: TermId) -> u64 {
    match tm.kind(t) {
        Some(TermKind::IntConst(_) | TermKind::RealConst(_) | TermKind::Algebraic(_)) => 0,
        Some(TermKind::Add(args)) => args.iter().map(|&a| degree(tm, a)).max().unwrap_or(0),
        Some(TermKind::Sub(a, b)) => degree(tm, *a).max(degree(tm, *b)),
        Some(TermKind::Neg(a)) => degree(tm, *a),
        Some(TermKind::Mul(args)) => args.iter().map(|&a| degree(tm, a)).sum(),
        Some(TermKind::Power(b, e)) => match tm.numeral(*e) {
            Some(k) if k.is_integer() && !k.is_negative() => {
                let k = k.to_integer().try_into().unwrap_or(u64::MAX);
                degree(tm, *b).saturating_mul(k)
            }
            _ => 1,
        },
        _ => 1,
    }
}

fn bit_width(tm: &TermManager, t: TermId) -> Option<u64> {
    tm.numeral(t).map(|r| r.numer().bits().max(1))
}

impl Probe for ArithProbe {
    fn name(&self) -> &str {
        match self.0 {
            ArithStat::MaxDeg => "arith-max-deg",
            ArithStat::AvgDeg => "arith-avg-deg",
            ArithStat::MaxBw => "arith-max-bw",
            ArithStat::AvgBw => "arith-avg-bw",
        }
    }

    fn evaluate(&self, goal: &Goal, tm: &TermManager) -> f64 {
        let subs = subterms(goal, tm);
        let values: Vec<u64> = match self.0 {
            ArithStat::MaxDeg | ArithStat::AvgDeg => subs
                .iter()
                .filter(|&&t| is_arith_atom(tm, t))
                .filter_map(|&t| {
                    let ch = tm.kind(t)?.children();
                    Some(degree(tm, ch[0]).max(degree(tm, ch[1])))
                })
                .collect(),
            ArithStat::MaxBw | ArithStat::AvgBw => {
                subs.iter().filter_map(|&t| bit_width(tm, t)).collect()
            }
        };
        if values.is_empty() {
            return 0.0;
        }
        match self.0 {
            ArithStat::MaxDeg | ArithStat::MaxBw => values.iter().copied().max().unwrap_or(0) as f64,
            ArithStat::AvgDeg | ArithStat::AvgBw => {
                values.iter().sum::<u64>() as f64 / values.len() as f64
            }
        }
    }
}

// ----- combinators -----

/// A constant.
#[derive(Debug, Clone, Copy)]
pub struct ConstProbe(pub f64);

impl Probe for ConstProbe {
    fn name(&self) -> &str {
        "const"
    }

    fn evaluate(&self, _goal: &Goal, _tm: &TermManager) -> f64 {
        self.0
    }
}

/// Binary operators over probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `=`
    Eq,
    /// Both non-zero
    And,
    /// Either non-zero
    Or,
    /// First zero or second non-zero
    Implies,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "=",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Implies => "implies",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }

    fn eval(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Lt => flag(a < b),
            BinOp::Le => flag(a <= b),
            BinOp::Gt => flag(a > b),
            BinOp::Ge => flag(a >= b),
            BinOp::Eq => flag(a == b),
            BinOp::And => flag(a != 0.0 && b != 0.0),
            BinOp::Or => flag(a != 0.0 || b != 0.0),
            BinOp::Implies => flag(a == 0.0 || b != 0.0),
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
        }
    }
}

/// Binary combination of two probes.
#[derive(Debug, Clone)]
pub struct BinProbe {
    op: BinOp,
    lhs: ProbeRef,
    rhs: ProbeRef,
}

impl Probe for BinProbe {
    fn name(&self) -> &str {
        self.op.symbol()
    }

    fn evaluate(&self, goal: &Goal, tm: &TermManager) -> f64 {
        let a = self.lhs.evaluate(goal, tm);
        // connectives short-circuit
        match (self.op, a != 0.0) {
            (BinOp::And, false) => return 0.0,
            (BinOp::Or, true) => return 1.0,
            (BinOp::Implies, false) => return 1.0,
            _ => {}
        }
        self.op.eval(a, self.rhs.evaluate(goal, tm))
    }
}

/// Boolean negation of a probe.
#[derive(Debug, Clone)]
pub struct NotProbe(pub ProbeRef);

impl Probe for NotProbe {
    fn name(&self) -> &str {
        "not"
    }

    fn evaluate(&self, goal: &Goal, tm: &TermManager) -> f64 {
        flag(self.0.evaluate(goal, tm) == 0.0)
    }
}

// ----- constructors -----

/// Combine two probes with `op`.
pub fn bin(op: BinOp, lhs: ProbeRef, rhs: ProbeRef) -> ProbeRef {
    Arc::new(BinProbe { op, lhs, rhs })
}

/// `a < b`.
pub fn lt(a: ProbeRef, b: ProbeRef) -> ProbeRef {
    bin(BinOp::Lt, a, b)
}

/// `a <= b`.
pub fn le(a: ProbeRef, b: ProbeRef) -> ProbeRef {
    bin(BinOp::Le, a, b)
}

/// `a > b`.
pub fn gt(a: ProbeRef, b: ProbeRef) -> ProbeRef {
    bin(BinOp::Gt, a, b)
}

/// `a >= b`.
pub fn ge(a: ProbeRef, b: ProbeRef) -> ProbeRef {
    bin(BinOp::Ge, a, b)
}

/// `a = b`.
pub fn eq(a: ProbeRef, b: ProbeRef) -> ProbeRef {
    bin(BinOp::Eq, a, b)
}

/// Conjunction.
pub fn and(a: ProbeRef, b: ProbeRef) -> ProbeRef {
    bin(BinOp::And, a, b)
}

/// Disjunction.
pub fn or(a: ProbeRef, b: ProbeRef) -> ProbeRef {
    bin(BinOp::Or, a, b)
}

/// Implication.
pub fn implies(a: ProbeRef, b: ProbeRef) -> ProbeRef {
    bin(BinOp::Implies, a, b)
}

/// Negation.
pub fn not(p: ProbeRef) -> ProbeRef {
    Arc::new(NotProbe(p))
}

/// Constant probe.
pub fn constant(v: f64) -> ProbeRef {
    Arc::new(ConstProbe(v))
}

/// Probe over a goal measure.
pub fn measure(m: Measure) -> ProbeRef {
    Arc::new(MeasureProbe(m))
}

/// Probe over a fragment.
pub fn fragment(f: Fragment) -> ProbeRef {
    Arc::new(FragmentProbe(f))
}

const MEASURES: [Measure; 11] = [
    Measure::Size,
    Measure::NumExprs,
    Measure::NumConsts,
    Measure::Depth,
    Measure::IsInconsistent,
    Measure::IsDecidedSat,
    Measure::IsDecidedUnsat,
    Measure::ProduceProofs,
    Measure::ProduceModels,
    Measure::ProduceUnsatCores,
    Measure::HasQuantifiers,
];

const FRAGMENTS: [Fragment; 11] = [
    Fragment::Propositional,
    Fragment::QfBv,
    Fragment::QfLia,
    Fragment::QfLra,
    Fragment::QfLira,
    Fragment::Ilp,
    Fragment::Mip,
    Fragment::QfNia,
    Fragment::QfNra,
    Fragment::Nia,
    Fragment::Nra,
];

const ARITH_STATS: [ArithStat; 4] = [
    ArithStat::MaxDeg,
    ArithStat::AvgDeg,
    ArithStat::MaxBw,
    ArithStat::AvgBw,
];

/// All named probes.
pub fn builtin_probes() -> Vec<ProbeRef> {
    let mut out: Vec<ProbeRef> = MEASURES.iter().map(|&m| measure(m)).collect();
    out.extend(FRAGMENTS.iter().map(|&f| fragment(f)));
    out.extend(
        ARITH_STATS
            .iter()
            .map(|&s| Arc::new(ArithProbe(s)) as ProbeRef),
    );
    out
}

/// Probe by name.
pub fn mk_probe(name: &str) -> Option<ProbeRef> {
    builtin_probes().into_iter().find(|p| p.name() == name)
}
