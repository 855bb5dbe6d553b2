//! Proof objects.
//!
//! A proof is an immutable tree of steps shared through [`Arc`]. Each step
//! names the inference rule, its premises and the formula it concludes.
//! Tactics build proofs alongside formulas when a goal requests them;
//! proof converters stitch the proofs of subgoals back together.
//!
//! Certificate checking is out of scope; [`Proof::is_closed`] and
//! [`Proof::size`] are the only structural queries.

use crate::ast::{TermId, TermManager};
use std::fmt;
use std::sync::Arc;

/// Inference rule of a proof step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofRule {
    /// Input assertion
    Asserted,
    /// Local assumption, discharged by [`ProofRule::Lemma`]
    Hypothesis,
    /// `t = t'` by rewriting
    Rewrite,
    /// From `p` and `p = q` conclude `q`
    ModusPonens,
    /// From a conjunction conclude one conjunct
    AndElim,
    /// From `not (or ...)` conclude the negation of one disjunct
    NotOrElim,
    /// Resolve a clause against unit literals
    UnitResolution,
    /// Discharge hypotheses of a refutation
    Lemma,
    /// Replace eliminated constants by their definitions
    Substitution,
    /// Bit-level encoding of a bit-vector formula
    BitBlast,
}

impl ProofRule {
    /// Name used when printing.
    pub fn name(self) -> &'static str {
        match self {
            ProofRule::Asserted => "asserted",
            ProofRule::Hypothesis => "hypothesis",
            ProofRule::Rewrite => "rewrite",
            ProofRule::ModusPonens => "mp",
            ProofRule::AndElim => "and-elim",
            ProofRule::NotOrElim => "not-or-elim",
            ProofRule::UnitResolution => "unit-resolution",
            ProofRule::Lemma => "lemma",
            ProofRule::Substitution => "substitution",
            ProofRule::BitBlast => "bit-blast",
        }
    }
}

/// A step of a proof tree.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ProofNode {
    rule: ProofRule,
    premises: Vec<Proof>,
    conclusion: TermId,
}

/// Shared handle to a proof tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Proof(Arc<ProofNode>);

impl Proof {
    /// Proof step with explicit premises.
    pub fn new(rule: ProofRule, premises: Vec<Proof>, conclusion: TermId) -> Self {
        Proof(Arc::new(ProofNode {
            rule,
            premises,
            conclusion,
        }))
    }

    /// `f` is an input assertion.
    pub fn asserted(f: TermId) -> Self {
        Self::new(ProofRule::Asserted, Vec::new(), f)
    }

    /// `f` is assumed.
    pub fn hypothesis(f: TermId) -> Self {
        Self::new(ProofRule::Hypothesis, Vec::new(), f)
    }

    /// `from = to` by rewriting.
    pub fn rewrite(tm: &mut TermManager, from: TermId, to: TermId) -> Self {
        let eq = tm.mk_eq(from, to);
        Self::new(ProofRule::Rewrite, Vec::new(), eq)
    }

    /// From a proof of `p` and a proof of `p = q`, conclude `q`.
    pub fn modus_ponens(p: Proof, eq: Proof, q: TermId) -> Self {
        Self::new(ProofRule::ModusPonens, vec![p, eq], q)
    }

    /// `p` followed by a rewrite to `q`; `p` itself when nothing changed.
    pub fn mp_rewrite(tm: &mut TermManager, p: Proof, q: TermId) -> Self {
        let from = p.conclusion();
        if from == q {
            return p;
        }
        let eq = Self::rewrite(tm, from, q);
        Self::modus_ponens(p, eq, q)
    }

    /// A conjunct of the conjunction proved by `p`.
    pub fn and_elim(p: Proof, conjunct: TermId) -> Self {
        Self::new(ProofRule::AndElim, vec![p], conjunct)
    }

    /// A negated disjunct of the negated disjunction proved by `p`.
    pub fn not_or_elim(p: Proof, negated: TermId) -> Self {
        Self::new(ProofRule::NotOrElim, vec![p], negated)
    }

    /// Resolution of a clause proof with unit proofs.
    pub fn unit_resolution(premises: Vec<Proof>, conclusion: TermId) -> Self {
        Self::new(ProofRule::UnitResolution, premises, conclusion)
    }

    /// Discharge the hypotheses of a refutation `p`, concluding `conclusion`.
    pub fn lemma(p: Proof, conclusion: TermId) -> Self {
        Self::new(ProofRule::Lemma, vec![p], conclusion)
    }

    /// Substitution of solved constants, justified by the equation proofs.
    pub fn substitution(premises: Vec<Proof>, conclusion: TermId) -> Self {
        Self::new(ProofRule::Substitution, premises, conclusion)
    }

    /// Bit-level encoding of the formula proved by `p`.
    pub fn bit_blast(p: Proof, conclusion: TermId) -> Self {
        Self::new(ProofRule::BitBlast, vec![p], conclusion)
    }

    /// Inference rule.
    pub fn rule(&self) -> ProofRule {
        self.0.rule
    }

    /// Premises.
    pub fn premises(&self) -> &[Proof] {
        &self.0.premises
    }

    /// Concluded formula.
    pub fn conclusion(&self) -> TermId {
        self.0.conclusion
    }

    /// Number of steps, counting shared subproofs once.
    pub fn size(&self) -> usize {
        let mut seen: Vec<*const ProofNode> = Vec::new();
        let mut stack = vec![self];
        while let Some(p) = stack.pop() {
            let ptr = Arc::as_ptr(&p.0);
            if seen.contains(&ptr) {
                continue;
            }
            seen.push(ptr);
            stack.extend(p.premises());
        }
        seen.len()
    }

    /// Whether every hypothesis is discharged by an enclosing lemma.
    pub fn is_closed(&self) -> bool {
        fn open(p: &Proof) -> bool {
            match p.rule() {
                ProofRule::Hypothesis => true,
                ProofRule::Lemma => false,
                _ => p.premises().iter().any(open),
            }
        }
        !open(self)
    }

    /// Printer in S-expression form.
    pub fn display<'a>(&'a self, tm: &'a TermManager) -> ProofDisplay<'a> {
        ProofDisplay { tm, proof: self }
    }
}

/// Display adapter returned by [`Proof::display`].
pub struct ProofDisplay<'a> {
    tm: &'a TermManager,
    proof: &'a Proof,
}

impl fmt::Display for ProofDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.proof.rule().name())?;
        for p in self.proof.premises() {
            write!(
                f,
                " {}",
                ProofDisplay {
                    tm: self.tm,
                    proof: p
                }
            )?;
        }
        write!(f, " {})", self.tm.display(self.proof.conclusion()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mp_rewrite_skips_identity() {
        let mut tm = TermManager::new();
        let p = tm.mk_var("p", tm.sorts.bool_sort);
        let q = tm.mk_var("q", tm.sorts.bool_sort);
        let a = Proof::asserted(p);
        assert_eq!(Proof::mp_rewrite(&mut tm, a.clone(), p), a);
        let b = Proof::mp_rewrite(&mut tm, a, q);
        assert_eq!(b.rule(), ProofRule::ModusPonens);
        assert_eq!(b.conclusion(), q);
        assert_eq!(b.size(), 3);
    }

    #[test]
    fn test_closed_lemma() {
        let mut tm = TermManager::new();
        let p = tm.mk_var("p", tm.sorts.bool_sort);
        let np = tm.mk_not(p);
        let h = Proof::hypothesis(p);
        assert!(!h.is_closed());
        let l = Proof::lemma(h, np);
        assert!(l.is_closed());
        assert_eq!(l.display(&tm).to_string(), "(lemma (hypothesis p) (not p))");
    }
}
