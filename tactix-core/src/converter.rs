//! Model and proof converters.
//!
//! A tactic that turns a goal into subgoals returns converters that map
//! answers for the subgoals back to answers for the goal it was given:
//!
//! - a [`ModelConverter`] takes a model of subgoal `i` and extends or
//!   restricts it into a model of the input goal;
//! - a [`ProofConverter`] takes refutations of all subgoals and combines
//!   them into a refutation of the input goal.
//!
//! Both are closed enums. Composition happens through the `Concat` and
//! `Split` variants built by the sequential combinators.
//!
//! ## References
//!
//! - Z3's `tactic/model_converter.h`, `ast/converters/generic_model_converter.cpp`
//! - Z3's `ast/converters/proof_converter.cpp`

use crate::ast::{TermId, TermManager};
use crate::error::{Result, TactixError};
use crate::model::Model;
use crate::proof::Proof;
use num_bigint::BigInt;
use num_traits::{One, Zero};

/// Where the subgoals of one parent subgoal ended up after a sequential step.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// Index of the subgoal of the first tactic
    pub parent_idx: usize,
    /// Converter produced by the second tactic on that subgoal
    pub child: Option<ModelConverter>,
    /// Number of subgoals the second tactic produced for it
    pub count: usize,
}

/// Maps a model of a subgoal to a model of the original goal.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelConverter {
    /// Define eliminated constants, last definition first.
    ///
    /// A definition may mention constants defined later in the list.
    Extension(Vec<(TermId, TermId)>),
    /// Hide auxiliary constants.
    Filter(Vec<TermId>),
    /// Rebuild bit-vector constants from their bits (least significant
    /// first) and hide the bits.
    BitBlast(Vec<(TermId, Vec<TermId>)>),
    /// Sequential composition in application order; applied back to front.
    Concat(Vec<ModelConverter>),
    /// Sequential composition over several subgoals.
    Split {
        /// Converter of the first tactic
        parent: Option<Box<ModelConverter>>,
        /// Subgoal routing, in subgoal order
        branches: Vec<Branch>,
    },
}

impl ModelConverter {
    /// Compose two optional converters, `first` being applied by the
    /// earlier tactic.
    pub fn concat(first: Option<ModelConverter>, second: Option<ModelConverter>) -> Option<ModelConverter> {
        match (first, second) {
            (None, b) => b,
            (a, None) => a,
            (Some(a), Some(b)) => {
                let mut parts = a.into_parts();
                parts.extend(b.into_parts());
                Some(ModelConverter::Concat(parts))
            }
        }
    }

    fn into_parts(self) -> Vec<ModelConverter> {
        match self {
            ModelConverter::Concat(parts) => parts,
            mc => vec![mc],
        }
    }

    /// Turn `model`, a model of subgoal `goal_idx`, into a model of the
    /// goal the converter was produced for.
    pub fn apply(&self, tm: &mut TermManager, model: &mut Model, goal_idx: usize) -> Result<()> {
        match self {
            ModelConverter::Extension(defs) => {
                for &(var, def) in defs.iter().rev() {
                    let value = model.eval(tm, def, true)?;
                    model.register(var, value);
                }
                Ok(())
            }
            ModelConverter::Filter(hidden) => {
                for &v in hidden {
                    model.remove(v);
                }
                Ok(())
            }
            ModelConverter::BitBlast(consts) => {
                for (c, bits) in consts {
                    let mut value = BigInt::zero();
                    for (i, &b) in bits.iter().enumerate() {
                        let bit = model.get(b).is_some_and(|v| tm.is_true(v));
                        if bit {
                            value += BigInt::one() << i;
                        }
                    }
                    let width = u32::try_from(bits.len())
                        .map_err(|_| TactixError::Internal("bit-vector too wide".to_string()))?;
                    let v = tm.mk_bv(value, width);
                    model.register(*c, v);
                    for &b in bits {
                        model.remove(b);
                    }
                }
                Ok(())
            }
            ModelConverter::Concat(parts) => {
                let last = parts.len().saturating_sub(1);
                for (i, mc) in parts.iter().enumerate().rev() {
                    let idx = if i == last { goal_idx } else { 0 };
                    mc.apply(tm, model, idx)?;
                }
                Ok(())
            }
            ModelConverter::Split { parent, branches } => {
                let mut offset = 0;
                for br in branches {
                    if goal_idx < offset + br.count {
                        if let Some(child) = &br.child {
                            child.apply(tm, model, goal_idx - offset)?;
                        }
                        if let Some(parent) = parent {
                            parent.apply(tm, model, br.parent_idx)?;
                        }
                        return Ok(());
                    }
                    offset += br.count;
                }
                Err(TactixError::Internal(format!(
                    "model converter has no subgoal {goal_idx}"
                )))
            }
        }
    }
}

/// Maps refutations of the subgoals to a refutation of the original goal.
#[derive(Debug, Clone, PartialEq)]
pub enum ProofConverter {
    /// The goal was split on the disjuncts of `clause`; subgoal `i`
    /// assumes disjunct `i`.
    SplitClause {
        /// The clause that was split
        clause: TermId,
        /// Proof of the clause in the original goal
        clause_proof: Proof,
    },
    /// Sequential composition: the proofs of consecutive groups of
    /// subgoals (`counts`) go through the matching child converter, the
    /// results through `parent`.
    Concat {
        /// Converter of the first tactic
        parent: Option<Box<ProofConverter>>,
        /// Converter of the second tactic per subgoal of the first
        children: Vec<Option<ProofConverter>>,
        /// Number of subgoals per child
        counts: Vec<usize>,
    },
}

impl ProofConverter {
    /// Combine refutations of the subgoals into a refutation of the goal.
    pub fn apply(&self, tm: &mut TermManager, proofs: &[Proof]) -> Result<Proof> {
        match self {
            ProofConverter::SplitClause {
                clause,
                clause_proof,
            } => {
                let Some(crate::ast::TermKind::Or(lits)) = tm.kind(*clause).cloned() else {
                    return Err(TactixError::Internal("split clause is not a disjunction".to_string()));
                };
                if lits.len() != proofs.len() {
                    return Err(TactixError::Internal(format!(
                        "expected {} proofs, got {}",
                        lits.len(),
                        proofs.len()
                    )));
                }
                let mut premises = Vec::with_capacity(lits.len() + 1);
                premises.push(clause_proof.clone());
                for (&l, p) in lits.iter().zip(proofs) {
                    let nl = tm.mk_not(l);
                    premises.push(Proof::lemma(p.clone(), nl));
                }
                Ok(Proof::unit_resolution(premises, tm.mk_false()))
            }
            ProofConverter::Concat {
                parent,
                children,
                counts,
            } => {
                let mut offset = 0;
                let mut mid = Vec::with_capacity(children.len());
                for (child, &n) in children.iter().zip(counts) {
                    let group = proofs
                        .get(offset..offset + n)
                        .ok_or_else(|| TactixError::Internal("too few subgoal proofs".to_string()))?;
                    offset += n;
                    match (child, group) {
                        (Some(pc), _) => mid.push(pc.apply(tm, group)?),
                        (None, [p]) => mid.push(p.clone()),
                        (None, _) => {
                            return Err(TactixError::Internal(
                                "missing proof converter for split subgoal".to_string(),
                            ));
                        }
                    }
                }
                match (parent, mid.as_slice()) {
                    (Some(pc), _) => pc.apply(tm, &mid),
                    (None, [p]) => Ok(p.clone()),
                    (None, _) => Err(TactixError::Internal(
                        "missing proof converter for split goal".to_string(),
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::ProofRule;

    #[test]
    fn test_extension_applied_in_reverse() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let z = tm.mk_var("z", tm.sorts.int_sort);
        let one = tm.mk_int(1);
        let two = tm.mk_int(2);
        // x was eliminated first as y + 1, then y as z + 2
        let y1 = tm.mk_add([y, one]);
        let z2 = tm.mk_add([z, two]);
        let mc = ModelConverter::Extension(vec![(x, y1), (y, z2)]);
        let mut m = Model::new();
        let ten = tm.mk_int(10);
        m.register(z, ten);
        mc.apply(&mut tm, &mut m, 0).unwrap();
        assert_eq!(m.get(y), Some(tm.mk_int(12)));
        assert_eq!(m.get(x), Some(tm.mk_int(13)));
    }

    #[test]
    fn test_bit_blast_rebuilds_value() {
        let mut tm = TermManager::new();
        let bv4 = tm.sorts.bitvec(4);
        let c = tm.mk_var("c", bv4);
        let bits: Vec<TermId> = (0..4)
            .map(|i| tm.mk_var(&format!("c!{i}"), tm.sorts.bool_sort))
            .collect();
        let mut m = Model::new();
        m.register(bits[0], tm.mk_true());
        m.register(bits[2], tm.mk_true());
        m.register(bits[3], tm.mk_false());
        let mc = ModelConverter::BitBlast(vec![(c, bits.clone())]);
        mc.apply(&mut tm, &mut m, 0).unwrap();
        assert_eq!(m.get(c), Some(tm.mk_bv(5, 4)));
        assert!(bits.iter().all(|&b| !m.contains(b)));
    }

    #[test]
    fn test_concat_flattens_and_routes_index() {
        let mut tm = TermManager::new();
        let a = tm.mk_var("a", tm.sorts.bool_sort);
        let b = tm.mk_var("b", tm.sorts.bool_sort);
        let first = ModelConverter::Filter(vec![a]);
        let second = ModelConverter::Filter(vec![b]);
        let third = ModelConverter::Extension(vec![]);
        let ab = ModelConverter::concat(Some(first.clone()), Some(second.clone()));
        let left = ModelConverter::concat(ab, Some(third.clone()));
        let bc = ModelConverter::concat(Some(second), Some(third));
        let right = ModelConverter::concat(Some(first), bc);
        assert_eq!(left, right);

        let mut m = Model::new();
        m.register(a, tm.mk_true());
        m.register(b, tm.mk_true());
        left.unwrap().apply(&mut tm, &mut m, 3).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn test_split_routes_to_branch() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let one = tm.mk_int(1);
        let two = tm.mk_int(2);
        let mc = ModelConverter::Split {
            parent: None,
            branches: vec![
                Branch {
                    parent_idx: 0,
                    child: Some(ModelConverter::Extension(vec![(x, one)])),
                    count: 2,
                },
                Branch {
                    parent_idx: 1,
                    child: Some(ModelConverter::Extension(vec![(y, two)])),
                    count: 1,
                },
            ],
        };
        let mut m = Model::new();
        mc.apply(&mut tm, &mut m, 2).unwrap();
        assert_eq!(m.get(y), Some(two));
        assert!(!m.contains(x));
        assert!(mc.apply(&mut tm, &mut m, 3).is_err());
    }

    #[test]
    fn test_split_clause_proof() {
        let mut tm = TermManager::new();
        let a = tm.mk_var("a", tm.sorts.bool_sort);
        let b = tm.mk_var("b", tm.sorts.bool_sort);
        let clause = tm.mk_or([a, b]);
        let f = tm.mk_false();
        let pc = ProofConverter::SplitClause {
            clause,
            clause_proof: Proof::asserted(clause),
        };
        let refute = |h| Proof::unit_resolution(vec![Proof::hypothesis(h)], f);
        let pr = pc.apply(&mut tm, &[refute(a), refute(b)]).unwrap();
        assert_eq!(pr.rule(), ProofRule::UnitResolution);
        assert_eq!(pr.conclusion(), f);
        assert_eq!(pr.premises().len(), 3);
        assert_eq!(pr.premises()[1].conclusion(), tm.mk_not(a));
        assert!(pc.apply(&mut tm, &[refute(a)]).is_err());
    }
}
