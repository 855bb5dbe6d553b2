//! Tactix Core - goals, tactics and the arithmetic rewriter
//!
//! This crate provides the transformation layer of the Tactix SMT core:
//! - Hash-consed terms with [`TermId`] references ([`ast`], [`sort`])
//! - Goals with proof, model and unsat-core tracking ([`goal`])
//! - Bottom-up rewriting with boolean, arithmetic and bit-vector rules
//!   ([`rewrite`])
//! - Composable tactics, probes and combinators ([`tactic`])
//! - Model and proof reconstruction ([`model`], [`converter`], [`proof`])
//! - A one-shot solver adapter over any tactic ([`solver`])
//!
//! # Examples
//!
//! ## Rewriting
//!
//! ```
//! use tactix_core::ast::TermManager;
//! use tactix_core::rewrite::ThRewriter;
//!
//! let mut tm = TermManager::new();
//! let x = tm.mk_var("x", tm.sorts.int_sort);
//! let two = tm.mk_int(2);
//! let five = tm.mk_int(5);
//! let lhs = tm.mk_mul([two, x]);
//! let atom = tm.mk_le(lhs, five);
//!
//! let mut rw = ThRewriter::default();
//! let r = rw.rewrite(&mut tm, atom).unwrap();
//! assert_eq!(tm.display(r).to_string(), "(<= x 2)");
//! ```
//!
//! ## Running a tactic
//!
//! ```
//! use tactix_core::ast::TermManager;
//! use tactix_core::goal::Goal;
//! use tactix_core::resource::TacticContext;
//! use tactix_core::tactic::{Tactic, and_then, mk_simplify_tactic, mk_solve_eqs_tactic};
//!
//! let mut tm = TermManager::new();
//! let x = tm.mk_var("x", tm.sorts.real_sort);
//! let y = tm.mk_var("y", tm.sorts.real_sort);
//! let two = tm.mk_real(tactix_math::rational::rat(2));
//! let rhs = tm.mk_add([y, two]);
//! let eq = tm.mk_eq(x, rhs);
//!
//! let mut goal = Goal::new(true, false, false).unwrap();
//! goal.assert_expr(&mut tm, eq);
//!
//! let mut tactic = and_then(mk_simplify_tactic(), mk_solve_eqs_tactic());
//! let mut ctx = TacticContext::new(&mut tm);
//! let result = tactic.apply(goal, &mut ctx).unwrap();
//! assert!(result.subgoals[0].is_decided_sat());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod converter;
pub mod dependency;
pub mod error;
pub mod goal;
pub mod model;
pub mod params;
pub mod proof;
pub mod resource;
pub mod rewrite;
pub mod solver;
pub mod sort;
pub mod tactic;

pub use ast::{TermId, TermKind, TermManager};
pub use converter::{ModelConverter, ProofConverter};
pub use dependency::DependencySet;
pub use error::{Result, TactixError};
pub use goal::Goal;
pub use model::Model;
pub use params::{ParamDescrs, ParamKind, ParamValue, Params};
pub use proof::{Proof, ProofRule};
pub use resource::{CancellationToken, ResourceLimits, TacticContext};
pub use rewrite::{ArithRewriterConfig, BrResult, BrStatus, RewriterConfig, ThRewriter};
pub use solver::{SolveResult, TacticSolver, mk_solver};
pub use sort::{SortId, SortKind, SortManager};
pub use tactic::{ApplyResult, Tactic};
