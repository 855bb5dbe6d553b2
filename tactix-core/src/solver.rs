//! One-shot solver adapter over a tactic.
//!
//! [`TacticSolver`] collects assertions, and on [`TacticSolver::check_sat`]
//! packs them into a fresh goal, runs the tactic once and reads the verdict
//! off the result: no subgoals or a single decided-sat subgoal is `sat`, a
//! single decided-unsat subgoal is `unsat`, anything else is `unknown`.
//! Errors never escape `check_sat`; they become `unknown` with the error
//! message as the reason.
//!
//! ## References
//!
//! - Z3's `solver/tactic2solver.cpp`

use crate::ast::{TermId, TermManager};
use crate::dependency::DependencySet;
use crate::error::Result;
use crate::goal::Goal;
use crate::model::Model;
use crate::proof::Proof;
use crate::resource::{CancellationToken, Deadline, ResourceLimits, TacticContext};
use crate::tactic::{ApplyResult, Tactic};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Result of a satisfiability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveResult {
    /// Satisfiable
    Sat,
    /// Unsatisfiable
    Unsat,
    /// Unknown (timeout, incomplete, error)
    Unknown,
}

impl fmt::Display for SolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sat => write!(f, "sat"),
            Self::Unsat => write!(f, "unsat"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Solver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Reconstruct a model on `sat`
    pub produce_models: bool,
    /// Reconstruct a proof on `unsat`
    pub produce_proofs: bool,
    /// Track assumptions for unsat cores
    pub produce_unsat_cores: bool,
    /// Wall-clock budget per check in milliseconds
    pub timeout_ms: Option<u64>,
    /// Memory and step limits
    pub limits: ResourceLimits,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            produce_models: true,
            produce_proofs: false,
            produce_unsat_cores: false,
            timeout_ms: None,
            limits: ResourceLimits::default(),
        }
    }
}

/// Solver that answers `check_sat` by running a tactic once.
#[derive(Debug)]
pub struct TacticSolver {
    tactic: Box<dyn Tactic>,
    config: SolverConfig,
    /// Assertions with their tracked flag
    assertions: Vec<(TermId, bool)>,
    /// Assertion counts at each push
    scopes: Vec<usize>,
    token: CancellationToken,
    model: Option<Model>,
    proof: Option<Proof>,
    unsat_core: Vec<TermId>,
    reason_unknown: Option<String>,
}

impl TacticSolver {
    /// Solver running `tactic` with the default configuration.
    pub fn new(tactic: Box<dyn Tactic>) -> Self {
        Self {
            tactic,
            config: SolverConfig::default(),
            assertions: Vec::new(),
            scopes: Vec::new(),
            token: CancellationToken::new(),
            model: None,
            proof: None,
            unsat_core: Vec::new(),
            reason_unknown: None,
        }
    }

    /// Solver with an explicit configuration.
    ///
    /// Fails when the configuration asks for proofs and unsat cores at once.
    pub fn with_config(tactic: Box<dyn Tactic>, config: SolverConfig) -> Result<Self> {
        let mut solver = Self::new(tactic);
        solver.set_config(config)?;
        Ok(solver)
    }

    /// The configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Replace the configuration.
    pub fn set_config(&mut self, config: SolverConfig) -> Result<()> {
        Goal::new(
            config.produce_models,
            config.produce_proofs,
            config.produce_unsat_cores,
        )?;
        self.config = config;
        Ok(())
    }

    /// Token that cancels a running check.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Add an assertion.
    pub fn assert(&mut self, term: TermId) {
        self.assertions.push((term, false));
    }

    /// Add an assumption that may appear in unsat cores.
    pub fn assert_tracked(&mut self, term: TermId) {
        self.assertions.push((term, true));
    }

    /// Current assertions, oldest first.
    pub fn assertions(&self) -> impl Iterator<Item = TermId> + '_ {
        self.assertions.iter().map(|&(t, _)| t)
    }

    /// Push a context level
    pub fn push(&mut self) {
        self.scopes.push(self.assertions.len());
    }

    /// Pop a context level
    pub fn pop(&mut self) {
        if let Some(n) = self.scopes.pop() {
            self.assertions.truncate(n);
        }
    }

    /// Number of open context levels.
    pub fn num_scopes(&self) -> usize {
        self.scopes.len()
    }

    /// Drop all assertions, scopes and results.
    pub fn reset(&mut self) {
        self.assertions.clear();
        self.scopes.clear();
        self.clear_results();
        self.tactic.cleanup();
    }

    /// Check the conjunction of the current assertions.
    pub fn check_sat(&mut self, tm: &mut TermManager) -> SolveResult {
        self.clear_results();
        let mut goal = match Goal::new(
            self.config.produce_models,
            self.config.produce_proofs,
            self.config.produce_unsat_cores,
        ) {
            Ok(g) => g,
            Err(e) => return self.unknown(e.to_string()),
        };
        for &(t, tracked) in &self.assertions {
            if tracked {
                goal.assert_tracked(tm, t);
            } else {
                goal.assert_expr(tm, t);
            }
        }

        let mut ctx = TacticContext::with_token(tm, self.token.clone())
            .with_limits(self.config.limits);
        ctx.set_deadline(self.config.timeout_ms.map(Deadline::after_ms));
        let outcome = self.tactic.apply(goal, &mut ctx);
        let result = match outcome {
            Ok(r) => self.read_verdict(tm, r),
            Err(e) => {
                self.tactic.cleanup();
                self.unknown(e.to_string())
            }
        };
        debug!(
            tactic = self.tactic.name(),
            assertions = self.assertions.len(),
            result = %result,
            "check-sat"
        );
        result
    }

    fn read_verdict(&mut self, tm: &mut TermManager, r: ApplyResult) -> SolveResult {
        match r.subgoals.as_slice() {
            [] => self.sat(tm, &r),
            [g] if g.is_decided_sat() => self.sat(tm, &r),
            [g] if g.is_decided_unsat() => {
                if self.config.produce_proofs
                    && let Some(pr) = g.pr(0)
                {
                    let proof = match &r.pc {
                        Some(pc) => pc.apply(tm, std::slice::from_ref(pr)),
                        None => Ok(pr.clone()),
                    };
                    match proof {
                        Ok(p) => self.proof = Some(p),
                        Err(e) => return self.unknown(e.to_string()),
                    }
                }
                if let Some(deps) = DependencySet::join(r.core.as_ref(), g.dep(0)) {
                    self.unsat_core = deps.iter().collect();
                }
                SolveResult::Unsat
            }
            _ => self.unknown("incomplete".to_string()),
        }
    }

    fn sat(&mut self, tm: &mut TermManager, r: &ApplyResult) -> SolveResult {
        if self.config.produce_models {
            let mut model = Model::new();
            if let Some(mc) = &r.mc
                && let Err(e) = mc.apply(tm, &mut model, 0)
            {
                return self.unknown(e.to_string());
            }
            self.model = Some(model);
        }
        SolveResult::Sat
    }

    fn unknown(&mut self, reason: String) -> SolveResult {
        self.reason_unknown = Some(reason);
        SolveResult::Unknown
    }

    fn clear_results(&mut self) {
        self.model = None;
        self.proof = None;
        self.unsat_core.clear();
        self.reason_unknown = None;
    }

    /// Model of the last `sat` answer.
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Proof of the last `unsat` answer.
    pub fn proof(&self) -> Option<&Proof> {
        self.proof.as_ref()
    }

    /// Tracked assertions responsible for the last `unsat` answer.
    pub fn get_unsat_core(&self) -> &[TermId] {
        &self.unsat_core
    }

    /// Why the last check answered `unknown`.
    pub fn reason_unknown(&self) -> Option<&str> {
        self.reason_unknown.as_deref()
    }
}

/// Solver adapter over `tactic` with the default configuration.
pub fn mk_solver(tactic: Box<dyn Tactic>) -> TacticSolver {
    TacticSolver::new(tactic)
}
