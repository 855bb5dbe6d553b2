//! Name registry for tactics and probes.
//!
//! Strategy front ends refer to tactics by name (`"simplify"`,
//! `"solve-eqs"`). The registry maps each name to a factory producing a
//! fresh instance, and forwards probe names to [`probe::mk_probe`].

use super::probe::{self, ProbeRef};
use super::{
    Tactic, fail, fail_if_undecided, mk_bit_blast_tactic, mk_elim_and_tactic, mk_simplify_tactic,
    mk_solve_eqs_tactic, mk_split_clause_tactic, skip, using_params,
};
use crate::error::{Result, TactixError};
use crate::params::{ParamDescrs, Params};
use std::collections::BTreeMap;
use std::fmt;

/// Produces a fresh tactic instance.
pub type TacticFactory = Box<dyn Fn() -> Box<dyn Tactic> + Send + Sync>;

struct Entry {
    description: String,
    factory: TacticFactory,
}

/// Tactic factories by name.
pub struct TacticRegistry {
    tactics: BTreeMap<String, Entry>,
}

impl fmt::Debug for TacticRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TacticRegistry")
            .field("tactics", &self.tactics.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for TacticRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl TacticRegistry {
    /// Registry without any entry.
    pub fn empty() -> Self {
        Self {
            tactics: BTreeMap::new(),
        }
    }

    /// Registry with the built-in tactics.
    pub fn with_builtins() -> Self {
        let mut r = Self::empty();
        r.register("simplify", "apply the theory rewriter to every formula", mk_simplify_tactic);
        r.register("elim-and", "simplify, turning conjunctions into negated disjunctions", mk_elim_and_tactic);
        r.register("solve-eqs", "eliminate variables defined by equations", mk_solve_eqs_tactic);
        r.register("split-clause", "case split on a clause of the goal", mk_split_clause_tactic);
        r.register("bit-blast", "reduce bit-vector constraints to propositional logic", mk_bit_blast_tactic);
        r.register("skip", "do nothing", skip);
        r.register("fail", "always fail", || fail("fail tactic"));
        r.register("fail-if-undecided", "fail if the goal is undecided", fail_if_undecided);
        r
    }

    /// Add or replace the factory registered under `name`.
    pub fn register<F>(&mut self, name: &str, description: &str, factory: F)
    where
        F: Fn() -> Box<dyn Tactic> + Send + Sync + 'static,
    {
        self.tactics.insert(
            name.to_string(),
            Entry {
                description: description.to_string(),
                factory: Box::new(factory),
            },
        );
    }

    /// Whether a tactic is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.tactics.contains_key(name)
    }

    /// Registered names with their descriptions, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tactics
            .iter()
            .map(|(n, e)| (n.as_str(), e.description.as_str()))
    }

    /// Fresh instance of the tactic named `name`.
    pub fn mk_tactic(&self, name: &str) -> Result<Box<dyn Tactic>> {
        self.tactics
            .get(name)
            .map(|e| (e.factory)())
            .ok_or_else(|| TactixError::invalid_parameter(name, "unknown tactic"))
    }

    /// Fresh instance of `name` running with `params`.
    pub fn mk_tactic_with(&self, name: &str, params: Params) -> Result<Box<dyn Tactic>> {
        using_params(self.mk_tactic(name)?, params)
    }

    /// Parameter descriptions of the tactic named `name`.
    pub fn param_descrs(&self, name: &str) -> Result<ParamDescrs> {
        let mut descrs = ParamDescrs::new();
        self.mk_tactic(name)?.collect_param_descrs(&mut descrs);
        Ok(descrs)
    }

    /// The built-in probe named `name`.
    pub fn mk_probe(&self, name: &str) -> Result<ProbeRef> {
        probe::mk_probe(name).ok_or_else(|| TactixError::invalid_parameter(name, "unknown probe"))
    }
}
