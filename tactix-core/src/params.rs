//! String-keyed parameters and their descriptors.
//!
//! Components are configured through typed config structs. [`Params`] is the
//! untyped form used by the registry and by `using_params`: every tactic
//! describes the keys it understands in a [`ParamDescrs`] table, and a
//! parameter set is validated against that table before it is applied.
//!
//! Keys are normalized on insertion: a leading `:` is dropped and `_` is
//! treated as `-`, so `:max_steps` and `max-steps` name the same parameter.

use crate::error::{Result, TactixError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// Boolean flag
    Bool,
    /// Unsigned integer
    UInt,
    /// Floating point number
    Double,
    /// Symbol
    Symbol,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamKind::Bool => "bool",
            ParamKind::UInt => "unsigned int",
            ParamKind::Double => "double",
            ParamKind::Symbol => "symbol",
        };
        f.write_str(s)
    }
}

/// Value of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Boolean flag
    Bool(bool),
    /// Unsigned integer
    UInt(u64),
    /// Floating point number
    Double(f64),
    /// Symbol
    Symbol(String),
}

impl ParamValue {
    /// Kind of this value.
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::UInt(_) => ParamKind::UInt,
            ParamValue::Double(_) => ParamKind::Double,
            ParamValue::Symbol(_) => ParamKind::Symbol,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::UInt(n) => write!(f, "{n}"),
            ParamValue::Double(d) => write!(f, "{d}"),
            ParamValue::Symbol(s) => write!(f, "{s}"),
        }
    }
}

fn normalize_key(name: &str) -> String {
    name.trim_start_matches(':').replace('_', "-")
}

/// A set of named parameter values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    entries: BTreeMap<String, ParamValue>,
}

impl Params {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value.
    pub fn set(&mut self, name: &str, value: ParamValue) -> &mut Self {
        self.entries.insert(normalize_key(name), value);
        self
    }

    /// Set a boolean.
    pub fn set_bool(&mut self, name: &str, value: bool) -> &mut Self {
        self.set(name, ParamValue::Bool(value))
    }

    /// Set an unsigned integer.
    pub fn set_uint(&mut self, name: &str, value: u64) -> &mut Self {
        self.set(name, ParamValue::UInt(value))
    }

    /// Set a double.
    pub fn set_double(&mut self, name: &str, value: f64) -> &mut Self {
        self.set(name, ParamValue::Double(value))
    }

    /// Set a symbol.
    pub fn set_sym(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.set(name, ParamValue::Symbol(value.into()))
    }

    /// Raw value of a parameter.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.get(&normalize_key(name))
    }

    /// Whether the parameter is set.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove a parameter.
    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.entries.remove(&normalize_key(name))
    }

    fn mismatch(name: &str, expected: ParamKind, found: &ParamValue) -> TactixError {
        TactixError::invalid_parameter(
            normalize_key(name),
            format!("expected {expected}, found {}", found.kind()),
        )
    }

    /// Boolean value or `default` when unset.
    pub fn get_bool(&self, name: &str, default: bool) -> Result<bool> {
        match self.get(name) {
            None => Ok(default),
            Some(ParamValue::Bool(b)) => Ok(*b),
            Some(v) => Err(Self::mismatch(name, ParamKind::Bool, v)),
        }
    }

    /// Unsigned value or `default` when unset.
    pub fn get_uint(&self, name: &str, default: u64) -> Result<u64> {
        match self.get(name) {
            None => Ok(default),
            Some(ParamValue::UInt(n)) => Ok(*n),
            Some(v) => Err(Self::mismatch(name, ParamKind::UInt, v)),
        }
    }

    /// Double value or `default` when unset. Unsigned values are widened.
    pub fn get_double(&self, name: &str, default: f64) -> Result<f64> {
        match self.get(name) {
            None => Ok(default),
            Some(ParamValue::Double(d)) => Ok(*d),
            Some(ParamValue::UInt(n)) => Ok(*n as f64),
            Some(v) => Err(Self::mismatch(name, ParamKind::Double, v)),
        }
    }

    /// Symbol value or `default` when unset.
    pub fn get_sym(&self, name: &str, default: &str) -> Result<String> {
        match self.get(name) {
            None => Ok(default.to_string()),
            Some(ParamValue::Symbol(s)) => Ok(s.clone()),
            Some(v) => Err(Self::mismatch(name, ParamKind::Symbol, v)),
        }
    }

    /// Overwrite entries with those of `other`.
    pub fn merge(&mut self, other: &Params) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(params")?;
        for (k, v) in &self.entries {
            write!(f, " {k} {v}")?;
        }
        write!(f, ")")
    }
}

/// Descriptor of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescr {
    /// Normalized name
    pub name: String,
    /// Expected type
    pub kind: ParamKind,
    /// Default value
    pub default: ParamValue,
    /// Human readable description
    pub description: String,
}

/// Table of parameter descriptors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamDescrs {
    descrs: BTreeMap<String, ParamDescr>,
}

impl ParamDescrs {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe a parameter. A later insertion of the same name wins.
    pub fn insert(&mut self, name: &str, default: ParamValue, description: &str) {
        let name = normalize_key(name);
        self.descrs.insert(
            name.clone(),
            ParamDescr {
                name,
                kind: default.kind(),
                default,
                description: description.to_string(),
            },
        );
    }

    /// Describe a boolean parameter.
    pub fn insert_bool(&mut self, name: &str, default: bool, description: &str) {
        self.insert(name, ParamValue::Bool(default), description);
    }

    /// Describe an unsigned parameter.
    pub fn insert_uint(&mut self, name: &str, default: u64, description: &str) {
        self.insert(name, ParamValue::UInt(default), description);
    }

    /// Look up a descriptor.
    pub fn get(&self, name: &str) -> Option<&ParamDescr> {
        self.descrs.get(&normalize_key(name))
    }

    /// Check that every entry of `params` is described with a matching type.
    pub fn validate(&self, params: &Params) -> Result<()> {
        for (name, value) in params.iter() {
            let Some(d) = self.descrs.get(name) else {
                return Err(TactixError::invalid_parameter(name, "unknown parameter"));
            };
            let compatible = d.kind == value.kind()
                || (d.kind == ParamKind::Double && value.kind() == ParamKind::UInt);
            if !compatible {
                return Err(TactixError::invalid_parameter(
                    name,
                    format!("expected {}, found {}", d.kind, value.kind()),
                ));
            }
        }
        Ok(())
    }

    /// Defaults of all described parameters.
    pub fn defaults(&self) -> Params {
        let mut p = Params::new();
        for d in self.descrs.values() {
            p.set(&d.name, d.default.clone());
        }
        p
    }

    /// Iterate over descriptors in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ParamDescr> {
        self.descrs.values()
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.descrs.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.descrs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalization() {
        let mut p = Params::new();
        p.set_uint(":max_steps", 10);
        assert_eq!(p.get_uint("max-steps", 0).unwrap(), 10);
        assert!(p.contains("max_steps"));
    }

    #[test]
    fn test_type_mismatch() {
        let mut p = Params::new();
        p.set_bool("som", true);
        let err = p.get_uint("som", 0).unwrap_err();
        assert!(matches!(err, TactixError::InvalidParameter { .. }));
        assert!(p.get_double("missing", 1.5).is_ok());
    }

    #[test]
    fn test_validate() {
        let mut d = ParamDescrs::new();
        d.insert_bool("arith-lhs", false, "move all monomials to the left");
        d.insert_uint("max-degree", 64, "maximal degree");
        let mut ok = Params::new();
        ok.set_bool("arith_lhs", true);
        assert!(d.validate(&ok).is_ok());

        let mut unknown = Params::new();
        unknown.set_bool("no-such-key", true);
        assert!(d.validate(&unknown).is_err());

        let mut wrong = Params::new();
        wrong.set_bool("max-degree", true);
        assert!(d.validate(&wrong).is_err());
        assert_eq!(d.defaults().get_uint("max-degree", 0).unwrap(), 64);
    }
}
