//! Error types for Tactix.
//!
//! Tactic failures fall in two groups. The *tactic exception* family
//! (resource interrupts, capability mismatches and ordinary tactic failures)
//! is what `or_else` catches and what the solver adapter reports as
//! `unknown`. Contract violations (bad goals, bad parameters) and internal
//! errors are never swallowed by combinators.

use tactix_math::AlgebraicError;
use thiserror::Error;

/// Main error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TactixError {
    /// The cancellation token fired.
    #[error("canceled")]
    Canceled,

    /// A `try_for` deadline expired.
    #[error("timeout after {ms} ms")]
    Timeout {
        /// Budget that expired, in milliseconds
        ms: u64,
    },

    /// The term arena grew beyond the configured threshold.
    #[error("max. memory exceeded (limit {limit} bytes)")]
    MemoryExceeded {
        /// Configured limit in bytes
        limit: usize,
    },

    /// A rewriter or tactic exceeded its step budget.
    #[error("max. steps exceeded (limit {limit})")]
    StepsExceeded {
        /// Configured step limit
        limit: u64,
    },

    /// The tactic cannot honour the goal's configuration or contents.
    #[error("{0}")]
    Unsupported(String),

    /// Ordinary tactic failure.
    #[error("{0}")]
    TacticFailed(String),

    /// A goal was constructed with an impossible configuration.
    #[error("invalid goal: {0}")]
    InvalidGoal(String),

    /// A parameter was unknown or had the wrong type.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Numeral domain failure that escaped a rewrite rule.
    #[error("algebraic number error: {0}")]
    Algebraic(#[from] AlgebraicError),

    /// Internal error (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

impl TactixError {
    /// Capability mismatch error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Ordinary tactic failure.
    pub fn tactic_failed(msg: impl Into<String>) -> Self {
        Self::TacticFailed(msg.into())
    }

    /// Parameter validation failure.
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is a resource interrupt (cancellation, deadline, memory, steps).
    pub fn is_resource_interrupt(&self) -> bool {
        matches!(
            self,
            Self::Canceled
                | Self::Timeout { .. }
                | Self::MemoryExceeded { .. }
                | Self::StepsExceeded { .. }
        )
    }

    /// Whether `or_else` may recover from this error by trying an alternative.
    pub fn is_tactic_exception(&self) -> bool {
        self.is_resource_interrupt()
            || matches!(
                self,
                Self::Unsupported(_) | Self::TacticFailed(_) | Self::Algebraic(_)
            )
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, TactixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tactic_exception_family() {
        assert!(TactixError::Canceled.is_tactic_exception());
        assert!(TactixError::Timeout { ms: 10 }.is_tactic_exception());
        assert!(TactixError::unsupported("no proofs").is_tactic_exception());
        assert!(TactixError::tactic_failed("no clause").is_tactic_exception());
        assert!(!TactixError::InvalidGoal("x".into()).is_tactic_exception());
        assert!(!TactixError::Internal("x".into()).is_tactic_exception());
    }

    #[test]
    fn test_messages() {
        let e = TactixError::unsupported(
            "quantified variable blasting does not support proof generation",
        );
        assert_eq!(
            e.to_string(),
            "quantified variable blasting does not support proof generation"
        );
        assert_eq!(
            TactixError::StepsExceeded { limit: 5 }.to_string(),
            "max. steps exceeded (limit 5)"
        );
    }
}
