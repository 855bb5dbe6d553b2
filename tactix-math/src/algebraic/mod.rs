//! Real algebraic numbers.
//!
//! Irrational numerals are roots of square-free integer polynomials with an
//! isolating interval. Arithmetic builds the defining polynomial of the
//! result with a resultant, isolates its real roots with Sturm sequences and
//! selects the right one by refining the operands. Results that turn out to
//! be rational are returned as [`Numeral::Rational`].
//!
//! Every operation is bounded by [`AlgebraicConfig::max_degree`]: when the
//! defining polynomial of a result would exceed it the operation fails with
//! [`AlgebraicError::DegreeExceeded`] rather than approximating.
//!
//! ## References
//!
//! - Loos: "Computing in Algebraic Extensions" (1982)
//! - Z3's `algebraic_numbers` module

mod isolate;
mod manager;
mod number;

pub use manager::{AlgebraicManager, AlgebraicStats};
pub use number::{AlgebraicNumber, Numeral};

use thiserror::Error;

/// Errors raised by algebraic number arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlgebraicError {
    /// The defining polynomial of the result is too large.
    #[error("algebraic number degree {degree} exceeds the limit {max}")]
    DegreeExceeded {
        /// Degree that would have been produced
        degree: usize,
        /// Configured limit
        max: usize,
    },
    /// Division by zero or inverse of zero.
    #[error("division by zero")]
    DivisionByZero,
    /// The requested value is not a real number (e.g. an even root of a negative).
    #[error("no real root")]
    NoRealRoot,
    /// Root selection did not converge within the refinement budget.
    #[error("refinement limit of {0} iterations reached")]
    RefinementLimit(usize),
}

/// Result alias for algebraic operations.
pub type Result<T> = std::result::Result<T, AlgebraicError>;

/// Configuration for the algebraic number manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgebraicConfig {
    /// Maximum degree of a defining polynomial.
    pub max_degree: usize,
    /// Maximum number of refinement rounds when selecting a root.
    pub max_refinements: usize,
}

impl Default for AlgebraicConfig {
    fn default() -> Self {
        Self {
            max_degree: 64,
            max_refinements: 4096,
        }
    }
}
