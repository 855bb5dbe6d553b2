//! Tactix Math - exact numeral domain for the Tactix rewriting core
//!
//! This crate provides the number domain used by the arithmetic rewriter:
//! - Rational helpers with SMT-LIB integer division semantics ([`rational`])
//! - Dense univariate polynomials over Q with Sturm sequences and
//!   resultants ([`polynomial`])
//! - Real algebraic numbers with a degree-capped arithmetic manager
//!   ([`algebraic`])
//!
//! # Examples
//!
//! ```
//! use tactix_math::algebraic::{AlgebraicManager, Numeral};
//! use tactix_math::rational::rat;
//!
//! let mut am = AlgebraicManager::default();
//! let two = Numeral::from(rat(2));
//! let sqrt2 = am.root(&two, 2).unwrap();
//! assert!(!sqrt2.is_rational());
//!
//! // sqrt(2) * sqrt(2) collapses back to a rational
//! let prod = am.mul(&sqrt2, &sqrt2).unwrap();
//! assert_eq!(prod.as_rational(), Some(&rat(2)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod algebraic;
pub mod interval;
pub mod polynomial;
pub mod rational;

pub use algebraic::{AlgebraicConfig, AlgebraicError, AlgebraicManager, AlgebraicNumber, Numeral};
pub use interval::Interval;
pub use polynomial::UPoly;
