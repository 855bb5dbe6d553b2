//! Property-based tests for tactix-core
//!
//! Randomized checks of the arithmetic rewriter and of tactic composition.

mod rewriter_properties;
mod tactic_properties;
