//! Property-based testing entry point for tactix-core
//!
//! Run with: cargo test --test property_based

mod property_tests;
