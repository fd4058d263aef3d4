//! # Salvo Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Catalog, scenario and game fixtures
//! - A scripted autopilot that plays games without a client
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;
