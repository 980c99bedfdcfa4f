//! Test utilities and helpers for blogstore
//!
//! Builders and service constructors shared by unit tests, the
//! integration suites and downstream crates.

pub mod fixtures;

pub use fixtures::*;
