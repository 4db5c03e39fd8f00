//! Shared test utilities for fleetdata integration tests.
//!
//! This module provides:
//! - `TestHarness` for running a `Tracker` over a throwaway database file
//! - Builders for jobs and configurations

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
