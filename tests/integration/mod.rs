//! Integration test suite for bemdeps
//!
//! End-to-end tests that run the resolver against levels on disk, drive the
//! `bemdeps` binary, and check the ordering guarantees on random graphs.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: `resolve`, `tree` and `index` commands, config handling, errors
//! - **properties**: proptest checks of precedence, reachability, determinism
//! - **resolve**: library-level resolution scenarios over temporary levels

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod properties;
mod resolve;
