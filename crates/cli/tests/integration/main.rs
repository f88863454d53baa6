//! CLI integration tests for conduit.

mod build_tests;
mod common;
mod migrate_tests;
