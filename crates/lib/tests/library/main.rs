//! Integration tests for conduit-lib.

mod common;

#[cfg(unix)]
mod executor_tests;
mod pipeline_tests;
mod project_tests;
