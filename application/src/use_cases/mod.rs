//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod compare_regression;
pub mod consensus;
pub mod evaluate;
pub mod run_benchmark;
