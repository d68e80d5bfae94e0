//! Application-level configuration.
//!
//! - [`RunnerParams`]: concurrency, retry, evaluation timeout and question
//!   parallelism for a benchmark run
//! - [`RegressionParams`]: thresholds for the regression decision

pub mod params;

pub use crate::use_cases::compare_regression::RegressionParams;
pub use params::RunnerParams;
