//! Progress reporting for benchmark runs

pub mod reporter;
