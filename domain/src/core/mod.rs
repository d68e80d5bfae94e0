//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelSpec`]: one ensemble member (`provider:model`)
//! - [`question::Question`]: an immutable benchmark question with ground truth
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
pub mod question;
pub mod string;
