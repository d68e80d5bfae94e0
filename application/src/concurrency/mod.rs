//! Adaptive concurrency control
//!
//! One [`AdaptiveConcurrencyController`] is shared by every provider call in
//! a run. It admits work while `running < limit`, raises the limit by one on
//! each success, and halves it when a provider signals a rate limit.

mod controller;

pub use controller::{
    AdaptiveConcurrencyController, ConcurrencyConfig, ConcurrencyPermit, ControllerSnapshot,
    RateLimitAware,
};
