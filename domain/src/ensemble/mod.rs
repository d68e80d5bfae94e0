//! Ensemble membership and identity.
//!
//! An ensemble may sample the same model more than once. Every consumer
//! that keys data by member (ranking, evaluation, caching) derives its keys
//! from [`identity::member_keys`] so that duplicate samples never collide.

pub mod identity;

pub use identity::{OccurrenceCounter, member_keys};
