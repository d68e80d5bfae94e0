//! Consensus domain
//!
//! Consensus strategies synthesize one derived answer from the individual
//! answers of an ensemble.
//!
//! | Strategy | Minimum responses | Judge use |
//! |----------|-------------------|-----------|
//! | [`ConsensusStrategyKind::Standard`] | 1 | none, summarizer only |
//! | [`ConsensusStrategyKind::Elo`] | 3 | pairwise preference |
//! | [`ConsensusStrategyKind::Majority`] | 2 | alignment scores |
//!
//! When a strategy cannot run it returns one of the sentinel strings in
//! [`strategy`] instead of failing.

pub mod parsing;
pub mod strategy;

pub use parsing::{
    NEUTRAL_ALIGNMENT, PairwisePreference, parse_alignment_scores, parse_pairwise_preference,
};
pub use strategy::{
    ConsensusStrategyKind, ELO_INSUFFICIENT_RESPONSES, EnsembleResponse,
    MAJORITY_INSUFFICIENT_RESPONSES, SYNTHESIS_FAILED, is_insufficient_sentinel,
};
