//! Judge response parsing for consensus strategies.
//!
//! These functions extract structured decisions from free-form judge
//! output. They are pure domain logic with no I/O.
//!
//! | Function | Strategy | Expected output |
//! |----------|----------|-----------------|
//! | [`parse_pairwise_preference`] | ELO ranking | `A` / `B` / `TIE` |
//! | [`parse_alignment_scores`] | Majority voting | `{"scores": [..]}` or `Response N: score` |

use regex::Regex;
use std::sync::LazyLock;

/// Neutral alignment score used when the judge omits a response.
pub const NEUTRAL_ALIGNMENT: f64 = 5.0;

static WINNER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?i:winner|better|preferred|choice|verdict)\b[^A-Za-z]*(?:(?i:response|is|answer)\b[^A-Za-z]*)*\(?([AB])\b",
    )
    .expect("valid winner regex")
});

static RESPONSE_LETTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?i:response)\s+([AB])\b").expect("valid response regex"));

static SCORE_LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)response\s*#?\s*(\d+)\s*[:=\-]\s*(-?\d+(?:\.\d+)?)").expect("valid score regex")
});

/// Outcome of one pairwise judge comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairwisePreference {
    /// The first response of the pair won
    A,
    /// The second response of the pair won
    B,
    Tie,
}

impl PairwisePreference {
    /// ELO actual score for the first response of the pair.
    pub fn score_for_a(&self) -> f64 {
        match self {
            PairwisePreference::A => 1.0,
            PairwisePreference::B => 0.0,
            PairwisePreference::Tie => 0.5,
        }
    }
}

/// Parse a pairwise preference from a judge response.
///
/// Conservative: anything ambiguous is a tie.
///
/// # Examples
///
/// ```
/// use quorum_domain::consensus::{PairwisePreference, parse_pairwise_preference};
///
/// assert_eq!(parse_pairwise_preference("B"), PairwisePreference::B);
/// assert_eq!(parse_pairwise_preference(r#"{"winner": "A"}"#), PairwisePreference::A);
/// assert_eq!(parse_pairwise_preference("Winner: Response A"), PairwisePreference::A);
/// assert_eq!(parse_pairwise_preference("They are equally good. TIE"), PairwisePreference::Tie);
/// ```
pub fn parse_pairwise_preference(response: &str) -> PairwisePreference {
    let json_winner = extract_json_object(response)
        .and_then(|v| v.get("winner").and_then(|w| w.as_str()).map(str::to_string));
    if let Some(winner) = json_winner {
        return letter_preference(&winner).unwrap_or(PairwisePreference::Tie);
    }

    let trimmed = response
        .trim()
        .trim_matches(|c: char| !c.is_ascii_alphanumeric());
    if let Some(pref) = letter_preference(trimmed) {
        return pref;
    }

    if let Some(caps) = WINNER_PATTERN.captures(response) {
        return letter_preference(&caps[1]).unwrap_or(PairwisePreference::Tie);
    }

    // A lone mention of exactly one of "Response A"/"Response B" decides it
    let mentioned: Vec<PairwisePreference> = RESPONSE_LETTER_PATTERN
        .captures_iter(response)
        .filter_map(|c| letter_preference(&c[1]))
        .collect();
    if let Some(first) = mentioned.first()
        && mentioned.iter().all(|p| p == first)
    {
        return *first;
    }

    PairwisePreference::Tie
}

fn letter_preference(s: &str) -> Option<PairwisePreference> {
    match s.trim().to_uppercase().as_str() {
        "A" => Some(PairwisePreference::A),
        "B" => Some(PairwisePreference::B),
        "TIE" | "DRAW" => Some(PairwisePreference::Tie),
        _ => None,
    }
}

/// Parse per-response alignment scores (0-10) from a judge response.
///
/// Returns exactly `count` scores in response order. Missing entries get
/// [`NEUTRAL_ALIGNMENT`]; values are clamped to `0.0..=10.0`.
///
/// # Supported Formats
///
/// 1. **JSON** (preferred): `{"scores": [8, 3, 7]}` or a bare `[8, 3, 7]`
/// 2. **Lines**: `Response 1: 8` (1-indexed)
pub fn parse_alignment_scores(response: &str, count: usize) -> Vec<f64> {
    let mut scores = vec![NEUTRAL_ALIGNMENT; count];

    let json_scores = extract_json_object(response)
        .and_then(|v| v.get("scores").and_then(|s| s.as_array()).cloned())
        .or_else(|| extract_json_array(response));

    if let Some(values) = json_scores {
        for (slot, value) in scores.iter_mut().zip(values.iter()) {
            if let Some(n) = value.as_f64() {
                *slot = n.clamp(0.0, 10.0);
            }
        }
        return scores;
    }

    for caps in SCORE_LINE_PATTERN.captures_iter(response) {
        let (Ok(index), Ok(score)) = (caps[1].parse::<usize>(), caps[2].parse::<f64>()) else {
            continue;
        };
        if (1..=count).contains(&index) {
            scores[index - 1] = score.clamp(0.0, 10.0);
        }
    }

    scores
}

fn extract_json_object(response: &str) -> Option<serde_json::Value> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<serde_json::Value>(&response[start..=end])
        .ok()
        .filter(|v| v.is_object())
}

fn extract_json_array(response: &str) -> Option<Vec<serde_json::Value>> {
    let start = response.find('[')?;
    let end = response.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<Vec<serde_json::Value>>(&response[start..=end]).ok()
}
