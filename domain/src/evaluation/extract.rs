//! Answer extraction from free-form model output.
//!
//! Patterns are tried from most to least explicit; the first hit wins.

use regex::Regex;
use std::sync::LazyLock;

static NUMERIC_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:final answer|answer is|equals|=)\s*\$?\s*([+-]?\d[\d,]*\.?\d*)",
        r"\*\*\$?([+-]?\d[\d,]*\.?\d*)\*\*",
        r"\$([+-]?\d[\d,]*\.?\d*)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid numeric regex"))
    .collect()
});

static ANY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+-]?\d[\d,]*\.?\d*").expect("valid number regex"));

static CHOICE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:correct answer is|answer is|answer:)\s*\(?([A-D])\b\)?",
        r"\b([A-Da-d])\)",
        r"\*\*([A-Da-d])\*\*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid choice regex"))
    .collect()
});

/// Extract the final numeric answer from `text`.
///
/// Thousands separators are ignored. Falls back to the last number in the
/// text when no explicit answer phrasing is present.
///
/// ```
/// use quorum_domain::evaluation::extract_numeric;
///
/// assert_eq!(extract_numeric("The answer is 1,024"), Some(1024.0));
/// assert_eq!(extract_numeric("**42**"), Some(42.0));
/// assert_eq!(extract_numeric("3 apples plus 4 apples gives 7"), Some(7.0));
/// assert_eq!(extract_numeric("no digits"), None);
/// ```
pub fn extract_numeric(text: &str) -> Option<f64> {
    if text.trim().is_empty() {
        return None;
    }
    for pattern in NUMERIC_PATTERNS.iter() {
        let found = pattern.captures(text).and_then(|caps| parse_number(&caps[1]));
        if found.is_some() {
            return found;
        }
    }
    ANY_NUMBER
        .find_iter(text)
        .filter_map(|m| parse_number(m.as_str()))
        .last()
}

fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    cleaned.trim_end_matches('.').parse::<f64>().ok()
}

/// Extract a multiple-choice letter (A-D), normalised to upper case.
///
/// ```
/// use quorum_domain::evaluation::extract_choice;
///
/// assert_eq!(extract_choice("The answer is (b)"), Some("B"));
/// assert_eq!(extract_choice("I pick **D** here"), Some("D"));
/// assert_eq!(extract_choice("c"), Some("C"));
/// assert_eq!(extract_choice("Not sure"), None);
/// ```
pub fn extract_choice(text: &str) -> Option<&'static str> {
    for pattern in CHOICE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            return letter(&caps[1]);
        }
    }
    let trimmed = text.trim();
    if trimmed.chars().count() == 1 {
        return letter(trimmed);
    }
    None
}

fn letter(s: &str) -> Option<&'static str> {
    match s.to_ascii_uppercase().as_str() {
        "A" => Some("A"),
        "B" => Some("B"),
        "C" => Some("C"),
        "D" => Some("D"),
        _ => None,
    }
}

/// Parse an open-ended grading verdict from a judge response.
///
/// Accepts `{"correct": bool}` JSON or the keywords `CORRECT` / `INCORRECT`.
/// A negative keyword wins over a positive one. Returns `None` when the
/// judge gave no recognisable verdict.
pub fn parse_judge_verdict(response: &str) -> Option<bool> {
    let json_verdict = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if end > start => {
            serde_json::from_str::<serde_json::Value>(&response[start..=end])
                .ok()
                .and_then(|v| v.get("correct").and_then(|c| c.as_bool()))
        }
        _ => None,
    };
    if json_verdict.is_some() {
        return json_verdict;
    }

    let upper = response.to_uppercase();
    if upper.contains("INCORRECT") || upper.contains("NOT CORRECT") || upper.contains("WRONG") {
        Some(false)
    } else if upper.contains("CORRECT") {
        Some(true)
    } else {
        None
    }
}
