//! Holm–Bonferroni step-down correction for multiple comparisons.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HolmResult {
    pub p_value: f64,
    /// Adjusted p-value, monotone in rank and capped at 1
    pub corrected_p_value: f64,
    pub significant: bool,
}

/// Apply Holm–Bonferroni to `p_values` at family-wise level `alpha`.
///
/// Results come back in input order. Rejection stops at the first sorted
/// p-value that fails its threshold `alpha / (m - rank)`.
pub fn holm_bonferroni(p_values: &[f64], alpha: f64) -> Vec<HolmResult> {
    let m = p_values.len();
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&i, &j| p_values[i].total_cmp(&p_values[j]));

    let mut results = vec![
        HolmResult {
            p_value: 0.0,
            corrected_p_value: 1.0,
            significant: false,
        };
        m
    ];

    let mut running_max: f64 = 0.0;
    let mut still_rejecting = true;
    for (rank, &idx) in order.iter().enumerate() {
        let p = p_values[idx];
        let remaining = (m - rank) as f64;
        running_max = running_max.max((p * remaining).min(1.0));
        still_rejecting = still_rejecting && p <= alpha / remaining;
        results[idx] = HolmResult {
            p_value: p,
            corrected_p_value: running_max,
            significant: still_rejecting,
        };
    }

    results
}
