//! McNemar's test for paired binary outcomes.

use super::erf::erfc;
use serde::{Deserialize, Serialize};

/// 2×2 table of paired outcomes and the two-sided test result.
///
/// `n10` counts pairs where method A was correct and method B was not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct McNemarResult {
    pub n11: usize,
    pub n10: usize,
    pub n01: usize,
    pub n00: usize,
    pub statistic: f64,
    pub p_value: f64,
}

impl McNemarResult {
    pub fn discordant(&self) -> usize {
        self.n10 + self.n01
    }
}

/// Continuity-corrected McNemar test on `(a_correct, b_correct)` pairs.
///
/// With no discordant pairs the statistic is 0 and `p = 1`.
pub fn mcnemar_test(pairs: &[(bool, bool)]) -> McNemarResult {
    let (mut n11, mut n10, mut n01, mut n00) = (0, 0, 0, 0);
    for &(a, b) in pairs {
        match (a, b) {
            (true, true) => n11 += 1,
            (true, false) => n10 += 1,
            (false, true) => n01 += 1,
            (false, false) => n00 += 1,
        }
    }

    let discordant = n10 + n01;
    if discordant == 0 {
        return McNemarResult {
            n11,
            n10,
            n01,
            n00,
            statistic: 0.0,
            p_value: 1.0,
        };
    }

    let diff = (n10 as f64 - n01 as f64).abs() - 1.0;
    let statistic = diff.max(0.0).powi(2) / discordant as f64;
    // Chi-squared with one degree of freedom: P(X > s) = erfc(sqrt(s / 2))
    let p_value = erfc((statistic / 2.0).sqrt()).clamp(0.0, 1.0);

    McNemarResult {
        n11,
        n10,
        n01,
        n00,
        statistic,
        p_value,
    }
}
