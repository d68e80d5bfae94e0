//! Fisher's exact test for two independent proportions.

use serde::{Deserialize, Serialize};

/// One-sided Fisher exact test result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FisherResult {
    pub p_value: f64,
    /// `(a·d)/(b·c)`; infinite when only the `b·c` product is zero, 1 when both are
    pub odds_ratio: f64,
}

/// One-sided Fisher exact test on the 2×2 table
///
/// ```text
///              correct  incorrect
///   group 1       a         b
///   group 2       c         d
/// ```
///
/// The alternative hypothesis is that group 1 has the higher proportion
/// correct: the p-value is the upper hypergeometric tail `P(X >= a)` with
/// all margins fixed.
pub fn fisher_exact_one_sided(a: u64, b: u64, c: u64, d: u64) -> FisherResult {
    let odds_ratio = odds_ratio(a, b, c, d);

    let row1 = a + b;
    let col1 = a + c;
    let n = a + b + c + d;
    if n == 0 {
        return FisherResult {
            p_value: 1.0,
            odds_ratio,
        };
    }

    let ln_fact = ln_factorials(n as usize);
    let ln_choose = |n: u64, k: u64| ln_fact[n as usize] - ln_fact[k as usize] - ln_fact[(n - k) as usize];
    let ln_total = ln_choose(n, row1);

    // X ranges over [max(0, row1 + col1 - n), min(row1, col1)]
    let upper = row1.min(col1);
    let p_value: f64 = (a..=upper)
        .filter(|&k| row1 - k <= n - col1)
        .map(|k| (ln_choose(col1, k) + ln_choose(n - col1, row1 - k) - ln_total).exp())
        .sum();

    FisherResult {
        p_value: p_value.clamp(0.0, 1.0),
        odds_ratio,
    }
}

fn odds_ratio(a: u64, b: u64, c: u64, d: u64) -> f64 {
    let ad = (a * d) as f64;
    let bc = (b * c) as f64;
    if bc == 0.0 {
        if ad == 0.0 { 1.0 } else { f64::INFINITY }
    } else {
        ad / bc
    }
}

fn ln_factorials(n: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(n + 1);
    table.push(0.0);
    let mut acc = 0.0;
    for k in 1..=n {
        acc += (k as f64).ln();
        table.push(acc);
    }
    table
}
