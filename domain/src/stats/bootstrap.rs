//! Paired bootstrap confidence interval for an accuracy delta.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Resampling parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub iterations: usize,
    /// Two-sided confidence level, e.g. 0.95 for 2.5th/97.5th percentiles
    pub confidence: f64,
    /// Fixed seed for reproducible intervals; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            iterations: 5_000,
            confidence: 0.95,
            seed: Some(42),
        }
    }
}

/// Bootstrap distribution summary of `accuracy(B) - accuracy(A)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    /// Delta on the original sample
    pub observed_delta: f64,
    /// Mean delta over all resamples
    pub mean_delta: f64,
    pub lower: f64,
    pub upper: f64,
    pub iterations: usize,
    pub confidence: f64,
}

impl BootstrapResult {
    /// Whether the interval excludes zero.
    pub fn excludes_zero(&self) -> bool {
        self.lower > 0.0 || self.upper < 0.0
    }
}

/// Paired bootstrap using a seeded [`StdRng`] built from `config`.
pub fn paired_bootstrap_seeded(pairs: &[(bool, bool)], config: &BootstrapConfig) -> BootstrapResult {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    paired_bootstrap(pairs, config.iterations, config.confidence, &mut rng)
}

/// Resample `(a_correct, b_correct)` pairs with replacement `iterations` times.
///
/// Returns all zeros for empty input or zero iterations.
pub fn paired_bootstrap<R: Rng + ?Sized>(
    pairs: &[(bool, bool)],
    iterations: usize,
    confidence: f64,
    rng: &mut R,
) -> BootstrapResult {
    let n = pairs.len();
    if n == 0 || iterations == 0 {
        return BootstrapResult {
            observed_delta: 0.0,
            mean_delta: 0.0,
            lower: 0.0,
            upper: 0.0,
            iterations,
            confidence,
        };
    }

    let observed_delta = delta(pairs.iter().copied(), n);

    let mut deltas: Vec<f64> = (0..iterations)
        .map(|_| {
            let sample = (0..n).map(|_| pairs[rng.gen_range(0..n)]);
            delta(sample, n)
        })
        .collect();
    deltas.sort_by(|a, b| a.total_cmp(b));

    let mean_delta = deltas.iter().sum::<f64>() / iterations as f64;
    let tail = ((1.0 - confidence.clamp(0.0, 1.0)) / 2.0).max(0.0);
    let lower_idx = ((tail * iterations as f64).floor() as usize).min(iterations - 1);
    let upper_idx = (((1.0 - tail) * iterations as f64).floor() as usize).min(iterations - 1);

    BootstrapResult {
        observed_delta,
        mean_delta,
        lower: deltas[lower_idx],
        upper: deltas[upper_idx],
        iterations,
        confidence,
    }
}

fn delta(pairs: impl Iterator<Item = (bool, bool)>, n: usize) -> f64 {
    let (a, b) = pairs.fold((0usize, 0usize), |(a, b), (x, y)| {
        (a + x as usize, b + y as usize)
    });
    (b as f64 - a as f64) / n as f64
}
