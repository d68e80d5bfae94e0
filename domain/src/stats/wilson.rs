//! Wilson score interval for a binomial proportion.

use serde::{Deserialize, Serialize};

/// Two-sided 95% normal quantile
pub const Z_95: f64 = 1.959_963_984_540_054;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProportionInterval {
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ProportionInterval {
    pub fn zero() -> Self {
        Self {
            point: 0.0,
            lower: 0.0,
            upper: 0.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Wilson score interval for `successes` out of `n`. `n == 0` yields all zeros.
pub fn wilson_interval(successes: usize, n: usize, z: f64) -> ProportionInterval {
    if n == 0 {
        return ProportionInterval::zero();
    }
    let n_f = n as f64;
    let p = successes.min(n) as f64 / n_f;
    let z2 = z * z;
    let denom = 1.0 + z2 / n_f;
    let center = (p + z2 / (2.0 * n_f)) / denom;
    let margin = z * ((p * (1.0 - p) + z2 / (4.0 * n_f)) / n_f).sqrt() / denom;

    ProportionInterval {
        point: p,
        lower: (center - margin).max(0.0),
        upper: (center + margin).min(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_correct() {
        let ci = wilson_interval(10, 10, Z_95);
        assert_eq!(ci.point, 1.0);
        assert!((ci.lower - 0.722_467).abs() < 1e-5);
        assert!((ci.upper - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_half() {
        let ci = wilson_interval(50, 100, Z_95);
        assert!((ci.lower - 0.403_832).abs() < 1e-5);
        assert!((ci.upper - 0.596_168).abs() < 1e-5);
        assert!((ci.width() - 0.192_336).abs() < 1e-4);
    }

    #[test]
    fn test_none_correct() {
        let ci = wilson_interval(0, 10, Z_95);
        assert_eq!(ci.lower, 0.0);
        assert!((ci.upper - 0.277_533).abs() < 1e-5);
    }

    #[test]
    fn test_empty_sample() {
        assert_eq!(wilson_interval(0, 0, Z_95), ProportionInterval::zero());
    }
}
