//! Statistics engine
//!
//! Pure functions used to decide whether an accuracy difference is real.
//! Nothing here performs I/O; randomness is injected through an [`rand::Rng`].
//!
//! | Function | Use |
//! |----------|-----|
//! | [`mcnemar_test`] | paired binary outcomes, two-sided |
//! | [`paired_bootstrap`] | confidence interval of a paired accuracy delta |
//! | [`fisher_exact_one_sided`] | unpaired 2×2 proportions, one-sided |
//! | [`holm_bonferroni`] | step-down multiple-comparison correction |
//! | [`wilson_interval`] | confidence interval for one proportion |

mod bootstrap;
mod erf;
mod fisher;
mod holm;
mod mcnemar;
mod wilson;

pub use bootstrap::{BootstrapConfig, BootstrapResult, paired_bootstrap, paired_bootstrap_seeded};
pub use erf::erfc;
pub use fisher::{FisherResult, fisher_exact_one_sided};
pub use holm::{HolmResult, holm_bonferroni};
pub use mcnemar::{McNemarResult, mcnemar_test};
pub use wilson::{ProportionInterval, Z_95, wilson_interval};

/// Accuracy of a slice of outcomes; 0 for an empty slice.
pub fn accuracy(outcomes: impl IntoIterator<Item = bool>) -> f64 {
    let (correct, total) = outcomes
        .into_iter()
        .fold((0usize, 0usize), |(c, t), ok| (c + ok as usize, t + 1));
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy([true, false, true, true]), 0.75);
        assert_eq!(accuracy(Vec::<bool>::new()), 0.0);
    }
}
