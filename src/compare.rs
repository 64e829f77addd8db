//! Z-score comparison of two distributions.
//!
//! The score is the distance between the means measured in combined standard
//! errors. It assumes roughly normal distributions and can mislead on heavily
//! skewed ones.

use crate::error::ComparisonError;
use crate::stats::{Stat, Stats};

/// Cutoff at or below which two distributions count as comparable.
pub const DEFAULT_Z_CUTOFF: f64 = 2.0;

/// `|µa − µb| / sqrt(σa²/na + σb²/nb)`.
///
/// Fails if the stats are of different kinds or either has no samples.
/// Duration stats are compared in nanoseconds.
pub fn compute_z_score(a: &Stats, b: &Stats) -> Result<f64, ComparisonError> {
    if a.kind != b.kind {
        return Err(ComparisonError::KindMismatch(a.kind, b.kind));
    }
    if a.n == 0 || b.n == 0 {
        return Err(ComparisonError::EmptyDistribution);
    }

    let mean_a = a.float_for(Stat::Mean);
    let se_a = a.float_for(Stat::StdDev) / (a.n as f64).sqrt();
    let mean_b = b.float_for(Stat::Mean);
    let se_b = b.float_for(Stat::StdDev) / (b.n as f64).sqrt();

    let diff = (mean_a - mean_b).abs();
    if diff == 0.0 {
        return Ok(0.0);
    }
    Ok(diff / (se_a * se_a + se_b * se_b).sqrt())
}

/// Whether the Z-score of `actual` against `expected` is within `cutoff`.
pub fn is_comparable(actual: &Stats, expected: &Stats, cutoff: f64) -> Result<bool, ComparisonError> {
    Ok(compute_z_score(actual, expected)? <= cutoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoration::Decorations;
    use crate::experiment::Experiment;
    use std::time::Duration;

    fn value_stats(values: &[f64]) -> Stats {
        let e = Experiment::new("exp");
        for v in values {
            e.record_value("v", *v, Decorations::new());
        }
        e.get_stats("v")
    }

    #[test]
    fn should_score_identical_distributions_as_zero() {
        let a = value_stats(&[1.0, 2.0, 3.0]);
        let b = value_stats(&[3.0, 2.0, 1.0]);
        assert_eq!(compute_z_score(&a, &b), Ok(0.0));
    }

    #[test]
    fn should_be_symmetric() {
        let a = value_stats(&[1.0, 2.0, 3.0, 4.0]);
        let b = value_stats(&[2.0, 4.0, 6.0]);
        assert_eq!(compute_z_score(&a, &b), compute_z_score(&b, &a));
    }

    #[test]
    fn should_match_hand_computed_score() {
        // mean 2, sd sqrt(2/3); mean 5, sd sqrt(2/3); n = 3 each
        let a = value_stats(&[1.0, 2.0, 3.0]);
        let b = value_stats(&[4.0, 5.0, 6.0]);
        let se2: f64 = (2.0 / 3.0) / 3.0;
        let expected = 3.0 / (2.0 * se2).sqrt();
        let z = compute_z_score(&a, &b).unwrap();
        assert!((z - expected).abs() < 1e-9);
        assert_eq!(is_comparable(&a, &b, DEFAULT_Z_CUTOFF), Ok(false));
    }

    #[test]
    fn should_fail_when_kinds_differ() {
        let a = value_stats(&[1.0]);
        let e = Experiment::new("exp");
        e.record_duration("d", Duration::from_millis(1), Decorations::new());
        let b = e.get_stats("d");
        assert!(matches!(
            compute_z_score(&a, &b),
            Err(ComparisonError::KindMismatch(_, _))
        ));
    }

    #[test]
    fn should_fail_when_distribution_empty() {
        let a = value_stats(&[1.0]);
        let e = Experiment::new("exp");
        let empty = e.get_stats("missing");
        assert!(compute_z_score(&a, &empty).is_err());
        assert_eq!(
            compute_z_score(&Stats::default(), &Stats::default()),
            Err(ComparisonError::EmptyDistribution)
        );
    }

    #[test]
    fn should_accept_close_distributions() {
        let a = value_stats(&[10.0, 11.0, 9.0, 10.5, 9.5]);
        let b = value_stats(&[10.2, 10.8, 9.1, 10.4, 9.7]);
        assert_eq!(is_comparable(&a, &b, DEFAULT_Z_CUTOFF), Ok(true));
    }
}
