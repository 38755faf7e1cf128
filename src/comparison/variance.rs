// Variance homogeneity check: Levene's test, median-centred
//
// z_ij = |x_ij - median_i|, then a one-way ANOVA on z:
//   F = ((N - k) / (k - 1)) * Σ n_i (z̄_i - z̄)² / ΣΣ (z_ij - z̄_i)²
// with p = P(F(k - 1, N - k) > F).
//
// Centring on the median (Brown-Forsythe) keeps the test robust when the
// samples are only approximately normal.
//
// H0: the groups have equal variance.

use crate::comparison::error::{ComparisonError, Result};
use crate::comparison::sample::Sample;
use crate::comparison::statistics::median;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// Levene's test result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceOutcome {
    /// Levene W (an F statistic)
    pub statistic: f64,
    pub pvalue: f64,
}

impl VarianceOutcome {
    /// Homogeneous unless the p-value falls below alpha
    pub fn is_homogeneous(&self, alpha: f64) -> bool {
        self.pvalue >= alpha
    }
}

/// Run Levene's test on exactly two samples
///
/// # Errors
/// - `InvalidGroupCount` unless exactly two samples are given
/// - `InsufficientData` when a sample has fewer than 2 observations
/// - `DegenerateSample` when every absolute deviation equals its group mean
///   (the F statistic is 0/0 or x/0)
///
/// # Example
/// ```
/// use abtester::comparison::{variance_check, Sample};
///
/// let tight = Sample::new("Control", vec![4.9, 5.0, 5.0, 5.1, 5.0]);
/// let wide = Sample::new("Test", vec![0.0, 3.0, 5.0, 7.0, 10.0]);
///
/// let outcome = variance_check(&[&tight, &wide]).unwrap();
/// assert!(!outcome.is_homogeneous(0.05));
/// ```
pub fn variance_check(samples: &[&Sample]) -> Result<VarianceOutcome> {
    if samples.len() != 2 {
        return Err(ComparisonError::InvalidGroupCount {
            expected: 2,
            actual: samples.len(),
        });
    }
    for sample in samples {
        sample.require_len(2)?;
        sample.require_finite()?;
    }

    let deviations: Vec<Vec<f64>> = samples
        .iter()
        .map(|sample| {
            let center = median(sample.values());
            sample.values().iter().map(|&x| (x - center).abs()).collect()
        })
        .collect();

    let k = deviations.len() as f64;
    let total: usize = deviations.iter().map(Vec::len).sum();
    let total = total as f64;

    let group_means: Vec<f64> = deviations
        .iter()
        .map(|z| z.iter().sum::<f64>() / z.len() as f64)
        .collect();
    let grand_mean = deviations.iter().flatten().sum::<f64>() / total;

    let between: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, &mean)| z.len() as f64 * (mean - grand_mean).powi(2))
        .sum();
    let within: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, &mean)| z.iter().map(|&v| (v - mean).powi(2)).sum::<f64>())
        .sum();

    if within <= 0.0 {
        let labels: Vec<&str> = samples.iter().map(|s| s.label()).collect();
        return Err(ComparisonError::DegenerateSample {
            label: labels.join("+"),
            reason: "absolute deviations from the median have no within-group spread; \
                     Levene statistic is undefined"
                .to_string(),
        });
    }

    let statistic = (total - k) / (k - 1.0) * between / within;
    if !statistic.is_finite() {
        return Err(ComparisonError::Computation(
            "Levene statistic overflowed".to_string(),
        ));
    }
    let f_dist = FisherSnedecor::new(k - 1.0, total - k)
        .map_err(|e| ComparisonError::Computation(format!("F distribution: {}", e)))?;
    let pvalue = (1.0 - f_dist.cdf(statistic)).clamp(0.0, 1.0);

    tracing::debug!(statistic, pvalue, "Levene variance homogeneity test");

    Ok(VarianceOutcome { statistic, pvalue })
}
