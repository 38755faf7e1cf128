// Normality check: Shapiro-Wilk W test per group
//
// Royston's approximation (AS R94):
// - coefficients from Blom scores with polynomial corrections for the
//   two most extreme order statistics
// - exact p-value for n = 3
// - gamma/log transformation of 1 - W for 4 <= n <= 11
// - log-normal transformation of 1 - W for n >= 12
//
// H0: the sample is drawn from a normal distribution.

use crate::comparison::error::{ComparisonError, Result};
use crate::comparison::sample::{Sample, SamplePair};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::cmp::Ordering;

/// Smallest sample the W statistic is defined for
pub const SHAPIRO_MIN_SAMPLE: usize = 3;

/// Largest sample Royston's p-value approximation is calibrated for
pub const SHAPIRO_MAX_CALIBRATED: usize = 5000;

const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// Shapiro-Wilk result for one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapiroWilk {
    /// W statistic in (0, 1]; values near 1 are consistent with normality
    pub w: f64,
    pub pvalue: f64,
}

/// Normality verdict for one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNormality {
    pub label: String,
    pub w: f64,
    pub pvalue: f64,
}

impl GroupNormality {
    /// Normal unless the p-value falls below alpha
    pub fn is_normal(&self, alpha: f64) -> bool {
        self.pvalue >= alpha
    }
}

/// Per-group normality p-values, in pair order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityOutcome {
    pub groups: Vec<GroupNormality>,
}

impl NormalityOutcome {
    pub fn pvalue(&self, label: &str) -> Option<f64> {
        self.groups
            .iter()
            .find(|g| g.label == label)
            .map(|g| g.pvalue)
    }

    /// True when no group rejects normality at alpha
    pub fn all_normal(&self, alpha: f64) -> bool {
        self.groups.iter().all(|g| g.is_normal(alpha))
    }

    /// Labels of the groups that reject normality at alpha
    pub fn non_normal_groups(&self, alpha: f64) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|g| !g.is_normal(alpha))
            .map(|g| g.label.as_str())
            .collect()
    }
}

/// Run Shapiro-Wilk on each group of the pair independently
///
/// The p-values do not depend on alpha; alpha only decides how they are
/// read by `NormalityOutcome::all_normal`.
pub fn normality_check(pair: &SamplePair) -> Result<NormalityOutcome> {
    let groups = pair
        .samples()
        .into_iter()
        .map(|sample| -> Result<GroupNormality> {
            let result = shapiro_wilk(sample)?;
            tracing::debug!(
                group = sample.label(),
                w = result.w,
                pvalue = result.pvalue,
                "Shapiro-Wilk normality test"
            );
            Ok(GroupNormality {
                label: sample.label().to_string(),
                w: result.w,
                pvalue: result.pvalue,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(NormalityOutcome { groups })
}

/// Shapiro-Wilk W test for a single sample
///
/// # Errors
/// - `InsufficientData` with fewer than 3 observations
/// - `NonFiniteObservation` on NaN or infinite values
/// - `DegenerateSample` when all observations are identical
///
/// # Example
/// ```
/// use abtester::comparison::{shapiro_wilk, Sample};
///
/// let sample = Sample::new("Control", vec![-1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5]);
/// let result = shapiro_wilk(&sample).unwrap();
/// assert!(result.w > 0.9);
/// assert!(result.pvalue > 0.05);
/// ```
pub fn shapiro_wilk(sample: &Sample) -> Result<ShapiroWilk> {
    sample.require_len(SHAPIRO_MIN_SAMPLE)?;
    sample.require_finite()?;
    sample.require_spread()?;

    let n = sample.len();
    if n > SHAPIRO_MAX_CALIBRATED {
        tracing::warn!(
            group = sample.label(),
            n,
            "Shapiro-Wilk p-value approximation is calibrated up to {} observations",
            SHAPIRO_MAX_CALIBRATED
        );
    }

    let mut x = sample.values().to_vec();
    x.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let normal = standard_normal()?;

    if n == 3 {
        let a = std::f64::consts::FRAC_1_SQRT_2;
        let w = w_ratio(a * (x[2] - x[0]), sum_of_squares(&x), sample)?.clamp(0.75, 1.0);
        let pvalue = 6.0 / std::f64::consts::PI * (w.sqrt().asin() - (0.75f64).sqrt().asin());
        return Ok(ShapiroWilk {
            w,
            pvalue: pvalue.clamp(0.0, 1.0),
        });
    }

    let a = coefficients(n, &normal)?;
    let half = n / 2;
    let numerator: f64 = (0..half).map(|i| a[i] * (x[n - 1 - i] - x[i])).sum();
    let w = w_ratio(numerator, sum_of_squares(&x), sample)?.min(1.0);

    Ok(ShapiroWilk {
        w,
        pvalue: pvalue(w, n, &normal),
    })
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0)
        .map_err(|e| ComparisonError::Computation(format!("normal distribution: {}", e)))
}

fn sum_of_squares(x: &[f64]) -> f64 {
    let mean = x.iter().sum::<f64>() / x.len() as f64;
    x.iter().map(|&v| (v - mean).powi(2)).sum()
}

/// Evaluate c[0] + c[1]·x + c[2]·x² + ... (Horner)
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

/// Positive coefficients a_1..a_{n/2} for the antisymmetric W weights
fn coefficients(n: usize, normal: &Normal) -> Result<Vec<f64>> {
    let half = n / 2;
    let nf = n as f64;

    // Blom scores for the lower half; negative
    let m: Vec<f64> = (1..=half)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|mi| mi * mi).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; half];
    a[0] = a1;

    let (corrected, fac_sq, one_minus) = if n > 5 {
        let a2 = poly(&C2, rsn) - m[1] / ssumm2;
        a[1] = a2;
        (
            2,
            summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1],
            1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2,
        )
    } else {
        (1, summ2 - 2.0 * m[0] * m[0], 1.0 - 2.0 * a1 * a1)
    };

    if fac_sq <= 0.0 || one_minus <= 0.0 {
        return Err(ComparisonError::Computation(format!(
            "Shapiro-Wilk coefficients undefined for n={}",
            n
        )));
    }
    let fac = (fac_sq / one_minus).sqrt();
    for i in corrected..half {
        a[i] = -m[i] / fac;
    }

    Ok(a)
}

/// Raw W = numerator² / SS, before clamping into its valid range
fn w_ratio(numerator: f64, sum_of_squares: f64, sample: &Sample) -> Result<f64> {
    let w = numerator * numerator / sum_of_squares;
    if !w.is_finite() {
        return Err(ComparisonError::Computation(format!(
            "Shapiro-Wilk statistic overflowed for group '{}'",
            sample.label()
        )));
    }
    Ok(w)
}

/// Upper-tail p-value of W via Royston's normalizing transformation
fn pvalue(w: f64, n: usize, normal: &Normal) -> f64 {
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let nf = n as f64;
    let mut y = w1.ln();

    let (m, s) = if n <= 11 {
        let gamma = poly(&G, nf);
        if y >= gamma {
            // beyond the support of the transformation: extreme non-normality
            return 0.0;
        }
        y = -(gamma - y).ln();
        (poly(&C3, nf), poly(&C4, nf).exp())
    } else {
        let ln_n = nf.ln();
        (poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    (1.0 - normal.cdf((y - m) / s)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(values: &[f64]) -> Sample {
        Sample::new("Control", values.to_vec())
    }

    #[test]
    fn test_poly_horner() {
        assert_eq!(poly(&[1.0, 2.0, 3.0], 2.0), 17.0);
    }

    #[test]
    fn test_coefficients_n20_first_weight() {
        // Published Shapiro-Wilk table: a_1 = 0.4734 for n = 20
        let normal = standard_normal().unwrap();
        let a = coefficients(20, &normal).unwrap();
        assert!((a[0] - 0.4734).abs() < 2e-3, "a1 = {}", a[0]);
        assert!(a.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_n3_exact() {
        // Equally spaced triple is the most normal-looking: W = 1, p = 1
        let result = shapiro_wilk(&sample(&[1.0, 2.0, 3.0])).unwrap();
        assert!((result.w - 1.0).abs() < 1e-12);
        assert!((result.pvalue - 1.0).abs() < 1e-9);

        // Extreme triple hits the lower bound W = 0.75, p = 0
        let result = shapiro_wilk(&sample(&[0.0, 0.0, 1.0])).unwrap();
        assert!((result.w - 0.75).abs() < 1e-12);
        assert!(result.pvalue < 1e-9);
    }

    #[test]
    fn test_symmetric_sample_is_normal() {
        let result = shapiro_wilk(&sample(&[-1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5])).unwrap();
        assert!(result.w > 0.9);
        assert!(result.pvalue > 0.05);
    }

    #[test]
    fn test_reference_values_small_sample() {
        // Shapiro & Wilk (1965) weights example: W = 0.789, p < 0.01
        let data = [
            148.0, 154.0, 158.0, 160.0, 161.0, 162.0, 166.0, 170.0, 182.0, 195.0, 236.0,
        ];
        let result = shapiro_wilk(&sample(&data)).unwrap();
        assert!((result.w - 0.7888).abs() < 2e-3, "W = {}", result.w);
        assert!(result.pvalue < 0.01, "p = {}", result.pvalue);
    }

    #[test]
    fn test_skewed_sample_rejected() {
        let data: Vec<f64> = (1..=40)
            .map(|i| {
                let p = (i as f64 - 0.5) / 40.0;
                -500.0 * (1.0 - p).ln()
            })
            .collect();
        let result = shapiro_wilk(&sample(&data)).unwrap();
        assert!(result.pvalue < 0.05, "exponential p = {}", result.pvalue);
    }

    #[test]
    fn test_normal_quantiles_accepted() {
        let normal = Normal::new(550.0, 50.0).unwrap();
        let data: Vec<f64> = (1..=40)
            .map(|i| normal.inverse_cdf((i as f64 - 0.5) / 40.0))
            .collect();
        let result = shapiro_wilk(&sample(&data)).unwrap();
        assert!(result.w > 0.98, "W = {}", result.w);
        assert!(result.pvalue > 0.5, "p = {}", result.pvalue);
    }

    #[test]
    fn test_invariant_to_order_and_scale() {
        let data = [3.1, 4.7, 2.2, 5.9, 4.1, 3.3, 6.8, 2.9, 4.4, 5.0, 3.8, 4.9, 7.5];
        let base = shapiro_wilk(&sample(&data)).unwrap();

        let mut reversed = data.to_vec();
        reversed.reverse();
        let scaled: Vec<f64> = data.iter().map(|v| v * 10.0 + 3.0).collect();

        let from_reversed = shapiro_wilk(&sample(&reversed)).unwrap();
        let from_scaled = shapiro_wilk(&sample(&scaled)).unwrap();
        assert_eq!(base, from_reversed);
        assert!((base.w - from_scaled.w).abs() < 1e-12);
        assert!((base.pvalue - from_scaled.pvalue).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_observations() {
        assert_eq!(
            shapiro_wilk(&sample(&[1.0, 2.0])).unwrap_err(),
            ComparisonError::InsufficientData {
                label: "Control".to_string(),
                required: 3,
                actual: 2,
            }
        );
    }

    #[test]
    fn test_constant_sample_is_degenerate() {
        assert!(matches!(
            shapiro_wilk(&sample(&[4.0; 30])),
            Err(ComparisonError::DegenerateSample { .. })
        ));
    }

    #[test]
    fn test_nan_rejected() {
        assert!(matches!(
            shapiro_wilk(&sample(&[1.0, f64::NAN, 2.0, 3.0])),
            Err(ComparisonError::NonFiniteObservation { index: 1, .. })
        ));
    }

    #[test]
    fn test_overflow_is_an_error_not_a_perfect_fit() {
        let result = shapiro_wilk(&sample(&[1e160, 2e160, 3e160, 5e160, 8e160]));
        assert!(
            matches!(result, Err(ComparisonError::Computation(_))),
            "got {:?}",
            result
        );
    }

    #[test]
    fn test_overflow_n3_is_an_error() {
        let result = shapiro_wilk(&sample(&[1e200, 2e200, 3e200]));
        assert!(
            matches!(result, Err(ComparisonError::Computation(_))),
            "got {:?}",
            result
        );
    }

    #[test]
    fn test_normality_check_reports_each_group() {
        let pair = SamplePair::new(
            Sample::new("Control", vec![-1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5]),
            Sample::new("Test", vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0]),
        )
        .unwrap();

        let outcome = normality_check(&pair).unwrap();
        assert_eq!(outcome.groups.len(), 2);
        assert!(outcome.pvalue("Control").unwrap() > 0.05);
        assert!(outcome.pvalue("Test").unwrap() < 0.05);
        assert!(!outcome.all_normal(0.05));
        assert_eq!(outcome.non_normal_groups(0.05), vec!["Test"]);
        assert!(outcome.pvalue("Missing").is_none());
    }
}
