// Location tests for two independent samples
//
// - Parametric: independent t-test in f64, pooled (Student) or
//   unequal-variance (Welch) variant; p-value from statrs' StudentsT
// - Non-parametric: Mann-Whitney U, exact null distribution for small
//   tie-free samples, normal approximation otherwise
// - Median via statrs order statistics

use crate::comparison::error::{ComparisonError, Result};
use crate::comparison::sample::Sample;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use statrs::statistics::{Data, OrderStatistics, Statistics};
use std::cmp::Ordering;

/// Largest smaller-sample size for which the exact U distribution is used
pub const MANN_WHITNEY_EXACT_MAX: usize = 8;

/// Outcome of a single two-sample location test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationTest {
    /// t statistic, or U of the first sample for Mann-Whitney
    pub statistic: f64,

    /// Two-sided p-value
    pub pvalue: f64,

    /// Degrees of freedom (t-tests only)
    pub df: Option<f64>,
}

/// How the Mann-Whitney p-value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MannWhitneyMethod {
    Exact,
    Asymptotic,
}

/// Independent two-sample t-test
///
/// `equal_var = true` pools the variances (Student); `false` applies
/// Welch's correction with Welch-Satterthwaite degrees of freedom. Both
/// are two-sided.
///
/// # Example
/// ```
/// use abtester::comparison::{ttest_independent, Sample};
///
/// let control = Sample::new("Control", vec![10.0, 12.0, 11.0, 13.0, 10.0]);
/// let test = Sample::new("Test", vec![25.0, 27.0, 26.0, 28.0, 25.0]);
///
/// let result = ttest_independent(&control, &test, true).unwrap();
/// assert!(result.pvalue < 0.05);
/// ```
pub fn ttest_independent(first: &Sample, second: &Sample, equal_var: bool) -> Result<LocationTest> {
    first.require_len(2)?;
    second.require_len(2)?;
    first.require_finite()?;
    second.require_finite()?;

    let n1 = first.len() as f64;
    let n2 = second.len() as f64;
    let diff = first.values().mean() - second.values().mean();
    let var1 = first.values().variance();
    let var2 = second.values().variance();

    let (statistic, df) = if equal_var {
        let pooled = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0);
        (diff / (pooled * (1.0 / n1 + 1.0 / n2)).sqrt(), n1 + n2 - 2.0)
    } else {
        let se1 = var1 / n1;
        let se2 = var2 / n2;
        let df = (se1 + se2).powi(2) / (se1.powi(2) / (n1 - 1.0) + se2.powi(2) / (n2 - 1.0));
        (diff / (se1 + se2).sqrt(), df)
    };

    if !statistic.is_finite() || !df.is_finite() {
        return Err(ComparisonError::Computation(format!(
            "t statistic is undefined (t={}, df={})",
            statistic, df
        )));
    }

    let t_dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| ComparisonError::Computation(format!("t-distribution: {}", e)))?;
    let pvalue = 2.0 * t_dist.sf(statistic.abs());

    Ok(LocationTest {
        statistic,
        pvalue: pvalue.clamp(0.0, 1.0),
        df: Some(df),
    })
}

/// Two-sided Mann-Whitney U test
///
/// Uses the exact distribution of U when the smaller sample has at most
/// `MANN_WHITNEY_EXACT_MAX` observations and there are no ties; otherwise
/// the normal approximation with tie and continuity corrections.
///
/// # Example
/// ```
/// use abtester::comparison::{mann_whitney_u, Sample};
///
/// let control = Sample::new("Control", vec![1.0, 2.0, 3.0, 4.0, 5.0]);
/// let test = Sample::new("Test", vec![6.0, 7.0, 8.0, 9.0, 10.0]);
///
/// let (result, _method) = mann_whitney_u(&control, &test).unwrap();
/// assert_eq!(result.statistic, 0.0);
/// assert!(result.pvalue < 0.05);
/// ```
pub fn mann_whitney_u(first: &Sample, second: &Sample) -> Result<(LocationTest, MannWhitneyMethod)> {
    first.require_len(1)?;
    second.require_len(1)?;
    first.require_finite()?;
    second.require_finite()?;

    let n1 = first.len();
    let n2 = second.len();

    let mut combined: Vec<(f64, bool)> = first
        .values()
        .iter()
        .map(|&v| (v, true))
        .chain(second.values().iter().map(|&v| (v, false)))
        .collect();
    combined.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let (ranks, tie_term) = average_ranks(&combined);
    let rank_sum_first: f64 = combined
        .iter()
        .zip(&ranks)
        .filter(|((_, is_first), _)| *is_first)
        .map(|(_, rank)| rank)
        .sum();

    let n1f = n1 as f64;
    let n2f = n2 as f64;
    let u1 = rank_sum_first - n1f * (n1f + 1.0) / 2.0;
    let u2 = n1f * n2f - u1;
    let u_max = u1.max(u2);

    let use_exact = n1.min(n2) <= MANN_WHITNEY_EXACT_MAX && tie_term == 0.0;
    let (pvalue, method) = if use_exact {
        (
            2.0 * exact_u_upper_tail(u_max.round() as usize, n1, n2),
            MannWhitneyMethod::Exact,
        )
    } else {
        let n = n1f + n2f;
        let mu = n1f * n2f / 2.0;
        let variance = n1f * n2f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
        if variance <= 0.0 {
            return Err(ComparisonError::DegenerateSample {
                label: format!("{}+{}", first.label(), second.label()),
                reason: "all pooled observations are tied; U has no spread".to_string(),
            });
        }
        let z = (u_max - mu - 0.5) / variance.sqrt();
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ComparisonError::Computation(format!("normal distribution: {}", e)))?;
        (2.0 * (1.0 - normal.cdf(z)), MannWhitneyMethod::Asymptotic)
    };

    Ok((
        LocationTest {
            statistic: u1,
            pvalue: pvalue.clamp(0.0, 1.0),
            df: None,
        },
        method,
    ))
}

/// Average ranks (1-based) of sorted values, plus the tie term Σ(t³ - t)
fn average_ranks(sorted: &[(f64, bool)]) -> (Vec<f64>, f64) {
    let mut ranks = vec![0.0; sorted.len()];
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < sorted.len() {
        let mut end = start + 1;
        while end < sorted.len() && sorted[end].0 == sorted[start].0 {
            end += 1;
        }
        let average = (start + end + 1) as f64 / 2.0;
        ranks[start..end].fill(average);
        let t = (end - start) as f64;
        tie_term += t * t * t - t;
        start = end;
    }
    (ranks, tie_term)
}

/// P(U >= u) under the null hypothesis for sample sizes n1, n2 (no ties)
///
/// The frequencies of U are the coefficients of the Gaussian binomial
/// [n1 + n2 choose n1]_q, built as Π (1 - q^(n2+i)) / (1 - q^i).
fn exact_u_upper_tail(u: usize, n1: usize, n2: usize) -> f64 {
    let (m, n) = if n1 <= n2 { (n1, n2) } else { (n2, n1) };
    let max_u = m * n;
    if u > max_u {
        return 0.0;
    }

    let mut counts = vec![0.0f64; max_u + 1];
    counts[0] = 1.0;
    for i in 1..=m {
        // multiply by (1 - q^(n + i))
        let shift = n + i;
        for k in (shift..=max_u).rev() {
            counts[k] -= counts[k - shift];
        }
        // divide by (1 - q^i)
        for k in i..=max_u {
            counts[k] += counts[k - i];
        }
    }

    let total: f64 = counts.iter().sum();
    let upper: f64 = counts[u..].iter().sum();
    (upper / total).min(1.0)
}

/// Median of a slice; NaN when empty
pub fn median(values: &[f64]) -> f64 {
    OrderStatistics::median(&mut Data::new(values.to_vec()))
}
