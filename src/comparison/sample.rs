// Samples, sample pairs, and per-group descriptive summaries
//
// A SamplePair is built once per analysis from already-extracted data and
// then passed explicitly to every check. Nothing in the comparator reads
// ambient state.

use crate::comparison::error::{ComparisonError, Result};
use crate::comparison::statistics::median;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use trueno::Vector;

/// One metric column filtered to one group label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    label: String,
    values: Vec<f64>,
}

impl Sample {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail with `InsufficientData` when the sample is smaller than `required`
    pub fn require_len(&self, required: usize) -> Result<()> {
        if self.values.len() < required {
            return Err(ComparisonError::InsufficientData {
                label: self.label.clone(),
                required,
                actual: self.values.len(),
            });
        }
        Ok(())
    }

    /// Fail with `NonFiniteObservation` on the first NaN or infinite value
    pub fn require_finite(&self) -> Result<()> {
        match self.values.iter().position(|v| !v.is_finite()) {
            Some(index) => Err(ComparisonError::NonFiniteObservation {
                label: self.label.clone(),
                index,
            }),
            None => Ok(()),
        }
    }

    /// Fail with `DegenerateSample` when every observation is identical
    ///
    /// Zero variance leaves the Shapiro-Wilk statistic undefined (0/0).
    pub fn require_spread(&self) -> Result<()> {
        let Some(&first) = self.values.first() else {
            return Ok(());
        };
        if self.values.iter().all(|&v| v == first) {
            return Err(ComparisonError::DegenerateSample {
                label: self.label.clone(),
                reason: format!(
                    "all {} observations equal {} (zero variance)",
                    self.values.len(),
                    first
                ),
            });
        }
        Ok(())
    }

    /// Deviations from `center`, narrowed to f32 for the trueno SIMD paths
    ///
    /// Centring first keeps large offsets from eating the f32 mantissa.
    pub(crate) fn centered_f32(&self, center: f64) -> Vec<f32> {
        self.values.iter().map(|&v| (v - center) as f32).collect()
    }
}

/// Exactly two samples with distinct group labels
///
/// The first sample is the reference ("Control") side of every test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePair {
    first: Sample,
    second: Sample,
}

impl SamplePair {
    /// Build a pair from two samples
    ///
    /// Both samples must be non-empty and carry different labels.
    pub fn new(first: Sample, second: Sample) -> Result<Self> {
        Self::from_groups(vec![first, second])
    }

    /// Build a pair from an arbitrary list of groups
    ///
    /// Fails with `InvalidGroupCount` unless there are exactly two non-empty
    /// groups with distinct labels.
    pub fn from_groups(groups: Vec<Sample>) -> Result<Self> {
        let non_empty = groups.iter().filter(|g| !g.is_empty()).count();
        let invalid = ComparisonError::InvalidGroupCount {
            expected: 2,
            actual: non_empty,
        };
        if non_empty != 2 {
            return Err(invalid);
        }
        let [first, second]: [Sample; 2] = groups.try_into().map_err(|_| invalid)?;

        if first.label == second.label {
            return Err(ComparisonError::InvalidGroupCount {
                expected: 2,
                actual: 1,
            });
        }

        Ok(Self { first, second })
    }

    /// Build a pair from labelled observations, e.g. rows of a long-format table
    ///
    /// Groups keep the order in which their label is first seen.
    ///
    /// # Example
    /// ```
    /// use abtester::comparison::SamplePair;
    ///
    /// let rows = vec![("Control", 1.0), ("Test", 2.0), ("Control", 3.0), ("Test", 4.0)];
    /// let pair = SamplePair::from_labeled(rows).unwrap();
    /// assert_eq!(pair.first().label(), "Control");
    /// assert_eq!(pair.second().values(), &[2.0, 4.0]);
    /// ```
    pub fn from_labeled<I, S>(observations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut groups: Vec<Sample> = Vec::new();
        for (label, value) in observations {
            let label = label.as_ref();
            match groups.iter_mut().find(|g| g.label == label) {
                Some(group) => group.values.push(value),
                None => groups.push(Sample::new(label, vec![value])),
            }
        }
        Self::from_groups(groups)
    }

    pub fn first(&self) -> &Sample {
        &self.first
    }

    pub fn second(&self) -> &Sample {
        &self.second
    }

    /// Both samples in pair order
    pub fn samples(&self) -> [&Sample; 2] {
        [&self.first, &self.second]
    }

    pub fn labels(&self) -> [&str; 2] {
        [self.first.label(), self.second.label()]
    }
}

/// Descriptive statistics for one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub label: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
    /// Confidence level of `mean_ci`, e.g. 0.95
    pub confidence: f64,
    /// Student's t confidence interval of the mean
    pub mean_ci: (f64, f64),
}

impl SampleSummary {
    /// Summarize a sample with a (1 - alpha) confidence interval of the mean
    pub fn from_sample(sample: &Sample, alpha: f64) -> Result<Self> {
        sample.require_len(2)?;
        sample.require_finite()?;

        let median = median(sample.values());
        let vector = Vector::from_slice(&sample.centered_f32(median));
        let mean = median
            + vector
                .mean()
                .map_err(|e| ComparisonError::Computation(format!("mean: {}", e)))?
                as f64;
        // trueno reports population variance; rescale to the n - 1 estimator
        let n = sample.len() as f64;
        let population_variance = vector
            .variance()
            .map_err(|e| ComparisonError::Computation(format!("variance: {}", e)))?
            as f64;
        let std_dev = (population_variance * n / (n - 1.0)).sqrt();

        let t_dist = StudentsT::new(0.0, 1.0, n - 1.0)
            .map_err(|e| ComparisonError::Computation(format!("t-distribution: {}", e)))?;
        let half_width = t_dist.inverse_cdf(1.0 - alpha / 2.0) * std_dev / n.sqrt();

        Ok(Self {
            label: sample.label().to_string(),
            count: sample.len(),
            mean,
            median,
            std_dev,
            confidence: 1.0 - alpha,
            mean_ci: (mean - half_width, mean + half_width),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_requires_two_groups() {
        let err = SamplePair::from_groups(vec![Sample::new("Control", vec![1.0, 2.0, 3.0])])
            .unwrap_err();
        assert_eq!(
            err,
            ComparisonError::InvalidGroupCount {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_pair_rejects_three_groups() {
        let groups = vec![
            Sample::new("A", vec![1.0]),
            Sample::new("B", vec![2.0]),
            Sample::new("C", vec![3.0]),
        ];
        assert!(matches!(
            SamplePair::from_groups(groups),
            Err(ComparisonError::InvalidGroupCount { actual: 3, .. })
        ));
    }

    #[test]
    fn test_pair_rejects_empty_group() {
        let err = SamplePair::new(
            Sample::new("Control", vec![1.0, 2.0, 3.0]),
            Sample::new("Test", vec![]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ComparisonError::InvalidGroupCount { actual: 1, .. }
        ));
    }

    #[test]
    fn test_pair_rejects_duplicate_labels() {
        let err = SamplePair::new(
            Sample::new("Control", vec![1.0, 2.0, 3.0]),
            Sample::new("Control", vec![4.0, 5.0, 6.0]),
        )
        .unwrap_err();
        assert!(matches!(err, ComparisonError::InvalidGroupCount { .. }));
    }

    #[test]
    fn test_from_labeled_keeps_first_seen_order() {
        let rows = vec![("Test", 5.0), ("Control", 1.0), ("Test", 6.0)];
        let pair = SamplePair::from_labeled(rows).unwrap();
        assert_eq!(pair.labels(), ["Test", "Control"]);
        assert_eq!(pair.first().values(), &[5.0, 6.0]);
        assert_eq!(pair.second().values(), &[1.0]);
    }

    #[test]
    fn test_from_labeled_single_label() {
        let rows = vec![("Control", 1.0), ("Control", 2.0)];
        assert!(matches!(
            SamplePair::from_labeled(rows),
            Err(ComparisonError::InvalidGroupCount { actual: 1, .. })
        ));
    }

    #[test]
    fn test_require_len() {
        let sample = Sample::new("Control", vec![1.0, 2.0]);
        assert!(sample.require_len(2).is_ok());
        assert_eq!(
            sample.require_len(3).unwrap_err(),
            ComparisonError::InsufficientData {
                label: "Control".to_string(),
                required: 3,
                actual: 2,
            }
        );
    }

    #[test]
    fn test_require_finite() {
        let sample = Sample::new("Test", vec![1.0, f64::NAN, 3.0]);
        assert_eq!(
            sample.require_finite().unwrap_err(),
            ComparisonError::NonFiniteObservation {
                label: "Test".to_string(),
                index: 1,
            }
        );
    }

    #[test]
    fn test_require_spread() {
        let constant = Sample::new("Control", vec![7.0; 10]);
        assert!(matches!(
            constant.require_spread(),
            Err(ComparisonError::DegenerateSample { .. })
        ));

        let varied = Sample::new("Control", vec![7.0, 7.0, 8.0]);
        assert!(varied.require_spread().is_ok());
    }

    #[test]
    fn test_summary_basic() {
        let sample = Sample::new("Control", vec![2.0, 4.0, 6.0, 8.0]);
        let summary = SampleSummary::from_sample(&sample, 0.05).unwrap();

        assert_eq!(summary.count, 4);
        assert!((summary.mean - 5.0).abs() < 1e-4);
        assert!((summary.median - 5.0).abs() < 1e-4);
        // sample variance = 20 / 3
        assert!((summary.std_dev - (20.0f64 / 3.0).sqrt()).abs() < 1e-4);
        // t(0.975, 3) = 3.182446
        let half_width = 3.182446 * summary.std_dev / 2.0;
        assert!((summary.mean_ci.0 - (5.0 - half_width)).abs() < 1e-3);
        assert!((summary.mean_ci.1 - (5.0 + half_width)).abs() < 1e-3);
        assert!((summary.confidence - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_summary_large_offset() {
        let sample = Sample::new("Control", vec![1e8 + 2.0, 1e8 + 4.0, 1e8 + 6.0, 1e8 + 8.0]);
        let summary = SampleSummary::from_sample(&sample, 0.05).unwrap();

        assert!((summary.mean - (1e8 + 5.0)).abs() < 1e-3);
        assert_eq!(summary.median, 1e8 + 5.0);
        assert!((summary.std_dev - (20.0f64 / 3.0).sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_summary_needs_two_observations() {
        let sample = Sample::new("Control", vec![2.0]);
        assert!(matches!(
            SampleSummary::from_sample(&sample, 0.05),
            Err(ComparisonError::InsufficientData { .. })
        ));
    }
}
