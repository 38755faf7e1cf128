// Test selection and execution
//
// Decision table, fixed precedence:
//   1. any group not normal          → Mann-Whitney U
//   2. normal, homogeneous variance  → Student's t-test (pooled)
//   3. normal, unequal variance      → Welch's t-test
//
// Levene's test is only run on branch 2/3. A non-normal group short-circuits
// the selection before variance is ever looked at.

use crate::comparison::config::ComparisonConfig;
use crate::comparison::error::Result;
use crate::comparison::normality::{normality_check, NormalityOutcome};
use crate::comparison::sample::SamplePair;
use crate::comparison::statistics::{mann_whitney_u, ttest_independent, MannWhitneyMethod};
use crate::comparison::variance::{variance_check, VarianceOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which two-sample test the assumptions call for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestDecision {
    /// At least one group is not normal: Mann-Whitney U
    NonParametric,
    /// Both normal, variances homogeneous: pooled t-test
    ParametricEqualVariance,
    /// Both normal, variances differ: Welch's t-test
    ParametricUnequalVariance,
}

impl TestDecision {
    pub fn is_parametric(self) -> bool {
        !matches!(self, TestDecision::NonParametric)
    }

    /// Name of the test procedure this decision runs
    pub fn test_name(self) -> &'static str {
        match self {
            TestDecision::NonParametric => "Mann-Whitney U test",
            TestDecision::ParametricEqualVariance => "Student's t-test (equal variances)",
            TestDecision::ParametricUnequalVariance => "Welch's t-test (unequal variances)",
        }
    }
}

impl fmt::Display for TestDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TestDecision::NonParametric => "non-parametric",
            TestDecision::ParametricEqualVariance => "parametric, equal variance",
            TestDecision::ParametricUnequalVariance => "parametric, unequal variance",
        };
        f.write_str(label)
    }
}

/// Outcomes of the assumption checks that fed a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionOutcome {
    pub normality: NormalityOutcome,

    /// Levene's test; `None` when a group failed normality and the check was skipped
    pub variance: Option<VarianceOutcome>,
}

impl AssumptionOutcome {
    /// Run the checks the decision table needs, and no more
    pub fn evaluate(pair: &SamplePair, alpha: f64) -> Result<Self> {
        let normality = normality_check(pair)?;
        let variance = if normality.all_normal(alpha) {
            Some(variance_check(&pair.samples())?)
        } else {
            None
        };
        Ok(Self {
            normality,
            variance,
        })
    }
}

/// Map assumption outcomes to a test, normality first
///
/// A missing variance outcome on the parametric path is read as
/// homogeneous; `AssumptionOutcome::evaluate` never produces that case.
pub fn select_test(outcome: &AssumptionOutcome, alpha: f64) -> TestDecision {
    if !outcome.normality.all_normal(alpha) {
        return TestDecision::NonParametric;
    }
    match outcome.variance {
        Some(variance) if !variance.is_homogeneous(alpha) => {
            TestDecision::ParametricUnequalVariance
        }
        _ => TestDecision::ParametricEqualVariance,
    }
}

/// Result of one assumption-driven comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Two-sided p-value of the chosen test
    pub pvalue: f64,

    /// t statistic, or U of the first group for Mann-Whitney
    pub statistic: f64,

    /// Degrees of freedom (t-tests only)
    pub df: Option<f64>,

    pub decision: TestDecision,

    /// Set only for the non-parametric path
    pub mann_whitney_method: Option<MannWhitneyMethod>,

    pub assumptions: AssumptionOutcome,

    /// Significance level the decision was taken at
    pub alpha: f64,
}

/// Run the assumption checks, pick the test, and execute it
///
/// # Example
/// ```
/// use abtester::comparison::{run_comparison, Sample, SamplePair, TestDecision};
///
/// let pair = SamplePair::new(
///     Sample::new("Control", vec![-1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5]),
///     Sample::new("Test", vec![-1.4, -0.9, -0.6, 0.1, 0.4, 1.1, 1.4]),
/// )
/// .unwrap();
///
/// let result = run_comparison(&pair, 0.05).unwrap();
/// assert_eq!(result.decision, TestDecision::ParametricEqualVariance);
/// assert!(result.pvalue > 0.05);
/// ```
pub fn run_comparison(pair: &SamplePair, alpha: f64) -> Result<TestResult> {
    run_comparison_with(pair, &ComparisonConfig::with_alpha(alpha))
}

/// `run_comparison` driven by a full configuration
pub fn run_comparison_with(pair: &SamplePair, config: &ComparisonConfig) -> Result<TestResult> {
    config.validate()?;
    let alpha = config.significance_level;

    let assumptions = AssumptionOutcome::evaluate(pair, alpha)?;
    let decision = select_test(&assumptions, alpha);

    let [first, second] = pair.samples();
    let (test, mann_whitney_method) = match decision {
        TestDecision::NonParametric => {
            let (test, method) = mann_whitney_u(first, second)?;
            (test, Some(method))
        }
        TestDecision::ParametricEqualVariance => (ttest_independent(first, second, true)?, None),
        TestDecision::ParametricUnequalVariance => {
            (ttest_independent(first, second, false)?, None)
        }
    };

    tracing::debug!(
        decision = %decision,
        test = decision.test_name(),
        statistic = test.statistic,
        pvalue = test.pvalue,
        "Two-sample comparison complete"
    );

    Ok(TestResult {
        pvalue: test.pvalue,
        statistic: test.statistic,
        df: test.df,
        decision,
        mann_whitney_method,
        assumptions,
        alpha,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::normality::GroupNormality;

    fn outcome(normal_p: [f64; 2], variance_p: Option<f64>) -> AssumptionOutcome {
        AssumptionOutcome {
            normality: NormalityOutcome {
                groups: vec![
                    GroupNormality {
                        label: "Control".to_string(),
                        w: 0.97,
                        pvalue: normal_p[0],
                    },
                    GroupNormality {
                        label: "Test".to_string(),
                        w: 0.97,
                        pvalue: normal_p[1],
                    },
                ],
            },
            variance: variance_p.map(|pvalue| VarianceOutcome {
                statistic: 1.0,
                pvalue,
            }),
        }
    }

    #[test]
    fn test_select_non_parametric_when_any_group_non_normal() {
        assert_eq!(
            select_test(&outcome([0.01, 0.80], Some(0.90)), 0.05),
            TestDecision::NonParametric
        );
        assert_eq!(
            select_test(&outcome([0.80, 0.01], None), 0.05),
            TestDecision::NonParametric
        );
    }

    #[test]
    fn test_non_normal_dominates_unequal_variance() {
        assert_eq!(
            select_test(&outcome([0.01, 0.01], Some(0.001)), 0.05),
            TestDecision::NonParametric
        );
    }

    #[test]
    fn test_select_equal_variance() {
        assert_eq!(
            select_test(&outcome([0.30, 0.60], Some(0.40)), 0.05),
            TestDecision::ParametricEqualVariance
        );
    }

    #[test]
    fn test_select_unequal_variance() {
        assert_eq!(
            select_test(&outcome([0.30, 0.60], Some(0.01)), 0.05),
            TestDecision::ParametricUnequalVariance
        );
    }

    #[test]
    fn test_boundary_pvalue_equal_to_alpha_fails_to_reject() {
        assert_eq!(
            select_test(&outcome([0.05, 0.05], Some(0.05)), 0.05),
            TestDecision::ParametricEqualVariance
        );
    }

    #[test]
    fn test_decision_display_and_names() {
        assert_eq!(TestDecision::NonParametric.to_string(), "non-parametric");
        assert!(!TestDecision::NonParametric.is_parametric());
        assert!(TestDecision::ParametricUnequalVariance.is_parametric());
        assert_eq!(
            TestDecision::ParametricUnequalVariance.test_name(),
            "Welch's t-test (unequal variances)"
        );
    }

    #[test]
    fn test_decision_serializes_snake_case() {
        let json = serde_json::to_string(&TestDecision::ParametricEqualVariance).unwrap();
        assert_eq!(json, "\"parametric_equal_variance\"");
    }
}
