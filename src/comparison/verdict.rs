// Verdict classification and presentation
//
// `classify` is the whole decision: p < alpha is significant. Everything
// else in this file renders an already-computed TestResult and never feeds
// back into it.

use crate::comparison::config::ComparisonConfig;
use crate::comparison::error::Result;
use crate::comparison::sample::{SamplePair, SampleSummary};
use crate::comparison::selector::{run_comparison, run_comparison_with, TestDecision, TestResult};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Final answer to "do the two groups differ?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// p < alpha: reject H0 (equal location)
    Significant,
    /// p >= alpha: fail to reject H0
    NotSignificant,
}

impl Verdict {
    pub fn is_significant(self) -> bool {
        matches!(self, Verdict::Significant)
    }

    pub fn description(self) -> &'static str {
        match self {
            Verdict::Significant => "statistically significant difference",
            Verdict::NotSignificant => "no statistically significant difference",
        }
    }
}

/// Classify a p-value against a significance level
///
/// # Example
/// ```
/// use abtester::comparison::{classify, Verdict};
///
/// assert_eq!(classify(0.01, 0.05), Verdict::Significant);
/// assert_eq!(classify(0.05, 0.05), Verdict::NotSignificant);
/// ```
pub fn classify(pvalue: f64, alpha: f64) -> Verdict {
    if pvalue < alpha {
        Verdict::Significant
    } else {
        Verdict::NotSignificant
    }
}

/// Full comparison output: group summaries, test result, verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub summaries: Vec<SampleSummary>,
    pub result: TestResult,
    pub verdict: Verdict,
}

impl ComparisonReport {
    /// Run the comparison and summarize both groups
    pub fn build(pair: &SamplePair, config: &ComparisonConfig) -> Result<Self> {
        let result = run_comparison_with(pair, config)?;
        let summaries = pair
            .samples()
            .into_iter()
            .map(|sample| SampleSummary::from_sample(sample, config.significance_level))
            .collect::<Result<Vec<_>>>()?;
        let verdict = classify(result.pvalue, result.alpha);

        Ok(Self {
            summaries,
            result,
            verdict,
        })
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        match self.verdict {
            Verdict::Significant => report.push_str("❌ SIGNIFICANT DIFFERENCE BETWEEN GROUPS\n\n"),
            Verdict::NotSignificant => {
                report.push_str("✅ NO SIGNIFICANT DIFFERENCE BETWEEN GROUPS\n\n")
            }
        }
        let _ = writeln!(report, "Test: {}", self.result.decision.test_name());
        let _ = writeln!(report, "p-value: {:.4}", self.result.pvalue);
        let _ = writeln!(
            report,
            "Significance level: {} ({}% confidence)",
            self.result.alpha,
            (1.0 - self.result.alpha) * 100.0
        );

        if !self.summaries.is_empty() {
            report.push_str("\n📊 Group Summaries:\n");
            for summary in &self.summaries {
                let _ = writeln!(
                    report,
                    "  {} (n={}, mean={:.2}, median={:.2}, std={:.2}, {:.0}% CI=[{:.2}, {:.2}])",
                    summary.label,
                    summary.count,
                    summary.mean,
                    summary.median,
                    summary.std_dev,
                    summary.confidence * 100.0,
                    summary.mean_ci.0,
                    summary.mean_ci.1
                );
            }
        }

        report
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Explain why a test was chosen for this pair, and what it found
///
/// Runs the same computation as `run_comparison`; the text is diagnostic only.
pub fn explain(pair: &SamplePair, alpha: f64) -> Result<String> {
    let result = run_comparison(pair, alpha)?;
    Ok(rationale(&result))
}

/// Render the decision path of a finished comparison
pub fn rationale(result: &TestResult) -> String {
    let alpha = result.alpha;
    let mut text = String::new();

    text.push_str("NORMALITY (Shapiro-Wilk, H0: normal distribution)\n");
    for group in &result.assumptions.normality.groups {
        let verdict = if group.is_normal(alpha) {
            "normal"
        } else {
            "NOT normal"
        };
        let _ = writeln!(
            text,
            "  {}: W={:.4}, p={:.4} -> {}",
            group.label, group.w, group.pvalue, verdict
        );
    }

    text.push_str("VARIANCE HOMOGENEITY (Levene, H0: equal variances)\n");
    match &result.assumptions.variance {
        Some(variance) => {
            let verdict = if variance.is_homogeneous(alpha) {
                "homogeneous"
            } else {
                "NOT homogeneous"
            };
            let _ = writeln!(
                text,
                "  W={:.4}, p={:.4} -> {}",
                variance.statistic, variance.pvalue, verdict
            );
        }
        None => {
            let non_normal = result.assumptions.normality.non_normal_groups(alpha);
            let _ = writeln!(
                text,
                "  skipped: {} not normal, variance is irrelevant to a rank test",
                non_normal.join(", ")
            );
        }
    }

    let reason = match result.decision {
        TestDecision::NonParametric => "at least one group is not normally distributed",
        TestDecision::ParametricEqualVariance => "both groups are normal with homogeneous variance",
        TestDecision::ParametricUnequalVariance => {
            "both groups are normal but variances are not homogeneous"
        }
    };
    let _ = writeln!(
        text,
        "SELECTED: {} ({})",
        result.decision.test_name(),
        reason
    );

    let verdict = classify(result.pvalue, alpha);
    let _ = writeln!(
        text,
        "RESULT: p={:.4} at alpha={} -> {}",
        result.pvalue,
        alpha,
        verdict.description()
    );

    text
}
