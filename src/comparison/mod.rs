// Assumption-driven two-sample comparison
//
// Given two independent samples (e.g. purchases under maximum bidding vs
// average bidding), choose the test whose assumptions the data supports:
//
//   Shapiro-Wilk per group ──┬─ any group not normal ──────→ Mann-Whitney U
//                            └─ both normal → Levene ──┬─ equal var ──→ Student's t
//                                                       └─ unequal var → Welch's t
//
// then classify the p-value against the same significance level.
//
// Implementation:
// - Uses statrs (crates.io) for Normal, Student's t and F distributions,
//   order statistics, and the f64 moments behind the t-tests
// - Uses trueno (crates.io) for SIMD-optimized summary statistics
// - Shapiro-Wilk (Royston AS R94), Levene, the t-tests and Mann-Whitney U
//   are built on those distributions
//
// All computation is pure: a SamplePair goes in, a TestResult comes out.

mod config;
mod error;
mod normality;
mod sample;
mod selector;
mod statistics;
mod variance;
mod verdict;

pub use config::ComparisonConfig;
pub use error::{ComparisonError, Result};
pub use normality::{
    normality_check, shapiro_wilk, GroupNormality, NormalityOutcome, ShapiroWilk,
    SHAPIRO_MIN_SAMPLE,
};
pub use sample::{Sample, SamplePair, SampleSummary};
pub use selector::{
    run_comparison, run_comparison_with, select_test, AssumptionOutcome, TestDecision, TestResult,
};
pub use statistics::{mann_whitney_u, median, ttest_independent, LocationTest, MannWhitneyMethod};
pub use variance::{variance_check, VarianceOutcome};
pub use verdict::{classify, explain, rationale, ComparisonReport, Verdict};
