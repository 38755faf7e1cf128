//! abtester - Assumption-driven two-sample A/B testing
//!
//! This library compares a success metric between a control and a test
//! group. It checks normality (Shapiro-Wilk) and variance homogeneity
//! (Levene), picks Student's t-test, Welch's t-test, or Mann-Whitney U
//! accordingly, and classifies the resulting p-value.
//!
//! # Example
//! ```
//! use abtester::comparison::{classify, run_comparison, Sample, SamplePair, Verdict};
//!
//! let pair = SamplePair::new(
//!     Sample::new("Control", vec![10.0, 12.0, 11.0, 13.0, 10.0, 12.0, 11.0]),
//!     Sample::new("Test", vec![25.0, 27.0, 26.0, 28.0, 25.0, 27.0, 26.0]),
//! )
//! .unwrap();
//!
//! let result = run_comparison(&pair, 0.05).unwrap();
//! assert_eq!(classify(result.pvalue, 0.05), Verdict::Significant);
//! ```

pub mod cli;
pub mod comparison;
pub mod dataset;
