// Configuration for the assumption-driven comparator
//
// The significance level is the only knob: it is the cutoff for the
// normality check, the variance homogeneity check, and the final verdict.

use crate::comparison::error::{ComparisonError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for a two-sample comparison
///
/// # Example
/// ```
/// use abtester::comparison::ComparisonConfig;
///
/// let config = ComparisonConfig::default();
/// assert_eq!(config.significance_level, 0.05); // 95% confidence
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Statistical significance level (alpha) for every hypothesis test
    ///
    /// - 0.05 (default): 95% confidence level
    /// - 0.01: 99% confidence level, stricter (fewer false positives, more false negatives)
    /// - 0.10: 90% confidence level, looser (more false positives, fewer false negatives)
    ///
    /// A p-value strictly below this level rejects the null hypothesis.
    pub significance_level: f64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
        }
    }
}

impl ComparisonConfig {
    /// Create a configuration with an explicit significance level
    pub fn with_alpha(significance_level: f64) -> Self {
        Self { significance_level }
    }

    /// Create a strict configuration (99% confidence)
    pub fn strict() -> Self {
        Self {
            significance_level: 0.01,
        }
    }

    /// Create a permissive configuration (90% confidence)
    pub fn permissive() -> Self {
        Self {
            significance_level: 0.10,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let alpha = self.significance_level;
        if !alpha.is_finite() || alpha <= 0.0 || alpha >= 1.0 {
            return Err(ComparisonError::InvalidSignificanceLevel(alpha));
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    ///
    /// # Example TOML
    /// ```toml
    /// significance_level = 0.01
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self =
            toml::from_str(content).context("Failed to parse TOML comparison config")?;
        config.validate()?;
        Ok(config)
    }
}
