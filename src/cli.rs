//! CLI argument parsing for abtester

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the comparison report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "abtester")]
#[command(version)]
#[command(
    about = "Assumption-driven A/B test: picks t-test, Welch or Mann-Whitney from the data",
    long_about = None
)]
pub struct Cli {
    /// Long-format dataset (CSV with header, or JSON); mutually exclusive with --control/--test
    #[arg(value_name = "INPUT", conflicts_with_all = ["control", "test"])]
    pub input: Option<PathBuf>,

    /// CSV file holding the control group observations
    #[arg(long = "control", value_name = "CSV", requires = "test")]
    pub control: Option<PathBuf>,

    /// CSV file holding the test group observations
    #[arg(long = "test", value_name = "CSV", requires = "control")]
    pub test: Option<PathBuf>,

    /// Significance level (overrides the config file; default: 0.05)
    #[arg(short = 'a', long = "alpha", value_name = "ALPHA")]
    pub alpha: Option<f64>,

    /// TOML configuration file
    #[arg(long = "config", value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Column holding the group label in a long-format CSV
    #[arg(long = "group-column", value_name = "NAME", default_value = "group")]
    pub group_column: String,

    /// Column holding the metric under test
    #[arg(long = "metric-column", value_name = "NAME", default_value = "Purchase")]
    pub metric_column: String,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Explain which assumptions held and why the test was chosen
    #[arg(short = 'x', long = "explain")]
    pub explain: bool,

    /// Enable debug tracing to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_input() {
        let cli = Cli::parse_from(["abtester", "ab.csv"]);
        assert_eq!(cli.input, Some(PathBuf::from("ab.csv")));
        assert!(cli.control.is_none());
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.group_column, "group");
        assert_eq!(cli.metric_column, "Purchase");
        assert!(cli.alpha.is_none());
        assert!(!cli.explain);
    }

    #[test]
    fn test_cli_two_files() {
        let cli = Cli::parse_from(["abtester", "--control", "c.csv", "--test", "t.csv"]);
        assert!(cli.input.is_none());
        assert_eq!(cli.control, Some(PathBuf::from("c.csv")));
        assert_eq!(cli.test, Some(PathBuf::from("t.csv")));
    }

    #[test]
    fn test_cli_control_requires_test() {
        assert!(Cli::try_parse_from(["abtester", "--control", "c.csv"]).is_err());
    }

    #[test]
    fn test_cli_input_conflicts_with_control() {
        assert!(Cli::try_parse_from([
            "abtester",
            "ab.csv",
            "--control",
            "c.csv",
            "--test",
            "t.csv"
        ])
        .is_err());
    }

    #[test]
    fn test_cli_alpha_and_format() {
        let cli = Cli::parse_from(["abtester", "-a", "0.01", "--format", "json", "-x", "ab.csv"]);
        assert_eq!(cli.alpha, Some(0.01));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.explain);
    }

    #[test]
    fn test_cli_custom_columns() {
        let cli = Cli::parse_from([
            "abtester",
            "--group-column",
            "bidding",
            "--metric-column",
            "Earning",
            "ab.csv",
        ]);
        assert_eq!(cli.group_column, "bidding");
        assert_eq!(cli.metric_column, "Earning");
    }
}
