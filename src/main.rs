use abtester::{
    cli::{Cli, OutputFormat},
    comparison::{rationale, ComparisonConfig, ComparisonReport, SamplePair},
    dataset::{self, DatasetOptions},
};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Resolve the configuration file, then let --alpha override it
fn load_config(path: Option<&PathBuf>, alpha: Option<f64>) -> Result<ComparisonConfig> {
    let mut config = match path {
        Some(path) => ComparisonConfig::from_toml(path)?,
        None => ComparisonConfig::default(),
    };
    if let Some(alpha) = alpha {
        config.significance_level = alpha;
    }
    config.validate()?;
    Ok(config)
}

/// Load the sample pair from either a long-format file or two per-group CSVs
fn load_pair(args: &Cli) -> Result<SamplePair> {
    match (&args.input, &args.control, &args.test) {
        (Some(input), None, None) => {
            let options = DatasetOptions {
                group_column: args.group_column.clone(),
                metric_column: args.metric_column.clone(),
            };
            dataset::load_sample_pair(input, &options)
        }
        (None, Some(control), Some(test)) => {
            dataset::load_two_files(control, test, &args.metric_column)
        }
        (None, None, None) => {
            anyhow::bail!(
                "Must specify an input file or --control and --test. Usage: abtester DATA.csv or abtester --control A.csv --test B.csv"
            );
        }
        _ => {
            anyhow::bail!("Specify either an input file or --control/--test, not both.");
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(args.config.as_ref(), args.alpha)?;
    let pair = load_pair(&args)?;
    let report = ComparisonReport::build(&pair, &config)?;

    match args.format {
        OutputFormat::Text => {
            if args.explain {
                println!("{}", rationale(&report.result));
            }
            print!("{}", report.to_report_string());
        }
        OutputFormat::Json => {
            let mut value = serde_json::to_value(&report)?;
            if args.explain {
                value["rationale"] = serde_json::Value::String(rationale(&report.result));
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}
