//! Loading experiment data into a [`SamplePair`]
//!
//! Two layouts are supported:
//! - one long-format table with a group column and a metric column
//!   (CSV with a header row, or JSON)
//! - one CSV per group (control and test), each with the metric column

use crate::comparison::{Sample, SamplePair};
use anyhow::{Context, Result};
use csv::StringRecord;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Column names used to extract samples from tabular input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetOptions {
    /// Column holding the group label (e.g. "Control" / "Test")
    pub group_column: String,
    /// Column holding the success metric
    pub metric_column: String,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            group_column: "group".to_string(),
            metric_column: "Purchase".to_string(),
        }
    }
}

/// JSON input: an ordered list of labelled samples
///
/// ```json
/// {"groups": [{"label": "Control", "values": [1.0, 2.0]},
///             {"label": "Test", "values": [3.0, 4.0]}]}
/// ```
#[derive(Debug, Deserialize)]
struct JsonDataset {
    groups: Vec<Sample>,
}

/// Load a sample pair from a CSV or JSON file, chosen by extension
pub fn load_sample_pair<P: AsRef<Path>>(path: P, options: &DatasetOptions) -> Result<SamplePair> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let parsed = if is_json {
        parse_json(&content)
    } else {
        parse_long_csv(&content, options)
    };
    let pair = parsed.with_context(|| format!("Invalid dataset: {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        first = pair.first().label(),
        first_n = pair.first().len(),
        second = pair.second().label(),
        second_n = pair.second().len(),
        "Loaded sample pair"
    );
    Ok(pair)
}

/// Load one CSV per group, labelling them "Control" and "Test"
pub fn load_two_files<P: AsRef<Path>>(
    control: P,
    test: P,
    metric_column: &str,
) -> Result<SamplePair> {
    let control = load_metric_column(control.as_ref(), "Control", metric_column)?;
    let test = load_metric_column(test.as_ref(), "Test", metric_column)?;
    Ok(SamplePair::new(control, test)?)
}

fn load_metric_column(path: &Path, label: &str, metric_column: &str) -> Result<Sample> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    let values = parse_metric_csv(&content, metric_column)
        .with_context(|| format!("Invalid dataset: {}", path.display()))?;
    Ok(Sample::new(label, values))
}

/// Parse `{"groups": [...]}` JSON into a pair
pub fn parse_json(content: &str) -> Result<SamplePair> {
    let dataset: JsonDataset =
        serde_json::from_str(content).context("Failed to parse JSON dataset")?;
    Ok(SamplePair::from_groups(dataset.groups)?)
}

/// Parse a long-format CSV (header row, one observation per record)
pub fn parse_long_csv(content: &str, options: &DatasetOptions) -> Result<SamplePair> {
    let mut reader = csv_reader(content);
    let headers = read_headers(&mut reader)?;
    let group_idx = column_index(&headers, &options.group_column)?;
    let metric_idx = column_index(&headers, &options.metric_column)?;

    let mut observations = Vec::new();
    for result in reader.records() {
        let record = result.context("Malformed CSV record")?;
        let group = field(&record, group_idx)?;
        let value = parse_value(&record, metric_idx)?;
        observations.push((group.to_string(), value));
    }

    Ok(SamplePair::from_labeled(observations)?)
}

/// Parse one metric column out of a CSV with a header row
pub fn parse_metric_csv(content: &str, metric_column: &str) -> Result<Vec<f64>> {
    let mut reader = csv_reader(content);
    let headers = read_headers(&mut reader)?;
    let metric_idx = column_index(&headers, metric_column)?;

    reader
        .records()
        .map(|result| {
            let record = result.context("Malformed CSV record")?;
            parse_value(&record, metric_idx)
        })
        .collect()
}

fn csv_reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes())
}

fn read_headers(reader: &mut csv::Reader<&[u8]>) -> Result<StringRecord> {
    let headers = reader.headers().context("Failed to read CSV header")?;
    if headers.is_empty() {
        anyhow::bail!("CSV input is empty");
    }
    Ok(headers.clone())
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers.iter().position(|h| h == name).with_context(|| {
        format!(
            "Column '{}' not found in header {:?}",
            name,
            headers.iter().collect::<Vec<_>>()
        )
    })
}

/// 1-based line the record starts on
fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |pos| pos.line())
}

fn field(record: &StringRecord, idx: usize) -> Result<&str> {
    record
        .get(idx)
        .with_context(|| format!("Line {}: missing column {}", line_of(record), idx + 1))
}

fn parse_value(record: &StringRecord, idx: usize) -> Result<f64> {
    let raw = field(record, idx)?;
    raw.parse::<f64>()
        .with_context(|| format!("Line {}: '{}' is not a number", line_of(record), raw))
}
