//! Tabular data profiling.
//!
//! Reads a CSV file and produces a structural profile: shape, inferred
//! column types, missing-value counts, descriptive statistics for numeric
//! columns, and IQR-based outlier counts. Oversized and non-CSV files are
//! rejected before any parsing happens.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inferred column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    Text,
}

/// Descriptive statistics for a numeric column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Values outside `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]`
    pub outliers: usize,
}

/// Profile of one column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: ColumnType,
    pub missing: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<NumericStats>,
}

/// Full profile of a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetAnalysis {
    pub file_path: String,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub insights: Vec<String>,
}

/// One segment in a segmentation analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub value: String,
    pub count: usize,
    /// Fraction of all rows in this segment
    pub share: f64,
    /// Mean of the target column, when one was given and parses as numeric
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_mean: Option<f64>,
}

/// Row counts (and optionally a target metric) grouped by one column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationAnalysis {
    pub file_path: String,
    pub segment_column: String,
    pub target_column: Option<String>,
    pub segments: Vec<SegmentSummary>,
    pub insights: Vec<String>,
}

fn validate_file(path: &Path, max_bytes: u64) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    if extension.as_deref() != Some("csv") {
        bail!(
            "Unsupported file format for {}: only .csv files are supported",
            path.display()
        );
    }

    let metadata = std::fs::metadata(path)
        .with_context(|| format!("reading metadata for {}", path.display()))?;
    if metadata.len() > max_bytes {
        bail!(
            "File {} is {} bytes, over the {} byte limit",
            path.display(),
            metadata.len(),
            max_bytes
        );
    }
    Ok(())
}

/// Profile a CSV file.
///
/// Rejects files over `max_bytes` and files without a `.csv` extension.
pub fn analyze_csv(path: &Path, max_bytes: u64) -> Result<DatasetAnalysis> {
    validate_file(path, max_bytes)?;

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = 0usize;
    let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.context("reading CSV record")?;
        rows += 1;
        for (i, column) in raw_columns.iter_mut().enumerate() {
            let field = record.get(i).unwrap_or("").trim();
            column.push(if field.is_empty() {
                None
            } else {
                Some(field.to_string())
            });
        }
    }

    let columns: Vec<ColumnSummary> = headers
        .iter()
        .zip(raw_columns.iter())
        .map(|(name, values)| summarize_column(name, values))
        .collect();

    let insights = build_insights(rows, &columns);

    Ok(DatasetAnalysis {
        file_path: path.display().to_string(),
        rows,
        columns,
        insights,
    })
}

/// Group rows by `segment_column`, counting each segment and averaging
/// `target_column` within it when one is given. Segments are ordered by
/// descending row count.
pub fn segment_csv(
    path: &Path,
    max_bytes: u64,
    segment_column: &str,
    target_column: Option<&str>,
) -> Result<SegmentationAnalysis> {
    validate_file(path, max_bytes)?;

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader.headers().context("reading CSV header row")?;
    let segment_idx = headers
        .iter()
        .position(|h| h == segment_column)
        .ok_or_else(|| anyhow::anyhow!("no column named '{}' in {}", segment_column, path.display()))?;
    let target_idx = match target_column {
        Some(name) => Some(
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| anyhow::anyhow!("no column named '{}' in {}", name, path.display()))?,
        ),
        None => None,
    };

    let mut rows = 0usize;
    // (count, target sum, numeric target count) per segment value
    let mut groups: Vec<(String, usize, f64, usize)> = Vec::new();
    for record in reader.records() {
        let record = record.context("reading CSV record")?;
        rows += 1;
        let key = record.get(segment_idx).unwrap_or("").trim().to_string();
        let group = match groups.iter_mut().find(|(value, ..)| *value == key) {
            Some(group) => group,
            None => {
                groups.push((key, 0, 0.0, 0));
                groups.last_mut().unwrap()
            }
        };
        group.1 += 1;
        if let Some(idx) = target_idx {
            if let Ok(v) = record.get(idx).unwrap_or("").trim().parse::<f64>() {
                group.2 += v;
                group.3 += 1;
            }
        }
    }

    let mut segments: Vec<SegmentSummary> = groups
        .into_iter()
        .map(|(value, count, sum, numeric)| SegmentSummary {
            value,
            count,
            share: if rows > 0 { count as f64 / rows as f64 } else { 0.0 },
            target_mean: (numeric > 0).then(|| sum / numeric as f64),
        })
        .collect();
    segments.sort_by(|a, b| b.count.cmp(&a.count).then(a.value.cmp(&b.value)));

    let mut insights = vec![format!(
        "{} segments found across {} rows",
        segments.len(),
        rows
    )];
    if let Some(top) = segments.first() {
        insights.push(format!(
            "Largest segment '{}' covers {:.1}% of rows",
            top.value,
            top.share * 100.0
        ));
    }

    Ok(SegmentationAnalysis {
        file_path: path.display().to_string(),
        segment_column: segment_column.to_string(),
        target_column: target_column.map(String::from),
        segments,
        insights,
    })
}

fn summarize_column(name: &str, values: &[Option<String>]) -> ColumnSummary {
    let missing = values.iter().filter(|v| v.is_none()).count();
    let present: Vec<&str> = values.iter().flatten().map(|s| s.as_str()).collect();

    let numeric: Vec<f64> = present
        .iter()
        .filter_map(|v| v.parse::<f64>().ok())
        .collect();

    // A column is numeric when every present value parses as a number
    if !present.is_empty() && numeric.len() == present.len() {
        ColumnSummary {
            name: name.to_string(),
            dtype: ColumnType::Numeric,
            missing,
            stats: Some(numeric_stats(&numeric)),
        }
    } else {
        ColumnSummary {
            name: name.to_string(),
            dtype: ColumnType::Text,
            missing,
            stats: None,
        }
    }
}

fn numeric_stats(values: &[f64]) -> NumericStats {
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    let std_dev = variance.sqrt();
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;
    let outliers = values.iter().filter(|v| **v < lower || **v > upper).count();

    NumericStats {
        count,
        mean,
        std_dev,
        min,
        max,
        outliers,
    }
}

/// Linear-interpolation quantile over a sorted slice
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

fn build_insights(rows: usize, columns: &[ColumnSummary]) -> Vec<String> {
    let mut insights = Vec::new();
    insights.push(format!(
        "Dataset contains {} rows and {} columns",
        rows,
        columns.len()
    ));

    let numeric = columns
        .iter()
        .filter(|c| c.dtype == ColumnType::Numeric)
        .count();
    if numeric > 0 {
        insights.push(format!("{} numeric columns available for analysis", numeric));
    }

    for column in columns {
        if column.missing > 0 {
            insights.push(format!(
                "Column '{}' has {} missing values",
                column.name, column.missing
            ));
        }
        if let Some(stats) = &column.stats {
            if stats.outliers > 0 {
                insights.push(format!(
                    "Column '{}' has {} potential outliers",
                    column.name, stats.outliers
                ));
            }
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_shape_and_types() {
        let file = csv_file("name,revenue\nacme,100\nglobex,250\ninitech,175\n");
        let analysis = analyze_csv(file.path(), 1024 * 1024).unwrap();
        assert_eq!(analysis.rows, 3);
        assert_eq!(analysis.columns.len(), 2);
        assert_eq!(analysis.columns[0].dtype, ColumnType::Text);
        assert_eq!(analysis.columns[1].dtype, ColumnType::Numeric);
    }

    #[test]
    fn test_numeric_stats() {
        let file = csv_file("value\n10\n20\n30\n40\n");
        let analysis = analyze_csv(file.path(), 1024 * 1024).unwrap();
        let stats = analysis.columns[0].stats.as_ref().unwrap();
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 25.0).abs() < 1e-9);
        assert!((stats.min - 10.0).abs() < 1e-9);
        assert!((stats.max - 40.0).abs() < 1e-9);
        assert_eq!(stats.outliers, 0);
    }

    #[test]
    fn test_missing_values_counted() {
        let file = csv_file("a,b\n1,x\n,y\n3,\n");
        let analysis = analyze_csv(file.path(), 1024 * 1024).unwrap();
        assert_eq!(analysis.columns[0].missing, 1);
        assert_eq!(analysis.columns[1].missing, 1);
        assert!(analysis
            .insights
            .iter()
            .any(|i| i.contains("missing values")));
    }

    #[test]
    fn test_outlier_detection() {
        let file = csv_file("value\n10\n11\n12\n13\n14\n1000\n");
        let analysis = analyze_csv(file.path(), 1024 * 1024).unwrap();
        let stats = analysis.columns[0].stats.as_ref().unwrap();
        assert_eq!(stats.outliers, 1);
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"not a csv").unwrap();
        let err = analyze_csv(file.path(), 1024 * 1024).unwrap_err().to_string();
        assert!(err.contains("Unsupported file format"));
    }

    #[test]
    fn test_oversized_file_rejected() {
        let file = csv_file("a\n1\n2\n3\n");
        let err = analyze_csv(file.path(), 4).unwrap_err().to_string();
        assert!(err.contains("byte limit"));
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(analyze_csv(Path::new("/nonexistent/data.csv"), 1024).is_err());
    }

    #[test]
    fn test_segmentation_counts_and_target_means() {
        let file = csv_file(
            "region,sales\nnorth,100\nsouth,200\nnorth,300\nnorth,500\nsouth,400\n",
        );
        let analysis = segment_csv(file.path(), 1024 * 1024, "region", Some("sales")).unwrap();
        assert_eq!(analysis.segments.len(), 2);
        // Ordered by descending count
        assert_eq!(analysis.segments[0].value, "north");
        assert_eq!(analysis.segments[0].count, 3);
        assert!((analysis.segments[0].share - 0.6).abs() < 1e-9);
        assert!((analysis.segments[0].target_mean.unwrap() - 300.0).abs() < 1e-9);
        assert!((analysis.segments[1].target_mean.unwrap() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_segmentation_without_target() {
        let file = csv_file("tier,name\na,x\nb,y\na,z\n");
        let analysis = segment_csv(file.path(), 1024 * 1024, "tier", None).unwrap();
        assert_eq!(analysis.segments[0].value, "a");
        assert!(analysis.segments[0].target_mean.is_none());
    }

    #[test]
    fn test_segmentation_unknown_column_rejected() {
        let file = csv_file("a,b\n1,2\n");
        let err = segment_csv(file.path(), 1024 * 1024, "ghost", None)
            .unwrap_err()
            .to_string();
        assert!(err.contains("no column named 'ghost'"));
    }
}
