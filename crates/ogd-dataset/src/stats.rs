//! Summaries behind the statistics, histogram, box-plot, bar, scatter and
//! comparison views.
//!
//! Everything here reads the dataset's filtered rows. Quantiles use linear
//! interpolation between closest ranks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{DatasetError, Result};
use crate::schema::ColumnType;
use crate::value::Row;

/// How many values a categorical summary lists.
pub const TOP_CATEGORIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n − 1); zero below two values.
    pub std_dev: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl NumericSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sorted = sorted(values);
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std_dev = if n < 2 {
            0.0
        } else {
            let ss: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        };
        Some(Self {
            count: n,
            mean,
            std_dev,
            min: sorted[0],
            q1: quantile_sorted(&sorted, 0.25)?,
            median: quantile_sorted(&sorted, 0.5)?,
            q3: quantile_sorted(&sorted, 0.75)?,
            max: sorted[n - 1],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub count: usize,
    pub distinct: usize,
    pub top: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStats {
    Numeric {
        missing: usize,
        summary: Option<NumericSummary>,
    },
    Categorical {
        missing: usize,
        summary: CategoricalSummary,
    },
    Graph {
        count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub column_type: ColumnType,
    pub stats: ColumnStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub dataset_id: String,
    pub row_count: usize,
    pub columns: Vec<ColumnSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlot {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub column: String,
    pub left_id: String,
    pub right_id: String,
    pub left: ColumnSummary,
    pub right: ColumnSummary,
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Interpolated quantile of an unsorted sample.
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    quantile_sorted(&sorted(values), p)
}

/// Numeric values of `column`, plus how many rows had none.
pub fn numeric_values(rows: &[Row], column: &str) -> (Vec<f64>, usize) {
    let mut values = Vec::with_capacity(rows.len());
    let mut missing = 0usize;
    for row in rows {
        match row.get(column).and_then(|v| v.as_number()) {
            Some(x) => values.push(x),
            None => missing += 1,
        }
    }
    (values, missing)
}

/// Non-null values of `column` by frequency, most frequent first.
pub fn category_counts(rows: &[Row], column: &str) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in rows.iter().filter_map(|r| r.get(column)) {
        if value.is_null() {
            continue;
        }
        *counts.entry(value.to_key()).or_insert(0) += 1;
    }
    let mut out: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(value, count)| CategoryCount { value, count })
        .collect();
    // BTreeMap order already breaks ties by value; the sort is stable.
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

pub fn histogram(values: &[f64], bins: usize) -> Result<Vec<HistogramBin>> {
    if bins == 0 {
        return Err(DatasetError::InvalidBins);
    }
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return Ok(vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();
    for x in values {
        let idx = (((x - min) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    Ok(out)
}

pub fn box_plot(values: &[f64]) -> Option<BoxPlot> {
    let sorted = sorted(values);
    let q1 = quantile_sorted(&sorted, 0.25)?;
    let median = quantile_sorted(&sorted, 0.5)?;
    let q3 = quantile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let lo_fence = q1 - 1.5 * iqr;
    let hi_fence = q3 + 1.5 * iqr;

    let inside = || sorted.iter().copied().filter(|x| *x >= lo_fence && *x <= hi_fence);
    let lower_whisker = inside().next().unwrap_or(q1);
    let upper_whisker = inside().last().unwrap_or(q3);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|x| *x < lo_fence || *x > hi_fence)
        .collect();

    Some(BoxPlot {
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
        outliers,
    })
}

pub fn scatter_points(rows: &[Row], x: &str, y: &str) -> Vec<ScatterPoint> {
    rows.iter()
        .filter_map(|r| {
            let x = r.get(x)?.as_number()?;
            let y = r.get(y)?.as_number()?;
            Some(ScatterPoint { x, y })
        })
        .collect()
}

fn summarize_column(rows: &[Row], column: &str, column_type: ColumnType) -> ColumnSummary {
    let stats = match column_type {
        ColumnType::Numeric => numeric_stats(rows, column),
        ColumnType::Ordinal if is_numeric_sample(rows, column) => numeric_stats(rows, column),
        ColumnType::Graph => ColumnStats::Graph {
            count: rows
                .iter()
                .filter(|r| r.get(column).is_some_and(|v| !v.is_null()))
                .count(),
        },
        _ => {
            let counts = category_counts(rows, column);
            let count: usize = counts.iter().map(|c| c.count).sum();
            ColumnStats::Categorical {
                missing: rows.len() - count,
                summary: CategoricalSummary {
                    count,
                    distinct: counts.len(),
                    top: counts.into_iter().take(TOP_CATEGORIES).collect(),
                },
            }
        }
    };
    ColumnSummary {
        column: column.to_string(),
        column_type,
        stats,
    }
}

fn numeric_stats(rows: &[Row], column: &str) -> ColumnStats {
    let (values, missing) = numeric_values(rows, column);
    ColumnStats::Numeric {
        missing,
        summary: NumericSummary::from_values(&values),
    }
}

// Ordinal columns may hold ranked labels rather than numbers.
fn is_numeric_sample(rows: &[Row], column: &str) -> bool {
    rows.iter()
        .filter_map(|r| r.get(column))
        .filter(|v| !v.is_null())
        .all(|v| v.as_number().is_some())
}

/// Summarize one column of the filtered rows.
pub fn describe_column(dataset: &Dataset, column: &str) -> Result<ColumnSummary> {
    let ty = dataset
        .column_type(column)
        .ok_or_else(|| DatasetError::UnknownColumn(column.to_string()))?;
    Ok(summarize_column(&dataset.filtered_rows(), column, ty))
}

pub fn describe(dataset: &Dataset) -> DatasetSummary {
    let rows = dataset.filtered_rows();
    let columns = dataset
        .columns()
        .iter()
        .filter_map(|c| dataset.column_type(c).map(|ty| summarize_column(&rows, c, ty)))
        .collect();
    DatasetSummary {
        dataset_id: dataset.id().to_string(),
        row_count: rows.len(),
        columns,
    }
}

/// Side-by-side summaries of `column` in two datasets.
pub fn compare(left: &Dataset, right: &Dataset, column: &str) -> Result<Comparison> {
    Ok(Comparison {
        column: column.to_string(),
        left_id: left.id().to_string(),
        right_id: right.id().to_string(),
        left: describe_column(left, column)?,
        right: describe_column(right, column)?,
    })
}
