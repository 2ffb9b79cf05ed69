//! Composable row filters.
//!
//! Filters combine with logical AND across columns. Within one numeric
//! column the ranges combine with logical OR. Applying filters never
//! mutates the source rows.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};
use crate::schema::ColumnType;
use crate::value::{Row, Value};

/// Inclusive `[min, max]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, x: f64) -> bool {
        self.min <= x && x <= self.max
    }

    fn is_valid(&self) -> bool {
        !self.min.is_nan() && !self.max.is_nan() && self.min <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    /// Row passes when its numeric value falls in any range.
    Ranges { ranges: Vec<NumericRange> },
    /// Row passes when its stringified value is in the set.
    Allow { values: BTreeSet<String> },
}

impl Filter {
    pub fn ranges(ranges: impl IntoIterator<Item = NumericRange>) -> Self {
        Filter::Ranges {
            ranges: ranges.into_iter().collect(),
        }
    }

    pub fn allow<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Filter::Allow {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Filter::Ranges { .. } => "numeric",
            Filter::Allow { .. } => "categorical",
        }
    }

    /// Evaluate against a cell; `None` means the row lacks the column.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Filter::Ranges { ranges } => match value.and_then(Value::as_number) {
                Some(x) => ranges.iter().any(|r| r.contains(x)),
                None => false,
            },
            Filter::Allow { values } => {
                let key = value.map(Value::to_key).unwrap_or_default();
                values.contains(&key)
            }
        }
    }

    /// Check that this filter is well-formed and fits a column of type `ty`.
    pub fn validate(&self, column: &str, ty: ColumnType) -> Result<()> {
        match self {
            Filter::Ranges { ranges } => {
                if ty != ColumnType::Numeric {
                    return Err(DatasetError::FilterTypeMismatch {
                        column: column.to_string(),
                        column_type: ty,
                        filter: self.kind(),
                    });
                }
                if ranges.is_empty() {
                    return Err(DatasetError::EmptyRanges(column.to_string()));
                }
                if let Some(bad) = ranges.iter().find(|r| !r.is_valid()) {
                    return Err(DatasetError::InvalidRange {
                        column: column.to_string(),
                        min: bad.min,
                        max: bad.max,
                    });
                }
                Ok(())
            }
            Filter::Allow { .. } => {
                if ty == ColumnType::Graph {
                    return Err(DatasetError::FilterTypeMismatch {
                        column: column.to_string(),
                        column_type: ty,
                        filter: self.kind(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// Active filters keyed by column. A column without an entry is unfiltered.
pub type FilterMap = BTreeMap<String, Filter>;

pub fn row_passes(row: &Row, filters: &FilterMap) -> bool {
    filters
        .iter()
        .all(|(column, filter)| filter.matches(row.get(column)))
}

pub fn apply_filters(rows: &[Row], filters: &FilterMap) -> Vec<Row> {
    if filters.is_empty() {
        return rows.to_vec();
    }
    let kept: Vec<Row> = rows
        .iter()
        .filter(|row| row_passes(row, filters))
        .cloned()
        .collect();
    tracing::debug!(
        filters = filters.len(),
        input = rows.len(),
        kept = kept.len(),
        "applied filters"
    );
    kept
}
