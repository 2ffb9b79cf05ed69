use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::charts::{supported_chart_types, ChartType};
use crate::error::{DatasetError, Result};
use crate::filter::{apply_filters, Filter, FilterMap};
use crate::schema::{infer_column_types, ColumnType, ColumnTypes, Sampling};
use crate::split::SplitProvenance;
use crate::value::Row;

/// Where a dataset came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    File { name: String },
    Api { endpoint: String },
    Split(SplitProvenance),
}

/// Granularity of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureLevel {
    Population,
    Player,
    Session,
}

impl FeatureLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureLevel::Population => "population",
            FeatureLevel::Player => "player",
            FeatureLevel::Session => "session",
        }
    }
}

impl fmt::Display for FeatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureLevel {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "population" => Ok(FeatureLevel::Population),
            "player" => Ok(FeatureLevel::Player),
            "session" => Ok(FeatureLevel::Session),
            other => Err(DatasetError::UnknownFeatureLevel(other.to_string())),
        }
    }
}

/// A loaded telemetry table plus its inferred schema and active filters.
///
/// Every filter key is also a column-type key; the mutators below keep it so.
/// The chart-type list is derived state and is refreshed whenever the column
/// types change. Deserialized datasets are rebuilt through the same checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DatasetRepr")]
pub struct Dataset {
    id: String,
    source: DataSource,
    level: FeatureLevel,
    columns: Vec<String>,
    rows: Vec<Row>,
    column_types: ColumnTypes,
    filters: FilterMap,
    chart_types: Vec<ChartType>,
}

/// Wire shape of [`Dataset`]; `chart_types` is accepted and recomputed.
#[derive(Deserialize)]
struct DatasetRepr {
    id: String,
    source: DataSource,
    level: FeatureLevel,
    columns: Vec<String>,
    rows: Vec<Row>,
    column_types: ColumnTypes,
    #[serde(default)]
    filters: FilterMap,
    #[serde(default, rename = "chart_types")]
    _chart_types: Vec<ChartType>,
}

impl TryFrom<DatasetRepr> for Dataset {
    type Error = DatasetError;

    fn try_from(repr: DatasetRepr) -> Result<Self> {
        let mut dataset = Dataset::with_column_types(
            repr.id,
            repr.source,
            repr.level,
            repr.columns,
            repr.rows,
            repr.column_types,
        );
        for (column, filter) in repr.filters {
            dataset.set_filter(&column, filter)?;
        }
        Ok(dataset)
    }
}

impl Dataset {
    /// Build a dataset, inferring column types with `sampling`.
    pub fn new(
        id: impl Into<String>,
        source: DataSource,
        level: FeatureLevel,
        columns: Vec<String>,
        rows: Vec<Row>,
        sampling: Sampling,
    ) -> Self {
        let column_types = infer_column_types(&columns, &rows, sampling);
        Self::with_column_types(id, source, level, columns, rows, column_types)
    }

    /// Build a dataset with an already-known schema (e.g. a split child).
    ///
    /// Columns named in `column_types` but missing from `columns` are appended
    /// so the two stay in step.
    pub fn with_column_types(
        id: impl Into<String>,
        source: DataSource,
        level: FeatureLevel,
        mut columns: Vec<String>,
        rows: Vec<Row>,
        mut column_types: ColumnTypes,
    ) -> Self {
        for c in &columns {
            column_types
                .entry(c.clone())
                .or_insert(ColumnType::Categorical);
        }
        for c in column_types.keys() {
            if !columns.contains(c) {
                columns.push(c.clone());
            }
        }
        let chart_types = supported_chart_types(level, &column_types);
        Self {
            id: id.into(),
            source,
            level,
            columns,
            rows,
            column_types,
            filters: FilterMap::new(),
            chart_types,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn level(&self) -> FeatureLevel {
        self.level
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows, ignoring filters.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column_types(&self) -> &ColumnTypes {
        &self.column_types
    }

    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.column_types.get(column).copied()
    }

    pub fn filters(&self) -> &FilterMap {
        &self.filters
    }

    pub fn filter(&self, column: &str) -> Option<&Filter> {
        self.filters.get(column)
    }

    pub fn chart_types(&self) -> &[ChartType] {
        &self.chart_types
    }

    pub fn supports(&self, chart: ChartType) -> bool {
        self.chart_types.contains(&chart)
    }

    fn require_column(&self, column: &str) -> Result<ColumnType> {
        self.column_type(column)
            .ok_or_else(|| DatasetError::UnknownColumn(column.to_string()))
    }

    /// Install (or replace) the filter for `column`.
    pub fn set_filter(&mut self, column: &str, filter: Filter) -> Result<()> {
        let ty = self.require_column(column)?;
        filter.validate(column, ty)?;
        self.filters.insert(column.to_string(), filter);
        Ok(())
    }

    pub fn clear_filter(&mut self, column: &str) -> Option<Filter> {
        self.filters.remove(column)
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Override the inferred type of `column`.
    ///
    /// A filter the new type cannot hold is dropped and returned.
    pub fn set_column_type(&mut self, column: &str, ty: ColumnType) -> Result<Option<Filter>> {
        self.require_column(column)?;
        self.column_types.insert(column.to_string(), ty);
        self.chart_types = supported_chart_types(self.level, &self.column_types);

        let incompatible = self
            .filters
            .get(column)
            .is_some_and(|f| f.validate(column, ty).is_err());
        if incompatible {
            tracing::debug!(column, column_type = %ty, "dropping incompatible filter");
            return Ok(self.filters.remove(column));
        }
        Ok(None)
    }

    /// Rows passing every active filter, in source order.
    pub fn filtered_rows(&self) -> Vec<Row> {
        apply_filters(&self.rows, &self.filters)
    }

    pub fn filtered_row_count(&self) -> usize {
        if self.filters.is_empty() {
            return self.rows.len();
        }
        self.rows
            .iter()
            .filter(|r| crate::filter::row_passes(r, &self.filters))
            .count()
    }
}
