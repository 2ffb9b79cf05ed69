//! Open Game Data dataset model
//!
//! The data layer behind the explorer's charts:
//! - `value` / `schema`: typed cells and column-type inference
//! - `filter`: composable row filters (AND across columns, OR across ranges)
//! - `charts`: which chart types a dataset supports
//! - `split`: two-way partitions of a dataset by one feature
//! - `stats`: descriptive statistics, histograms, box plots, category counts
//!
//! All operations are pure with respect to the source rows; filtering and
//! splitting produce new row collections.

pub mod charts;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod schema;
pub mod split;
pub mod stats;
pub mod value;

pub use charts::{supported_chart_types, ChartType};
pub use dataset::{DataSource, Dataset, FeatureLevel};
pub use error::DatasetError;
pub use filter::{apply_filters, Filter, FilterMap, NumericRange};
pub use schema::{infer_column_types, ColumnType, ColumnTypes, Sampling};
pub use split::{split_dataset, SplitCriterion, SplitProvenance, SplitSide};
pub use value::{Row, Value};
