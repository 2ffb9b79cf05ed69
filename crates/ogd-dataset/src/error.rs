use thiserror::Error;

use crate::schema::ColumnType;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DatasetError {
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    #[error("unknown feature level `{0}` (expected population|player|session)")]
    UnknownFeatureLevel(String),
    #[error("invalid range [{min}, {max}] for column `{column}`")]
    InvalidRange { column: String, min: f64, max: f64 },
    #[error("a numeric filter needs at least one range (column `{0}`)")]
    EmptyRanges(String),
    #[error("{filter} filter cannot apply to {column_type} column `{column}`")]
    FilterTypeMismatch {
        column: String,
        column_type: ColumnType,
        filter: &'static str,
    },
    #[error("cannot split on {column_type} column `{column}` by threshold")]
    SplitTypeMismatch {
        column: String,
        column_type: ColumnType,
    },
    #[error("invalid split on `{column}`: {reason}")]
    InvalidSplit { column: String, reason: String },
    #[error("histogram needs at least one bin")]
    InvalidBins,
}

pub type Result<T> = std::result::Result<T, DatasetError>;
