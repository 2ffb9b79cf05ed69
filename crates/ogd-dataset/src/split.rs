//! Two-way dataset splits.
//!
//! A split partitions the parent's *filtered* rows by one feature. The two
//! children are exhaustive and disjoint: rows that the first predicate does
//! not accept (including rows with a missing or non-numeric value under a
//! threshold split) land in the second child.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::{DataSource, Dataset};
use crate::error::{DatasetError, Result};
use crate::value::{format_number, Row};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplitCriterion {
    /// `< value` versus `>= value`.
    Threshold { feature: String, value: f64 },
    /// In the chosen categories versus not.
    Categories {
        feature: String,
        categories: BTreeSet<String>,
    },
}

impl SplitCriterion {
    pub fn threshold(feature: impl Into<String>, value: f64) -> Self {
        SplitCriterion::Threshold {
            feature: feature.into(),
            value,
        }
    }

    pub fn categories<S: Into<String>>(
        feature: impl Into<String>,
        categories: impl IntoIterator<Item = S>,
    ) -> Self {
        SplitCriterion::Categories {
            feature: feature.into(),
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn feature(&self) -> &str {
        match self {
            SplitCriterion::Threshold { feature, .. }
            | SplitCriterion::Categories { feature, .. } => feature,
        }
    }

    /// Does `row` belong to the first child?
    fn accepts(&self, row: &Row) -> bool {
        match self {
            SplitCriterion::Threshold { feature, value } => row
                .get(feature)
                .and_then(|v| v.as_number())
                .is_some_and(|x| x < *value),
            SplitCriterion::Categories {
                feature,
                categories,
            } => {
                let key = row.get(feature).map(|v| v.to_key()).unwrap_or_default();
                categories.contains(&key)
            }
        }
    }

    fn describe(&self, side: SplitSide) -> String {
        match (self, side) {
            (SplitCriterion::Threshold { feature, value }, SplitSide::Accepted) => {
                format!("{feature} < {}", format_number(*value))
            }
            (SplitCriterion::Threshold { feature, value }, SplitSide::Rejected) => {
                format!("{feature} >= {}", format_number(*value))
            }
            (SplitCriterion::Categories { feature, categories }, side) => {
                let list = categories.iter().cloned().collect::<Vec<_>>().join(", ");
                let op = match side {
                    SplitSide::Accepted => "in",
                    SplitSide::Rejected => "not in",
                };
                format!("{feature} {op} {{{list}}}")
            }
        }
    }
}

/// Which half of a split a child holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitSide {
    /// Rows the criterion accepts (`< threshold`, or in the category set).
    Accepted,
    /// Everything else.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitProvenance {
    pub parent_id: String,
    pub criterion: SplitCriterion,
    pub side: SplitSide,
}

impl SplitProvenance {
    pub fn predicate(&self) -> String {
        self.criterion.describe(self.side)
    }
}

impl fmt::Display for SplitProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.parent_id, self.predicate())
    }
}

fn validate(dataset: &Dataset, criterion: &SplitCriterion) -> Result<()> {
    let feature = criterion.feature();
    let ty = dataset
        .column_type(feature)
        .ok_or_else(|| DatasetError::UnknownColumn(feature.to_string()))?;
    match criterion {
        SplitCriterion::Threshold { value, .. } => {
            if !ty.is_orderable() {
                return Err(DatasetError::SplitTypeMismatch {
                    column: feature.to_string(),
                    column_type: ty,
                });
            }
            if value.is_nan() {
                return Err(DatasetError::InvalidSplit {
                    column: feature.to_string(),
                    reason: "threshold is NaN".to_string(),
                });
            }
        }
        SplitCriterion::Categories { categories, .. } => {
            if categories.is_empty() {
                return Err(DatasetError::InvalidSplit {
                    column: feature.to_string(),
                    reason: "no categories chosen".to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Partition `dataset`'s filtered rows into two children.
pub fn split_dataset(dataset: &Dataset, criterion: &SplitCriterion) -> Result<(Dataset, Dataset)> {
    validate(dataset, criterion)?;

    let (accepted, rejected): (Vec<Row>, Vec<Row>) = dataset
        .filtered_rows()
        .into_iter()
        .partition(|row| criterion.accepts(row));

    tracing::debug!(
        dataset = dataset.id(),
        feature = criterion.feature(),
        accepted = accepted.len(),
        rejected = rejected.len(),
        "split dataset"
    );

    let child = |side: SplitSide, rows: Vec<Row>| {
        let provenance = SplitProvenance {
            parent_id: dataset.id().to_string(),
            criterion: criterion.clone(),
            side,
        };
        Dataset::with_column_types(
            provenance.to_string(),
            DataSource::Split(provenance),
            dataset.level(),
            dataset.columns().to_vec(),
            rows,
            dataset.column_types().clone(),
        )
    };

    Ok((
        child(SplitSide::Accepted, accepted),
        child(SplitSide::Rejected, rejected),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FeatureLevel;
    use crate::filter::{Filter, NumericRange};
    use crate::schema::{ColumnType, Sampling};
    use crate::value::Value;

    fn sessions() -> Dataset {
        let rows = [
            (Value::Number(1.0), "A"),
            (Value::Number(5.0), "B"),
            (Value::Null, "C"),
            (Value::Number(8.0), "A"),
            (Value::Number(4.5), "B"),
        ]
        .into_iter()
        .map(|(level, class)| {
            let mut r = Row::new();
            r.insert("level".to_string(), level);
            r.insert("class".to_string(), Value::from(class));
            r
        })
        .collect();
        Dataset::new(
            "sessions",
            DataSource::File {
                name: "sessions.tsv".to_string(),
            },
            FeatureLevel::Session,
            vec!["level".to_string(), "class".to_string()],
            rows,
            Sampling::FirstRow,
        )
    }

    #[test]
    fn threshold_split_is_exhaustive() {
        let ds = sessions();
        let (lo, hi) = split_dataset(&ds, &SplitCriterion::threshold("level", 5.0)).unwrap();
        assert_eq!(lo.rows().len(), 2);
        assert_eq!(hi.rows().len(), 3);
        assert_eq!(lo.id(), "sessions [level < 5]");
        assert_eq!(hi.id(), "sessions [level >= 5]");
        assert_eq!(lo.column_types(), ds.column_types());
        assert!(lo.filters().is_empty());
        match hi.source() {
            DataSource::Split(p) => {
                assert_eq!(p.parent_id, "sessions");
                assert_eq!(p.side, SplitSide::Rejected);
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn provenance_serializes_criterion_and_side() {
        let (lo, _) = split_dataset(&sessions(), &SplitCriterion::threshold("level", 5.0)).unwrap();
        let json = serde_json::to_value(lo.source()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "split",
                "parent_id": "sessions",
                "criterion": {"kind": "threshold", "feature": "level", "value": 5.0},
                "side": "accepted",
            })
        );
        let DataSource::Split(p) = serde_json::from_value(json).unwrap() else {
            panic!("expected split provenance");
        };
        assert_eq!(p.criterion.feature(), "level");
        assert_eq!(p.predicate(), "level < 5");
    }

    #[test]
    fn category_split_uses_filtered_rows() {
        let mut ds = sessions();
        ds.set_filter("level", Filter::ranges([NumericRange::new(0.0, 6.0)]))
            .unwrap();
        let (inside, outside) =
            split_dataset(&ds, &SplitCriterion::categories("class", ["B", "A"])).unwrap();
        assert_eq!(inside.rows().len(), 3);
        assert_eq!(outside.rows().len(), 0);
        assert_eq!(inside.id(), "sessions [class in {A, B}]");
        assert_eq!(outside.id(), "sessions [class not in {A, B}]");
    }

    #[test]
    fn rejects_bad_criteria() {
        let ds = sessions();
        assert_eq!(
            split_dataset(&ds, &SplitCriterion::threshold("nope", 1.0)).unwrap_err(),
            DatasetError::UnknownColumn("nope".to_string())
        );
        assert_eq!(
            split_dataset(&ds, &SplitCriterion::threshold("class", 1.0)).unwrap_err(),
            DatasetError::SplitTypeMismatch {
                column: "class".to_string(),
                column_type: ColumnType::Categorical,
            }
        );
        assert!(split_dataset(&ds, &SplitCriterion::threshold("level", f64::NAN)).is_err());
        let none: [&str; 0] = [];
        assert!(split_dataset(&ds, &SplitCriterion::categories("class", none)).is_err());
    }
}
