//! Column-type inference.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value::{Row, Value};

/// Keys a JSON cell must carry to count as a pre-built graph document.
pub const GRAPH_DOCUMENT_KEYS: [&str; 3] = ["nodes", "links", "encodings"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    Categorical,
    Ordinal,
    Graph,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Categorical => "categorical",
            ColumnType::Ordinal => "ordinal",
            ColumnType::Graph => "graph",
        }
    }

    /// Numeric and ordinal columns support range filters and threshold splits.
    pub fn is_orderable(self) -> bool {
        matches!(self, ColumnType::Numeric | ColumnType::Ordinal)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many rows inference looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    /// Classify from the first row only.
    #[default]
    FirstRow,
    /// Require every non-null value to agree before choosing `Numeric`/`Graph`.
    AllRows,
}

impl FromStr for Sampling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first_row" | "first" => Ok(Sampling::FirstRow),
            "all_rows" | "all" => Ok(Sampling::AllRows),
            other => Err(format!(
                "unknown sampling `{other}` (expected first_row|all_rows)"
            )),
        }
    }
}

pub type ColumnTypes = BTreeMap<String, ColumnType>;

/// True when `text` is a JSON object carrying `nodes`, `links` and `encodings`.
pub fn is_graph_document(text: &str) -> bool {
    let trimmed = text.trim_start();
    if !trimmed.starts_with('{') {
        return false;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => {
            GRAPH_DOCUMENT_KEYS.iter().all(|k| map.contains_key(*k))
        }
        _ => false,
    }
}

fn classify(value: &Value) -> Option<ColumnType> {
    match value {
        Value::Null => None,
        Value::Text(s) if is_graph_document(s) => Some(ColumnType::Graph),
        other if other.as_number().is_some() => Some(ColumnType::Numeric),
        _ => Some(ColumnType::Categorical),
    }
}

pub fn infer_column_types(columns: &[String], rows: &[Row], sampling: Sampling) -> ColumnTypes {
    match sampling {
        Sampling::FirstRow => {
            let first = rows.first();
            columns
                .iter()
                .map(|c| {
                    let ty = first
                        .and_then(|row| row.get(c))
                        .and_then(classify)
                        .unwrap_or(ColumnType::Categorical);
                    (c.clone(), ty)
                })
                .collect()
        }
        Sampling::AllRows => columns
            .iter()
            .map(|c| (c.clone(), infer_from_all(c, rows)))
            .collect(),
    }
}

fn infer_from_all(column: &str, rows: &[Row]) -> ColumnType {
    let mut seen: Option<ColumnType> = None;
    for value in rows.iter().filter_map(|r| r.get(column)) {
        let Some(ty) = classify(value) else {
            continue;
        };
        match seen {
            None => seen = Some(ty),
            Some(prev) if prev == ty => {}
            Some(_) => return ColumnType::Categorical,
        }
    }
    seen.unwrap_or(ColumnType::Categorical)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH: &str = r#"{"nodes": [], "links": [], "encodings": {}}"#;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn graph_document_needs_all_keys() {
        assert!(is_graph_document(GRAPH));
        assert!(!is_graph_document(r#"{"nodes": [], "links": []}"#));
        assert!(!is_graph_document("[1,2]"));
        assert!(!is_graph_document("not json"));
    }

    #[test]
    fn first_row_sampling_classifies_each_column() {
        let rows = vec![
            row(&[
                ("sessions", Value::Number(3.0)),
                ("game", Value::from("AQUALAB")),
                ("graph", Value::from(GRAPH)),
            ]),
            row(&[("sessions", Value::from("n/a"))]),
        ];
        let columns = cols(&["sessions", "game", "graph", "absent"]);
        let types = infer_column_types(&columns, &rows, Sampling::FirstRow);
        assert_eq!(types["sessions"], ColumnType::Numeric);
        assert_eq!(types["game"], ColumnType::Categorical);
        assert_eq!(types["graph"], ColumnType::Graph);
        assert_eq!(types["absent"], ColumnType::Categorical);
    }

    #[test]
    fn all_rows_sampling_demotes_mixed_columns() {
        let rows = vec![
            row(&[("score", Value::Number(3.0)), ("time", Value::Null)]),
            row(&[("score", Value::from("n/a")), ("time", Value::Number(1.0))]),
        ];
        let types = infer_column_types(&cols(&["score", "time"]), &rows, Sampling::AllRows);
        assert_eq!(types["score"], ColumnType::Categorical);
        assert_eq!(types["time"], ColumnType::Numeric);

        let first = infer_column_types(&cols(&["score", "time"]), &rows, Sampling::FirstRow);
        assert_eq!(first["score"], ColumnType::Numeric);
        assert_eq!(first["time"], ColumnType::Categorical);
    }

    #[test]
    fn empty_dataset_is_categorical() {
        let types = infer_column_types(&cols(&["a"]), &[], Sampling::AllRows);
        assert_eq!(types["a"], ColumnType::Categorical);
    }

    #[test]
    fn sampling_parses() {
        assert_eq!("all-rows".parse::<Sampling>(), Ok(Sampling::AllRows));
        assert_eq!("FIRST_ROW".parse::<Sampling>(), Ok(Sampling::FirstRow));
        assert!("some".parse::<Sampling>().is_err());
    }
}
