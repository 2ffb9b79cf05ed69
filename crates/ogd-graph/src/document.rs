//! Pre-built graph documents stored in `Graph`-typed columns.
//!
//! Shape:
//!
//! ```text
//! {"nodes": [{"id": .., ...}],
//!  "links": [{"source": .., "target": .., "value": ..}],
//!  "encodings": {..}}
//! ```
//!
//! Node and link ids may be strings or numbers; extra node fields become
//! attributes. `encodings` is renderer configuration and is kept verbatim.

use std::collections::BTreeMap;

use ogd_dataset::Value;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;

use crate::error::{GraphError, Result};
use crate::model::{GraphLink, GraphNode, ProgressionGraph};

fn scalar_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Json::deserialize(deserializer)? {
        Json::String(s) => Ok(s),
        Json::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, found {other}"
        ))),
    }
}

fn default_link_value() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    #[serde(deserialize_with = "scalar_id")]
    pub id: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Json>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLink {
    #[serde(deserialize_with = "scalar_id")]
    pub source: String,
    #[serde(deserialize_with = "scalar_id")]
    pub target: String,
    #[serde(default = "default_link_value")]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<DocumentNode>,
    pub links: Vec<DocumentLink>,
    pub encodings: Json,
}

fn attribute_value(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
        Json::String(s) => Value::Text(s),
        other => Value::Text(other.to_string()),
    }
}

impl GraphDocument {
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| GraphError::MalformedDocument(e.to_string()))
    }

    /// Parse a graph cell; null and numeric cells are rejected.
    pub fn from_cell(cell: &Value) -> Result<Self> {
        match cell {
            Value::Text(text) => Self::parse(text),
            other => Err(GraphError::MalformedDocument(format!(
                "expected JSON text, found `{other}`"
            ))),
        }
    }

    pub fn into_graph(self) -> ProgressionGraph {
        let nodes = self
            .nodes
            .into_iter()
            .map(|n| {
                let mut node = GraphNode::bare(n.id);
                node.attributes = n
                    .attributes
                    .into_iter()
                    .map(|(k, v)| (k, attribute_value(v)))
                    .collect();
                node
            })
            .collect();
        let links = self
            .links
            .into_iter()
            .map(|l| GraphLink::new(l.source, l.target, l.value))
            .collect();
        let mut graph = ProgressionGraph { nodes, links };
        graph.add_missing_endpoints();
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "nodes": [{"id": "kelp-welcome", "avg_time": 120.5, "tags": ["intro"]}, {"id": 7}],
        "links": [
            {"source": "kelp-welcome", "target": 7, "value": 12},
            {"source": 7, "target": "arctic"}
        ],
        "encodings": {"color": "group"}
    }"#;

    #[test]
    fn parses_mixed_ids_and_attributes() {
        let doc = GraphDocument::parse(DOC).unwrap();
        assert_eq!(doc.nodes[1].id, "7");
        assert_eq!(doc.links[0].target, "7");
        assert_eq!(doc.links[1].value, 1.0);
        assert_eq!(doc.encodings["color"], "group");

        let g = doc.into_graph();
        let welcome = g.node("kelp-welcome").unwrap();
        assert_eq!(welcome.attributes["avg_time"], Value::Number(120.5));
        assert_eq!(welcome.attributes["tags"], Value::Text(r#"["intro"]"#.to_string()));
        // `arctic` is only a link endpoint.
        assert!(g.node("arctic").is_some());
        assert_eq!(g.links[0].value, 12.0);
    }

    #[test]
    fn rejects_non_documents() {
        assert!(matches!(
            GraphDocument::parse(r#"{"nodes": []}"#),
            Err(GraphError::MalformedDocument(_))
        ));
        assert!(GraphDocument::from_cell(&Value::Number(1.0)).is_err());
        assert!(GraphDocument::from_cell(&Value::from(DOC)).is_ok());
    }
}
