//! Progression graphs from one population-level row.
//!
//! A population export carries per-entity columns named
//! `{entityId}_{metricName}` (`job3_JobsAttempted-num-starts`) and one JSON
//! adjacency column per edge mode. Derivation buckets the entity columns into
//! nodes, reads the adjacency for the chosen mode into links, and drops nodes
//! no link touches.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use ogd_dataset::{Row, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::{GraphError, Result};
use crate::model::{EntityGroup, GraphLink, GraphNode, ProgressionGraph};

/// Which adjacency column drives the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeMode {
    /// Jobs currently in progress. Rendered as a star from the first active
    /// id; these are presentation edges, not transitions.
    ActiveJobs,
    TopJobCompletionDestinations,
    TopJobSwitchDestinations,
}

impl EdgeMode {
    pub const ALL: [EdgeMode; 3] = [
        EdgeMode::ActiveJobs,
        EdgeMode::TopJobCompletionDestinations,
        EdgeMode::TopJobSwitchDestinations,
    ];

    /// Name of the adjacency column for this mode.
    pub fn column(self) -> &'static str {
        match self {
            EdgeMode::ActiveJobs => "ActiveJobs",
            EdgeMode::TopJobCompletionDestinations => "TopJobCompletionDestinations",
            EdgeMode::TopJobSwitchDestinations => "TopJobSwitchDestinations",
        }
    }
}

impl fmt::Display for EdgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for EdgeMode {
    type Err = String;

    /// Accepts the column name in any case, with or without `-`/`_`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let norm: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL
            .into_iter()
            .find(|m| m.column().to_ascii_lowercase() == norm)
            .ok_or_else(|| {
                format!(
                    "unknown edge mode `{s}` (expected active-jobs|\
                     top-job-completion-destinations|top-job-switch-destinations)"
                )
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationOptions {
    /// Metric whose value becomes a node's display id. When unset, the
    /// lexicographically first metric ending in `-name` is used.
    #[serde(default)]
    pub display_metric: Option<String>,
}

fn entity_column_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^((?:job|mission|county|puzzle)\d*)_(.+)$").expect("static regex is valid")
    })
}

/// Split `job3_JobsAttempted-num-starts` into (`job3`, `JobsAttempted-num-starts`).
pub fn parse_entity_column(column: &str) -> Option<(&str, &str)> {
    let caps = entity_column_re().captures(column)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

// Orders job2 before job10.
fn entity_sort_key(entity: &str) -> (String, u64, String) {
    let digits_at = entity
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(entity.len());
    let (prefix, digits) = entity.split_at(digits_at);
    (
        prefix.to_string(),
        digits.parse().unwrap_or(0),
        entity.to_string(),
    )
}

fn display_id(
    entity: &str,
    attributes: &BTreeMap<String, Value>,
    options: &DerivationOptions,
) -> String {
    let metric = match &options.display_metric {
        Some(m) => Some(m.as_str()),
        None => attributes
            .keys()
            .map(String::as_str)
            .find(|k| k.ends_with("-name")),
    };
    metric
        .and_then(|m| attributes.get(m))
        .map(|v| v.to_key())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| entity.to_string())
}

/// Step 1: one node per entity id found in the row's columns.
pub fn entity_nodes(row: &Row, options: &DerivationOptions) -> Vec<GraphNode> {
    let mut entities: BTreeMap<(String, u64, String), BTreeMap<String, Value>> = BTreeMap::new();
    for (column, value) in row {
        if let Some((entity, metric)) = parse_entity_column(column) {
            entities
                .entry(entity_sort_key(entity))
                .or_default()
                .insert(metric.to_string(), value.clone());
        }
    }

    let mut seen = BTreeSet::new();
    let mut nodes = Vec::with_capacity(entities.len());
    for ((_, _, entity), attributes) in entities {
        let id = display_id(&entity, &attributes, options);
        if !seen.insert(id.clone()) {
            tracing::warn!(
                entity = %entity,
                id = %id,
                "duplicate node id; keeping the first entity"
            );
            continue;
        }
        nodes.push(GraphNode {
            id,
            group: EntityGroup::from_entity_id(&entity),
            entity: Some(entity),
            attributes,
        });
    }
    nodes
}

fn malformed(mode: EdgeMode, reason: impl Into<String>) -> GraphError {
    GraphError::MalformedAdjacency {
        column: mode.column().to_string(),
        reason: reason.into(),
    }
}

fn adjacency_json(row: &Row, mode: EdgeMode) -> Result<Json> {
    let column = mode.column();
    let text = match row.get(column) {
        None | Some(Value::Null) => return Err(GraphError::MissingColumn(column.to_string())),
        Some(Value::Text(s)) => s.as_str(),
        Some(Value::Number(_)) => return Err(malformed(mode, "expected JSON text, found a number")),
    };
    serde_json::from_str(text).map_err(|e| malformed(mode, e.to_string()))
}

fn json_id(value: &Json) -> Option<String> {
    match value {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// source → target → players; one link per pair weighted by player count.
fn destination_links(mode: EdgeMode, json: &Json) -> Result<Vec<GraphLink>> {
    let Json::Object(sources) = json else {
        return Err(malformed(mode, "expected an object of sources"));
    };
    let mut links = Vec::new();
    for (source, targets) in sources {
        let Json::Object(targets) = targets else {
            return Err(malformed(mode, format!("targets of `{source}` are not an object")));
        };
        for (target, players) in targets {
            let Json::Array(players) = players else {
                return Err(malformed(
                    mode,
                    format!("players for `{source}` -> `{target}` are not a list"),
                ));
            };
            if source == target {
                continue;
            }
            links.push(GraphLink::new(source.clone(), target.clone(), players.len() as f64));
        }
    }
    Ok(links)
}

/// A flat set of active ids; a star from the first id to each other id.
fn active_links(mode: EdgeMode, json: &Json) -> Result<Vec<GraphLink>> {
    let ids: Vec<String> = match json {
        Json::Array(items) => items
            .iter()
            .map(|v| json_id(v).ok_or_else(|| malformed(mode, format!("non-scalar id {v}"))))
            .collect::<Result<_>>()?,
        Json::Object(map) => map.keys().cloned().collect(),
        _ => return Err(malformed(mode, "expected a list or object of active ids")),
    };
    let Some((first, rest)) = ids.split_first() else {
        return Ok(Vec::new());
    };
    let mut seen = BTreeSet::new();
    Ok(rest
        .iter()
        .filter(|id| *id != first && seen.insert(id.as_str()))
        .map(|id| GraphLink::new(first.clone(), id.clone(), 1.0))
        .collect())
}

/// Links for `mode` read from the row's adjacency column.
pub fn adjacency_links(row: &Row, mode: EdgeMode) -> Result<Vec<GraphLink>> {
    let json = adjacency_json(row, mode)?;
    match mode {
        EdgeMode::ActiveJobs => active_links(mode, &json),
        EdgeMode::TopJobCompletionDestinations | EdgeMode::TopJobSwitchDestinations => {
            destination_links(mode, &json)
        }
    }
}

pub fn derive_progression_graph(
    row: &Row,
    mode: EdgeMode,
    options: &DerivationOptions,
) -> Result<ProgressionGraph> {
    let nodes = entity_nodes(row, options);
    let links = adjacency_links(row, mode)?;
    let mut graph = ProgressionGraph { nodes, links };

    let synthesized = graph.add_missing_endpoints();
    let dropped = graph.drop_isolated();
    tracing::debug!(
        mode = %mode,
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        synthesized,
        dropped,
        "derived progression graph"
    );
    Ok(graph)
}
