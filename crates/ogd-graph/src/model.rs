use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ogd_dataset::Value;
use serde::{Deserialize, Serialize};

/// Kind of game object a per-entity column describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityGroup {
    Job,
    Mission,
    County,
    Puzzle,
}

impl EntityGroup {
    pub const ALL: [EntityGroup; 4] = [
        EntityGroup::Job,
        EntityGroup::Mission,
        EntityGroup::County,
        EntityGroup::Puzzle,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            EntityGroup::Job => "job",
            EntityGroup::Mission => "mission",
            EntityGroup::County => "county",
            EntityGroup::Puzzle => "puzzle",
        }
    }

    /// Group of an entity id such as `job12`; the suffix must be digits.
    pub fn from_entity_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| {
            id.strip_prefix(g.prefix())
                .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
        })
    }
}

impl fmt::Display for EntityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Display id; links refer to nodes by this.
    pub id: String,
    /// Column-level entity id (`job3`), when the node came from entity columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<EntityGroup>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

impl GraphNode {
    /// A node known only by id, e.g. an edge endpoint with no entity columns.
    pub fn bare(id: impl Into<String>) -> Self {
        let id = id.into();
        let group = EntityGroup::from_entity_id(&id);
        Self {
            id,
            entity: None,
            group,
            attributes: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub value: f64,
}

impl GraphLink {
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Node/link graph in the shape force and sankey renderers consume.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressionGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl ProgressionGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    /// Ids appearing as a link source or target.
    pub fn endpoint_ids(&self) -> BTreeSet<&str> {
        self.links
            .iter()
            .flat_map(|l| [l.source.as_str(), l.target.as_str()])
            .collect()
    }

    /// Remove nodes no link touches; returns how many were dropped.
    pub fn drop_isolated(&mut self) -> usize {
        let endpoints: BTreeSet<String> = self
            .endpoint_ids()
            .into_iter()
            .map(str::to_string)
            .collect();
        let before = self.nodes.len();
        self.nodes.retain(|n| endpoints.contains(&n.id));
        before - self.nodes.len()
    }

    /// Add a bare node for every link endpoint that names no node.
    pub fn add_missing_endpoints(&mut self) -> usize {
        let known: BTreeSet<String> = self.nodes.iter().map(|n| n.id.clone()).collect();
        let missing: BTreeSet<String> = self
            .endpoint_ids()
            .into_iter()
            .filter(|id| !known.contains(*id))
            .map(str::to_string)
            .collect();
        let added = missing.len();
        self.nodes.extend(missing.into_iter().map(GraphNode::bare));
        added
    }

    /// Directed adjacency over link endpoints, source → targets.
    pub fn adjacency(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut adj: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for link in &self.links {
            adj.entry(link.source.as_str())
                .or_default()
                .push(link.target.as_str());
            adj.entry(link.target.as_str()).or_default();
        }
        adj
    }
}
