//! Sankey layering: column assignment for an acyclic progression graph.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::cycle::ensure_acyclic;
use crate::error::Result;
use crate::model::{GraphLink, ProgressionGraph};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyNode {
    pub id: String,
    /// Column index: the longest path from any source node.
    pub depth: usize,
    /// Node height: max of total inflow and total outflow.
    pub value: f64,
    pub inflow: f64,
    pub outflow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyLayout {
    /// Sorted by (depth, id).
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<GraphLink>,
    pub columns: usize,
}

impl SankeyLayout {
    /// Check `graph` for cycles, then layer it.
    pub fn build(graph: &ProgressionGraph) -> Result<Self> {
        ensure_acyclic(graph)?;

        let adj = graph.adjacency();
        let mut depth: BTreeMap<&str, usize> = graph
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), 0))
            .collect();
        let mut indegree: BTreeMap<&str, usize> = BTreeMap::new();
        for (&node, targets) in &adj {
            depth.entry(node).or_insert(0);
            indegree.entry(node).or_insert(0);
            for &t in targets {
                *indegree.entry(t).or_insert(0) += 1;
            }
        }

        // Kahn's algorithm; relaxing depth along the topological order gives
        // longest-path layering.
        let mut queue: VecDeque<&str> = indegree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| *n)
            .collect();
        while let Some(node) = queue.pop_front() {
            let here = depth.get(node).copied().unwrap_or(0);
            for &t in adj.get(node).map(Vec::as_slice).unwrap_or(&[]) {
                let d = depth.entry(t).or_insert(0);
                *d = (*d).max(here + 1);
                if let Some(deg) = indegree.get_mut(t) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(t);
                    }
                }
            }
        }

        let mut inflow: BTreeMap<&str, f64> = BTreeMap::new();
        let mut outflow: BTreeMap<&str, f64> = BTreeMap::new();
        for link in &graph.links {
            *outflow.entry(link.source.as_str()).or_insert(0.0) += link.value;
            *inflow.entry(link.target.as_str()).or_insert(0.0) += link.value;
        }

        let mut nodes: Vec<SankeyNode> = depth
            .iter()
            .map(|(&id, &depth)| {
                let inflow = inflow.get(id).copied().unwrap_or(0.0);
                let outflow = outflow.get(id).copied().unwrap_or(0.0);
                SankeyNode {
                    id: id.to_string(),
                    depth,
                    value: inflow.max(outflow),
                    inflow,
                    outflow,
                }
            })
            .collect();
        nodes.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.id.cmp(&b.id)));
        let columns = nodes.iter().map(|n| n.depth + 1).max().unwrap_or(0);

        Ok(Self {
            nodes,
            links: graph.links.clone(),
            columns,
        })
    }

    /// Node ids per column, left to right.
    pub fn column_ids(&self) -> Vec<Vec<&str>> {
        let mut out: Vec<Vec<&str>> = vec![Vec::new(); self.columns];
        for n in &self.nodes {
            out[n.depth].push(n.id.as_str());
        }
        out
    }
}
