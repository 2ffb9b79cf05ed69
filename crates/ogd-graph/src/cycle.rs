//! Cycle checks run before sankey layout.

use std::collections::{BTreeMap, HashMap};

use crate::error::{GraphError, Result};
use crate::model::{GraphLink, ProgressionGraph};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Temp,
    Perm,
}

/// Three-colour DFS from `start` using an explicit frame stack of
/// (node, index of the next child to try). Returns the closed cycle path on
/// the first back-edge.
fn visit<'a>(
    start: &'a str,
    adj: &BTreeMap<&'a str, Vec<&'a str>>,
    marks: &mut HashMap<&'a str, Mark>,
) -> Option<Vec<String>> {
    if marks.contains_key(start) {
        return None;
    }
    marks.insert(start, Mark::Temp);
    let mut frames: Vec<(&'a str, usize)> = vec![(start, 0)];
    while let Some(frame) = frames.last_mut() {
        let (node, next) = *frame;
        let Some(child) = adj.get(node).and_then(|c| c.get(next)).copied() else {
            marks.insert(node, Mark::Perm);
            frames.pop();
            continue;
        };
        frame.1 += 1;
        match marks.get(child) {
            Some(Mark::Perm) => {}
            Some(Mark::Temp) => {
                // Back-edge: the frames from `child` onward form the cycle.
                let pos = frames.iter().position(|(n, _)| *n == child)?;
                let mut path: Vec<String> =
                    frames[pos..].iter().map(|(n, _)| n.to_string()).collect();
                path.push(child.to_string());
                return Some(path);
            }
            None => {
                marks.insert(child, Mark::Temp);
                frames.push((child, 0));
            }
        }
    }
    None
}

/// First directed cycle among `links`, as a closed path (`[a, b, a]`).
///
/// Nodes are visited in id order, so the result is deterministic.
pub fn find_cycle(links: &[GraphLink]) -> Option<Vec<String>> {
    let mut adj: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for link in links {
        adj.entry(link.source.as_str())
            .or_default()
            .push(link.target.as_str());
        adj.entry(link.target.as_str()).or_default();
    }
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    for &start in adj.keys() {
        if let Some(cycle) = visit(start, &adj, &mut marks) {
            return Some(cycle);
        }
    }
    None
}

pub fn find_self_loop(links: &[GraphLink]) -> Option<&GraphLink> {
    links.iter().find(|l| l.is_self_loop())
}

pub fn has_cycle(links: &[GraphLink]) -> bool {
    find_self_loop(links).is_some() || find_cycle(links).is_some()
}

/// Fail unless `graph` is a DAG.
pub fn ensure_acyclic(graph: &ProgressionGraph) -> Result<()> {
    if let Some(link) = find_self_loop(&graph.links) {
        return Err(GraphError::SelfLoop {
            node: link.source.clone(),
        });
    }
    if let Some(path) = find_cycle(&graph.links) {
        tracing::warn!(cycle = %path.join(" -> "), "graph is not acyclic");
        return Err(GraphError::Cycle { path });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(pairs: &[(&str, &str)]) -> Vec<GraphLink> {
        pairs
            .iter()
            .map(|(s, t)| GraphLink::new(*s, *t, 1.0))
            .collect()
    }

    #[test]
    fn two_node_cycle() {
        let l = links(&[("A", "B"), ("B", "A")]);
        assert!(has_cycle(&l));
        assert_eq!(
            find_cycle(&l),
            Some(vec!["A".to_string(), "B".to_string(), "A".to_string()])
        );
    }

    #[test]
    fn tree_has_no_cycle() {
        let l = links(&[("root", "a"), ("root", "b"), ("a", "c"), ("a", "d")]);
        assert!(!has_cycle(&l));
    }

    #[test]
    fn long_chain_does_not_exhaust_the_stack() {
        let chain: Vec<GraphLink> = (0..100_000)
            .map(|i| GraphLink::new(format!("n{i}"), format!("n{}", i + 1), 1.0))
            .collect();
        assert!(find_cycle(&chain).is_none());

        let mut closed = chain;
        closed.push(GraphLink::new("n100000", "n0", 1.0));
        let path = find_cycle(&closed).unwrap();
        assert_eq!(path.len(), 100_002);
        assert_eq!(path.first(), path.last());
    }

    #[test]
    fn self_loop_is_a_one_node_cycle() {
        let l = links(&[("a", "b"), ("b", "b")]);
        assert_eq!(
            find_cycle(&l),
            Some(vec!["b".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn diamond_is_acyclic() {
        let l = links(&[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]);
        assert!(find_cycle(&l).is_none());
    }

    #[test]
    fn ensure_acyclic_reports_self_loops_first() {
        let g = ProgressionGraph {
            nodes: Vec::new(),
            links: links(&[("x", "y"), ("y", "y"), ("y", "x")]),
        };
        assert_eq!(
            ensure_acyclic(&g),
            Err(GraphError::SelfLoop {
                node: "y".to_string()
            })
        );
    }

    #[test]
    fn cycle_error_names_the_path() {
        let g = ProgressionGraph {
            nodes: Vec::new(),
            links: links(&[("a", "b"), ("b", "c"), ("c", "a")]),
        };
        let err = ensure_acyclic(&g).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cycle detected: a -> b -> c -> a; a sankey layout needs an acyclic graph"
        );
    }
}
