//! Progression graphs for Open Game Data population exports
//!
//! - `derive`: job graphs from per-entity columns plus a JSON adjacency column
//! - `document`: pre-built `{nodes, links, encodings}` graph cells
//! - `cycle`: self-loop and DFS cycle checks
//! - `sankey`: longest-path layering for acyclic graphs

pub mod cycle;
pub mod derive;
pub mod document;
pub mod error;
pub mod model;
pub mod sankey;

pub use cycle::{ensure_acyclic, find_cycle, has_cycle};
pub use derive::{derive_progression_graph, DerivationOptions, EdgeMode};
pub use document::GraphDocument;
pub use error::GraphError;
pub use model::{EntityGroup, GraphLink, GraphNode, ProgressionGraph};
pub use sankey::{SankeyLayout, SankeyNode};
