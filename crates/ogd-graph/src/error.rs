use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("row has no `{0}` column")]
    MissingColumn(String),
    #[error("malformed `{column}` adjacency: {reason}")]
    MalformedAdjacency { column: String, reason: String },
    #[error("malformed graph document: {0}")]
    MalformedDocument(String),
    #[error("self-loop on `{node}`; a sankey layout needs an acyclic graph")]
    SelfLoop { node: String },
    #[error("cycle detected: {}; a sankey layout needs an acyclic graph", .path.join(" -> "))]
    Cycle { path: Vec<String> },
}

pub type Result<T> = std::result::Result<T, GraphError>;
