use thiserror::Error;

use crate::model::NodeId;

/// Errors produced by tree store operations.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("cannot move node {node} into its own subtree at {target}")]
    MoveIntoDescendant { node: NodeId, target: NodeId },

    #[error("name must not be empty")]
    NameRequired,

    #[error("unsupported node type code {0}")]
    UnsupportedType(u32),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TreeError>;
