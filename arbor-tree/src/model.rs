use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a tree node.
///
/// Ids read from records are kept verbatim. Nodes created by the store get
/// a random v4 UUID.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh unique identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Category tag of a node, serialized as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum NodeType {
    Concept,
    MainConcept,
    Function,
    Folder,
    /// Code outside the known set, preserved as read.
    Other(u32),
}

impl NodeType {
    /// Types an editor may assign.
    pub const KNOWN: [NodeType; 4] = [
        NodeType::Concept,
        NodeType::MainConcept,
        NodeType::Function,
        NodeType::Folder,
    ];

    pub fn code(self) -> u32 {
        match self {
            Self::Concept => 1,
            Self::MainConcept => 2,
            Self::Function => 3,
            Self::Folder => 10,
            Self::Other(code) => code,
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<u32> for NodeType {
    fn from(code: u32) -> Self {
        match code {
            1 => Self::Concept,
            2 => Self::MainConcept,
            3 => Self::Function,
            10 => Self::Folder,
            other => Self::Other(other),
        }
    }
}

impl From<NodeType> for u32 {
    fn from(value: NodeType) -> Self {
        value.code()
    }
}

/// Nested, owned form of a node and its subtree.
///
/// `children` is `None` for a leaf. `Some(vec![])` is an empty container,
/// which is not expandable but is still distinct from a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default = "NodeId::generate")]
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    /// Build a leaf node with a fresh id.
    pub fn leaf(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: NodeId::generate(),
            name: name.into(),
            node_type,
            children: None,
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter().flatten());
        }
        count
    }
}

// Unlinks descendants onto a heap stack so deep chains do not drop
// recursively.
impl Drop for TreeNode {
    fn drop(&mut self) {
        let Some(mut stack) = self.children.take() else {
            return;
        };
        while let Some(mut node) = stack.pop() {
            if let Some(children) = node.children.take() {
                stack.extend(children);
            }
        }
    }
}
