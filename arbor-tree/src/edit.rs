use crate::error::{Result, TreeError};
use crate::flatten::FlatNode;
use crate::model::NodeType;

/// Editable copy of a flat record handed to an edit surface.
///
/// Dropping the draft cancels the edit. [`NodeDraft::finish`] validates it
/// and yields the record to pass to
/// [`TreeStore::update_node`](crate::TreeStore::update_node).
#[derive(Debug, Clone)]
pub struct NodeDraft {
    original: FlatNode,
    name: String,
    node_type: NodeType,
}

impl NodeDraft {
    pub fn from_flat(node: &FlatNode) -> Self {
        Self {
            original: node.clone(),
            name: node.name.clone(),
            node_type: node.node_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.name = value.into();
    }

    pub fn set_type(&mut self, value: NodeType) {
        self.node_type = value;
    }

    /// Whether the draft differs from the record it was opened with.
    pub fn is_modified(&self) -> bool {
        self.name != self.original.name
            || self.node_type != self.original.node_type
    }

    /// Validate and produce the edited record.
    pub fn finish(self) -> Result<FlatNode> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(TreeError::NameRequired);
        }
        if !self.node_type.is_known() {
            return Err(TreeError::UnsupportedType(self.node_type.code()));
        }
        Ok(FlatNode {
            name: name.to_owned(),
            node_type: self.node_type,
            ..self.original
        })
    }
}
