use std::collections::HashSet;

use arbor_tree::{FlatNode, FlatTree, NodeId, NodeRef, Tree};

/// Expand/collapse state consulted and changed by drag gestures.
pub trait ExpansionView {
    fn is_expanded(&self, id: &NodeId) -> bool;
    fn expand(&mut self, id: &NodeId);
    fn collapse(&mut self, id: &NodeId);
}

/// Expand `id` and every node below it.
pub fn expand_descendants(
    expansion: &mut impl ExpansionView,
    tree: &Tree,
    id: &NodeId,
) {
    let mut stack: Vec<NodeRef<'_>> = tree.get(id).into_iter().collect();
    while let Some(node) = stack.pop() {
        expansion.expand(node.id());
        stack.extend(node.children().into_iter().flatten());
    }
}

/// Set of expanded node ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionSet {
    expanded: HashSet<NodeId>,
}

impl ExpansionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &NodeId) {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.clone());
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Forget ids that no longer exist in `tree`.
    pub fn retain_existing(&mut self, tree: &Tree) {
        self.expanded.retain(|id| tree.contains(id));
    }

    /// Rows whose ancestors are all expanded, in flat order.
    pub fn visible<'a>(&self, flat: &'a FlatTree) -> Vec<&'a FlatNode> {
        let mut rows = Vec::with_capacity(flat.len());
        let mut hidden_below: Option<usize> = None;
        for row in flat.nodes() {
            if let Some(level) = hidden_below {
                if row.level > level {
                    continue;
                }
                hidden_below = None;
            }
            rows.push(row);
            if row.expandable && !self.is_expanded(&row.id) {
                hidden_below = Some(row.level);
            }
        }
        rows
    }
}

impl ExpansionView for ExpansionSet {
    fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    fn expand(&mut self, id: &NodeId) {
        self.expanded.insert(id.clone());
    }

    fn collapse(&mut self, id: &NodeId) {
        self.expanded.remove(id);
    }
}
