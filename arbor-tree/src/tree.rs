use std::collections::HashMap;

use crate::model::{NodeId, NodeType, TreeNode};

/// Where a node goes relative to an existing target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Immediately before the target, in the target's sequence.
    Above,
    /// Immediately after the target, in the target's sequence.
    Below,
    /// Last child of the target.
    Inside,
}

#[derive(Debug, Clone)]
struct Slot {
    id: NodeId,
    name: String,
    node_type: NodeType,
    parent: Option<usize>,
    children: Option<Vec<usize>>,
}

/// Arena-backed nested tree.
///
/// Nodes live in a slot vector and refer to each other by slot index. The
/// `NodeId -> slot` index replaces reference identity: ids are unique within
/// a tree, so an index lookup finds the same node a depth-first search would.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    index: HashMap<NodeId, usize>,
    roots: Vec<usize>,
}

/// Borrowed view of a single node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree,
    slot: usize,
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a Slot {
        self.tree.slot(self.slot)
    }

    pub fn id(&self) -> &'a NodeId {
        &self.data().id
    }

    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    pub fn node_type(&self) -> NodeType {
        self.data().node_type
    }

    /// Depth from the root sequence (roots are level `0`).
    pub fn level(&self) -> usize {
        let mut level = 0;
        let mut current = self.data().parent;
        while let Some(parent) = current {
            level += 1;
            current = self.tree.slot(parent).parent;
        }
        level
    }

    /// Whether the node has at least one child.
    pub fn is_expandable(&self) -> bool {
        self.data()
            .children
            .as_ref()
            .is_some_and(|children| !children.is_empty())
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data().parent.map(|slot| NodeRef {
            tree: self.tree,
            slot,
        })
    }

    /// Children of the node, or `None` for a leaf.
    ///
    /// An emptied container yields `Some` with no items.
    pub fn children(
        &self,
    ) -> Option<impl Iterator<Item = NodeRef<'a>> + use<'a>> {
        let tree = self.tree;
        self.data()
            .children
            .as_ref()
            .map(move |children| {
                children.iter().map(move |&slot| NodeRef { tree, slot })
            })
    }

    /// Owned nested copy of this node's subtree.
    pub fn to_nested(&self) -> TreeNode {
        self.tree.nested_at(self.slot)
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", self.id())
            .field("name", &self.name())
            .finish()
    }
}

/// Pre-order walk yielding each node with its depth.
pub struct Preorder<'a> {
    tree: &'a Tree,
    stack: Vec<(usize, usize)>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (NodeRef<'a>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let (slot, depth) = self.stack.pop()?;
        if let Some(children) = &tree.slot(slot).children {
            self.stack
                .extend(children.iter().rev().map(|&child| (child, depth + 1)));
        }
        Some((NodeRef { tree, slot }, depth))
    }
}

impl Tree {
    /// Build a tree from nested nodes.
    ///
    /// A repeated id gets a fresh one so the index stays unique.
    pub fn from_nested(nodes: Vec<TreeNode>) -> Self {
        let mut tree = Self::default();
        for node in nodes {
            let slot = tree.insert_subtree(node, None, false);
            tree.roots.push(slot);
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &NodeId) -> Option<NodeRef<'_>> {
        self.index.get(id).map(|&slot| NodeRef { tree: self, slot })
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.roots.iter().map(move |&slot| NodeRef { tree: self, slot })
    }

    pub fn parent(&self, id: &NodeId) -> Option<NodeRef<'_>> {
        self.get(id)?.parent()
    }

    /// Children accessor: `None` for leaves and unknown ids.
    pub fn children<'a>(
        &'a self,
        id: &NodeId,
    ) -> Option<impl Iterator<Item = NodeRef<'a>> + use<'a>> {
        self.get(id)?.children()
    }

    pub fn level(&self, id: &NodeId) -> Option<usize> {
        self.get(id).map(|node| node.level())
    }

    pub fn is_expandable(&self, id: &NodeId) -> bool {
        self.get(id).is_some_and(|node| node.is_expandable())
    }

    /// Whether `ancestor` lies on the parent chain of `node`.
    pub fn is_ancestor(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        let Some(&ancestor) = self.index.get(ancestor) else {
            return false;
        };
        let mut current =
            self.index.get(node).and_then(|&slot| self.parent_of(slot));
        while let Some(slot) = current {
            if slot == ancestor {
                return true;
            }
            current = self.parent_of(slot);
        }
        false
    }

    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: self.roots.iter().rev().map(|&slot| (slot, 0)).collect(),
        }
    }

    /// Owned nested copy of the whole root sequence.
    pub fn to_nested(&self) -> Vec<TreeNode> {
        self.roots.iter().map(|&slot| self.nested_at(slot)).collect()
    }

    // --- Crate-internal mutation primitives ---

    pub(crate) fn slot_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn id_at(&self, slot: usize) -> &NodeId {
        &self.slot(slot).id
    }

    pub(crate) fn rename(&mut self, slot: usize, name: String) {
        self.slot_mut(slot).name = name;
    }

    pub(crate) fn set_type(&mut self, slot: usize, node_type: NodeType) {
        self.slot_mut(slot).node_type = node_type;
    }

    /// Resolve a placement against `target` into a sequence owner and an
    /// insertion position.
    pub(crate) fn resolve(
        &self,
        target: usize,
        placement: Placement,
    ) -> (Option<usize>, usize) {
        match placement {
            Placement::Inside => {
                let len = self
                    .slot(target)
                    .children
                    .as_ref()
                    .map_or(0, Vec::len);
                (Some(target), len)
            },
            Placement::Above | Placement::Below => {
                let parent = self.parent_of(target);
                let position = self
                    .sequence(parent)
                    .iter()
                    .position(|&slot| slot == target)
                    .unwrap_or(0);
                let offset = usize::from(placement == Placement::Below);
                (parent, position + offset)
            },
        }
    }

    /// Allocate `node` (and its subtree) and splice it into the sequence
    /// owned by `parent` at `position`.
    ///
    /// With `fresh_ids` every allocated node gets a newly generated id.
    pub(crate) fn graft(
        &mut self,
        node: TreeNode,
        parent: Option<usize>,
        position: usize,
        fresh_ids: bool,
    ) -> usize {
        let slot = self.insert_subtree(node, parent, fresh_ids);
        self.attach(slot, parent, position);
        slot
    }

    /// Splice `slot` into the sequence owned by `parent`, creating the
    /// child sequence when absent.
    pub(crate) fn attach(
        &mut self,
        slot: usize,
        parent: Option<usize>,
        position: usize,
    ) {
        self.slot_mut(slot).parent = parent;
        let sequence = self.sequence_mut(parent);
        let position = position.min(sequence.len());
        sequence.insert(position, slot);
    }

    /// Remove `slot` from its containing sequence without freeing it.
    pub(crate) fn detach(&mut self, slot: usize) {
        let parent = self.parent_of(slot);
        let sequence = self.sequence_mut(parent);
        if let Some(position) = sequence.iter().position(|&s| s == slot) {
            sequence.remove(position);
        }
        self.slot_mut(slot).parent = None;
    }

    /// Detach `slot` and free it together with its subtree.
    pub(crate) fn remove(&mut self, slot: usize) -> TreeNode {
        let nested = self.nested_at(slot);
        self.detach(slot);
        self.release(slot);
        nested
    }

    fn release(&mut self, slot: usize) {
        let mut stack = vec![slot];
        while let Some(slot) = stack.pop() {
            let Some(data) = self.slots.get_mut(slot).and_then(Option::take)
            else {
                continue;
            };
            self.index.remove(&data.id);
            self.free.push(slot);
            stack.extend(data.children.into_iter().flatten());
        }
    }

    /// Allocate `node` and its whole subtree below `parent`.
    ///
    /// The returned root is not spliced into any sequence; descendants are
    /// linked to their parents in source order.
    fn insert_subtree(
        &mut self,
        node: TreeNode,
        parent: Option<usize>,
        fresh_ids: bool,
    ) -> usize {
        let mut pending = Vec::new();
        let root = self.alloc_node(node, parent, fresh_ids, &mut pending);
        while let Some((child, owner)) = pending.pop() {
            let slot =
                self.alloc_node(child, Some(owner), fresh_ids, &mut pending);
            self.slot_mut(owner)
                .children
                .get_or_insert_with(Vec::new)
                .push(slot);
        }
        root
    }

    // Children are queued in reverse so `pending` pops them in order.
    fn alloc_node(
        &mut self,
        mut node: TreeNode,
        parent: Option<usize>,
        fresh_ids: bool,
        pending: &mut Vec<(TreeNode, usize)>,
    ) -> usize {
        let id = std::mem::replace(&mut node.id, NodeId::new(String::new()));
        let id = if fresh_ids || self.index.contains_key(&id) {
            if !fresh_ids {
                log::warn!("duplicate node id {id}, assigning new one");
            }
            NodeId::generate()
        } else {
            id
        };
        let children = node.children.take();
        let slot = self.alloc(Slot {
            id,
            name: std::mem::take(&mut node.name),
            node_type: node.node_type,
            parent,
            children: children
                .as_ref()
                .map(|children| Vec::with_capacity(children.len())),
        });
        if let Some(children) = children {
            pending.extend(
                children.into_iter().rev().map(|child| (child, slot)),
            );
        }
        slot
    }

    fn alloc(&mut self, data: Slot) -> usize {
        let id = data.id.clone();
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(data);
                slot
            },
            None => {
                self.slots.push(Some(data));
                self.slots.len() - 1
            },
        };
        self.index.insert(id, slot);
        slot
    }

    fn nested_at(&self, slot: usize) -> TreeNode {
        // Breadth-first listing: parents precede children, and siblings
        // stay contiguous and in order.
        let mut order = vec![(slot, 0)];
        let mut cursor = 0;
        while let Some(&(current, _)) = order.get(cursor) {
            if let Some(children) = &self.slot(current).children {
                order.extend(children.iter().map(|&child| (child, cursor)));
            }
            cursor += 1;
        }

        let mut built: Vec<Option<Vec<TreeNode>>> = order
            .iter()
            .map(|&(slot, _)| {
                self.slot(slot)
                    .children
                    .as_ref()
                    .map(|children| Vec::with_capacity(children.len()))
            })
            .collect();
        for index in (1..order.len()).rev() {
            let (slot, parent) = order[index];
            let node = self.nested_node(slot, built[index].take());
            if let Some(siblings) = built[parent].as_mut() {
                siblings.push(node);
            }
        }
        self.nested_node(slot, built[0].take())
    }

    // `children` arrive in reverse sibling order.
    fn nested_node(
        &self,
        slot: usize,
        children: Option<Vec<TreeNode>>,
    ) -> TreeNode {
        let data = self.slot(slot);
        TreeNode {
            id: data.id.clone(),
            name: data.name.clone(),
            node_type: data.node_type,
            children: children.map(|mut children| {
                children.reverse();
                children
            }),
        }
    }

    fn parent_of(&self, slot: usize) -> Option<usize> {
        self.slot(slot).parent
    }

    fn sequence(&self, parent: Option<usize>) -> &[usize] {
        match parent {
            Some(parent) => {
                self.slot(parent).children.as_deref().unwrap_or_default()
            },
            None => &self.roots,
        }
    }

    fn sequence_mut(&mut self, parent: Option<usize>) -> &mut Vec<usize> {
        match parent {
            Some(parent) => {
                self.slot_mut(parent).children.get_or_insert_with(Vec::new)
            },
            None => &mut self.roots,
        }
    }

    // Slot indices handed out by the index always point at live slots.
    fn slot(&self, slot: usize) -> &Slot {
        match self.slots.get(slot) {
            Some(Some(data)) => data,
            _ => unreachable!("dangling tree slot {slot}"),
        }
    }

    fn slot_mut(&mut self, slot: usize) -> &mut Slot {
        match self.slots.get_mut(slot) {
            Some(Some(data)) => data,
            _ => unreachable!("dangling tree slot {slot}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(
        id: &str,
        name: &str,
        children: Option<Vec<TreeNode>>,
    ) -> TreeNode {
        TreeNode {
            id: NodeId::from(id),
            name: name.to_owned(),
            node_type: NodeType::Concept,
            children,
        }
    }

    fn sample() -> Tree {
        Tree::from_nested(vec![
            node(
                "a",
                "a",
                Some(vec![
                    node("b", "b", Some(vec![node("c", "c", None)])),
                    node("d", "d", Some(Vec::new())),
                ]),
            ),
            node("e", "e", None),
        ])
    }

    fn preorder_ids(tree: &Tree) -> Vec<(String, usize)> {
        tree.preorder()
            .map(|(node, depth)| (node.id().to_string(), depth))
            .collect()
    }

    #[test]
    fn given_nested_nodes_when_walked_then_order_is_preorder_with_depth() {
        let tree = sample();
        assert_eq!(
            preorder_ids(&tree),
            vec![
                ("a".to_owned(), 0),
                ("b".to_owned(), 1),
                ("c".to_owned(), 2),
                ("d".to_owned(), 1),
                ("e".to_owned(), 0),
            ]
        );
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn given_leaf_and_empty_container_when_reading_children_then_they_differ()
    {
        let tree = sample();
        assert!(tree.children(&NodeId::from("e")).is_none());
        let empty = tree
            .children(&NodeId::from("d"))
            .expect("container should expose children");
        assert_eq!(empty.count(), 0);
        assert!(!tree.is_expandable(&NodeId::from("d")));
        assert!(tree.is_expandable(&NodeId::from("a")));
    }

    #[test]
    fn given_nested_node_when_querying_level_and_ancestry_then_chain_is_used() {
        let tree = sample();
        assert_eq!(tree.level(&NodeId::from("c")), Some(2));
        assert!(tree.is_ancestor(&NodeId::from("a"), &NodeId::from("c")));
        assert!(!tree.is_ancestor(&NodeId::from("c"), &NodeId::from("a")));
        assert!(!tree.is_ancestor(&NodeId::from("a"), &NodeId::from("a")));
        assert_eq!(
            tree.parent(&NodeId::from("c")).map(|p| p.id().to_string()),
            Some("b".to_owned())
        );
    }

    #[test]
    fn given_duplicate_ids_when_building_then_later_copy_gets_new_id() {
        let tree = Tree::from_nested(vec![
            node("x", "first", None),
            node("x", "second", None),
        ]);
        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.get(&NodeId::from("x")).map(|n| n.name()),
            Some("first")
        );
    }

    #[test]
    fn given_removed_subtree_when_reallocating_then_slots_are_reused() {
        let mut tree = sample();
        let slot = tree.slot_of(&NodeId::from("b")).expect("b exists");
        let removed = tree.remove(slot);
        assert_eq!(removed.subtree_len(), 2);
        assert!(!tree.contains(&NodeId::from("c")));
        assert_eq!(tree.len(), 3);

        let before = tree.slots.len();
        tree.graft(node("f", "f", None), None, 0, false);
        assert_eq!(tree.slots.len(), before);
        assert_eq!(preorder_ids(&tree)[0], ("f".to_owned(), 0));
    }

    #[test]
    fn given_placements_when_resolving_then_positions_match_sibling_order() {
        let tree = sample();
        let a = tree.slot_of(&NodeId::from("a")).expect("a");
        let d = tree.slot_of(&NodeId::from("d")).expect("d");
        let e = tree.slot_of(&NodeId::from("e")).expect("e");
        assert_eq!(tree.resolve(a, Placement::Inside), (Some(a), 2));
        assert_eq!(tree.resolve(d, Placement::Above), (Some(a), 1));
        assert_eq!(tree.resolve(d, Placement::Below), (Some(a), 2));
        assert_eq!(tree.resolve(e, Placement::Below), (None, 2));
    }
}
