use flume::Receiver;

use crate::error::{Result, TreeError};
use crate::flatten::FlatNode;
use crate::model::{NodeId, NodeType, TreeNode};
use crate::notify::{Observers, Snapshot, SubscriptionId};
use crate::options::TreeOptions;
use crate::records::RawRecord;
use crate::tree::{Placement, Tree};

/// Owner of the canonical tree and its change-notification stream.
///
/// Every successful mutation pushes exactly one notification, including
/// multi-node operations such as deep copies. Failed lookups return
/// [`TreeError::NodeNotFound`] and leave the tree untouched.
#[derive(Debug, Default)]
pub struct TreeStore {
    tree: Tree,
    observers: Observers,
    options: TreeOptions,
    revision: u64,
}

impl TreeStore {
    /// Create a store populated from `records`.
    pub fn new(records: &[RawRecord]) -> Self {
        let mut store = Self::default();
        store.initialize(records);
        store
    }

    /// Create an empty store with custom options.
    pub fn with_options(options: TreeOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Owned nested copy of the current root sequence.
    pub fn snapshot(&self) -> Vec<TreeNode> {
        self.tree.to_nested()
    }

    /// Number of notifications emitted so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- Notifications ---

    /// Register an inline observer.
    ///
    /// The observer is called immediately with the current tree and then
    /// once per emission.
    pub fn subscribe(
        &mut self,
        mut observer: impl FnMut(&Tree) + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(&self.tree, move |tree| {
            observer(tree);
            true
        })
    }

    /// Register an inline observer that stays subscribed while it returns
    /// `true`.
    ///
    /// Like [`TreeStore::subscribe`], it is called immediately with the
    /// current tree.
    pub fn subscribe_while(
        &mut self,
        observer: impl FnMut(&Tree) -> bool + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(&self.tree, observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Open a channel receiving a snapshot now and after every emission.
    pub fn subscribe_channel(&mut self) -> Receiver<Snapshot> {
        self.observers.subscribe_channel(&self.tree)
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    // --- Initialization ---

    /// Replace the tree with one rebuilt from parent-referencing records.
    pub fn initialize(&mut self, records: &[RawRecord]) {
        self.replace(Tree::from_records(records));
    }

    /// Replace the tree with nested nodes.
    pub fn initialize_nested(&mut self, nodes: Vec<TreeNode>) {
        self.replace(Tree::from_nested(nodes));
    }

    fn replace(&mut self, tree: Tree) {
        log::debug!("initialize tree with {} node(s)", tree.len());
        self.tree = tree;
        self.emit();
    }

    // --- Inserts ---

    /// Append a new leaf as the last child of `parent`.
    pub fn insert_item(
        &mut self,
        parent: &NodeId,
        name: impl Into<String>,
        node_type: NodeType,
    ) -> Result<NodeId> {
        self.insert(parent, Placement::Inside, name.into(), node_type)
    }

    /// Insert a new leaf immediately before `node` among its siblings.
    pub fn insert_item_above(
        &mut self,
        node: &NodeId,
        name: impl Into<String>,
        node_type: NodeType,
    ) -> Result<NodeId> {
        self.insert(node, Placement::Above, name.into(), node_type)
    }

    /// Insert a new leaf immediately after `node` among its siblings.
    pub fn insert_item_below(
        &mut self,
        node: &NodeId,
        name: impl Into<String>,
        node_type: NodeType,
    ) -> Result<NodeId> {
        self.insert(node, Placement::Below, name.into(), node_type)
    }

    fn insert(
        &mut self,
        target: &NodeId,
        placement: Placement,
        name: String,
        node_type: NodeType,
    ) -> Result<NodeId> {
        let leaf = TreeNode::leaf(name, node_type);
        let id = self.place(target, placement, leaf, false)?;
        log::debug!("inserted {id} {placement:?} {target}");
        self.emit();
        Ok(id)
    }

    // --- Updates ---

    /// Rename `node` in place.
    pub fn update_item(
        &mut self,
        node: &NodeId,
        name: impl Into<String>,
    ) -> Result<()> {
        let slot = self.lookup(node)?;
        self.tree.rename(slot, name.into());
        self.emit();
        Ok(())
    }

    /// Copy name and type from an edited flat record onto its tree node.
    ///
    /// Nothing is emitted when the node no longer exists.
    pub fn update_node(&mut self, flat: &FlatNode) -> Result<()> {
        let slot = self.lookup(&flat.id)?;
        self.tree.rename(slot, flat.name.clone());
        self.tree.set_type(slot, flat.node_type);
        self.emit();
        Ok(())
    }

    // --- Delete ---

    /// Remove `node` and its whole subtree, returning what was removed.
    ///
    /// A miss still notifies subscribers unless
    /// [`TreeOptions::notify_on_miss`] is off.
    pub fn delete_item(&mut self, node: &NodeId) -> Result<TreeNode> {
        let Some(slot) = self.tree.slot_of(node) else {
            log::debug!("delete of unknown node {node}");
            if self.options.notify_on_miss {
                self.emit();
            }
            return Err(TreeError::NodeNotFound(node.clone()));
        };
        let removed = self.tree.remove(slot);
        log::debug!("deleted {node} ({} node(s))", removed.subtree_len());
        self.emit();
        Ok(removed)
    }

    // --- Copy / paste ---

    /// Deep-copy `from` as the last child of `to`.
    ///
    /// Every cloned node receives a fresh id. Returns the clone's root.
    pub fn copy_paste_item(
        &mut self,
        from: &NodeId,
        to: &NodeId,
    ) -> Result<NodeId> {
        self.copy_paste(from, to, Placement::Inside)
    }

    /// Deep-copy `from` as the sibling immediately before `to`.
    pub fn copy_paste_item_above(
        &mut self,
        from: &NodeId,
        to: &NodeId,
    ) -> Result<NodeId> {
        self.copy_paste(from, to, Placement::Above)
    }

    /// Deep-copy `from` as the sibling immediately after `to`.
    pub fn copy_paste_item_below(
        &mut self,
        from: &NodeId,
        to: &NodeId,
    ) -> Result<NodeId> {
        self.copy_paste(from, to, Placement::Below)
    }

    /// Deep-copy `from` relative to `to` according to `placement`.
    pub fn copy_paste(
        &mut self,
        from: &NodeId,
        to: &NodeId,
        placement: Placement,
    ) -> Result<NodeId> {
        let subtree = self
            .tree
            .get(from)
            .map(|node| node.to_nested())
            .ok_or_else(|| TreeError::NodeNotFound(from.clone()))?;
        let count = subtree.subtree_len();
        let id = self.place(to, placement, subtree, true)?;
        log::debug!("pasted copy of {from} as {id} ({count} node(s))");
        self.emit();
        Ok(id)
    }

    // --- Move ---

    /// Relocate `node` with its subtree relative to `target`.
    ///
    /// Ids are preserved. Moving a node onto itself or into its own subtree
    /// is rejected.
    pub fn move_item(
        &mut self,
        node: &NodeId,
        target: &NodeId,
        placement: Placement,
    ) -> Result<()> {
        let slot = self.lookup(node)?;
        let target_slot = self.lookup(target)?;
        if slot == target_slot || self.tree.is_ancestor(node, target) {
            log::warn!("rejected move of {node} into its own subtree");
            return Err(TreeError::MoveIntoDescendant {
                node: node.clone(),
                target: target.clone(),
            });
        }
        self.tree.detach(slot);
        let (parent, position) = self.tree.resolve(target_slot, placement);
        self.tree.attach(slot, parent, position);
        log::debug!("moved {node} {placement:?} {target}");
        self.emit();
        Ok(())
    }

    // --- Helpers ---

    fn lookup(&self, id: &NodeId) -> Result<usize> {
        self.tree
            .slot_of(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))
    }

    fn place(
        &mut self,
        target: &NodeId,
        placement: Placement,
        node: TreeNode,
        fresh_ids: bool,
    ) -> Result<NodeId> {
        let target = self.lookup(target)?;
        let (parent, position) = self.tree.resolve(target, placement);
        let slot = self.tree.graft(node, parent, position, fresh_ids);
        Ok(self.tree.id_at(slot).clone())
    }

    fn emit(&mut self) {
        self.revision += 1;
        self.observers.emit(&self.tree);
    }
}
