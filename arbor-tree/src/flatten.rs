use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::model::{NodeId, NodeType};
use crate::store::TreeStore;
use crate::tree::Tree;

/// Stable identity of a flat record across rebuilds.
///
/// Two passes yield the same key for a node as long as it keeps its name,
/// so renderers can diff rows by key instead of by value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlatKey(u64);

/// Display projection of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatNode {
    pub key: FlatKey,
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    /// Depth from the root sequence (`0` for roots).
    pub level: usize,
    /// Whether the source node has at least one child.
    pub expandable: bool,
}

/// Pre-order flat sequence of a [`Tree`] with both identity maps.
#[derive(Debug, Default)]
pub struct FlatTree {
    nodes: Vec<FlatNode>,
    positions: HashMap<NodeId, usize>,
    keys: HashMap<FlatKey, NodeId>,
    next_key: u64,
}

impl FlatTree {
    pub fn from_tree(tree: &Tree) -> Self {
        let mut flat = Self::default();
        flat.rebuild(tree);
        flat
    }

    /// Subscribe a flat view to `store` so it rebuilds on every emission.
    ///
    /// The store only holds a weak handle: once the returned view is
    /// dropped, the subscription is removed at the next emission.
    pub fn attach(store: &mut TreeStore) -> Rc<RefCell<Self>> {
        let flat = Rc::new(RefCell::new(Self::default()));
        let sink = Rc::downgrade(&flat);
        store.subscribe_while(move |tree| {
            let Some(flat) = sink.upgrade() else {
                log::debug!("flat view dropped, unsubscribing");
                return false;
            };
            match flat.try_borrow_mut() {
                Ok(mut flat) => flat.rebuild(tree),
                Err(_) => {
                    log::warn!("flat view busy during emission, skipping")
                },
            }
            true
        });
        flat
    }

    /// Recompute the sequence and identity maps from `tree`.
    ///
    /// A node that kept its name keeps its [`FlatKey`]; level, type and
    /// expandability are refreshed. Renamed and new nodes get new keys.
    pub fn rebuild(&mut self, tree: &Tree) {
        let previous = std::mem::take(&mut self.nodes);
        let previous_positions = std::mem::take(&mut self.positions);
        self.keys.clear();

        let mut reused = 0;
        for (node, level) in tree.preorder() {
            let kept = previous_positions
                .get(node.id())
                .map(|&position| &previous[position])
                .filter(|old| old.name == node.name())
                .map(|old| old.key);
            let key = match kept {
                Some(key) => {
                    reused += 1;
                    key
                },
                None => self.allocate_key(),
            };

            self.positions.insert(node.id().clone(), self.nodes.len());
            self.keys.insert(key, node.id().clone());
            self.nodes.push(FlatNode {
                key,
                id: node.id().clone(),
                name: node.name().to_owned(),
                node_type: node.node_type(),
                level,
                expandable: node.is_expandable(),
            });
        }

        log::trace!(
            "flattened {} node(s), {reused} record(s) reused",
            self.nodes.len()
        );
    }

    pub fn nodes(&self) -> &[FlatNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Flat record currently representing `id`.
    pub fn by_node(&self, id: &NodeId) -> Option<&FlatNode> {
        self.positions.get(id).map(|&position| &self.nodes[position])
    }

    /// Tree node represented by the flat record `key`.
    pub fn node_of(&self, key: FlatKey) -> Option<&NodeId> {
        self.keys.get(&key)
    }

    pub fn get(&self, key: FlatKey) -> Option<&FlatNode> {
        self.node_of(key).and_then(|id| self.by_node(id))
    }

    pub fn position(&self, key: FlatKey) -> Option<usize> {
        self.node_of(key)
            .and_then(|id| self.positions.get(id))
            .copied()
    }

    /// Contiguous run of records below `key` in the flat order.
    pub fn descendants(&self, key: FlatKey) -> &[FlatNode] {
        let Some(position) = self.position(key) else {
            return &[];
        };
        let level = self.nodes[position].level;
        let rest = &self.nodes[position + 1..];
        let end = rest
            .iter()
            .position(|node| node.level <= level)
            .unwrap_or(rest.len());
        &rest[..end]
    }

    /// Nearest preceding record one level up.
    pub fn parent(&self, key: FlatKey) -> Option<&FlatNode> {
        let position = self.position(key)?;
        let level = self.nodes[position].level.checked_sub(1)?;
        self.nodes[..position]
            .iter()
            .rev()
            .find(|node| node.level == level)
    }

    fn allocate_key(&mut self) -> FlatKey {
        let key = FlatKey(self.next_key);
        self.next_key += 1;
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RawRecord;

    fn records() -> Vec<RawRecord> {
        vec![
            RawRecord::new("A", None, "root", NodeType::Folder),
            RawRecord::new("B", Some("A"), "child", NodeType::Concept),
            RawRecord::new("C", Some("B"), "grandchild", NodeType::Concept),
            RawRecord::new("D", Some("A"), "second", NodeType::Concept),
            RawRecord::new("E", None, "other", NodeType::Folder),
        ]
    }

    fn rows(flat: &FlatTree) -> Vec<(String, usize, bool)> {
        flat.nodes()
            .iter()
            .map(|node| (node.name.clone(), node.level, node.expandable))
            .collect()
    }

    #[test]
    fn given_records_when_flattened_then_rows_are_preorder_with_levels() {
        let flat = FlatTree::from_tree(&Tree::from_records(&records()));
        assert_eq!(
            rows(&flat),
            vec![
                (String::from("root"), 0, true),
                (String::from("child"), 1, true),
                (String::from("grandchild"), 2, false),
                (String::from("second"), 1, false),
                (String::from("other"), 0, false),
            ]
        );
    }

    #[test]
    fn given_unchanged_tree_when_rebuilt_then_output_and_keys_are_identical() {
        let tree = Tree::from_records(&records());
        let mut flat = FlatTree::from_tree(&tree);
        let first = flat.nodes().to_vec();

        flat.rebuild(&tree);
        assert_eq!(flat.nodes(), first.as_slice());
    }

    #[test]
    fn given_renamed_node_when_rebuilt_then_only_its_key_changes() {
        let mut store = TreeStore::new(&records());
        let flat = FlatTree::attach(&mut store);
        let before = flat.borrow().nodes().to_vec();

        store.update_item(&NodeId::from("B"), "renamed").expect("rename");
        let after = flat.borrow().nodes().to_vec();

        for (old, new) in before.iter().zip(&after) {
            if new.id == NodeId::from("B") {
                assert_ne!(old.key, new.key);
                assert_eq!(new.name, "renamed");
            } else {
                assert_eq!(old.key, new.key);
            }
        }
    }

    #[test]
    fn given_child_inserted_when_rebuilt_then_parent_keeps_key_and_expands() {
        let mut store = TreeStore::new(&records());
        let flat = FlatTree::attach(&mut store);
        let key = flat
            .borrow()
            .by_node(&NodeId::from("E"))
            .map(|node| node.key)
            .expect("row for E");

        store
            .insert_item(&NodeId::from("E"), "new", NodeType::Concept)
            .expect("insert");
        let flat = flat.borrow();
        let row = flat.get(key).expect("same key still mapped");
        assert_eq!(row.id, NodeId::from("E"));
        assert!(row.expandable);
        assert_eq!(flat.len(), 6);
    }

    #[test]
    fn given_deleted_node_when_rebuilt_then_maps_drop_its_entries() {
        let mut store = TreeStore::new(&records());
        let flat = FlatTree::attach(&mut store);
        let key = flat
            .borrow()
            .by_node(&NodeId::from("C"))
            .map(|node| node.key)
            .expect("row for C");

        store.delete_item(&NodeId::from("B")).expect("delete");
        let flat = flat.borrow();
        assert!(flat.node_of(key).is_none());
        assert!(flat.by_node(&NodeId::from("B")).is_none());
        assert_eq!(flat.len(), 3);
    }

    #[test]
    fn given_flat_rows_when_querying_relatives_then_levels_are_used() {
        let flat = FlatTree::from_tree(&Tree::from_records(&records()));
        let root = flat.by_node(&NodeId::from("A")).expect("root").key;
        let grandchild =
            flat.by_node(&NodeId::from("C")).expect("grandchild").key;

        let names: Vec<&str> = flat
            .descendants(root)
            .iter()
            .map(|node| node.name.as_str())
            .collect();
        assert_eq!(names, vec!["child", "grandchild", "second"]);
        assert!(flat.descendants(grandchild).is_empty());
        assert_eq!(
            flat.parent(grandchild).map(|node| node.name.as_str()),
            Some("child")
        );
        assert!(flat.parent(root).is_none());
    }

    #[test]
    fn given_dropped_views_when_store_emits_then_subscriptions_are_released() {
        let mut store = TreeStore::new(&records());
        for _ in 0..3 {
            let view = FlatTree::attach(&mut store);
            let weak = Rc::downgrade(&view);
            drop(view);
            assert!(weak.upgrade().is_none());
        }
        assert_eq!(store.subscriber_count(), 3);

        let kept = FlatTree::attach(&mut store);
        store.update_item(&NodeId::from("E"), "renamed").expect("rename");
        assert_eq!(store.subscriber_count(), 1);
        assert_eq!(
            kept.borrow()
                .by_node(&NodeId::from("E"))
                .map(|node| node.name.clone()),
            Some(String::from("renamed"))
        );

        drop(kept);
        store.update_item(&NodeId::from("E"), "again").expect("rename");
        assert_eq!(store.subscriber_count(), 0);
    }
}
