use std::collections::HashSet;

use arbor_tree::{FlatKey, FlatTree};

/// Multi-selection over flat rows where selecting a row selects its
/// descendants too.
#[derive(Debug, Clone, Default)]
pub struct ChecklistSelection {
    selected: HashSet<FlatKey>,
}

impl ChecklistSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, key: FlatKey) -> bool {
        self.selected.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Flip `key` and apply the new state to all of its descendants.
    pub fn toggle(&mut self, flat: &FlatTree, key: FlatKey) {
        let select = !self.selected.remove(&key);
        if select {
            self.selected.insert(key);
        }
        for row in flat.descendants(key) {
            if select {
                self.selected.insert(row.key);
            } else {
                self.selected.remove(&row.key);
            }
        }
    }

    /// Whether every descendant of `key` is selected.
    ///
    /// Vacuously true for rows without descendants.
    pub fn descendants_all_selected(
        &self,
        flat: &FlatTree,
        key: FlatKey,
    ) -> bool {
        flat.descendants(key)
            .iter()
            .all(|row| self.is_selected(row.key))
    }

    /// Whether some, but not all, descendants of `key` are selected.
    pub fn descendants_partially_selected(
        &self,
        flat: &FlatTree,
        key: FlatKey,
    ) -> bool {
        let any = flat
            .descendants(key)
            .iter()
            .any(|row| self.is_selected(row.key));
        any && !self.descendants_all_selected(flat, key)
    }

    /// Drop keys that are no longer part of `flat`.
    pub fn retain_existing(&mut self, flat: &FlatTree) {
        self.selected.retain(|key| flat.get(*key).is_some());
    }
}

#[cfg(test)]
mod tests {
    use arbor_tree::{NodeId, NodeType, RawRecord, Tree};

    use super::*;

    fn flat() -> FlatTree {
        FlatTree::from_tree(&Tree::from_records(&[
            RawRecord::new("A", None, "root", NodeType::Folder),
            RawRecord::new("B", Some("A"), "one", NodeType::Concept),
            RawRecord::new("C", Some("A"), "two", NodeType::Concept),
            RawRecord::new("D", None, "other", NodeType::Folder),
        ]))
    }

    fn key(flat: &FlatTree, id: &str) -> FlatKey {
        flat.by_node(&NodeId::from(id)).expect("row").key
    }

    #[test]
    fn given_parent_when_toggled_then_descendants_follow() {
        let flat = flat();
        let mut selection = ChecklistSelection::new();
        selection.toggle(&flat, key(&flat, "A"));
        assert_eq!(selection.len(), 3);
        assert!(selection.descendants_all_selected(&flat, key(&flat, "A")));
        assert!(!selection.is_selected(key(&flat, "D")));

        selection.toggle(&flat, key(&flat, "A"));
        assert!(selection.is_empty());
    }

    #[test]
    fn given_one_child_selected_when_checking_parent_then_it_is_partial() {
        let flat = flat();
        let mut selection = ChecklistSelection::new();
        selection.toggle(&flat, key(&flat, "B"));
        assert!(
            selection.descendants_partially_selected(&flat, key(&flat, "A"))
        );
        assert!(!selection.descendants_all_selected(&flat, key(&flat, "A")));

        selection.toggle(&flat, key(&flat, "C"));
        assert!(
            !selection.descendants_partially_selected(&flat, key(&flat, "A"))
        );
        assert!(selection.descendants_all_selected(&flat, key(&flat, "A")));
    }

    #[test]
    fn given_stale_keys_when_retaining_then_they_are_dropped() {
        let flat = flat();
        let mut selection = ChecklistSelection::new();
        selection.toggle(&flat, key(&flat, "D"));
        let empty = FlatTree::default();
        selection.retain_existing(&empty);
        assert!(selection.is_empty());
    }
}
