use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{NodeId, NodeType, TreeNode};
use crate::tree::Tree;

/// Flat input record referencing its parent by id.
///
/// Field names follow the upstream data feed. The older `*Guid` /
/// `NodeName` / `ServiceType` spellings are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "NodeId", alias = "NodeGuid")]
    pub node_id: NodeId,
    #[serde(rename = "ParentId", alias = "ParentGuid", default)]
    pub parent_id: Option<NodeId>,
    #[serde(rename = "Name", alias = "NodeName")]
    pub name: String,
    #[serde(rename = "Type", alias = "ServiceType")]
    pub node_type: NodeType,
}

impl RawRecord {
    pub fn new(
        node_id: impl Into<NodeId>,
        parent_id: Option<&str>,
        name: impl Into<String>,
        node_type: NodeType,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            parent_id: parent_id.map(NodeId::from),
            name: name.into(),
            node_type,
        }
    }
}

/// Parse a JSON array of flat records.
pub fn from_json(input: &str) -> Result<Vec<RawRecord>> {
    Ok(serde_json::from_str(input)?)
}

/// Parse a JSON array of nested nodes.
pub fn nested_from_json(input: &str) -> Result<Vec<TreeNode>> {
    Ok(serde_json::from_str(input)?)
}

/// Reassemble nested nodes from parent-referencing records.
///
/// Children keep the order in which their records appear. Records whose
/// parent never shows up are dropped, as are repeated ids after the first.
pub fn build_forest(records: &[RawRecord]) -> Vec<TreeNode> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut by_parent: HashMap<Option<&NodeId>, Vec<&RawRecord>> =
        HashMap::new();
    for record in records {
        if !seen.insert(&record.node_id) {
            log::warn!("dropping record with duplicate id {}", record.node_id);
            continue;
        }
        by_parent
            .entry(record.parent_id.as_ref())
            .or_default()
            .push(record);
    }

    let forest = assemble(&by_parent);
    let attached: usize = forest.iter().map(TreeNode::subtree_len).sum();
    let orphans = seen.len() - attached;
    if orphans > 0 {
        log::warn!("dropped {orphans} record(s) with no reachable parent");
    }
    forest
}

fn assemble<'r>(
    by_parent: &HashMap<Option<&'r NodeId>, Vec<&'r RawRecord>>,
) -> Vec<TreeNode> {
    // Pre-order listing of reachable records with their parent's position.
    let mut order: Vec<(&RawRecord, Option<usize>)> = Vec::new();
    let mut stack: Vec<(&RawRecord, Option<usize>)> = by_parent
        .get(&None)
        .into_iter()
        .flatten()
        .rev()
        .map(|&record| (record, None))
        .collect();
    while let Some((record, parent)) = stack.pop() {
        let position = order.len();
        order.push((record, parent));
        if let Some(children) = by_parent.get(&Some(&record.node_id)) {
            stack.extend(
                children.iter().rev().map(|&child| (child, Some(position))),
            );
        }
    }

    // Children are pushed in reverse, so each list is flipped once built.
    let mut built: Vec<Option<Vec<TreeNode>>> =
        order.iter().map(|_| None).collect();
    let mut roots = Vec::new();
    for (position, &(record, parent)) in order.iter().enumerate().rev() {
        let node = TreeNode {
            id: record.node_id.clone(),
            name: record.name.clone(),
            node_type: record.node_type,
            children: built[position].take().map(|mut children| {
                children.reverse();
                children
            }),
        };
        match parent {
            Some(parent) => {
                built[parent].get_or_insert_with(Vec::new).push(node)
            },
            None => roots.push(node),
        }
    }
    roots.reverse();
    roots
}

impl Tree {
    /// Build an arena tree from flat records.
    pub fn from_records(records: &[RawRecord]) -> Self {
        Self::from_nested(build_forest(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(|node| node.name.as_str()).collect()
    }

    #[test]
    fn given_records_when_building_then_children_follow_source_order() {
        let records = vec![
            RawRecord::new("a", None, "root", NodeType::Folder),
            RawRecord::new("c", Some("a"), "second", NodeType::Concept),
            RawRecord::new("b", Some("a"), "first", NodeType::Concept),
            RawRecord::new("d", Some("b"), "grandchild", NodeType::Function),
            RawRecord::new("e", None, "other root", NodeType::Folder),
        ];

        let forest = build_forest(&records);
        assert_eq!(names(&forest), vec!["root", "other root"]);
        let children = forest[0].children.as_ref().expect("root children");
        assert_eq!(names(children), vec!["second", "first"]);
        assert!(children[0].children.is_none());
        let grand = children[1].children.as_ref().expect("grandchildren");
        assert_eq!(names(grand), vec!["grandchild"]);
        assert!(forest[1].children.is_none());
    }

    #[test]
    fn given_orphan_and_cycle_records_when_building_then_they_are_dropped() {
        let records = vec![
            RawRecord::new("a", None, "root", NodeType::Folder),
            RawRecord::new("x", Some("missing"), "orphan", NodeType::Concept),
            RawRecord::new("p", Some("q"), "loop-p", NodeType::Concept),
            RawRecord::new("q", Some("p"), "loop-q", NodeType::Concept),
        ];

        let forest = build_forest(&records);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].subtree_len(), 1);
    }

    #[test]
    fn given_duplicate_ids_when_building_then_first_record_wins() {
        let records = vec![
            RawRecord::new("a", None, "root", NodeType::Folder),
            RawRecord::new("a", None, "shadow", NodeType::Folder),
        ];

        let forest = build_forest(&records);
        assert_eq!(names(&forest), vec!["root"]);
    }

    #[test]
    fn given_empty_records_when_building_then_tree_is_empty() {
        let tree = Tree::from_records(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn given_json_with_current_and_legacy_fields_when_parsed_then_both_load() {
        let input = serde_json::json!([
            { "NodeId": "A", "ParentId": null, "Name": "root", "Type": 10 },
            {
                "NodeGuid": "B",
                "ParentGuid": "A",
                "NodeName": "child",
                "ServiceType": 1
            },
            { "NodeId": "C", "Name": "no parent field", "Type": 3 }
        ])
        .to_string();

        let records = from_json(&input).expect("should parse");
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].parent_id, Some(NodeId::from("A")));
        assert_eq!(records[1].node_type, NodeType::Concept);
        assert!(records[2].parent_id.is_none());
    }

    #[test]
    fn given_malformed_json_when_parsed_then_json_error_is_returned() {
        let err = from_json("[{").expect_err("should fail");
        assert!(matches!(err, crate::TreeError::Json(_)));
    }
}
