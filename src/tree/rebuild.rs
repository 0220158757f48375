//! Rebuilds a source tenant's flat parent-pointer node list into a form
//! that can be replayed against a destination tenant under fresh ids.
//!
//! Sources return trees as a flat list where every non-root node carries a
//! `parent.id` back-reference. Destinations create nodes either one at a time
//! (`position.parentId`) or as a single nested child-list call. The rebuild
//! step adapts one representation into the other while remapping every id.

use std::collections::{HashMap, HashSet};

use crate::api::models::{Node, NodeField, TreeNode};
use super::id::IdGenerator;

/// One rebuilt node: fresh destination id, remapped parent, original payload.
#[derive(Debug, Clone)]
pub struct RebuiltNode {
    pub id: String,
    /// Remapped to the parent's fresh id; `None` for the root.
    pub parent_id: Option<String>,
    pub source_id: String,
    pub r#ref: String,
    pub alias: String,
    pub r#type: String,
    pub fields: Vec<NodeField>,
}

/// Parent-ordered rebuild of a source tree: every node precedes its children,
/// so a sequential replay can always resolve `parent_id`.
#[derive(Debug, Clone)]
pub struct RebuiltTree {
    pub root_id: String,
    pub source_root_id: String,
    pub nodes: Vec<RebuiltNode>,
}

impl RebuiltTree {
    /// Total remote operations a per-node replay will issue: one creation per
    /// node plus one resolver attachment per field.
    pub fn total_operations(&self) -> usize {
        self.nodes.len() + self.nodes.iter().map(|n| n.fields.len()).sum::<usize>()
    }

    /// Convert to the nested child-list wire form. Nodes without fields get
    /// the synthetic `meta` placeholder; the nested creation call rejects an
    /// empty field list.
    pub fn to_nested(&self) -> TreeNode {
        let mut children_of: HashMap<&str, Vec<&RebuiltNode>> = HashMap::new();
        for node in &self.nodes {
            if let Some(parent_id) = &node.parent_id {
                children_of.entry(parent_id.as_str()).or_default().push(node);
            }
        }
        build_nested(&self.nodes[0], &children_of)
    }
}

fn build_nested(node: &RebuiltNode, children_of: &HashMap<&str, Vec<&RebuiltNode>>) -> TreeNode {
    let fields = if node.fields.is_empty() {
        vec![NodeField::placeholder()]
    } else {
        node.fields.clone()
    };

    TreeNode {
        id: node.id.clone(),
        r#ref: node.r#ref.clone(),
        alias: node.alias.clone(),
        r#type: node.r#type.clone(),
        fields,
        children: children_of
            .get(node.id.as_str())
            .map(|kids| kids.iter().map(|k| build_nested(k, children_of)).collect())
            .unwrap_or_default(),
    }
}

/// Rebuild a flat node list under fresh destination ids.
///
/// Root selection uses the parentless node when one exists and falls back to
/// the first list element (subtree exports keep the root's pointer to a node
/// outside the list). Returns `None` for an empty list: no tree to copy.
///
/// Nodes whose parent chain never reaches the root are dropped from the
/// result; they never appear as anyone's child.
pub fn rebuild(flat: &[Node], ids: &mut dyn IdGenerator) -> Option<RebuiltTree> {
    let root = flat.iter().find(|n| n.parent.is_none()).or_else(|| flat.first())?;

    let mut nodes = Vec::with_capacity(flat.len());
    let mut visited: HashSet<&str> = HashSet::new();
    let mut id_map: HashMap<&str, String> = HashMap::new();

    // Pre-order walk: assign the fresh id the moment a node is first visited,
    // so the parent's entry is always in the map before its children look it up.
    let mut stack: Vec<&Node> = vec![root];
    while let Some(node) = stack.pop() {
        if !visited.insert(node.id.as_str()) {
            continue;
        }

        let id = ids.generate();
        id_map.insert(node.id.as_str(), id.clone());

        let parent_id = node
            .parent
            .as_ref()
            .and_then(|p| id_map.get(p.id.as_str()).cloned());

        nodes.push(RebuiltNode {
            id,
            parent_id,
            source_id: node.id.clone(),
            r#ref: node.r#ref.clone(),
            alias: node.alias.clone(),
            r#type: node.r#type.clone(),
            fields: node.fields.clone(),
        });

        // Children in reverse so the stack pops them in list order.
        for child in flat
            .iter()
            .filter(|c| c.parent.as_ref().is_some_and(|p| p.id == node.id))
            .rev()
        {
            stack.push(child);
        }
    }

    Some(RebuiltTree {
        root_id: nodes[0].id.clone(),
        source_root_id: root.id.clone(),
        nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{FieldResolver, NodeParent, ResolverLanguage};
    use crate::tree::id::{HexIds, SequenceIds};
    use std::collections::HashSet;

    fn node(id: &str, parent: Option<&str>) -> Node {
        Node {
            id: id.to_string(),
            r#ref: format!("{}-ref", id),
            alias: format!("{}-alias", id),
            r#type: "section".to_string(),
            parent: parent.map(|p| NodeParent {
                id: p.to_string(),
                r#ref: None,
            }),
            fields: Vec::new(),
        }
    }

    fn node_with_field(id: &str, parent: Option<&str>) -> Node {
        let mut n = node(id, parent);
        n.fields.push(NodeField {
            r#ref: "f1".to_string(),
            alias: "F".to_string(),
            r#type: "String".to_string(),
            resolver: Some(FieldResolver {
                text: "hi".to_string(),
                language: ResolverLanguage::Constant,
            }),
        });
        n
    }

    #[test]
    fn empty_list_means_no_tree_to_copy() {
        assert!(rebuild(&[], &mut SequenceIds::default()).is_none());
    }

    #[test]
    fn single_parentless_node_becomes_the_root() {
        let tree = rebuild(&[node("a", None)], &mut SequenceIds::default()).unwrap();
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.root_id, "n1");
        assert_eq!(tree.source_root_id, "a");
        assert!(tree.nodes[0].parent_id.is_none());
    }

    #[test]
    fn parentless_rule_wins_over_list_position() {
        // The root is not the first element; the parentless rule still finds it.
        let flat = vec![node("child", Some("root")), node("root", None)];
        let tree = rebuild(&flat, &mut SequenceIds::default()).unwrap();
        assert_eq!(tree.source_root_id, "root");
        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(tree.nodes[1].source_id, "child");
        assert_eq!(tree.nodes[1].parent_id.as_deref(), Some(tree.nodes[0].id.as_str()));
    }

    #[test]
    fn falls_back_to_first_element_when_every_node_has_a_parent() {
        // Subtree export: the root still points at a node outside the list.
        let flat = vec![node("sub", Some("outside")), node("leaf", Some("sub"))];
        let tree = rebuild(&flat, &mut SequenceIds::default()).unwrap();
        assert_eq!(tree.source_root_id, "sub");
        // The external parent reference cannot be remapped and is dropped.
        assert!(tree.nodes[0].parent_id.is_none());
    }

    #[test]
    fn every_source_id_maps_to_exactly_one_fresh_id() {
        let flat = vec![
            node("r", None),
            node("a", Some("r")),
            node("b", Some("r")),
            node("c", Some("a")),
        ];
        let tree = rebuild(&flat, &mut SequenceIds::default()).unwrap();

        let fresh: HashSet<&str> = tree.nodes.iter().map(|n| n.id.as_str()).collect();
        let source: HashSet<&str> = flat.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(fresh.len(), flat.len());
        assert!(fresh.is_disjoint(&source));

        // Each parent_id refers to the fresh id of the right parent.
        let by_source: std::collections::HashMap<&str, &RebuiltNode> =
            tree.nodes.iter().map(|n| (n.source_id.as_str(), n)).collect();
        assert_eq!(
            by_source["c"].parent_id.as_deref(),
            Some(by_source["a"].id.as_str())
        );
    }

    #[test]
    fn orphaned_nodes_are_silently_dropped() {
        // `stray` points at an id not present in the list: it never becomes
        // anyone's child. Accepted copy behavior, not a defect.
        let flat = vec![
            node("r", None),
            node("a", Some("r")),
            node("stray", Some("missing")),
        ];
        let tree = rebuild(&flat, &mut SequenceIds::default()).unwrap();
        assert_eq!(tree.nodes.len(), 2);
        assert!(tree.nodes.iter().all(|n| n.source_id != "stray"));
    }

    #[test]
    fn structure_is_deterministic_while_ids_are_not() {
        let flat = vec![
            node("r", None),
            node("a", Some("r")),
            node("b", Some("a")),
        ];
        let first = rebuild(&flat, &mut HexIds).unwrap();
        let second = rebuild(&flat, &mut HexIds).unwrap();

        let shape = |t: &RebuiltTree| -> Vec<(String, bool)> {
            t.nodes
                .iter()
                .map(|n| (n.source_id.clone(), n.parent_id.is_some()))
                .collect()
        };
        assert_eq!(shape(&first), shape(&second));
        assert_ne!(first.root_id, second.root_id);
    }

    #[test]
    fn nested_form_preserves_structure_and_injects_placeholder_fields() {
        let flat = vec![
            node("r", None),
            node_with_field("a", Some("r")),
            node("b", Some("r")),
        ];
        let tree = rebuild(&flat, &mut SequenceIds::default()).unwrap();
        let nested = tree.to_nested();

        assert_eq!(nested.count(), 3);
        assert_eq!(nested.children.len(), 2);
        // Fieldless nodes get the synthetic meta field on the nested wire form.
        assert_eq!(nested.fields, vec![NodeField::placeholder()]);
        let a = &nested.children[0];
        assert_eq!(a.r#ref, "a-ref");
        assert_eq!(a.fields.len(), 1);
        assert_eq!(a.fields[0].r#ref, "f1");
    }

    #[test]
    fn children_keep_list_order() {
        let flat = vec![
            node("r", None),
            node("z", Some("r")),
            node("a", Some("r")),
            node("m", Some("r")),
        ];
        let tree = rebuild(&flat, &mut SequenceIds::default()).unwrap();
        let order: Vec<&str> = tree.nodes.iter().map(|n| n.source_id.as_str()).collect();
        assert_eq!(order, vec!["r", "z", "a", "m"]);
    }

    #[test]
    fn total_operations_counts_nodes_and_fields() {
        let flat = vec![
            node("r", None),
            node_with_field("a", Some("r")),
            node_with_field("b", Some("r")),
        ];
        let tree = rebuild(&flat, &mut SequenceIds::default()).unwrap();
        assert_eq!(tree.total_operations(), 5);
    }
}
