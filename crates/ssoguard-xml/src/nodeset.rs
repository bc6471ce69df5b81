#![forbid(unsafe_code)]

//! NodeSet type for XML canonicalization and transforms.
//!
//! A `NodeSet` is the document subset a reference selects: the whole
//! document or the subtree of one element, minus anything removed by later
//! transforms (the enveloped signature).  Node identities are roxmltree
//! `NodeId`s, which are stable across re-parses of the same text.

use roxmltree::{Node, NodeId};
use std::collections::HashSet;

/// A set of XML document nodes identified by `NodeId`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    nodes: HashSet<NodeId>,
}

impl NodeSet {
    /// Every node of the document, comments included.
    pub fn all(doc: &roxmltree::Document<'_>) -> Self {
        Self::tree(doc.root())
    }

    /// Every node of the document except comments.
    pub fn all_without_comments(doc: &roxmltree::Document<'_>) -> Self {
        Self::tree_without_comments(doc.root())
    }

    /// `root` and all of its descendants.
    pub fn tree(root: Node<'_, '_>) -> Self {
        Self {
            nodes: root.descendants().map(|n| n.id()).collect(),
        }
    }

    /// `root` and all of its descendants except comments.
    pub fn tree_without_comments(root: Node<'_, '_>) -> Self {
        Self {
            nodes: root
                .descendants()
                .filter(|n| !n.is_comment())
                .map(|n| n.id())
                .collect(),
        }
    }

    pub fn contains(&self, node: &Node<'_, '_>) -> bool {
        self.nodes.contains(&node.id())
    }

    /// Remove `root` and all of its descendants.
    pub fn remove_subtree(&mut self, root: Node<'_, '_>) {
        for node in root.descendants() {
            self.nodes.remove(&node.id());
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_without_comments() {
        let doc = crate::parse("<r><!--c--><a>t</a></r>").unwrap();
        let set = NodeSet::tree_without_comments(doc.root_element());
        // r, a, text
        assert_eq!(set.len(), 3);
        assert!(set.contains(&doc.root_element()));
        assert_eq!(NodeSet::tree(doc.root_element()).len(), 4);
    }

    #[test]
    fn test_remove_subtree() {
        let doc = crate::parse("<r><sig><v>x</v></sig><a/></r>").unwrap();
        let mut set = NodeSet::all(&doc);
        let sig = doc.root_element().first_element_child().unwrap();
        set.remove_subtree(sig);
        assert!(!set.contains(&sig));
        assert!(set.contains(&doc.root_element()));
        // document root, r, a
        assert_eq!(set.len(), 3);
    }
}
