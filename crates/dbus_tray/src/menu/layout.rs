use std::collections::HashMap;

use serde::Serialize;
use zbus::zvariant::{Structure, Type, Value};

use super::{properties, MenuTree, Properties};

/// A serialized subtree, as returned by `GetLayout`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutNode {
    pub id: i32,
    pub properties: Properties,
    pub children: Vec<LayoutNode>,
}

/// Wire form of a [`LayoutNode`], signature `(ia{sv}av)`.
///
/// The children are variants wrapping the same structure, since D-Bus has no recursive types.
#[derive(Debug, PartialEq, Serialize, Type)]
pub struct WireLayout {
    pub id: i32,
    pub properties: HashMap<String, Value<'static>>,
    pub children: Vec<Value<'static>>,
}

impl LayoutNode {
    /// Count of nodes below this one.
    pub fn descendants(&self) -> usize {
        self.children.iter().map(|c| 1 + c.descendants()).sum()
    }

    /// Number of levels below this node; 0 for a node without children.
    pub fn depth(&self) -> usize {
        self.children.iter().map(|c| 1 + c.depth()).max().unwrap_or(0)
    }

    pub fn into_wire(self) -> WireLayout {
        WireLayout {
            id: self.id,
            properties: self.properties.into_wire(),
            children: self.children.into_iter().map(LayoutNode::into_variant).collect(),
        }
    }

    fn into_variant(self) -> Value<'static> {
        let WireLayout { id, properties, children } = self.into_wire();
        Value::from(Structure::from((id, properties, children)))
    }
}

/// Serialize the subtree rooted at `id`.
///
/// `depth` is the number of levels of children to include: 0 includes none, a negative value
/// includes all of them. An unknown `id` yields an empty node with id 0 rather than an error, so
/// `GetLayout` always has something to answer with.
pub fn build_layout<S: AsRef<str>>(tree: &MenuTree, id: i32, depth: i32, filter: &[S]) -> LayoutNode {
    let Some(entry) = tree.lookup(id) else {
        return LayoutNode::default();
    };

    let children = if depth == 0 {
        Vec::new()
    } else {
        let child_depth = if depth > 0 { depth - 1 } else { depth };
        entry.children.iter().map(|child| build_layout(tree, *child, child_depth, filter)).collect()
    };

    LayoutNode { id: entry.id, properties: properties(entry, filter), children }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::menu::{PropValue, ROOT_ID};
    use pretty_assertions::assert_eq;

    const ALL: &[&str] = &[];

    /// root -> [a -> [a1 -> [a1x], a2], sep, b]
    fn sample() -> MenuTree {
        let mut tree = MenuTree::new();
        let (a, _) = tree.add_item("A", false, false, ROOT_ID);
        let (a1, _) = tree.add_item("A1", false, false, a);
        tree.add_item("A1x", true, false, a1);
        tree.add_item("A2", false, false, a);
        tree.add_separator(ROOT_ID);
        tree.add_item("B", false, false, ROOT_ID);
        tree
    }

    #[test]
    fn test_depth_zero_has_no_children() {
        let tree = sample();
        for id in [ROOT_ID, 1, 2, 3, 4, 5, 6] {
            let node = build_layout(&tree, id, 0, ALL);
            assert_eq!(node.id, id);
            assert!(node.children.is_empty());
            assert!(!node.properties.is_empty());
        }
    }

    #[test]
    fn test_negative_depth_is_unlimited() {
        let tree = sample();
        let node = build_layout(&tree, ROOT_ID, -1, ALL);
        assert_eq!(node.descendants(), 6);
        assert_eq!(node.depth(), 3);
        assert_eq!(node.children.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 5, 6]);
        assert_eq!(node.children[0].children.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(node.children[0].children[0].children[0].id, 3);
    }

    #[test]
    fn test_positive_depth_is_exact() {
        let tree = sample();
        assert_eq!(build_layout(&tree, ROOT_ID, 1, ALL).depth(), 1);
        assert_eq!(build_layout(&tree, ROOT_ID, 1, ALL).descendants(), 3);
        assert_eq!(build_layout(&tree, ROOT_ID, 2, ALL).depth(), 2);
        assert_eq!(build_layout(&tree, ROOT_ID, 2, ALL).descendants(), 5);
        assert_eq!(build_layout(&tree, ROOT_ID, 3, ALL).depth(), 3);
        assert_eq!(build_layout(&tree, ROOT_ID, 10, ALL).descendants(), 6);
        assert_eq!(build_layout(&tree, 1, 1, ALL).descendants(), 2);
    }

    #[test]
    fn test_unknown_id_is_degenerate() {
        let tree = sample();
        let node = build_layout(&tree, 999, -1, ALL);
        assert_eq!(node, LayoutNode { id: 0, properties: Properties::default(), children: vec![] });
    }

    #[test]
    fn test_filter_applies_to_every_node() {
        let tree = sample();
        let node = build_layout(&tree, ROOT_ID, -1, &["label"]);
        let sep = &node.children[1];
        assert!(sep.properties.is_empty());
        assert_eq!(node.children[2].properties.get("label"), Some(&PropValue::Str("B".into())));
        assert_eq!(node.children[2].properties.len(), 1);
    }

    #[test]
    fn test_wire_children_are_variants() {
        let tree = sample();
        let wire = build_layout(&tree, ROOT_ID, -1, ALL).into_wire();
        assert_eq!(wire.id, ROOT_ID);
        assert_eq!(wire.children.len(), 3);
        assert!(matches!(&wire.children[0], Value::Structure(_)));
        assert_eq!(WireLayout::signature().as_str(), "(ia{sv}av)");
    }
}
