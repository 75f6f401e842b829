//! Immutable, shareable tree structure.
//!
//! A [`Blueprint`] is the flattened form of a [`NodeSpec`] tree: every node is
//! stored once in an arena and children are referenced by [`NodeId`]. Many
//! agents can share one blueprint behind an `Arc`, each owning its own
//! [`BehaviorTree`] instance with private cursors and strategy state.

use std::fmt;
use std::sync::Arc;

use crate::node::{Kind, NodeKind, NodeSpec};
use crate::{BehaviorTree, NodeId};

/// One compiled node.
pub struct NodeDef<C> {
    pub name: String,
    pub priority: i32,
    pub kind: Kind<C>,
    pub children: Vec<NodeId>,
}

impl<C> fmt::Debug for NodeDef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDef")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("kind", &self.kind)
            .field("children", &self.children)
            .finish()
    }
}

/// Frozen tree structure plus the factories and hooks its nodes need.
pub struct Blueprint<C> {
    name: String,
    nodes: Vec<NodeDef<C>>,
    root: Option<NodeId>,
}

impl<C> Blueprint<C> {
    /// Compiles a tree whose root driver owns `root` as its single child.
    pub fn new(name: impl Into<String>, root: NodeSpec<C>) -> Self {
        let mut nodes = Vec::new();
        let root = compile(&mut nodes, root);
        let blueprint = Self {
            name: name.into(),
            nodes,
            root: Some(root),
        };
        blueprint.warn_on_misuse();
        blueprint
    }

    /// A tree with no child. Ticking it always fails.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Creates a tree instance with a seeded random source.
    pub fn instantiate(self: &Arc<Self>, seed: u64) -> BehaviorTree<C> {
        BehaviorTree::with_seed(Arc::clone(self), seed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The single child of the root driver, if any.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Looks up a compiled node.
    ///
    /// Ids are only ever produced by this blueprint, so lookups stay in
    /// bounds for ids obtained from it.
    #[inline]
    pub fn node(&self, id: NodeId) -> &NodeDef<C> {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeDef<C>> {
        self.nodes.get(id.index())
    }

    /// First node with the given name, in depth-first order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(|index| NodeId(index as u32))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeDef<C>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index as u32), node))
    }

    /// Structural problems are tolerated at tick time (the node fails), but
    /// they almost always indicate a construction bug, so log them once here.
    fn warn_on_misuse(&self) {
        for (id, node) in self.iter() {
            let tag = node.kind.tag();
            if tag.is_decorator() && node.children.len() != 1 {
                tracing::warn!(
                    "{}: {} '{}' ({}) has {} children, expected exactly one",
                    self.name,
                    tag,
                    node.name,
                    id,
                    node.children.len()
                );
            }
            if tag == NodeKind::Leaf && !node.children.is_empty() {
                tracing::warn!(
                    "{}: leaf '{}' ({}) has children that will never be processed",
                    self.name,
                    node.name,
                    id
                );
            }
        }
    }
}

impl<C> fmt::Debug for Blueprint<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("nodes", &self.nodes)
            .finish()
    }
}

/// Flattens `spec` depth-first; a parent always precedes its children.
fn compile<C>(nodes: &mut Vec<NodeDef<C>>, spec: NodeSpec<C>) -> NodeId {
    let id = NodeId(nodes.len() as u32);
    let NodeSpec {
        name,
        priority,
        kind,
        children,
    } = spec;

    nodes.push(NodeDef {
        name,
        priority,
        kind,
        children: Vec::new(),
    });

    let child_ids: Vec<NodeId> = children
        .into_iter()
        .map(|child| compile(nodes, child))
        .collect();
    nodes[id.index()].children = child_ids;

    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{condition, invertor, priority_selector, sequence};

    #[test]
    fn compile_is_depth_first() {
        let spec = priority_selector(
            "Main",
            vec![
                sequence(
                    "Attack",
                    vec![condition("InRange", |_: &()| true), condition("Ready", |_: &()| true)],
                )
                .with_priority(5),
                invertor("NotTired", condition("Tired", |_: &()| false)).with_priority(1),
            ],
        );
        let blueprint = Blueprint::new("Boss", spec);

        let names: Vec<&str> = blueprint.iter().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(
            names,
            ["Main", "Attack", "InRange", "Ready", "NotTired", "Tired"]
        );

        let main = blueprint.node(blueprint.root().unwrap());
        assert_eq!(main.children, vec![NodeId(1), NodeId(4)]);
        assert_eq!(blueprint.node(NodeId(1)).priority, 5);
        assert_eq!(blueprint.find("Tired"), Some(NodeId(5)));
        assert_eq!(blueprint.find("Missing"), None);
    }

    #[test]
    fn empty_blueprint_has_no_root() {
        let blueprint = Blueprint::<()>::empty("Nothing");
        assert!(blueprint.root().is_none());
        assert!(blueprint.is_empty());
    }
}
