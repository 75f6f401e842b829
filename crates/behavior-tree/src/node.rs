//! Static node definitions.
//!
//! A tree is described once as nested [`NodeSpec`]s, then compiled into an
//! immutable [`crate::Blueprint`]. Nothing in this module changes while a tree
//! is being ticked: cursors, pins and strategy state live in the per-agent
//! [`crate::BehaviorTree`] instance.

use std::fmt;

use crate::Strategy;

/// Index of a node inside a [`crate::Blueprint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Creates a fresh strategy for every tree instance built from a blueprint.
pub type StrategyFactory<C> = Box<dyn Fn() -> Box<dyn Strategy<C>> + Send + Sync>;

/// Side effect fired by a [`Kind::GuardedSequence`] hook.
pub type Hook<C> = Box<dyn Fn(&mut C) + Send + Sync>;

/// Start/end hooks of a guarded sequence.
pub struct GuardHooks<C> {
    /// Fired once when an activation commits (first `Running` child).
    pub on_start: Hook<C>,
    /// Fired once when a started activation ends, however it ends.
    pub on_complete: Hook<C>,
}

/// The closed set of node behaviors.
pub enum Kind<C> {
    /// Plain node: forwards to its cursor-selected child.
    Node,
    /// Wraps one strategy.
    Leaf(StrategyFactory<C>),
    /// AND gate, left to right, one child per tick.
    Sequence,
    /// OR gate, left to right, pins a running child.
    Selector,
    /// OR gate over children sorted by descending priority.
    PrioritySelector,
    /// Runs one randomly chosen child per activation.
    RandomSelector,
    /// Sequence with exactly-once start/complete hooks.
    GuardedSequence(GuardHooks<C>),
    /// Swaps Success and Failure of its child.
    Invertor,
    /// Keeps running its child until the child fails.
    UntilFail,
}

impl<C> Kind<C> {
    /// Fieldless tag used for logging and introspection.
    pub fn tag(&self) -> NodeKind {
        match self {
            Kind::Node => NodeKind::Node,
            Kind::Leaf(_) => NodeKind::Leaf,
            Kind::Sequence => NodeKind::Sequence,
            Kind::Selector => NodeKind::Selector,
            Kind::PrioritySelector => NodeKind::PrioritySelector,
            Kind::RandomSelector => NodeKind::RandomSelector,
            Kind::GuardedSequence(_) => NodeKind::GuardedSequence,
            Kind::Invertor => NodeKind::Invertor,
            Kind::UntilFail => NodeKind::UntilFail,
        }
    }
}

impl<C> fmt::Debug for Kind<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Tag of a [`Kind`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Node,
    Leaf,
    Sequence,
    Selector,
    PrioritySelector,
    RandomSelector,
    GuardedSequence,
    Invertor,
    UntilFail,
}

impl NodeKind {
    /// Decorators consider only their first child.
    pub fn is_decorator(self) -> bool {
        matches!(self, NodeKind::Invertor | NodeKind::UntilFail)
    }
}

/// Build-time description of a node and its subtree.
///
/// Children are appended with [`NodeSpec::add_child`] / [`NodeSpec::with_child`]
/// before the spec is compiled. Once compiled into a blueprint the structure
/// is frozen.
pub struct NodeSpec<C> {
    pub(crate) name: String,
    pub(crate) priority: i32,
    pub(crate) kind: Kind<C>,
    pub(crate) children: Vec<NodeSpec<C>>,
}

impl<C> NodeSpec<C> {
    /// Creates a node without children and with priority 0.
    pub fn new(name: impl Into<String>, kind: Kind<C>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            kind,
            children: Vec::new(),
        }
    }

    /// Sets the priority read by a parent priority selector.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Appends a child.
    pub fn add_child(&mut self, child: NodeSpec<C>) {
        self.children.push(child);
    }

    /// Appends a child (builder pattern).
    pub fn with_child(mut self, child: NodeSpec<C>) -> Self {
        self.add_child(child);
        self
    }

    /// Appends several children (builder pattern).
    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeSpec<C>>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn kind(&self) -> NodeKind {
        self.kind.tag()
    }

    pub fn children(&self) -> &[NodeSpec<C>] {
        &self.children
    }
}

impl<C> fmt::Debug for NodeSpec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("kind", &self.kind)
            .field("children", &self.children)
            .finish()
    }
}
