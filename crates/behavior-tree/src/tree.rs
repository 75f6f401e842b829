//! Per-agent tree instances and the tick dispatcher.
//!
//! [`BehaviorTree`] is the root driver: it owns the mutable state of every
//! node of one [`Blueprint`] and processes the root's single child once per
//! [`BehaviorTree::tick`]. The tree itself never terminates, so `tick` always
//! reports `Running` unless there is nothing to run at all.

use std::fmt;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::blueprint::Blueprint;
use crate::node::{Kind, NodeKind};
use crate::{NodeId, Status, Strategy};

/// Why a cached child order was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Invalidation {
    /// The selector was reset.
    Reset,
    /// A child ran to success.
    Succeeded,
    /// The activation failed.
    Failed,
}

/// Cached child order of a priority or random selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrderCache {
    /// Never computed.
    #[default]
    Uncomputed,
    /// Valid for the current activation.
    Cached(Vec<NodeId>),
    /// Must be recomputed on the next tick.
    StaleAfter(Invalidation),
}

impl OrderCache {
    pub fn cached(&self) -> Option<&[NodeId]> {
        match self {
            OrderCache::Cached(order) => Some(order),
            _ => None,
        }
    }
}

/// Flags backing the exactly-once hooks of a guarded sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct GuardFlags {
    pub(crate) has_started: bool,
    pub(crate) cleanup_ran: bool,
}

/// Mutable state of one node in one tree instance.
pub(crate) struct NodeState<C> {
    /// Next child to process (sequences, selectors, plain nodes).
    pub(crate) current: usize,
    /// Pinned running child: a child index for selectors, a position in the
    /// cached order for priority/random selectors.
    pub(crate) running: Option<usize>,
    pub(crate) order: OrderCache,
    pub(crate) guard: GuardFlags,
    pub(crate) strategy: Option<Box<dyn Strategy<C>>>,
}

impl<C> NodeState<C> {
    fn new(strategy: Option<Box<dyn Strategy<C>>>) -> Self {
        Self {
            current: 0,
            running: None,
            order: OrderCache::Uncomputed,
            guard: GuardFlags::default(),
            strategy,
        }
    }
}

/// A tree instance owned by exactly one agent.
pub struct BehaviorTree<C> {
    blueprint: Arc<Blueprint<C>>,
    states: Vec<NodeState<C>>,
    rng: ChaCha8Rng,
    ticks: u64,
    last: Option<Status>,
}

impl<C> BehaviorTree<C> {
    /// Creates an instance whose random selectors are seeded from entropy.
    pub fn new(blueprint: Arc<Blueprint<C>>) -> Self {
        Self::from_rng(blueprint, ChaCha8Rng::from_entropy())
    }

    /// Creates an instance with a reproducible random source.
    pub fn with_seed(blueprint: Arc<Blueprint<C>>, seed: u64) -> Self {
        Self::from_rng(blueprint, ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(blueprint: Arc<Blueprint<C>>, rng: ChaCha8Rng) -> Self {
        let states = blueprint
            .iter()
            .map(|(_, node)| match &node.kind {
                Kind::Leaf(factory) => NodeState::new(Some(factory())),
                _ => NodeState::new(None),
            })
            .collect();

        Self {
            blueprint,
            states,
            rng,
            ticks: 0,
            last: None,
        }
    }

    /// Processes the root's child once.
    ///
    /// # Returns
    ///
    /// - `Status::Running` whenever there is a child, whatever it returned
    /// - `Status::Failure` if the blueprint has no child to run
    pub fn tick(&mut self, ctx: &mut C) -> Status {
        let Some(root) = self.blueprint.root() else {
            tracing::debug!("{}: ticked a tree without a child", self.blueprint.name());
            return Status::Failure;
        };

        self.ticks += 1;
        let status = self.ticker().process(root, ctx);
        self.last = Some(status);
        tracing::trace!(
            "{} tick {} finished with root child {}",
            self.blueprint.name(),
            self.ticks,
            status
        );

        Status::Running
    }

    /// Forces every node back to its initial state.
    ///
    /// Pending guarded-sequence completions fire synchronously, innermost
    /// first.
    pub fn reset(&mut self, ctx: &mut C) {
        if let Some(root) = self.blueprint.root() {
            tracing::debug!("{}: resetting tree", self.blueprint.name());
            self.ticker().reset(root, ctx);
        }
        self.last = None;
    }

    pub fn name(&self) -> &str {
        self.blueprint.name()
    }

    pub fn blueprint(&self) -> &Arc<Blueprint<C>> {
        &self.blueprint
    }

    /// Number of ticks processed since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// What the root's child reported on the most recent tick.
    pub fn last_status(&self) -> Option<Status> {
        self.last
    }

    /// Cached child order of a node; `None` for unknown ids.
    pub fn order_cache(&self, id: NodeId) -> Option<&OrderCache> {
        self.states.get(id.index()).map(|state| &state.order)
    }

    /// Cursor of a node; `None` for unknown ids.
    pub fn cursor(&self, id: NodeId) -> Option<usize> {
        self.states.get(id.index()).map(|state| state.current)
    }

    /// Names along the path that the next tick will resume.
    ///
    /// Starts at the root's child and follows pins and cursors down until a
    /// leaf, or a node with nothing in progress, is reached.
    pub fn active_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut next = self.blueprint.root();

        while let Some(id) = next {
            let node = self.blueprint.node(id);
            let state = &self.states[id.index()];
            path.push(node.name.as_str());

            let slot = match node.kind.tag() {
                NodeKind::Leaf => None,
                NodeKind::Invertor | NodeKind::UntilFail => Some(0),
                NodeKind::Selector => state.running.or(Some(state.current)),
                NodeKind::PrioritySelector | NodeKind::RandomSelector => {
                    next = state
                        .running
                        .zip(state.order.cached())
                        .and_then(|(pos, order)| order.get(pos).copied());
                    continue;
                }
                NodeKind::Node | NodeKind::Sequence | NodeKind::GuardedSequence => {
                    Some(state.current)
                }
            };
            next = slot.and_then(|index| node.children.get(index).copied());
        }

        path
    }

    fn ticker(&mut self) -> Ticker<'_, C> {
        Ticker {
            def: self.blueprint.as_ref(),
            states: &mut self.states,
            rng: &mut self.rng,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_ticker<R>(&mut self, f: impl FnOnce(&mut Ticker<'_, C>) -> R) -> R {
        f(&mut self.ticker())
    }
}

impl<C> fmt::Debug for BehaviorTree<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorTree")
            .field("name", &self.blueprint.name())
            .field("ticks", &self.ticks)
            .field("last", &self.last)
            .field("active_path", &self.active_path())
            .finish()
    }
}

/// Borrowed view used while one tick (or reset) is in progress.
///
/// `def` is a shared borrow independent of `states`, so node definitions and
/// hooks can be held across recursive calls that mutate state.
pub(crate) struct Ticker<'t, C> {
    pub(crate) def: &'t Blueprint<C>,
    pub(crate) states: &'t mut [NodeState<C>],
    pub(crate) rng: &'t mut ChaCha8Rng,
}

impl<'t, C> Ticker<'t, C> {
    /// Processes one node for one tick.
    pub(crate) fn process(&mut self, id: NodeId, ctx: &mut C) -> Status {
        let def = self.def;
        let node = def.node(id);

        let status = match &node.kind {
            Kind::Node => self.plain_node(id, ctx),
            Kind::Leaf(_) => self.leaf(id, ctx),
            Kind::Sequence => self.sequence(id, ctx),
            Kind::Selector => self.selector(id, ctx),
            Kind::PrioritySelector => self.priority_selector(id, ctx),
            Kind::RandomSelector => self.random_selector(id, ctx),
            Kind::GuardedSequence(hooks) => self.guarded_sequence(id, hooks, ctx),
            Kind::Invertor => self.invertor(id, ctx),
            Kind::UntilFail => self.until_fail(id, ctx),
        };

        tracing::trace!("{} [{}] -> {}", node.name, node.kind.tag(), status);
        status
    }

    /// Resets a node and, first, its whole subtree.
    pub(crate) fn reset(&mut self, id: NodeId, ctx: &mut C) {
        let def = self.def;
        let node = def.node(id);

        for &child in &node.children {
            self.reset(child, ctx);
        }

        let state = &mut self.states[id.index()];
        state.current = 0;
        state.running = None;

        match &node.kind {
            Kind::Leaf(_) => {
                if let Some(strategy) = state.strategy.as_mut() {
                    strategy.reset(ctx);
                }
            }
            Kind::PrioritySelector | Kind::RandomSelector => {
                state.order = OrderCache::StaleAfter(Invalidation::Reset);
            }
            Kind::GuardedSequence(hooks) => {
                let guard = &mut state.guard;
                if guard.has_started && !guard.cleanup_ran {
                    guard.cleanup_ran = true;
                    guard.has_started = false;
                    tracing::debug!("{}: guarded activation complete", node.name);
                    (hooks.on_complete)(ctx);
                }
            }
            Kind::Node
            | Kind::Sequence
            | Kind::Selector
            | Kind::Invertor
            | Kind::UntilFail => {}
        }
    }

    fn leaf(&mut self, id: NodeId, ctx: &mut C) -> Status {
        match self.states[id.index()].strategy.as_mut() {
            Some(strategy) => strategy.process(ctx),
            None => Status::Failure,
        }
    }

    /// Forwards to the cursor-selected child.
    fn plain_node(&mut self, id: NodeId, ctx: &mut C) -> Status {
        let def = self.def;
        let current = self.states[id.index()].current;
        match def.node(id).children.get(current) {
            Some(&child) => self.process(child, ctx),
            None => Status::Failure,
        }
    }

    #[inline]
    pub(crate) fn state(&mut self, id: NodeId) -> &mut NodeState<C> {
        &mut self.states[id.index()]
    }
}
