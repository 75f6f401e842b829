//! Builder utilities for ergonomic behavior tree construction.
//!
//! This module provides helper functions to reduce boilerplate when building
//! behavior trees. Instead of writing verbose
//! `NodeSpec::new(name, Kind::Sequence).with_children(...)`, you can use
//! shorter functions like `sequence(name, vec![...])`.
//!
//! ```rust
//! use std::time::Duration;
//! use behavior_tree::builder::{condition, sequence, wait};
//! use behavior_tree::{Blueprint, FrameClock};
//!
//! let spec = sequence(
//!     "Ambush",
//!     vec![
//!         condition("Ready", |_: &FrameClock| true),
//!         wait("Hold", Duration::from_millis(500)),
//!     ],
//! );
//! let blueprint = Blueprint::new("Demo", spec);
//! assert_eq!(blueprint.len(), 3);
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::node::{GuardHooks, Kind, NodeSpec};
use crate::strategy::{ActionStrategy, Condition, WaitStrategy};
use crate::{Clock, Strategy};

/// Creates a leaf node whose strategy is produced by `factory`.
///
/// The factory runs once per tree instance, so every agent gets its own
/// strategy state.
pub fn leaf<C, S, F>(name: impl Into<String>, factory: F) -> NodeSpec<C>
where
    C: 'static,
    F: Fn() -> S + Send + Sync + 'static,
    S: Strategy<C> + 'static,
{
    NodeSpec::new(
        name,
        Kind::Leaf(Box::new(move || Box::new(factory()) as Box<dyn Strategy<C>>)),
    )
}

/// Creates a condition leaf.
pub fn condition<C, F>(name: impl Into<String>, predicate: F) -> NodeSpec<C>
where
    C: 'static,
    F: Fn(&C) -> bool + Send + Sync + 'static,
{
    let predicate: Arc<dyn Fn(&C) -> bool + Send + Sync> = Arc::new(predicate);
    leaf(name, move || Condition::new(Arc::clone(&predicate)))
}

/// Creates an action leaf that succeeds after running `effect` once.
pub fn action<C, F>(name: impl Into<String>, effect: F) -> NodeSpec<C>
where
    C: 'static,
    F: Fn(&mut C) + Send + Sync + 'static,
{
    let effect: Arc<dyn Fn(&mut C) + Send + Sync> = Arc::new(effect);
    leaf(name, move || ActionStrategy::new(Arc::clone(&effect)))
}

/// Creates a wait leaf.
pub fn wait<C>(name: impl Into<String>, duration: Duration) -> NodeSpec<C>
where
    C: Clock + 'static,
{
    leaf(name, move || WaitStrategy::new(duration))
}

/// Creates a plain pass-through node.
pub fn node<C>(name: impl Into<String>, children: Vec<NodeSpec<C>>) -> NodeSpec<C> {
    NodeSpec::new(name, Kind::Node).with_children(children)
}

/// Creates a sequence node.
#[inline]
pub fn sequence<C>(name: impl Into<String>, children: Vec<NodeSpec<C>>) -> NodeSpec<C> {
    NodeSpec::new(name, Kind::Sequence).with_children(children)
}

/// Creates a selector node.
#[inline]
pub fn selector<C>(name: impl Into<String>, children: Vec<NodeSpec<C>>) -> NodeSpec<C> {
    NodeSpec::new(name, Kind::Selector).with_children(children)
}

/// Creates a priority selector node.
#[inline]
pub fn priority_selector<C>(name: impl Into<String>, children: Vec<NodeSpec<C>>) -> NodeSpec<C> {
    NodeSpec::new(name, Kind::PrioritySelector).with_children(children)
}

/// Creates a random selector node.
#[inline]
pub fn random_selector<C>(name: impl Into<String>, children: Vec<NodeSpec<C>>) -> NodeSpec<C> {
    NodeSpec::new(name, Kind::RandomSelector).with_children(children)
}

/// Creates a guarded sequence node.
pub fn guarded_sequence<C, S, E>(
    name: impl Into<String>,
    on_start: S,
    on_complete: E,
    children: Vec<NodeSpec<C>>,
) -> NodeSpec<C>
where
    S: Fn(&mut C) + Send + Sync + 'static,
    E: Fn(&mut C) + Send + Sync + 'static,
{
    let hooks = GuardHooks {
        on_start: Box::new(on_start),
        on_complete: Box::new(on_complete),
    };
    NodeSpec::new(name, Kind::GuardedSequence(hooks)).with_children(children)
}

/// Creates an invertor node.
#[inline]
pub fn invertor<C>(name: impl Into<String>, child: NodeSpec<C>) -> NodeSpec<C> {
    NodeSpec::new(name, Kind::Invertor).with_child(child)
}

/// Creates an until-fail node.
#[inline]
pub fn until_fail<C>(name: impl Into<String>, child: NodeSpec<C>) -> NodeSpec<C> {
    NodeSpec::new(name, Kind::UntilFail).with_child(child)
}
