//! Real-time behavior tree engine for game agents.
//!
//! Trees are ticked once per frame. Every tick walks only the currently active
//! path from the root down to one leaf [`Strategy`], which answers `Success`,
//! `Failure` or `Running`. Composites remember where they stopped, so long
//! actions (waits, animations, jumps) simply keep returning `Running` across
//! frames until they finish.
//!
//! # Architecture
//!
//! - [`NodeSpec`] / [`builder`]: build-time tree description
//! - [`Blueprint`]: immutable, shareable compiled structure
//! - [`BehaviorTree`]: per-agent instance holding cursors, caches and
//!   strategy state; its `tick` never terminates
//! - [`Strategy`]: leaf behavior processed against a caller-owned context
//! - [`Clock`]: time source read by timed strategies
//!
//! Composite nodes: Sequence, Selector, PrioritySelector, RandomSelector,
//! GuardedSequence. Decorators: Invertor, UntilFail.

pub mod blueprint;
pub mod builder;
pub mod clock;
mod composite;
mod decorator;
pub mod node;
pub mod status;
pub mod strategy;
mod tree;

// Re-export core types for ergonomic API
pub use blueprint::{Blueprint, NodeDef};
pub use clock::{Clock, FrameClock, secs_f32, tick_duration};
pub use node::{GuardHooks, Kind, NodeId, NodeKind, NodeSpec};
pub use status::Status;
pub use strategy::{ActionStrategy, Condition, Strategy, WaitStrategy};
pub use tree::{BehaviorTree, Invalidation, OrderCache};
