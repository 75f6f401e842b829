//! Strategies: the stateful units of work wrapped by leaf nodes.
//!
//! A [`Strategy`] is a small resumable state machine. It is processed once per
//! tick through its leaf, keeps whatever private state it needs between ticks,
//! and only forgets that state when [`Strategy::reset`] is called.
//!
//! This module holds the strategies that need nothing but the context type
//! itself: [`ActionStrategy`], [`Condition`] and [`WaitStrategy`]. Strategies
//! that talk to bodies or animators live next to the agent code that provides
//! them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::{Clock, Status};

/// A resumable unit of work processed against a context.
pub trait Strategy<C>: Send {
    /// Advances the strategy by one tick.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Mutable reference to the per-tick context. Strategies read
    ///   the world through it and queue side effects on it.
    fn process(&mut self, ctx: &mut C) -> Status;

    /// Returns the strategy to its initial state.
    ///
    /// The default implementation does nothing, which suits stateless
    /// strategies such as conditions.
    fn reset(&mut self, ctx: &mut C) {
        let _ = ctx;
    }
}

/// Shared predicate evaluated by [`Condition`].
pub type Predicate<C> = Arc<dyn Fn(&C) -> bool + Send + Sync>;

/// Shared side effect run by [`ActionStrategy`].
pub type Effect<C> = Arc<dyn Fn(&mut C) + Send + Sync>;

/// Runs a side effect and succeeds on the same tick.
pub struct ActionStrategy<C> {
    effect: Effect<C>,
}

impl<C> ActionStrategy<C> {
    pub fn new(effect: Effect<C>) -> Self {
        Self { effect }
    }
}

impl<C> Strategy<C> for ActionStrategy<C> {
    fn process(&mut self, ctx: &mut C) -> Status {
        (self.effect)(ctx);
        Status::Success
    }
}

impl<C> fmt::Debug for ActionStrategy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActionStrategy")
    }
}

/// Succeeds when the predicate holds, fails otherwise. Never runs.
pub struct Condition<C> {
    predicate: Predicate<C>,
}

impl<C> Condition<C> {
    pub fn new(predicate: Predicate<C>) -> Self {
        Self { predicate }
    }
}

impl<C> Strategy<C> for Condition<C> {
    fn process(&mut self, ctx: &mut C) -> Status {
        Status::from_bool((self.predicate)(ctx))
    }
}

impl<C> fmt::Debug for Condition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition")
    }
}

/// Waits until a fixed duration has elapsed.
///
/// The first tick records the start of the frame it runs in and always
/// reports `Running`. Later ticks succeed once strictly more than `duration`
/// has passed since that start.
#[derive(Debug, Clone)]
pub struct WaitStrategy {
    duration: Duration,
    started_at: Option<Duration>,
}

impl WaitStrategy {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started_at: None,
        }
    }

    pub fn from_secs_f32(seconds: f32) -> Self {
        Self::new(crate::clock::secs_f32(seconds))
    }

    /// Returns `true` once the wait has been entered and not reset since.
    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }
}

impl<C: Clock> Strategy<C> for WaitStrategy {
    fn process(&mut self, ctx: &mut C) -> Status {
        let now = ctx.now();

        let Some(started_at) = self.started_at else {
            self.started_at = Some(now.saturating_sub(ctx.delta()));
            return Status::Running;
        };

        let elapsed = now.saturating_sub(started_at);
        if elapsed > self.duration {
            tracing::debug!(
                "Wait done: elapsed {:?} exceeds {:?}",
                elapsed,
                self.duration
            );
            Status::Success
        } else {
            Status::Running
        }
    }

    fn reset(&mut self, _ctx: &mut C) {
        self.started_at = None;
    }
}
