//! Composite behavior nodes.
//!
//! Composite nodes control the execution flow of multiple child behaviors.
//! Every composite processes **at most the children it needs this tick** and
//! remembers where it stopped, so a child that reported `Running` is resumed
//! on the next tick instead of being re-entered from the top.
//!
//! - Sequence: AND gate, one child per tick, intermediate successes are
//!   reported upward as `Running`
//! - Selector: OR gate, pins a running child
//! - PrioritySelector: OR gate over children sorted by descending priority;
//!   a pinned child keeps control until it terminates
//! - RandomSelector: one shuffled pick per activation
//! - GuardedSequence: sequence with exactly-once start/complete hooks

use std::cmp::Reverse;

use rand::seq::SliceRandom;

use crate::node::GuardHooks;
use crate::tree::{Invalidation, OrderCache, Ticker};
use crate::{NodeId, Status};

impl<C> Ticker<'_, C> {
    /// AND gate.
    ///
    /// # Semantics
    ///
    /// - If the cursor is already past the last child, reset and succeed
    /// - If the child returns `Running`, return `Running`
    /// - If the child returns `Failure`, reset and return `Failure`
    /// - If the child returns `Success`, advance; succeed (and reset) after
    ///   the last child, otherwise return `Running`
    pub(crate) fn sequence(&mut self, id: NodeId, ctx: &mut C) -> Status {
        let def = self.def;
        let children = &def.node(id).children;
        let current = self.state(id).current;

        let Some(&child) = children.get(current) else {
            self.reset(id, ctx);
            return Status::Success;
        };

        match self.process(child, ctx) {
            Status::Running => Status::Running,
            Status::Failure => {
                self.reset(id, ctx);
                Status::Failure
            }
            Status::Success => {
                let next = current + 1;
                if next == children.len() {
                    self.reset(id, ctx);
                    Status::Success
                } else {
                    self.state(id).current = next;
                    Status::Running
                }
            }
        }
    }

    /// OR gate with a pinned running child.
    ///
    /// Children are never reset by the selector itself; only its own cursor
    /// and pin are cleared on a terminal result.
    pub(crate) fn selector(&mut self, id: NodeId, ctx: &mut C) -> Status {
        let def = self.def;
        let children = &def.node(id).children;
        let mut scan_from = self.state(id).current;

        if let Some(pin) = self.state(id).running {
            if let Some(&child) = children.get(pin) {
                match self.process(child, ctx) {
                    Status::Running => return Status::Running,
                    Status::Success => {
                        let state = self.state(id);
                        state.running = None;
                        state.current = 0;
                        return Status::Success;
                    }
                    Status::Failure => {
                        let state = self.state(id);
                        state.running = None;
                        if state.current > pin {
                            // Cursor already moved on; resume the scan next tick.
                            return Status::Running;
                        }
                        state.current = pin + 1;
                        scan_from = pin + 1;
                    }
                }
            } else {
                self.state(id).running = None;
            }
        }

        for (index, &child) in children.iter().enumerate().skip(scan_from) {
            match self.process(child, ctx) {
                Status::Running => {
                    let state = self.state(id);
                    state.running = Some(index);
                    state.current = index;
                    return Status::Running;
                }
                Status::Success => {
                    self.state(id).current = 0;
                    return Status::Success;
                }
                Status::Failure => self.state(id).current = index + 1,
            }
        }

        self.state(id).current = 0;
        Status::Failure
    }

    /// OR gate over children in descending priority order.
    ///
    /// While a child is pinned, only that child is processed: priority decides
    /// which child starts, not which child continues.
    pub(crate) fn priority_selector(&mut self, id: NodeId, ctx: &mut C) -> Status {
        let order = self.take_order(id, false);
        let mut scan_from = 0;

        if let Some(pos) = self.state(id).running.take() {
            if let Some(&child) = order.get(pos) {
                match self.process(child, ctx) {
                    Status::Running => {
                        let state = self.state(id);
                        state.running = Some(pos);
                        state.order = OrderCache::Cached(order);
                        return Status::Running;
                    }
                    Status::Success => return self.settle_success(id, child, ctx),
                    Status::Failure => {
                        tracing::debug!(
                            "{}: pinned child '{}' failed, continuing scan",
                            self.def.node(id).name,
                            self.def.node(child).name
                        );
                        scan_from = pos + 1;
                    }
                }
            }
        }

        for pos in scan_from..order.len() {
            let child = order[pos];
            match self.process(child, ctx) {
                Status::Running => {
                    let state = self.state(id);
                    state.running = Some(pos);
                    state.order = OrderCache::Cached(order);
                    return Status::Running;
                }
                Status::Success => return self.settle_success(id, child, ctx),
                Status::Failure => continue,
            }
        }

        let state = self.state(id);
        state.running = None;
        state.order = OrderCache::StaleAfter(Invalidation::Failed);
        Status::Failure
    }

    /// Runs the first child of a freshly shuffled order.
    ///
    /// There is no fallthrough: one pick per activation, and a failing pick
    /// fails the selector.
    pub(crate) fn random_selector(&mut self, id: NodeId, ctx: &mut C) -> Status {
        let order = self.take_order(id, true);
        self.state(id).running = None;

        let Some(&pick) = order.first() else {
            self.state(id).order = OrderCache::StaleAfter(Invalidation::Failed);
            return Status::Failure;
        };

        match self.process(pick, ctx) {
            Status::Running => {
                let state = self.state(id);
                state.running = Some(0);
                state.order = OrderCache::Cached(order);
                Status::Running
            }
            Status::Success => self.settle_success(id, pick, ctx),
            Status::Failure => {
                self.state(id).order = OrderCache::StaleAfter(Invalidation::Failed);
                Status::Failure
            }
        }
    }

    /// Sequence that brackets each committed activation with hooks.
    ///
    /// `on_start` fires when a child first reports `Running`, or right before
    /// completion if the whole sequence succeeded without ever running.
    /// `on_complete` is fired by [`Ticker::reset`], which every exit path
    /// (success, failure, external reset) goes through.
    pub(crate) fn guarded_sequence(
        &mut self,
        id: NodeId,
        hooks: &GuardHooks<C>,
        ctx: &mut C,
    ) -> Status {
        let def = self.def;
        let children = &def.node(id).children;
        let current = self.state(id).current;

        let Some(&child) = children.get(current) else {
            self.begin_guarded(id, hooks, ctx);
            self.reset(id, ctx);
            return Status::Success;
        };

        match self.process(child, ctx) {
            Status::Running => {
                self.begin_guarded(id, hooks, ctx);
                Status::Running
            }
            Status::Failure => {
                self.reset(id, ctx);
                Status::Failure
            }
            Status::Success => {
                let next = current + 1;
                if next == children.len() {
                    self.begin_guarded(id, hooks, ctx);
                    self.reset(id, ctx);
                    Status::Success
                } else {
                    self.state(id).current = next;
                    Status::Running
                }
            }
        }
    }

    fn begin_guarded(&mut self, id: NodeId, hooks: &GuardHooks<C>, ctx: &mut C) {
        let guard = &mut self.state(id).guard;
        if guard.has_started {
            return;
        }
        guard.has_started = true;
        guard.cleanup_ran = false;
        tracing::debug!("{}: guarded activation started", self.def.node(id).name);
        (hooks.on_start)(ctx);
    }

    /// Common success exit of priority and random selectors.
    fn settle_success(&mut self, id: NodeId, child: NodeId, ctx: &mut C) -> Status {
        self.reset(child, ctx);
        let state = self.state(id);
        state.running = None;
        state.order = OrderCache::StaleAfter(Invalidation::Succeeded);
        Status::Success
    }

    /// Takes the cached order out of the node, computing it on a miss.
    ///
    /// The caller stores it back (or marks it stale) before returning.
    fn take_order(&mut self, id: NodeId, shuffle: bool) -> Vec<NodeId> {
        let def = self.def;
        let node = def.node(id);

        match std::mem::take(&mut self.state(id).order) {
            OrderCache::Cached(order) => order,
            previous => {
                let mut order = node.children.clone();
                if shuffle {
                    order.shuffle(&mut *self.rng);
                } else {
                    // Stable: equal priorities keep declaration order.
                    order.sort_by_key(|&child| Reverse(def.node(child).priority));
                }
                tracing::debug!(
                    "{}: recomputed child order ({:?})",
                    node.name,
                    previous
                );
                order
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builder::{
        guarded_sequence, leaf, priority_selector, random_selector, selector, sequence,
    };
    use crate::{Blueprint, Strategy};

    /// Shared test context recording which leaves ran.
    #[derive(Default)]
    struct Log {
        calls: Vec<&'static str>,
        starts: u32,
        completes: u32,
    }

    /// Replays a script of statuses, repeating the last entry.
    struct Scripted {
        name: &'static str,
        script: Vec<Status>,
        step: usize,
    }

    impl Strategy<Log> for Scripted {
        fn process(&mut self, ctx: &mut Log) -> Status {
            ctx.calls.push(self.name);
            let status = self.script[self.step.min(self.script.len() - 1)];
            self.step += 1;
            status
        }

        fn reset(&mut self, _ctx: &mut Log) {
            self.step = 0;
        }
    }

    fn scripted(name: &'static str, script: &[Status]) -> crate::NodeSpec<Log> {
        let script = script.to_vec();
        leaf(name, move || Scripted {
            name,
            script: script.clone(),
            step: 0,
        })
    }

    fn run(spec: crate::NodeSpec<Log>) -> (crate::BehaviorTree<Log>, NodeId) {
        let blueprint = Arc::new(Blueprint::new("Test", spec));
        let root = blueprint.root().unwrap();
        (blueprint.instantiate(7), root)
    }

    fn process(tree: &mut crate::BehaviorTree<Log>, id: NodeId, log: &mut Log) -> Status {
        tree.with_ticker(|ticker| ticker.process(id, log))
    }

    use Status::{Failure as F, Running as R, Success as S};

    #[test]
    fn sequence_reports_intermediate_success_as_running() {
        let (mut tree, root) = run(sequence(
            "Seq",
            vec![scripted("a", &[S]), scripted("b", &[S]), scripted("c", &[S])],
        ));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), R);
        assert_eq!(process(&mut tree, root, &mut log), R);
        assert_eq!(process(&mut tree, root, &mut log), S);
        assert_eq!(log.calls, ["a", "b", "c"]);
        assert_eq!(tree.cursor(root), Some(0));
    }

    #[test]
    fn sequence_ticks_remaining_children_after_running() {
        // Children 0..k-1 succeed at once, child k runs for two extra ticks.
        let (mut tree, root) = run(sequence(
            "Seq",
            vec![
                scripted("a", &[S]),
                scripted("b", &[R, R, S]),
                scripted("c", &[S]),
                scripted("d", &[S]),
            ],
        ));
        let mut log = Log::default();

        let mut statuses = Vec::new();
        loop {
            let status = process(&mut tree, root, &mut log);
            statuses.push(status);
            if status.is_terminal() {
                break;
            }
        }

        // One tick for "a", three for "b", one each for "c" and "d".
        assert_eq!(statuses, [R, R, R, R, R, S]);
    }

    #[test]
    fn sequence_failure_resets_cursor_and_children() {
        let (mut tree, root) = run(sequence(
            "Seq",
            vec![scripted("a", &[S]), scripted("b", &[F, S])],
        ));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), R);
        assert_eq!(process(&mut tree, root, &mut log), F);
        assert_eq!(tree.cursor(root), Some(0));

        // "b" was reset with the sequence, so it replays its script from F.
        assert_eq!(process(&mut tree, root, &mut log), R);
        assert_eq!(process(&mut tree, root, &mut log), F);
        assert_eq!(log.calls, ["a", "b", "a", "b"]);
    }

    #[test]
    fn empty_sequence_succeeds() {
        let (mut tree, root) = run(sequence("Seq", vec![]));
        assert_eq!(process(&mut tree, root, &mut Log::default()), S);
    }

    #[test]
    fn selector_first_success_wins() {
        let (mut tree, root) = run(selector(
            "Sel",
            vec![scripted("a", &[F]), scripted("b", &[S]), scripted("c", &[S])],
        ));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), S);
        assert_eq!(log.calls, ["a", "b"]);
        assert_eq!(tree.cursor(root), Some(0));
    }

    #[test]
    fn selector_resumes_pinned_child_without_rescanning() {
        let (mut tree, root) = run(selector(
            "Sel",
            vec![scripted("a", &[F]), scripted("b", &[R, R, S])],
        ));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), R);
        assert_eq!(process(&mut tree, root, &mut log), R);
        assert_eq!(process(&mut tree, root, &mut log), S);
        assert_eq!(log.calls, ["a", "b", "b", "b"]);
    }

    #[test]
    fn selector_pinned_failure_continues_scan_same_tick() {
        let (mut tree, root) = run(selector(
            "Sel",
            vec![scripted("a", &[R, F]), scripted("b", &[S])],
        ));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), R);
        assert_eq!(process(&mut tree, root, &mut log), S);
        assert_eq!(log.calls, ["a", "a", "b"]);
    }

    #[test]
    fn selector_fails_when_all_fail() {
        let (mut tree, root) = run(selector(
            "Sel",
            vec![scripted("a", &[F]), scripted("b", &[F])],
        ));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), F);
        assert_eq!(tree.cursor(root), Some(0));
        assert_eq!(process(&mut tree, root, &mut Log::default()), F);
    }

    #[test]
    fn selector_keeps_child_state_after_success() {
        let (mut tree, root) = run(selector(
            "Sel",
            vec![scripted("a", &[F, S]), scripted("b", &[S])],
        ));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), S);
        // "a" was not reset, so it continues its script with S.
        assert_eq!(process(&mut tree, root, &mut log), S);
        assert_eq!(log.calls, ["a", "b", "a"]);
    }

    #[test]
    fn selector_keeps_child_state_after_failure() {
        let (mut tree, root) = run(selector(
            "Sel",
            vec![scripted("a", &[F, S]), scripted("b", &[F])],
        ));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), F);
        assert_eq!(process(&mut tree, root, &mut log), S);
        assert_eq!(log.calls, ["a", "b", "a"]);
    }

    #[test]
    fn priority_selector_does_not_steal_from_running_child() {
        let (mut tree, root) = run(priority_selector(
            "Main",
            vec![
                scripted("low", &[S]).with_priority(1),
                scripted("high", &[R, R, R, S]).with_priority(10),
                scripted("mid", &[S]).with_priority(5),
            ],
        ));
        let mut log = Log::default();

        for _ in 0..3 {
            assert_eq!(process(&mut tree, root, &mut log), R);
        }
        assert_eq!(process(&mut tree, root, &mut log), S);
        assert_eq!(log.calls, ["high", "high", "high", "high"]);
        assert_eq!(
            tree.order_cache(root),
            Some(&OrderCache::StaleAfter(Invalidation::Succeeded))
        );
    }

    #[test]
    fn priority_selector_resets_child_that_succeeded() {
        let (mut tree, root) = run(priority_selector(
            "Main",
            vec![scripted("hi", &[R, S, F]).with_priority(1)],
        ));
        let mut log = Log::default();

        let statuses: Vec<Status> = (0..3).map(|_| process(&mut tree, root, &mut log)).collect();
        // Without a reset the third tick would replay F.
        assert_eq!(statuses, [R, S, R]);
    }

    #[test]
    fn priority_selector_falls_through_in_priority_order() {
        let (mut tree, root) = run(priority_selector(
            "Main",
            vec![
                scripted("low", &[S]).with_priority(1),
                scripted("high", &[F]).with_priority(10),
                scripted("mid", &[F]).with_priority(5),
            ],
        ));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), S);
        assert_eq!(log.calls, ["high", "mid", "low"]);
    }

    #[test]
    fn priority_selector_pinned_failure_skips_earlier_entries() {
        let (mut tree, root) = run(priority_selector(
            "Main",
            vec![
                scripted("first", &[F, S]).with_priority(3),
                scripted("second", &[R, F]).with_priority(2),
                scripted("third", &[F]).with_priority(1),
            ],
        ));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), R);
        // "second" fails; scanning continues with "third" only.
        assert_eq!(process(&mut tree, root, &mut log), F);
        assert_eq!(log.calls, ["first", "second", "second", "third"]);
        assert_eq!(
            tree.order_cache(root),
            Some(&OrderCache::StaleAfter(Invalidation::Failed))
        );
    }

    #[test]
    fn random_selector_is_fail_fast() {
        let (mut tree, root) = run(random_selector(
            "Rand",
            vec![scripted("a", &[F]), scripted("b", &[F])],
        ));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), F);
        assert_eq!(log.calls.len(), 1);
    }

    #[test]
    fn random_selector_keeps_pick_while_running() {
        let (mut tree, root) = run(random_selector(
            "Rand",
            vec![scripted("a", &[R, R, S]), scripted("b", &[R, R, S])],
        ));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), R);
        assert_eq!(process(&mut tree, root, &mut log), R);
        assert_eq!(process(&mut tree, root, &mut log), S);
        assert_eq!(log.calls.len(), 3);
        assert!(log.calls.iter().all(|name| *name == log.calls[0]));
    }

    #[test]
    fn random_selector_resets_child_that_succeeded() {
        let (mut tree, root) = run(random_selector("Rand", vec![scripted("only", &[R, S, F])]));
        let mut log = Log::default();

        let statuses: Vec<Status> = (0..3).map(|_| process(&mut tree, root, &mut log)).collect();
        assert_eq!(statuses, [R, S, R]);
    }

    #[test]
    fn random_selector_picks_uniformly() {
        let (mut tree, root) = run(random_selector(
            "Rand",
            vec![scripted("a", &[S]), scripted("b", &[S]), scripted("c", &[S])],
        ));
        let mut log = Log::default();

        const ACTIVATIONS: usize = 1000;
        for _ in 0..ACTIVATIONS {
            assert_eq!(process(&mut tree, root, &mut log), S);
        }

        let expected = ACTIVATIONS as f64 / 3.0;
        let chi_square: f64 = ["a", "b", "c"]
            .iter()
            .map(|name| {
                let observed = log.calls.iter().filter(|c| *c == name).count() as f64;
                (observed - expected).powi(2) / expected
            })
            .sum();

        // Two degrees of freedom, p = 0.001.
        assert!(chi_square < 13.82, "chi-square {chi_square} too large");
    }

    fn guarded(children: Vec<crate::NodeSpec<Log>>) -> crate::NodeSpec<Log> {
        guarded_sequence(
            "Guard",
            |log: &mut Log| log.starts += 1,
            |log: &mut Log| log.completes += 1,
            children,
        )
    }

    #[test]
    fn guarded_sequence_hooks_bracket_running_activation() {
        let (mut tree, root) = run(guarded(vec![scripted("a", &[S]), scripted("b", &[R, S])]));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), R);
        assert_eq!((log.starts, log.completes), (0, 0));
        assert_eq!(process(&mut tree, root, &mut log), R);
        assert_eq!((log.starts, log.completes), (1, 0));
        assert_eq!(process(&mut tree, root, &mut log), S);
        assert_eq!((log.starts, log.completes), (1, 1));
    }

    #[test]
    fn guarded_sequence_immediate_success_fires_both_hooks() {
        let (mut tree, root) = run(guarded(vec![scripted("a", &[S])]));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), S);
        assert_eq!((log.starts, log.completes), (1, 1));
    }

    #[test]
    fn guarded_sequence_failure_before_start_fires_nothing() {
        let (mut tree, root) = run(guarded(vec![scripted("a", &[F])]));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), F);
        assert_eq!((log.starts, log.completes), (0, 0));
    }

    #[test]
    fn guarded_sequence_completes_on_failure_and_external_reset() {
        let (mut tree, root) = run(guarded(vec![scripted("a", &[R, F])]));
        let mut log = Log::default();

        assert_eq!(process(&mut tree, root, &mut log), R);
        assert_eq!(process(&mut tree, root, &mut log), F);
        assert_eq!((log.starts, log.completes), (1, 1));

        assert_eq!(process(&mut tree, root, &mut log), R);
        tree.reset(&mut log);
        tree.reset(&mut log);
        assert_eq!((log.starts, log.completes), (2, 2));
    }
}
