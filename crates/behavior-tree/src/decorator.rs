//! Decorator behavior nodes.
//!
//! Decorators wrap a single child and modify its result. Only the first child
//! is considered; a decorator without a child fails.

use crate::tree::Ticker;
use crate::{NodeId, Status};

impl<C> Ticker<'_, C> {
    /// Inverts the result of its child.
    ///
    /// # Semantics
    ///
    /// - If the child returns `Success`, the invertor returns `Failure`
    /// - If the child returns `Failure`, the invertor returns `Success`
    /// - `Running` passes through unchanged
    pub(crate) fn invertor(&mut self, id: NodeId, ctx: &mut C) -> Status {
        match self.first_child(id) {
            Some(child) => self.process(child, ctx).invert(),
            None => Status::Failure,
        }
    }

    /// Keeps its child going until the child fails.
    ///
    /// Any non-failure is reported as `Running`. A failure resets the subtree
    /// and is reported upward as the end of this activation.
    pub(crate) fn until_fail(&mut self, id: NodeId, ctx: &mut C) -> Status {
        let Some(child) = self.first_child(id) else {
            return Status::Failure;
        };

        match self.process(child, ctx) {
            Status::Failure => {
                self.reset(id, ctx);
                Status::Failure
            }
            Status::Success | Status::Running => Status::Running,
        }
    }

    fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.def.node(id).children.first().copied()
    }
}
