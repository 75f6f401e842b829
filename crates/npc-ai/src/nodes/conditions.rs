//! Condition nodes for agent behavior trees.
//!
//! Condition nodes check the sensed snapshot and return Success or Failure.
//! They should not queue commands or touch memory.

use behavior_tree::{Status, Strategy};

use crate::context::AgentContext;

/// Vision parameters: notice radius plus a cone around the body's forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sight {
    pub radius: f32,
    pub field_of_view_deg: f32,
}

impl Sight {
    pub fn new(radius: f32, field_of_view_deg: f32) -> Self {
        Self {
            radius,
            field_of_view_deg,
        }
    }

    pub fn check(self, ctx: &AgentContext) -> bool {
        ctx.can_see_target(self.radius, self.field_of_view_deg)
    }
}

/// Checks if the target is at most `range` away.
///
/// # Example
///
/// ```rust,ignore
/// // Punch only when close enough
/// sequence("LeftPunch", vec![
///     leaf("CanMelee", move || TargetWithin { range: 6.0 }),
///     leaf("Punch", || AnimationWait::from_secs_f32("PunchLeft", 1.667)),
/// ])
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TargetWithin {
    pub range: f32,
}

impl Strategy<AgentContext> for TargetWithin {
    fn process(&mut self, ctx: &mut AgentContext) -> Status {
        Status::from_bool(ctx.target_within(self.range))
    }
}

/// Checks if the target is farther than `range`.
///
/// A missing target is neither within nor beyond any range.
#[derive(Debug, Clone, Copy)]
pub struct TargetBeyond {
    pub range: f32,
}

impl Strategy<AgentContext> for TargetBeyond {
    fn process(&mut self, ctx: &mut AgentContext) -> Status {
        Status::from_bool(ctx.target_beyond(self.range))
    }
}

/// Checks if the target is visible: in range, in the view cone, unobstructed.
#[derive(Debug, Clone, Copy)]
pub struct CanSeeTarget(pub Sight);

impl Strategy<AgentContext> for CanSeeTarget {
    fn process(&mut self, ctx: &mut AgentContext) -> Status {
        Status::from_bool(self.0.check(ctx))
    }
}

/// Checks if a last known target position is remembered.
#[derive(Debug, Clone, Copy)]
pub struct RemembersTarget;

impl Strategy<AgentContext> for RemembersTarget {
    fn process(&mut self, ctx: &mut AgentContext) -> Status {
        Status::from_bool(ctx.memory.last_known.is_some())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::world::{AgentId, Body};

    fn ctx(distance: f32) -> AgentContext {
        let mut ctx = AgentContext::new(AgentId(1), Vec3::ZERO, 0);
        ctx.body = Some(Body::at(Vec3::ZERO));
        ctx.target = Some(Vec3::new(0.0, 0.0, distance));
        ctx.clear_line_to_target = true;
        ctx
    }

    #[test]
    fn range_checks() {
        let mut near = ctx(3.0);
        assert_eq!(TargetWithin { range: 5.0 }.process(&mut near), Status::Success);
        assert_eq!(TargetBeyond { range: 5.0 }.process(&mut near), Status::Failure);

        let mut far = ctx(8.0);
        assert_eq!(TargetWithin { range: 5.0 }.process(&mut far), Status::Failure);
        assert_eq!(TargetBeyond { range: 5.0 }.process(&mut far), Status::Success);
    }

    #[test]
    fn sight_respects_radius() {
        let mut sight = CanSeeTarget(Sight::new(10.0, 90.0));
        assert_eq!(sight.process(&mut ctx(9.0)), Status::Success);
        assert_eq!(sight.process(&mut ctx(11.0)), Status::Failure);
    }

    #[test]
    fn remembers_target_reads_memory() {
        let mut ctx = ctx(1.0);
        assert_eq!(RemembersTarget.process(&mut ctx), Status::Failure);
        ctx.memory.last_known = Some(Vec3::ONE);
        assert_eq!(RemembersTarget.process(&mut ctx), Status::Success);
    }
}
