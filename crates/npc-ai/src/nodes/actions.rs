//! Action strategies that move bodies and drive animations.
//!
//! Every action is non-blocking: it queues commands on the [`AgentContext`]
//! and reports `Running` until it can observe completion on a later tick. A
//! missing body, target or animator makes the action fail immediately.

use std::time::Duration;

use behavior_tree::{Clock, Status, Strategy};
use glam::Vec3;

use crate::ballistics::{self, Launch};
use crate::config::ProjectileConfig;
use crate::context::{AgentContext, flatten};
use crate::nodes::conditions::Sight;

/// Fires an animation trigger and waits for the clip to finish.
#[derive(Debug, Clone)]
pub struct AnimationWait {
    trigger: String,
    duration: Duration,
    started_at: Option<Duration>,
}

impl AnimationWait {
    pub fn new(trigger: impl Into<String>, duration: Duration) -> Self {
        Self {
            trigger: trigger.into(),
            duration,
            started_at: None,
        }
    }

    /// Negative and NaN durations count as zero.
    pub fn from_secs_f32(trigger: impl Into<String>, secs: f32) -> Self {
        Self::new(trigger, behavior_tree::secs_f32(secs))
    }
}

impl Strategy<AgentContext> for AnimationWait {
    fn process(&mut self, ctx: &mut AgentContext) -> Status {
        if !ctx.has_animator {
            tracing::warn!("{}: no animator for trigger '{}'", ctx.agent(), self.trigger);
            return Status::Failure;
        }

        let Some(started_at) = self.started_at else {
            ctx.trigger(&self.trigger);
            self.started_at = Some(ctx.now().saturating_sub(ctx.delta()));
            return Status::Running;
        };

        if ctx.now().saturating_sub(started_at) <= self.duration {
            Status::Running
        } else {
            tracing::debug!("{}: animation '{}' done", ctx.agent(), self.trigger);
            Status::Success
        }
    }

    fn reset(&mut self, ctx: &mut AgentContext) {
        self.started_at = None;
        if ctx.has_animator {
            ctx.reset_trigger(&self.trigger);
        }
    }
}

/// Where a [`Chase`] is heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ChaseGoal {
    /// The live target position.
    Target,
    /// The remembered last known target position.
    LastKnown,
    /// The current roam point.
    Roam,
    /// The current search point.
    SearchPoint,
}

/// Condition that makes a running [`Chase`] give up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Abort {
    #[default]
    Never,
    /// Stop as soon as the target is seen (roaming, searching).
    WhenSeen(Sight),
    /// Stop as soon as the target is no longer seen (hunting).
    WhenLost(Sight),
}

impl Abort {
    fn triggered(self, ctx: &AgentContext) -> bool {
        match self {
            Abort::Never => false,
            Abort::WhenSeen(sight) => sight.check(ctx),
            Abort::WhenLost(sight) => !sight.check(ctx),
        }
    }
}

/// Breadcrumb trail left while chasing the live target.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Trail {
    interval: Duration,
    capacity: usize,
}

/// Steers the body toward a goal on the ground plane.
///
/// Chasing the live target also refreshes the remembered last known
/// position, including on the tick the chase is aborted.
#[derive(Debug, Clone)]
pub struct Chase {
    goal: ChaseGoal,
    speed: f32,
    stop_distance: f32,
    abort: Abort,
    trail: Option<Trail>,
}

impl Chase {
    pub fn new(goal: ChaseGoal, speed: f32, stop_distance: f32) -> Self {
        Self {
            goal,
            speed,
            stop_distance,
            abort: Abort::Never,
            trail: None,
        }
    }

    /// Makes the chase fail when `abort` triggers (builder pattern).
    pub fn with_abort(mut self, abort: Abort) -> Self {
        self.abort = abort;
        self
    }

    /// Drops a breadcrumb at most every `interval` while chasing the live
    /// target (builder pattern).
    pub fn with_trail(mut self, interval: Duration, capacity: usize) -> Self {
        self.trail = Some(Trail { interval, capacity });
        self
    }

    fn goal_position(&self, ctx: &AgentContext) -> Option<Vec3> {
        match self.goal {
            ChaseGoal::Target => ctx.target,
            ChaseGoal::LastKnown => ctx.memory.last_known,
            ChaseGoal::Roam => ctx.memory.roam_point,
            ChaseGoal::SearchPoint => ctx.memory.search_point,
        }
    }
}

impl Strategy<AgentContext> for Chase {
    fn process(&mut self, ctx: &mut AgentContext) -> Status {
        let Some(body) = ctx.body else {
            tracing::warn!("{}: chase without a body", ctx.agent());
            return Status::Failure;
        };
        let Some(goal) = self.goal_position(ctx) else {
            tracing::debug!("{}: nothing to chase ({})", ctx.agent(), self.goal);
            return Status::Failure;
        };
        if self.goal == ChaseGoal::Target {
            ctx.memory.last_known = Some(goal);
            if let Some(trail) = self.trail {
                let now = ctx.now();
                if ctx
                    .memory
                    .drop_breadcrumb(body.position, now, trail.interval, trail.capacity)
                {
                    tracing::trace!("{}: breadcrumb at {}", ctx.agent(), body.position);
                }
            }
        }

        if self.abort.triggered(ctx) {
            tracing::debug!("{}: chase toward {} aborted", ctx.agent(), self.goal);
            ctx.set_velocity(Vec3::new(0.0, body.velocity.y, 0.0));
            return Status::Failure;
        }

        let offset = flatten(goal - body.position);
        if offset.length() <= self.stop_distance {
            ctx.set_velocity(Vec3::ZERO);
            return Status::Success;
        }

        let planar = offset.normalize_or_zero() * self.speed;
        ctx.set_velocity(Vec3::new(planar.x, body.velocity.y, planar.z));
        Status::Running
    }

    fn reset(&mut self, ctx: &mut AgentContext) {
        if ctx.body.is_some() {
            ctx.set_velocity(Vec3::ZERO);
        }
    }
}

/// Leaps onto the target along a ballistic arc of fixed duration.
#[derive(Debug, Clone)]
pub struct JumpOnTarget {
    flight_time: f32,
    has_jumped: bool,
}

impl JumpOnTarget {
    /// Vertical speed under which a grounded body counts as landed.
    const LANDING_SPEED: f32 = 0.1;

    pub fn new(flight_time: Duration) -> Self {
        Self {
            flight_time: flight_time.as_secs_f32(),
            has_jumped: false,
        }
    }

    pub fn from_secs_f32(flight_time: f32) -> Self {
        Self {
            flight_time,
            has_jumped: false,
        }
    }

    pub fn has_jumped(&self) -> bool {
        self.has_jumped
    }
}

impl Strategy<AgentContext> for JumpOnTarget {
    fn process(&mut self, ctx: &mut AgentContext) -> Status {
        let (Some(body), Some(target)) = (ctx.body, ctx.target) else {
            tracing::warn!("{}: jump needs a body and a target", ctx.agent());
            return Status::Failure;
        };

        if !self.has_jumped {
            if !body.grounded {
                tracing::debug!("{}: not grounded, waiting to jump", ctx.agent());
                return Status::Running;
            }

            let launch = ballistics::timed_jump(
                body.position,
                target,
                self.flight_time,
                ctx.gravity,
                body.forward,
            );
            ctx.set_velocity(Vec3::ZERO);
            ctx.add_velocity(launch);
            self.has_jumped = true;
            tracing::debug!(
                "{}: jump started, velocity {} over {:.2}s",
                ctx.agent(),
                launch,
                self.flight_time
            );
            return Status::Running;
        }

        if body.velocity.y <= Self::LANDING_SPEED && body.grounded {
            tracing::debug!("{}: landed", ctx.agent());
            ctx.set_velocity(Vec3::ZERO);
            return Status::Success;
        }

        Status::Running
    }

    fn reset(&mut self, ctx: &mut AgentContext) {
        self.has_jumped = false;
        if ctx.body.is_some() {
            ctx.set_velocity(Vec3::ZERO);
        }
    }
}

/// Throws a projectile at the target and succeeds on the same tick.
#[derive(Debug, Clone)]
pub struct ThrowProjectile {
    angle_deg: f32,
    fallback_speed: f32,
    lifetime: Duration,
    spawn_height: f32,
}

impl ThrowProjectile {
    pub fn new(config: &ProjectileConfig) -> Self {
        Self {
            angle_deg: config.angle_deg,
            fallback_speed: config.fallback_speed,
            lifetime: config.lifetime(),
            spawn_height: config.spawn_height,
        }
    }
}

impl Strategy<AgentContext> for ThrowProjectile {
    fn process(&mut self, ctx: &mut AgentContext) -> Status {
        let (Some(body), Some(target)) = (ctx.body, ctx.target) else {
            tracing::warn!("{}: throw needs a body and a target", ctx.agent());
            return Status::Failure;
        };

        let origin = body.position + Vec3::Y * self.spawn_height;
        let launch = ballistics::fixed_angle_launch(
            origin,
            target,
            self.angle_deg,
            ctx.gravity,
            self.fallback_speed,
        );
        if let Launch::Straight(_) = launch {
            tracing::warn!(
                "{}: target unreachable at {} degrees, throwing straight",
                ctx.agent(),
                self.angle_deg
            );
        }

        ctx.spawn_projectile(origin, launch.velocity(), self.lifetime);
        Status::Success
    }
}

/// Picks a fresh roam point around home.
#[derive(Debug, Clone)]
pub struct PickRoamPoint {
    radius: f32,
}

impl PickRoamPoint {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl Strategy<AgentContext> for PickRoamPoint {
    fn process(&mut self, ctx: &mut AgentContext) -> Status {
        let point = ctx.memory.random_roam_point(self.radius);
        tracing::trace!("{}: new roam point {}", ctx.agent(), point);
        ctx.memory.roam_point = Some(point);
        Status::Success
    }
}

/// Picks a search point around the last known target position.
///
/// Fails when nothing is remembered.
#[derive(Debug, Clone)]
pub struct PickSearchPoint {
    radius: f32,
}

impl PickSearchPoint {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl Strategy<AgentContext> for PickSearchPoint {
    fn process(&mut self, ctx: &mut AgentContext) -> Status {
        let Some(center) = ctx.memory.last_known else {
            return Status::Failure;
        };
        let point = ctx.memory.random_point_around(center, self.radius);
        tracing::debug!("{}: searching around {}", ctx.agent(), point);
        ctx.memory.search_point = Some(point);
        Status::Success
    }
}

/// Makes the most recent breadcrumb the next search point.
///
/// Fails once the trail is used up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NextBreadcrumb;

impl Strategy<AgentContext> for NextBreadcrumb {
    fn process(&mut self, ctx: &mut AgentContext) -> Status {
        match ctx.memory.pop_breadcrumb() {
            Some(point) => {
                ctx.memory.search_point = Some(point);
                Status::Success
            }
            None => {
                tracing::debug!("{}: trail exhausted", ctx.agent());
                Status::Failure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use behavior_tree::FrameClock;

    use super::*;
    use crate::world::{AgentId, Body, Command};

    const DT: Duration = Duration::from_millis(100);

    fn ctx_at(position: Vec3, target: Vec3) -> (AgentContext, FrameClock) {
        let mut ctx = AgentContext::new(AgentId(7), Vec3::ZERO, 0);
        ctx.body = Some(Body::at(position));
        ctx.target = Some(target);
        ctx.has_animator = true;
        (ctx, FrameClock::new())
    }

    /// Advances time by one tick without touching the snapshot.
    fn step(ctx: &mut AgentContext, clock: &mut FrameClock) {
        clock.advance(DT);
        ctx.set_clock(*clock);
    }

    #[test]
    fn animation_wait_triggers_once_and_runs_for_duration() {
        let (mut ctx, mut clock) = ctx_at(Vec3::ZERO, Vec3::X);
        let mut anim = AnimationWait::new("PunchLeft", Duration::from_millis(300));

        step(&mut ctx, &mut clock);
        assert_eq!(anim.process(&mut ctx), Status::Running);
        assert_eq!(
            ctx.commands(),
            [Command::SetAnimTrigger("PunchLeft".to_owned())]
        );

        // Started at 0 ms; running through 300 ms.
        let mut statuses = Vec::new();
        for _ in 0..3 {
            step(&mut ctx, &mut clock);
            statuses.push(anim.process(&mut ctx));
        }
        assert_eq!(statuses, [Status::Running, Status::Running, Status::Success]);

        let triggers = ctx
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::SetAnimTrigger(_)))
            .count();
        assert_eq!(triggers, 1);

        anim.reset(&mut ctx);
        assert_eq!(
            ctx.commands().last(),
            Some(&Command::ResetAnimTrigger("PunchLeft".to_owned()))
        );
    }

    #[test]
    fn animation_wait_without_animator_fails() {
        let (mut ctx, _) = ctx_at(Vec3::ZERO, Vec3::X);
        ctx.has_animator = false;
        let mut anim = AnimationWait::from_secs_f32("ThrowRock", 2.0);
        assert_eq!(anim.process(&mut ctx), Status::Failure);
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn chase_steers_on_ground_plane_and_stops_in_range() {
        let (mut ctx, _) = ctx_at(Vec3::ZERO, Vec3::new(10.0, 3.0, 0.0));
        let mut chase = Chase::new(ChaseGoal::Target, 4.0, 2.0);

        assert_eq!(chase.process(&mut ctx), Status::Running);
        assert_eq!(ctx.commands(), [Command::SetVelocity(Vec3::new(4.0, 0.0, 0.0))]);

        ctx.drain_commands();
        ctx.body = Some(Body::at(Vec3::new(8.5, 0.0, 0.0)));
        assert_eq!(chase.process(&mut ctx), Status::Success);
        assert_eq!(ctx.commands(), [Command::SetVelocity(Vec3::ZERO)]);
    }

    #[test]
    fn chase_fails_without_body_or_goal() {
        let (mut ctx, _) = ctx_at(Vec3::ZERO, Vec3::X);
        let mut roam = Chase::new(ChaseGoal::Roam, 2.0, 1.0);
        assert_eq!(roam.process(&mut ctx), Status::Failure);

        ctx.body = None;
        let mut hunt = Chase::new(ChaseGoal::Target, 2.0, 1.0);
        assert_eq!(hunt.process(&mut ctx), Status::Failure);
    }

    #[test]
    fn chase_aborts_when_target_is_lost() {
        let (mut ctx, _) = ctx_at(Vec3::ZERO, Vec3::new(0.0, 0.0, 8.0));
        let sight = Sight::new(10.0, 90.0);
        let mut hunt = Chase::new(ChaseGoal::Target, 5.0, 1.0).with_abort(Abort::WhenLost(sight));

        ctx.clear_line_to_target = true;
        assert_eq!(hunt.process(&mut ctx), Status::Running);

        ctx.target = Some(Vec3::new(0.0, 0.0, 9.0));
        ctx.clear_line_to_target = false;
        assert_eq!(hunt.process(&mut ctx), Status::Failure);
        assert_eq!(ctx.memory.last_known, Some(Vec3::new(0.0, 0.0, 9.0)));
    }

    #[test]
    fn jump_waits_for_ground_then_lands() {
        let (mut ctx, _) = ctx_at(Vec3::ZERO, Vec3::new(6.0, 0.0, 0.0));
        let mut jump = JumpOnTarget::from_secs_f32(1.0);

        ctx.body = Some(Body {
            grounded: false,
            ..Body::at(Vec3::ZERO)
        });
        assert_eq!(jump.process(&mut ctx), Status::Running);
        assert!(!jump.has_jumped());
        assert!(ctx.commands().is_empty());

        ctx.body = Some(Body::at(Vec3::ZERO));
        assert_eq!(jump.process(&mut ctx), Status::Running);
        assert!(jump.has_jumped());
        let Some(Command::AddVelocity(launch)) = ctx.commands().last().cloned() else {
            panic!("expected a velocity change, got {:?}", ctx.commands());
        };
        assert!((launch.x - 6.0).abs() < 1e-4);
        assert!((launch.y - 4.905).abs() < 1e-3);

        // Airborne and rising.
        ctx.body = Some(Body {
            velocity: Vec3::new(6.0, 3.0, 0.0),
            grounded: false,
            ..Body::at(Vec3::new(2.0, 1.5, 0.0))
        });
        assert_eq!(jump.process(&mut ctx), Status::Running);

        ctx.body = Some(Body::at(Vec3::new(6.0, 0.0, 0.0)));
        assert_eq!(jump.process(&mut ctx), Status::Success);

        jump.reset(&mut ctx);
        assert!(!jump.has_jumped());
    }

    #[test]
    fn throw_spawns_projectile_above_thrower() {
        let (mut ctx, _) = ctx_at(Vec3::ZERO, Vec3::new(20.0, 0.0, 0.0));
        let config = ProjectileConfig::default();
        let mut throw = ThrowProjectile::new(&config);

        assert_eq!(throw.process(&mut ctx), Status::Success);
        let [Command::SpawnProjectile { origin, velocity, lifetime }] = ctx.commands() else {
            panic!("expected one projectile, got {:?}", ctx.commands());
        };
        assert_eq!(*origin, Vec3::new(0.0, config.spawn_height, 0.0));
        assert!(velocity.x > 0.0 && velocity.y > 0.0);
        assert_eq!(*lifetime, config.lifetime());
    }

    #[test]
    fn pick_roam_point_sets_memory() {
        let (mut ctx, _) = ctx_at(Vec3::ZERO, Vec3::X);
        assert!(ctx.memory.roam_point.is_none());
        assert_eq!(PickRoamPoint::new(5.0).process(&mut ctx), Status::Success);
        assert!(ctx.memory.roam_point.is_some());
    }

    #[test]
    fn animation_wait_clamps_bad_durations() {
        let (mut ctx, mut clock) = ctx_at(Vec3::ZERO, Vec3::X);
        for secs in [-1.0, f32::NAN] {
            let mut anim = AnimationWait::from_secs_f32("PunchLeft", secs);
            step(&mut ctx, &mut clock);
            assert_eq!(anim.process(&mut ctx), Status::Running);
            step(&mut ctx, &mut clock);
            assert_eq!(anim.process(&mut ctx), Status::Success);
        }
    }

    #[test]
    fn chasing_target_drops_breadcrumbs_at_interval() {
        let (mut ctx, mut clock) = ctx_at(Vec3::ZERO, Vec3::new(0.0, 0.0, 50.0));
        let mut hunt =
            Chase::new(ChaseGoal::Target, 5.0, 1.0).with_trail(Duration::from_millis(250), 20);

        for i in 0..10 {
            step(&mut ctx, &mut clock);
            ctx.body = Some(Body::at(Vec3::new(0.0, 0.0, i as f32)));
            assert_eq!(hunt.process(&mut ctx), Status::Running);
        }

        // Ticks at 100 ms; a breadcrumb every third tick.
        let crumbs: Vec<f32> = ctx.memory.breadcrumbs().iter().map(|p| p.z).collect();
        assert_eq!(crumbs, [0.0, 3.0, 6.0, 9.0]);

        let mut roam = Chase::new(ChaseGoal::Roam, 2.0, 1.0).with_trail(Duration::ZERO, 20);
        ctx.memory.roam_point = Some(Vec3::new(5.0, 0.0, 0.0));
        roam.process(&mut ctx);
        assert_eq!(ctx.memory.breadcrumbs().len(), 4);
    }

    #[test]
    fn search_point_needs_last_known_position() {
        let (mut ctx, _) = ctx_at(Vec3::ZERO, Vec3::X);
        let mut pick = PickSearchPoint::new(5.0);
        assert_eq!(pick.process(&mut ctx), Status::Failure);

        let last_known = Vec3::new(10.0, 0.0, 10.0);
        ctx.memory.last_known = Some(last_known);
        assert_eq!(pick.process(&mut ctx), Status::Success);
        let point = ctx.memory.search_point.unwrap();
        assert!(point.distance(last_known) <= 5.0 + 1e-4);
    }

    #[test]
    fn next_breadcrumb_walks_trail_backwards() {
        let (mut ctx, _) = ctx_at(Vec3::ZERO, Vec3::X);
        let interval = Duration::ZERO;
        ctx.memory.drop_breadcrumb(Vec3::X, Duration::ZERO, interval, 20);
        ctx.memory.drop_breadcrumb(Vec3::Z, Duration::from_secs(1), interval, 20);

        let mut next = NextBreadcrumb;
        assert_eq!(next.process(&mut ctx), Status::Success);
        assert_eq!(ctx.memory.search_point, Some(Vec3::Z));
        assert_eq!(next.process(&mut ctx), Status::Success);
        assert_eq!(ctx.memory.search_point, Some(Vec3::X));
        assert_eq!(next.process(&mut ctx), Status::Failure);
    }
}
