//! Per-agent blackboard handed to every strategy.
//!
//! The [`AgentContext`] is owned by the agent's controller and lives as long
//! as the agent. Each frame follows the same cycle:
//!
//! 1. **Sense**: [`AgentContext::sense`] refreshes the body, target and
//!    line-of-sight snapshot from the [`World`] and advances the clock
//! 2. **Think**: the behavior tree is ticked with `&mut AgentContext`;
//!    strategies read the snapshot and queue [`Command`]s
//! 3. **Act**: the controller drains the queue into the world
//!
//! Strategies therefore never hold references into the world, and a
//! despawned body simply shows up as `body == None` on the next tick.

use std::f32::consts::TAU;
use std::time::Duration;

use behavior_tree::{Clock, FrameClock};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::world::{AgentId, Body, Command, World};

/// State an agent keeps between ticks.
#[derive(Debug, Clone)]
pub struct Memory {
    /// Where the target was last seen.
    pub last_known: Option<Vec3>,
    /// Current wander destination.
    pub roam_point: Option<Vec3>,
    /// Current search destination.
    pub search_point: Option<Vec3>,
    /// Centre of the roaming area.
    pub home: Vec3,
    /// Own positions dropped while chasing, oldest first.
    breadcrumbs: Vec<Vec3>,
    last_breadcrumb_at: Option<Duration>,
    rng: ChaCha8Rng,
}

impl Memory {
    pub fn new(home: Vec3, seed: u64) -> Self {
        Self {
            last_known: None,
            roam_point: None,
            search_point: None,
            home,
            breadcrumbs: Vec::new(),
            last_breadcrumb_at: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform random point on the ground disc of `radius` around home.
    pub fn random_roam_point(&mut self, radius: f32) -> Vec3 {
        self.random_point_around(self.home, radius)
    }

    /// Uniform random point on the ground disc of `radius` around `center`.
    pub fn random_point_around(&mut self, center: Vec3, radius: f32) -> Vec3 {
        let distance = radius * self.rng.gen_range(0.0_f32..1.0).sqrt();
        let angle = self.rng.gen_range(0.0..TAU);
        center + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance)
    }

    pub fn breadcrumbs(&self) -> &[Vec3] {
        &self.breadcrumbs
    }

    /// Records `position` unless the previous breadcrumb is younger than
    /// `interval`.
    ///
    /// Once more than `capacity` breadcrumbs are held, only the most recent
    /// `capacity / 2` are kept. Returns whether a breadcrumb was dropped.
    pub fn drop_breadcrumb(
        &mut self,
        position: Vec3,
        now: Duration,
        interval: Duration,
        capacity: usize,
    ) -> bool {
        if let Some(last) = self.last_breadcrumb_at {
            if now.saturating_sub(last) < interval {
                return false;
            }
        }

        self.breadcrumbs.push(position);
        self.last_breadcrumb_at = Some(now);
        if self.breadcrumbs.len() > capacity {
            let excess = self.breadcrumbs.len() - capacity / 2;
            self.breadcrumbs.drain(..excess);
        }
        true
    }

    /// Takes the most recent breadcrumb.
    pub fn pop_breadcrumb(&mut self) -> Option<Vec3> {
        self.breadcrumbs.pop()
    }

    /// Drops everything learned about the target.
    pub fn forget_target(&mut self) {
        self.last_known = None;
        self.search_point = None;
        self.breadcrumbs.clear();
        self.last_breadcrumb_at = None;
    }
}

/// Context for behavior tree decisions of one agent.
#[derive(Debug)]
pub struct AgentContext {
    agent: AgentId,
    clock: FrameClock,

    /// Body snapshot taken at the start of the tick.
    pub body: Option<Body>,
    /// Target position taken at the start of the tick.
    pub target: Option<Vec3>,
    /// Whether the segment from body to target was clear.
    pub clear_line_to_target: bool,
    pub has_animator: bool,
    pub gravity: Vec3,
    pub memory: Memory,

    commands: Vec<Command>,
}

impl AgentContext {
    /// Creates a context with an empty snapshot.
    ///
    /// # Arguments
    ///
    /// * `agent` - The agent this context belongs to
    /// * `home` - Centre of the agent's roaming area
    /// * `seed` - Seed for the agent's private random source
    pub fn new(agent: AgentId, home: Vec3, seed: u64) -> Self {
        Self {
            agent,
            clock: FrameClock::new(),
            body: None,
            target: None,
            clear_line_to_target: false,
            has_animator: false,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            memory: Memory::new(home, seed),
            commands: Vec::new(),
        }
    }

    /// Refreshes the snapshot for a new tick.
    pub fn sense<W: World + ?Sized>(&mut self, world: &W, clock: &FrameClock) {
        self.clock = *clock;
        self.body = world.body(self.agent);
        self.target = world.target();
        self.has_animator = world.has_animator(self.agent);
        self.gravity = world.gravity();
        self.clear_line_to_target = match (self.body, self.target) {
            (Some(body), Some(target)) => world.line_of_sight(body.position, target),
            _ => false,
        };
    }

    #[cfg(test)]
    pub(crate) fn set_clock(&mut self, clock: FrameClock) {
        self.clock = clock;
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Commands queued since the last drain.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn drain_commands(&mut self) -> std::vec::Drain<'_, Command> {
        self.commands.drain(..)
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.push(Command::SetVelocity(velocity));
    }

    pub fn add_velocity(&mut self, delta: Vec3) {
        self.push(Command::AddVelocity(delta));
    }

    pub fn trigger(&mut self, name: &str) {
        self.push(Command::SetAnimTrigger(name.to_owned()));
    }

    pub fn reset_trigger(&mut self, name: &str) {
        self.push(Command::ResetAnimTrigger(name.to_owned()));
    }

    pub fn set_procedural_look(&mut self, enabled: bool) {
        self.push(Command::SetProceduralLook(enabled));
    }

    pub fn spawn_projectile(&mut self, origin: Vec3, velocity: Vec3, lifetime: Duration) {
        self.push(Command::SpawnProjectile {
            origin,
            velocity,
            lifetime,
        });
    }

    // ========================================================================
    // Spatial helpers
    // ========================================================================

    /// Straight-line distance from the body to the target.
    pub fn distance_to_target(&self) -> Option<f32> {
        let body = self.body?;
        let target = self.target?;
        Some(body.position.distance(target))
    }

    /// Unsigned angle in degrees between the body's forward and the target,
    /// measured on the ground plane.
    pub fn angle_to_target(&self) -> Option<f32> {
        let body = self.body?;
        let target = self.target?;
        let forward = flatten(body.forward);
        let towards = flatten(target - body.position);
        if forward.length_squared() < f32::EPSILON || towards.length_squared() < f32::EPSILON {
            return Some(0.0);
        }
        Some(forward.angle_between(towards).to_degrees())
    }

    pub fn target_within(&self, range: f32) -> bool {
        self.distance_to_target().is_some_and(|d| d <= range)
    }

    pub fn target_beyond(&self, range: f32) -> bool {
        self.distance_to_target().is_some_and(|d| d > range)
    }

    /// Within `radius`, inside the field of view and not blocked.
    pub fn can_see_target(&self, radius: f32, field_of_view_deg: f32) -> bool {
        self.target_within(radius)
            && self
                .angle_to_target()
                .is_some_and(|angle| angle < field_of_view_deg * 0.5)
            && self.clear_line_to_target
    }
}

impl Clock for AgentContext {
    fn now(&self) -> Duration {
        self.clock.now()
    }

    fn delta(&self) -> Duration {
        self.clock.delta()
    }
}

/// Projects a vector onto the ground plane.
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
