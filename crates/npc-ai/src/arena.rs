//! Headless [`World`] used by tests and the arena binary.
//!
//! Bodies are points standing on the ground plane `y = 0`. Each
//! [`ArenaWorld::step`] integrates velocities with explicit Euler, applies
//! gravity to airborne bodies and lands them back on the ground. Obstacles are
//! spheres that block line of sight. Animators only record the triggers they
//! receive.

use std::collections::BTreeMap;
use std::time::Duration;

use glam::Vec3;

use crate::context::flatten;
use crate::world::{AgentId, Body, Command, World};

/// Bodies closer to the ground than this count as standing on it.
const GROUND_EPSILON: f32 = 1e-3;

/// Sphere that blocks line of sight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub center: Vec3,
    pub radius: f32,
}

impl Obstacle {
    /// Whether the segment `from → to` passes through the sphere.
    pub fn blocks(&self, from: Vec3, to: Vec3) -> bool {
        let segment = to - from;
        let length_squared = segment.length_squared();
        let t = if length_squared > f32::EPSILON {
            ((self.center - from).dot(segment) / length_squared).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let closest = from + segment * t;
        closest.distance_squared(self.center) < self.radius * self.radius
    }
}

/// Projectile in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub owner: AgentId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub remaining: Duration,
}

#[derive(Debug, Clone)]
struct ArenaAgent {
    body: Option<Body>,
    animator: bool,
    procedural_look: bool,
    triggers: Vec<String>,
}

/// A flat arena with point bodies, obstacles and projectiles.
#[derive(Debug, Clone)]
pub struct ArenaWorld {
    gravity: Vec3,
    agents: BTreeMap<AgentId, ArenaAgent>,
    next_id: u32,
    target: Option<Vec3>,
    obstacles: Vec<Obstacle>,
    projectiles: Vec<Projectile>,
    projectiles_spawned: usize,
}

impl ArenaWorld {
    /// Creates an empty arena with vertical gravity `gravity` (negative is
    /// down).
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity: Vec3::new(0.0, gravity, 0.0),
            agents: BTreeMap::new(),
            next_id: 1,
            target: None,
            obstacles: Vec::new(),
            projectiles: Vec::new(),
            projectiles_spawned: 0,
        }
    }

    /// Adds a grounded body at `position` (projected onto the ground).
    pub fn spawn(&mut self, position: Vec3, with_animator: bool) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        self.agents.insert(
            id,
            ArenaAgent {
                body: Some(Body::at(flatten(position))),
                animator: with_animator,
                procedural_look: true,
                triggers: Vec::new(),
            },
        );
        tracing::debug!("arena: spawned {} at {}", id, position);
        id
    }

    /// Removes the body but keeps the agent known to the world.
    pub fn despawn_body(&mut self, agent: AgentId) {
        if let Some(entry) = self.agents.get_mut(&agent) {
            entry.body = None;
        }
    }

    pub fn set_target(&mut self, target: Option<Vec3>) {
        self.target = target;
    }

    pub fn add_obstacle(&mut self, center: Vec3, radius: f32) {
        self.obstacles.push(Obstacle { center, radius });
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Projectiles spawned since creation, including expired ones.
    pub fn projectiles_spawned(&self) -> usize {
        self.projectiles_spawned
    }

    /// Every trigger the agent's animator received, in order.
    pub fn triggers(&self, agent: AgentId) -> &[String] {
        self.agents
            .get(&agent)
            .map(|entry| entry.triggers.as_slice())
            .unwrap_or_default()
    }

    pub fn trigger_count(&self, agent: AgentId, name: &str) -> usize {
        self.triggers(agent).iter().filter(|t| *t == name).count()
    }

    pub fn procedural_look(&self, agent: AgentId) -> Option<bool> {
        self.agents.get(&agent).map(|entry| entry.procedural_look)
    }

    pub fn agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents.keys().copied()
    }

    /// Advances bodies and projectiles by `dt`.
    pub fn step(&mut self, dt: Duration) {
        let secs = dt.as_secs_f32();

        for entry in self.agents.values_mut() {
            if let Some(body) = entry.body.as_mut() {
                integrate(body, self.gravity, secs);
            }
        }

        for projectile in &mut self.projectiles {
            projectile.velocity += self.gravity * secs;
            projectile.position += projectile.velocity * secs;
            projectile.remaining = projectile.remaining.saturating_sub(dt);
        }
        self.projectiles.retain(|p| !p.remaining.is_zero());
    }
}

fn integrate(body: &mut Body, gravity: Vec3, secs: f32) {
    if !body.grounded || body.velocity.y > 0.0 {
        body.velocity += gravity * secs;
    }
    body.position += body.velocity * secs;

    if body.position.y <= GROUND_EPSILON && body.velocity.y <= 0.0 {
        body.position.y = 0.0;
        body.velocity.y = 0.0;
        body.grounded = true;
    } else {
        body.grounded = false;
    }

    let planar = flatten(body.velocity);
    if planar.length_squared() > f32::EPSILON {
        body.forward = planar.normalize();
    }
}

impl World for ArenaWorld {
    fn contains(&self, agent: AgentId) -> bool {
        self.agents.contains_key(&agent)
    }

    fn body(&self, agent: AgentId) -> Option<Body> {
        self.agents.get(&agent).and_then(|entry| entry.body)
    }

    fn target(&self) -> Option<Vec3> {
        self.target
    }

    fn line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        !self.obstacles.iter().any(|o| o.blocks(from, to))
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn has_animator(&self, agent: AgentId) -> bool {
        self.agents.get(&agent).is_some_and(|entry| entry.animator)
    }

    fn apply(&mut self, agent: AgentId, command: Command) {
        let Some(entry) = self.agents.get_mut(&agent) else {
            tracing::warn!("arena: command for unknown {}", agent);
            return;
        };

        match command {
            Command::SetVelocity(velocity) => {
                if let Some(body) = entry.body.as_mut() {
                    body.velocity = velocity;
                }
            }
            Command::AddVelocity(delta) => {
                if let Some(body) = entry.body.as_mut() {
                    body.velocity += delta;
                }
            }
            Command::SetAnimTrigger(name) => entry.triggers.push(name),
            Command::ResetAnimTrigger(name) => {
                tracing::trace!("arena: {} reset trigger '{}'", agent, name);
            }
            Command::SetProceduralLook(enabled) => entry.procedural_look = enabled,
            Command::SpawnProjectile {
                origin,
                velocity,
                lifetime,
            } => {
                self.projectiles_spawned += 1;
                self.projectiles.push(Projectile {
                    owner: agent,
                    position: origin,
                    velocity,
                    remaining: lifetime,
                });
            }
        }
    }
}
