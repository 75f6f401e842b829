//! The world as seen by agents.
//!
//! Physics, animation and rendering live outside this crate. Agents read a
//! [`Body`] snapshot and a handful of queries through [`World`], and change
//! the world only by queuing [`Command`]s that the controller applies after
//! the tree has been ticked.

use std::fmt;
use std::time::Duration;

use glam::Vec3;

/// Identifier of an agent (and its body) inside a [`World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Rigid-body state read at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Unit facing direction on the ground plane.
    pub forward: Vec3,
    pub grounded: bool,
}

impl Body {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            forward: Vec3::Z,
            grounded: true,
        }
    }
}

/// Side effect requested by a strategy.
#[derive(Debug, Clone, PartialEq, strum::IntoStaticStr)]
pub enum Command {
    /// Replace the body's linear velocity.
    SetVelocity(Vec3),
    /// Instant velocity change, added to the current velocity.
    AddVelocity(Vec3),
    SetAnimTrigger(String),
    ResetAnimTrigger(String),
    /// Enable or disable procedural head/body tracking of the target.
    SetProceduralLook(bool),
    SpawnProjectile {
        origin: Vec3,
        velocity: Vec3,
        lifetime: Duration,
    },
}

/// Queries and commands an agent needs from the simulation.
pub trait World {
    /// Whether the world knows `agent`, with or without a body.
    fn contains(&self, agent: AgentId) -> bool;

    /// Current body snapshot; `None` if the agent has no body.
    fn body(&self, agent: AgentId) -> Option<Body>;

    /// Position of the agent's target (the player), if there is one.
    fn target(&self) -> Option<Vec3>;

    /// Whether nothing blocks the straight segment between two points.
    fn line_of_sight(&self, from: Vec3, to: Vec3) -> bool;

    fn gravity(&self) -> Vec3;

    fn has_animator(&self, agent: AgentId) -> bool;

    /// Applies one queued command on behalf of `agent`.
    fn apply(&mut self, agent: AgentId, command: Command);
}
