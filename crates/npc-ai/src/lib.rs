//! Game-side agent layer for the behavior-tree engine.
//!
//! This crate turns generic behavior trees into NPCs: it defines what an
//! agent can see and do, ships the strategies and presets used by the game,
//! and drives each agent once per frame.
//!
//! Modules are organized by responsibility:
//! - [`world`] is the seam to physics and animation
//! - [`context`] holds the per-agent blackboard strategies run against
//! - [`nodes`] provides condition and action strategies
//! - [`ballistics`] solves jump and throw trajectories
//! - [`presets`] builds the rock boss and wolf trees
//! - [`controller`] runs the sense, think, act cycle and the boss wake-up
//! - [`config`] and [`error`] cover loading tunables and setup failures
//! - [`arena`] is a headless world for tests and demos
pub mod arena;
pub mod ballistics;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod nodes;
pub mod presets;
pub mod world;

pub use arena::{ArenaWorld, Obstacle, Projectile};
pub use config::{AiConfig, BossConfig, ConfigLoader, ProjectileConfig, SimConfig, WolfConfig};
pub use context::{AgentContext, Memory};
pub use controller::{AgentController, Phase};
pub use error::{AgentError, ConfigError, Result};
pub use presets::AgentKind;
pub use world::{AgentId, Body, Command, World};
