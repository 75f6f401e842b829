//! Game-specific behavior tree strategies.
//!
//! Everything here is processed against an [`crate::AgentContext`]. Nodes are
//! divided into:
//!
//! - `conditions`: check the sensed snapshot (return Success/Failure)
//! - `actions`: queue motion, animation and projectile commands

pub mod actions;
pub mod conditions;

pub use actions::*;
pub use conditions::*;
