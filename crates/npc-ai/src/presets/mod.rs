//! Complete trees for the built-in agent archetypes.
//!
//! ```text
//! rock_boss()                         wolf()
//!   └─ PrioritySelector Main            └─ Selector Wolf
//!       ├─ Attacks (5)                      ├─ Hunt
//!       │   ├─ PhysicalHits (random)        ├─ Search
//!       │   └─ RangedAttack?                └─ Roam
//!       └─ Move (1, random)
//!           ├─ LeapMelee (guarded)
//!           └─ RunRanged?
//! ```
//!
//! Branches marked `?` exist only when enabled in the configuration. A preset
//! is compiled once into a shared [`Blueprint`]; every agent instantiates its
//! own tree from it.

pub mod boss;
pub mod wolf;

use std::sync::Arc;

use behavior_tree::{Blueprint, NodeSpec};

use crate::config::AiConfig;
use crate::context::AgentContext;

pub use boss::rock_boss;
pub use wolf::wolf;

/// Built-in archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
pub enum AgentKind {
    RockBoss,
    Wolf,
}

impl AgentKind {
    /// Uncompiled tree for this archetype.
    pub fn spec(self, config: &AiConfig) -> NodeSpec<AgentContext> {
        match self {
            AgentKind::RockBoss => rock_boss(&config.boss),
            AgentKind::Wolf => wolf(&config.wolf),
        }
    }

    /// Compiled, shareable tree for this archetype.
    pub fn blueprint(self, config: &AiConfig) -> Arc<Blueprint<AgentContext>> {
        let blueprint = Blueprint::new(self.to_string(), self.spec(config));
        tracing::debug!("compiled {} blueprint with {} nodes", self, blueprint.len());
        Arc::new(blueprint)
    }
}
