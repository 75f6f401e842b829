//! Per-agent driver: sense, think, act.
//!
//! An [`AgentController`] owns one agent's [`AgentContext`] and its own
//! [`BehaviorTree`] instance. The driving loop calls [`AgentController::update`]
//! once per frame after advancing the shared [`FrameClock`].
//!
//! Bosses do not think straight away. They sleep until the target comes close,
//! play a wake-up animation and only then start ticking their tree:
//!
//! ```text
//! Dormant ──target within proximity──▶ Waking ──wake duration──▶ Active
//! ```

use std::sync::Arc;
use std::time::Duration;

use behavior_tree::{BehaviorTree, Blueprint, Clock, FrameClock, Status};

use crate::config::{AiConfig, BossConfig};
use crate::context::AgentContext;
use crate::error::{AgentError, Result};
use crate::presets::AgentKind;
use crate::world::{AgentId, World};

/// Lifecycle of a controlled agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Phase {
    /// Asleep until the target comes within proximity distance.
    Dormant,
    /// Playing the wake-up animation.
    Waking {
        since: Duration,
        look_restored: bool,
    },
    /// Thinking every frame, subject to the notice distance.
    Active,
}

/// Wake-up gate of a boss.
#[derive(Debug, Clone)]
struct WakeGate {
    proximity_distance: f32,
    notice_distance: f32,
    trigger: String,
    look_delay: Duration,
    duration: Duration,
}

impl From<&BossConfig> for WakeGate {
    fn from(config: &BossConfig) -> Self {
        Self {
            proximity_distance: config.proximity_distance,
            notice_distance: config.notice_distance,
            trigger: config.wake_trigger.clone(),
            look_delay: config.wake_look_delay(),
            duration: config.wake_duration(),
        }
    }
}

/// Drives one agent.
#[derive(Debug)]
pub struct AgentController {
    kind: AgentKind,
    phase: Phase,
    gate: Option<WakeGate>,
    interacting: bool,
    ctx: AgentContext,
    tree: BehaviorTree<AgentContext>,
}

impl AgentController {
    /// Attaches a controller to an agent that already has a body in `world`.
    ///
    /// The body's spawn position becomes the agent's home. `seed` drives both
    /// the tree's random selectors and the agent's roam points.
    ///
    /// # Errors
    ///
    /// - [`AgentError::Config`] if `config` does not validate
    /// - [`AgentError::UnknownAgent`] if the world does not know `agent`
    /// - [`AgentError::MissingBody`] if the agent has no body to drive
    pub fn spawn<W: World + ?Sized>(
        world: &W,
        agent: AgentId,
        kind: AgentKind,
        config: &AiConfig,
        blueprint: Arc<Blueprint<AgentContext>>,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        if !world.contains(agent) {
            return Err(AgentError::UnknownAgent(agent));
        }
        let body = world.body(agent).ok_or(AgentError::MissingBody(agent))?;

        let (phase, gate) = match kind {
            AgentKind::RockBoss => (Phase::Dormant, Some(WakeGate::from(&config.boss))),
            AgentKind::Wolf => (Phase::Active, None),
        };

        tracing::info!(
            "{}: spawned {} at {} ({})",
            agent,
            kind,
            body.position,
            phase
        );

        Ok(Self {
            kind,
            phase,
            gate,
            interacting: false,
            ctx: AgentContext::new(agent, body.position, seed.rotate_left(32)),
            tree: blueprint.instantiate(seed),
        })
    }

    /// Runs one frame for this agent.
    ///
    /// Returns what the tree's root child reported, or `None` if the tree was
    /// not ticked this frame (dormant, waking, out of notice range or
    /// interacting). A dormant agent does not wake while interacting.
    pub fn update<W: World + ?Sized>(&mut self, world: &mut W, clock: &FrameClock) -> Option<Status> {
        self.ctx.sense(&*world, clock);

        let status = match self.phase {
            Phase::Dormant if self.interacting => None,
            Phase::Dormant => {
                self.try_wake(clock.now());
                None
            }
            Phase::Waking {
                since,
                look_restored,
            } => {
                self.wake_step(clock.now().saturating_sub(since), look_restored);
                None
            }
            Phase::Active if self.should_think() => {
                self.tree.tick(&mut self.ctx);
                self.tree.last_status()
            }
            Phase::Active => None,
        };

        self.flush(world);
        status
    }

    /// Forces the tree back to its initial state and applies whatever the
    /// unwinding queued (trigger resets, guarded cleanups).
    pub fn reset<W: World + ?Sized>(&mut self, world: &mut W) {
        self.tree.reset(&mut self.ctx);
        self.flush(world);
    }

    /// Pauses thinking while the player is talking to or otherwise
    /// interacting with this agent.
    pub fn set_interacting(&mut self, interacting: bool) {
        if self.interacting != interacting {
            tracing::debug!("{}: interacting = {}", self.ctx.agent(), interacting);
        }
        self.interacting = interacting;
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    pub fn agent(&self) -> AgentId {
        self.ctx.agent()
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn context(&self) -> &AgentContext {
        &self.ctx
    }

    pub fn tree(&self) -> &BehaviorTree<AgentContext> {
        &self.tree
    }

    fn try_wake(&mut self, now: Duration) {
        let Some(gate) = &self.gate else {
            self.phase = Phase::Active;
            return;
        };
        if !self.ctx.target_within(gate.proximity_distance) {
            return;
        }

        tracing::info!("{}: target in proximity, waking up", self.ctx.agent());
        self.ctx.trigger(&gate.trigger);
        self.ctx.set_procedural_look(false);
        self.phase = Phase::Waking {
            since: now,
            look_restored: false,
        };
    }

    fn wake_step(&mut self, elapsed: Duration, mut look_restored: bool) {
        let Some(gate) = &self.gate else {
            self.phase = Phase::Active;
            return;
        };
        let (look_delay, duration) = (gate.look_delay, gate.duration);

        if !look_restored && elapsed >= look_delay {
            self.ctx.set_procedural_look(true);
            look_restored = true;
        }

        if elapsed >= duration {
            tracing::info!("{}: awake", self.ctx.agent());
            self.phase = Phase::Active;
        } else if let Phase::Waking { since, .. } = self.phase {
            self.phase = Phase::Waking {
                since,
                look_restored,
            };
        }
    }

    fn should_think(&self) -> bool {
        if self.interacting {
            return false;
        }
        match &self.gate {
            Some(gate) => self.ctx.target_within(gate.notice_distance),
            None => true,
        }
    }

    fn flush<W: World + ?Sized>(&mut self, world: &mut W) {
        let agent = self.ctx.agent();
        for command in self.ctx.drain_commands() {
            tracing::trace!("{}: apply {}", agent, <&'static str>::from(&command));
            world.apply(agent, command);
        }
    }
}
