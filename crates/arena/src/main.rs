//! Headless arena binary.
//!
//! Spawns one rock boss and a pack of wolves into an [`ArenaWorld`], walks the
//! player around the boss and drives every agent at the configured tick rate.
//!
//! # Examples
//!
//! ```bash
//! # Defaults: 60 Hz, 30 seconds, three wolves
//! cargo run -p arena
//!
//! # Custom tunables, more wolves, node-level logs
//! cargo run -p arena -- --config ai.toml --wolves 6 --log behavior_tree=trace
//! ```

use std::f32::consts::TAU;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use behavior_tree::{Clock, FrameClock, tick_duration};
use clap::Parser;
use glam::Vec3;
use npc_ai::{AgentController, AgentKind, AiConfig, ArenaWorld, ConfigLoader, World};
use tracing_subscriber::EnvFilter;

/// Headless NPC arena
#[derive(Parser, Debug)]
#[command(name = "arena")]
#[command(about = "Run NPC behavior trees in a headless arena", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML file with AI tunables (defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate (default: 30 seconds worth)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Number of wolves around the boss
    #[arg(short, long, default_value_t = 3)]
    wolves: u32,

    /// Seed override (defaults to `sim.seed` from the config)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log filter directive, e.g. `debug` or `npc_ai=trace`
    #[arg(long)]
    log: Option<String>,

    /// Let the boss throw rocks and run to throwing range
    #[arg(long)]
    ranged: bool,
}

/// Mean distance of the player from the boss.
const PLAYER_ORBIT: f32 = 12.0;
/// How far the player weaves in and out of the mean orbit.
const PLAYER_WEAVE: f32 = 5.0;
/// Seconds per full lap of the player.
const PLAYER_LAP_SECS: f32 = 20.0;
/// Distance of the wolf dens from the boss.
const DEN_RADIUS: f32 = 30.0;

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AiConfig::default(),
    };
    if cli.ranged {
        config.boss.enable_ranged = true;
    }
    let seed = cli.seed.unwrap_or(config.sim.seed);
    let dt = tick_duration(config.sim.tick_hz);
    let ticks = cli
        .ticks
        .unwrap_or(u64::from(config.sim.tick_hz) * 30);

    tracing::info!(
        "Starting arena: {} Hz, {} ticks, {} wolves, seed {}",
        config.sim.tick_hz,
        ticks,
        cli.wolves,
        seed
    );

    let mut world = ArenaWorld::new(config.sim.gravity);
    let mut agents = spawn_agents(&mut world, &config, cli.wolves, seed)?;

    let mut clock = FrameClock::new();
    for tick in 0..ticks {
        clock.advance(dt);
        world.set_target(Some(player_position(clock.now().as_secs_f32())));

        for agent in &mut agents {
            agent.update(&mut world, &clock);
        }
        world.step(dt);

        if tick % (u64::from(config.sim.tick_hz) * 5) == 0 {
            tracing::debug!(
                "t={:.1}s: {} projectiles in flight",
                clock.now().as_secs_f32(),
                world.projectiles().len()
            );
        }
    }

    summarize(&world, &agents, clock.now().as_secs_f32());
    Ok(())
}

fn setup_logging(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter `{directive}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}

fn spawn_agents(
    world: &mut ArenaWorld,
    config: &AiConfig,
    wolves: u32,
    seed: u64,
) -> Result<Vec<AgentController>> {
    let mut agents = Vec::with_capacity(wolves as usize + 1);

    let boss_blueprint = AgentKind::RockBoss.blueprint(config);
    let boss = world.spawn(Vec3::ZERO, true);
    agents.push(
        AgentController::spawn(&*world, boss, AgentKind::RockBoss, config, boss_blueprint, seed)
            .context("spawning the boss")?,
    );

    let wolf_blueprint = AgentKind::Wolf.blueprint(config);
    for i in 0..wolves {
        let angle = TAU * i as f32 / wolves.max(1) as f32;
        let den = Vec3::new(angle.cos(), 0.0, angle.sin()) * DEN_RADIUS;
        let wolf = world.spawn(den, false);
        agents.push(
            AgentController::spawn(
                &*world,
                wolf,
                AgentKind::Wolf,
                config,
                Arc::clone(&wolf_blueprint),
                seed.wrapping_add(u64::from(i) + 1),
            )
            .with_context(|| format!("spawning wolf {i}"))?,
        );
    }

    Ok(agents)
}

/// The player circles the boss, weaving in and out of its proximity range.
fn player_position(secs: f32) -> Vec3 {
    let angle = TAU * secs / PLAYER_LAP_SECS;
    let radius = PLAYER_ORBIT + PLAYER_WEAVE * (3.0 * angle).sin();
    Vec3::new(angle.cos(), 0.0, angle.sin()) * radius
}

fn summarize(world: &ArenaWorld, agents: &[AgentController], secs: f32) {
    tracing::info!("Arena finished after {:.1}s", secs);
    for agent in agents {
        let id = agent.agent();
        let position = world.body(id).map(|body| body.position).unwrap_or_default();
        tracing::info!(
            "{} {}: phase={}, ticks={}, at={:.1}, path={:?}, triggers={}",
            id,
            agent.kind(),
            agent.phase(),
            agent.tree().ticks(),
            position,
            agent.tree().active_path(),
            world.triggers(id).len(),
        );
    }
    tracing::info!("Projectiles thrown: {}", world.projectiles_spawned());
}
