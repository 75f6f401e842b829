//! Wolf behavior in the headless arena: roam, hunt, search.

use std::sync::Arc;
use std::time::Duration;

use behavior_tree::{FrameClock, tick_duration};
use glam::Vec3;
use npc_ai::context::flatten;
use npc_ai::{AgentController, AgentKind, AiConfig, ArenaWorld, World};

struct Pack {
    world: ArenaWorld,
    wolves: Vec<AgentController>,
    clock: FrameClock,
    dt: Duration,
}

impl Pack {
    fn new(config: &AiConfig, homes: &[Vec3], seed: u64) -> Self {
        let mut world = ArenaWorld::new(config.sim.gravity);
        let blueprint = AgentKind::Wolf.blueprint(config);

        let wolves = homes
            .iter()
            .enumerate()
            .map(|(i, &home)| {
                let agent = world.spawn(home, false);
                AgentController::spawn(
                    &world,
                    agent,
                    AgentKind::Wolf,
                    config,
                    Arc::clone(&blueprint),
                    seed + i as u64,
                )
                .unwrap()
            })
            .collect();

        Self {
            world,
            wolves,
            clock: FrameClock::new(),
            dt: tick_duration(config.sim.tick_hz),
        }
    }

    fn frame(&mut self) {
        self.clock.advance(self.dt);
        for wolf in &mut self.wolves {
            wolf.update(&mut self.world, &self.clock);
        }
        self.world.step(self.dt);
    }

    fn position(&self, index: usize) -> Vec3 {
        self.world.body(self.wolves[index].agent()).unwrap().position
    }

    fn branch(&self, index: usize) -> String {
        self.wolves[index]
            .tree()
            .active_path()
            .get(1)
            .map(|name| name.to_string())
            .unwrap_or_default()
    }
}

#[test]
fn wolves_share_one_blueprint() {
    let config = AiConfig::default();
    let pack = Pack::new(&config, &[Vec3::ZERO, Vec3::X * 30.0, Vec3::Z * 30.0], 1);

    let blueprint = pack.wolves[0].tree().blueprint();
    assert_eq!(Arc::strong_count(blueprint), 3);
    assert!(
        pack.wolves
            .iter()
            .all(|wolf| Arc::ptr_eq(wolf.tree().blueprint(), blueprint))
    );
}

#[test]
fn wolf_roams_around_home_without_target() {
    let config = AiConfig::default();
    let home = Vec3::new(5.0, 0.0, -5.0);
    let mut pack = Pack::new(&config, &[home], 3);

    let mut max_distance = 0.0_f32;
    for _ in 0..(20 * 60) {
        pack.frame();
        max_distance = max_distance.max(pack.position(0).distance(home));
        assert_ne!(pack.branch(0), "Search");
    }

    assert!(max_distance > 1.0, "wolf never left home");
    assert!(max_distance <= config.wolf.roam_distance + 0.5);
    assert!(pack.wolves[0].context().memory.last_known.is_none());
}

#[test]
fn roaming_is_reproducible_per_seed() {
    let config = AiConfig::default();
    let mut first = Pack::new(&config, &[Vec3::ZERO], 42);
    let mut second = Pack::new(&config, &[Vec3::ZERO], 42);

    for _ in 0..(10 * 60) {
        first.frame();
        second.frame();
    }
    assert_eq!(first.position(0), second.position(0));
}

#[test]
fn wolf_hunts_then_searches_behind_cover() {
    let mut config = AiConfig::default();
    config.wolf.investigate_radius = 0.5;
    let target = Vec3::new(0.0, 0.0, 6.0);
    let mut pack = Pack::new(&config, &[Vec3::ZERO], 5);
    pack.world.set_target(Some(target));

    // Facing +Z at spawn, so the target is in view straight away.
    for _ in 0..3 {
        pack.frame();
    }
    assert_eq!(pack.branch(0), "Hunt");
    assert_eq!(pack.wolves[0].context().memory.last_known, Some(target));
    let speed = flatten(pack.world.body(pack.wolves[0].agent()).unwrap().velocity).length();
    assert!((speed - config.wolf.run_speed).abs() < 1e-3);

    // Cover drops between wolf and target: the wolf runs to where it last
    // saw the target.
    pack.world.add_obstacle(Vec3::new(0.0, 0.0, 3.0), 1.0);
    pack.frame();
    assert_eq!(pack.branch(0), "Search");

    let mut branches = Vec::new();
    for _ in 0..(5 * 60) {
        pack.frame();
        branches.push(pack.branch(0));
    }

    let wolf = pack.position(0);
    assert!(
        flatten(target - wolf).length() <= config.wolf.stop_distance + 0.1,
        "wolf ended at {wolf}"
    );
    assert_eq!(branches.last().map(String::as_str), Some("Hunt"));
}

#[test]
fn lost_target_is_searched_along_the_trail() {
    let config = AiConfig::default();
    let mut pack = Pack::new(&config, &[Vec3::ZERO], 11);
    let mut target = Vec3::new(0.0, 0.0, 3.0);
    pack.world.set_target(Some(target));

    // The target runs away along +Z with the wolf on its heels.
    for _ in 0..(4 * 60) {
        target.z += 4.0 * pack.dt.as_secs_f32();
        pack.world.set_target(Some(target));
        pack.frame();
        assert_eq!(pack.branch(0), "Hunt");
    }
    let trail = pack.wolves[0].context().memory.breadcrumbs().to_vec();
    assert!(trail.len() >= 3, "only {} breadcrumbs", trail.len());
    assert!(trail.windows(2).all(|pair| pair[0].z < pair[1].z));

    pack.world.set_target(None);
    let mut closest = vec![f32::MAX; trail.len()];
    let mut forgotten = false;
    for _ in 0..(15 * 60) {
        pack.frame();
        let wolf = pack.position(0);
        for (best, crumb) in closest.iter_mut().zip(&trail) {
            *best = best.min(flatten(*crumb - wolf).length());
        }
        if pack.wolves[0].context().memory.last_known.is_none() {
            forgotten = true;
            break;
        }
    }
    assert!(forgotten, "wolf never gave up the search");

    for (crumb, distance) in trail.iter().zip(&closest) {
        assert!(
            *distance <= config.wolf.stop_distance + 0.2,
            "breadcrumb {crumb} missed by {distance}"
        );
    }
    let memory = &pack.wolves[0].context().memory;
    assert!(memory.breadcrumbs().is_empty());
    assert!(memory.search_point.is_none());

    for _ in 0..5 {
        pack.frame();
    }
    assert_eq!(pack.branch(0), "Roam");
}
