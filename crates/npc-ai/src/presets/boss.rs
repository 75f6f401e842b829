//! Rock boss: melee punches, a guarded leap and optional ranged play.

use behavior_tree::NodeSpec;
use behavior_tree::builder::{
    action, guarded_sequence, leaf, priority_selector, random_selector, selector, sequence, wait,
};

use crate::config::BossConfig;
use crate::context::AgentContext;
use crate::nodes::{
    AnimationWait, Chase, ChaseGoal, JumpOnTarget, TargetBeyond, TargetWithin, ThrowProjectile,
};

/// Builds the rock boss tree.
///
/// # Behavior
///
/// 1. **Attacks** (priority 5): a random punch when the target is in melee
///    range, otherwise a rock throw when ranged play is enabled
/// 2. **Move** (priority 1): leap onto the target, or run to throwing range
///    when ranged play is enabled
///
/// Procedural look is disabled for the whole leap and restored however the
/// leap ends.
pub fn rock_boss(config: &BossConfig) -> NodeSpec<AgentContext> {
    let mut attacks = selector("Attacks", vec![physical_hits(config)]).with_priority(5);
    let mut movement = random_selector("Move", vec![leap_melee(config)]).with_priority(1);

    if config.enable_ranged {
        attacks.add_child(ranged_attack(config));
        movement.add_child(run_ranged(config));
    }

    priority_selector("Main", vec![attacks, movement])
}

fn physical_hits(config: &BossConfig) -> NodeSpec<AgentContext> {
    random_selector(
        "PhysicalHits",
        vec![
            punch("LeftPunch", "PunchLeft", config),
            punch("RightPunch", "PunchRight", config),
        ],
    )
}

fn punch(name: &str, trigger: &'static str, config: &BossConfig) -> NodeSpec<AgentContext> {
    let range = config.melee_range;
    let secs = config.punch_secs;
    sequence(
        name,
        vec![
            leaf("CanMeleeTarget", move || TargetWithin { range }),
            leaf("Punch", move || AnimationWait::from_secs_f32(trigger, secs)),
        ],
    )
}

fn ranged_attack(config: &BossConfig) -> NodeSpec<AgentContext> {
    let range = config.ranged_range;
    let secs = config.throw_secs;
    let projectile = config.projectile.clone();
    sequence(
        "RangedAttack",
        vec![
            leaf("CanThrow", move || TargetWithin { range }),
            leaf("ThrowRock", move || AnimationWait::from_secs_f32("ThrowRock", secs)),
            leaf("Release", move || ThrowProjectile::new(&projectile)),
        ],
    )
}

fn leap_melee(config: &BossConfig) -> NodeSpec<AgentContext> {
    let range = config.melee_range - 1.0;
    let windup = config.jump_windup_secs;
    let flight = config.jump_flight_secs;

    guarded_sequence(
        "LeapMelee",
        |ctx: &mut AgentContext| ctx.set_procedural_look(false),
        |ctx: &mut AgentContext| ctx.set_procedural_look(true),
        vec![
            leaf("OutOfMeleeRange", move || TargetBeyond { range }),
            leaf("StartJumpingAnim", move || AnimationWait::from_secs_f32("JumpSlam", windup)),
            leaf("MoveToMelee", move || JumpOnTarget::from_secs_f32(flight)),
            wait("WaitForJump", config.jump_recovery()),
        ],
    )
}

fn run_ranged(config: &BossConfig) -> NodeSpec<AgentContext> {
    let range = config.ranged_range - 1.0;
    let speed = config.run_speed;

    sequence(
        "RunRanged",
        vec![
            leaf("OutOfThrowRange", move || TargetBeyond { range }),
            action("StartWalkingAnim", |ctx: &mut AgentContext| ctx.trigger("Walking")),
            leaf("MoveToRanged", move || Chase::new(ChaseGoal::Target, speed, range)),
            action("StopWalkingAnim", |ctx: &mut AgentContext| ctx.trigger("NotWalking")),
        ],
    )
}
