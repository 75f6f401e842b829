//! Wolf: hunt what it sees, search where it lost it, otherwise roam.

use behavior_tree::NodeSpec;
use behavior_tree::builder::{action, invertor, leaf, selector, sequence, until_fail, wait};

use crate::config::WolfConfig;
use crate::context::AgentContext;
use crate::nodes::{
    Abort, CanSeeTarget, Chase, ChaseGoal, NextBreadcrumb, PickRoamPoint, PickSearchPoint,
    RemembersTarget, Sight,
};

/// Builds the wolf tree.
///
/// # Behavior
///
/// 1. **Hunt**: target visible → remember it → run at it until it is lost,
///    dropping breadcrumbs on the way
/// 2. **Search**: run to a random point near the last known position, walk
///    the breadcrumbs back newest first, then forget the target
/// 3. **Roam**: walk to a random point around home and idle there
///
/// Searching and roaming give up as soon as the target comes into view.
pub fn wolf(config: &WolfConfig) -> NodeSpec<AgentContext> {
    let sight = Sight::new(config.notice_radius, config.field_of_view_deg);
    let stop = config.stop_distance;
    let run = config.run_speed;
    let search = config.run_speed * config.search_speed_multiplier;
    let wander = config.wander_speed;
    let roam_distance = config.roam_distance;
    let investigate_radius = config.investigate_radius;
    let (interval, capacity) = (config.breadcrumb_interval(), config.breadcrumb_capacity);

    selector(
        "Wolf",
        vec![
            sequence(
                "Hunt",
                vec![
                    leaf("CanSeeTarget", move || CanSeeTarget(sight)),
                    action("RememberTarget", |ctx: &mut AgentContext| {
                        ctx.memory.last_known = ctx.target;
                    }),
                    leaf("ChaseTarget", move || {
                        Chase::new(ChaseGoal::Target, run, stop)
                            .with_abort(Abort::WhenLost(sight))
                            .with_trail(interval, capacity)
                    }),
                ],
            ),
            sequence(
                "Search",
                vec![
                    leaf("RemembersTarget", || RemembersTarget),
                    leaf("PickSearchPoint", move || PickSearchPoint::new(investigate_radius)),
                    // Succeeds once the trail is used up or the target shows up.
                    invertor(
                        "Retrace",
                        until_fail(
                            "FollowTrail",
                            sequence(
                                "NextStop",
                                vec![
                                    leaf("ChaseSearchPoint", move || {
                                        Chase::new(ChaseGoal::SearchPoint, search, stop)
                                            .with_abort(Abort::WhenSeen(sight))
                                    }),
                                    leaf("NextBreadcrumb", || NextBreadcrumb),
                                ],
                            ),
                        ),
                    ),
                    action("ForgetTarget", |ctx: &mut AgentContext| {
                        ctx.memory.forget_target();
                    }),
                ],
            ),
            sequence(
                "Roam",
                vec![
                    leaf("PickRoamPoint", move || PickRoamPoint::new(roam_distance)),
                    leaf("WalkToRoamPoint", move || {
                        Chase::new(ChaseGoal::Roam, wander, stop).with_abort(Abort::WhenSeen(sight))
                    }),
                    wait("Idle", config.idle()),
                ],
            ),
        ],
    )
}
