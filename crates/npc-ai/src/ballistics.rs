//! Launch velocity solvers for jumps and thrown projectiles.
//!
//! Both solvers work in a frame where `gravity` is the full gravity vector and
//! only its vertical component matters.

use glam::Vec3;

use crate::context::flatten;

/// Horizontal distances below this are treated as "straight up".
const MIN_RANGE: f32 = 0.01;
/// Flight times below this (seconds) get no horizontal speed.
const MIN_FLIGHT_TIME: f32 = 0.001;
/// Fixed-angle solutions with a smaller denominator are considered unreachable.
const MIN_DENOMINATOR: f32 = 0.001;

/// Result of a fixed-angle solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Launch {
    /// Ballistic arc that passes through the target.
    Arc(Vec3),
    /// Straight launch used because no arc at the requested angle reaches.
    Straight(Vec3),
}

impl Launch {
    pub fn velocity(self) -> Vec3 {
        match self {
            Launch::Arc(v) | Launch::Straight(v) => v,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Launch::Straight(_))
    }
}

/// Velocity that lands on `end` exactly `flight_time` seconds after leaving
/// `start`.
///
/// Horizontal speed is `R / t` and vertical speed is `H / t + g * t / 2`, with
/// `R` the ground-plane distance, `H` the height difference and `g` the
/// magnitude of gravity. If `R` is negligible the horizontal direction falls
/// back to `forward`.
pub fn timed_jump(start: Vec3, end: Vec3, flight_time: f32, gravity: Vec3, forward: Vec3) -> Vec3 {
    let g = -gravity.y;
    let planar = flatten(end - start);
    let range = planar.length();
    let height = end.y - start.y;

    let horizontal_speed = if flight_time > MIN_FLIGHT_TIME {
        range / flight_time
    } else {
        0.0
    };
    let vertical_speed = if flight_time > MIN_FLIGHT_TIME {
        height / flight_time + 0.5 * g * flight_time
    } else {
        0.0
    };

    let direction = if range < MIN_RANGE {
        flatten(forward).normalize_or_zero()
    } else {
        planar / range
    };

    direction * horizontal_speed + Vec3::Y * vertical_speed
}

/// Launch velocity at a fixed elevation `angle_deg` that passes through
/// `target`.
///
/// Solves `v0² = g·R² / (2·cos²θ·(H − R·tanθ))` with `g` the signed vertical
/// gravity. When that has no positive solution (target too high for the
/// angle, or degenerate geometry) the projectile is launched straight at the
/// target with `fallback_speed`.
pub fn fixed_angle_launch(
    start: Vec3,
    target: Vec3,
    angle_deg: f32,
    gravity: Vec3,
    fallback_speed: f32,
) -> Launch {
    let angle = angle_deg.to_radians();
    let g = gravity.y;
    let planar = flatten(target - start);
    let range = planar.length();
    let height = target.y - start.y;

    let cos = angle.cos();
    let denominator = 2.0 * cos * cos * (height - range * angle.tan());

    let straight = || Launch::Straight((target - start).normalize_or_zero() * fallback_speed);

    if range < MIN_RANGE || denominator.abs() < MIN_DENOMINATOR {
        return straight();
    }

    let v0_squared = g * range * range / denominator;
    if v0_squared.is_nan() || v0_squared <= 0.0 {
        return straight();
    }

    let v0 = v0_squared.sqrt();
    let direction = planar / range;
    Launch::Arc(direction * (v0 * cos) + Vec3::Y * (v0 * angle.sin()))
}
