//! Tunable parameters for the simulation and the built-in presets.
//!
//! Every field has a default, so a TOML file only needs to name the values it
//! overrides:
//!
//! ```toml
//! [sim]
//! tick_hz = 30
//!
//! [boss]
//! melee_range = 5.0
//! enable_ranged = true
//! ```

use std::path::Path;
use std::time::Duration;

use behavior_tree::secs_f32;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub sim: SimConfig,
    pub boss: BossConfig,
    pub wolf: WolfConfig,
}

impl AiConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AiConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the presets cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sim.validate()?;
        self.boss.validate()?;
        self.wolf.validate()
    }
}

/// Fixed-rate simulation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ticks per simulated second.
    pub tick_hz: u32,
    /// Seed for tree instances and agent memory.
    pub seed: u64,
    /// Vertical gravity, negative is down.
    pub gravity: f32,
}

impl SimConfig {
    pub const DEFAULT_TICK_HZ: u32 = 60;
    pub const DEFAULT_GRAVITY: f32 = -9.81;

    pub fn tick(&self) -> Duration {
        behavior_tree::tick_duration(self.tick_hz)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_hz == 0 {
            return Err(ConfigError::invalid("sim.tick_hz", "must be at least 1"));
        }
        if self.gravity.is_nan() || self.gravity >= 0.0 {
            return Err(ConfigError::invalid("sim.gravity", "must point down (negative)"));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_hz: Self::DEFAULT_TICK_HZ,
            seed: 0,
            gravity: Self::DEFAULT_GRAVITY,
        }
    }
}

/// Rock boss tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub melee_range: f32,
    pub ranged_range: f32,
    pub run_speed: f32,
    /// Distance at which a dormant boss starts waking up.
    pub proximity_distance: f32,
    /// The tree is only ticked while the target is this close.
    pub notice_distance: f32,
    pub wake_trigger: String,
    /// Procedural look comes back on after this long into the wake-up.
    pub wake_look_delay_secs: f32,
    /// Total wake-up time before the tree starts ticking.
    pub wake_duration_secs: f32,
    pub punch_secs: f32,
    pub throw_secs: f32,
    pub jump_windup_secs: f32,
    pub jump_flight_secs: f32,
    pub jump_recovery_secs: f32,
    /// Adds the ranged attack and run-to-range branches.
    pub enable_ranged: bool,
    pub projectile: ProjectileConfig,
}

impl BossConfig {
    pub fn wake_look_delay(&self) -> Duration {
        secs_f32(self.wake_look_delay_secs)
    }

    pub fn wake_duration(&self) -> Duration {
        secs_f32(self.wake_duration_secs)
    }

    pub fn jump_recovery(&self) -> Duration {
        secs_f32(self.jump_recovery_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        positive("boss.melee_range", self.melee_range)?;
        positive("boss.ranged_range", self.ranged_range)?;
        positive("boss.run_speed", self.run_speed)?;
        positive("boss.proximity_distance", self.proximity_distance)?;
        positive("boss.notice_distance", self.notice_distance)?;
        positive("boss.punch_secs", self.punch_secs)?;
        positive("boss.throw_secs", self.throw_secs)?;
        positive("boss.jump_windup_secs", self.jump_windup_secs)?;
        positive("boss.jump_flight_secs", self.jump_flight_secs)?;
        positive("boss.jump_recovery_secs", self.jump_recovery_secs)?;
        positive("boss.wake_duration_secs", self.wake_duration_secs)?;

        if self.ranged_range <= self.melee_range {
            return Err(ConfigError::invalid(
                "boss.ranged_range",
                format!(
                    "must exceed melee_range ({} <= {})",
                    self.ranged_range, self.melee_range
                ),
            ));
        }
        if self.notice_distance < self.proximity_distance {
            return Err(ConfigError::invalid(
                "boss.notice_distance",
                "must not be smaller than proximity_distance",
            ));
        }
        if !(0.0..=self.wake_duration_secs).contains(&self.wake_look_delay_secs) {
            return Err(ConfigError::invalid(
                "boss.wake_look_delay_secs",
                "must lie within the wake-up duration",
            ));
        }
        self.projectile.validate()
    }
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            melee_range: 6.0,
            ranged_range: 25.0,
            run_speed: 50.0,
            proximity_distance: 10.0,
            notice_distance: 20.0,
            wake_trigger: "StartShake".to_owned(),
            wake_look_delay_secs: 4.3,
            wake_duration_secs: 7.6,
            punch_secs: 1.667,
            throw_secs: 2.0,
            jump_windup_secs: 0.74,
            jump_flight_secs: 2.91,
            jump_recovery_secs: 3.02,
            enable_ranged: false,
            projectile: ProjectileConfig::default(),
        }
    }
}

/// Thrown rock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Fixed launch elevation in degrees.
    pub angle_deg: f32,
    /// Speed of the straight launch used when the arc cannot reach.
    pub fallback_speed: f32,
    pub lifetime_secs: f32,
    /// Spawn point above the thrower's origin.
    pub spawn_height: f32,
}

impl ProjectileConfig {
    pub fn lifetime(&self) -> Duration {
        secs_f32(self.lifetime_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.angle_deg > 0.0 && self.angle_deg < 90.0) {
            return Err(ConfigError::invalid(
                "boss.projectile.angle_deg",
                "must be strictly between 0 and 90",
            ));
        }
        positive("boss.projectile.fallback_speed", self.fallback_speed)?;
        positive("boss.projectile.lifetime_secs", self.lifetime_secs)
    }
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            angle_deg: 50.0,
            fallback_speed: 15.0,
            lifetime_secs: 7.0,
            spawn_height: 5.0,
        }
    }
}

/// Wolf tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WolfConfig {
    pub notice_radius: f32,
    pub field_of_view_deg: f32,
    pub wander_speed: f32,
    pub run_speed: f32,
    /// Speed multiplier while running to the last known position.
    pub search_speed_multiplier: f32,
    pub roam_distance: f32,
    pub stop_distance: f32,
    pub idle_secs: f32,
    /// Radius around the last known position that a search starts in.
    pub investigate_radius: f32,
    /// Minimum time between two breadcrumbs dropped while hunting.
    pub breadcrumb_interval_secs: f32,
    /// Breadcrumbs held before the oldest half is discarded.
    pub breadcrumb_capacity: usize,
}

impl WolfConfig {
    pub fn idle(&self) -> Duration {
        secs_f32(self.idle_secs)
    }

    pub fn breadcrumb_interval(&self) -> Duration {
        secs_f32(self.breadcrumb_interval_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        positive("wolf.notice_radius", self.notice_radius)?;
        positive("wolf.wander_speed", self.wander_speed)?;
        positive("wolf.run_speed", self.run_speed)?;
        positive("wolf.search_speed_multiplier", self.search_speed_multiplier)?;
        positive("wolf.roam_distance", self.roam_distance)?;
        positive("wolf.stop_distance", self.stop_distance)?;
        positive("wolf.idle_secs", self.idle_secs)?;
        positive("wolf.investigate_radius", self.investigate_radius)?;
        positive("wolf.breadcrumb_interval_secs", self.breadcrumb_interval_secs)?;
        if self.breadcrumb_capacity < 2 {
            return Err(ConfigError::invalid(
                "wolf.breadcrumb_capacity",
                "must hold at least 2 breadcrumbs",
            ));
        }
        if !(self.field_of_view_deg > 0.0 && self.field_of_view_deg <= 360.0) {
            return Err(ConfigError::invalid(
                "wolf.field_of_view_deg",
                "must be within (0, 360]",
            ));
        }
        Ok(())
    }
}

impl Default for WolfConfig {
    fn default() -> Self {
        Self {
            notice_radius: 10.0,
            field_of_view_deg: 90.0,
            wander_speed: 2.0,
            run_speed: 5.0,
            search_speed_multiplier: 2.0,
            roam_distance: 20.0,
            stop_distance: 1.0,
            idle_secs: 2.0,
            investigate_radius: 5.0,
            breadcrumb_interval_secs: 1.0,
            breadcrumb_capacity: 20,
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}

/// Loader for AI configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file containing an [`AiConfig`]
    ///
    /// # Returns
    ///
    /// The parsed and validated configuration.
    pub fn load(path: &Path) -> Result<AiConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = AiConfig::from_toml_str(&content)?;
        tracing::debug!("loaded AI config from {}", path.display());
        Ok(config)
    }
}
