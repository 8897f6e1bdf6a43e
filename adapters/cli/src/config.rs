//! Engine tunables loadable from a TOML file.
//!
//! Every numeric threshold of the wave engine is configuration rather than a
//! hidden constant; this module carries the defaults and maps the flat file
//! schema onto the per-system configuration types.

use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use horde_core::WavePolicy;
use horde_system_spawn_location::Config as LocatorConfig;
use horde_system_spawn_scheduler::Config as SchedulerConfig;
use horde_system_wave_director::Config as DirectorConfig;
use serde::Deserialize;

/// Flat simulation tunables, durations expressed in milliseconds.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimConfig {
    /// Enemies planned for wave one.
    pub(crate) base_quota: u32,
    /// Additional enemies per wave past the first.
    pub(crate) quota_increment: u32,
    /// Cap on the accumulated per-wave increment.
    pub(crate) quota_increment_cap: u32,
    /// Minimum spawned count before a wave may complete.
    pub(crate) min_spawned_for_completion: u32,
    /// Delay between completion and the next-wave announcement.
    pub(crate) announcement_delay_ms: u64,
    /// Cooldown between the announcement and the next wave spawning.
    pub(crate) rearm_cooldown_ms: u64,
    /// Interval between spawn attempts.
    pub(crate) spawn_interval_ms: u64,
    /// Maximum enemies alive at once.
    pub(crate) max_concurrent_enemies: u32,
    /// World-unit radius of the border safety probes.
    pub(crate) safety_radius: f32,
    /// How many of the eight probes must be unobstructed.
    pub(crate) safety_min_clear: u32,
    /// Random samples drawn by the interior and last-resort tiers.
    pub(crate) interior_attempts: u32,
    /// Minimum world-unit distance from the player for last-resort points.
    pub(crate) min_player_distance: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            base_quota: 10,
            quota_increment: 2,
            quota_increment_cap: 20,
            min_spawned_for_completion: 5,
            announcement_delay_ms: 3_000,
            rearm_cooldown_ms: 5_000,
            spawn_interval_ms: 2_000,
            max_concurrent_enemies: 24,
            safety_radius: 1.0,
            safety_min_clear: 6,
            interior_attempts: 100,
            min_player_distance: 15.0,
        }
    }
}

impl SimConfig {
    /// Reads and parses the TOML file at the provided path.
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Wave director configuration derived from the tunables.
    pub(crate) fn director(&self) -> DirectorConfig {
        DirectorConfig::new(
            WavePolicy::new(
                self.base_quota,
                self.quota_increment,
                self.quota_increment_cap,
            ),
            self.min_spawned_for_completion,
            Duration::from_millis(self.announcement_delay_ms),
            Duration::from_millis(self.rearm_cooldown_ms),
        )
    }

    /// Spawn scheduler configuration derived from the tunables.
    pub(crate) fn scheduler(&self, rng_seed: u64) -> SchedulerConfig {
        SchedulerConfig::new(
            Duration::from_millis(self.spawn_interval_ms),
            self.max_concurrent_enemies,
            rng_seed,
        )
    }

    /// Spawn locator configuration derived from the tunables.
    pub(crate) fn locator(&self, rng_seed: u64) -> LocatorConfig {
        LocatorConfig::new(
            self.safety_radius,
            self.safety_min_clear,
            self.interior_attempts,
            self.min_player_distance,
            rng_seed,
        )
    }
}
