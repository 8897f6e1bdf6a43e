#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave lifecycle state machine.
//!
//! Exactly one director runs per session. It owns the wave number and the
//! per-wave spawn/kill counters, and it is the only component allowed to
//! start a wave or declare one finished. Completion detection is protected by
//! an explicit guard phase: once a wave is recognized as complete, further
//! checks are structurally suppressed until the announcement delay and the
//! re-arm cooldown have both elapsed and the next wave is running. That
//! replaces the fragile "is processing" boolean such systems tend to grow.

use std::time::Duration;

use horde_core::{Event, WaveNumber, WavePolicy};

/// Phases of the wave lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WavePhase {
    /// No wave active.
    Idle,
    /// The scheduler is actively creating enemies.
    Spawning,
    /// The full quota spawned; waiting for the last kills.
    AwaitingKills,
    /// Wave just completed; the transition to the next wave is in flight and
    /// re-entrant completion checks are suppressed.
    CompletionGuard,
}

/// Configuration parameters required to construct the director.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    policy: WavePolicy,
    min_spawned_for_completion: u32,
    announcement_delay: Duration,
    rearm_cooldown: Duration,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// `min_spawned_for_completion` keeps a wave from completing before a
    /// meaningful number of enemies ever existed; `announcement_delay` and
    /// `rearm_cooldown` are the two delays chained between a completed wave
    /// and the next one spawning.
    #[must_use]
    pub const fn new(
        policy: WavePolicy,
        min_spawned_for_completion: u32,
        announcement_delay: Duration,
        rearm_cooldown: Duration,
    ) -> Self {
        Self {
            policy,
            min_spawned_for_completion,
            announcement_delay,
            rearm_cooldown,
        }
    }

    /// Sizing policy used to derive each wave's quota.
    #[must_use]
    pub const fn policy(&self) -> WavePolicy {
        self.policy
    }

    /// Minimum spawned count before a wave may complete.
    #[must_use]
    pub const fn min_spawned_for_completion(&self) -> u32 {
        self.min_spawned_for_completion
    }

    /// Delay between completion and the next-wave announcement.
    #[must_use]
    pub const fn announcement_delay(&self) -> Duration {
        self.announcement_delay
    }

    /// Cooldown between the announcement and the next wave spawning.
    #[must_use]
    pub const fn rearm_cooldown(&self) -> Duration {
        self.rearm_cooldown
    }
}

/// Pending transition deadline, advanced by simulated time.
///
/// Cancellable at any point by overwriting with `None`; a full reset must
/// never leave a stale deadline behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transition {
    None,
    AwaitingAnnouncement { remaining: Duration },
    AwaitingRearm { remaining: Duration },
}

/// Pure system that owns wave numbering, counters, and completion timing.
#[derive(Debug)]
pub struct WaveDirector {
    config: Config,
    phase: WavePhase,
    wave: WaveNumber,
    quota: u32,
    spawned: u32,
    killed: u32,
    transition: Transition,
}

impl WaveDirector {
    /// Creates an idle director using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            phase: WavePhase::Idle,
            wave: WaveNumber::new(0),
            quota: 0,
            spawned: 0,
            killed: 0,
            transition: Transition::None,
        }
    }

    /// Starts the provided wave, emitting [`Event::WaveStarted`].
    ///
    /// A no-op returning `false` whenever any wave is already active, in any
    /// phase: permitting an external restart during `AwaitingKills` or the
    /// guard window would reopen the double-fire hole the guard closes. Call
    /// [`WaveDirector::reset`] first to force a restart.
    pub fn start_wave(&mut self, wave: WaveNumber, out: &mut Vec<Event>) -> bool {
        if self.phase != WavePhase::Idle {
            return false;
        }

        self.arm(wave, out);
        true
    }

    /// Consumes world events, advances pending transition deadlines, and runs
    /// the guarded completion check.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Event>) {
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => self.advance_transition(*dt, out),
                Event::EnemySpawned { wave, .. } => {
                    if self.phase == WavePhase::Spawning && *wave == self.wave {
                        self.spawned += 1;
                        if self.spawned >= self.quota {
                            self.phase = WavePhase::AwaitingKills;
                        }
                    }
                }
                Event::EnemyKilled { wave, .. } => {
                    let counting = matches!(
                        self.phase,
                        WavePhase::Spawning | WavePhase::AwaitingKills
                    );
                    if counting && *wave == self.wave {
                        self.killed += 1;
                    }
                }
                Event::EnemiesCleared | Event::TerrainConfigured { .. } => self.reset(),
                _ => {}
            }
        }

        if self.is_wave_complete() {
            self.engage_guard(out);
        }
    }

    /// Reports whether the active wave satisfies its completion condition.
    ///
    /// Always `false` when nothing spawned yet, when fewer than the
    /// configured minimum spawned, or while the completion guard is engaged.
    #[must_use]
    pub fn is_wave_complete(&self) -> bool {
        if self.spawned == 0 || self.spawned < self.config.min_spawned_for_completion {
            return false;
        }

        self.phase == WavePhase::AwaitingKills && self.killed >= self.spawned
    }

    /// Cancels pending transition deadlines, zeroes all counters, and returns
    /// the machine to [`WavePhase::Idle`].
    pub fn reset(&mut self) {
        self.phase = WavePhase::Idle;
        self.wave = WaveNumber::new(0);
        self.quota = 0;
        self.spawned = 0;
        self.killed = 0;
        self.transition = Transition::None;
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Wave currently owned by the director. Zero while idle.
    #[must_use]
    pub const fn wave(&self) -> WaveNumber {
        self.wave
    }

    /// Enemies planned for the active wave.
    #[must_use]
    pub const fn quota(&self) -> u32 {
        self.quota
    }

    /// Enemies actually instantiated for the active wave.
    #[must_use]
    pub const fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Confirmed kills for the active wave.
    #[must_use]
    pub const fn killed(&self) -> u32 {
        self.killed
    }

    fn arm(&mut self, wave: WaveNumber, out: &mut Vec<Event>) {
        self.phase = WavePhase::Spawning;
        self.wave = wave;
        self.quota = self.config.policy.quota_for(wave);
        self.spawned = 0;
        self.killed = 0;
        self.transition = Transition::None;
        out.push(Event::WaveStarted {
            wave,
            quota: self.quota,
        });
    }

    fn engage_guard(&mut self, out: &mut Vec<Event>) {
        self.phase = WavePhase::CompletionGuard;
        self.transition = Transition::AwaitingAnnouncement {
            remaining: self.config.announcement_delay,
        };
        out.push(Event::WaveCompleted { wave: self.wave });
    }

    fn advance_transition(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let mut dt = dt;
        loop {
            match self.transition {
                Transition::None => return,
                Transition::AwaitingAnnouncement { remaining } => {
                    if dt < remaining {
                        self.transition = Transition::AwaitingAnnouncement {
                            remaining: remaining - dt,
                        };
                        return;
                    }

                    // Excess time carries into the cooldown so back-to-back
                    // deadlines stay accurate under a large tick.
                    dt -= remaining;
                    out.push(Event::WaveAnnounced {
                        wave: self.wave.next(),
                    });
                    self.transition = Transition::AwaitingRearm {
                        remaining: self.config.rearm_cooldown,
                    };
                }
                Transition::AwaitingRearm { remaining } => {
                    if dt < remaining {
                        self.transition = Transition::AwaitingRearm {
                            remaining: remaining - dt,
                        };
                        return;
                    }

                    self.transition = Transition::None;
                    let next = self.wave.next();
                    self.arm(next, out);
                    return;
                }
            }
        }
    }
}
