#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave orchestration system driving the calm, spawn and clear cycle of a run.
//!
//! The director consumes world events, tracks how many enemies of the current
//! wave are still alive, and responds with spawn commands, ship-part drops and
//! presentation events. All randomness is derived from the configured seed and
//! the wave index so a replay with the same inputs spawns the same enemies at
//! the same spawn points.

use std::{collections::VecDeque, time::Duration};

use gravity_defence_core::{
    Collaborator, Command, ConfigurationError, EnemyArchetypeId, Event, SimulationError,
    StatScaling, Vec3,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

const TIER_TWO_SHARE: f32 = 0.3;
const TIER_THREE_SHARE: f32 = 0.2;
const TIER_ONE_ONLY_UNTIL: u32 = 3;
const TWO_TIERS_UNTIL: u32 = 7;

/// Enemy archetypes used by the three composition bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveTiers {
    /// Archetype filling the remainder of every wave.
    pub swarm: EnemyArchetypeId,
    /// Archetype introduced from the fourth wave.
    pub tank: EnemyArchetypeId,
    /// Archetype introduced after the seventh wave.
    pub ranged: EnemyArchetypeId,
}

/// Configuration parameters required to construct the wave director.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    tiers: WaveTiers,
    rng_seed: u64,
    calm_duration: Duration,
    spawn_interval: Duration,
    base_enemies: u32,
    enemies_growth: u32,
    waves_per_upgrade: u32,
    health_growth: f32,
    damage_growth: f32,
    speed_growth: f32,
    ship_part_drop_chance: f32,
    ship_part_min_wave: u32,
}

impl Config {
    /// Creates a configuration with the default pacing for the provided tiers and seed.
    #[must_use]
    pub const fn new(tiers: WaveTiers, rng_seed: u64) -> Self {
        Self {
            tiers,
            rng_seed,
            calm_duration: Duration::from_secs(8),
            spawn_interval: Duration::from_millis(400),
            base_enemies: 8,
            enemies_growth: 2,
            waves_per_upgrade: 3,
            health_growth: 0.1,
            damage_growth: 0.05,
            speed_growth: 0.02,
            ship_part_drop_chance: 0.04,
            ship_part_min_wave: 20,
        }
    }

    /// Overrides the calm phase length and the delay between consecutive spawns.
    #[must_use]
    pub const fn with_timing(mut self, calm_duration: Duration, spawn_interval: Duration) -> Self {
        self.calm_duration = calm_duration;
        self.spawn_interval = spawn_interval;
        self
    }

    /// Overrides the enemy count of the first wave and its per-wave growth.
    #[must_use]
    pub const fn with_wave_size(mut self, base_enemies: u32, enemies_growth: u32) -> Self {
        self.base_enemies = base_enemies;
        self.enemies_growth = enemies_growth;
        self
    }

    /// Overrides how many clears separate two upgrade selections. Zero disables them.
    #[must_use]
    pub const fn with_waves_per_upgrade(mut self, waves_per_upgrade: u32) -> Self {
        self.waves_per_upgrade = waves_per_upgrade;
        self
    }

    /// Overrides the per-wave growth of enemy health, damage and speed.
    #[must_use]
    pub const fn with_difficulty_growth(mut self, health: f32, damage: f32, speed: f32) -> Self {
        self.health_growth = health;
        self.damage_growth = damage;
        self.speed_growth = speed;
        self
    }

    /// Overrides the ship-part drop probability and the first eligible wave.
    #[must_use]
    pub const fn with_ship_part_drop(mut self, chance: f32, min_wave: u32) -> Self {
        self.ship_part_drop_chance = chance;
        self.ship_part_min_wave = min_wave;
        self
    }
}

/// Observable phase of the wave cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WavePhase {
    /// No run is in progress.
    Idle,
    /// Downtime preceding the next wave.
    Calm {
        /// Calm time left before spawning starts.
        remaining: Duration,
    },
    /// Enemies of the current wave are being spawned.
    Spawning,
    /// Every enemy was spawned; waiting for the last one to fall.
    AwaitingClear,
    /// Waiting for the player to choose a run-scoped upgrade.
    UpgradePause,
}

/// Enemy counts per band for a single wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveComposition {
    /// Number of swarm enemies.
    pub swarm: u32,
    /// Number of tank enemies.
    pub tank: u32,
    /// Number of ranged enemies.
    pub ranged: u32,
}

impl WaveComposition {
    /// Builds the banded composition of `wave` for the provided size parameters.
    #[must_use]
    pub fn for_wave(wave: u32, base_enemies: u32, enemies_growth: u32) -> Self {
        let total = wave_total(wave, base_enemies, enemies_growth);

        if wave <= TIER_ONE_ONLY_UNTIL {
            return Self {
                swarm: total,
                tank: 0,
                ranged: 0,
            };
        }

        let tank = share(total, TIER_TWO_SHARE);
        if wave <= TWO_TIERS_UNTIL {
            return Self {
                swarm: total.saturating_sub(tank).max(1),
                tank,
                ranged: 0,
            };
        }

        let ranged = share(total, TIER_THREE_SHARE);
        Self {
            swarm: total.saturating_sub(ranged).saturating_sub(tank).max(1),
            tank,
            ranged,
        }
    }

    /// Sum of every band.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.swarm
            .saturating_add(self.tank)
            .saturating_add(self.ranged)
    }

    fn expand(&self, tiers: &WaveTiers, out: &mut VecDeque<EnemyArchetypeId>) {
        out.clear();
        out.extend(std::iter::repeat(tiers.swarm).take(self.swarm as usize));
        out.extend(std::iter::repeat(tiers.tank).take(self.tank as usize));
        out.extend(std::iter::repeat(tiers.ranged).take(self.ranged as usize));
    }
}

/// Total number of enemies spawned by `wave`, never below one.
#[must_use]
pub fn wave_total(wave: u32, base_enemies: u32, enemies_growth: u32) -> u32 {
    let offset = wave.saturating_sub(1);
    base_enemies
        .saturating_add(enemies_growth.saturating_mul(offset))
        .max(1)
}

fn share(total: u32, fraction: f32) -> u32 {
    ((total as f32 * fraction).round() as u32).max(1)
}

/// Pure system that sequences waves and emits spawn commands.
#[derive(Debug)]
pub struct WaveDirector {
    config: Config,
    phase: WavePhase,
    wave: u32,
    waves_cleared: u32,
    enemies_alive: u32,
    pending_spawns: u32,
    spawn_clock: Duration,
    spawn_queue: VecDeque<EnemyArchetypeId>,
    ship_part_present: bool,
    last_defeat: Option<Vec3>,
    rng: ChaCha8Rng,
}

impl WaveDirector {
    /// Creates an idle director that starts sequencing on the next `RunStarted` event.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(derive_wave_seed(config.rng_seed, 0)),
            config,
            phase: WavePhase::Idle,
            wave: 0,
            waves_cleared: 0,
            enemies_alive: 0,
            pending_spawns: 0,
            spawn_clock: Duration::ZERO,
            spawn_queue: VecDeque::new(),
            ship_part_present: false,
            last_defeat: None,
        }
    }

    /// Current phase of the wave cycle.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// One-based index of the latest wave, or zero before the first one.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Number of waves cleared during the current run.
    #[must_use]
    pub const fn waves_cleared(&self) -> u32 {
        self.waves_cleared
    }

    /// Enemies of the run that are still alive.
    #[must_use]
    pub const fn enemies_alive(&self) -> u32 {
        self.enemies_alive
    }

    /// Consumes world events and emits spawn commands plus presentation events.
    ///
    /// `ship_part_blocked` reports that no further ship part may drop during the
    /// current run, either because one was registered already or because the
    /// ship is complete. `upgrades_available` reports whether a run-scoped
    /// upgrade catalog exists to choose from.
    pub fn handle(
        &mut self,
        events: &[Event],
        spawn_points: &[Vec3],
        ship_part_blocked: bool,
        upgrades_available: bool,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        for event in events {
            match event {
                Event::RunStarted => self.reset(),
                Event::RunEnded { .. } => {
                    log::debug!("run ended during wave {}", self.wave);
                    self.phase = WavePhase::Idle;
                    self.spawn_queue.clear();
                }
                Event::EnemySpawned { .. } => {
                    self.pending_spawns = self.pending_spawns.saturating_sub(1);
                    self.enemies_alive = self.enemies_alive.saturating_add(1);
                }
                Event::EnemySpawnRejected { .. } => {
                    self.pending_spawns = self.pending_spawns.saturating_sub(1);
                }
                Event::EnemyDefeated { position, .. } => {
                    self.enemies_alive = self.enemies_alive.saturating_sub(1);
                    self.last_defeat = Some(*position);
                }
                Event::ShipPartSpawned { .. } => self.ship_part_present = true,
                Event::ShipPartCollected { .. } | Event::ShipPartRemoved { .. } => {
                    self.ship_part_present = false;
                }
                Event::UpgradeApplied { .. } if self.phase == WavePhase::UpgradePause => {
                    log::debug!("upgrade chosen, resuming after wave {}", self.wave);
                    self.enter_calm();
                }
                Event::TimeAdvanced { dt } => {
                    self.advance(*dt, spawn_points, out_commands, out_events);
                }
                _ => {}
            }
        }

        if self.phase == WavePhase::AwaitingClear && self.is_cleared() {
            self.complete_wave(ship_part_blocked, upgrades_available, out_commands, out_events);
        }
    }

    fn reset(&mut self) {
        self.wave = 0;
        self.waves_cleared = 0;
        self.enemies_alive = 0;
        self.pending_spawns = 0;
        self.spawn_clock = Duration::ZERO;
        self.spawn_queue.clear();
        self.ship_part_present = false;
        self.last_defeat = None;
        self.enter_calm();
    }

    fn enter_calm(&mut self) {
        self.phase = WavePhase::Calm {
            remaining: self.config.calm_duration,
        };
    }

    fn is_cleared(&self) -> bool {
        self.spawn_queue.is_empty() && self.pending_spawns == 0 && self.enemies_alive == 0
    }

    fn advance(
        &mut self,
        dt: Duration,
        spawn_points: &[Vec3],
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        let mut dt = dt;
        loop {
            match self.phase {
                WavePhase::Calm { remaining } => {
                    if dt < remaining {
                        let remaining = remaining - dt;
                        self.phase = WavePhase::Calm { remaining };
                        out_events.push(Event::CalmPhaseTick { remaining });
                        return;
                    }
                    dt -= remaining;
                    out_events.push(Event::CalmPhaseTick {
                        remaining: Duration::ZERO,
                    });
                    self.start_wave(spawn_points, out_events);
                }
                WavePhase::Spawning => {
                    self.spawn_clock = self.spawn_clock.saturating_add(dt);
                    self.spawn_due(spawn_points, out_commands);
                    return;
                }
                WavePhase::Idle | WavePhase::AwaitingClear | WavePhase::UpgradePause => return,
            }
        }
    }

    fn start_wave(&mut self, spawn_points: &[Vec3], out_events: &mut Vec<Event>) {
        self.wave = self.wave.saturating_add(1);
        self.last_defeat = None;
        self.rng = ChaCha8Rng::seed_from_u64(derive_wave_seed(self.config.rng_seed, self.wave));
        log::info!("wave {} started", self.wave);
        out_events.push(Event::WaveStarted { wave: self.wave });

        if spawn_points.is_empty() {
            log::error!(
                "wave {} stays empty: {}",
                self.wave,
                ConfigurationError::NoSpawnPoints
            );
            out_events.push(Event::SpawnPointsMissing { wave: self.wave });
            self.spawn_queue.clear();
            self.phase = WavePhase::AwaitingClear;
            return;
        }

        let composition = WaveComposition::for_wave(
            self.wave,
            self.config.base_enemies,
            self.config.enemies_growth,
        );
        composition.expand(&self.config.tiers, &mut self.spawn_queue);
        self.spawn_queue.make_contiguous().shuffle(&mut self.rng);
        log::debug!(
            "wave {} composition: {} swarm, {} tank, {} ranged",
            self.wave,
            composition.swarm,
            composition.tank,
            composition.ranged
        );

        // First spawn happens as soon as the wave starts.
        self.spawn_clock = self.config.spawn_interval;
        self.phase = WavePhase::Spawning;
    }

    fn spawn_due(&mut self, spawn_points: &[Vec3], out_commands: &mut Vec<Command>) {
        let interval = self.config.spawn_interval;
        while self.spawn_clock >= interval {
            let Some(archetype) = self.spawn_queue.pop_front() else {
                self.phase = WavePhase::AwaitingClear;
                return;
            };
            self.spawn_clock -= interval;

            let Some(position) = spawn_points.choose(&mut self.rng).copied() else {
                self.spawn_queue.clear();
                self.phase = WavePhase::AwaitingClear;
                return;
            };
            self.pending_spawns = self.pending_spawns.saturating_add(1);
            out_commands.push(Command::SpawnEnemy {
                archetype,
                position,
                yaw: 0.0,
                scaling: self.scaling(),
            });
        }
    }

    fn scaling(&self) -> StatScaling {
        if self.wave <= 1 {
            return StatScaling::IDENTITY;
        }

        let offset = (self.wave - 1) as f32;
        StatScaling {
            health: 1.0 + self.config.health_growth * offset,
            damage: 1.0 + self.config.damage_growth * offset,
            speed: 1.0 + self.config.speed_growth * offset,
        }
    }

    fn complete_wave(
        &mut self,
        ship_part_blocked: bool,
        upgrades_available: bool,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        self.waves_cleared = self.waves_cleared.saturating_add(1);
        log::info!("wave {} cleared", self.wave);
        out_events.push(Event::WaveCompleted { wave: self.wave });

        self.roll_ship_part(ship_part_blocked, out_commands);

        let per_upgrade = self.config.waves_per_upgrade;
        if per_upgrade > 0 && self.waves_cleared % per_upgrade == 0 {
            if upgrades_available {
                out_events.push(Event::UpgradeSelectionRequested { wave: self.wave });
                self.phase = WavePhase::UpgradePause;
                return;
            }
            log::warn!(
                "{}, skipping upgrade selection",
                SimulationError::MissingCollaborator(Collaborator::UpgradeCatalog)
            );
        }

        self.enter_calm();
    }

    fn roll_ship_part(&mut self, ship_part_blocked: bool, out_commands: &mut Vec<Command>) {
        let Some(position) = self.last_defeat.take() else {
            return;
        };
        if self.wave < self.config.ship_part_min_wave || self.ship_part_present || ship_part_blocked
        {
            return;
        }
        if self.rng.gen::<f32>() >= self.config.ship_part_drop_chance {
            return;
        }

        self.ship_part_present = true;
        out_commands.push(Command::SpawnShipPart { position });
    }
}

fn derive_wave_seed(global_seed: u64, wave: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(wave.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
