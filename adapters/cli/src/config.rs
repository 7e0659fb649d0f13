//! TOML document describing a simulated run.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use gravity_defence_core::EnemyArchetypeId;
use gravity_defence_system_upgrade_offers::{self as upgrade_offers, DEFAULT_OPTION_COUNT};
use gravity_defence_system_wave_director::{self as wave_director, WaveTiers};
use gravity_defence_world::WorldConfig;
use serde::{Deserialize, Serialize};

const BUILTIN_CONFIG: &str = include_str!("../assets/run.toml");
const DEFAULT_SEED: u64 = 0x5eed_0000_2024_0001;
const WAVE_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;
const OFFER_STREAM: u64 = 0xbf58_476d_1ce4_e5b9;

/// Everything needed to assemble a [`crate::Simulation`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed driving every random stream of the run.
    pub seed: u64,
    /// Map, catalogs and economy tuning handed to the world.
    pub world: WorldConfig,
    /// Wave pacing and difficulty.
    pub waves: WaveSettings,
    /// Run-scoped upgrade offers.
    pub offers: OfferSettings,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            world: WorldConfig::default(),
            waves: WaveSettings::default(),
            offers: OfferSettings::default(),
        }
    }
}

impl SimulationConfig {
    /// Parses a configuration document.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid simulation configuration")
    }

    /// Reads and parses the configuration stored at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("while loading {}", path.display()))
    }

    /// The map shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_CONFIG)
    }

    /// World configuration seeded from [`SimulationConfig::seed`].
    #[must_use]
    pub fn world_config(&self) -> WorldConfig {
        WorldConfig {
            rng_seed: self.seed,
            ..self.world.clone()
        }
    }

    /// Wave director configuration seeded from [`SimulationConfig::seed`].
    #[must_use]
    pub fn wave_director_config(&self) -> wave_director::Config {
        self.waves.director_config(self.seed ^ WAVE_STREAM)
    }

    /// Upgrade offers configuration seeded from [`SimulationConfig::seed`].
    #[must_use]
    pub fn upgrade_offers_config(&self) -> upgrade_offers::Config {
        upgrade_offers::Config::new(self.offers.option_count, self.seed ^ OFFER_STREAM)
    }
}

/// Wave pacing expressed in seconds and enemy counts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSettings {
    /// Archetype filling the remainder of every wave.
    pub swarm: EnemyArchetypeId,
    /// Archetype introduced from the fourth wave.
    pub tank: EnemyArchetypeId,
    /// Archetype introduced after the seventh wave.
    pub ranged: EnemyArchetypeId,
    /// Length of the calm phase before each wave.
    pub calm_secs: f32,
    /// Delay between two consecutive spawns.
    pub spawn_interval_secs: f32,
    /// Enemies in the first wave.
    pub base_enemies: u32,
    /// Enemies added per wave.
    pub enemies_growth: u32,
    /// Clears between upgrade selections; zero disables them.
    pub waves_per_upgrade: u32,
    /// Per-wave enemy health growth.
    pub health_growth: f32,
    /// Per-wave enemy damage growth.
    pub damage_growth: f32,
    /// Per-wave enemy speed growth.
    pub speed_growth: f32,
    /// Probability that a cleared wave drops a ship part.
    pub ship_part_chance: f32,
    /// First wave eligible for a ship-part drop.
    pub ship_part_min_wave: u32,
}

impl Default for WaveSettings {
    fn default() -> Self {
        Self {
            swarm: EnemyArchetypeId::new(0),
            tank: EnemyArchetypeId::new(1),
            ranged: EnemyArchetypeId::new(2),
            calm_secs: 8.0,
            spawn_interval_secs: 0.4,
            base_enemies: 8,
            enemies_growth: 2,
            waves_per_upgrade: 3,
            health_growth: 0.1,
            damage_growth: 0.05,
            speed_growth: 0.02,
            ship_part_chance: 0.04,
            ship_part_min_wave: 20,
        }
    }
}

impl WaveSettings {
    fn director_config(&self, rng_seed: u64) -> wave_director::Config {
        let defaults = Self::default();
        let tiers = WaveTiers {
            swarm: self.swarm,
            tank: self.tank,
            ranged: self.ranged,
        };
        wave_director::Config::new(tiers, rng_seed)
            .with_timing(
                seconds(self.calm_secs, defaults.calm_secs),
                seconds(self.spawn_interval_secs, defaults.spawn_interval_secs),
            )
            .with_wave_size(self.base_enemies, self.enemies_growth)
            .with_waves_per_upgrade(self.waves_per_upgrade)
            .with_difficulty_growth(self.health_growth, self.damage_growth, self.speed_growth)
            .with_ship_part_drop(self.ship_part_chance, self.ship_part_min_wave)
    }
}

/// Size of the run-scoped upgrade draws.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferSettings {
    /// Options offered per selection.
    pub option_count: usize,
}

impl Default for OfferSettings {
    fn default() -> Self {
        Self {
            option_count: DEFAULT_OPTION_COUNT,
        }
    }
}

/// Converts configured seconds, falling back when the value is negative or not finite.
fn seconds(value: f32, fallback: f32) -> Duration {
    Duration::try_from_secs_f32(value)
        .or_else(|_| Duration::try_from_secs_f32(fallback))
        .unwrap_or_default()
}
