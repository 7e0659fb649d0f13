//! Upgrade catalog entries and the run-modifier table they feed.

use serde::{Deserialize, Serialize};

use crate::{round_to_u32, PermanentUpgradeId, RunUpgradeId};

/// Global effect adjusted by an upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UpgradeKind {
    /// Primary resource granted when a run starts.
    StartingPrimaryResource,
    /// Extra ship health granted when a run starts.
    StartingShipHealth,
    /// Turret damage multiplier.
    TurretDamage,
    /// Turret fire-rate multiplier.
    TurretFireRate,
    /// Turret range multiplier.
    TurretRange,
    /// Mining yield multiplier.
    MiningYield,
    /// Primary resource gain multiplier.
    ResourceGain,
    /// Fraction of enemy movement speed removed globally.
    EnemySlow,
    /// Fraction of enemy base health removed at spawn.
    EnemyHealthReduction,
}

/// Tagged magnitude describing how an upgrade changes the modifier table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeEffect {
    /// Effect being adjusted.
    pub kind: UpgradeKind,
    /// Amount added to the effect, e.g. `0.1` for ten percent.
    pub magnitude: f32,
}

impl UpgradeEffect {
    /// Creates a new effect.
    #[must_use]
    pub const fn new(kind: UpgradeKind, magnitude: f32) -> Self {
        Self { kind, magnitude }
    }
}

/// Run-scoped upgrade offered at wave-clear milestones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunUpgrade {
    /// Identifier of the entry.
    pub id: RunUpgradeId,
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    /// Effect applied when the upgrade is selected.
    pub effect: UpgradeEffect,
}

/// Permanent upgrade bought with permanent currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PermanentUpgrade {
    /// Identifier of the entry.
    pub id: PermanentUpgradeId,
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    /// Effect summed into the modifier table at every run start.
    pub effect: UpgradeEffect,
    /// Permanent currency price.
    #[serde(default)]
    pub cost: u32,
}

/// Explicit run context holding every global multiplier.
///
/// Ratios start at `1.0`, additive debuffs and starting bonuses at zero.
/// Effects are only ever added; [`RunModifiers::rebuild`] is the single way
/// back to the baseline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunModifiers {
    damage: f32,
    fire_rate: f32,
    range: f32,
    mining_yield: f32,
    resource_gain: f32,
    enemy_slow: f32,
    enemy_health_reduction: f32,
    starting_primary_bonus: u32,
    starting_ship_health_bonus: u32,
}

impl RunModifiers {
    /// Modifier table with no effects applied.
    #[must_use]
    pub const fn baseline() -> Self {
        Self {
            damage: 1.0,
            fire_rate: 1.0,
            range: 1.0,
            mining_yield: 1.0,
            resource_gain: 1.0,
            enemy_slow: 0.0,
            enemy_health_reduction: 0.0,
            starting_primary_bonus: 0,
            starting_ship_health_bonus: 0,
        }
    }

    /// Resets to the baseline, then sums every provided effect.
    pub fn rebuild<'a>(&mut self, effects: impl IntoIterator<Item = &'a UpgradeEffect>) {
        *self = Self::baseline();
        for effect in effects {
            self.apply(effect);
        }
    }

    /// Adds a single effect to the table.
    ///
    /// Starting bonuses are rounded per effect and only read when a run starts.
    pub fn apply(&mut self, effect: &UpgradeEffect) {
        let magnitude = effect.magnitude;
        match effect.kind {
            UpgradeKind::StartingPrimaryResource => {
                self.starting_primary_bonus = self
                    .starting_primary_bonus
                    .saturating_add(round_to_u32(magnitude));
            }
            UpgradeKind::StartingShipHealth => {
                self.starting_ship_health_bonus = self
                    .starting_ship_health_bonus
                    .saturating_add(round_to_u32(magnitude));
            }
            UpgradeKind::TurretDamage => self.damage += magnitude,
            UpgradeKind::TurretFireRate => self.fire_rate += magnitude,
            UpgradeKind::TurretRange => self.range += magnitude,
            UpgradeKind::MiningYield => self.mining_yield += magnitude,
            UpgradeKind::ResourceGain => self.resource_gain += magnitude,
            UpgradeKind::EnemySlow => self.enemy_slow += magnitude,
            UpgradeKind::EnemyHealthReduction => self.enemy_health_reduction += magnitude,
        }
    }

    /// Multiplier applied to turret and projectile damage.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Multiplier applied to turret fire rate.
    #[must_use]
    pub const fn fire_rate(&self) -> f32 {
        self.fire_rate
    }

    /// Multiplier applied to turret range.
    #[must_use]
    pub const fn range(&self) -> f32 {
        self.range
    }

    /// Multiplier applied to mining yield.
    #[must_use]
    pub const fn mining_yield(&self) -> f32 {
        self.mining_yield
    }

    /// Multiplier applied to primary resource gains.
    #[must_use]
    pub const fn resource_gain(&self) -> f32 {
        self.resource_gain
    }

    /// Fraction of enemy movement speed removed globally.
    #[must_use]
    pub const fn enemy_slow(&self) -> f32 {
        self.enemy_slow
    }

    /// Fraction of enemy base health removed at spawn.
    #[must_use]
    pub const fn enemy_health_reduction(&self) -> f32 {
        self.enemy_health_reduction
    }

    /// Primary resource granted when a run starts.
    #[must_use]
    pub const fn starting_primary_bonus(&self) -> u32 {
        self.starting_primary_bonus
    }

    /// Extra ship health granted when a run starts.
    #[must_use]
    pub const fn starting_ship_health_bonus(&self) -> u32 {
        self.starting_ship_health_bonus
    }

    /// Reciprocal of the effective fire rate for a turret firing `fire_rate` shots per second.
    #[must_use]
    pub fn fire_interval_secs(&self, fire_rate: f32) -> f32 {
        1.0 / (fire_rate.max(0.01) * self.fire_rate.max(0.01))
    }

    /// Speed factor from the global slow, never negative.
    #[must_use]
    pub fn global_speed_factor(&self) -> f32 {
        (1.0 - self.enemy_slow).max(0.0)
    }
}

impl Default for RunModifiers {
    fn default() -> Self {
        Self::baseline()
    }
}
