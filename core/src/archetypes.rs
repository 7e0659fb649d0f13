//! Immutable templates describing enemies, turrets and blueprints.
//!
//! Templates are deserialised from adapter configuration and never mutated
//! once registered with the world. Accessors clamp raw values into the ranges
//! the simulation relies on, so malformed configuration degrades instead of
//! producing negative speeds or zero-length cooldowns.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{BlueprintId, Cost, EnemyArchetypeId, EntityTag, TurretArchetypeId};

const MIN_ATTACK_COOLDOWN: f32 = 0.01;
const MIN_FIRE_RATE: f32 = 0.01;
const MIN_SCAN_INTERVAL: f32 = 0.05;
const MIN_PROJECTILE_SPEED: f32 = 0.1;

/// Attack behaviour exhibited by an enemy once its target is in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyAttackMode {
    /// The enemy never attacks.
    None,
    /// Direct damage to the target.
    #[default]
    Melee,
    /// Launches a seeking projectile at the target.
    Ranged,
}

/// Projectile launched by ranged enemies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    speed: f32,
    explosion_radius: f32,
    spawn_offset: Vec3,
}

impl ProjectileConfig {
    /// Creates a projectile configuration.
    #[must_use]
    pub const fn new(speed: f32, explosion_radius: f32, spawn_offset: Vec3) -> Self {
        Self {
            speed,
            explosion_radius,
            spawn_offset,
        }
    }

    /// Travel speed in world units per second.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed.max(MIN_PROJECTILE_SPEED)
    }

    /// Splash radius applied on impact. Zero means single target.
    #[must_use]
    pub fn explosion_radius(&self) -> f32 {
        self.explosion_radius.max(0.0)
    }

    /// Offset from the enemy position where the projectile appears.
    #[must_use]
    pub const fn spawn_offset(&self) -> Vec3 {
        self.spawn_offset
    }
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self::new(70.0, 0.0, Vec3::new(0.0, 1.0, 0.0))
    }
}

/// Immutable template shared by every enemy spawned from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyArchetype {
    id: EnemyArchetypeId,
    name: String,
    base_health: u32,
    move_speed: f32,
    damage: u32,
    resource_drop: u32,
    attack_mode: EnemyAttackMode,
    attack_range: f32,
    attack_cooldown: f32,
    stop_when_in_range: bool,
    projectile: Option<ProjectileConfig>,
    damageable: bool,
}

impl EnemyArchetype {
    /// Creates an archetype with default statistics.
    #[must_use]
    pub fn new(id: EnemyArchetypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Overrides the base health.
    #[must_use]
    pub fn with_base_health(mut self, base_health: u32) -> Self {
        self.base_health = base_health;
        self
    }

    /// Overrides the movement speed in world units per second.
    #[must_use]
    pub fn with_move_speed(mut self, move_speed: f32) -> Self {
        self.move_speed = move_speed;
        self
    }

    /// Overrides the damage dealt per attack.
    #[must_use]
    pub fn with_damage(mut self, damage: u32) -> Self {
        self.damage = damage;
        self
    }

    /// Overrides the primary resource granted on defeat.
    #[must_use]
    pub fn with_resource_drop(mut self, resource_drop: u32) -> Self {
        self.resource_drop = resource_drop;
        self
    }

    /// Overrides the attack behaviour, range and cooldown.
    #[must_use]
    pub fn with_attack(mut self, mode: EnemyAttackMode, range: f32, cooldown: Duration) -> Self {
        self.attack_mode = mode;
        self.attack_range = range;
        self.attack_cooldown = cooldown.as_secs_f32();
        self
    }

    /// Makes the enemy halt once its target is within attack range.
    #[must_use]
    pub fn with_stop_when_in_range(mut self, stop: bool) -> Self {
        self.stop_when_in_range = stop;
        self
    }

    /// Attaches the projectile launched by ranged attacks.
    #[must_use]
    pub fn with_projectile(mut self, projectile: ProjectileConfig) -> Self {
        self.projectile = Some(projectile);
        self
    }

    /// Controls whether spawned enemies carry a health component.
    #[must_use]
    pub fn with_damageable(mut self, damageable: bool) -> Self {
        self.damageable = damageable;
        self
    }

    /// Identifier of the archetype.
    #[must_use]
    pub const fn id(&self) -> EnemyArchetypeId {
        self.id
    }

    /// Human readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base health, never below one.
    #[must_use]
    pub fn base_health(&self) -> u32 {
        self.base_health.max(1)
    }

    /// Movement speed in world units per second, never negative.
    #[must_use]
    pub fn move_speed(&self) -> f32 {
        self.move_speed.max(0.0)
    }

    /// Damage dealt per attack.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        self.damage
    }

    /// Primary resource granted on defeat.
    #[must_use]
    pub const fn resource_drop(&self) -> u32 {
        self.resource_drop
    }

    /// Attack behaviour.
    #[must_use]
    pub const fn attack_mode(&self) -> EnemyAttackMode {
        self.attack_mode
    }

    /// Distance at which the enemy can attack.
    #[must_use]
    pub fn attack_range(&self) -> f32 {
        self.attack_range.max(0.0)
    }

    /// Delay between attacks.
    #[must_use]
    pub fn attack_cooldown(&self) -> Duration {
        seconds(self.attack_cooldown, MIN_ATTACK_COOLDOWN)
    }

    /// Whether the enemy halts once within attack range.
    #[must_use]
    pub const fn stop_when_in_range(&self) -> bool {
        self.stop_when_in_range
    }

    /// Projectile launched by ranged attacks, if configured.
    #[must_use]
    pub const fn projectile(&self) -> Option<&ProjectileConfig> {
        self.projectile.as_ref()
    }

    /// Whether spawned enemies carry a health component.
    #[must_use]
    pub const fn damageable(&self) -> bool {
        self.damageable
    }
}

impl Default for EnemyArchetype {
    fn default() -> Self {
        Self {
            id: EnemyArchetypeId::new(0),
            name: String::from("Enemy"),
            base_health: 100,
            move_speed: 3.0,
            damage: 10,
            resource_drop: 5,
            attack_mode: EnemyAttackMode::Melee,
            attack_range: 1.5,
            attack_cooldown: 2.0,
            stop_when_in_range: false,
            projectile: None,
            damageable: true,
        }
    }
}

/// Policy used by a turret to choose among in-range candidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetingPolicy {
    /// Minimal distance to the turret.
    #[default]
    ClosestToTurret,
    /// Minimal distance to the central ship.
    ClosestToShip,
    /// Maximal distance to the central ship.
    FarthestFromShip,
    /// Strictly greatest current health; first candidate wins ties.
    HighestHealth,
}

/// Attack dispatched by a turret when its fire timer expires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurretAttackType {
    /// Launches a seeking projectile.
    #[default]
    Projectile,
    /// Slows the target and optionally damages it.
    SlowPulse,
    /// Immediately damages the target.
    DirectDamage,
}

/// Immutable template shared by every turret built from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretArchetype {
    id: TurretArchetypeId,
    name: String,
    range: f32,
    min_range: f32,
    turn_speed: f32,
    fire_rate: f32,
    scan_interval: f32,
    enemy_tag: EntityTag,
    targeting: TargetingPolicy,
    attack: TurretAttackType,
    damage: u32,
    projectile_speed: f32,
    explosion_radius: f32,
    muzzle_offset: Vec3,
    slow_factor: f32,
    slow_duration: f32,
    apply_damage_multiplier: bool,
}

impl TurretArchetype {
    /// Creates an archetype with default statistics.
    #[must_use]
    pub fn new(id: TurretArchetypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Overrides the engagement band.
    #[must_use]
    pub fn with_range(mut self, min_range: f32, range: f32) -> Self {
        self.min_range = min_range;
        self.range = range;
        self
    }

    /// Overrides the turn speed in degrees per second.
    #[must_use]
    pub fn with_turn_speed(mut self, turn_speed: f32) -> Self {
        self.turn_speed = turn_speed;
        self
    }

    /// Overrides the attacks per second.
    #[must_use]
    pub fn with_fire_rate(mut self, fire_rate: f32) -> Self {
        self.fire_rate = fire_rate;
        self
    }

    /// Overrides the delay between target scans.
    #[must_use]
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval.as_secs_f32();
        self
    }

    /// Overrides the tag of entities the turret engages.
    #[must_use]
    pub fn with_enemy_tag(mut self, tag: EntityTag) -> Self {
        self.enemy_tag = tag;
        self
    }

    /// Overrides the targeting policy.
    #[must_use]
    pub fn with_targeting(mut self, targeting: TargetingPolicy) -> Self {
        self.targeting = targeting;
        self
    }

    /// Overrides the attack type and damage per shot.
    #[must_use]
    pub fn with_attack(mut self, attack: TurretAttackType, damage: u32) -> Self {
        self.attack = attack;
        self.damage = damage;
        self
    }

    /// Overrides the projectile speed and splash radius.
    #[must_use]
    pub fn with_projectile(mut self, speed: f32, explosion_radius: f32) -> Self {
        self.projectile_speed = speed;
        self.explosion_radius = explosion_radius;
        self
    }

    /// Overrides the slow pulse strength and length.
    #[must_use]
    pub fn with_slow(mut self, factor: f32, duration: Duration) -> Self {
        self.slow_factor = factor;
        self.slow_duration = duration.as_secs_f32();
        self
    }

    /// Controls whether direct and pulse damage scale with the global damage multiplier.
    #[must_use]
    pub fn with_damage_multiplier(mut self, apply: bool) -> Self {
        self.apply_damage_multiplier = apply;
        self
    }

    /// Identifier of the archetype.
    #[must_use]
    pub const fn id(&self) -> TurretArchetypeId {
        self.id
    }

    /// Human readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum engagement distance before the range multiplier.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.range.max(0.0)
    }

    /// Minimum engagement distance.
    #[must_use]
    pub fn min_range(&self) -> f32 {
        self.min_range.max(0.0)
    }

    /// Turn speed in degrees per second.
    #[must_use]
    pub fn turn_speed(&self) -> f32 {
        self.turn_speed.max(0.0)
    }

    /// Attacks per second before the fire-rate multiplier.
    #[must_use]
    pub fn fire_rate(&self) -> f32 {
        finite_or(self.fire_rate, MIN_FIRE_RATE).max(MIN_FIRE_RATE)
    }

    /// Delay between target scans.
    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        seconds(self.scan_interval, MIN_SCAN_INTERVAL)
    }

    /// Tag of entities the turret engages.
    #[must_use]
    pub const fn enemy_tag(&self) -> EntityTag {
        self.enemy_tag
    }

    /// Targeting policy.
    #[must_use]
    pub const fn targeting(&self) -> TargetingPolicy {
        self.targeting
    }

    /// Attack type.
    #[must_use]
    pub const fn attack(&self) -> TurretAttackType {
        self.attack
    }

    /// Damage per shot before multipliers.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        self.damage
    }

    /// Projectile travel speed.
    #[must_use]
    pub fn projectile_speed(&self) -> f32 {
        self.projectile_speed.max(MIN_PROJECTILE_SPEED)
    }

    /// Projectile splash radius. Zero means single target.
    #[must_use]
    pub fn explosion_radius(&self) -> f32 {
        self.explosion_radius.max(0.0)
    }

    /// Offset from the turret position where projectiles appear.
    #[must_use]
    pub const fn muzzle_offset(&self) -> Vec3 {
        self.muzzle_offset
    }

    /// Fraction of speed removed by a slow pulse, within `[0, 1]`.
    #[must_use]
    pub fn slow_factor(&self) -> f32 {
        finite_or(self.slow_factor, 0.0).clamp(0.0, 1.0)
    }

    /// Length of a slow pulse.
    #[must_use]
    pub fn slow_duration(&self) -> Duration {
        seconds(self.slow_duration, 0.0)
    }

    /// Whether direct and pulse damage scale with the global damage multiplier.
    #[must_use]
    pub const fn apply_damage_multiplier(&self) -> bool {
        self.apply_damage_multiplier
    }
}

impl Default for TurretArchetype {
    fn default() -> Self {
        Self {
            id: TurretArchetypeId::new(0),
            name: String::from("Turret"),
            range: 15.0,
            min_range: 0.0,
            turn_speed: 180.0,
            fire_rate: 1.0,
            scan_interval: 0.25,
            enemy_tag: EntityTag::Enemy,
            targeting: TargetingPolicy::ClosestToTurret,
            attack: TurretAttackType::Projectile,
            damage: 10,
            projectile_speed: 70.0,
            explosion_radius: 0.0,
            muzzle_offset: Vec3::new(0.0, 1.0, 0.0),
            slow_factor: 0.5,
            slow_duration: 2.0,
            apply_damage_multiplier: true,
        }
    }
}

/// Purchasable recipe that places a turret archetype on a build slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Identifier of the blueprint.
    pub id: BlueprintId,
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    /// Turret archetype placed by the blueprint.
    pub archetype: TurretArchetypeId,
    /// Resources spent when building.
    #[serde(default)]
    pub cost: Cost,
}

/// Difficulty multipliers applied to a freshly spawned enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatScaling {
    /// Multiplier applied to maximum health.
    pub health: f32,
    /// Multiplier applied to attack damage.
    pub damage: f32,
    /// Multiplier applied to movement speed.
    pub speed: f32,
}

impl StatScaling {
    /// Scaling that leaves every statistic untouched.
    pub const IDENTITY: Self = Self {
        health: 1.0,
        damage: 1.0,
        speed: 1.0,
    };

    /// Reports whether the scaling changes nothing.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for StatScaling {
    fn default() -> Self {
        Self::IDENTITY
    }
}

const MAX_SECONDS: f32 = 1.0e9;

fn seconds(value: f32, min: f32) -> Duration {
    Duration::from_secs_f32(finite_or(value, min).clamp(min, MAX_SECONDS))
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_clamp_malformed_values() {
        let turret = TurretArchetype::new(TurretArchetypeId::new(1), "broken")
            .with_fire_rate(0.0)
            .with_scan_interval(Duration::ZERO)
            .with_projectile(-4.0, -1.0)
            .with_slow(3.0, Duration::from_secs(1));

        assert_eq!(turret.fire_rate(), 0.01);
        assert_eq!(turret.scan_interval(), Duration::from_secs_f32(0.05));
        assert_eq!(turret.projectile_speed(), 0.1);
        assert_eq!(turret.explosion_radius(), 0.0);
        assert_eq!(turret.slow_factor(), 1.0);
    }

    #[test]
    fn enemy_health_never_drops_below_one() {
        let enemy = EnemyArchetype::new(EnemyArchetypeId::new(2), "ghost").with_base_health(0);
        assert_eq!(enemy.base_health(), 1);
        assert_eq!(enemy.attack_cooldown(), Duration::from_secs(2));
    }

    #[test]
    fn identity_scaling_is_default() {
        assert!(StatScaling::default().is_identity());
        let tougher = StatScaling {
            health: 1.4,
            ..StatScaling::IDENTITY
        };
        assert!(!tougher.is_identity());
    }
}
