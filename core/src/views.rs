//! Read-only snapshots handed from the world to systems.

use glam::Vec3;

use crate::{
    BlueprintId, BuildSlotId, EnemyArchetypeId, EnemyAttackMode, EnemyId, EntityHandle, Health,
    TurretArchetype, TurretId,
};

/// Position and health of the central ship.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShipSnapshot {
    /// Reference point of the ship.
    pub position: Vec3,
    /// Current and maximum health.
    pub health: Health,
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single enemy.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier assigned to the enemy.
    pub id: EnemyId,
    /// Template the enemy was created from.
    pub archetype: EnemyArchetypeId,
    /// Current position.
    pub position: Vec3,
    /// Current facing, in degrees.
    pub yaw: f32,
    /// Health, when the enemy carries one.
    pub health: Option<Health>,
    /// Movement speed after wave scaling, before slows.
    pub move_speed: f32,
    /// Fraction of speed removed by the running timed slow, zero when none.
    pub slow_factor: f32,
    /// Attack behaviour of the template.
    pub attack_mode: EnemyAttackMode,
    /// Distance at which the enemy can attack.
    pub attack_range: f32,
    /// Whether the enemy holds position once in range.
    pub stop_when_in_range: bool,
    /// Whether the attack cooldown elapsed.
    pub attack_ready: bool,
}

/// Read-only view of every built turret.
#[derive(Clone, Debug, Default)]
pub struct TurretView<'a> {
    snapshots: Vec<TurretSnapshot<'a>>,
}

impl<'a> TurretView<'a> {
    /// Creates a new turret view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TurretSnapshot<'a>>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the turret snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &TurretSnapshot<'a>> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TurretSnapshot<'a>> {
        self.snapshots
    }
}

/// Immutable representation of a single turret.
#[derive(Clone, Debug)]
pub struct TurretSnapshot<'a> {
    /// Identifier allocated to the turret.
    pub id: TurretId,
    /// Slot the turret occupies.
    pub slot: BuildSlotId,
    /// Blueprint the turret was built from.
    pub blueprint: BlueprintId,
    /// Template describing the turret.
    pub archetype: &'a TurretArchetype,
    /// Position of the turret.
    pub position: Vec3,
    /// Current facing, in degrees.
    pub yaw: f32,
    /// Currently tracked target.
    pub target: Option<EntityHandle>,
    /// Whether the scan interval elapsed.
    pub scan_ready: bool,
    /// Whether the fire cooldown elapsed.
    pub fire_ready: bool,
}
