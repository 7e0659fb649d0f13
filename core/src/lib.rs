#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gravity Defence run simulator.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and presentation to react to deterministically. Systems consume
//! event streams, query immutable snapshots, and respond exclusively with new
//! command batches.

mod archetypes;
mod bus;
mod error;
mod upgrades;
mod views;

use std::time::Duration;

pub use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use archetypes::{
    Blueprint, EnemyArchetype, EnemyAttackMode, ProjectileConfig, StatScaling, TargetingPolicy,
    TurretArchetype, TurretAttackType,
};
pub use bus::{EventBus, SubscriptionId};
pub use error::{
    AlreadyApplied, Collaborator, ConfigurationError, InsufficientResources, SimulationError,
};
pub use upgrades::{PermanentUpgrade, RunModifiers, RunUpgrade, UpgradeEffect, UpgradeKind};
pub use views::{EnemySnapshot, EnemyView, ShipSnapshot, TurretSnapshot, TurretView};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Resets run-scoped state and begins a fresh run.
    StartRun,
    /// Requests that a live enemy be instantiated from an archetype.
    SpawnEnemy {
        /// Template describing the enemy's base statistics.
        archetype: EnemyArchetypeId,
        /// Location where the enemy appears.
        position: Vec3,
        /// Initial facing around the vertical axis, in degrees.
        yaw: f32,
        /// Difficulty multipliers applied on top of the archetype's base stats.
        scaling: StatScaling,
    },
    /// Relocates a live enemy after the behaviour system integrated its motion.
    MoveEnemy {
        /// Identifier of the enemy being moved.
        enemy: EnemyId,
        /// Destination position for this tick.
        to: Vec3,
    },
    /// Requests that an enemy whose attack timer expired perform its attack.
    EnemyAttack {
        /// Identifier of the attacking enemy.
        enemy: EnemyId,
    },
    /// Replaces the target tracked by a turret.
    AssignTurretTarget {
        /// Identifier of the turret that completed a scan.
        turret: TurretId,
        /// Newly selected target, or `None` when nothing qualified.
        target: Option<EntityHandle>,
    },
    /// Updates the yaw of a turret that is turning toward its target.
    AimTurret {
        /// Identifier of the turret being rotated.
        turret: TurretId,
        /// New facing around the vertical axis, in degrees.
        yaw: f32,
    },
    /// Requests that a turret whose fire timer expired attack its target.
    FireTurret {
        /// Identifier of the firing turret.
        turret: TurretId,
    },
    /// Requests construction of a turret from a blueprint on a build slot.
    BuildTurret {
        /// Blueprint describing the turret and its cost.
        blueprint: BlueprintId,
        /// Slot receiving the turret.
        slot: BuildSlotId,
    },
    /// Requests removal of the turret occupying a build slot.
    ClearBuildSlot {
        /// Slot to clear.
        slot: BuildSlotId,
    },
    /// Requests a single mining action on a resource vein.
    Mine {
        /// Vein being mined.
        vein: VeinId,
    },
    /// Requests that the protective shield be expanded to a map zone.
    ExpandShield {
        /// Zone to shield.
        zone: ZoneId,
    },
    /// Requests that a ship-part pickup be placed into the world.
    SpawnShipPart {
        /// Location of the pickup.
        position: Vec3,
    },
    /// Requests that a ship-part pickup be collected by the player.
    CollectShipPart {
        /// Pickup being collected.
        pickup: PickupId,
    },
    /// Removes an uncollected ship-part pickup from the world.
    RemoveShipPart {
        /// Pickup being removed.
        pickup: PickupId,
    },
    /// Publishes a freshly drawn set of run-scoped upgrade options.
    PresentUpgradeOptions {
        /// Options offered to the player, in presentation order.
        options: Vec<RunUpgradeId>,
    },
    /// Applies the run-scoped upgrade chosen by the player.
    SelectUpgrade {
        /// Upgrade that was chosen.
        upgrade: RunUpgradeId,
    },
    /// Purchases a permanent upgrade with permanent currency.
    PurchasePermanentUpgrade {
        /// Upgrade being purchased.
        upgrade: PermanentUpgradeId,
    },
}

/// Events broadcast by the world and systems after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a new run began and run-scoped state was reset.
    RunStarted,
    /// Announces that the current run finished.
    RunEnded {
        /// How the run ended.
        outcome: RunOutcome,
        /// Permanent currency granted as a consequence of the run ending.
        permanent_currency_awarded: u32,
    },
    /// Reports the time remaining in the calm phase preceding the next wave.
    CalmPhaseTick {
        /// Calm time left before spawning starts.
        remaining: Duration,
    },
    /// Announces that a wave started spawning.
    WaveStarted {
        /// One-based index of the wave.
        wave: u32,
    },
    /// Announces that every enemy of a wave was spawned and defeated.
    WaveCompleted {
        /// One-based index of the wave.
        wave: u32,
    },
    /// Reports that a wave could not spawn because no spawn points exist.
    SpawnPointsMissing {
        /// Wave that remained empty.
        wave: u32,
    },
    /// Reports that the wave clear milestone requires an upgrade choice.
    UpgradeSelectionRequested {
        /// Wave whose clearance triggered the request.
        wave: u32,
    },
    /// Confirms that an enemy was instantiated.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Template the enemy was created from.
        archetype: EnemyArchetypeId,
        /// Location where the enemy appeared.
        position: Vec3,
    },
    /// Reports that an enemy spawn request was rejected.
    EnemySpawnRejected {
        /// Template named by the rejected request.
        archetype: EnemyArchetypeId,
        /// Specific reason the spawn failed.
        reason: SimulationError,
    },
    /// Reports damage applied to an enemy that survived it.
    EnemyDamaged {
        /// Enemy that took damage.
        enemy: EnemyId,
        /// Damage applied.
        amount: u32,
        /// Health remaining after the hit.
        remaining: u32,
    },
    /// Reports that an enemy received a timed slow effect.
    EnemySlowed {
        /// Enemy that was slowed.
        enemy: EnemyId,
        /// Fraction of movement speed removed while the effect lasts.
        factor: f32,
        /// Length of the effect.
        duration: Duration,
    },
    /// Announces that an enemy was defeated. Fires at most once per enemy.
    EnemyDefeated {
        /// Enemy that was defeated.
        enemy: EnemyId,
        /// Template the enemy was created from.
        archetype: EnemyArchetypeId,
        /// Location where the enemy fell.
        position: Vec3,
        /// Primary resource granted to the ledger before multipliers.
        resource_drop: u32,
    },
    /// Reports damage applied to the central ship.
    ShipDamaged {
        /// Damage applied.
        amount: u32,
        /// Ship health remaining after the hit.
        remaining: u32,
    },
    /// Confirms that a turret was constructed.
    TurretBuilt {
        /// Identifier assigned to the turret.
        turret: TurretId,
        /// Slot the turret occupies.
        slot: BuildSlotId,
        /// Blueprint that was built.
        blueprint: BlueprintId,
    },
    /// Reports that a turret construction request was rejected.
    TurretBuildRejected {
        /// Blueprint named by the request.
        blueprint: BlueprintId,
        /// Slot named by the request.
        slot: BuildSlotId,
        /// Specific reason the construction failed.
        reason: SimulationError,
    },
    /// Confirms that a turret was removed from its slot.
    TurretRemoved {
        /// Identifier of the removed turret.
        turret: TurretId,
        /// Slot that became free.
        slot: BuildSlotId,
    },
    /// Reports that a turret's tracked target changed after a scan.
    TurretTargetChanged {
        /// Turret whose target changed.
        turret: TurretId,
        /// New target, if any.
        target: Option<EntityHandle>,
    },
    /// Reports that a turret attacked its target.
    TurretFired {
        /// Turret that attacked.
        turret: TurretId,
        /// Entity that was attacked.
        target: EntityHandle,
        /// Kind of attack that was dispatched.
        attack: TurretAttackType,
    },
    /// Confirms that a seeking projectile was launched.
    ProjectileLaunched {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Entity the projectile seeks.
        target: EntityHandle,
    },
    /// Reports that a projectile reached its target and resolved its damage.
    ProjectileImpacted {
        /// Projectile that hit.
        projectile: ProjectileId,
        /// Impact location.
        position: Vec3,
    },
    /// Reports that a projectile vanished because its target disappeared.
    ProjectileExpired {
        /// Projectile that was discarded.
        projectile: ProjectileId,
    },
    /// Reports the new value of a ledger counter after a mutation.
    ResourceChanged {
        /// Counter that changed.
        kind: ResourceKind,
        /// Value of the counter after the mutation.
        value: u32,
    },
    /// Confirms a mining action on a vein.
    VeinMined {
        /// Vein that was mined.
        vein: VeinId,
        /// Resource the vein yields.
        kind: MiningResourceKind,
        /// Amount credited to the ledger.
        amount: u32,
    },
    /// Announces that a vein was exhausted and removed.
    VeinDepleted {
        /// Vein that was removed.
        vein: VeinId,
    },
    /// Announces that a vein appeared in a newly shielded zone.
    VeinSpawned {
        /// Identifier assigned to the vein.
        vein: VeinId,
        /// Zone hosting the vein.
        zone: ZoneId,
    },
    /// Reports that a mining request was rejected.
    MiningRejected {
        /// Vein named by the request.
        vein: VeinId,
        /// Specific reason the request failed.
        reason: SimulationError,
    },
    /// Confirms that a zone became shielded.
    ShieldExpanded {
        /// Zone that is now shielded.
        zone: ZoneId,
    },
    /// Reports that a shield expansion request was rejected.
    ShieldExpansionRejected {
        /// Zone named by the request.
        zone: ZoneId,
        /// Specific reason the request failed.
        reason: SimulationError,
    },
    /// Reports the time remaining until the next gravitational wave.
    GravitationalWaveTick {
        /// Time left before unshielded zones are shuffled.
        remaining: Duration,
    },
    /// Announces that a gravitational wave shuffled the unshielded zones.
    GravitationalWaveTriggered,
    /// Reports that a zone moved to a new position.
    ZoneRepositioned {
        /// Zone that moved.
        zone: ZoneId,
        /// New location of the zone.
        position: Vec3,
    },
    /// Confirms that a ship-part pickup appeared in the world.
    ShipPartSpawned {
        /// Identifier assigned to the pickup.
        pickup: PickupId,
        /// Location of the pickup.
        position: Vec3,
    },
    /// Announces that an uncollected ship-part pickup left the world.
    ShipPartRemoved {
        /// Pickup that was removed.
        pickup: PickupId,
    },
    /// Confirms that a ship part was registered for this run.
    ShipPartCollected {
        /// Pickup that was collected.
        pickup: PickupId,
        /// Ship parts recorded across all runs.
        collected: u32,
        /// Ship parts required for victory.
        required: u32,
    },
    /// Reports that a ship-part collection was rejected.
    ShipPartRejected {
        /// Pickup named by the request.
        pickup: PickupId,
        /// Specific reason the collection failed.
        reason: SimulationError,
    },
    /// Publishes the run-scoped upgrade options offered to the player.
    UpgradeOptionsGenerated {
        /// Options offered, in presentation order.
        options: Vec<RunUpgradeId>,
    },
    /// Confirms that a run-scoped upgrade was applied.
    UpgradeApplied {
        /// Upgrade that was applied.
        upgrade: RunUpgradeId,
        /// Effect added to the run modifiers.
        effect: UpgradeEffect,
    },
    /// Reports that a run-scoped upgrade selection was rejected.
    UpgradeRejected {
        /// Upgrade named by the request.
        upgrade: RunUpgradeId,
        /// Specific reason the selection failed.
        reason: SimulationError,
    },
    /// Confirms that a permanent upgrade was purchased.
    PermanentUpgradePurchased {
        /// Upgrade that was purchased.
        upgrade: PermanentUpgradeId,
    },
    /// Reports that a permanent upgrade purchase was rejected.
    PermanentUpgradeRejected {
        /// Upgrade named by the request.
        upgrade: PermanentUpgradeId,
        /// Specific reason the purchase failed.
        reason: SimulationError,
    },
}

/// Terminal states of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The central ship was destroyed.
    Defeat,
    /// Enough ship parts were recovered to repair the ship.
    Victory,
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

identifier!(
    /// Unique identifier assigned to a live enemy.
    EnemyId
);
identifier!(
    /// Unique identifier assigned to a constructed turret.
    TurretId
);
identifier!(
    /// Unique identifier assigned to an in-flight projectile.
    ProjectileId
);
identifier!(
    /// Unique identifier assigned to a ship-part pickup.
    PickupId
);
identifier!(
    /// Unique identifier of a mineable resource vein.
    VeinId
);
identifier!(
    /// Unique identifier of a map zone.
    ZoneId
);
identifier!(
    /// Unique identifier of a turret build slot.
    BuildSlotId
);
identifier!(
    /// Unique identifier of a turret blueprint.
    BlueprintId
);
identifier!(
    /// Identifier of an immutable enemy template.
    EnemyArchetypeId
);
identifier!(
    /// Identifier of an immutable turret template.
    TurretArchetypeId
);
identifier!(
    /// Identifier of a run-scoped upgrade entry.
    RunUpgradeId
);
identifier!(
    /// Identifier of a permanent upgrade entry.
    PermanentUpgradeId
);

/// Weak reference to a damage-capable entity. The entity may vanish at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityHandle {
    /// A live enemy.
    Enemy(EnemyId),
    /// The central ship.
    Ship,
}

impl EntityHandle {
    /// Returns the enemy identifier when the handle refers to an enemy.
    #[must_use]
    pub const fn enemy(self) -> Option<EnemyId> {
        match self {
            Self::Enemy(enemy) => Some(enemy),
            Self::Ship => None,
        }
    }
}

/// Tag used by spatial queries to select a family of entities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// Hostile combat entities.
    #[default]
    Enemy,
    /// The player's central ship.
    Ship,
}

/// Ledger counters tracked by the economy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Primary resource earned from defeated enemies.
    Primary,
    /// First mined resource.
    MiningA,
    /// Second mined resource.
    MiningB,
    /// Currency that persists between runs.
    PermanentCurrency,
}

/// Resource yielded by a vein.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MiningResourceKind {
    /// Yields [`ResourceKind::MiningA`].
    A,
    /// Yields [`ResourceKind::MiningB`].
    B,
}

impl MiningResourceKind {
    /// Ledger counter credited when a vein of this kind is mined.
    #[must_use]
    pub const fn resource(self) -> ResourceKind {
        match self {
            Self::A => ResourceKind::MiningA,
            Self::B => ResourceKind::MiningB,
        }
    }
}

/// Price expressed in the three run resources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Cost {
    /// Primary resource component.
    pub primary: u32,
    /// Mining resource A component.
    pub mining_a: u32,
    /// Mining resource B component.
    pub mining_b: u32,
}

impl Cost {
    /// Creates a cost from its three components.
    #[must_use]
    pub const fn new(primary: u32, mining_a: u32, mining_b: u32) -> Self {
        Self {
            primary,
            mining_a,
            mining_b,
        }
    }

    /// Reports whether every component of `self` is covered by `available`.
    #[must_use]
    pub const fn covered_by(&self, available: &Cost) -> bool {
        available.primary >= self.primary
            && available.mining_a >= self.mining_a
            && available.mining_b >= self.mining_b
    }

    /// Sum of all three components.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.primary as u64 + self.mining_a as u64 + self.mining_b as u64
    }
}

/// Current and maximum hit points of a damage-capable entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Health {
    current: u32,
    max: u32,
}

impl Health {
    /// Creates a full health pool. The maximum is never below one.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        let max = if max == 0 { 1 } else { max };
        Self { current: max, max }
    }

    /// Hit points remaining.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Maximum hit points.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Reports whether the pool has been emptied.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Restores hit points without exceeding the maximum.
    pub fn heal(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }

    /// Raises both the maximum and current hit points by `amount`.
    pub fn grow(&mut self, amount: u32) {
        self.max = self.max.saturating_add(amount);
        self.current = self.current.saturating_add(amount);
    }

    /// Scales the maximum while preserving the current health ratio.
    ///
    /// Non-positive multipliers are ignored.
    pub fn scale_max(&mut self, multiplier: f32) {
        if multiplier <= 0.0 {
            return;
        }

        let ratio = if self.max > 0 {
            (self.current as f32 / self.max as f32).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.max = round_to_u32(self.max as f32 * multiplier).max(1);
        self.current = round_to_u32(self.max as f32 * ratio).max(1);
    }
}

/// Result of applying damage to a [`Damageable`] entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The damage was ignored (zero amount or already depleted).
    Ignored,
    /// The entity survived with the provided health remaining.
    Survived {
        /// Health remaining after the hit.
        remaining: u32,
    },
    /// This hit depleted the entity.
    Depleted,
}

/// Capability exposed by every entity that can take damage.
pub trait Damageable {
    /// Applies `amount` points of damage.
    fn take_damage(&mut self, amount: u32) -> DamageOutcome;
}

impl Damageable for Health {
    fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if amount == 0 || self.current == 0 {
            return DamageOutcome::Ignored;
        }

        self.current = self.current.saturating_sub(amount);
        if self.current == 0 {
            DamageOutcome::Depleted
        } else {
            DamageOutcome::Survived {
                remaining: self.current,
            }
        }
    }
}

/// Entity located by a [`SpatialQuery`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Probe {
    /// Weak handle to the located entity.
    pub handle: EntityHandle,
    /// Position of the entity when the query ran.
    pub position: Vec3,
    /// Health of the entity, when it carries one.
    pub health: Option<Health>,
}

/// Collaborator answering "which entities of tag T lie within D of P".
pub trait SpatialQuery {
    /// Appends every entity of `tag` within `radius` of `center` to `out`.
    ///
    /// Entities are reported in an implementation-defined but stable order.
    fn entities_within(&self, tag: EntityTag, center: Vec3, radius: f32, out: &mut Vec<Probe>);
}

/// Progress that survives between runs and is owned by an external save system.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedProgress {
    /// Permanent upgrades purchased so far, in purchase order.
    pub purchased_upgrades: Vec<PermanentUpgradeId>,
    /// Permanent currency balance.
    pub permanent_currency: u32,
    /// Ship parts recovered across every run.
    pub ship_parts_collected: u32,
}

/// Boxed error returned by [`ProgressStore`] implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Load/save hooks implemented by the surrounding save system.
pub trait ProgressStore {
    /// Loads previously saved progress.
    fn load(&mut self) -> Result<SavedProgress, StoreError>;

    /// Persists the provided progress.
    fn save(&mut self, progress: &SavedProgress) -> Result<(), StoreError>;
}

/// Rounds half away from zero and clamps into the `u32` range.
#[must_use]
pub fn round_to_u32(value: f32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }

    let rounded = value.round();
    if rounded >= u32::MAX as f32 {
        u32::MAX
    } else {
        rounded as u32
    }
}
