//! Recoverable failure taxonomy reported through rejection events.

use thiserror::Error;

use crate::{
    BlueprintId, BuildSlotId, Cost, EnemyArchetypeId, PermanentUpgradeId, PickupId, RunUpgradeId,
    TurretArchetypeId, VeinId, ZoneId,
};

/// Missing or malformed configuration. The operation is skipped.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No enemy archetype is registered under the identifier.
    #[error("enemy archetype {} is not registered", .0.get())]
    MissingEnemyArchetype(EnemyArchetypeId),
    /// No turret archetype is registered under the identifier.
    #[error("turret archetype {} is not registered", .0.get())]
    MissingTurretArchetype(TurretArchetypeId),
    /// No blueprint is registered under the identifier.
    #[error("blueprint {} is not registered", .0.get())]
    MissingBlueprint(BlueprintId),
    /// No build slot exists with the identifier.
    #[error("build slot {} does not exist", .0.get())]
    MissingBuildSlot(BuildSlotId),
    /// No vein exists with the identifier.
    #[error("resource vein {} does not exist", .0.get())]
    MissingVein(VeinId),
    /// No zone exists with the identifier.
    #[error("map zone {} does not exist", .0.get())]
    MissingZone(ZoneId),
    /// No ship-part pickup exists with the identifier.
    #[error("ship part pickup {} does not exist", .0.get())]
    MissingPickup(PickupId),
    /// No run upgrade is registered under the identifier.
    #[error("run upgrade {} is not registered", .0.get())]
    MissingRunUpgrade(RunUpgradeId),
    /// No permanent upgrade is registered under the identifier.
    #[error("permanent upgrade {} is not registered", .0.get())]
    MissingPermanentUpgrade(PermanentUpgradeId),
    /// The wave has nowhere to spawn its enemies.
    #[error("no spawn points are configured")]
    NoSpawnPoints,
    /// A ranged enemy has no projectile to launch.
    #[error("enemy archetype {} attacks at range without a projectile", .0.get())]
    MissingProjectile(EnemyArchetypeId),
}

/// A spend attempt that balances do not cover. Nothing was deducted.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error(
    "insufficient resources: required {}/{}/{}, available {}/{}/{}",
    .required.primary, .required.mining_a, .required.mining_b,
    .available.primary, .available.mining_a, .available.mining_b
)]
pub struct InsufficientResources {
    /// Price that was requested.
    pub required: Cost,
    /// Balances at the time of the attempt.
    pub available: Cost,
}

/// An idempotent action that already happened. State is unchanged.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum AlreadyApplied {
    /// The permanent upgrade was bought before.
    #[error("permanent upgrade {} was already purchased", .0.get())]
    PermanentUpgrade(PermanentUpgradeId),
    /// A ship part was already registered during this run.
    #[error("a ship part was already registered during this run")]
    ShipPart,
    /// Every required ship part has been recovered.
    #[error("every ship part has already been recovered")]
    ShipComplete,
    /// The zone is already shielded.
    #[error("map zone {} is already shielded", .0.get())]
    ZoneShielded(ZoneId),
    /// The build slot already holds a turret.
    #[error("build slot {} is already occupied", .0.get())]
    SlotOccupied(BuildSlotId),
}

/// Service a feature depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collaborator {
    /// The central ship enemies advance on.
    CentralShip,
    /// Catalog of run-scoped upgrades.
    UpgradeCatalog,
    /// Save system persisting progress.
    ProgressStore,
}

/// Failure reported by any simulation operation.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    /// Missing or malformed configuration.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Balances do not cover a price.
    #[error(transparent)]
    InsufficientResources(#[from] InsufficientResources),
    /// Permanent currency does not cover a price.
    #[error("insufficient permanent currency: required {required}, available {available}")]
    InsufficientPermanentCurrency {
        /// Price that was requested.
        required: u32,
        /// Balance at the time of the attempt.
        available: u32,
    },
    /// The action already happened.
    #[error(transparent)]
    AlreadyApplied(#[from] AlreadyApplied),
    /// A dependent service is unavailable.
    #[error("{0:?} is unavailable")]
    MissingCollaborator(Collaborator),
}
