//! Authoritative turret and build-slot state.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec3;
use gravity_defence_core::{
    AlreadyApplied, BlueprintId, BuildSlotId, ConfigurationError, EntityHandle, SimulationError,
    TurretArchetypeId, TurretId,
};

/// Snapshot of a turret stored inside the world.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TurretState {
    pub(crate) id: TurretId,
    pub(crate) slot: BuildSlotId,
    pub(crate) blueprint: BlueprintId,
    pub(crate) archetype: TurretArchetypeId,
    pub(crate) position: Vec3,
    /// Facing around the vertical axis, in degrees.
    pub(crate) yaw: f32,
    /// Weak reference cleared on the first tick after the entity vanishes.
    pub(crate) target: Option<EntityHandle>,
    pub(crate) scan_timer: Duration,
    pub(crate) fire_timer: Duration,
}

/// Location a turret may be placed on.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BuildSlot {
    pub(crate) position: Vec3,
    pub(crate) yaw: f32,
    pub(crate) turret: Option<TurretId>,
}

/// Registry that stores turrets, build slots and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TurretRegistry {
    entries: BTreeMap<TurretId, TurretState>,
    slots: BTreeMap<BuildSlotId, BuildSlot>,
    next_turret_id: TurretId,
}

impl TurretRegistry {
    /// Creates an empty registry with the provided build slots.
    pub(crate) fn new(slots: impl IntoIterator<Item = (BuildSlotId, Vec3, f32)>) -> Self {
        Self {
            entries: BTreeMap::new(),
            slots: slots
                .into_iter()
                .map(|(id, position, yaw)| {
                    (
                        id,
                        BuildSlot {
                            position,
                            yaw,
                            turret: None,
                        },
                    )
                })
                .collect(),
            next_turret_id: TurretId::new(0),
        }
    }

    /// Ensures a slot exists and is free.
    pub(crate) fn vacant_slot(&self, slot: BuildSlotId) -> Result<(), SimulationError> {
        let entry = self
            .slots
            .get(&slot)
            .ok_or(ConfigurationError::MissingBuildSlot(slot))?;
        if entry.turret.is_some() {
            return Err(AlreadyApplied::SlotOccupied(slot).into());
        }
        Ok(())
    }

    /// Places a turret on a slot previously validated with [`Self::vacant_slot`].
    pub(crate) fn place(
        &mut self,
        slot: BuildSlotId,
        blueprint: BlueprintId,
        archetype: TurretArchetypeId,
    ) -> Option<TurretId> {
        let entry = self.slots.get_mut(&slot)?;
        if entry.turret.is_some() {
            return None;
        }

        let id = self.next_turret_id;
        self.next_turret_id = TurretId::new(id.get().wrapping_add(1));
        entry.turret = Some(id);
        let _ = self.entries.insert(
            id,
            TurretState {
                id,
                slot,
                blueprint,
                archetype,
                position: entry.position,
                yaw: entry.yaw,
                target: None,
                scan_timer: Duration::ZERO,
                fire_timer: Duration::ZERO,
            },
        );
        Some(id)
    }

    /// Frees a slot, returning the turret that occupied it.
    pub(crate) fn clear_slot(&mut self, slot: BuildSlotId) -> Option<TurretId> {
        let turret = self.slots.get_mut(&slot)?.turret.take()?;
        let _ = self.entries.remove(&turret);
        Some(turret)
    }

    /// Removes every turret and frees every slot.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        for slot in self.slots.values_mut() {
            slot.turret = None;
        }
    }

    pub(crate) fn get(&self, id: TurretId) -> Option<&TurretState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TurretId) -> Option<&mut TurretState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TurretState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TurretState> {
        self.entries.values_mut()
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = (BuildSlotId, &BuildSlot)> {
        self.slots.iter().map(|(id, slot)| (*id, slot))
    }
}
