//! Live enemy records.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec3;
use gravity_defence_core::{
    round_to_u32, EnemyArchetype, EnemyArchetypeId, EnemyId, Health, StatScaling,
};

/// Live enemy instance spawned from an archetype.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CombatEntity {
    pub(crate) id: EnemyId,
    pub(crate) archetype: EnemyArchetypeId,
    pub(crate) position: Vec3,
    pub(crate) yaw: f32,
    /// `None` when the archetype does not carry a health component.
    pub(crate) health: Option<Health>,
    pub(crate) move_speed: f32,
    pub(crate) damage: u32,
    pub(crate) resource_drop: u32,
    pub(crate) attack_timer: Duration,
    /// Set on the first defeat so the notification fires exactly once.
    pub(crate) defeated: bool,
}

impl CombatEntity {
    /// Instantiates an enemy, applying the global health reduction and then the wave scaling.
    pub(crate) fn spawn(
        id: EnemyId,
        archetype: &EnemyArchetype,
        position: Vec3,
        yaw: f32,
        scaling: StatScaling,
        health_reduction: f32,
    ) -> Self {
        let health = archetype.damageable().then(|| {
            let reduced =
                round_to_u32(archetype.base_health() as f32 * (1.0 - health_reduction)).max(1);
            let mut health = Health::new(reduced);
            if scaling.health > 0.0 && scaling.health != 1.0 {
                health.scale_max(scaling.health);
            }
            health
        });

        let mut move_speed = archetype.move_speed();
        if scaling.speed > 0.0 && scaling.speed != 1.0 {
            move_speed *= scaling.speed;
        }

        let mut damage = archetype.damage();
        if scaling.damage > 0.0 && scaling.damage != 1.0 {
            damage = round_to_u32(damage as f32 * scaling.damage).max(1);
        }

        Self {
            id,
            archetype: archetype.id(),
            position,
            yaw,
            health,
            move_speed,
            damage,
            resource_drop: archetype.resource_drop(),
            attack_timer: archetype.attack_cooldown(),
            defeated: false,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        !self.defeated
    }
}

/// Registry of live enemies with identifier allocation.
#[derive(Debug)]
pub(crate) struct EnemyRoster {
    entries: BTreeMap<EnemyId, CombatEntity>,
    next_enemy_id: EnemyId,
}

impl EnemyRoster {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    pub(crate) fn allocate_id(&mut self) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().wrapping_add(1));
        id
    }

    pub(crate) fn insert(&mut self, enemy: CombatEntity) {
        let _ = self.entries.insert(enemy.id, enemy);
    }

    /// Active enemy, skipping ones already defeated this tick.
    pub(crate) fn get(&self, id: EnemyId) -> Option<&CombatEntity> {
        self.entries.get(&id).filter(|enemy| enemy.is_active())
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut CombatEntity> {
        self.entries.get_mut(&id).filter(|enemy| enemy.is_active())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &CombatEntity> {
        self.entries.values().filter(|enemy| enemy.is_active())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut CombatEntity> {
        self.entries.values_mut().filter(|enemy| enemy.is_active())
    }

    /// Removes defeated enemies, appending their identifiers to `reaped`.
    pub(crate) fn reap(&mut self, reaped: &mut Vec<EnemyId>) {
        self.entries.retain(|id, enemy| {
            if enemy.defeated {
                reaped.push(*id);
                false
            } else {
                true
            }
        });
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archetype() -> EnemyArchetype {
        EnemyArchetype::new(EnemyArchetypeId::new(1), "swarmer")
            .with_base_health(100)
            .with_move_speed(2.0)
            .with_damage(10)
    }

    #[test]
    fn wave_five_scaling_raises_health_to_one_forty() {
        let scaling = StatScaling {
            health: 1.0 + 0.1 * 4.0,
            damage: 1.0 + 0.05 * 4.0,
            speed: 1.0 + 0.02 * 4.0,
        };
        let enemy = CombatEntity::spawn(
            EnemyId::new(0),
            &archetype(),
            Vec3::ZERO,
            0.0,
            scaling,
            0.0,
        );

        let health = enemy.health.expect("damageable archetype");
        assert_eq!(health.max(), 140);
        assert_eq!(health.current(), 140);
        assert_eq!(enemy.damage, 12);
        assert!((enemy.move_speed - 2.16).abs() < 1e-5);
    }

    #[test]
    fn health_reduction_applies_before_scaling() {
        let enemy = CombatEntity::spawn(
            EnemyId::new(0),
            &archetype(),
            Vec3::ZERO,
            0.0,
            StatScaling::IDENTITY,
            0.25,
        );
        assert_eq!(enemy.health.map(|health| health.max()), Some(75));
        assert_eq!(enemy.damage, 10);
    }

    #[test]
    fn non_damageable_archetype_has_no_health() {
        let archetype = archetype().with_damageable(false);
        let enemy = CombatEntity::spawn(
            EnemyId::new(3),
            &archetype,
            Vec3::ONE,
            0.0,
            StatScaling::IDENTITY,
            0.0,
        );
        assert!(enemy.health.is_none());
    }

    #[test]
    fn reap_removes_only_defeated_enemies() {
        let mut roster = EnemyRoster::new();
        for _ in 0..3 {
            let id = roster.allocate_id();
            roster.insert(CombatEntity::spawn(
                id,
                &archetype(),
                Vec3::ZERO,
                0.0,
                StatScaling::IDENTITY,
                0.0,
            ));
        }
        if let Some(enemy) = roster.get_mut(EnemyId::new(1)) {
            enemy.defeated = true;
        }
        assert!(roster.get(EnemyId::new(1)).is_none());

        let mut reaped = Vec::new();
        roster.reap(&mut reaped);
        assert_eq!(reaped, vec![EnemyId::new(1)]);
        assert_eq!(roster.iter().count(), 2);
    }
}
