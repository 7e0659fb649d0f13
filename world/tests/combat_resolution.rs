use std::time::Duration;

use gravity_defence_core::{
    Blueprint, BlueprintId, BuildSlotId, Command, Cost, EnemyArchetype, EnemyArchetypeId,
    EnemyAttackMode, EntityHandle, Event, MiningResourceKind, PermanentUpgrade,
    PermanentUpgradeId, ProjectileConfig, SavedProgress, StatScaling, TurretArchetype,
    TurretArchetypeId, TurretAttackType, UpgradeEffect, UpgradeKind, Vec3, VeinId, ZoneId,
};
use gravity_defence_world::{
    apply, query, BuildSlotConfig, ShipConfig, VeinConfig, World, WorldConfig, ZoneConfig,
};

const CANNON: TurretArchetypeId = TurretArchetypeId::new(0);
const PULSE: TurretArchetypeId = TurretArchetypeId::new(1);
const GRUNT: EnemyArchetypeId = EnemyArchetypeId::new(0);
const SPITTER: EnemyArchetypeId = EnemyArchetypeId::new(1);

fn config() -> WorldConfig {
    WorldConfig {
        ship: Some(ShipConfig {
            position: Vec3::ZERO,
            base_health: 100,
        }),
        enemy_archetypes: vec![
            EnemyArchetype::new(GRUNT, "grunt")
                .with_base_health(30)
                .with_move_speed(2.0)
                .with_resource_drop(4),
            EnemyArchetype::new(SPITTER, "spitter")
                .with_base_health(30)
                .with_damage(7)
                .with_attack(EnemyAttackMode::Ranged, 50.0, Duration::from_secs(1))
                .with_projectile(ProjectileConfig::new(100.0, 0.0, Vec3::ZERO)),
        ],
        turret_archetypes: vec![
            TurretArchetype::new(CANNON, "cannon")
                .with_attack(TurretAttackType::Projectile, 20)
                .with_projectile(100.0, 3.0),
            TurretArchetype::new(PULSE, "pulse")
                .with_attack(TurretAttackType::SlowPulse, 0)
                .with_slow(0.4, Duration::from_secs(2)),
        ],
        blueprints: vec![
            Blueprint {
                id: BlueprintId::new(0),
                name: "cannon".into(),
                archetype: CANNON,
                cost: Cost::new(10, 0, 0),
            },
            Blueprint {
                id: BlueprintId::new(1),
                name: "pulse".into(),
                archetype: PULSE,
                cost: Cost::new(10, 0, 0),
            },
        ],
        build_slots: vec![
            BuildSlotConfig {
                id: BuildSlotId::new(0),
                position: Vec3::new(0.0, 0.0, 5.0),
                yaw: 0.0,
            },
            BuildSlotConfig {
                id: BuildSlotId::new(1),
                position: Vec3::new(0.0, 0.0, -5.0),
                yaw: 0.0,
            },
        ],
        veins: vec![VeinConfig {
            id: VeinId::new(0),
            kind: MiningResourceKind::B,
            amount: 1000,
            position: Vec3::new(3.0, 0.0, 3.0),
        }],
        zones: vec![
            ZoneConfig {
                id: ZoneId::new(0),
                position: Vec3::ZERO,
                central: true,
                vein_spawn_chance: 0.5,
                vein_kinds: Vec::new(),
                vein_amount: 1000,
                vein_offset: Vec3::ZERO,
            },
            ZoneConfig {
                id: ZoneId::new(1),
                position: Vec3::new(40.0, 0.0, 0.0),
                central: false,
                vein_spawn_chance: 0.5,
                vein_kinds: Vec::new(),
                vein_amount: 1000,
                vein_offset: Vec3::ZERO,
            },
        ],
        permanent_upgrades: vec![PermanentUpgrade {
            id: PermanentUpgradeId::new(0),
            name: "war chest".into(),
            effect: UpgradeEffect::new(UpgradeKind::StartingPrimaryResource, 200.0),
            cost: 0,
        }],
        ..WorldConfig::default()
    }
}

fn started_world() -> World {
    let mut world = World::new(
        config(),
        SavedProgress {
            purchased_upgrades: vec![PermanentUpgradeId::new(0)],
            ..SavedProgress::default()
        },
    );
    let mut events = Vec::new();
    apply(&mut world, Command::StartRun, &mut events);
    world
}

fn spawn(world: &mut World, archetype: EnemyArchetypeId, position: Vec3) -> EntityHandle {
    let mut events = Vec::new();
    apply(
        world,
        Command::SpawnEnemy {
            archetype,
            position,
            yaw: 0.0,
            scaling: StatScaling::IDENTITY,
        },
        &mut events,
    );
    events
        .iter()
        .find_map(|event| match event {
            Event::EnemySpawned { enemy, .. } => Some(EntityHandle::Enemy(*enemy)),
            _ => None,
        })
        .expect("spawn accepted")
}

fn build(world: &mut World, blueprint: u32, slot: u32) {
    let mut events = Vec::new();
    apply(
        world,
        Command::BuildTurret {
            blueprint: BlueprintId::new(blueprint),
            slot: BuildSlotId::new(slot),
        },
        &mut events,
    );
    assert!(matches!(events.last(), Some(Event::TurretBuilt { .. })));
}

fn tick(world: &mut World, millis: u64, events: &mut Vec<Event>) {
    apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(millis),
        },
        events,
    );
}

#[test]
fn projectile_explosion_damages_every_enemy_in_radius() {
    let mut world = started_world();
    build(&mut world, 0, 0);
    let first = spawn(&mut world, GRUNT, Vec3::new(0.0, 0.0, 10.0));
    let second = spawn(&mut world, GRUNT, Vec3::new(1.0, 0.0, 10.0));
    let _outside = spawn(&mut world, GRUNT, Vec3::new(9.0, 0.0, 10.0));

    let turret = query::turret_view(&world)
        .iter()
        .map(|snapshot| snapshot.id)
        .next()
        .expect("turret built");
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::AssignTurretTarget {
            turret,
            target: Some(first),
        },
        &mut events,
    );
    apply(&mut world, Command::FireTurret { turret }, &mut events);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ProjectileLaunched { .. })));

    events.clear();
    tick(&mut world, 100, &mut events);

    let damaged: Vec<EntityHandle> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemyDamaged { enemy, amount, .. } => {
                assert_eq!(*amount, 20);
                Some(EntityHandle::Enemy(*enemy))
            }
            _ => None,
        })
        .collect();
    assert_eq!(damaged, vec![first, second]);
    assert!(query::projectiles(&world).is_empty());
}

#[test]
fn projectile_expires_when_target_vanishes() {
    let mut world = started_world();
    build(&mut world, 0, 0);
    let target = spawn(&mut world, GRUNT, Vec3::new(0.0, 0.0, 200.0));
    let turret = query::turret_view(&world)
        .iter()
        .map(|snapshot| snapshot.id)
        .next()
        .expect("turret built");

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::AssignTurretTarget {
            turret,
            target: Some(target),
        },
        &mut events,
    );
    for _ in 0..3 {
        apply(&mut world, Command::FireTurret { turret }, &mut events);
        tick(&mut world, 1000, &mut events);
    }
    tick(&mut world, 1000, &mut events);

    let count = |predicate: fn(&Event) -> bool| events.iter().filter(|e| predicate(e)).count();
    assert_eq!(count(|e| matches!(e, Event::ProjectileLaunched { .. })), 3);
    assert_eq!(count(|e| matches!(e, Event::ProjectileImpacted { .. })), 2);
    assert_eq!(count(|e| matches!(e, Event::EnemyDefeated { .. })), 1);
    assert_eq!(count(|e| matches!(e, Event::ProjectileExpired { .. })), 1);
    assert!(query::projectiles(&world).is_empty());
}

#[test]
fn slow_pulse_applies_timed_slow_without_damage() {
    let mut world = started_world();
    build(&mut world, 1, 1);
    let enemy = spawn(&mut world, GRUNT, Vec3::new(0.0, 0.0, -10.0));
    let turret = query::turret_view(&world)
        .iter()
        .map(|snapshot| snapshot.id)
        .next()
        .expect("turret built");

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::AssignTurretTarget {
            turret,
            target: Some(enemy),
        },
        &mut events,
    );
    apply(&mut world, Command::FireTurret { turret }, &mut events);

    assert!(events
        .iter()
        .any(|event| matches!(event, Event::EnemySlowed { factor, .. } if *factor == 0.4)));
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::EnemyDamaged { .. })));

    let slowed = query::enemy_view(&world).into_vec();
    assert_eq!(slowed[0].slow_factor, 0.4);

    tick(&mut world, 2000, &mut events);
    let recovered = query::enemy_view(&world).into_vec();
    assert_eq!(recovered[0].slow_factor, 0.0);
}

#[test]
fn ranged_enemy_projectile_hits_the_ship() {
    let mut world = started_world();
    let spitter = spawn(&mut world, SPITTER, Vec3::new(10.0, 0.0, 0.0));
    let EntityHandle::Enemy(enemy) = spitter else {
        panic!("enemy handle expected");
    };

    let mut events = Vec::new();
    tick(&mut world, 1000, &mut events);
    apply(&mut world, Command::EnemyAttack { enemy }, &mut events);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::ProjectileLaunched {
            target: EntityHandle::Ship,
            ..
        }
    )));

    events.clear();
    tick(&mut world, 200, &mut events);
    assert!(events.contains(&Event::ShipDamaged {
        amount: 7,
        remaining: 93
    }));
}

#[test]
fn enemy_projectiles_scale_with_the_damage_multiplier() {
    let mut config = config();
    config.permanent_upgrades.push(PermanentUpgrade {
        id: PermanentUpgradeId::new(1),
        name: "overcharge".into(),
        effect: UpgradeEffect::new(UpgradeKind::TurretDamage, 1.0),
        cost: 0,
    });
    let mut world = World::new(
        config,
        SavedProgress {
            purchased_upgrades: vec![PermanentUpgradeId::new(1)],
            ..SavedProgress::default()
        },
    );
    let mut events = Vec::new();
    apply(&mut world, Command::StartRun, &mut events);
    assert_eq!(query::modifiers(&world).damage(), 2.0);

    let EntityHandle::Enemy(enemy) = spawn(&mut world, SPITTER, Vec3::new(10.0, 0.0, 0.0)) else {
        panic!("enemy handle expected");
    };
    tick(&mut world, 1000, &mut events);
    apply(&mut world, Command::EnemyAttack { enemy }, &mut events);

    events.clear();
    tick(&mut world, 200, &mut events);
    assert!(events.contains(&Event::ShipDamaged {
        amount: 14,
        remaining: 86
    }));
}

#[test]
fn mining_credits_the_vein_resource() {
    let mut world = started_world();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::Mine {
            vein: VeinId::new(0),
        },
        &mut events,
    );

    assert_eq!(query::balances(&world).mining_b, 50);
    assert_eq!(query::veins(&world)[0].remaining, 950);
}

#[test]
fn shield_expansion_spends_primary_resource() {
    let mut world = started_world();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ExpandShield {
            zone: ZoneId::new(1),
        },
        &mut events,
    );

    assert!(events.contains(&Event::ShieldExpanded {
        zone: ZoneId::new(1)
    }));
    assert_eq!(query::balances(&world).primary, 100);
    assert!(query::zones(&world).iter().all(|zone| zone.shielded));
}

#[test]
fn restarting_clears_run_state() {
    let mut world = started_world();
    build(&mut world, 0, 0);
    let _ = spawn(&mut world, GRUNT, Vec3::new(0.0, 0.0, 30.0));

    let mut events = Vec::new();
    apply(&mut world, Command::StartRun, &mut events);

    assert_eq!(query::enemy_view(&world).iter().count(), 0);
    assert_eq!(query::turret_view(&world).iter().count(), 0);
    assert_eq!(query::balances(&world).primary, 200);
    assert_eq!(query::invested(&world), 0);
}
