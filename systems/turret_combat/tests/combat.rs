use std::time::Duration;

use gravity_defence_core::{
    Blueprint, BlueprintId, BuildSlotId, Command, Cost, EnemyArchetype, EnemyArchetypeId,
    EntityHandle, Event, StatScaling, TurretArchetype, TurretArchetypeId, TurretAttackType,
    TurretId, Vec3,
};
use gravity_defence_system_turret_combat::TurretCombat;
use gravity_defence_world::{self as world, query, BuildSlotConfig, World, WorldConfig};

fn armed_world() -> (World, EntityHandle) {
    let mut world = World::new(
        WorldConfig {
            enemy_archetypes: vec![
                EnemyArchetype::new(EnemyArchetypeId::new(0), "grunt").with_base_health(50)
            ],
            turret_archetypes: vec![TurretArchetype::new(TurretArchetypeId::new(0), "zapper")
                .with_attack(TurretAttackType::DirectDamage, 10)
                .with_fire_rate(1.0)],
            blueprints: vec![Blueprint {
                id: BlueprintId::new(0),
                name: "zapper".into(),
                archetype: TurretArchetypeId::new(0),
                cost: Cost::default(),
            }],
            build_slots: vec![BuildSlotConfig {
                id: BuildSlotId::new(0),
                position: Vec3::new(0.0, 0.0, 5.0),
                yaw: 0.0,
            }],
            ..WorldConfig::default()
        },
        Default::default(),
    );

    let mut events = Vec::new();
    for command in [
        Command::StartRun,
        Command::BuildTurret {
            blueprint: BlueprintId::new(0),
            slot: BuildSlotId::new(0),
        },
        Command::SpawnEnemy {
            archetype: EnemyArchetypeId::new(0),
            position: Vec3::new(0.0, 0.0, 10.0),
            yaw: 0.0,
            scaling: StatScaling::IDENTITY,
        },
    ] {
        world::apply(&mut world, command, &mut events);
    }

    let enemy = query::enemy_view(&world)
        .iter()
        .map(|snapshot| EntityHandle::Enemy(snapshot.id))
        .next()
        .expect("enemy spawned");
    world::apply(
        &mut world,
        Command::AssignTurretTarget {
            turret: TurretId::new(0),
            target: Some(enemy),
        },
        &mut events,
    );
    (world, enemy)
}

fn fire_round(world: &mut World, combat: &mut TurretCombat) -> Vec<Event> {
    let mut commands = Vec::new();
    combat.handle(
        query::run_active(world),
        &query::turret_view(world),
        &mut commands,
    );
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

#[test]
fn fire_cooldown_spaces_attacks() {
    let (mut world, _) = armed_world();
    let mut combat = TurretCombat::new();

    let first = fire_round(&mut world, &mut combat);
    assert!(first.iter().any(|event| matches!(
        event,
        Event::EnemyDamaged {
            amount: 10,
            remaining: 40,
            ..
        }
    )));

    assert!(fire_round(&mut world, &mut combat).is_empty());

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        &mut events,
    );
    let second = fire_round(&mut world, &mut combat);
    assert!(second.iter().any(|event| matches!(
        event,
        Event::EnemyDamaged {
            remaining: 30,
            ..
        }
    )));
}

#[test]
fn turrets_go_quiet_once_their_target_falls() {
    let (mut world, enemy) = armed_world();
    let mut combat = TurretCombat::new();
    let mut defeated = false;

    for _ in 0..6 {
        let events = fire_round(&mut world, &mut combat);
        defeated |= events.iter().any(|event| {
            matches!(event, Event::EnemyDefeated { enemy: id, .. } if EntityHandle::Enemy(*id) == enemy)
        });
        let mut tick_events = Vec::new();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut tick_events,
        );
    }

    assert!(defeated);
    assert!(query::turret_view(&world)
        .iter()
        .all(|turret| turret.target.is_none()));
    assert!(fire_round(&mut world, &mut combat).is_empty());
}
