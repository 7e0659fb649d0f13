#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Gravity Defence.
//!
//! The world owns every piece of mutable run state: the economy ledger, the
//! upgrade registry, live enemies, turrets, projectiles, pickups, zones, veins
//! and the central ship. It is mutated exclusively through [`apply`] and read
//! through the [`query`] module.

mod economy;
mod enemies;
mod projectiles;
mod timers;
mod turrets;
mod upgrades;
mod zones;

use std::{collections::BTreeMap, time::Duration};

use glam::Vec3;
use gravity_defence_core::{
    round_to_u32, AlreadyApplied, Blueprint, BlueprintId, BuildSlotId, Collaborator, Command,
    ConfigurationError, Cost, DamageOutcome, Damageable, EnemyArchetype, EnemyArchetypeId,
    EnemyAttackMode, EnemyId, EntityHandle, EntityTag, Event, Health, MiningResourceKind,
    PermanentUpgrade, PickupId, RunOutcome, RunUpgrade, SavedProgress, SimulationError,
    SpatialQuery, StatScaling, TurretArchetype, TurretArchetypeId, TurretAttackType, TurretId,
    VeinId, ZoneId,
};
use serde::{Deserialize, Serialize};

use economy::EconomyLedger;
use enemies::{CombatEntity, EnemyRoster};
use projectiles::{Flight, Projectile, ProjectileResolver};
use timers::{EffectKind, TimerTable};
use turrets::TurretRegistry;
use upgrades::UpgradeEffectRegistry;
use zones::ZoneMap;

const DEFAULT_SHIP_HEALTH: u32 = 100;
const DEFAULT_MINING_PER_CLICK: u32 = 50;
const DEFAULT_PERMANENT_CURRENCY_RATE: f32 = 0.10;
const DEFAULT_SHIP_PARTS_REQUIRED: u32 = 5;
const DEFAULT_GRAVITATIONAL_WAVE_INTERVAL_SECS: f32 = 60.0;
const DEFAULT_VEIN_AMOUNT: u32 = 1000;
const DEFAULT_VEIN_SPAWN_CHANCE: f32 = 0.5;
const DEFAULT_RNG_SEED: u64 = 0x6a09_e667_f3bc_c908;

/// Central ship placement and durability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    /// Reference point every enemy walks toward.
    pub position: Vec3,
    /// Health restored at the start of every run, before bonuses.
    pub base_health: u32,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            base_health: DEFAULT_SHIP_HEALTH,
        }
    }
}

/// Location a turret may be built on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildSlotConfig {
    /// Identifier of the slot.
    pub id: BuildSlotId,
    /// Position of the slot.
    #[serde(default)]
    pub position: Vec3,
    /// Initial facing of turrets built on the slot, in degrees.
    #[serde(default)]
    pub yaw: f32,
}

/// Resource vein present when a run starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VeinConfig {
    /// Identifier of the vein.
    pub id: VeinId,
    /// Resource yielded by the vein.
    pub kind: MiningResourceKind,
    /// Resource contained by the vein.
    #[serde(default = "default_vein_amount")]
    pub amount: u32,
    /// Position of the vein.
    #[serde(default)]
    pub position: Vec3,
}

/// Map zone that may be shielded and shuffled by gravitational waves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Identifier of the zone.
    pub id: ZoneId,
    /// Initial position of the zone.
    #[serde(default)]
    pub position: Vec3,
    /// Central zones start shielded.
    #[serde(default)]
    pub central: bool,
    /// Probability that shielding the zone spawns a vein.
    #[serde(default = "default_vein_spawn_chance")]
    pub vein_spawn_chance: f32,
    /// Kinds the spawned vein is drawn from; empty disables vein spawning.
    #[serde(default = "default_vein_kinds")]
    pub vein_kinds: Vec<MiningResourceKind>,
    /// Resource contained by a spawned vein.
    #[serde(default = "default_vein_amount")]
    pub vein_amount: u32,
    /// Offset of the spawned vein from the zone position.
    #[serde(default)]
    pub vein_offset: Vec3,
}

/// Economy tuning values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Primary resource granted at every run start, before upgrade bonuses.
    pub starting_primary: u32,
    /// Mining resource extracted by a single mining action before multipliers.
    pub mining_per_click: u32,
    /// Price of shielding an additional zone.
    pub shield_expansion_cost: Cost,
    /// Fraction of invested resources converted into permanent currency on defeat.
    pub permanent_currency_rate: f32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_primary: 0,
            mining_per_click: DEFAULT_MINING_PER_CLICK,
            shield_expansion_cost: Cost::new(100, 0, 0),
            permanent_currency_rate: DEFAULT_PERMANENT_CURRENCY_RATE,
        }
    }
}

/// Static configuration the world is built from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Central ship, if the map has one.
    pub ship: Option<ShipConfig>,
    /// Enemy templates.
    pub enemy_archetypes: Vec<EnemyArchetype>,
    /// Turret templates.
    pub turret_archetypes: Vec<TurretArchetype>,
    /// Purchasable turret recipes.
    pub blueprints: Vec<Blueprint>,
    /// Turret build slots.
    pub build_slots: Vec<BuildSlotConfig>,
    /// Positions enemies may appear at.
    pub spawn_points: Vec<Vec3>,
    /// Veins present when a run starts.
    pub veins: Vec<VeinConfig>,
    /// Map zones.
    pub zones: Vec<ZoneConfig>,
    /// Run-scoped upgrade catalog.
    pub run_upgrades: Vec<RunUpgrade>,
    /// Permanent upgrade catalog.
    pub permanent_upgrades: Vec<PermanentUpgrade>,
    /// Economy tuning.
    pub economy: EconomyConfig,
    /// Ship parts needed for victory.
    pub ship_parts_required: u32,
    /// Seconds between gravitational waves.
    pub gravitational_wave_interval_secs: f32,
    /// Seed of the world's random stream (vein spawns, zone shuffles).
    pub rng_seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            ship: Some(ShipConfig::default()),
            enemy_archetypes: Vec::new(),
            turret_archetypes: Vec::new(),
            blueprints: Vec::new(),
            build_slots: Vec::new(),
            spawn_points: Vec::new(),
            veins: Vec::new(),
            zones: Vec::new(),
            run_upgrades: Vec::new(),
            permanent_upgrades: Vec::new(),
            economy: EconomyConfig::default(),
            ship_parts_required: DEFAULT_SHIP_PARTS_REQUIRED,
            gravitational_wave_interval_secs: DEFAULT_GRAVITATIONAL_WAVE_INTERVAL_SECS,
            rng_seed: DEFAULT_RNG_SEED,
        }
    }
}

fn default_vein_amount() -> u32 {
    DEFAULT_VEIN_AMOUNT
}

fn default_vein_spawn_chance() -> f32 {
    DEFAULT_VEIN_SPAWN_CHANCE
}

fn default_vein_kinds() -> Vec<MiningResourceKind> {
    vec![MiningResourceKind::A, MiningResourceKind::B]
}

#[derive(Clone, Debug)]
struct CentralShip {
    position: Vec3,
    base_health: u32,
    health: Health,
}

/// Represents the authoritative Gravity Defence world state.
#[derive(Debug)]
pub struct World {
    ship: Option<CentralShip>,
    enemy_archetypes: BTreeMap<EnemyArchetypeId, EnemyArchetype>,
    turret_archetypes: BTreeMap<TurretArchetypeId, TurretArchetype>,
    blueprints: BTreeMap<BlueprintId, Blueprint>,
    spawn_points: Vec<Vec3>,
    enemies: EnemyRoster,
    slows: TimerTable<EnemyId>,
    turrets: TurretRegistry,
    projectiles: ProjectileResolver,
    pickups: BTreeMap<PickupId, Vec3>,
    next_pickup_id: PickupId,
    zones: ZoneMap,
    ledger: EconomyLedger,
    upgrades: UpgradeEffectRegistry,
    economy: EconomyConfig,
    ship_parts_required: u32,
    ship_parts_collected: u32,
    ship_part_registered: bool,
    run_active: bool,
    reaped: Vec<EnemyId>,
}

impl World {
    /// Creates a world from static configuration and previously saved progress.
    ///
    /// The run stays inactive until [`Command::StartRun`] is applied.
    #[must_use]
    pub fn new(config: WorldConfig, progress: SavedProgress) -> Self {
        let wave_interval = Duration::from_secs_f32(
            if config.gravitational_wave_interval_secs.is_finite() {
                config.gravitational_wave_interval_secs.clamp(0.1, 1.0e9)
            } else {
                DEFAULT_GRAVITATIONAL_WAVE_INTERVAL_SECS
            },
        );
        let ship_parts_required = config.ship_parts_required.max(1);

        Self {
            ship: config.ship.map(|ship| CentralShip {
                position: ship.position,
                base_health: ship.base_health,
                health: Health::new(ship.base_health),
            }),
            enemy_archetypes: config
                .enemy_archetypes
                .into_iter()
                .map(|archetype| (archetype.id(), archetype))
                .collect(),
            turret_archetypes: config
                .turret_archetypes
                .into_iter()
                .map(|archetype| (archetype.id(), archetype))
                .collect(),
            blueprints: config
                .blueprints
                .into_iter()
                .map(|blueprint| (blueprint.id, blueprint))
                .collect(),
            spawn_points: config.spawn_points,
            enemies: EnemyRoster::new(),
            slows: TimerTable::new(),
            turrets: TurretRegistry::new(
                config
                    .build_slots
                    .iter()
                    .map(|slot| (slot.id, slot.position, slot.yaw)),
            ),
            projectiles: ProjectileResolver::new(),
            pickups: BTreeMap::new(),
            next_pickup_id: PickupId::new(0),
            zones: ZoneMap::new(&config.zones, &config.veins, wave_interval, config.rng_seed),
            ledger: EconomyLedger::new(progress.permanent_currency),
            upgrades: UpgradeEffectRegistry::new(
                config.run_upgrades,
                config.permanent_upgrades,
                progress.purchased_upgrades,
            ),
            economy: config.economy,
            ship_parts_required,
            ship_parts_collected: progress.ship_parts_collected.min(ship_parts_required),
            ship_part_registered: false,
            run_active: false,
            reaped: Vec::new(),
        }
    }

    fn start_run(&mut self, out_events: &mut Vec<Event>) {
        self.enemies.clear();
        self.slows.clear();
        self.projectiles.clear();
        self.pickups.clear();
        self.turrets.clear();
        self.zones.reset();

        self.upgrades.reapply_permanent();
        let modifiers = *self.upgrades.modifiers();

        self.ledger.reset_run(out_events);
        self.ledger.grant_primary(
            self.economy
                .starting_primary
                .saturating_add(modifiers.starting_primary_bonus()),
            out_events,
        );

        match self.ship.as_mut() {
            Some(ship) => {
                ship.health = Health::new(ship.base_health);
                ship.health.grow(modifiers.starting_ship_health_bonus());
            }
            None => log::warn!("{}", SimulationError::MissingCollaborator(Collaborator::CentralShip)),
        }

        self.ship_part_registered = false;
        self.run_active = true;
        log::info!(
            "run started with {} primary resource",
            self.ledger.balances().primary
        );
        out_events.push(Event::RunStarted);
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });
        self.slows.advance(dt);

        if let Some(ship) = self.ship.as_ref() {
            for enemy in self.enemies.iter_mut() {
                let Some(archetype) = self.enemy_archetypes.get(&enemy.archetype) else {
                    continue;
                };
                if archetype.attack_mode() == EnemyAttackMode::None {
                    continue;
                }
                if enemy.position.distance(ship.position) <= archetype.attack_range() {
                    enemy.attack_timer = enemy.attack_timer.saturating_sub(dt);
                }
            }
        }

        for turret in self.turrets.iter_mut() {
            if let Some(target) = turret.target {
                if locate(&self.enemies, self.ship.as_ref(), target).is_none() {
                    turret.target = None;
                }
            }
            turret.scan_timer = turret.scan_timer.saturating_sub(dt);
            if turret.target.is_some() {
                turret.fire_timer = turret.fire_timer.saturating_sub(dt);
            }
        }

        let mut flights = Vec::new();
        let enemies = &self.enemies;
        let ship = self.ship.as_ref();
        self.projectiles
            .advance(dt, |handle| locate(enemies, ship, handle), &mut flights);
        for flight in flights {
            match flight {
                Flight::Expired { id } => {
                    out_events.push(Event::ProjectileExpired { projectile: id });
                }
                Flight::Impact { id, projectile } => {
                    out_events.push(Event::ProjectileImpacted {
                        projectile: id,
                        position: projectile.position,
                    });
                    self.resolve_impact(&projectile, out_events);
                }
            }
        }

        if self.run_active {
            self.zones.advance(dt, out_events);
        }
    }

    fn resolve_impact(&mut self, projectile: &Projectile, out_events: &mut Vec<Event>) {
        let amount = round_to_u32(projectile.damage as f32 * self.upgrades.modifiers().damage());
        if amount == 0 {
            return;
        }

        if projectile.explosion_radius <= 0.0 {
            self.damage_entity(projectile.target, amount, out_events);
            return;
        }

        let mut caught = Vec::new();
        query::spatial(self).entities_within(
            projectile.splash_tag,
            projectile.position,
            projectile.explosion_radius,
            &mut caught,
        );
        for probe in caught {
            self.damage_entity(probe.handle, amount, out_events);
        }
    }

    fn damage_entity(&mut self, handle: EntityHandle, amount: u32, out_events: &mut Vec<Event>) {
        match handle {
            EntityHandle::Enemy(enemy) => self.damage_enemy(enemy, amount, out_events),
            EntityHandle::Ship => self.damage_ship(amount, out_events),
        }
    }

    fn damage_enemy(&mut self, id: EnemyId, amount: u32, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.get_mut(id) else {
            return;
        };
        let Some(health) = enemy.health.as_mut() else {
            return;
        };

        match health.take_damage(amount) {
            DamageOutcome::Ignored => {}
            DamageOutcome::Survived { remaining } => out_events.push(Event::EnemyDamaged {
                enemy: id,
                amount,
                remaining,
            }),
            DamageOutcome::Depleted => {
                enemy.defeated = true;
                let resource_drop = enemy.resource_drop;
                out_events.push(Event::EnemyDefeated {
                    enemy: id,
                    archetype: enemy.archetype,
                    position: enemy.position,
                    resource_drop,
                });
                let gain = self.upgrades.modifiers().resource_gain();
                self.ledger.add_resources(resource_drop, gain, out_events);
            }
        }
    }

    fn damage_ship(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        let Some(ship) = self.ship.as_mut() else {
            return;
        };

        match ship.health.take_damage(amount) {
            DamageOutcome::Ignored => {}
            DamageOutcome::Survived { remaining } => {
                out_events.push(Event::ShipDamaged { amount, remaining });
            }
            DamageOutcome::Depleted => {
                out_events.push(Event::ShipDamaged {
                    amount,
                    remaining: 0,
                });
                self.end_run_in_defeat(out_events);
            }
        }
    }

    fn end_run_in_defeat(&mut self, out_events: &mut Vec<Event>) {
        if !self.run_active {
            return;
        }

        self.run_active = false;
        let awarded =
            round_to_u32(self.ledger.invested() as f32 * self.economy.permanent_currency_rate);
        self.ledger.add_permanent_currency(awarded, out_events);
        self.ledger.reset_run(out_events);
        self.ship_part_registered = false;
        log::info!("central ship destroyed, awarding {awarded} permanent currency");
        out_events.push(Event::RunEnded {
            outcome: RunOutcome::Defeat,
            permanent_currency_awarded: awarded,
        });
    }

    fn spawn_enemy(
        &mut self,
        archetype: EnemyArchetypeId,
        position: Vec3,
        yaw: f32,
        scaling: StatScaling,
        out_events: &mut Vec<Event>,
    ) {
        let Some(template) = self.enemy_archetypes.get(&archetype) else {
            let reason = SimulationError::from(ConfigurationError::MissingEnemyArchetype(archetype));
            log::error!("{reason}");
            out_events.push(Event::EnemySpawnRejected { archetype, reason });
            return;
        };

        let id = self.enemies.allocate_id();
        let mut enemy = CombatEntity::spawn(
            id,
            template,
            position,
            yaw,
            scaling,
            self.upgrades.modifiers().enemy_health_reduction(),
        );
        out_events.push(Event::EnemySpawned {
            enemy: id,
            archetype,
            position,
        });

        if enemy.health.is_none() {
            log::warn!(
                "enemy archetype {} cannot take damage, counting it as defeated",
                archetype.get()
            );
            enemy.defeated = true;
            out_events.push(Event::EnemyDefeated {
                enemy: id,
                archetype,
                position,
                resource_drop: 0,
            });
        }
        self.enemies.insert(enemy);
    }

    fn move_enemy(&mut self, id: EnemyId, to: Vec3) {
        let Some(enemy) = self.enemies.get_mut(id) else {
            return;
        };

        let heading = to - enemy.position;
        if heading.x != 0.0 || heading.z != 0.0 {
            enemy.yaw = heading.x.atan2(heading.z).to_degrees();
        }
        enemy.position = to;
    }

    fn enemy_attack(&mut self, id: EnemyId, out_events: &mut Vec<Event>) {
        let Some(ship_position) = self.ship.as_ref().map(|ship| ship.position) else {
            return;
        };
        let Some(enemy) = self.enemies.get_mut(id) else {
            return;
        };
        let Some(archetype) = self.enemy_archetypes.get(&enemy.archetype) else {
            return;
        };
        if archetype.attack_mode() == EnemyAttackMode::None
            || !enemy.attack_timer.is_zero()
            || enemy.position.distance(ship_position) > archetype.attack_range()
        {
            return;
        }

        enemy.attack_timer = archetype.attack_cooldown();
        let damage = enemy.damage;
        match archetype.attack_mode() {
            EnemyAttackMode::None => {}
            EnemyAttackMode::Melee => {
                if damage > 0 {
                    self.damage_ship(damage, out_events);
                }
            }
            EnemyAttackMode::Ranged => {
                let Some(config) = archetype.projectile() else {
                    log::warn!(
                        "{}",
                        ConfigurationError::MissingProjectile(archetype.id())
                    );
                    return;
                };
                let projectile = self.projectiles.launch(Projectile {
                    position: enemy.position + config.spawn_offset(),
                    target: EntityHandle::Ship,
                    speed: config.speed(),
                    damage,
                    explosion_radius: config.explosion_radius(),
                    splash_tag: EntityTag::Ship,
                });
                out_events.push(Event::ProjectileLaunched {
                    projectile,
                    target: EntityHandle::Ship,
                });
            }
        }
    }

    fn assign_turret_target(
        &mut self,
        id: TurretId,
        target: Option<EntityHandle>,
        out_events: &mut Vec<Event>,
    ) {
        let target =
            target.filter(|handle| locate(&self.enemies, self.ship.as_ref(), *handle).is_some());
        let Some(turret) = self.turrets.get_mut(id) else {
            return;
        };

        turret.scan_timer = self
            .turret_archetypes
            .get(&turret.archetype)
            .map_or(Duration::ZERO, TurretArchetype::scan_interval);
        if turret.target != target {
            turret.target = target;
            out_events.push(Event::TurretTargetChanged {
                turret: id,
                target,
            });
        }
    }

    fn fire_turret(&mut self, id: TurretId, out_events: &mut Vec<Event>) {
        let Some(turret) = self.turrets.get(id) else {
            return;
        };
        if !turret.fire_timer.is_zero() {
            return;
        }
        let Some(target) = turret.target else {
            return;
        };
        if locate(&self.enemies, self.ship.as_ref(), target).is_none() {
            return;
        }
        let Some(archetype) = self.turret_archetypes.get(&turret.archetype).cloned() else {
            return;
        };
        let origin = turret.position;

        let modifiers = *self.upgrades.modifiers();
        let interval = Duration::from_secs_f32(modifiers.fire_interval_secs(archetype.fire_rate()));
        if let Some(turret) = self.turrets.get_mut(id) {
            turret.fire_timer = interval;
        }
        out_events.push(Event::TurretFired {
            turret: id,
            target,
            attack: archetype.attack(),
        });

        let scaled_damage = || {
            if archetype.apply_damage_multiplier() {
                round_to_u32(archetype.damage() as f32 * modifiers.damage()).max(1)
            } else {
                archetype.damage()
            }
        };

        match archetype.attack() {
            TurretAttackType::Projectile => {
                let projectile = self.projectiles.launch(Projectile {
                    position: origin + archetype.muzzle_offset(),
                    target,
                    speed: archetype.projectile_speed(),
                    damage: archetype.damage(),
                    explosion_radius: archetype.explosion_radius(),
                    splash_tag: archetype.enemy_tag(),
                });
                out_events.push(Event::ProjectileLaunched { projectile, target });
            }
            TurretAttackType::SlowPulse => {
                if let Some(enemy) = target.enemy() {
                    let factor = archetype.slow_factor();
                    let duration = archetype.slow_duration();
                    self.slows.start(enemy, EffectKind::Slow, duration, factor);
                    out_events.push(Event::EnemySlowed {
                        enemy,
                        factor,
                        duration,
                    });
                }
                if archetype.damage() > 0 {
                    self.damage_entity(target, scaled_damage(), out_events);
                }
            }
            TurretAttackType::DirectDamage => {
                if archetype.damage() > 0 {
                    self.damage_entity(target, scaled_damage(), out_events);
                }
            }
        }
    }

    fn build_turret(
        &mut self,
        blueprint: BlueprintId,
        slot: BuildSlotId,
        out_events: &mut Vec<Event>,
    ) -> Result<TurretId, SimulationError> {
        let recipe = self
            .blueprints
            .get(&blueprint)
            .ok_or(ConfigurationError::MissingBlueprint(blueprint))?;
        self.turrets.vacant_slot(slot)?;
        if !self.turret_archetypes.contains_key(&recipe.archetype) {
            return Err(ConfigurationError::MissingTurretArchetype(recipe.archetype).into());
        }

        self.ledger.spend(recipe.cost, out_events)?;
        self.turrets
            .place(slot, blueprint, recipe.archetype)
            .ok_or_else(|| ConfigurationError::MissingBuildSlot(slot).into())
    }

    fn spawn_ship_part(&mut self, position: Vec3, out_events: &mut Vec<Event>) {
        if !self.pickups.is_empty() {
            log::warn!("ship part already present, ignoring spawn request");
            return;
        }

        let pickup = self.next_pickup_id;
        self.next_pickup_id = PickupId::new(pickup.get().wrapping_add(1));
        let _ = self.pickups.insert(pickup, position);
        log::info!("ship part dropped at {position}");
        out_events.push(Event::ShipPartSpawned { pickup, position });
    }

    fn collect_ship_part(
        &mut self,
        pickup: PickupId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), SimulationError> {
        if !self.pickups.contains_key(&pickup) {
            return Err(ConfigurationError::MissingPickup(pickup).into());
        }
        if self.ship_parts_collected >= self.ship_parts_required {
            return Err(AlreadyApplied::ShipComplete.into());
        }
        if self.ship_part_registered {
            return Err(AlreadyApplied::ShipPart.into());
        }

        self.ship_part_registered = true;
        self.ship_parts_collected += 1;
        let _ = self.pickups.remove(&pickup);
        log::info!(
            "ship parts collected {}/{}",
            self.ship_parts_collected,
            self.ship_parts_required
        );
        out_events.push(Event::ShipPartCollected {
            pickup,
            collected: self.ship_parts_collected,
            required: self.ship_parts_required,
        });

        if self.ship_parts_collected >= self.ship_parts_required {
            self.run_active = false;
            log::info!("central ship repaired");
            out_events.push(Event::RunEnded {
                outcome: RunOutcome::Victory,
                permanent_currency_awarded: 0,
            });
        }
        Ok(())
    }

    fn reap(&mut self) {
        self.reaped.clear();
        self.enemies.reap(&mut self.reaped);
        for enemy in &self.reaped {
            self.slows.remove_entity(*enemy);
        }
    }
}

/// Current position of a live entity, or `None` once it vanished.
fn locate(
    enemies: &EnemyRoster,
    ship: Option<&CentralShip>,
    handle: EntityHandle,
) -> Option<Vec3> {
    match handle {
        EntityHandle::Enemy(id) => enemies.get(id).map(|enemy| enemy.position),
        EntityHandle::Ship => ship
            .filter(|ship| !ship.health.is_depleted())
            .map(|ship| ship.position),
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            if world.run_active {
                world.advance(dt, out_events);
            }
        }
        Command::StartRun => world.start_run(out_events),
        Command::SpawnEnemy {
            archetype,
            position,
            yaw,
            scaling,
        } => world.spawn_enemy(archetype, position, yaw, scaling, out_events),
        Command::MoveEnemy { enemy, to } => world.move_enemy(enemy, to),
        Command::EnemyAttack { enemy } => world.enemy_attack(enemy, out_events),
        Command::AssignTurretTarget { turret, target } => {
            world.assign_turret_target(turret, target, out_events);
        }
        Command::AimTurret { turret, yaw } => {
            if let Some(turret) = world.turrets.get_mut(turret) {
                turret.yaw = yaw;
            }
        }
        Command::FireTurret { turret } => world.fire_turret(turret, out_events),
        Command::BuildTurret { blueprint, slot } => {
            match world.build_turret(blueprint, slot, out_events) {
                Ok(turret) => {
                    log::debug!("turret {} built on slot {}", turret.get(), slot.get());
                    out_events.push(Event::TurretBuilt {
                        turret,
                        slot,
                        blueprint,
                    });
                }
                Err(reason) => {
                    log::warn!("turret build rejected: {reason}");
                    out_events.push(Event::TurretBuildRejected {
                        blueprint,
                        slot,
                        reason,
                    });
                }
            }
        }
        Command::ClearBuildSlot { slot } => match world.turrets.clear_slot(slot) {
            Some(turret) => out_events.push(Event::TurretRemoved { turret, slot }),
            None => log::warn!("build slot {} holds no turret", slot.get()),
        },
        Command::Mine { vein } => {
            let yield_multiplier = world.upgrades.modifiers().mining_yield();
            if let Err(reason) = world.zones.mine(
                vein,
                world.economy.mining_per_click,
                yield_multiplier,
                &mut world.ledger,
                out_events,
            ) {
                log::warn!("mining rejected: {reason}");
                out_events.push(Event::MiningRejected { vein, reason });
            }
        }
        Command::ExpandShield { zone } => {
            if let Err(reason) = world.zones.expand_shield(
                zone,
                world.economy.shield_expansion_cost,
                &mut world.ledger,
                out_events,
            ) {
                log::warn!("shield expansion rejected: {reason}");
                out_events.push(Event::ShieldExpansionRejected { zone, reason });
            }
        }
        Command::SpawnShipPart { position } => world.spawn_ship_part(position, out_events),
        Command::CollectShipPart { pickup } => {
            if let Err(reason) = world.collect_ship_part(pickup, out_events) {
                log::warn!("ship part rejected: {reason}");
                out_events.push(Event::ShipPartRejected { pickup, reason });
            }
        }
        Command::RemoveShipPart { pickup } => {
            if world.pickups.remove(&pickup).is_some() {
                out_events.push(Event::ShipPartRemoved { pickup });
            } else {
                log::warn!("ship part {} is not present", pickup.get());
            }
        }
        Command::PresentUpgradeOptions { options } => {
            let options: Vec<_> = options
                .into_iter()
                .filter(|option| world.upgrades.contains_run_upgrade(*option))
                .collect();
            if options.is_empty() {
                log::warn!(
                    "{}",
                    SimulationError::MissingCollaborator(Collaborator::UpgradeCatalog)
                );
            }
            out_events.push(Event::UpgradeOptionsGenerated { options });
        }
        Command::SelectUpgrade { upgrade } => match world.upgrades.apply_run_upgrade(upgrade) {
            Ok(effect) => {
                log::info!("run upgrade {} applied", upgrade.get());
                out_events.push(Event::UpgradeApplied { upgrade, effect });
            }
            Err(reason) => {
                log::error!("{reason}");
                out_events.push(Event::UpgradeRejected { upgrade, reason });
            }
        },
        Command::PurchasePermanentUpgrade { upgrade } => {
            match world
                .upgrades
                .purchase(upgrade, &mut world.ledger, out_events)
            {
                Ok(()) => {
                    log::info!("permanent upgrade {} purchased", upgrade.get());
                    out_events.push(Event::PermanentUpgradePurchased { upgrade });
                }
                Err(reason) => {
                    log::warn!("permanent upgrade rejected: {reason}");
                    out_events.push(Event::PermanentUpgradeRejected { upgrade, reason });
                }
            }
        }
    }

    world.reap();
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec3;
    use gravity_defence_core::{
        Blueprint, BuildSlotId, Cost, EnemyArchetype, EnemyArchetypeId, EnemyAttackMode,
        EnemySnapshot, EnemyView, EntityHandle, EntityTag, MiningResourceKind, PermanentUpgrade,
        PickupId, Probe, ProjectileId, RunModifiers, RunUpgrade, SavedProgress, ShipSnapshot,
        SpatialQuery, TurretArchetype, TurretArchetypeId, TurretId, TurretSnapshot, TurretView,
        VeinId, ZoneId,
    };

    use super::{timers::EffectKind, World};

    /// Reports whether a run is in progress.
    #[must_use]
    pub fn run_active(world: &World) -> bool {
        world.run_active
    }

    /// Captures the central ship, if the map has one.
    #[must_use]
    pub fn ship(world: &World) -> Option<ShipSnapshot> {
        world.ship.as_ref().map(|ship| ShipSnapshot {
            position: ship.position,
            health: ship.health,
        })
    }

    /// Positions enemies may appear at.
    #[must_use]
    pub fn spawn_points(world: &World) -> &[Vec3] {
        &world.spawn_points
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .enemies
            .iter()
            .map(|enemy| {
                let archetype = world.enemy_archetypes.get(&enemy.archetype);
                EnemySnapshot {
                    id: enemy.id,
                    archetype: enemy.archetype,
                    position: enemy.position,
                    yaw: enemy.yaw,
                    health: enemy.health,
                    move_speed: enemy.move_speed,
                    slow_factor: world
                        .slows
                        .magnitude(enemy.id, EffectKind::Slow)
                        .unwrap_or(0.0),
                    attack_mode: archetype.map_or(EnemyAttackMode::None, |a| a.attack_mode()),
                    attack_range: archetype.map_or(0.0, |a| a.attack_range()),
                    stop_when_in_range: archetype.is_some_and(|a| a.stop_when_in_range()),
                    attack_ready: enemy.attack_timer.is_zero(),
                }
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of every built turret.
    #[must_use]
    pub fn turret_view(world: &World) -> TurretView<'_> {
        let snapshots = world
            .turrets
            .iter()
            .filter_map(|turret| {
                let archetype = world.turret_archetypes.get(&turret.archetype)?;
                Some(TurretSnapshot {
                    id: turret.id,
                    slot: turret.slot,
                    blueprint: turret.blueprint,
                    archetype,
                    position: turret.position,
                    yaw: turret.yaw,
                    target: turret.target,
                    scan_ready: turret.scan_timer.is_zero(),
                    fire_ready: turret.fire_timer.is_zero(),
                })
            })
            .collect();
        TurretView::from_snapshots(snapshots)
    }

    /// Exposes the spatial query collaborator backed by the world.
    #[must_use]
    pub fn spatial(world: &World) -> SpatialView<'_> {
        SpatialView { world }
    }

    /// Current global modifier table.
    #[must_use]
    pub fn modifiers(world: &World) -> RunModifiers {
        *world.upgrades.modifiers()
    }

    /// Run resource balances.
    #[must_use]
    pub fn balances(world: &World) -> Cost {
        world.ledger.balances()
    }

    /// Permanent currency balance.
    #[must_use]
    pub fn permanent_currency(world: &World) -> u32 {
        world.ledger.permanent_currency()
    }

    /// Resources spent during the current run.
    #[must_use]
    pub fn invested(world: &World) -> u64 {
        world.ledger.invested()
    }

    /// Progress that must survive between runs.
    #[must_use]
    pub fn saved_progress(world: &World) -> SavedProgress {
        SavedProgress {
            purchased_upgrades: world.upgrades.purchased().to_vec(),
            permanent_currency: world.ledger.permanent_currency(),
            ship_parts_collected: world.ship_parts_collected,
        }
    }

    /// Ship-part recovery progress.
    #[must_use]
    pub fn ship_parts(world: &World) -> ShipPartProgress {
        ShipPartProgress {
            collected: world.ship_parts_collected,
            required: world.ship_parts_required,
            registered_this_run: world.ship_part_registered,
        }
    }

    /// Uncollected ship-part pickups.
    #[must_use]
    pub fn pickups(world: &World) -> Vec<PickupSnapshot> {
        world
            .pickups
            .iter()
            .map(|(id, position)| PickupSnapshot {
                id: *id,
                position: *position,
            })
            .collect()
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|(id, projectile)| ProjectileSnapshot {
                id,
                position: projectile.position,
                target: projectile.target,
            })
            .collect()
    }

    /// Map zones in identifier order.
    #[must_use]
    pub fn zones(world: &World) -> Vec<ZoneSnapshot> {
        world
            .zones
            .zones()
            .map(|(id, zone)| ZoneSnapshot {
                id,
                position: zone.position,
                shielded: zone.shielded,
                central: zone.central,
            })
            .collect()
    }

    /// Resource veins in identifier order.
    #[must_use]
    pub fn veins(world: &World) -> Vec<VeinSnapshot> {
        world
            .zones
            .veins()
            .map(|(id, vein)| VeinSnapshot {
                id,
                kind: vein.kind,
                remaining: vein.remaining,
                position: vein.position,
                zone: vein.zone,
            })
            .collect()
    }

    /// Time left before the next gravitational wave.
    #[must_use]
    pub fn gravitational_wave_remaining(world: &World) -> Duration {
        world.zones.wave_remaining()
    }

    /// Turret recipes in identifier order.
    pub fn blueprints(world: &World) -> impl Iterator<Item = &Blueprint> {
        world.blueprints.values()
    }

    /// Build slots and their occupants.
    #[must_use]
    pub fn build_slots(world: &World) -> Vec<BuildSlotSnapshot> {
        world
            .turrets
            .slots()
            .map(|(id, slot)| BuildSlotSnapshot {
                id,
                position: slot.position,
                turret: slot.turret,
            })
            .collect()
    }

    /// Run-scoped upgrade catalog in identifier order.
    pub fn run_upgrades(world: &World) -> impl Iterator<Item = &RunUpgrade> {
        world.upgrades.run_upgrades()
    }

    /// Permanent upgrade catalog in identifier order.
    pub fn permanent_upgrades(world: &World) -> impl Iterator<Item = &PermanentUpgrade> {
        world.upgrades.permanent_upgrades()
    }

    /// Looks up an enemy template.
    #[must_use]
    pub fn enemy_archetype(world: &World, id: EnemyArchetypeId) -> Option<&EnemyArchetype> {
        world.enemy_archetypes.get(&id)
    }

    /// Looks up a turret template.
    #[must_use]
    pub fn turret_archetype(world: &World, id: TurretArchetypeId) -> Option<&TurretArchetype> {
        world.turret_archetypes.get(&id)
    }

    /// [`SpatialQuery`] implementation reading live world state.
    #[derive(Clone, Copy, Debug)]
    pub struct SpatialView<'a> {
        world: &'a World,
    }

    impl SpatialQuery for SpatialView<'_> {
        fn entities_within(&self, tag: EntityTag, center: Vec3, radius: f32, out: &mut Vec<Probe>) {
            match tag {
                EntityTag::Enemy => {
                    for enemy in self.world.enemies.iter() {
                        if enemy.position.distance(center) <= radius {
                            out.push(Probe {
                                handle: EntityHandle::Enemy(enemy.id),
                                position: enemy.position,
                                health: enemy.health,
                            });
                        }
                    }
                }
                EntityTag::Ship => {
                    if let Some(ship) = self.world.ship.as_ref() {
                        if !ship.health.is_depleted() && ship.position.distance(center) <= radius {
                            out.push(Probe {
                                handle: EntityHandle::Ship,
                                position: ship.position,
                                health: Some(ship.health),
                            });
                        }
                    }
                }
            }
        }
    }

    /// Ship-part recovery progress.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ShipPartProgress {
        /// Parts recovered across every run.
        pub collected: u32,
        /// Parts needed for victory.
        pub required: u32,
        /// Whether a part was already registered during the current run.
        pub registered_this_run: bool,
    }

    /// Uncollected ship-part pickup.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct PickupSnapshot {
        /// Identifier of the pickup.
        pub id: PickupId,
        /// Location of the pickup.
        pub position: Vec3,
    }

    /// Projectile in flight.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ProjectileSnapshot {
        /// Identifier of the projectile.
        pub id: ProjectileId,
        /// Current position.
        pub position: Vec3,
        /// Entity the projectile seeks.
        pub target: EntityHandle,
    }

    /// Map zone state.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ZoneSnapshot {
        /// Identifier of the zone.
        pub id: ZoneId,
        /// Current position.
        pub position: Vec3,
        /// Whether the zone is protected by the shield.
        pub shielded: bool,
        /// Whether the zone is the central zone.
        pub central: bool,
    }

    /// Resource vein state.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct VeinSnapshot {
        /// Identifier of the vein.
        pub id: VeinId,
        /// Resource yielded.
        pub kind: MiningResourceKind,
        /// Resource left.
        pub remaining: u32,
        /// Current position.
        pub position: Vec3,
        /// Zone the vein is anchored to.
        pub zone: Option<ZoneId>,
    }

    /// Build slot and its occupant.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct BuildSlotSnapshot {
        /// Identifier of the slot.
        pub id: BuildSlotId,
        /// Position of the slot.
        pub position: Vec3,
        /// Turret occupying the slot.
        pub turret: Option<TurretId>,
    }
}

#[cfg(test)]
mod tests {
    use gravity_defence_core::{
        InsufficientResources, PermanentUpgradeId, TargetingPolicy, UpgradeEffect, UpgradeKind,
    };

    use super::*;

    fn config() -> WorldConfig {
        WorldConfig {
            ship: Some(ShipConfig {
                position: Vec3::ZERO,
                base_health: 100,
            }),
            enemy_archetypes: vec![EnemyArchetype::new(EnemyArchetypeId::new(0), "swarmer")
                .with_base_health(20)
                .with_damage(10)
                .with_resource_drop(5)
                .with_attack(EnemyAttackMode::Melee, 1.5, Duration::from_secs(1))],
            turret_archetypes: vec![TurretArchetype::new(TurretArchetypeId::new(0), "gun")
                .with_range(0.0, 20.0)
                .with_attack(TurretAttackType::DirectDamage, 10)
                .with_targeting(TargetingPolicy::ClosestToTurret)],
            blueprints: vec![Blueprint {
                id: BlueprintId::new(0),
                name: "gun".into(),
                archetype: TurretArchetypeId::new(0),
                cost: Cost::new(50, 0, 0),
            }],
            build_slots: vec![BuildSlotConfig {
                id: BuildSlotId::new(0),
                position: Vec3::new(5.0, 0.0, 0.0),
                yaw: 0.0,
            }],
            spawn_points: vec![Vec3::new(10.0, 0.0, 0.0)],
            permanent_upgrades: vec![
                PermanentUpgrade {
                    id: PermanentUpgradeId::new(0),
                    name: "supply cache".into(),
                    effect: UpgradeEffect::new(UpgradeKind::StartingPrimaryResource, 100.0),
                    cost: 0,
                },
                PermanentUpgrade {
                    id: PermanentUpgradeId::new(1),
                    name: "plating".into(),
                    effect: UpgradeEffect::new(UpgradeKind::StartingShipHealth, 25.0),
                    cost: 0,
                },
            ],
            ..WorldConfig::default()
        }
    }

    fn started(progress: SavedProgress) -> (World, Vec<Event>) {
        let mut world = World::new(config(), progress);
        let mut events = Vec::new();
        apply(&mut world, Command::StartRun, &mut events);
        (world, events)
    }

    fn spawn_at(world: &mut World, position: Vec3) -> EnemyId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnEnemy {
                archetype: EnemyArchetypeId::new(0),
                position,
                yaw: 0.0,
                scaling: StatScaling::IDENTITY,
            },
            &mut events,
        );
        events
            .iter()
            .find_map(|event| match event {
                Event::EnemySpawned { enemy, .. } => Some(*enemy),
                _ => None,
            })
            .expect("enemy spawned")
    }

    #[test]
    fn start_run_grants_starting_bonuses() {
        let (world, events) = started(SavedProgress {
            purchased_upgrades: vec![PermanentUpgradeId::new(0), PermanentUpgradeId::new(1)],
            ..SavedProgress::default()
        });

        assert!(query::run_active(&world));
        assert_eq!(query::balances(&world).primary, 100);
        let ship = query::ship(&world).expect("ship configured");
        assert_eq!(ship.health.max(), 125);
        assert_eq!(ship.health.current(), 125);
        assert_eq!(events.last(), Some(&Event::RunStarted));
    }

    #[test]
    fn base_starting_primary_stacks_with_bonus() {
        let mut config = config();
        config.economy.starting_primary = 30;
        let mut world = World::new(
            config,
            SavedProgress {
                purchased_upgrades: vec![PermanentUpgradeId::new(0)],
                ..SavedProgress::default()
            },
        );
        let mut events = Vec::new();
        apply(&mut world, Command::StartRun, &mut events);
        assert_eq!(query::balances(&world).primary, 130);
    }

    #[test]
    fn ticks_are_ignored_until_run_starts() {
        let mut world = World::new(config(), SavedProgress::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn build_rejects_before_spending() {
        let (mut world, _) = started(SavedProgress::default());
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::BuildTurret {
                blueprint: BlueprintId::new(0),
                slot: BuildSlotId::new(0),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TurretBuildRejected {
                blueprint: BlueprintId::new(0),
                slot: BuildSlotId::new(0),
                reason: InsufficientResources {
                    required: Cost::new(50, 0, 0),
                    available: Cost::default(),
                }
                .into(),
            }]
        );
        assert_eq!(query::invested(&world), 0);
    }

    #[test]
    fn built_turret_counts_toward_invested() {
        let (mut world, _) = started(SavedProgress {
            purchased_upgrades: vec![PermanentUpgradeId::new(0)],
            ..SavedProgress::default()
        });
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::BuildTurret {
                blueprint: BlueprintId::new(0),
                slot: BuildSlotId::new(0),
            },
            &mut events,
        );
        assert!(matches!(events.last(), Some(Event::TurretBuilt { .. })));
        assert_eq!(query::balances(&world).primary, 50);
        assert_eq!(query::invested(&world), 50);

        events.clear();
        apply(
            &mut world,
            Command::BuildTurret {
                blueprint: BlueprintId::new(0),
                slot: BuildSlotId::new(0),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TurretBuildRejected {
                blueprint: BlueprintId::new(0),
                slot: BuildSlotId::new(0),
                reason: AlreadyApplied::SlotOccupied(BuildSlotId::new(0)).into(),
            }]
        );
    }

    #[test]
    fn melee_attack_waits_for_cooldown_inside_range() {
        let (mut world, _) = started(SavedProgress::default());
        let enemy = spawn_at(&mut world, Vec3::new(1.0, 0.0, 0.0));
        let mut events = Vec::new();

        apply(&mut world, Command::EnemyAttack { enemy }, &mut events);
        assert!(events.is_empty());

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        assert!(query::enemy_view(&world)
            .iter()
            .all(|snapshot| snapshot.attack_ready));

        events.clear();
        apply(&mut world, Command::EnemyAttack { enemy }, &mut events);
        assert_eq!(
            events,
            vec![Event::ShipDamaged {
                amount: 10,
                remaining: 90
            }]
        );
    }

    #[test]
    fn defeated_enemy_grants_drop_once() {
        let (mut world, _) = started(SavedProgress::default());
        let enemy = spawn_at(&mut world, Vec3::new(10.0, 0.0, 0.0));
        let mut events = Vec::new();

        world.damage_enemy(enemy, 25, &mut events);
        world.damage_enemy(enemy, 25, &mut events);
        world.reap();

        let defeats = events
            .iter()
            .filter(|event| matches!(event, Event::EnemyDefeated { .. }))
            .count();
        assert_eq!(defeats, 1);
        assert_eq!(query::balances(&world).primary, 5);
        assert_eq!(query::enemy_view(&world).iter().count(), 0);
    }

    #[test]
    fn ship_destruction_awards_ten_percent_of_investment() {
        let (mut world, _) = started(SavedProgress {
            purchased_upgrades: vec![PermanentUpgradeId::new(0)],
            ..SavedProgress::default()
        });
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BuildTurret {
                blueprint: BlueprintId::new(0),
                slot: BuildSlotId::new(0),
            },
            &mut events,
        );

        events.clear();
        world.damage_ship(200, &mut events);

        assert!(events.contains(&Event::RunEnded {
            outcome: RunOutcome::Defeat,
            permanent_currency_awarded: 5
        }));
        assert_eq!(query::permanent_currency(&world), 5);
        assert_eq!(query::balances(&world), Cost::default());
        assert!(!query::run_active(&world));
    }

    #[test]
    fn ship_part_registers_once_per_run() {
        let (mut world, _) = started(SavedProgress::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnShipPart {
                position: Vec3::ONE,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::CollectShipPart {
                pickup: PickupId::new(0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnShipPart {
                position: Vec3::ONE,
            },
            &mut events,
        );

        events.clear();
        apply(
            &mut world,
            Command::CollectShipPart {
                pickup: PickupId::new(1),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::ShipPartRejected {
                pickup: PickupId::new(1),
                reason: AlreadyApplied::ShipPart.into(),
            }]
        );
        assert_eq!(query::ship_parts(&world).collected, 1);
        assert_eq!(query::pickups(&world).len(), 1);
    }

    #[test]
    fn final_ship_part_wins_the_run() {
        let (mut world, _) = started(SavedProgress {
            ship_parts_collected: 4,
            ..SavedProgress::default()
        });
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnShipPart {
                position: Vec3::ONE,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::CollectShipPart {
                pickup: PickupId::new(0),
            },
            &mut events,
        );

        assert_eq!(
            events.last(),
            Some(&Event::RunEnded {
                outcome: RunOutcome::Victory,
                permanent_currency_awarded: 0
            })
        );
        assert_eq!(query::saved_progress(&world).ship_parts_collected, 5);
    }

    #[test]
    fn spatial_view_reports_enemies_within_radius() {
        let (mut world, _) = started(SavedProgress::default());
        let near = spawn_at(&mut world, Vec3::new(2.0, 0.0, 0.0));
        let _far = spawn_at(&mut world, Vec3::new(30.0, 0.0, 0.0));

        let mut probes = Vec::new();
        gravity_defence_core::SpatialQuery::entities_within(
            &query::spatial(&world),
            EntityTag::Enemy,
            Vec3::ZERO,
            5.0,
            &mut probes,
        );
        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0].handle, EntityHandle::Enemy(near));
    }
}
