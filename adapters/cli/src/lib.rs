#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver that wires the world and every system into one tick pipeline.
//!
//! [`Simulation`] owns the authoritative world, the pure systems and an event
//! journal. Each system keeps a cursor into the journal so it observes every
//! event exactly once, even events produced after it ran in the previous step.

mod autopilot;
mod config;
mod store;

use std::time::Duration;

use gravity_defence_core::{
    Collaborator, Command, Event, EventBus, ProgressStore, RunUpgradeId, SavedProgress,
    SimulationError, SubscriptionId,
};
use gravity_defence_system_enemy_behaviour::EnemyBehaviour;
use gravity_defence_system_turret_combat::TurretCombat;
use gravity_defence_system_turret_targeting::TurretTargeting;
use gravity_defence_system_upgrade_offers::UpgradeOffers;
use gravity_defence_system_wave_director::WaveDirector;
use gravity_defence_world::{self as world, query, World};

pub use autopilot::Autopilot;
pub use config::{OfferSettings, SimulationConfig, WaveSettings};
pub use store::JsonProgressStore;

/// Journal positions of the systems that consume events.
#[derive(Clone, Copy, Debug, Default)]
struct Cursors {
    wave_director: usize,
    upgrade_offers: usize,
    enemy_behaviour: usize,
    turret_targeting: usize,
}

impl Cursors {
    fn oldest(&self) -> usize {
        self.wave_director
            .min(self.upgrade_offers)
            .min(self.enemy_behaviour)
            .min(self.turret_targeting)
    }

    fn rebase(&mut self, consumed: usize) {
        self.wave_director -= consumed;
        self.upgrade_offers -= consumed;
        self.enemy_behaviour -= consumed;
        self.turret_targeting -= consumed;
    }
}

/// A complete run simulation driven one fixed step at a time.
pub struct Simulation {
    world: World,
    wave_director: WaveDirector,
    upgrade_offers: UpgradeOffers,
    enemy_behaviour: EnemyBehaviour,
    turret_targeting: TurretTargeting,
    turret_combat: TurretCombat,
    run_upgrades: Vec<RunUpgradeId>,
    journal: Vec<Event>,
    cursors: Cursors,
    commands: Vec<Command>,
    bus: EventBus,
    store: Option<Box<dyn ProgressStore>>,
}

impl Simulation {
    /// Builds a simulation, loading saved progress from `store` when one is provided.
    ///
    /// Load failures are logged and the simulation starts from empty progress.
    #[must_use]
    pub fn new(config: SimulationConfig, mut store: Option<Box<dyn ProgressStore>>) -> Self {
        let progress = match store.as_mut() {
            Some(store) => store.load().unwrap_or_else(|error| {
                log::warn!("failed to load saved progress, starting empty: {error}");
                SavedProgress::default()
            }),
            None => {
                log::debug!(
                    "{}, progress will not persist",
                    SimulationError::MissingCollaborator(Collaborator::ProgressStore)
                );
                SavedProgress::default()
            }
        };

        let world = World::new(config.world_config(), progress);
        let run_upgrades = query::run_upgrades(&world)
            .map(|upgrade| upgrade.id)
            .collect();

        Self {
            world,
            wave_director: WaveDirector::new(config.wave_director_config()),
            upgrade_offers: UpgradeOffers::new(config.upgrade_offers_config()),
            enemy_behaviour: EnemyBehaviour::new(),
            turret_targeting: TurretTargeting::new(),
            turret_combat: TurretCombat::new(),
            run_upgrades,
            journal: Vec::new(),
            cursors: Cursors::default(),
            commands: Vec::new(),
            bus: EventBus::new(),
            store,
        }
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read-only access to the wave director.
    #[must_use]
    pub fn wave_director(&self) -> &WaveDirector {
        &self.wave_director
    }

    /// Registers an observer that receives every event published after each step.
    pub fn subscribe(&mut self, handler: impl FnMut(&Event) + 'static) -> SubscriptionId {
        self.bus.subscribe(handler)
    }

    /// Removes an observer. Returns `false` when the handle was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Applies `inputs`, advances the world by `dt` and runs every system once.
    ///
    /// Returns the events produced during the step, in the order they were
    /// published to subscribers.
    pub fn step(&mut self, dt: Duration, inputs: impl IntoIterator<Item = Command>) -> Vec<Event> {
        let step_start = self.journal.len();

        for command in inputs {
            world::apply(&mut self.world, command, &mut self.journal);
        }
        world::apply(&mut self.world, Command::Tick { dt }, &mut self.journal);

        self.run_wave_director();
        self.run_upgrade_offers();
        self.run_enemy_behaviour();
        self.run_turret_targeting();
        self.run_turret_combat();

        let produced = self.journal[step_start..].to_vec();
        self.bus.publish(&produced);
        self.persist_if_changed(&produced);
        self.compact_journal();
        produced
    }

    fn run_wave_director(&mut self) {
        let start = self.cursors.wave_director;
        self.cursors.wave_director = self.journal.len();

        let parts = query::ship_parts(&self.world);
        let ship_part_blocked = parts.registered_this_run || parts.collected >= parts.required;
        let mut presentation = Vec::new();
        self.wave_director.handle(
            &self.journal[start..],
            query::spawn_points(&self.world),
            ship_part_blocked,
            !self.run_upgrades.is_empty(),
            &mut self.commands,
            &mut presentation,
        );
        self.journal.extend(presentation);
        self.flush_commands();
    }

    fn run_upgrade_offers(&mut self) {
        let start = self.cursors.upgrade_offers;
        self.cursors.upgrade_offers = self.journal.len();

        self.upgrade_offers.handle(
            &self.journal[start..],
            &self.run_upgrades,
            &mut self.commands,
        );
        self.flush_commands();
    }

    fn run_enemy_behaviour(&mut self) {
        let start = self.cursors.enemy_behaviour;
        self.cursors.enemy_behaviour = self.journal.len();

        let ship = query::ship(&self.world).map(|ship| ship.position);
        self.enemy_behaviour.handle(
            &self.journal[start..],
            &query::enemy_view(&self.world),
            ship,
            &query::modifiers(&self.world),
            &mut self.commands,
        );
        self.flush_commands();
    }

    fn run_turret_targeting(&mut self) {
        let start = self.cursors.turret_targeting;
        self.cursors.turret_targeting = self.journal.len();

        let ship = query::ship(&self.world).map(|ship| ship.position);
        self.turret_targeting.handle(
            &self.journal[start..],
            &query::turret_view(&self.world),
            &query::enemy_view(&self.world),
            &query::spatial(&self.world),
            ship,
            &query::modifiers(&self.world),
            &mut self.commands,
        );
        self.flush_commands();
    }

    fn run_turret_combat(&mut self) {
        self.turret_combat.handle(
            query::run_active(&self.world),
            &query::turret_view(&self.world),
            &mut self.commands,
        );
        self.flush_commands();
    }

    fn flush_commands(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.journal);
        }
    }

    fn persist_if_changed(&mut self, produced: &[Event]) {
        let changed = produced.iter().any(|event| {
            matches!(
                event,
                Event::PermanentUpgradePurchased { .. }
                    | Event::ShipPartCollected { .. }
                    | Event::RunEnded { .. }
            )
        });
        if !changed {
            return;
        }

        let Some(store) = self.store.as_mut() else {
            return;
        };
        let progress = query::saved_progress(&self.world);
        match store.save(&progress) {
            Ok(()) => log::debug!(
                "progress saved: {} currency, {} ship parts",
                progress.permanent_currency,
                progress.ship_parts_collected
            ),
            Err(error) => log::error!("failed to save progress: {error}"),
        }
    }

    fn compact_journal(&mut self) {
        let consumed = self.cursors.oldest();
        if consumed == 0 {
            return;
        }
        let _ = self.journal.drain(..consumed);
        self.cursors.rebase(consumed);
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.bus.clear();
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("wave", &self.wave_director.wave())
            .field("phase", &self.wave_director.phase())
            .field("journal", &self.journal.len())
            .field("bus", &self.bus)
            .field("store", &self.store.is_some())
            .finish()
    }
}
