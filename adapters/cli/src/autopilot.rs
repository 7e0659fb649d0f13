//! Scripted player used for unattended runs.

use gravity_defence_core::{Command, Cost, Event, RunOutcome};
use gravity_defence_world::{query, World};

/// Deterministic player that reacts to the events of the previous step.
///
/// It picks the first offered upgrade, collects every ship part, fills free
/// build slots with the first affordable blueprint, shields zones when the
/// budget allows, mines the first vein and restarts after each run, buying
/// affordable permanent upgrades in between.
#[derive(Clone, Debug)]
pub struct Autopilot {
    shield_cost: Cost,
    restart_pending: bool,
    victories: u32,
    defeats: u32,
}

impl Autopilot {
    /// Creates an autopilot that shields zones for `shield_cost`.
    #[must_use]
    pub const fn new(shield_cost: Cost) -> Self {
        Self {
            shield_cost,
            restart_pending: false,
            victories: 0,
            defeats: 0,
        }
    }

    /// Runs that ended with the ship repaired.
    #[must_use]
    pub const fn victories(&self) -> u32 {
        self.victories
    }

    /// Runs that ended with the ship destroyed.
    #[must_use]
    pub const fn defeats(&self) -> u32 {
        self.defeats
    }

    /// Queues the inputs for the next step into `out`.
    pub fn plan(&mut self, world: &World, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::UpgradeOptionsGenerated { options } => {
                    if let Some(upgrade) = options.first() {
                        out.push(Command::SelectUpgrade { upgrade: *upgrade });
                    }
                }
                Event::ShipPartSpawned { pickup, .. } => {
                    out.push(Command::CollectShipPart { pickup: *pickup });
                }
                Event::RunEnded { outcome, .. } => {
                    match outcome {
                        RunOutcome::Victory => self.victories += 1,
                        RunOutcome::Defeat => self.defeats += 1,
                    }
                    self.restart_pending = true;
                }
                _ => {}
            }
        }

        if self.restart_pending {
            self.restart_pending = false;
            buy_permanent_upgrades(world, out);
            out.push(Command::StartRun);
            return;
        }

        if !query::run_active(world) {
            return;
        }

        let mut budget = query::balances(world);
        for slot in query::build_slots(world) {
            if slot.turret.is_some() {
                continue;
            }
            let Some(blueprint) =
                query::blueprints(world).find(|blueprint| blueprint.cost.covered_by(&budget))
            else {
                break;
            };
            spend(&mut budget, &blueprint.cost);
            out.push(Command::BuildTurret {
                blueprint: blueprint.id,
                slot: slot.id,
            });
        }

        if self.shield_cost.covered_by(&budget) {
            if let Some(zone) = query::zones(world).into_iter().find(|zone| !zone.shielded) {
                out.push(Command::ExpandShield { zone: zone.id });
            }
        }

        if let Some(vein) = query::veins(world)
            .into_iter()
            .find(|vein| vein.remaining > 0)
        {
            out.push(Command::Mine { vein: vein.id });
        }
    }
}

fn buy_permanent_upgrades(world: &World, out: &mut Vec<Command>) {
    let purchased = query::saved_progress(world).purchased_upgrades;
    let mut currency = query::permanent_currency(world);
    for upgrade in query::permanent_upgrades(world) {
        if purchased.contains(&upgrade.id) || upgrade.cost > currency {
            continue;
        }
        currency -= upgrade.cost;
        out.push(Command::PurchasePermanentUpgrade {
            upgrade: upgrade.id,
        });
    }
}

fn spend(budget: &mut Cost, cost: &Cost) {
    budget.primary = budget.primary.saturating_sub(cost.primary);
    budget.mining_a = budget.mining_a.saturating_sub(cost.mining_a);
    budget.mining_b = budget.mining_b.saturating_sub(cost.mining_b);
}
