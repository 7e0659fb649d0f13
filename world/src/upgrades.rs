//! Upgrade catalogs and the live modifier table.

use std::collections::BTreeMap;

use gravity_defence_core::{
    AlreadyApplied, ConfigurationError, Event, PermanentUpgrade, PermanentUpgradeId, RunModifiers,
    RunUpgrade, RunUpgradeId, SimulationError, UpgradeEffect,
};

use crate::economy::EconomyLedger;

/// Owns both upgrade catalogs, the purchased permanent set and the modifier table.
#[derive(Debug)]
pub(crate) struct UpgradeEffectRegistry {
    modifiers: RunModifiers,
    run_catalog: BTreeMap<RunUpgradeId, RunUpgrade>,
    permanent_catalog: BTreeMap<PermanentUpgradeId, PermanentUpgrade>,
    purchased: Vec<PermanentUpgradeId>,
}

impl UpgradeEffectRegistry {
    pub(crate) fn new(
        run_upgrades: impl IntoIterator<Item = RunUpgrade>,
        permanent_upgrades: impl IntoIterator<Item = PermanentUpgrade>,
        purchased: Vec<PermanentUpgradeId>,
    ) -> Self {
        let mut registry = Self {
            modifiers: RunModifiers::baseline(),
            run_catalog: run_upgrades
                .into_iter()
                .map(|upgrade| (upgrade.id, upgrade))
                .collect(),
            permanent_catalog: permanent_upgrades
                .into_iter()
                .map(|upgrade| (upgrade.id, upgrade))
                .collect(),
            purchased: Vec::new(),
        };

        for id in purchased {
            if !registry.permanent_catalog.contains_key(&id) {
                log::warn!("dropping unknown purchased upgrade {}", id.get());
                continue;
            }
            if !registry.purchased.contains(&id) {
                registry.purchased.push(id);
            }
        }
        registry.reapply_permanent();
        registry
    }

    pub(crate) fn modifiers(&self) -> &RunModifiers {
        &self.modifiers
    }

    /// Resets the modifier table to the baseline plus every purchased permanent effect.
    pub(crate) fn reapply_permanent(&mut self) {
        let catalog = &self.permanent_catalog;
        self.modifiers.rebuild(
            self.purchased
                .iter()
                .filter_map(|id| catalog.get(id))
                .map(|upgrade| &upgrade.effect),
        );
    }

    /// Buys a permanent upgrade and applies its effect immediately.
    pub(crate) fn purchase(
        &mut self,
        id: PermanentUpgradeId,
        ledger: &mut EconomyLedger,
        out: &mut Vec<Event>,
    ) -> Result<(), SimulationError> {
        let upgrade = self
            .permanent_catalog
            .get(&id)
            .ok_or(ConfigurationError::MissingPermanentUpgrade(id))?;
        if self.purchased.contains(&id) {
            return Err(AlreadyApplied::PermanentUpgrade(id).into());
        }

        ledger.spend_permanent_currency(upgrade.cost, out)?;
        self.modifiers.apply(&upgrade.effect);
        self.purchased.push(id);
        Ok(())
    }

    /// Adds the effect of a run-scoped upgrade to the modifier table.
    pub(crate) fn apply_run_upgrade(
        &mut self,
        id: RunUpgradeId,
    ) -> Result<UpgradeEffect, SimulationError> {
        let upgrade = self
            .run_catalog
            .get(&id)
            .ok_or(ConfigurationError::MissingRunUpgrade(id))?;
        self.modifiers.apply(&upgrade.effect);
        Ok(upgrade.effect)
    }

    pub(crate) fn contains_run_upgrade(&self, id: RunUpgradeId) -> bool {
        self.run_catalog.contains_key(&id)
    }

    pub(crate) fn run_upgrades(&self) -> impl Iterator<Item = &RunUpgrade> {
        self.run_catalog.values()
    }

    pub(crate) fn permanent_upgrades(&self) -> impl Iterator<Item = &PermanentUpgrade> {
        self.permanent_catalog.values()
    }

    pub(crate) fn purchased(&self) -> &[PermanentUpgradeId] {
        &self.purchased
    }
}
