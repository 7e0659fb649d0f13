//! Map zones, resource veins and the gravitational wave that shuffles them.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec3;
use gravity_defence_core::{
    round_to_u32, AlreadyApplied, ConfigurationError, Cost, Event, MiningResourceKind,
    SimulationError, VeinId, ZoneId,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{economy::EconomyLedger, VeinConfig, ZoneConfig};

/// Live state of a map zone.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Zone {
    pub(crate) position: Vec3,
    pub(crate) shielded: bool,
    pub(crate) central: bool,
    vein_spawn_chance: f32,
    vein_kinds: Vec<MiningResourceKind>,
    vein_amount: u32,
    vein_offset: Vec3,
    spawned_vein: bool,
}

/// Live state of a resource vein.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Vein {
    pub(crate) kind: MiningResourceKind,
    pub(crate) remaining: u32,
    pub(crate) position: Vec3,
    /// Zone the vein is anchored to; anchored veins follow their zone.
    pub(crate) zone: Option<ZoneId>,
}

/// Zones, veins and the gravitational-wave timer.
#[derive(Debug)]
pub(crate) struct ZoneMap {
    zone_layout: Vec<ZoneConfig>,
    vein_layout: Vec<VeinConfig>,
    zones: BTreeMap<ZoneId, Zone>,
    veins: BTreeMap<VeinId, Vein>,
    next_vein_id: VeinId,
    wave_interval: Duration,
    wave_remaining: Duration,
    rng: ChaCha8Rng,
}

impl ZoneMap {
    pub(crate) fn new(
        zones: &[ZoneConfig],
        veins: &[VeinConfig],
        wave_interval: Duration,
        seed: u64,
    ) -> Self {
        let mut map = Self {
            zone_layout: zones.to_vec(),
            vein_layout: veins.to_vec(),
            zones: BTreeMap::new(),
            veins: BTreeMap::new(),
            next_vein_id: VeinId::new(0),
            wave_interval,
            wave_remaining: wave_interval,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        map.reset();
        map
    }

    /// Restores the configured layout: only central zones shielded, configured veins full.
    pub(crate) fn reset(&mut self) {
        self.zones = self
            .zone_layout
            .iter()
            .map(|config| {
                (
                    config.id,
                    Zone {
                        position: config.position,
                        shielded: config.central,
                        central: config.central,
                        vein_spawn_chance: config.vein_spawn_chance.clamp(0.0, 1.0),
                        vein_kinds: config.vein_kinds.clone(),
                        vein_amount: config.vein_amount,
                        vein_offset: config.vein_offset,
                        spawned_vein: false,
                    },
                )
            })
            .collect();

        self.veins = self
            .vein_layout
            .iter()
            .filter(|config| config.amount > 0)
            .map(|config| {
                (
                    config.id,
                    Vein {
                        kind: config.kind,
                        remaining: config.amount,
                        position: config.position,
                        zone: None,
                    },
                )
            })
            .collect();

        let highest = self.vein_layout.iter().map(|config| config.id.get()).max();
        self.next_vein_id = VeinId::new(highest.map_or(0, |id| id.wrapping_add(1)));
        self.wave_remaining = self.wave_interval;
    }

    /// Extracts one mining action's worth of resource from a vein.
    pub(crate) fn mine(
        &mut self,
        id: VeinId,
        per_click: u32,
        yield_multiplier: f32,
        ledger: &mut EconomyLedger,
        out: &mut Vec<Event>,
    ) -> Result<(), SimulationError> {
        let vein = self
            .veins
            .get_mut(&id)
            .ok_or(ConfigurationError::MissingVein(id))?;

        let amount = round_to_u32(per_click as f32 * yield_multiplier).min(vein.remaining);
        if amount == 0 {
            return Ok(());
        }

        vein.remaining -= amount;
        let kind = vein.kind;
        let depleted = vein.remaining == 0;
        ledger.add_mining(kind, amount, out);
        out.push(Event::VeinMined {
            vein: id,
            kind,
            amount,
        });

        if depleted {
            let _ = self.veins.remove(&id);
            log::debug!("vein {} depleted", id.get());
            out.push(Event::VeinDepleted { vein: id });
        }
        Ok(())
    }

    /// Shields a zone after charging its cost, then rolls its vein spawn.
    pub(crate) fn expand_shield(
        &mut self,
        id: ZoneId,
        cost: Cost,
        ledger: &mut EconomyLedger,
        out: &mut Vec<Event>,
    ) -> Result<(), SimulationError> {
        let zone = self
            .zones
            .get_mut(&id)
            .ok_or(ConfigurationError::MissingZone(id))?;
        if zone.shielded {
            return Err(AlreadyApplied::ZoneShielded(id).into());
        }

        ledger.spend(cost, out)?;
        zone.shielded = true;
        out.push(Event::ShieldExpanded { zone: id });

        if zone.spawned_vein
            || zone.vein_kinds.is_empty()
            || zone.vein_amount == 0
            || self.rng.gen::<f32>() >= zone.vein_spawn_chance
        {
            return Ok(());
        }

        let Some(kind) = zone.vein_kinds.choose(&mut self.rng).copied() else {
            return Ok(());
        };
        zone.spawned_vein = true;

        let vein = self.next_vein_id;
        self.next_vein_id = VeinId::new(vein.get().wrapping_add(1));
        let _ = self.veins.insert(
            vein,
            Vein {
                kind,
                remaining: zone.vein_amount,
                position: zone.position + zone.vein_offset,
                zone: Some(id),
            },
        );
        log::debug!("vein {} spawned in zone {}", vein.get(), id.get());
        out.push(Event::VeinSpawned { vein, zone: id });
        Ok(())
    }

    /// Advances the gravitational-wave timer, shuffling unshielded zones when it elapses.
    pub(crate) fn advance(&mut self, dt: Duration, out: &mut Vec<Event>) {
        self.wave_remaining = self.wave_remaining.saturating_sub(dt);
        out.push(Event::GravitationalWaveTick {
            remaining: self.wave_remaining,
        });

        if !self.wave_remaining.is_zero() {
            return;
        }

        self.wave_remaining = self.wave_interval;
        log::info!("gravitational wave triggered");
        out.push(Event::GravitationalWaveTriggered);
        self.shuffle_unshielded(out);
    }

    fn shuffle_unshielded(&mut self, out: &mut Vec<Event>) {
        let unshielded: Vec<ZoneId> = self
            .zones
            .iter()
            .filter(|(_, zone)| !zone.shielded)
            .map(|(id, _)| *id)
            .collect();
        if unshielded.len() < 2 {
            return;
        }

        let mut positions: Vec<Vec3> = unshielded
            .iter()
            .filter_map(|id| self.zones.get(id).map(|zone| zone.position))
            .collect();
        positions.shuffle(&mut self.rng);

        for (id, position) in unshielded.into_iter().zip(positions) {
            let Some(zone) = self.zones.get_mut(&id) else {
                continue;
            };
            let shift = position - zone.position;
            zone.position = position;
            for vein in self.veins.values_mut().filter(|vein| vein.zone == Some(id)) {
                vein.position += shift;
            }
            out.push(Event::ZoneRepositioned { zone: id, position });
        }
    }

    pub(crate) fn wave_remaining(&self) -> Duration {
        self.wave_remaining
    }

    pub(crate) fn zones(&self) -> impl Iterator<Item = (ZoneId, &Zone)> {
        self.zones.iter().map(|(id, zone)| (*id, zone))
    }

    pub(crate) fn veins(&self) -> impl Iterator<Item = (VeinId, &Vein)> {
        self.veins.iter().map(|(id, vein)| (*id, vein))
    }
}
