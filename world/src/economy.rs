//! Resource and currency accounting.

use gravity_defence_core::{
    round_to_u32, Cost, Event, InsufficientResources, MiningResourceKind, ResourceKind,
    SimulationError,
};

/// Four non-negative counters plus the run-scoped invested accumulator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct EconomyLedger {
    primary: u32,
    mining_a: u32,
    mining_b: u32,
    permanent_currency: u32,
    invested: u64,
}

impl EconomyLedger {
    pub(crate) fn new(permanent_currency: u32) -> Self {
        Self {
            permanent_currency,
            ..Self::default()
        }
    }

    pub(crate) fn balances(&self) -> Cost {
        Cost::new(self.primary, self.mining_a, self.mining_b)
    }

    pub(crate) fn permanent_currency(&self) -> u32 {
        self.permanent_currency
    }

    pub(crate) fn invested(&self) -> u64 {
        self.invested
    }

    /// Credits primary resource scaled by the gain multiplier.
    pub(crate) fn add_resources(&mut self, amount: u32, gain: f32, out: &mut Vec<Event>) {
        if amount == 0 {
            return;
        }

        let adjusted = round_to_u32(amount as f32 * gain);
        self.primary = self.primary.saturating_add(adjusted);
        out.push(self.changed(ResourceKind::Primary));
    }

    /// Credits primary resource without applying multipliers.
    pub(crate) fn grant_primary(&mut self, amount: u32, out: &mut Vec<Event>) {
        if amount == 0 {
            return;
        }

        self.primary = self.primary.saturating_add(amount);
        out.push(self.changed(ResourceKind::Primary));
    }

    pub(crate) fn add_mining(&mut self, kind: MiningResourceKind, amount: u32, out: &mut Vec<Event>) {
        if amount == 0 {
            return;
        }

        let counter = match kind {
            MiningResourceKind::A => &mut self.mining_a,
            MiningResourceKind::B => &mut self.mining_b,
        };
        *counter = counter.saturating_add(amount);
        out.push(self.changed(kind.resource()));
    }

    /// Deducts every component or nothing at all.
    pub(crate) fn spend(
        &mut self,
        cost: Cost,
        out: &mut Vec<Event>,
    ) -> Result<(), InsufficientResources> {
        let available = self.balances();
        if !cost.covered_by(&available) {
            return Err(InsufficientResources {
                required: cost,
                available,
            });
        }

        self.primary -= cost.primary;
        self.mining_a -= cost.mining_a;
        self.mining_b -= cost.mining_b;
        self.invested = self.invested.saturating_add(cost.total());
        out.push(self.changed(ResourceKind::Primary));
        out.push(self.changed(ResourceKind::MiningA));
        out.push(self.changed(ResourceKind::MiningB));
        Ok(())
    }

    pub(crate) fn add_permanent_currency(&mut self, amount: u32, out: &mut Vec<Event>) {
        if amount == 0 {
            return;
        }

        self.permanent_currency = self.permanent_currency.saturating_add(amount);
        out.push(self.changed(ResourceKind::PermanentCurrency));
    }

    pub(crate) fn spend_permanent_currency(
        &mut self,
        amount: u32,
        out: &mut Vec<Event>,
    ) -> Result<(), SimulationError> {
        if self.permanent_currency < amount {
            return Err(SimulationError::InsufficientPermanentCurrency {
                required: amount,
                available: self.permanent_currency,
            });
        }

        self.permanent_currency -= amount;
        out.push(self.changed(ResourceKind::PermanentCurrency));
        Ok(())
    }

    /// Zeroes the run resources and the invested accumulator. Permanent currency is untouched.
    pub(crate) fn reset_run(&mut self, out: &mut Vec<Event>) {
        self.primary = 0;
        self.mining_a = 0;
        self.mining_b = 0;
        self.invested = 0;
        out.push(self.changed(ResourceKind::Primary));
        out.push(self.changed(ResourceKind::MiningA));
        out.push(self.changed(ResourceKind::MiningB));
    }

    fn changed(&self, kind: ResourceKind) -> Event {
        let value = match kind {
            ResourceKind::Primary => self.primary,
            ResourceKind::MiningA => self.mining_a,
            ResourceKind::MiningB => self.mining_b,
            ResourceKind::PermanentCurrency => self.permanent_currency,
        };
        Event::ResourceChanged { kind, value }
    }
}
