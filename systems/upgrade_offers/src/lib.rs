#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that draws the run-scoped upgrade options offered at wave milestones.

use gravity_defence_core::{Command, Event, RunUpgradeId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of options offered per milestone unless configured otherwise.
pub const DEFAULT_OPTION_COUNT: usize = 3;

/// Configuration parameters required to construct the offers system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    option_count: usize,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration offering `option_count` upgrades per draw.
    #[must_use]
    pub const fn new(option_count: usize, rng_seed: u64) -> Self {
        Self {
            option_count,
            rng_seed,
        }
    }
}

/// Upgrade offer system remembering the previous choice so it is not offered again.
#[derive(Debug)]
pub struct UpgradeOffers {
    option_count: usize,
    rng: ChaCha8Rng,
    last_selected: Option<RunUpgradeId>,
    pool: Vec<RunUpgradeId>,
}

impl UpgradeOffers {
    /// Creates a new offers system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            option_count: config.option_count,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            last_selected: None,
            pool: Vec::new(),
        }
    }

    /// Upgrade applied most recently during the current run.
    #[must_use]
    pub const fn last_selected(&self) -> Option<RunUpgradeId> {
        self.last_selected
    }

    /// Reacts to selection requests with a `PresentUpgradeOptions` command.
    ///
    /// `catalog` lists every run-scoped upgrade in a stable order.
    pub fn handle(&mut self, events: &[Event], catalog: &[RunUpgradeId], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::RunStarted => self.last_selected = None,
                Event::UpgradeApplied { upgrade, .. } => self.last_selected = Some(*upgrade),
                Event::UpgradeSelectionRequested { wave } => {
                    let options = self.draw(catalog);
                    if options.is_empty() {
                        log::warn!("no upgrade options available after wave {wave}");
                        continue;
                    }
                    log::debug!("offering {} upgrades after wave {wave}", options.len());
                    out.push(Command::PresentUpgradeOptions { options });
                }
                _ => {}
            }
        }
    }

    /// Draws up to `option_count` distinct upgrades from `catalog`.
    ///
    /// The previous choice is left out unless that would shrink the pool below
    /// the number of options to offer.
    pub fn draw(&mut self, catalog: &[RunUpgradeId]) -> Vec<RunUpgradeId> {
        self.pool.clear();
        self.pool.extend(
            catalog
                .iter()
                .copied()
                .filter(|id| Some(*id) != self.last_selected),
        );
        if self.pool.len() < self.option_count {
            self.pool.clear();
            self.pool.extend_from_slice(catalog);
        }

        let mut selection = Vec::with_capacity(self.option_count.min(self.pool.len()));
        while selection.len() < self.option_count && !self.pool.is_empty() {
            let index = self.rng.gen_range(0..self.pool.len());
            selection.push(self.pool.swap_remove(index));
        }
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(count: u32) -> Vec<RunUpgradeId> {
        (0..count).map(RunUpgradeId::new).collect()
    }

    #[test]
    fn draws_distinct_options() {
        let mut offers = UpgradeOffers::new(Config::new(DEFAULT_OPTION_COUNT, 11));
        let options = offers.draw(&catalog(6));

        assert_eq!(options.len(), 3);
        let mut unique = options.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn previous_choice_is_excluded_while_the_pool_allows() {
        let mut offers = UpgradeOffers::new(Config::new(DEFAULT_OPTION_COUNT, 3));
        offers.last_selected = Some(RunUpgradeId::new(0));

        for _ in 0..20 {
            let options = offers.draw(&catalog(4));
            assert_eq!(options.len(), 3);
            assert!(!options.contains(&RunUpgradeId::new(0)));
        }
    }

    #[test]
    fn previous_choice_returns_when_the_catalog_is_small() {
        let mut offers = UpgradeOffers::new(Config::new(DEFAULT_OPTION_COUNT, 3));
        offers.last_selected = Some(RunUpgradeId::new(0));

        let mut options = offers.draw(&catalog(3));
        options.sort();
        assert_eq!(options, catalog(3));
    }

    #[test]
    fn small_catalogs_offer_everything_they_have() {
        let mut offers = UpgradeOffers::new(Config::new(DEFAULT_OPTION_COUNT, 5));
        assert_eq!(offers.draw(&catalog(2)).len(), 2);
        assert!(offers.draw(&[]).is_empty());
    }

    #[test]
    fn equal_seeds_draw_equal_sequences() {
        let mut first = UpgradeOffers::new(Config::new(DEFAULT_OPTION_COUNT, 99));
        let mut second = UpgradeOffers::new(Config::new(DEFAULT_OPTION_COUNT, 99));
        for _ in 0..5 {
            assert_eq!(first.draw(&catalog(8)), second.draw(&catalog(8)));
        }
    }
}
