//! Timed per-entity effects advanced once per tick.

use std::{collections::BTreeMap, time::Duration};

/// Kinds of timed effect tracked per entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum EffectKind {
    /// Fractional movement slow.
    Slow,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TimedEffect {
    remaining: Duration,
    magnitude: f32,
}

/// Effects keyed by entity and kind.
///
/// Starting an effect that is already running overwrites it; effects never stack.
#[derive(Clone, Debug)]
pub(crate) struct TimerTable<K> {
    entries: BTreeMap<(K, EffectKind), TimedEffect>,
}

impl<K: Copy + Ord> TimerTable<K> {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn start(&mut self, key: K, kind: EffectKind, duration: Duration, magnitude: f32) {
        let _ = self.entries.insert(
            (key, kind),
            TimedEffect {
                remaining: duration,
                magnitude,
            },
        );
    }

    /// Magnitude of the running effect, if any.
    pub(crate) fn magnitude(&self, key: K, kind: EffectKind) -> Option<f32> {
        self.entries
            .get(&(key, kind))
            .map(|effect| effect.magnitude)
    }

    /// Advances every effect and drops the ones that elapsed.
    pub(crate) fn advance(&mut self, dt: Duration) {
        self.entries.retain(|_, effect| {
            if effect.remaining <= dt {
                return false;
            }
            effect.remaining -= dt;
            true
        });
    }

    /// Drops every effect attached to `key`.
    pub(crate) fn remove_entity(&mut self, key: K) {
        self.entries.retain(|(owner, _), _| *owner != key);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
