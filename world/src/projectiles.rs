//! Seeking projectiles and their travel resolution.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec3;
use gravity_defence_core::{EntityHandle, EntityTag, ProjectileId};

/// Projectile in flight toward a captured target.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Projectile {
    pub(crate) position: Vec3,
    pub(crate) target: EntityHandle,
    pub(crate) speed: f32,
    pub(crate) damage: u32,
    pub(crate) explosion_radius: f32,
    /// Tag of entities caught by the explosion.
    pub(crate) splash_tag: EntityTag,
}

/// Outcome of advancing a single projectile.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Flight {
    /// The projectile reached its target this tick and sits on its position.
    Impact {
        id: ProjectileId,
        projectile: Projectile,
    },
    /// The target vanished before impact.
    Expired { id: ProjectileId },
}

/// Moves projectiles toward their targets and reports which ones resolved.
#[derive(Debug)]
pub(crate) struct ProjectileResolver {
    entries: BTreeMap<ProjectileId, Projectile>,
    next_projectile_id: ProjectileId,
}

impl ProjectileResolver {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    pub(crate) fn launch(&mut self, projectile: Projectile) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get().wrapping_add(1));
        let _ = self.entries.insert(id, projectile);
        id
    }

    /// Advances every projectile by `dt`.
    ///
    /// `locate` reports the current position of a target, or `None` once it
    /// vanished. Resolved projectiles are removed and appended to `out`.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        locate: impl Fn(EntityHandle) -> Option<Vec3>,
        out: &mut Vec<Flight>,
    ) {
        let step_secs = dt.as_secs_f32();
        let mut resolved = Vec::new();

        for (id, projectile) in &mut self.entries {
            let Some(target) = locate(projectile.target) else {
                resolved.push(*id);
                out.push(Flight::Expired { id: *id });
                continue;
            };

            let offset = target - projectile.position;
            let travel = projectile.speed * step_secs;
            if offset.length() <= travel {
                projectile.position = target;
                resolved.push(*id);
                out.push(Flight::Impact {
                    id: *id,
                    projectile: projectile.clone(),
                });
                continue;
            }

            projectile.position += offset.normalize_or_zero() * travel;
        }

        for id in resolved {
            let _ = self.entries.remove(&id);
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ProjectileId, &Projectile)> {
        self.entries.iter().map(|(id, projectile)| (*id, projectile))
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
