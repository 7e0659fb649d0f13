#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that selects turret targets and rotates turrets toward them.

use std::time::Duration;

use gravity_defence_core::{
    Command, EnemyView, EntityHandle, Event, Probe, RunModifiers, SpatialQuery, TargetingPolicy,
    TurretSnapshot, TurretView, Vec3,
};

const FULL_TURN: f32 = 360.0;
const HALF_TURN: f32 = 180.0;
const AIM_TOLERANCE_DEGREES: f32 = 1.0e-3;

/// Turret targeting system that reuses a scratch buffer for spatial probes.
#[derive(Debug, Default)]
pub struct TurretTargeting {
    candidates: Vec<Probe>,
}

impl TurretTargeting {
    /// Creates a new targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans ready turrets for new targets and aims every turret at its target.
    ///
    /// Turrets whose scan interval elapsed receive an `AssignTurretTarget`
    /// command, even when nothing qualifies, so the world can restart their
    /// scan timer. Rotation uses the simulated time carried by `TimeAdvanced`
    /// events in `events`.
    #[allow(clippy::too_many_arguments)]
    pub fn handle(
        &mut self,
        events: &[Event],
        turrets: &TurretView<'_>,
        enemies: &EnemyView,
        spatial: &impl SpatialQuery,
        ship: Option<Vec3>,
        modifiers: &RunModifiers,
        out: &mut Vec<Command>,
    ) {
        let elapsed = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(*dt),
                _ => None,
            })
            .fold(Duration::ZERO, Duration::saturating_add);

        for turret in turrets.iter() {
            let mut target = turret.target.map(|handle| (handle, None));

            if turret.scan_ready {
                let selected = self.scan(turret, spatial, ship, modifiers.range());
                out.push(Command::AssignTurretTarget {
                    turret: turret.id,
                    target: selected.map(|probe| probe.handle),
                });
                target = selected.map(|probe| (probe.handle, Some(probe.position)));
            }

            let Some((handle, known_position)) = target else {
                continue;
            };
            let Some(position) = known_position.or_else(|| locate(handle, enemies, ship)) else {
                continue;
            };

            let turn_speed = turret.archetype.turn_speed();
            if let Some(yaw) =
                rotate_toward(turret.yaw, turret.position, position, turn_speed, elapsed)
            {
                out.push(Command::AimTurret {
                    turret: turret.id,
                    yaw,
                });
            }
        }
    }

    fn scan(
        &mut self,
        turret: &TurretSnapshot<'_>,
        spatial: &impl SpatialQuery,
        ship: Option<Vec3>,
        range_multiplier: f32,
    ) -> Option<Probe> {
        let archetype = turret.archetype;
        let range = archetype.range() * range_multiplier;
        let min_range = archetype.min_range();
        let policy = archetype.targeting();

        self.candidates.clear();
        spatial.entities_within(
            archetype.enemy_tag(),
            turret.position,
            range,
            &mut self.candidates,
        );

        let mut best: Option<BestCandidate> = None;
        for probe in &self.candidates {
            let distance_to_turret = probe.position.distance(turret.position);
            if distance_to_turret < min_range || distance_to_turret > range {
                continue;
            }

            let Some(score) = score(policy, probe, distance_to_turret, ship) else {
                continue;
            };
            let current = BestCandidate {
                score,
                probe: *probe,
            };

            match &mut best {
                Some(existing) => {
                    if current.precedes(existing, policy) {
                        *existing = current;
                    }
                }
                None => best = Some(current),
            }
        }

        best.map(|candidate| candidate.probe)
    }
}

/// Score of a candidate under `policy`, or `None` when the policy cannot rank it.
fn score(
    policy: TargetingPolicy,
    probe: &Probe,
    distance_to_turret: f32,
    ship: Option<Vec3>,
) -> Option<f32> {
    match policy {
        TargetingPolicy::ClosestToTurret => Some(distance_to_turret),
        TargetingPolicy::ClosestToShip | TargetingPolicy::FarthestFromShip => {
            Some(ship.map_or(distance_to_turret, |ship| probe.position.distance(ship)))
        }
        TargetingPolicy::HighestHealth => probe.health.map(|health| health.current() as f32),
    }
}

fn locate(handle: EntityHandle, enemies: &EnemyView, ship: Option<Vec3>) -> Option<Vec3> {
    match handle {
        EntityHandle::Enemy(id) => enemies
            .iter()
            .find(|snapshot| snapshot.id == id)
            .map(|snapshot| snapshot.position),
        EntityHandle::Ship => ship,
    }
}

/// Yaw after turning from `current` toward `to` for `elapsed`, or `None` when no turn is needed.
///
/// Yaw is measured in degrees around the vertical axis, zero facing +Z.
fn rotate_toward(
    current: f32,
    from: Vec3,
    to: Vec3,
    turn_speed: f32,
    elapsed: Duration,
) -> Option<f32> {
    let step = turn_speed * elapsed.as_secs_f32();
    if step <= 0.0 {
        return None;
    }

    let dx = to.x - from.x;
    let dz = to.z - from.z;
    if dx * dx + dz * dz <= f32::EPSILON {
        return None;
    }

    let desired = dx.atan2(dz).to_degrees();
    let delta = shortest_arc(current, desired);
    if delta.abs() <= AIM_TOLERANCE_DEGREES {
        return None;
    }

    let next = if delta.abs() <= step {
        desired
    } else {
        current + step.copysign(delta)
    };
    Some(next.rem_euclid(FULL_TURN))
}

/// Signed rotation in `(-180, 180]` that turns `from` onto `to`.
fn shortest_arc(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(FULL_TURN);
    if delta > HALF_TURN {
        delta - FULL_TURN
    } else {
        delta
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    score: f32,
    probe: Probe,
}

impl BestCandidate {
    /// Strict comparison so the earliest candidate wins ties.
    fn precedes(&self, other: &Self, policy: TargetingPolicy) -> bool {
        match policy {
            TargetingPolicy::ClosestToTurret | TargetingPolicy::ClosestToShip => {
                self.score < other.score
            }
            TargetingPolicy::FarthestFromShip | TargetingPolicy::HighestHealth => {
                self.score > other.score
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(value: Option<f32>, expected: f32) -> bool {
        value.is_some_and(|value| (value - expected).abs() < 1e-3)
    }

    #[test]
    fn shortest_arc_wraps_across_zero() {
        assert!((shortest_arc(350.0, 10.0) - 20.0).abs() < 1e-4);
        assert!((shortest_arc(10.0, 350.0) + 20.0).abs() < 1e-4);
        assert!((shortest_arc(0.0, 180.0) - 180.0).abs() < 1e-4);
    }

    #[test]
    fn rotation_is_limited_by_turn_speed() {
        let east = Vec3::new(10.0, 0.0, 0.0);
        let yaw = rotate_toward(0.0, Vec3::ZERO, east, 45.0, Duration::from_secs(1));
        assert!(approx(yaw, 45.0));

        let yaw = rotate_toward(45.0, Vec3::ZERO, east, 45.0, Duration::from_secs(1));
        assert!(approx(yaw, 90.0));
    }

    #[test]
    fn rotation_takes_the_short_way_round() {
        let west = Vec3::new(-10.0, 0.0, 0.0);
        let yaw = rotate_toward(0.0, Vec3::ZERO, west, 45.0, Duration::from_secs(1));
        assert!(approx(yaw, 315.0));
    }

    #[test]
    fn aligned_or_frozen_turrets_do_not_rotate() {
        let north = Vec3::new(0.0, 0.0, 10.0);
        assert_eq!(
            rotate_toward(0.0, Vec3::ZERO, north, 90.0, Duration::from_secs(1)),
            None
        );
        assert_eq!(
            rotate_toward(
                0.0,
                Vec3::ZERO,
                Vec3::new(5.0, 0.0, 0.0),
                0.0,
                Duration::from_secs(1)
            ),
            None
        );
        assert_eq!(
            rotate_toward(
                0.0,
                Vec3::ZERO,
                Vec3::new(5.0, 0.0, 0.0),
                90.0,
                Duration::ZERO
            ),
            None
        );
    }
}
