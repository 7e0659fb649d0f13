#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that walks enemies toward the central ship and triggers their attacks.

use std::time::Duration;

use gravity_defence_core::{
    Collaborator, Command, EnemyAttackMode, EnemySnapshot, EnemyView, Event, RunModifiers,
    SimulationError, Vec3,
};

/// Enemy behaviour system that integrates motion once per simulation step.
#[derive(Debug, Default)]
pub struct EnemyBehaviour {
    missing_ship_reported: bool,
}

impl EnemyBehaviour {
    /// Creates a new behaviour system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits movement and attack commands for the simulated time in `events`.
    ///
    /// Enemies hold position when no ship exists. The warning for that degraded
    /// mode is logged once per run.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        ship: Option<Vec3>,
        modifiers: &RunModifiers,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::RunStarted => self.missing_ship_reported = false,
                _ => {}
            }
        }

        if elapsed.is_zero() {
            return;
        }

        let Some(ship) = ship else {
            if enemies.iter().next().is_some() && !self.missing_ship_reported {
                self.missing_ship_reported = true;
                log::warn!(
                    "{}, enemies hold position",
                    SimulationError::MissingCollaborator(Collaborator::CentralShip)
                );
            }
            return;
        };

        let global_factor = modifiers.global_speed_factor();
        for enemy in enemies.iter() {
            let position = match step_toward(enemy, ship, global_factor, elapsed) {
                Some(to) => {
                    out.push(Command::MoveEnemy {
                        enemy: enemy.id,
                        to,
                    });
                    to
                }
                None => enemy.position,
            };

            if enemy.attack_ready
                && enemy.attack_mode != EnemyAttackMode::None
                && position.distance(ship) <= enemy.attack_range
            {
                out.push(Command::EnemyAttack { enemy: enemy.id });
            }
        }
    }
}

/// Effective movement speed after the global and individual slows.
#[must_use]
pub fn effective_speed(move_speed: f32, global_factor: f32, individual_slow: f32) -> f32 {
    (move_speed * global_factor * (1.0 - individual_slow)).max(0.0)
}

/// Destination of `enemy` after walking toward `target` for `elapsed`, or `None` when it stays put.
fn step_toward(
    enemy: &EnemySnapshot,
    target: Vec3,
    global_factor: f32,
    elapsed: Duration,
) -> Option<Vec3> {
    let offset = target - enemy.position;
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return None;
    }
    if enemy.stop_when_in_range && distance <= enemy.attack_range {
        return None;
    }

    let speed = effective_speed(enemy.move_speed, global_factor, enemy.slow_factor);
    let travel = speed * elapsed.as_secs_f32();
    if travel <= 0.0 {
        return None;
    }

    // Never walk through the ship.
    if travel >= distance {
        return Some(target);
    }
    Some(enemy.position + offset / distance * travel)
}

#[cfg(test)]
mod tests {
    use gravity_defence_core::{EnemyArchetypeId, EnemyId};

    use super::*;

    fn enemy(position: Vec3) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(0),
            archetype: EnemyArchetypeId::new(0),
            position,
            yaw: 0.0,
            health: None,
            move_speed: 2.0,
            slow_factor: 0.0,
            attack_mode: EnemyAttackMode::Melee,
            attack_range: 1.5,
            stop_when_in_range: true,
            attack_ready: false,
        }
    }

    #[test]
    fn speed_combines_global_and_individual_slows() {
        assert!((effective_speed(10.0, 0.8, 0.5) - 4.0).abs() < 1e-6);
        assert_eq!(effective_speed(10.0, 0.0, 0.0), 0.0);
        assert_eq!(effective_speed(10.0, 1.0, 2.0), 0.0);
    }

    #[test]
    fn walks_straight_at_the_target() {
        let to = step_toward(
            &enemy(Vec3::new(10.0, 0.0, 0.0)),
            Vec3::ZERO,
            1.0,
            Duration::from_secs(1),
        );
        assert_eq!(to, Some(Vec3::new(8.0, 0.0, 0.0)));
    }

    #[test]
    fn holds_position_inside_attack_range() {
        let to = step_toward(
            &enemy(Vec3::new(1.0, 0.0, 0.0)),
            Vec3::ZERO,
            1.0,
            Duration::from_secs(1),
        );
        assert_eq!(to, None);
    }

    #[test]
    fn never_overshoots_the_target() {
        let mut runner = enemy(Vec3::new(3.0, 0.0, 0.0));
        runner.stop_when_in_range = false;
        let to = step_toward(&runner, Vec3::ZERO, 1.0, Duration::from_secs(5));
        assert_eq!(to, Some(Vec3::ZERO));
    }
}
