#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits fire commands for turrets with a ready weapon and a target.

use gravity_defence_core::{Command, TurretView};

/// Turret combat system that queues firing commands for ready turrets.
#[derive(Debug, Default)]
pub struct TurretCombat {
    scratch: Vec<Command>,
}

impl TurretCombat {
    /// Creates a new turret combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireTurret` entries for turrets ready to attack.
    ///
    /// Nothing is emitted while no run is active.
    pub fn handle(&mut self, run_active: bool, turrets: &TurretView<'_>, out: &mut Vec<Command>) {
        if !run_active {
            return;
        }

        self.scratch.clear();
        for turret in turrets.iter() {
            if turret.fire_ready && turret.target.is_some() {
                self.scratch.push(Command::FireTurret { turret: turret.id });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
