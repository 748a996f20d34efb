//! Render collaborators notified by the turn controller.

use crate::engine::Grid;
use crate::snapshot::GridState;

/// Payload sent alongside the grid on every render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metadata {
    pub score: u64,
    pub over: bool,
    pub won: bool,
    pub best_score: u64,
    pub terminated: bool,
}

pub trait Actuator {
    /// Called once at setup and once per accepted move.
    fn actuate(&mut self, grid: &Grid, metadata: &Metadata);

    /// Clear any won/lost message (restart, keep playing).
    fn continue_game(&mut self) {}
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn actuate(&mut self, grid: &Grid, metadata: &Metadata) {
        (**self).actuate(grid, metadata)
    }

    fn continue_game(&mut self) {
        (**self).continue_game()
    }
}

/// Discards every render call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullActuator;

impl Actuator for NullActuator {
    fn actuate(&mut self, _grid: &Grid, _metadata: &Metadata) {}
}

/// Prints the board and a status line to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalActuator;

impl Actuator for TerminalActuator {
    fn actuate(&mut self, grid: &Grid, metadata: &Metadata) {
        println!("{}", grid);
        println!("score: {} | best: {}", metadata.score, metadata.best_score);
        if metadata.over {
            println!("Game over!");
        } else if metadata.won && metadata.terminated {
            println!("You win! (keep-playing to continue)");
        }
    }

    fn continue_game(&mut self) {
        log::debug!("clearing game message");
    }
}

/// Keeps every frame it is sent.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    pub frames: Vec<(GridState, Metadata)>,
    pub continues: usize,
}

impl RecordingActuator {
    pub fn last(&self) -> Option<&(GridState, Metadata)> {
        self.frames.last()
    }
}

impl Actuator for RecordingActuator {
    fn actuate(&mut self, grid: &Grid, metadata: &Metadata) {
        self.frames.push((grid.serialize(), *metadata));
    }

    fn continue_game(&mut self) {
        self.continues += 1;
    }
}
