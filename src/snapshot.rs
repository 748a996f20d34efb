//! Serialized game state exchanged with the storage collaborator.
//!
//! The JSON layout is:
//! ```json
//! { "grid": { "size": 4, "cells": [[null, {"position": {"x": 0, "y": 1}, "value": 2}, ...], ...] },
//!   "score": 0, "over": false, "won": false, "keepPlaying": false }
//! ```
//! `cells[x][y]` is column-major, matching [`crate::engine::Position`].

use serde::{Deserialize, Serialize};

use crate::engine::{Position, MAX_TILE_VALUE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileState {
    pub position: Position,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridState {
    pub size: usize,
    pub cells: Vec<Vec<Option<TileState>>>,
}

/// Full turn-controller snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub grid: GridState,
    pub score: u64,
    pub over: bool,
    pub won: bool,
    pub keep_playing: bool,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("grid size must be positive")]
    ZeroSize,
    #[error("grid size {found} does not match configured size {expected}")]
    SizeMismatch { expected: usize, found: usize },
    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
    #[error("column {column}: expected {expected} cells, found {found}")]
    RowCount { column: usize, expected: usize, found: usize },
    #[error("tile stored at {cell} claims position {claimed}")]
    PositionMismatch { cell: Position, claimed: Position },
    #[error("tile at {position} has invalid value {value} (must be a power of two >= 2)")]
    InvalidValue { position: Position, value: u32 },
    #[error("tile at {position} has value {value}, above the maximum {max}")]
    ValueTooLarge { position: Position, value: u32, max: u32 },
}

impl GridState {
    /// Check shape, tile placement and tile values.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.size == 0 {
            return Err(SnapshotError::ZeroSize);
        }
        if self.cells.len() != self.size {
            return Err(SnapshotError::ColumnCount { expected: self.size, found: self.cells.len() });
        }
        for (x, column) in self.cells.iter().enumerate() {
            if column.len() != self.size {
                return Err(SnapshotError::RowCount { column: x, expected: self.size, found: column.len() });
            }
            for (y, slot) in column.iter().enumerate() {
                let Some(tile) = slot else { continue };
                let cell = Position::new(x, y);
                if tile.position != cell {
                    return Err(SnapshotError::PositionMismatch { cell, claimed: tile.position });
                }
                if tile.value < 2 || !tile.value.is_power_of_two() {
                    return Err(SnapshotError::InvalidValue { position: cell, value: tile.value });
                }
                if tile.value > MAX_TILE_VALUE {
                    return Err(SnapshotError::ValueTooLarge { position: cell, value: tile.value, max: MAX_TILE_VALUE });
                }
            }
        }
        Ok(())
    }
}

impl GameState {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
