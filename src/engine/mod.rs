//! Grid/tile state machine.
//!
//! - [`Grid`] owns a `size x size` array of optional [`Tile`]s and resolves
//!   one directional move at a time ([`Grid::shift`], [`Grid::make_move`]).
//! - [`Direction`] maps each move to a unit [`Vector`] through a fixed table.
//!
//! Move resolution never mutates the grid it is called on; it returns a
//! [`MoveOutcome`] carrying the new grid, so the same code serves real turns
//! and search simulation.

mod grid;
mod position;
mod tile;

pub use grid::{Farthest, Grid, MoveOutcome};
pub use position::{Direction, ParseDirectionError, Position, Traversals, Vector};
pub use tile::Tile;

/// Tile value that wins the game.
pub const WINNING_VALUE: u32 = 2048;

/// Largest tile value a grid may hold. Merges that would exceed it do not happen.
pub const MAX_TILE_VALUE: u32 = 1 << 30;

/// Default edge length of the grid.
pub const DEFAULT_SIZE: usize = 4;

#[cfg(test)]
pub(crate) use grid::tests::grid_from_rows;
