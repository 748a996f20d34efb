use super::position::Position;
use crate::snapshot::TileState;

/// One numbered piece on the grid.
///
/// `merged_from` is only set during the turn in which a merge created the
/// tile; [`Tile::save_position`] (run by the grid's prepare step) clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub position: Position,
    pub value: u32,
    pub previous_position: Option<Position>,
    pub merged_from: Option<Box<[Tile; 2]>>,
}

impl Tile {
    pub fn new(position: Position, value: u32) -> Self {
        Tile { position, value, previous_position: None, merged_from: None }
    }

    /// Record the current position and drop last turn's merge sources.
    #[inline]
    pub fn save_position(&mut self) {
        self.previous_position = Some(self.position);
        self.merged_from = None;
    }

    #[inline]
    pub fn update_position(&mut self, position: Position) {
        self.position = position;
    }

    #[inline]
    pub fn is_merged(&self) -> bool {
        self.merged_from.is_some()
    }

    pub fn serialize(&self) -> TileState {
        TileState { position: self.position, value: self.value }
    }
}

impl From<&TileState> for Tile {
    fn from(state: &TileState) -> Self {
        Tile::new(state.position, state.value)
    }
}
