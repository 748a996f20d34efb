use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

use super::position::{Direction, Position, Traversals, Vector};
use super::tile::Tile;
use super::{MAX_TILE_VALUE, WINNING_VALUE};
use crate::snapshot::{GridState, SnapshotError};

/// A `size x size` board of optional tiles.
///
/// `Grid` is a plain value: `clone()` copies every cell and tile, so a
/// simulated move on a clone never aliases the original.
#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    // Column-major: index = x * size + y.
    cells: Vec<Option<Tile>>,
}

/// Result of resolving one direction against a grid.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    /// The grid after the move (and spawn, for [`Grid::make_move`]).
    pub grid: Grid,
    /// Sum of the values of tiles created by merges this turn.
    pub score: u64,
    /// True if any tile changed cell.
    pub moved: bool,
    /// True if no moves remain on `grid`.
    pub over: bool,
    /// True if a merge produced the winning tile this turn.
    pub won: bool,
}

/// Where a tile ends up when walking along a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Farthest {
    /// Last empty cell (or the start cell) before the obstacle.
    pub farthest: Position,
    /// First occupied in-bounds cell beyond `farthest`; `None` at the wall.
    pub next: Option<Position>,
}

impl Grid {
    /// Build an empty grid.
    pub fn empty(size: usize) -> Self {
        Grid { size, cells: vec![None; size * size] }
    }

    /// Rehydrate a grid from a serialized state, rejecting malformed input.
    pub fn from_state(state: &GridState) -> Result<Self, SnapshotError> {
        state.validate()?;
        let mut grid = Grid::empty(state.size);
        for tile in state.cells.iter().flatten().flatten() {
            grid.insert_tile(Tile::from(tile));
        }
        Ok(grid)
    }

    pub fn serialize(&self) -> GridState {
        let cells = (0..self.size)
            .map(|x| {
                (0..self.size)
                    .map(|y| self.cells[self.index(Position::new(x, y))].as_ref().map(Tile::serialize))
                    .collect()
            })
            .collect();
        GridState { size: self.size, cells }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn index(&self, position: Position) -> usize {
        position.x * self.size + position.y
    }

    #[inline]
    pub fn within_bounds(&self, position: Position) -> bool {
        position.x < self.size && position.y < self.size
    }

    /// Tile at `position`, or `None` if empty or out of bounds.
    #[inline]
    pub fn cell_content(&self, position: Position) -> Option<&Tile> {
        if self.within_bounds(position) {
            self.cells[self.index(position)].as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub fn cell_occupied(&self, position: Position) -> bool {
        self.cell_content(position).is_some()
    }

    #[inline]
    pub fn cell_available(&self, position: Position) -> bool {
        !self.cell_occupied(position)
    }

    /// Visit cells x-major, y-minor.
    pub fn each_cell(&self) -> impl Iterator<Item = (Position, Option<&Tile>)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, slot)| (Position::new(i / size, i % size), slot.as_ref()))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.cells.iter().flatten()
    }

    pub fn available_cells(&self) -> Vec<Position> {
        self.each_cell()
            .filter(|(_, tile)| tile.is_none())
            .map(|(position, _)| position)
            .collect()
    }

    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|slot| slot.is_none()).count()
    }

    #[inline]
    pub fn cells_available(&self) -> bool {
        self.cells.iter().any(Option::is_none)
    }

    /// Place `tile` at its own position, replacing whatever was there.
    ///
    /// Panics if the tile's position is outside the grid.
    pub fn insert_tile(&mut self, tile: Tile) {
        let idx = self.index(tile.position);
        self.cells[idx] = Some(tile);
    }

    /// Remove and return the tile at `position`.
    pub fn remove_tile(&mut self, position: Position) -> Option<Tile> {
        if !self.within_bounds(position) {
            return None;
        }
        let idx = self.index(position);
        self.cells[idx].take()
    }

    /// Relocate the tile at `from` to `to`, updating its stored position.
    pub fn move_tile(&mut self, from: Position, to: Position) {
        if let Some(mut tile) = self.remove_tile(from) {
            tile.update_position(to);
            self.insert_tile(tile);
        }
    }

    pub fn random_available_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        self.available_cells().choose(rng).copied()
    }

    /// Insert a 2 (90%) or 4 (10%) tile at a uniformly random empty cell.
    ///
    /// Returns the spawn position, or `None` if the grid is full.
    pub fn add_random_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Position> {
        let position = self.random_available_cell(rng)?;
        let value = generate_random_value(rng);
        self.insert_tile(Tile::new(position, value));
        Some(position)
    }

    /// Walk from `cell` along `vector` while the next cell is in bounds and empty.
    pub fn find_farthest_position(&self, cell: Position, vector: Vector) -> Farthest {
        let mut farthest = cell;
        loop {
            let next = farthest.step(vector).filter(|&p| self.within_bounds(p));
            match next {
                Some(p) if self.cell_available(p) => farthest = p,
                _ => return Farthest { farthest, next },
            }
        }
    }

    /// True if any occupied cell has an orthogonal neighbour of equal value.
    pub fn tile_matches_available(&self) -> bool {
        self.tiles().any(|tile| {
            Direction::ALL.iter().any(|dir| {
                tile.position
                    .step(dir.vector())
                    .and_then(|p| self.cell_content(p))
                    .is_some_and(|other| other.value == tile.value)
            })
        })
    }

    #[inline]
    pub fn moves_available(&self) -> bool {
        self.cells_available() || self.tile_matches_available()
    }

    /// Save every tile's position and clear last turn's merge sources.
    pub fn prepare_tiles(&mut self) {
        for tile in self.cells.iter_mut().flatten() {
            tile.save_position();
        }
    }

    /// Slide and merge in `direction` without spawning a tile.
    ///
    /// ```
    /// use slide_merge::engine::{Direction, Grid, Position, Tile};
    /// let mut g = Grid::empty(4);
    /// g.insert_tile(Tile::new(Position::new(0, 0), 2));
    /// g.insert_tile(Tile::new(Position::new(3, 0), 2));
    /// let out = g.shift(Direction::Left);
    /// assert!(out.moved);
    /// assert_eq!(out.score, 4);
    /// assert_eq!(out.grid.cell_content(Position::new(0, 0)).map(|t| t.value), Some(4));
    /// ```
    pub fn shift(&self, direction: Direction) -> MoveOutcome {
        let mut grid = self.clone();
        let (score, moved, won) = grid.resolve(direction);
        let over = !grid.moves_available();
        MoveOutcome { grid, score, moved, over, won }
    }

    /// Resolve one full turn: slide/merge, spawn one tile if anything moved,
    /// then recompute the terminal flag. `self` is left untouched.
    pub fn make_move<R: Rng + ?Sized>(&self, direction: Direction, rng: &mut R) -> MoveOutcome {
        let mut outcome = self.shift(direction);
        if outcome.moved {
            outcome.grid.add_random_tile(rng);
            outcome.over = !outcome.grid.moves_available();
        }
        outcome
    }

    /// All four directions resolved against independent clones.
    pub fn possible_transitions<R: Rng + ?Sized>(&self, rng: &mut R) -> [MoveOutcome; 4] {
        Direction::ALL.map(|dir| self.make_move(dir, rng))
    }

    // Returns (score delta, moved, won).
    fn resolve(&mut self, direction: Direction) -> (u64, bool, bool) {
        let vector = direction.vector();
        let traversals = Traversals::build(self.size, direction);
        let mut score = 0u64;
        let mut moved = false;
        let mut won = false;

        self.prepare_tiles();

        for cell in traversals.cells() {
            let Some(tile) = self.remove_tile(cell) else { continue };
            let positions = self.find_farthest_position(cell, vector);

            // A tile produced by a merge this turn cannot merge again.
            let target = positions.next.filter(|&p| {
                self.cell_content(p).is_some_and(|next| {
                    next.value == tile.value && !next.is_merged() && tile.value <= MAX_TILE_VALUE / 2
                })
            });

            match target.and_then(|p| self.remove_tile(p).map(|next| (p, next))) {
                Some((target, next)) => {
                    let mut source = tile;
                    source.update_position(target);
                    let mut merged = Tile::new(target, source.value * 2);
                    merged.merged_from = Some(Box::new([source, next]));
                    score += u64::from(merged.value);
                    if merged.value == WINNING_VALUE {
                        won = true;
                    }
                    self.insert_tile(merged);
                    moved = true;
                }
                None => {
                    let mut tile = tile;
                    tile.update_position(positions.farthest);
                    if positions.farthest != cell {
                        moved = true;
                    }
                    self.insert_tile(tile);
                }
            }
        }

        (score, moved, won)
    }

    /// Largest tile value on the grid (0 if empty).
    pub fn highest_tile(&self) -> u32 {
        self.tiles().map(|t| t.value).max().unwrap_or(0)
    }
}

/// Grids compare by size and by the (position, value) of every cell.
/// Per-turn bookkeeping (`previous_position`, `merged_from`) is ignored.
impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size
            && self.cells.iter().zip(&other.cells).all(|(a, b)| match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => a.position == b.position && a.value == b.value,
                _ => false,
            })
    }
}

impl Eq for Grid {}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(self.size * 8);
        for y in 0..self.size {
            let row: Vec<String> = (0..self.size)
                .map(|x| format_val(self.cell_content(Position::new(x, y)).map(|t| t.value)))
                .collect();
            writeln!(f, "{}", row.join("|"))?;
            if y + 1 < self.size {
                writeln!(f, "{}", rule)?;
            }
        }
        Ok(())
    }
}

fn generate_random_value<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    if rng.gen_range(0..10) < 9 { 2 } else { 4 }
}

fn format_val(val: Option<u32>) -> String {
    match val {
        None => String::from("       "),
        Some(v) => format!("{:^7}", v),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    /// Build a grid from rows (`rows[y][x]`), 0 meaning empty.
    pub(crate) fn grid_from_rows(rows: &[&[u32]]) -> Grid {
        let size = rows.len();
        let mut g = Grid::empty(size);
        for (y, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), size);
            for (x, &v) in row.iter().enumerate() {
                if v != 0 {
                    g.insert_tile(Tile::new(Position::new(x, y), v));
                }
            }
        }
        g
    }

    fn row_values(g: &Grid, y: usize) -> Vec<u32> {
        (0..g.size())
            .map(|x| g.cell_content(Position::new(x, y)).map_or(0, |t| t.value))
            .collect()
    }

    fn total(g: &Grid) -> u64 {
        g.tiles().map(|t| u64::from(t.value)).sum()
    }

    #[test]
    fn four_equal_tiles_merge_pairwise() {
        let g = grid_from_rows(&[&[2, 2, 2, 2], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        let out = g.shift(Direction::Left);
        assert_eq!(row_values(&out.grid, 0), vec![4, 4, 0, 0]);
        assert_eq!(out.score, 8);
        assert!(out.moved);
        assert!(!out.over);
    }

    #[test]
    fn gap_merge_to_the_right() {
        let g = grid_from_rows(&[&[2, 0, 0, 2], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        let out = g.shift(Direction::Right);
        assert_eq!(row_values(&out.grid, 0), vec![0, 0, 0, 4]);
        assert_eq!(out.score, 4);
    }

    #[test]
    fn no_chain_merge() {
        let g = grid_from_rows(&[&[2, 2, 4], &[0, 0, 0], &[0, 0, 0]]);
        let out = g.shift(Direction::Left);
        assert_eq!(row_values(&out.grid, 0), vec![4, 4, 0]);
        assert_eq!(out.score, 4);
    }

    #[test]
    fn merged_tile_records_sources() {
        let g = grid_from_rows(&[&[2, 2, 0], &[0, 0, 0], &[0, 0, 0]]);
        let out = g.shift(Direction::Left);
        let merged = out.grid.cell_content(Position::new(0, 0)).unwrap();
        let sources = merged.merged_from.as_ref().unwrap();
        assert!(sources.iter().all(|t| t.value == 2 && t.position == Position::new(0, 0)));

        // Next turn's prepare step clears them.
        let again = out.grid.shift(Direction::Right);
        assert!(again.grid.tiles().all(|t| !t.is_merged()));
    }

    #[test]
    fn columns_move_up_and_down() {
        let g = grid_from_rows(&[&[2, 0, 0, 0], &[2, 0, 0, 0], &[4, 0, 0, 0], &[4, 0, 0, 0]]);
        let up = g.shift(Direction::Up);
        let col: Vec<u32> = (0..4).map(|y| up.grid.cell_content(Position::new(0, y)).map_or(0, |t| t.value)).collect();
        assert_eq!(col, vec![4, 8, 0, 0]);
        assert_eq!(up.score, 12);

        let down = g.shift(Direction::Down);
        let col: Vec<u32> = (0..4).map(|y| down.grid.cell_content(Position::new(0, y)).map_or(0, |t| t.value)).collect();
        assert_eq!(col, vec![0, 0, 4, 8]);
    }

    #[test]
    fn empty_grid_never_moves() {
        let g = Grid::empty(4);
        let mut rng = StdRng::seed_from_u64(1);
        for dir in Direction::ALL {
            let out = g.make_move(dir, &mut rng);
            assert!(!out.moved);
            assert_eq!(out.score, 0);
            assert_eq!(out.grid, g);
            assert_eq!(out.grid.count_empty(), 16);
        }
    }

    #[test]
    fn settled_shift_is_a_noop() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut g = Grid::empty(4);
        for _ in 0..8 {
            g.add_random_tile(&mut rng);
        }
        for dir in Direction::ALL {
            // Shift until settled; merges can cascade over a few passes.
            let mut settled = g.shift(dir);
            for _ in 0..4 {
                if !settled.moved {
                    break;
                }
                settled = settled.grid.shift(dir);
            }
            assert!(!settled.moved);
            let again = settled.grid.shift(dir);
            assert!(!again.moved);
            assert_eq!(again.score, 0);
            assert_eq!(again.grid.serialize(), settled.grid.serialize());
        }

        let g = grid_from_rows(&[&[2, 2, 4], &[0, 0, 0], &[0, 0, 0]]);
        let once = g.shift(Direction::Left);
        assert!(once.grid.shift(Direction::Left).moved);
    }

    #[test]
    fn score_delta_accounts_for_value_conservation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut g = Grid::empty(4);
        for _ in 0..10 {
            g.add_random_tile(&mut rng);
        }
        for _ in 0..40 {
            let dir = Direction::ALL[rng.gen_range(0..4)];
            let before = total(&g);
            let shifted = g.shift(dir);
            // Sliding and merging conserves the value total.
            assert_eq!(total(&shifted.grid), before);
            let merged: u64 = shifted.grid.tiles().filter(|t| t.is_merged()).map(|t| u64::from(t.value)).sum();
            assert_eq!(shifted.score, merged);

            let out = g.make_move(dir, &mut rng);
            let spawned = total(&out.grid) - before;
            if out.moved {
                assert!(spawned == 2 || spawned == 4);
            } else {
                assert_eq!(spawned, 0);
            }
            g = out.grid;
        }
    }

    #[test]
    fn spawn_happens_only_after_movement() {
        let mut rng = StdRng::seed_from_u64(3);
        let g = grid_from_rows(&[&[2, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        let stuck = g.make_move(Direction::Left, &mut rng);
        assert!(!stuck.moved);
        assert_eq!(stuck.grid.tiles().count(), 1);

        let moved = g.make_move(Direction::Right, &mut rng);
        assert!(moved.moved);
        assert_eq!(moved.grid.tiles().count(), 2);
        assert_eq!(moved.grid.cell_content(Position::new(3, 0)).map(|t| t.value), Some(2));
    }

    #[test]
    fn terminal_detection() {
        let full = grid_from_rows(&[&[2, 4, 2, 4], &[4, 2, 4, 2], &[2, 4, 2, 4], &[4, 2, 4, 2]]);
        assert!(!full.moves_available());
        for dir in Direction::ALL {
            let out = full.shift(dir);
            assert!(!out.moved);
            assert!(out.over);
        }

        let mut holey = full.clone();
        holey.remove_tile(Position::new(1, 1));
        assert!(holey.moves_available());
        assert!(!holey.shift(Direction::Left).over);

        let pair = grid_from_rows(&[&[2, 4, 2, 4], &[4, 2, 4, 2], &[2, 4, 2, 4], &[4, 2, 4, 4]]);
        assert!(pair.moves_available());
    }

    #[test]
    fn winning_merge_sets_won() {
        let g = grid_from_rows(&[&[1024, 1024, 0], &[0, 0, 0], &[0, 0, 0]]);
        let out = g.shift(Direction::Left);
        assert!(out.won);
        assert_eq!(out.score, 2048);
        assert_eq!(out.grid.highest_tile(), 2048);
        assert!(!g.shift(Direction::Up).won);
    }

    #[test]
    fn largest_tiles_do_not_merge() {
        let g = grid_from_rows(&[&[MAX_TILE_VALUE, MAX_TILE_VALUE], &[0, 0]]);
        let out = g.shift(Direction::Left);
        assert!(!out.moved);
        assert_eq!(out.score, 0);
        assert_eq!(row_values(&out.grid, 0), vec![MAX_TILE_VALUE, MAX_TILE_VALUE]);

        let half = MAX_TILE_VALUE / 2;
        let g = grid_from_rows(&[&[half, half], &[0, 0]]);
        let out = g.shift(Direction::Left);
        assert_eq!(row_values(&out.grid, 0), vec![MAX_TILE_VALUE, 0]);
    }

    #[test]
    fn spawn_is_mostly_twos_on_any_empty_cell() {
        let mut rng = StdRng::seed_from_u64(2048);
        let mut base = Grid::empty(3);
        base.insert_tile(Tile::new(Position::new(1, 1), 8));

        let draws = 10_000;
        let mut fours = 0;
        let mut seen = std::collections::HashSet::new();
        for _ in 0..draws {
            let mut g = base.clone();
            let pos = g.add_random_tile(&mut rng).unwrap();
            assert_ne!(pos, Position::new(1, 1));
            match g.cell_content(pos).map(|t| t.value) {
                Some(2) => {}
                Some(4) => fours += 1,
                other => panic!("unexpected spawn {other:?}"),
            }
            seen.insert(pos);
        }
        let share = fours as f64 / draws as f64;
        assert!((0.08..0.12).contains(&share), "share of 4s: {share}");
        assert_eq!(seen.len(), 8);
        assert!(base.available_cells().iter().all(|p| seen.contains(p)));

        let mut full = grid_from_rows(&[&[2, 4], &[4, 2]]);
        assert_eq!(full.add_random_tile(&mut rng), None);
    }

    #[test]
    fn farthest_position_stops_at_obstacles() {
        let g = grid_from_rows(&[&[0, 0, 0, 8], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        let p = g.find_farthest_position(Position::new(0, 0), Direction::Right.vector());
        assert_eq!(p, Farthest { farthest: Position::new(2, 0), next: Some(Position::new(3, 0)) });
        let p = g.find_farthest_position(Position::new(0, 0), Direction::Down.vector());
        assert_eq!(p, Farthest { farthest: Position::new(0, 3), next: None });
    }

    #[test]
    fn state_roundtrip_and_rejection() {
        let g = grid_from_rows(&[&[2, 0, 0], &[0, 4, 0], &[0, 0, 8]]);
        let state = g.serialize();
        assert_eq!(state.cells[1][1].as_ref().map(|t| t.value), Some(4));
        assert_eq!(Grid::from_state(&state).unwrap(), g);

        let mut bad = state.clone();
        bad.cells[2][2].as_mut().unwrap().value = 12;
        assert!(Grid::from_state(&bad).is_err());
    }

    #[test]
    fn clones_do_not_alias() {
        let g = grid_from_rows(&[&[2, 2, 0], &[0, 0, 0], &[0, 0, 0]]);
        let mut rng = StdRng::seed_from_u64(5);
        let transitions = g.possible_transitions(&mut rng);
        assert_eq!(g, grid_from_rows(&[&[2, 2, 0], &[0, 0, 0], &[0, 0, 0]]));
        assert!(!transitions[Direction::Up.index()].moved);
        assert!(transitions[Direction::Left.index()].moved);
        assert_eq!(transitions[Direction::Left.index()].score, 4);
    }

    #[test]
    fn display_renders_rows() {
        let g = grid_from_rows(&[&[2, 0], &[0, 16]]);
        let text = g.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains('2'));
        assert!(lines[2].contains("16"));
    }
}
