//! Bounded look-ahead move selection.
//!
//! Two policies share one surface:
//! - [`Lookahead`]: single-threaded depth-limited search.
//! - [`LookaheadParallel`]: the four root branches evaluated on rayon.
//!
//! Each node simulates all four directions on independent grid clones and
//! takes the maximum child value. A child that ends the game scores 0, a
//! child that changes nothing scores its (unchanged) score, and at depth 0 a
//! node is worth its accumulated game score.
//!
//! Spawns are simulated with one seeded RNG per root direction, so a given
//! state and config always yield the same choice, and both policies agree.
//!
//! Quick start
//! ```
//! use slide_merge::engine::{Direction, Grid, Position, Tile};
//! use slide_merge::search::{Lookahead, SearchConfig};
//!
//! let mut grid = Grid::empty(4);
//! grid.insert_tile(Tile::new(Position::new(0, 0), 2));
//! grid.insert_tile(Tile::new(Position::new(0, 1), 2));
//! // Depth 0 scores the immediate result: Up and Down both merge, Up wins the tie.
//! let mut policy = Lookahead::with_config(SearchConfig { depth: 0, ..Default::default() });
//! assert_eq!(policy.best_move(&grid, 0), Some(Direction::Up));
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::engine::{Direction, Grid};
use crate::snapshot::{GameState, SnapshotError};

mod search_par;
mod search_seq;

pub use search_par::LookaheadParallel;
pub use search_seq::Lookahead;

/// Search knobs.
///
/// - `depth`: extra half-moves simulated past the immediate move.
/// - `seed`: base seed for simulated spawns.
/// - `parallel`: used by callers that pick a policy from config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub depth: u32,
    pub seed: u64,
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { depth: 3, seed: 0, parallel: false }
    }
}

/// Value of taking `dir` from the root.
///
/// `legal` is false when the move changes nothing; `value` is then the
/// unchanged root score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchEval {
    pub dir: Direction,
    pub value: u64,
    pub legal: bool,
}

/// Node counts for the last evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub nodes: u64,
    pub peak_nodes: u64,
}

/// A move-selection policy.
pub trait Policy {
    fn best_move(&mut self, grid: &Grid, score: u64) -> Option<Direction>;

    /// Rehydrate a serialized game and pick a move for it.
    fn select_move(&mut self, state: &GameState) -> Result<Option<Direction>, SnapshotError> {
        let grid = Grid::from_state(&state.grid)?;
        Ok(self.best_move(&grid, state.score))
    }
}

/// One-shot selection with default settings at `max_depth`.
pub fn select_move(state: &GameState, max_depth: u32) -> Result<Option<Direction>, SnapshotError> {
    Lookahead::with_config(SearchConfig { depth: max_depth, ..Default::default() }).select_move(state)
}

/// Build a policy from config.
pub fn policy_from_config(cfg: SearchConfig) -> Box<dyn Policy + Send> {
    if cfg.parallel {
        Box::new(LookaheadParallel::with_config(cfg))
    } else {
        Box::new(Lookahead::with_config(cfg))
    }
}

fn root_rng(seed: u64, dir: Direction) -> StdRng {
    StdRng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15u64.wrapping_mul(dir.index() as u64 + 1))
}

/// Evaluate one root direction with its own RNG stream.
fn root_branch(grid: &Grid, score: u64, depth: u32, seed: u64, dir: Direction, nodes: &mut u64) -> BranchEval {
    let mut rng = root_rng(seed, dir);
    let out = grid.make_move(dir, &mut rng);
    *nodes += 1;
    if !out.moved {
        return BranchEval { dir, value: score, legal: false };
    }
    let value = if out.over { 0 } else { evaluate(&out.grid, score + out.score, depth, &mut rng, nodes) };
    BranchEval { dir, value, legal: true }
}

fn evaluate<R: Rng + ?Sized>(grid: &Grid, score: u64, depth: u32, rng: &mut R, nodes: &mut u64) -> u64 {
    *nodes += 1;
    if depth == 0 {
        return score;
    }
    let mut best = 0;
    for dir in Direction::ALL {
        let out = grid.make_move(dir, rng);
        let child = score + out.score;
        let value = if out.over {
            0
        } else if !out.moved {
            child
        } else {
            evaluate(&out.grid, child, depth - 1, rng, nodes)
        };
        best = best.max(value);
    }
    best
}

/// Highest-valued legal branch; ties go to the lowest direction index.
fn pick(branches: &[BranchEval; 4]) -> Option<Direction> {
    let mut best: Option<&BranchEval> = None;
    for branch in branches.iter().filter(|b| b.legal) {
        if best.map_or(true, |cur| branch.value > cur.value) {
            best = Some(branch);
        }
    }
    best.map(|b| b.dir)
}
