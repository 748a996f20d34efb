use log::debug;

use crate::engine::{Direction, Grid};

use super::{pick, root_branch, BranchEval, Policy, SearchConfig, SearchStats};

/// Single-threaded look-ahead search.
pub struct Lookahead {
    cfg: SearchConfig,
    stats: SearchStats,
}

impl Lookahead {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(cfg: SearchConfig) -> Self {
        Self { cfg, stats: SearchStats::default() }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.cfg
    }

    /// Pick the direction with the highest look-ahead value.
    ///
    /// Returns `None` only when no direction changes `grid`.
    #[inline]
    pub fn best_move(&mut self, grid: &Grid, score: u64) -> Option<Direction> {
        let branches = self.branch_evals(grid, score);
        pick(&branches)
    }

    /// Value of each root direction, in [`Direction::ALL`] order.
    pub fn branch_evals(&mut self, grid: &Grid, score: u64) -> [BranchEval; 4] {
        let mut nodes = 0u64;
        let out = Direction::ALL.map(|dir| {
            let branch = root_branch(grid, score, self.cfg.depth, self.cfg.seed, dir, &mut nodes);
            debug!("branch {dir}: value {} legal {}", branch.value, branch.legal);
            branch
        });
        self.stats.nodes = nodes;
        self.stats.peak_nodes = self.stats.peak_nodes.max(nodes);
        out
    }

    /// Statistics from the last call to [`Self::best_move`] or [`Self::branch_evals`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }

    #[inline]
    pub fn reset_stats(&mut self) {
        self.stats = SearchStats::default();
    }
}

impl Default for Lookahead {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for Lookahead {
    fn best_move(&mut self, grid: &Grid, score: u64) -> Option<Direction> {
        Lookahead::best_move(self, grid, score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{grid_from_rows, Position};
    use crate::snapshot::GameState;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn policy(depth: u32) -> Lookahead {
        Lookahead::with_config(SearchConfig { depth, ..Default::default() })
    }

    #[test]
    fn never_picks_a_noop_when_a_move_exists() {
        let g = grid_from_rows(&[&[2, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        for depth in 0..4 {
            let dir = policy(depth).best_move(&g, 0);
            assert!(matches!(dir, Some(Direction::Right) | Some(Direction::Down)), "depth {depth}: {dir:?}");
        }
    }

    #[test]
    fn random_states_always_get_a_moving_direction() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut g = Grid::empty(4);
        g.add_random_tile(&mut rng);
        g.add_random_tile(&mut rng);
        let mut p = policy(1);
        for _ in 0..30 {
            let Some(dir) = p.best_move(&g, 0) else {
                assert!(!g.moves_available() || Direction::ALL.iter().all(|&d| !g.shift(d).moved));
                break;
            };
            assert!(g.shift(dir).moved);
            g = g.make_move(Direction::ALL[rng.gen_range(0..4)], &mut rng).grid;
        }
    }

    #[test]
    fn terminal_grid_has_no_move() {
        let g = grid_from_rows(&[&[2, 4, 2, 4], &[4, 2, 4, 2], &[2, 4, 2, 4], &[4, 2, 4, 2]]);
        let mut p = policy(2);
        assert_eq!(p.best_move(&g, 0), None);
        assert!(p.branch_evals(&g, 0).iter().all(|b| !b.legal));
    }

    #[test]
    fn depth_zero_takes_best_immediate_score() {
        let g = grid_from_rows(&[&[2, 2, 0, 0], &[4, 8, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        let mut p = policy(0);
        let branches = p.branch_evals(&g, 10);
        assert!(!branches[Direction::Up.index()].legal);
        assert_eq!(branches[Direction::Right.index()].value, 14);
        assert_eq!(branches[Direction::Down.index()].value, 10);
        assert_eq!(branches[Direction::Left.index()].value, 14);
        assert_eq!(p.best_move(&g, 10), Some(Direction::Right));
    }

    #[test]
    fn search_does_not_touch_the_input() {
        let g = grid_from_rows(&[&[2, 2, 4, 0], &[0, 4, 0, 0], &[0, 0, 0, 0], &[2, 0, 0, 2]]);
        let before = g.clone();
        let mut p = policy(3);
        p.best_move(&g, 0);
        assert_eq!(g, before);
        assert_eq!(g.cell_content(Position::new(0, 0)).map(|t| t.value), Some(2));
    }

    #[test]
    fn deeper_search_visits_more_nodes() {
        let g = grid_from_rows(&[&[2, 2, 4, 0], &[0, 4, 0, 0], &[0, 0, 0, 0], &[2, 0, 0, 2]]);
        let mut shallow = policy(1);
        let mut deep = policy(3);
        shallow.best_move(&g, 0);
        deep.best_move(&g, 0);
        assert!(deep.last_stats().nodes > shallow.last_stats().nodes);
        assert_eq!(deep.last_stats().peak_nodes, deep.last_stats().nodes);
        deep.reset_stats();
        assert_eq!(deep.last_stats().nodes, 0);
    }

    #[test]
    fn selection_is_reproducible() {
        let g = grid_from_rows(&[&[2, 2, 4, 0], &[0, 4, 0, 0], &[0, 0, 0, 0], &[2, 0, 0, 2]]);
        let a = policy(3).branch_evals(&g, 0);
        let b = policy(3).branch_evals(&g, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn select_move_from_snapshot() {
        let g = grid_from_rows(&[&[2, 2, 0, 0], &[4, 8, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        let state = GameState { grid: g.serialize(), score: 0, over: false, won: false, keep_playing: false };
        assert_eq!(policy(0).select_move(&state).unwrap(), Some(Direction::Right));
    }
}
