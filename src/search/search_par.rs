use rayon::prelude::*;

use crate::engine::{Direction, Grid};

use super::{pick, root_branch, BranchEval, Policy, SearchConfig, SearchStats};

/// Look-ahead search with the four root branches evaluated in parallel.
///
/// Every branch owns its grid clone and RNG, so results match [`super::Lookahead`]
/// for the same config.
pub struct LookaheadParallel {
    cfg: SearchConfig,
    stats: SearchStats,
}

impl LookaheadParallel {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(cfg: SearchConfig) -> Self {
        Self { cfg, stats: SearchStats::default() }
    }

    #[inline]
    pub fn best_move(&mut self, grid: &Grid, score: u64) -> Option<Direction> {
        let branches = self.branch_evals(grid, score);
        pick(&branches)
    }

    /// Convenience for runners that record evaluations: best move plus all branches.
    #[inline]
    pub fn best_move_with_branches(&mut self, grid: &Grid, score: u64) -> (Option<Direction>, [BranchEval; 4]) {
        let branches = self.branch_evals(grid, score);
        (pick(&branches), branches)
    }

    /// Value of each root direction, in [`Direction::ALL`] order.
    pub fn branch_evals(&mut self, grid: &Grid, score: u64) -> [BranchEval; 4] {
        let (depth, seed) = (self.cfg.depth, self.cfg.seed);
        let results: Vec<(BranchEval, u64)> = Direction::ALL
            .par_iter()
            .map(|&dir| {
                let mut nodes = 0u64;
                let branch = root_branch(grid, score, depth, seed, dir, &mut nodes);
                (branch, nodes)
            })
            .collect();
        let mut out = Direction::ALL.map(|dir| BranchEval { dir, value: score, legal: false });
        let mut nodes = 0u64;
        for (branch, n) in results {
            out[branch.dir.index()] = branch;
            nodes += n;
        }
        self.stats.nodes = nodes;
        self.stats.peak_nodes = self.stats.peak_nodes.max(nodes);
        out
    }

    #[inline]
    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }

    #[inline]
    pub fn reset_stats(&mut self) {
        self.stats = SearchStats::default();
    }
}

impl Default for LookaheadParallel {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for LookaheadParallel {
    fn best_move(&mut self, grid: &Grid, score: u64) -> Option<Direction> {
        LookaheadParallel::best_move(self, grid, score)
    }
}
