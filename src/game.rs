//! Turn controller: owns one [`Grid`] plus score and terminal flags, and
//! applies the side effects of each accepted move.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::actuator::{Actuator, Metadata};
use crate::engine::{Direction, Grid, DEFAULT_SIZE};
use crate::snapshot::{GameState, SnapshotError};
use crate::storage::Storage;

/// Knobs for a new game.
///
/// - `size`: grid edge length.
/// - `start_tiles`: random tiles seeded into a fresh grid.
/// - `seed`: seed for the spawn RNG (`None` draws from entropy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: usize,
    pub start_tiles: usize,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { size: DEFAULT_SIZE, start_tiles: 2, seed: None }
    }
}

pub struct Game<S: Storage, A: Actuator> {
    cfg: GameConfig,
    grid: Grid,
    score: u64,
    over: bool,
    won: bool,
    keep_playing: bool,
    storage: S,
    actuator: A,
    rng: StdRng,
}

impl<S: Storage, A: Actuator> Game<S, A> {
    /// Create a game and run [`Game::setup`].
    ///
    /// ```
    /// use slide_merge::actuator::NullActuator;
    /// use slide_merge::engine::Direction;
    /// use slide_merge::game::{Game, GameConfig};
    /// use slide_merge::storage::MemoryStorage;
    ///
    /// let cfg = GameConfig { seed: Some(1), ..Default::default() };
    /// let mut game = Game::new(cfg, MemoryStorage::new(), NullActuator);
    /// assert_eq!(game.grid().tiles().count(), 2);
    /// for dir in Direction::ALL {
    ///     game.move_tiles(dir);
    /// }
    /// ```
    pub fn new(cfg: GameConfig, storage: S, actuator: A) -> Self {
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(cfg, storage, actuator, rng)
    }

    pub fn with_rng(cfg: GameConfig, storage: S, actuator: A, rng: StdRng) -> Self {
        let grid = Grid::empty(cfg.size);
        let mut game = Game {
            cfg,
            grid,
            score: 0,
            over: false,
            won: false,
            keep_playing: false,
            storage,
            actuator,
            rng,
        };
        game.setup();
        game
    }

    /// Reload the persisted game if there is a valid one, else start fresh.
    pub fn setup(&mut self) {
        match self.load_previous() {
            Some((grid, state)) => {
                info!("resuming stored game (score {})", state.score);
                self.grid = grid;
                self.score = state.score;
                self.over = state.over;
                self.won = state.won;
                self.keep_playing = state.keep_playing;
            }
            None => {
                self.grid = Grid::empty(self.cfg.size);
                self.score = 0;
                self.over = false;
                self.won = false;
                self.keep_playing = false;
                self.add_start_tiles();
                info!("started new {0}x{0} game", self.cfg.size);
            }
        }
        self.actuate();
    }

    fn load_previous(&mut self) -> Option<(Grid, GameState)> {
        let state = match self.storage.game_state() {
            Ok(Some(state)) => state,
            Ok(None) => return None,
            Err(e) => {
                warn!("unreadable stored game, starting fresh: {e}");
                self.clear_stored_state();
                return None;
            }
        };
        match self.rehydrate(&state) {
            Ok(grid) => Some((grid, state)),
            Err(e) => {
                warn!("corrupt stored game, starting fresh: {e}");
                self.clear_stored_state();
                None
            }
        }
    }

    fn rehydrate(&self, state: &GameState) -> Result<Grid, SnapshotError> {
        if state.grid.size != self.cfg.size {
            return Err(SnapshotError::SizeMismatch { expected: self.cfg.size, found: state.grid.size });
        }
        Grid::from_state(&state.grid)
    }

    fn add_start_tiles(&mut self) {
        for _ in 0..self.cfg.start_tiles {
            self.grid.add_random_tile(&mut self.rng);
        }
    }

    pub fn restart(&mut self) {
        info!("restarting game");
        self.clear_stored_state();
        self.actuator.continue_game();
        self.setup();
    }

    /// Allow play to continue after reaching the winning tile. One-way.
    pub fn keep_playing(&mut self) {
        self.keep_playing = true;
        self.actuator.continue_game();
        self.persist();
    }

    /// Lost, or won without choosing to keep playing.
    #[inline]
    pub fn is_game_terminated(&self) -> bool {
        self.over || (self.won && !self.keep_playing)
    }

    /// Resolve one turn in `direction`.
    ///
    /// Returns false, leaving everything untouched, when the game is
    /// terminated or the move changes nothing.
    pub fn move_tiles(&mut self, direction: Direction) -> bool {
        if self.is_game_terminated() {
            debug!("ignoring {direction}: game terminated");
            return false;
        }
        let outcome = self.grid.make_move(direction, &mut self.rng);
        if !outcome.moved {
            return false;
        }
        self.grid = outcome.grid;
        self.score += outcome.score;
        self.won |= outcome.won;
        self.over = outcome.over;
        debug!("moved {direction}: +{} (score {}, over {})", outcome.score, self.score, self.over);
        self.actuate();
        true
    }

    pub fn serialize(&self) -> GameState {
        GameState {
            grid: self.grid.serialize(),
            score: self.score,
            over: self.over,
            won: self.won,
            keep_playing: self.keep_playing,
        }
    }

    /// Raise the best score, refresh or clear the stored snapshot, then render.
    fn actuate(&mut self) {
        let mut best = self.best_score();
        if best < self.score {
            best = self.score;
            if let Err(e) = self.storage.set_best_score(best) {
                warn!("failed to store best score: {e}");
            }
        }
        self.persist();
        let metadata = Metadata {
            score: self.score,
            over: self.over,
            won: self.won,
            best_score: best,
            terminated: self.is_game_terminated(),
        };
        self.actuator.actuate(&self.grid, &metadata);
    }

    // Game over clears the snapshot; a win does not.
    fn persist(&mut self) {
        if self.over {
            self.clear_stored_state();
        } else {
            let state = self.serialize();
            if let Err(e) = self.storage.set_game_state(&state) {
                warn!("failed to store game: {e}");
            }
        }
    }

    fn clear_stored_state(&mut self) {
        if let Err(e) = self.storage.clear_game_state() {
            warn!("failed to clear stored game: {e}");
        }
    }

    pub fn best_score(&self) -> u64 {
        self.storage.best_score().unwrap_or_else(|e| {
            warn!("failed to read best score: {e}");
            0
        })
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.over
    }

    #[inline]
    pub fn is_won(&self) -> bool {
        self.won
    }

    #[inline]
    pub fn is_keep_playing(&self) -> bool {
        self.keep_playing
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}
