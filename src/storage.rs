//! Persistence collaborators for the turn controller.
//!
//! [`Storage`] keeps two independent records: the current game snapshot and
//! the best score. [`MemoryStorage`] is used by tests and the demo binary;
//! [`JsonFileStorage`] writes both records as small files in a directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::snapshot::GameState;

const GAME_STATE_FILE: &str = "game_state.json";
const BEST_SCORE_FILE: &str = "best_score";

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed best score record: {0:?}")]
    BestScore(String),
}

pub trait Storage {
    fn best_score(&self) -> Result<u64, StorageError>;
    fn set_best_score(&mut self, score: u64) -> Result<(), StorageError>;
    /// `Ok(None)` means no game is stored.
    fn game_state(&self) -> Result<Option<GameState>, StorageError>;
    fn set_game_state(&mut self, state: &GameState) -> Result<(), StorageError>;
    fn clear_game_state(&mut self) -> Result<(), StorageError>;
}

impl<T: Storage + ?Sized> Storage for Box<T> {
    fn best_score(&self) -> Result<u64, StorageError> {
        (**self).best_score()
    }

    fn set_best_score(&mut self, score: u64) -> Result<(), StorageError> {
        (**self).set_best_score(score)
    }

    fn game_state(&self) -> Result<Option<GameState>, StorageError> {
        (**self).game_state()
    }

    fn set_game_state(&mut self, state: &GameState) -> Result<(), StorageError> {
        (**self).set_game_state(state)
    }

    fn clear_game_state(&mut self) -> Result<(), StorageError> {
        (**self).clear_game_state()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    best_score: u64,
    game_state: Option<GameState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a stored snapshot, as if a previous session saved it.
    pub fn with_game_state(state: GameState) -> Self {
        MemoryStorage { best_score: 0, game_state: Some(state) }
    }
}

impl Storage for MemoryStorage {
    fn best_score(&self) -> Result<u64, StorageError> {
        Ok(self.best_score)
    }

    fn set_best_score(&mut self, score: u64) -> Result<(), StorageError> {
        self.best_score = score;
        Ok(())
    }

    fn game_state(&self) -> Result<Option<GameState>, StorageError> {
        Ok(self.game_state.clone())
    }

    fn set_game_state(&mut self, state: &GameState) -> Result<(), StorageError> {
        self.game_state = Some(state.clone());
        Ok(())
    }

    fn clear_game_state(&mut self) -> Result<(), StorageError> {
        self.game_state = None;
        Ok(())
    }
}

/// Directory-backed storage: `game_state.json` plus a plain-text `best_score`.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(JsonFileStorage { dir: dir.as_ref().to_path_buf() })
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join(GAME_STATE_FILE)
    }

    fn best_path(&self) -> PathBuf {
        self.dir.join(BEST_SCORE_FILE)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, StorageError> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Storage for JsonFileStorage {
    fn best_score(&self) -> Result<u64, StorageError> {
        match read_optional(&self.best_path())? {
            None => Ok(0),
            Some(s) => s.trim().parse().map_err(|_| StorageError::BestScore(s)),
        }
    }

    fn set_best_score(&mut self, score: u64) -> Result<(), StorageError> {
        fs::write(self.best_path(), score.to_string())?;
        Ok(())
    }

    fn game_state(&self) -> Result<Option<GameState>, StorageError> {
        match read_optional(&self.state_path())? {
            None => Ok(None),
            Some(s) => Ok(Some(GameState::from_json(&s)?)),
        }
    }

    fn set_game_state(&mut self, state: &GameState) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(state)?;
        fs::write(self.state_path(), data)?;
        Ok(())
    }

    fn clear_game_state(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(self.state_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
