//! TOML configuration for the binaries.
//!
//! ```toml
//! [game]
//! size = 4
//! start_tiles = 2
//! seed = 7
//!
//! [search]
//! depth = 3
//! parallel = true
//!
//! [autoplay]
//! interval_ms = 50
//!
//! [storage]
//! dir = "./state"
//! ```
//! Every table and key is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::autoplay::AutoPlayConfig;
use crate::game::GameConfig;
use crate::search::SearchConfig;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Clone, Debug, PartialEq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub game: GameSection,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub autoplay: AutoPlaySection,
    #[serde(default)]
    pub storage: StorageSection,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GameSection {
    #[serde(default = "defaults::size")]
    pub size: usize,
    #[serde(default = "defaults::start_tiles")]
    pub start_tiles: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SearchSection {
    #[serde(default = "defaults::depth")]
    pub depth: u32,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub parallel: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AutoPlaySection {
    #[serde(default = "defaults::interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub max_moves: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Default)]
pub struct StorageSection {
    /// Directory for the JSON store; in-memory when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for GameSection {
    fn default() -> Self {
        Self { size: defaults::size(), start_tiles: defaults::start_tiles(), seed: None }
    }
}

impl Default for SearchSection {
    fn default() -> Self {
        Self { depth: defaults::depth(), seed: 0, parallel: false }
    }
}

impl Default for AutoPlaySection {
    fn default() -> Self {
        Self { interval_ms: defaults::interval_ms(), max_moves: None }
    }
}

impl Config {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig { size: self.game.size, start_tiles: self.game.start_tiles, seed: self.game.seed }
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig { depth: self.search.depth, seed: self.search.seed, parallel: self.search.parallel }
    }

    pub fn autoplay_config(&self) -> AutoPlayConfig {
        AutoPlayConfig {
            interval: Duration::from_millis(self.autoplay.interval_ms),
            search: self.search_config(),
            max_moves: self.autoplay.max_moves,
        }
    }
}

mod defaults {
    pub fn size() -> usize { crate::engine::DEFAULT_SIZE }
    pub fn start_tiles() -> usize { 2 }
    pub fn depth() -> u32 { 3 }
    pub fn interval_ms() -> u64 { 100 }
}
