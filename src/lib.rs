//! slide_merge: a sliding-tile merge puzzle engine plus a look-ahead player.
//!
//! This crate provides:
//! - A value-type `Grid` with the full move resolution (`shift`, `make_move`)
//! - A `Game` turn controller with pluggable storage and render collaborators
//! - A depth-limited look-ahead search (`search` module), sequential and parallel
//! - A cancellable periodic auto-player (`autoplay` module)
//!
//! Quick start:
//! ```
//! use slide_merge::actuator::NullActuator;
//! use slide_merge::game::{Game, GameConfig};
//! use slide_merge::search::{Lookahead, Policy, SearchConfig};
//! use slide_merge::storage::MemoryStorage;
//!
//! let cfg = GameConfig { seed: Some(42), ..Default::default() };
//! let mut game = Game::new(cfg, MemoryStorage::new(), NullActuator);
//! let mut policy = Lookahead::with_config(SearchConfig { depth: 1, ..Default::default() });
//!
//! let mut moves = 0;
//! while !game.is_game_terminated() && moves < 4 {
//!     match policy.select_move(&game.serialize()).unwrap() {
//!         Some(dir) => {
//!             game.move_tiles(dir);
//!             moves += 1;
//!         }
//!         None => break,
//!     }
//! }
//! assert!(moves > 0);
//! ```
//!
//! Randomness (spawn position and value) always flows through an injected,
//! seedable RNG.
pub mod actuator;
pub mod autoplay;
pub mod config;
pub mod engine;
pub mod game;
pub mod search;
pub mod snapshot;
pub mod storage;
