//! Periodic search-driven play.
//!
//! [`start`] spawns a worker that, every `interval`, takes the game lock,
//! serializes the game, selects a move and applies it. Each tick is one
//! complete select + move or nothing. [`AutoPlayHandle::cancel`] stops the
//! worker between ticks; a [`SingleFlight`] guard keeps manual steps from
//! overlapping a tick in flight. [`AutoPlayer`] wraps both behind a single
//! on/off toggle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::actuator::Actuator;
use crate::engine::Direction;
use crate::game::Game;
use crate::search::{policy_from_config, Policy, SearchConfig};
use crate::storage::Storage;

pub type SharedGame<S, A> = Arc<Mutex<Game<S, A>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoPlayConfig {
    pub interval: Duration,
    pub search: SearchConfig,
    /// Stop after this many accepted moves.
    pub max_moves: Option<u64>,
}

impl Default for AutoPlayConfig {
    fn default() -> Self {
        Self { interval: Duration::from_millis(100), search: SearchConfig::default(), max_moves: None }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved(Direction),
    /// No direction changes the grid.
    Stuck,
    /// Lost, or won without keep-playing.
    Terminated,
}

/// Admits one holder at a time; the slot frees when the guard drops.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight(Arc<AtomicBool>);

pub struct FlightGuard(Arc<AtomicBool>);

impl SingleFlight {
    pub fn try_acquire(&self) -> Option<FlightGuard> {
        self.0
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| FlightGuard(self.0.clone()))
    }

    pub fn in_flight(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Select and apply one move.
pub fn step<S: Storage, A: Actuator>(game: &mut Game<S, A>, policy: &mut dyn Policy) -> Step {
    if game.is_game_terminated() {
        return Step::Terminated;
    }
    let state = game.serialize();
    match policy.select_move(&state) {
        Ok(Some(dir)) if game.move_tiles(dir) => Step::Moved(dir),
        Ok(_) => Step::Stuck,
        Err(e) => {
            warn!("live game failed to rehydrate for search: {e}");
            Step::Stuck
        }
    }
}

/// Handle to a running auto-player. Dropping it cancels the worker.
pub struct AutoPlayHandle {
    stop: Arc<AtomicBool>,
    moves: Arc<AtomicU64>,
    worker: Option<thread::JoinHandle<()>>,
}

impl AutoPlayHandle {
    /// Moves applied so far.
    pub fn moves(&self) -> u64 {
        self.moves.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |w| w.is_finished())
    }

    /// Stop scheduling ticks and wait for the worker. Returns moves applied.
    pub fn cancel(mut self) -> u64 {
        self.shutdown(true);
        self.moves()
    }

    /// Wait for the worker to stop on its own (game end or move cap).
    pub fn wait(mut self) -> u64 {
        self.shutdown(false);
        self.moves()
    }

    fn shutdown(&mut self, signal: bool) {
        let Some(worker) = self.worker.take() else { return };
        if signal {
            self.stop.store(true, Ordering::Relaxed);
            worker.thread().unpark();
        }
        if worker.join().is_err() {
            warn!("auto-play worker panicked");
        }
    }
}

impl Drop for AutoPlayHandle {
    fn drop(&mut self) {
        self.shutdown(true);
    }
}

/// Start a worker with its own single-flight guard.
pub fn start<S, A>(game: SharedGame<S, A>, cfg: AutoPlayConfig) -> AutoPlayHandle
where
    S: Storage + Send + 'static,
    A: Actuator + Send + 'static,
{
    start_guarded(game, cfg, SingleFlight::default())
}

/// Start a worker that shares `flight` with other callers.
pub fn start_guarded<S, A>(game: SharedGame<S, A>, cfg: AutoPlayConfig, flight: SingleFlight) -> AutoPlayHandle
where
    S: Storage + Send + 'static,
    A: Actuator + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let moves = Arc::new(AtomicU64::new(0));
    let stop_flag = stop.clone();
    let move_count = moves.clone();
    info!("auto-play started (depth {}, every {:?})", cfg.search.depth, cfg.interval);
    let worker = thread::spawn(move || {
        let mut policy = policy_from_config(cfg.search.clone());
        while !stop_flag.load(Ordering::Relaxed) {
            if let Some(_guard) = flight.try_acquire() {
                let result = match game.lock() {
                    Ok(mut g) => step(&mut *g, policy.as_mut()),
                    Err(_) => {
                        warn!("game lock poisoned; stopping auto-play");
                        break;
                    }
                };
                match result {
                    Step::Moved(dir) => {
                        let n = move_count.fetch_add(1, Ordering::Relaxed) + 1;
                        debug!("auto-play move {n}: {dir}");
                        if cfg.max_moves.is_some_and(|max| n >= max) {
                            break;
                        }
                    }
                    Step::Stuck | Step::Terminated => break,
                }
            }
            thread::park_timeout(cfg.interval);
        }
        info!("auto-play stopped after {} moves", move_count.load(Ordering::Relaxed));
    });
    AutoPlayHandle { stop, moves, worker: Some(worker) }
}

/// Toggleable auto-player bound to one shared game.
pub struct AutoPlayer<S: Storage, A: Actuator> {
    game: SharedGame<S, A>,
    cfg: AutoPlayConfig,
    flight: SingleFlight,
    handle: Option<AutoPlayHandle>,
}

impl<S, A> AutoPlayer<S, A>
where
    S: Storage + Send + 'static,
    A: Actuator + Send + 'static,
{
    pub fn new(game: SharedGame<S, A>, cfg: AutoPlayConfig) -> Self {
        AutoPlayer { game, cfg, flight: SingleFlight::default(), handle: None }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start if stopped, stop if running. Returns whether it is now running.
    pub fn toggle(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) if !handle.is_finished() => {
                handle.cancel();
                false
            }
            _ => {
                let handle = start_guarded(self.game.clone(), self.cfg.clone(), self.flight.clone());
                self.handle = Some(handle);
                true
            }
        }
    }

    /// Run one tick on the caller's thread, unless a tick is in flight.
    pub fn step_once(&self) -> Option<Step> {
        let _guard = self.flight.try_acquire()?;
        let mut policy = policy_from_config(self.cfg.search.clone());
        let mut game = self.game.lock().ok()?;
        Some(step(&mut *game, policy.as_mut()))
    }

    /// Moves applied by the current (or last) run.
    pub fn moves(&self) -> u64 {
        self.handle.as_ref().map_or(0, AutoPlayHandle::moves)
    }

    pub fn game(&self) -> &SharedGame<S, A> {
        &self.game
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::RecordingActuator;
    use crate::game::GameConfig;
    use crate::search::Lookahead;
    use crate::storage::MemoryStorage;

    fn shared(seed: u64) -> SharedGame<MemoryStorage, RecordingActuator> {
        let cfg = GameConfig { seed: Some(seed), ..Default::default() };
        Arc::new(Mutex::new(Game::new(cfg, MemoryStorage::new(), RecordingActuator::default())))
    }

    fn quick(max_moves: Option<u64>) -> AutoPlayConfig {
        AutoPlayConfig {
            interval: Duration::from_millis(1),
            search: SearchConfig { depth: 1, ..Default::default() },
            max_moves,
        }
    }

    #[test]
    fn step_applies_one_move() {
        let game = shared(1);
        let mut g = game.lock().unwrap();
        let mut policy = Lookahead::with_config(SearchConfig { depth: 1, ..Default::default() });
        assert!(matches!(step(&mut *g, &mut policy), Step::Moved(_)));
        assert_eq!(g.actuator().frames.len(), 2);
    }

    #[test]
    fn worker_stops_at_move_cap() {
        let game = shared(2);
        let handle = start(game.clone(), quick(Some(5)));
        assert_eq!(handle.wait(), 5);
        assert_eq!(game.lock().unwrap().actuator().frames.len(), 6);
    }

    #[test]
    fn cancel_returns_promptly() {
        let game = shared(3);
        let cfg = AutoPlayConfig { interval: Duration::from_secs(60), ..quick(None) };
        let handle = start(game, cfg);
        thread::sleep(Duration::from_millis(20));
        let asked = std::time::Instant::now();
        handle.cancel();
        assert!(asked.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn plays_terminated_game_to_nothing() {
        let game = shared(4);
        {
            let mut g = game.lock().unwrap();
            let mut policy = Lookahead::with_config(SearchConfig { depth: 0, ..Default::default() });
            while let Step::Moved(_) = step(&mut *g, &mut policy) {}
            assert!(g.is_game_terminated() || !g.grid().moves_available());
        }
        let handle = start(game, quick(None));
        assert_eq!(handle.wait(), 0);
    }

    #[test]
    fn single_flight_blocks_overlap() {
        let flight = SingleFlight::default();
        let guard = flight.try_acquire().unwrap();
        assert!(flight.in_flight());
        assert!(flight.try_acquire().is_none());
        drop(guard);
        assert!(!flight.in_flight());
        assert!(flight.try_acquire().is_some());
    }

    #[test]
    fn step_once_skips_while_in_flight() {
        let player = AutoPlayer::new(shared(5), quick(None));
        let held = player.flight.try_acquire().unwrap();
        assert_eq!(player.step_once(), None);
        drop(held);
        assert!(matches!(player.step_once(), Some(Step::Moved(_))));
    }

    #[test]
    fn toggle_starts_and_stops() {
        let cfg = AutoPlayConfig { interval: Duration::from_secs(60), ..quick(None) };
        let mut player = AutoPlayer::new(shared(6), cfg);
        assert!(!player.is_running());
        assert!(player.toggle());
        assert!(player.is_running());
        assert!(!player.toggle());
        assert!(!player.is_running());
    }

    #[test]
    fn toggled_run_stops_at_move_cap() {
        let mut player = AutoPlayer::new(shared(7), quick(Some(3)));
        assert!(player.toggle());
        for _ in 0..500 {
            if !player.is_running() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!player.is_running());
        assert_eq!(player.moves(), 3);
        assert_eq!(player.game().lock().unwrap().actuator().frames.len(), 4);
    }
}
