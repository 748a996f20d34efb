use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};

use slide_merge::actuator::{Actuator, NullActuator, TerminalActuator};
use slide_merge::autoplay::AutoPlayer;
use slide_merge::config::Config;
use slide_merge::engine::Direction;
use slide_merge::game::Game;
use slide_merge::storage::{JsonFileStorage, MemoryStorage, Storage};

type DynGame = Game<Box<dyn Storage + Send>, Box<dyn Actuator + Send>>;

#[derive(Parser, Debug)]
#[command(name = "play", about = "Play the sliding-tile merge puzzle from the terminal")]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory for the saved game and best score (overrides config)
    #[arg(long)]
    state_dir: Option<PathBuf>,
    /// Grid edge length for new games (overrides config)
    #[arg(long)]
    size: Option<usize>,
    /// Spawn RNG seed (overrides config)
    #[arg(long)]
    seed: Option<u64>,
    /// Suppress board rendering
    #[arg(long, default_value_t = false)]
    quiet: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Let the look-ahead search play until the game ends
    Auto {
        /// Search depth
        #[arg(long)]
        depth: Option<u32>,
        /// Evaluate root directions on the rayon pool
        #[arg(long, default_value_t = false)]
        parallel: bool,
        /// Stop after this many moves
        #[arg(long)]
        steps: Option<u64>,
        /// Milliseconds between moves
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Apply one move: up, right, down or left
    Step { direction: Direction },
    /// Discard the current game and start a new one
    Restart,
    /// Continue after reaching the winning tile
    KeepPlaying,
    /// Print the current board
    Show,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::from_toml(path).with_context(|| format!("reading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(dir) = &args.state_dir {
        cfg.storage.dir = Some(dir.clone());
    }
    if let Some(size) = args.size {
        cfg.game.size = size;
    }
    if args.seed.is_some() {
        cfg.game.seed = args.seed;
    }
    if cfg.game.size == 0 {
        bail!("grid size must be at least 1");
    }

    let storage: Box<dyn Storage + Send> = match &cfg.storage.dir {
        Some(dir) => Box::new(JsonFileStorage::open(dir).with_context(|| format!("opening {}", dir.display()))?),
        None => Box::new(MemoryStorage::new()),
    };
    // Only board-inspecting commands render; `auto` draws a spinner instead.
    let renders = !args.quiet && matches!(args.cmd, Cmd::Step { .. } | Cmd::Show);
    let actuator: Box<dyn Actuator + Send> = if renders { Box::new(TerminalActuator) } else { Box::new(NullActuator) };
    let mut game: DynGame = Game::new(cfg.game_config(), storage, actuator);

    match args.cmd {
        Cmd::Auto { depth, parallel, steps, interval_ms } => {
            if let Some(depth) = depth {
                cfg.search.depth = depth;
            }
            cfg.search.parallel |= parallel;
            if steps.is_some() {
                cfg.autoplay.max_moves = steps;
            }
            if let Some(ms) = interval_ms {
                cfg.autoplay.interval_ms = ms;
            }
            run_auto(game, &cfg, args.quiet)
        }
        Cmd::Step { direction } => {
            if game.is_game_terminated() {
                bail!("game is over; run `restart` (or `keep-playing` after a win)");
            }
            if !game.move_tiles(direction) {
                println!("{direction} does not move any tile");
            }
            Ok(())
        }
        Cmd::Restart => {
            game.restart();
            if !args.quiet {
                println!("{}", game.grid());
            }
            Ok(())
        }
        Cmd::KeepPlaying => {
            if !game.is_won() {
                bail!("keep-playing only applies after reaching the winning tile");
            }
            game.keep_playing();
            println!("continuing at score {}", game.score());
            Ok(())
        }
        // Construction already rendered the stored (or fresh) game.
        Cmd::Show => {
            if game.is_keep_playing() {
                println!("playing on past the winning tile");
            }
            Ok(())
        }
    }
}

fn run_auto(game: DynGame, cfg: &Config, quiet: bool) -> Result<()> {
    let start = Instant::now();
    let mut player = AutoPlayer::new(Arc::new(Mutex::new(game)), cfg.autoplay_config());
    player.toggle();

    let pb = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} | Moves: {msg}")?
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    };

    while player.is_running() {
        thread::sleep(Duration::from_millis(250));
        if let Some(pb) = &pb {
            let m = player.moves();
            let rate = (m as f64) / start.elapsed().as_secs_f64().max(1e-6);
            let score = player.game().lock().map(|g| g.score()).unwrap_or_default();
            pb.set_message(format!("{} | moves/sec: {:.1} | score: {}", m, rate, score));
        }
    }
    let moves = player.moves();
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let game = match player.game().lock() {
        Ok(g) => g,
        Err(_) => bail!("auto-play worker poisoned the game lock"),
    };
    if !quiet {
        println!("{}", game.grid());
    }
    println!(
        "Moves: {} | score: {} | best: {} | highest tile: {}{}",
        moves,
        game.score(),
        game.best_score(),
        game.grid().highest_tile(),
        if game.is_over() { " | game over" } else if game.is_won() { " | won" } else { "" }
    );
    Ok(())
}
