use env_logger::Env;
use slide_merge::actuator::TerminalActuator;
use slide_merge::game::{Game, GameConfig};
use slide_merge::search::Lookahead;
use slide_merge::storage::MemoryStorage;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let mut game = Game::new(GameConfig::default(), MemoryStorage::new(), TerminalActuator);
    let mut lookahead = Lookahead::new();
    let mut move_count = 0;
    let mut total_nodes: u64 = 0;
    while !game.is_game_terminated() {
        let Some(direction) = lookahead.best_move(game.grid(), game.score()) else {
            break;
        };
        move_count += 1;
        game.move_tiles(direction);
        total_nodes = total_nodes.saturating_add(lookahead.last_stats().nodes);
    }
    println!(
        "Moves made: {}, Score: {}, States considered: {}, Max states considered for a move: {}",
        move_count,
        game.score(),
        total_nodes,
        lookahead.last_stats().peak_nodes
    );
}
