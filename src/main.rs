// Protocol driver: reads turns from stdin and answers one move code per turn
//
// stdout carries only move codes; every diagnostic goes through `log` to
// stderr. A panic inside the engine is contained to the turn it happened in.

use log::{error, info, warn};
use std::env;
use std::io::{self, BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};

use snake_agent::bot::{safe_default, Bot};
use snake_agent::config::Config;
use snake_agent::debug_logger::DebugLogger;
use snake_agent::protocol::TurnReader;
use snake_agent::simple_profiler;

fn main() {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(e) = run() {
        error!("Input failed: {}", e);
    }
}

fn run() -> io::Result<()> {
    let config_path = env::args().nth(1);
    let config = match config_path {
        Some(path) => Config::from_file(&path).unwrap_or_else(|e| {
            warn!("{}; using default configuration", e);
            Config::default_hardcoded()
        }),
        None => Config::load_or_default(),
    };

    let stdin = io::stdin();
    let mut reader = TurnReader::new(stdin.lock());
    let mut out = BufWriter::new(io::stdout().lock());

    let Some(session) = reader.read_session()? else {
        info!("Input closed before the init line");
        return Ok(());
    };
    info!(
        "Session: {} snakes on {}x{} (mode {:?})",
        session.snake_count, session.width, session.height, session.mode
    );

    let mut logger = DebugLogger::from_config(&config);
    let board = config.board.clone();
    let mut bot = Bot::new(config, session.clone());
    let mut turns = 0;

    while let Some(snapshot) = reader.next_turn()? {
        let decision = panic::catch_unwind(AssertUnwindSafe(|| bot.decide(&snapshot)));

        let (direction, decision) = match decision {
            Ok(d) => (d.direction, Some(d)),
            Err(_) => {
                error!("Turn {}: engine panicked, using safe default", snapshot.turn);
                (safe_default(&session, &board, &snapshot), None)
            }
        };

        let code = bot.encode(direction);
        writeln!(out, "{}", code)?;
        out.flush()?;

        logger.log_move(&session, &snapshot, code, decision.as_ref());
        turns += 1;
    }

    info!("Game Over after {} turns", turns);
    simple_profiler::print_report(turns);
    Ok(())
}
