// Integration tests for the replay engine
//
// A log is produced the same way the driver produces it (TurnReader -> Bot ->
// DebugLogger), then replayed with the same seeded configuration. Replays are
// deterministic, so every turn must match.

use std::io::Cursor;
use std::path::PathBuf;

use snake_agent::bot::Bot;
use snake_agent::config::Config;
use snake_agent::debug_logger::DebugLogger;
use snake_agent::protocol::TurnReader;
use snake_agent::replay::ReplayEngine;

const GAME_ONE: &str = "\
2 15 15 1
7 7
0
alive 3 0 2,2 2,4
alive 4 1 12,12 12,9
7 7
0
alive 3 0 3,2 2,2 2,3
alive 4 1 12,11 12,8
7 7
0
alive 3 0 4,2 2,2
alive 4 1 12,10 12,7
Game Over
";

const GAME_TWO: &str = "\
1 8 8
1 1
0
alive 2 0 4,4 4,5
1 1
0
alive 2 0 4,3 4,4
Game Over
";

fn temp_log(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("snake_agent_{}_{}.jsonl", name, std::process::id()))
}

fn seeded_config() -> Config {
    let mut config = Config::default_hardcoded();
    config.engine.rng_seed = Some(11);
    config.timing.turn_budget_ms = 10_000;
    config
}

/// Plays the given sessions and logs every turn to `path`
fn record(path: &PathBuf, sessions: &[&str]) {
    let mut logger = DebugLogger::new(true, &path.to_string_lossy());
    for input in sessions {
        let mut reader = TurnReader::new(Cursor::new(*input));
        let session = reader.read_session().unwrap().unwrap();
        let mut bot = Bot::new(seeded_config(), session.clone());
        while let Some(snapshot) = reader.next_turn().unwrap() {
            let decision = bot.decide(&snapshot);
            let code = bot.encode(decision.direction);
            logger.log_move(&session, &snapshot, code, Some(&decision));
        }
    }
}

#[test]
fn test_replay_of_generated_log_matches_every_turn() {
    let path = temp_log("replay_all");
    record(&path, &[GAME_ONE, GAME_TWO]);

    let engine = ReplayEngine::new(seeded_config(), false);
    let entries = engine.load_log_file(&path).expect("log should load");
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[3].turn, 0, "Second game restarts turn numbering");

    let results = engine.replay_all(&entries).expect("replay should succeed");
    let stats = engine.generate_stats(&results);
    assert_eq!(stats.games, 2);
    assert_eq!(stats.total_turns, 5);
    assert_eq!(stats.mismatches, 0, "Seeded replay must reproduce every move");
    assert_eq!(stats.tiers.values().sum::<usize>(), 5);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_replay_specific_turns() {
    let path = temp_log("replay_turns");
    record(&path, &[GAME_ONE]);

    let engine = ReplayEngine::new(seeded_config(), false);
    let entries = engine.load_log_file(&path).unwrap();

    let results = engine.replay_turns(&entries, &[2]).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].turn, 2);
    assert!(results[0].matches);

    assert!(engine.replay_turns(&entries, &[42]).is_err());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_validate_logged_codes() {
    let path = temp_log("replay_validate");
    record(&path, &[GAME_TWO]);

    let engine = ReplayEngine::new(seeded_config(), false);
    let entries = engine.load_log_file(&path).unwrap();
    let logged = entries[0].chosen_move;

    assert!(engine
        .validate_expected_moves(&entries, &[(0, vec![logged])])
        .is_ok());
    let others: Vec<u8> = (0..4).filter(|c| *c != logged).collect();
    assert!(engine.validate_expected_moves(&entries, &[(0, others)]).is_err());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_missing_log_file_is_an_error() {
    let engine = ReplayEngine::new(Config::default_hardcoded(), false);
    assert!(engine.load_log_file("/nonexistent/snake_agent.jsonl").is_err());
}
