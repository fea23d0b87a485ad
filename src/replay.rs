// Replay module for analyzing historical game states and debugging decision-making
//
// This module provides functionality to:
// 1. Parse JSONL debug logs
// 2. Re-run the engine over the logged turns of each game, in order
// 3. Compare logged vs replayed moves
// 4. Generate match statistics and reports
//
// Turns are always replayed sequentially from the start of their game because
// the engine carries apple age and rival profiles from one turn to the next.
// A turn number that does not increase marks the start of a new game.

use log::{info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::bot::{Bot, Tier};
use crate::config::Config;
use crate::debug_logger::TurnLogEntry;
use crate::simple_profiler;
use crate::types::Direction;

/// Seed used when the config leaves the engine entropy-seeded, so replays
/// of the same log are repeatable
const REPLAY_SEED: u64 = 0;

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub game: usize,
    pub turn: u32,
    pub original_move: Direction,
    pub replayed_move: Direction,
    pub matches: bool,
    pub original_tier: String,
    pub replayed_tier: Tier,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub games: usize,
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
    /// Replayed decisions per cascade tier
    pub tiers: BTreeMap<&'static str, usize>,
}

/// Replay engine for analyzing debug logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(mut config: Config, verbose: bool) -> Self {
        config.engine.rng_seed.get_or_insert(REPLAY_SEED);
        ReplayEngine { config, verbose }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<TurnLogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: TurnLogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Replays every entry, starting a fresh engine at each game boundary
    pub fn replay_all(&self, entries: &[TurnLogEntry]) -> Result<Vec<ReplayResult>, String> {
        simple_profiler::reset();
        let mut results = Vec::with_capacity(entries.len());
        let mut bot: Option<Bot> = None;
        let mut game = 0;
        let mut last_turn: Option<u32> = None;

        for entry in entries {
            let new_game = match (&bot, last_turn) {
                (Some(b), Some(prev)) => entry.turn <= prev || *b.session() != entry.session,
                _ => true,
            };
            if new_game {
                if bot.is_some() {
                    game += 1;
                }
                if self.verbose {
                    info!("Game {} starts at turn {}", game, entry.turn);
                }
                bot = Some(Bot::new(self.config.clone(), entry.session.clone()));
            }
            last_turn = Some(entry.turn);

            let Some(engine) = bot.as_mut() else {
                continue;
            };
            let original_move = self.decode_move(entry.chosen_move)?;

            let start = Instant::now();
            let decision = engine.decide(&entry.snapshot);
            let computation_time_ms = start.elapsed().as_millis();

            let result = ReplayResult {
                game,
                turn: entry.turn,
                original_move,
                replayed_move: decision.direction,
                matches: original_move == decision.direction,
                original_tier: entry.tier.clone(),
                replayed_tier: decision.tier,
                computation_time_ms,
            };
            self.report_turn(&result);
            results.push(result);
        }

        Ok(results)
    }

    /// Replays the log and keeps only the requested turns.
    /// Earlier turns are still replayed so the engine state is reproduced.
    pub fn replay_turns(
        &self,
        entries: &[TurnLogEntry],
        turn_numbers: &[u32],
    ) -> Result<Vec<ReplayResult>, String> {
        for turn in turn_numbers {
            if !entries.iter().any(|e| e.turn == *turn) {
                return Err(format!("Turn {} not found in log file", turn));
            }
        }

        Ok(self
            .replay_all(entries)?
            .into_iter()
            .filter(|r| turn_numbers.contains(&r.turn))
            .collect())
    }

    fn report_turn(&self, result: &ReplayResult) {
        if !self.verbose {
            return;
        }
        if result.matches {
            info!(
                "Turn {}: MATCH - {} via {} (time: {}ms)",
                result.turn,
                result.replayed_move.as_str(),
                result.replayed_tier.as_str(),
                result.computation_time_ms
            );
        } else {
            warn!(
                "Turn {}: MISMATCH - Original: {} ({}), Replayed: {} ({}) (time: {}ms)",
                result.turn,
                result.original_move.as_str(),
                result.original_tier,
                result.replayed_move.as_str(),
                result.replayed_tier.as_str(),
                result.computation_time_ms
            );
        }
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        let mut tiers = BTreeMap::new();
        for r in results {
            *tiers.entry(r.replayed_tier.as_str()).or_insert(0) += 1;
        }
        let games = results.iter().map(|r| r.game + 1).max().unwrap_or(0);

        ReplayStats {
            games,
            total_turns,
            matches,
            mismatches,
            match_rate,
            tiers,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Games:          {}", stats.games);
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results
                .iter()
                .map(|r| r.computation_time_ms as f64)
                .sum::<f64>()
                / results.len() as f64;
            println!("Average Computation Time:   {:.1}ms", avg_time);
            println!("Decisions by tier:");
            for (tier, count) in &stats.tiers {
                println!("  {:<18} {}", tier, count);
            }
            println!();
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Game {} Turn {}: {} ({}) → {} ({})",
                    result.game,
                    result.turn,
                    result.original_move.as_str(),
                    result.original_tier,
                    result.replayed_move.as_str(),
                    result.replayed_tier.as_str()
                );
            }
            println!();
        }
    }

    /// Validates that specific logged moves fall in an acceptable set of codes
    pub fn validate_expected_moves(
        &self,
        entries: &[TurnLogEntry],
        expected_moves: &[(u32, Vec<u8>)], // (turn, acceptable codes)
    ) -> Result<(), String> {
        for (turn, acceptable) in expected_moves {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn)
                .ok_or_else(|| format!("Turn {} not found in log", turn))?;

            if !acceptable.contains(&entry.chosen_move) {
                return Err(format!(
                    "Turn {}: Expected one of {:?}, but got {}",
                    turn, acceptable, entry.chosen_move
                ));
            }
        }

        Ok(())
    }

    fn decode_move(&self, code: u8) -> Result<Direction, String> {
        self.config
            .direction_encoding
            .decode(code)
            .ok_or_else(|| format!("Move code {} is not an absolute direction", code))
    }

    /// Parses a move code as written on the wire. Only 0-3 are valid.
    pub fn parse_move_code(s: &str) -> Result<u8, String> {
        match s.trim().parse::<u8>() {
            Ok(code @ 0..=3) => Ok(code),
            Ok(code) => Err(format!("Move code {} is not an absolute direction", code)),
            Err(e) => Err(format!("Invalid move code '{}': {}", s, e)),
        }
    }
}
