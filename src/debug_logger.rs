// Debug logging module for per-turn game state logging
//
// Each turn's snapshot and the move chosen for it are written as one JSON line.
// The engine is single-threaded, so writes are plain synchronous appends that
// never fail the turn: errors are logged and the entry is dropped.

use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};

use crate::bot::Decision;
use crate::config::Config;
use crate::types::{SessionConfig, TurnSnapshot};

/// Represents a single debug log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnLogEntry {
    pub session: SessionConfig,
    pub turn: u32,
    pub snapshot: TurnSnapshot,
    pub chosen_move: u8,
    pub tier: String,
    pub timestamp: String,
}

/// JSONL writer for turn entries; a no-op when disabled
pub struct DebugLogger {
    writer: Option<BufWriter<File>>,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
        {
            Ok(file) => {
                info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    writer: Some(BufWriter::new(file)),
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.debug.enabled, &config.debug.log_file_path)
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger { writer: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Appends one turn to the log and flushes it
    pub fn log_move(
        &mut self,
        session: &SessionConfig,
        snapshot: &TurnSnapshot,
        chosen_move: u8,
        decision: Option<&Decision>,
    ) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };

        let entry = TurnLogEntry {
            session: session.clone(),
            turn: snapshot.turn,
            snapshot: snapshot.clone(),
            chosen_move,
            tier: decision.map_or("safe_default", |d| d.tier.as_str()).to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        match serde_json::to_string(&entry) {
            Ok(json_line) => {
                let result = writeln!(writer, "{}", json_line).and_then(|_| writer.flush());
                if let Err(e) = result {
                    error!("Failed to write debug log entry: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to serialize debug log entry: {}", e);
            }
        }
    }
}
