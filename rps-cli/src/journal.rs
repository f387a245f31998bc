//! Confirmed events and unresolved operations persisted between runs.
//!
//! The journal only ever holds ledger-confirmed events, so replaying it
//! reproduces the same records a live session ended with.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rps_core::TxHash;
use rps_game::{Game, GameClient, GameEvent, GameId, GameTracker, Intent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedEntry {
    pub tx_hash: TxHash,
    pub intent: Intent,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JournalFile {
    games: BTreeMap<GameId, Vec<GameEvent>>,
    unresolved: Vec<UnresolvedEntry>,
}

pub struct Journal {
    path: PathBuf,
    file: JournalFile,
}

impl Journal {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read journal {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Journal {} is corrupt", path.display()))?
        } else {
            JournalFile::default()
        };
        Ok(Self { path, file })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.file)?;
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, content)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }

    pub fn game_ids(&self) -> Vec<GameId> {
        self.file.games.keys().copied().collect()
    }

    pub fn unresolved(&self) -> &[UnresolvedEntry] {
        &self.file.unresolved
    }

    pub fn record_game(&mut self, game_id: GameId, events: Vec<GameEvent>) {
        self.file.games.insert(game_id, events);
    }

    /// Replay every journaled game into a fresh tracker. Games whose events no
    /// longer replay are skipped.
    pub fn tracker(&self) -> GameTracker {
        let mut tracker = GameTracker::new();
        for (id, events) in &self.file.games {
            if let Err(e) = tracker.replay(*id, events.clone()) {
                tracing::warn!("Skipping journaled game {}: {}", id, e);
            }
        }
        tracker
    }

    pub fn games(&self) -> Vec<Game> {
        let tracker = self.tracker();
        tracker
            .ids()
            .into_iter()
            .filter_map(|id| tracker.snapshot(id))
            .collect()
    }

    /// Hand journaled games and unresolved operations to a live client.
    pub fn restore_into(&self, client: &GameClient) {
        for (id, events) in &self.file.games {
            if let Err(e) = client.restore(*id, events.clone()) {
                tracing::warn!("Skipping journaled game {}: {}", id, e);
            }
        }
        for entry in &self.file.unresolved {
            client.track_unresolved(entry.tx_hash, entry.intent.clone());
        }
        tracing::debug!(
            "Restored {} games and {} unresolved operations",
            self.file.games.len(),
            self.file.unresolved.len()
        );
    }

    /// Take over the client's current records.
    pub fn capture(&mut self, client: &GameClient) {
        for game in client.games() {
            self.file.games.insert(game.id(), client.history(game.id()));
        }

        let previous = std::mem::take(&mut self.file.unresolved);
        let now = Utc::now();
        self.file.unresolved = client
            .unresolved()
            .into_iter()
            .map(|(tx_hash, intent)| {
                let recorded_at = previous
                    .iter()
                    .find(|entry| entry.tx_hash == tx_hash)
                    .map_or(now, |entry| entry.recorded_at);
                UnresolvedEntry {
                    tx_hash,
                    intent,
                    recorded_at,
                }
            })
            .collect();
        self.file.unresolved.sort_by_key(|entry| entry.recorded_at);
    }
}
