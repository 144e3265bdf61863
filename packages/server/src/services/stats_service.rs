use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::game::{ChatId, GameOutcome};
use crate::models::player::PlayerId;
use crate::models::role::Faction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsUpdate {
    pub played: bool,
    pub won: bool,
    pub was_mafia: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub total_games: u32,
    pub wins: u32,
    pub mafia_games: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: String,
    pub chat_id: ChatId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub winner: Option<Faction>,
    pub outcome: GameOutcome,
}

/// 終了したゲームの結果の保存先
pub trait ResultSink: Send + Sync {
    fn record_game(&self, chat_id: ChatId, started_at: DateTime<Utc>, outcome: &GameOutcome);
    fn update_player_stats(&self, player_id: PlayerId, update: StatsUpdate);
}

#[derive(Default)]
pub struct InMemoryResultSink {
    games: Mutex<Vec<GameRecord>>,
    players: Mutex<HashMap<PlayerId, PlayerStats>>,
}

impl InMemoryResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn games(&self) -> Vec<GameRecord> {
        self.games.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn games_for_chat(&self, chat_id: ChatId) -> Vec<GameRecord> {
        self.games()
            .into_iter()
            .filter(|g| g.chat_id == chat_id)
            .collect()
    }

    pub fn player_stats(&self, player_id: PlayerId) -> Option<PlayerStats> {
        self.players
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&player_id)
            .cloned()
    }
}

impl ResultSink for InMemoryResultSink {
    fn record_game(&self, chat_id: ChatId, started_at: DateTime<Utc>, outcome: &GameOutcome) {
        let record = GameRecord {
            game_id: uuid::Uuid::new_v4().to_string(),
            chat_id,
            started_at,
            ended_at: Utc::now(),
            winner: outcome.winning_faction,
            outcome: outcome.clone(),
        };
        log::info!(
            "Recorded game {} for chat {} (winner: {:?})",
            record.game_id,
            chat_id,
            record.winner
        );
        self.games
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }

    fn update_player_stats(&self, player_id: PlayerId, update: StatsUpdate) {
        let mut players = self.players.lock().unwrap_or_else(|e| e.into_inner());
        let stats = players.entry(player_id).or_default();
        if update.played {
            stats.total_games += 1;
        }
        if update.won {
            stats.wins += 1;
        }
        if update.was_mafia {
            stats.mafia_games += 1;
        }
    }
}
