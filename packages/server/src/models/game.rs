use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::player::{Player, PlayerId};
use super::role::{Faction, Role};

pub type ChatId = i64;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Phase {
    Lobby, // ゲーム開始前
    Night, // 夜フェーズ
    Day,   // 昼フェーズ（議論と投票）
    Ended, // ゲーム終了
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Lobby => write!(f, "Lobby"),
            Phase::Night => write!(f, "Night"),
            Phase::Day => write!(f, "Day"),
            Phase::Ended => write!(f, "Ended"),
        }
    }
}

/// タイマーが発火したときに、どのフェーズのために予約されたものかを識別する
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseToken {
    pub phase: Phase,
    pub number: u32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NightActionKind {
    Kill,        // マフィアの襲撃
    Protect,     // 医者の護衛
    Investigate, // 探偵の調査
}

impl fmt::Display for NightActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NightActionKind::Kill => write!(f, "kill"),
            NightActionKind::Protect => write!(f, "protect"),
            NightActionKind::Investigate => write!(f, "investigate"),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NightAction {
    pub actor_id: PlayerId,
    pub kind: NightActionKind,
    pub target_id: PlayerId,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vote {
    pub voter_id: PlayerId,
    pub target_id: Option<PlayerId>, // None は棄権
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Investigation {
    pub detective_id: PlayerId,
    pub target_id: PlayerId,
    pub revealed_role: Role,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NightResult {
    pub died: Option<PlayerId>,
    pub investigated: Option<Investigation>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayResult {
    pub eliminated: Option<PlayerId>,
    /// 得票数（得票の多い順、同数は投票先IDの昇順）
    pub tally: Vec<(PlayerId, usize)>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EliminationReason {
    Killed, // 夜に襲撃された
    Voted,  // 昼の投票で処刑された
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Elimination {
    pub player_id: PlayerId,
    pub reason: EliminationReason,
    pub phase_number: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameOutcome {
    /// None は中断（abort）または内部エラーによる終了
    pub winning_faction: Option<Faction>,
    pub final_roles: BTreeMap<PlayerId, Role>,
    pub eliminated_this_game: Vec<Elimination>,
}

impl GameOutcome {
    pub fn is_winner(&self, role: Role) -> bool {
        self.winning_faction == Some(role.faction())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRequest {
    pub player_id: PlayerId,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NightActionRequest {
    pub player_id: PlayerId,
    pub kind: NightActionKind,
    pub target_id: PlayerId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteRequest {
    pub voter_id: PlayerId,
    #[serde(default)]
    pub target_id: Option<PlayerId>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub is_alive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl PlayerView {
    pub fn from_player(player: &Player, reveal_role: bool) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            is_alive: player.is_alive,
            role: if reveal_role { player.role } else { None },
        }
    }
}

/// 外部に公開するゲーム状態のスナップショット
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameView {
    pub chat_id: ChatId,
    pub phase: Phase,
    pub phase_number: u32,
    pub players: Vec<PlayerView>,
    pub started_at: Option<DateTime<Utc>>,
    pub outcome: Option<GameOutcome>,
}
