use axum::http::StatusCode;

use crate::models::game::{ChatId, NightActionKind, Phase};
use crate::models::player::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("this cannot be done during the {0} phase")]
    WrongPhase(Phase),
    #[error("player {0} has already joined")]
    AlreadyJoined(PlayerId),
    #[error("at least {required} players are needed, but only {actual} joined")]
    InsufficientPlayers { required: usize, actual: usize },
    #[error("player {player_id} is not allowed to {action}")]
    UnauthorizedAction {
        player_id: PlayerId,
        action: Action,
    },
    #[error("player {0} is dead and cannot act")]
    ActorDead(PlayerId),
    #[error("player {0} is dead and cannot vote")]
    VoterDead(PlayerId),
    #[error("player {0} is not a valid target")]
    InvalidTarget(PlayerId),
    #[error("the game has already ended")]
    SessionEnded,
    #[error("no game found for chat {0}")]
    GameNotFound(ChatId),
    #[error("a game is already running in chat {0}")]
    GameInProgress(ChatId),
    #[error("debug operations are disabled")]
    DebugDisabled,
    #[error("game state is inconsistent: {0}")]
    StateFault(String),
}

/// UnauthorizedAction で拒否された操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Night(NightActionKind),
    Vote,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Night(kind) => write!(f, "{}", kind),
            Action::Vote => write!(f, "vote"),
        }
    }
}

impl GameError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GameError::GameNotFound(_) => StatusCode::NOT_FOUND,
            GameError::AlreadyJoined(_) | GameError::GameInProgress(_) => StatusCode::CONFLICT,
            GameError::UnauthorizedAction { .. } | GameError::DebugDisabled => {
                StatusCode::FORBIDDEN
            }
            GameError::SessionEnded => StatusCode::GONE,
            GameError::StateFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GameError::WrongPhase(_)
            | GameError::InsufficientPlayers { .. }
            | GameError::ActorDead(_)
            | GameError::VoterDead(_)
            | GameError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
        }
    }
}
