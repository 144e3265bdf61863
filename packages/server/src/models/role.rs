use serde::{Deserialize, Serialize};
use std::fmt;

use super::game::NightActionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Mafia,     // マフィア
    Doctor,    // 医者
    Detective, // 探偵
    Citizen,   // 市民
}

/// 勝敗判定に使う陣営
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Mafia,
    Citizens,
}

impl Role {
    pub fn faction(&self) -> Faction {
        match self {
            Role::Mafia => Faction::Mafia,
            Role::Doctor | Role::Detective | Role::Citizen => Faction::Citizens,
        }
    }

    /// 夜に実行できるアクション。市民は何もできない。
    pub fn night_action(&self) -> Option<NightActionKind> {
        match self {
            Role::Mafia => Some(NightActionKind::Kill),
            Role::Doctor => Some(NightActionKind::Protect),
            Role::Detective => Some(NightActionKind::Investigate),
            Role::Citizen => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Mafia => write!(f, "Mafia"),
            Role::Doctor => write!(f, "Doctor"),
            Role::Detective => write!(f, "Detective"),
            Role::Citizen => write!(f, "Citizen"),
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Faction::Mafia => write!(f, "Mafia"),
            Faction::Citizens => write!(f, "Citizens"),
        }
    }
}
