use serde::{Deserialize, Serialize};

use super::role::Role;

pub type PlayerId = u64;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Option<Role>, // 開始時に一度だけ割り当てられる
    pub is_alive: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            role: None,
            is_alive: true,
        }
    }

    pub fn is_mafia(&self) -> bool {
        self.role == Some(Role::Mafia)
    }
}
