use crate::error::GameError;
use crate::models::game::Phase;
use crate::models::player::{Player, PlayerId};

/// 参加プレイヤーの一覧。参加順を保持し、削除はしない（退場は is_alive で表す）。
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(
        &mut self,
        phase: Phase,
        player_id: PlayerId,
        name: String,
    ) -> Result<usize, GameError> {
        if phase != Phase::Lobby {
            return Err(GameError::WrongPhase(phase));
        }
        if self.contains(player_id) {
            return Err(GameError::AlreadyJoined(player_id));
        }
        self.players.push(Player::new(player_id, name));
        Ok(self.players.len())
    }

    pub fn size(&self) -> usize {
        self.players.len()
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn get_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn is_alive(&self, player_id: PlayerId) -> bool {
        self.get(player_id).map_or(false, |p| p.is_alive)
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    pub fn name_of(&self, player_id: PlayerId) -> String {
        self.get(player_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("Player {}", player_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_keeps_join_order() {
        let mut roster = Roster::new();
        roster.join(Phase::Lobby, 30, "Carol".to_string()).unwrap();
        roster.join(Phase::Lobby, 10, "Alice".to_string()).unwrap();
        assert_eq!(roster.join(Phase::Lobby, 20, "Bob".to_string()), Ok(3));

        assert_eq!(roster.ids(), vec![30, 10, 20]);
        assert_eq!(roster.size(), 3);
    }

    #[test]
    fn test_duplicate_join_rejected() {
        let mut roster = Roster::new();
        roster.join(Phase::Lobby, 1, "Alice".to_string()).unwrap();
        assert_eq!(
            roster.join(Phase::Lobby, 1, "Alice again".to_string()),
            Err(GameError::AlreadyJoined(1))
        );
        assert_eq!(roster.size(), 1);
    }

    #[test]
    fn test_join_outside_lobby_rejected() {
        let mut roster = Roster::new();
        assert_eq!(
            roster.join(Phase::Night, 1, "Alice".to_string()),
            Err(GameError::WrongPhase(Phase::Night))
        );
        assert_eq!(roster.size(), 0);
    }
}
