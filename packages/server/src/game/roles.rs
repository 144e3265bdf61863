use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

use crate::error::GameError;
use crate::models::player::PlayerId;
use crate::models::role::Role;

/// ゲーム開始に必要な最少人数
pub const MIN_PLAYERS: usize = 5;

/// 人数から役職の構成を決める。
///
/// 6人以上: マフィア2、医者1、探偵1、残りは市民。
/// 6人未満: マフィア1、医者1、探偵1、残りは市民（3人未満は成立しない）。
pub fn role_multiset(player_count: usize) -> Result<Vec<Role>, GameError> {
    let specials: &[Role] = if player_count >= 6 {
        &[Role::Mafia, Role::Mafia, Role::Doctor, Role::Detective]
    } else {
        &[Role::Mafia, Role::Doctor, Role::Detective]
    };

    if player_count < specials.len() {
        return Err(GameError::InsufficientPlayers {
            required: specials.len(),
            actual: player_count,
        });
    }

    let mut roles = specials.to_vec();
    roles.resize(player_count, Role::Citizen);
    Ok(roles)
}

/// 役職をシャッフルし、参加順のプレイヤーに順番に割り当てる。
pub fn assign_roles<R: Rng + ?Sized>(
    player_ids: &[PlayerId],
    rng: &mut R,
) -> Result<HashMap<PlayerId, Role>, GameError> {
    let mut roles = role_multiset(player_ids.len())?;
    roles.shuffle(rng);

    Ok(player_ids.iter().copied().zip(roles).collect())
}
