use crate::models::player::Player;
use crate::models::role::Faction;

/// 生存者の役職から勝敗を判定する。まだ決着していなければ None。
///
/// マフィアが全滅していれば市民の勝ち、マフィアの生存数が市民陣営以上ならマフィアの勝ち。
pub fn evaluate<'a, I>(players: I) -> Option<Faction>
where
    I: IntoIterator<Item = &'a Player>,
{
    let (mut mafia_alive, mut town_alive) = (0usize, 0usize);
    for player in players.into_iter().filter(|p| p.is_alive) {
        if player.is_mafia() {
            mafia_alive += 1;
        } else if player.role.is_some() {
            town_alive += 1;
        }
    }

    if mafia_alive == 0 {
        Some(Faction::Citizens)
    } else if mafia_alive >= town_alive {
        Some(Faction::Mafia)
    } else {
        None
    }
}
