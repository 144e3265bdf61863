use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub debug_enabled: bool,
    // プレイヤーの役職を状態APIで表示するかどうか
    pub show_player_roles: bool,
    pub night_duration: Duration,
    pub day_duration: Duration,
    // 役職シャッフルのシード（指定すると再現可能になる）
    pub role_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let debug_mode = debug_from_env();

        Self {
            debug_enabled: debug_mode,
            show_player_roles: debug_mode,
            night_duration: Duration::from_secs(120),
            day_duration: Duration::from_secs(180),
            role_seed: None,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        let debug_enabled = debug_from_env();
        let show_player_roles = env::var("MAFIA_SHOW_PLAYER_ROLES")
            .map(|v| v == "true")
            .unwrap_or(debug_enabled);
        let night_seconds = env::var("MAFIA_NIGHT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(120);
        let day_seconds = env::var("MAFIA_DAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(180);
        let role_seed = env::var("MAFIA_ROLE_SEED")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());

        Self {
            debug_enabled,
            show_player_roles,
            night_duration: Duration::from_secs(night_seconds),
            day_duration: Duration::from_secs(day_seconds),
            role_seed,
        }
    }
}

// 未設定ならデバッグビルドかどうかで決める
fn debug_from_env() -> bool {
    env::var("MAFIA_DEBUG_ENABLED")
        .map(|v| v == "true")
        .unwrap_or_else(|_| cfg!(debug_assertions))
}
