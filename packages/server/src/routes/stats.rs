use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::models::game::ChatId;
use crate::models::player::PlayerId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GamesQuery {
    chat_id: Option<ChatId>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        // curl http://localhost:8080/api/stats/players/{playerid}
        .route("/players/:playerid", get(get_player_stats))
        // curl http://localhost:8080/api/stats/games?chat_id={chatid}
        .route("/games", get(get_games))
        .with_state(state)
}

async fn get_player_stats(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> impl IntoResponse {
    match state.results.player_stats(player_id) {
        Some(stats) => (StatusCode::OK, Json(stats)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(format!("No statistics for player {}", player_id)),
        )
            .into_response(),
    }
}

async fn get_games(
    State(state): State<AppState>,
    Query(query): Query<GamesQuery>,
) -> impl IntoResponse {
    let games = match query.chat_id {
        Some(chat_id) => state.results.games_for_chat(chat_id),
        None => state.results.games(),
    };
    (StatusCode::OK, Json(games))
}
