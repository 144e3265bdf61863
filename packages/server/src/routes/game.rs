use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::state::AppState;
use crate::{
    models::game::{ChatId, JoinRequest, NightActionRequest, VoteRequest},
    services::game_service,
    utils::websocket,
};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .nest(
            "/:chatid",
            Router::new()
                // ゲームの基本操作
                // curl -X POST http://localhost:8080/api/game/{chatid}/new
                .route("/new", post(new_game))
                .route("/join", post(join_game))
                .route("/start", post(start_game))
                .route("/abort", post(abort_game))
                .route("/state", get(get_game_state))
                .route("/players", get(list_players))
                // ゲームアクション
                .nest(
                    "/actions",
                    Router::new()
                        .route("/vote", post(cast_vote_handler))
                        .route("/night-action", post(night_action_handler)),
                )
                // デバッグ用のフェーズ進行
                .route("/phase/next", post(advance_phase_handler))
                // 通知の購読
                // websocat ws://localhost:8080/api/game/{chatid}/ws?player_id=1
                .route("/ws", get(websocket::handler)),
        )
        .with_state(state)
}

pub async fn new_game(
    State(state): State<AppState>,
    Path(chat_id): Path<ChatId>,
) -> impl IntoResponse {
    match game_service::new_game(state, chat_id).await {
        Ok(message) => (StatusCode::OK, Json(message)),
        Err(e) => (e.status_code(), Json(e.to_string())),
    }
}

pub async fn join_game(
    State(state): State<AppState>,
    Path(chat_id): Path<ChatId>,
    Json(request): Json<JoinRequest>,
) -> impl IntoResponse {
    match game_service::join_game(state, chat_id, request).await {
        Ok(message) => (StatusCode::OK, Json(message)),
        Err(e) => (e.status_code(), Json(e.to_string())),
    }
}

pub async fn start_game(
    State(state): State<AppState>,
    Path(chat_id): Path<ChatId>,
) -> impl IntoResponse {
    match game_service::start_game(state, chat_id).await {
        Ok(message) => (StatusCode::OK, Json(message)),
        Err(e) => (e.status_code(), Json(e.to_string())),
    }
}

async fn abort_game(
    State(state): State<AppState>,
    Path(chat_id): Path<ChatId>,
) -> impl IntoResponse {
    match game_service::abort_game(state, chat_id).await {
        Ok(message) => (StatusCode::OK, Json(message)),
        Err(e) => (e.status_code(), Json(e.to_string())),
    }
}

pub async fn get_game_state(
    Path(chat_id): Path<ChatId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match game_service::get_game_state(state, chat_id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => (e.status_code(), Json(e.to_string())).into_response(),
    }
}

async fn list_players(
    Path(chat_id): Path<ChatId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match game_service::list_players(state, chat_id).await {
        Ok(players) => (StatusCode::OK, Json(players)).into_response(),
        Err(e) => (e.status_code(), Json(e.to_string())).into_response(),
    }
}

async fn night_action_handler(
    State(state): State<AppState>,
    Path(chat_id): Path<ChatId>,
    Json(action_req): Json<NightActionRequest>,
) -> impl IntoResponse {
    match game_service::submit_night_action(state, chat_id, action_req).await {
        Ok(message) => (StatusCode::OK, Json(message)),
        Err(e) => (e.status_code(), Json(e.to_string())),
    }
}

async fn cast_vote_handler(
    State(state): State<AppState>,
    Path(chat_id): Path<ChatId>,
    Json(vote_req): Json<VoteRequest>,
) -> impl IntoResponse {
    match game_service::submit_vote(state, chat_id, vote_req).await {
        Ok(message) => (StatusCode::OK, Json(message)),
        Err(e) => (e.status_code(), Json(e.to_string())),
    }
}

async fn advance_phase_handler(
    State(state): State<AppState>,
    Path(chat_id): Path<ChatId>,
) -> impl IntoResponse {
    match game_service::advance_game_phase(state, chat_id).await {
        Ok(phase) => (StatusCode::OK, Json(format!("Phase advanced to {}", phase))),
        Err(e) => (e.status_code(), Json(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::GameConfig;
    use crate::utils::test_setup::{setup_test_env, ManualTimer};
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::with_timer(GameConfig::default(), Arc::new(ManualTimer::new()))
    }

    fn post(uri: String, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder().method("POST").uri(uri);
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_new_game() {
        setup_test_env();
        let state = test_state();
        let app = routes(state.clone());

        let response = app.oneshot(post("/-100/new".to_string(), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.games.contains(-100).await);
    }

    #[tokio::test]
    async fn test_second_new_game_conflicts() {
        setup_test_env();
        let state = test_state();
        let app = routes(state.clone());

        game_service::new_game(state.clone(), 5).await.unwrap();
        let response = app.oneshot(post("/5/new".to_string(), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_join_and_list_players() {
        setup_test_env();
        let state = test_state();
        let app = routes(state.clone());
        game_service::new_game(state.clone(), 1).await.unwrap();

        let response = app
            .clone()
            .oneshot(post(
                "/1/join".to_string(),
                Some(serde_json::json!({ "player_id": 11, "name": "Alice" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .method("GET")
            .uri("/1/players")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let players: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0]["name"], "Alice");
    }

    #[tokio::test]
    async fn test_start_without_game_is_not_found() {
        setup_test_env();
        let app = routes(test_state());

        let response = app.oneshot(post("/404/start".to_string(), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
