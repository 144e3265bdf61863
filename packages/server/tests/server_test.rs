use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use mafia_server::{
    app,
    models::{config::GameConfig, game::GameView, role::Role},
    state::AppState,
    utils::test_setup::{setup_test_env, ManualTimer},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn debug_app() -> Router {
    setup_test_env();
    let config = GameConfig {
        debug_enabled: true,
        show_player_roles: true,
        ..GameConfig::default()
    };
    app::create_app_with_state(AppState::with_timer(config, Arc::new(ManualTimer::new())))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_full_game_over_http() {
    let app = debug_app();

    let (status, _) = send(&app, "POST", "/api/game/77/new", None).await;
    assert_eq!(status, StatusCode::OK);

    for id in 1..=5 {
        let (status, _) = send(
            &app,
            "POST",
            "/api/game/77/join",
            Some(json!({ "player_id": id, "name": format!("Player{}", id) })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = send(&app, "POST", "/api/game/77/start", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/game/77/state", None).await;
    assert_eq!(status, StatusCode::OK);
    let view: GameView = serde_json::from_value(body).unwrap();
    let id_of = |role: Role| {
        view.players
            .iter()
            .find(|p| p.role == Some(role))
            .map(|p| p.id)
            .unwrap()
    };
    let mafia = id_of(Role::Mafia);
    let doctor = id_of(Role::Doctor);

    let (status, _) = send(
        &app,
        "POST",
        "/api/game/77/actions/night-action",
        Some(json!({ "player_id": mafia, "kind": "kill", "target_id": doctor })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 医者は襲撃できない
    let (status, _) = send(
        &app,
        "POST",
        "/api/game/77/actions/night-action",
        Some(json!({ "player_id": doctor, "kind": "kill", "target_id": mafia })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "POST", "/api/game/77/phase/next", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Phase advanced to Day"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/game/77/actions/vote",
        Some(json!({ "voter_id": doctor, "target_id": mafia })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for voter in view.players.iter().map(|p| p.id).filter(|id| *id != mafia && *id != doctor) {
        let (status, _) = send(
            &app,
            "POST",
            "/api/game/77/actions/vote",
            Some(json!({ "voter_id": voter, "target_id": mafia })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, "POST", "/api/game/77/phase/next", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Phase advanced to Ended"));

    // 終了したゲームは登録から外れる
    let (status, _) = send(&app, "GET", "/api/game/77/state", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", &format!("/api/stats/players/{}", mafia), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_games"], 1);
    assert_eq!(body["wins"], 0);
    assert_eq!(body["mafia_games"], 1);

    let (status, body) = send(&app, "GET", "/api/stats/games?chat_id=77", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["winner"], "Citizens");
}

#[tokio::test]
async fn test_start_with_too_few_players() {
    let app = debug_app();
    send(&app, "POST", "/api/game/8/new", None).await;
    send(
        &app,
        "POST",
        "/api/game/8/join",
        Some(json!({ "player_id": 1, "name": "Alone" })),
    )
    .await;

    let (status, body) = send(&app, "POST", "/api/game/8/start", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.as_str().unwrap().contains("at least 5 players"));
}

#[tokio::test]
async fn test_duplicate_join_conflicts() {
    let app = debug_app();
    send(&app, "POST", "/api/game/9/new", None).await;
    let join = json!({ "player_id": 1, "name": "Alice" });

    let (status, _) = send(&app, "POST", "/api/game/9/join", Some(join.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/api/game/9/join", Some(join)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_abort_releases_game() {
    let app = debug_app();
    send(&app, "POST", "/api/game/10/new", None).await;

    let (status, _) = send(&app, "POST", "/api/game/10/abort", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/api/game/10/abort", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "POST", "/api/game/10/new", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_phase_next_requires_debug() {
    setup_test_env();
    let config = GameConfig {
        debug_enabled: false,
        ..GameConfig::default()
    };
    let app = app::create_app_with_state(AppState::with_timer(
        config,
        Arc::new(ManualTimer::new()),
    ));
    send(&app, "POST", "/api/game/11/new", None).await;

    let (status, _) = send(&app, "POST", "/api/game/11/phase/next", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
