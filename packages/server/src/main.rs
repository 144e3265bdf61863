use axum::http::{self, HeaderValue, Method};
use dotenvy::dotenv;
use env_logger::Builder;
use log::LevelFilter;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use mafia_server::{app, state::AppState, utils::config::CONFIG};

// ログ設定
fn init_logger() {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .filter_module("mafia_server", LevelFilter::Debug)
        .filter_module("tower_http", LevelFilter::Debug)
        .format_timestamp(Some(env_logger::TimestampPrecision::Millis))
        .format_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 環境変数をロード
    if let Err(e) = dotenv() {
        eprintln!("Warning: failed to load .env file: {}", e);
    }

    init_logger();

    let state = AppState::new();
    log::info!(
        "Phase durations: night {:?}, day {:?} (debug: {})",
        state.config.night_duration,
        state.config.day_duration,
        state.config.debug_enabled
    );

    // CORSレイヤーの設定
    let origins = [CONFIG.allowed_origin.parse::<HeaderValue>()?];
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION]);

    // ルーティングの設定
    let app = app::create_app_with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http() // HTTPトレースログを有効化
                .make_span_with(|request: &http::Request<_>| {
                    tracing::info_span!(
                        "HTTP request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }),
        );

    // サーバーの起動
    let listener = tokio::net::TcpListener::bind(&CONFIG.server_addr).await?;
    log::info!("Server started: http://{}", CONFIG.server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
