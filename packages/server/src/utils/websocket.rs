use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::info;

use crate::models::chat::Notification;
use crate::models::game::ChatId;
use crate::models::player::PlayerId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    player_id: Option<PlayerId>,
}

pub async fn handler(
    State(state): State<AppState>,
    Path(chat_id): Path<ChatId>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, chat_id, query.player_id))
}

pub async fn handle_socket(
    ws: WebSocket,
    state: AppState,
    chat_id: ChatId,
    player_id: Option<PlayerId>,
) {
    info!(
        "New WebSocket connection established for chat: {} (player: {:?})",
        chat_id, player_id
    );

    let (mut sender, mut receiver) = ws.split();
    let mut chat_rx = state.notifier.subscribe_chat(chat_id);
    // プレイヤーIDが指定されていなければ、プライベート通知は購読しない
    let mut private_rx = player_id.map(|id| state.notifier.subscribe_player(id));

    let mut send_task = tokio::spawn(async move {
        loop {
            let notification = tokio::select! {
                msg = chat_rx.recv() => msg,
                msg = recv_optional(&mut private_rx) => msg,
            };

            let notification = match notification {
                Ok(n) => n,
                Err(RecvError::Lagged(skipped)) => {
                    info!("Chat {} subscriber lagged, {} notifications skipped", chat_id, skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let Ok(text) = serde_json::to_string(&notification) else {
                continue;
            };
            if let Err(e) = sender.send(Message::Text(text)).await {
                info!("WebSocket for chat {} closed: {}", chat_id, e);
                break;
            }
        }
    });

    // クライアントからのメッセージは使わない。切断を検知するためだけに読む。
    let mut receive_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => receive_task.abort(),
        _ = &mut receive_task => send_task.abort(),
    }
    info!("WebSocket connection for chat {} finished", chat_id);
}

async fn recv_optional(
    rx: &mut Option<broadcast::Receiver<Notification>>,
) -> Result<Notification, RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
