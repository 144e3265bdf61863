use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::game::ChatId;
use super::player::PlayerId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub message_id: String,
    pub chat_id: Option<ChatId>,
    pub player_id: Option<PlayerId>, // プライベート通知の宛先
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub message_type: NotificationType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationType {
    Public,  // チャット全体への通知
    Private, // 役職や調査結果など本人だけへの通知
}

impl Notification {
    pub fn public(chat_id: ChatId, content: String) -> Self {
        Notification {
            message_id: uuid::Uuid::new_v4().to_string(),
            chat_id: Some(chat_id),
            player_id: None,
            content,
            timestamp: Utc::now(),
            message_type: NotificationType::Public,
        }
    }

    pub fn private(player_id: PlayerId, content: String) -> Self {
        Notification {
            message_id: uuid::Uuid::new_v4().to_string(),
            chat_id: None,
            player_id: Some(player_id),
            content,
            timestamp: Utc::now(),
            message_type: NotificationType::Private,
        }
    }
}
