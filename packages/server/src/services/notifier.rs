use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::models::chat::Notification;
use crate::models::game::ChatId;
use crate::models::player::PlayerId;

/// メッセージ送信の窓口。送信の成否はゲーム進行に影響しない。
pub trait Notifier: Send + Sync {
    fn notify(&self, chat_id: ChatId, text: String);
    fn notify_private(&self, player_id: PlayerId, text: String);
}

/// チャットごと・プレイヤーごとの broadcast チャネルに通知を流す
pub struct BroadcastNotifier {
    chats: Mutex<HashMap<ChatId, broadcast::Sender<Notification>>>,
    players: Mutex<HashMap<PlayerId, broadcast::Sender<Notification>>>,
    capacity: usize,
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        Self {
            chats: Mutex::new(HashMap::new()),
            players: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    pub fn subscribe_chat(&self, chat_id: ChatId) -> broadcast::Receiver<Notification> {
        Self::channel(&self.chats, chat_id, self.capacity).subscribe()
    }

    pub fn subscribe_player(&self, player_id: PlayerId) -> broadcast::Receiver<Notification> {
        Self::channel(&self.players, player_id, self.capacity).subscribe()
    }

    fn channel<K: Hash + Eq + Copy>(
        map: &Mutex<HashMap<K, broadcast::Sender<Notification>>>,
        key: K,
        capacity: usize,
    ) -> broadcast::Sender<Notification> {
        let mut channels = map.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(key)
            .or_insert_with(|| broadcast::channel(capacity).0)
            .clone()
    }

    /// 購読者がいるチャネルにだけ送る。購読者がいなくなったチャネルはここで捨てる。
    fn send<K: Hash + Eq + Copy>(
        map: &Mutex<HashMap<K, broadcast::Sender<Notification>>>,
        key: K,
        notification: Notification,
    ) -> bool {
        let mut channels = map.lock().unwrap_or_else(|e| e.into_inner());
        match channels.get(&key).map(|tx| tx.receiver_count()) {
            None => false,
            Some(0) => {
                channels.remove(&key);
                false
            }
            Some(_) => channels[&key].send(notification).is_ok(),
        }
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, chat_id: ChatId, text: String) {
        if !Self::send(&self.chats, chat_id, Notification::public(chat_id, text)) {
            log::debug!("No subscribers for chat {}, notification dropped", chat_id);
        }
    }

    fn notify_private(&self, player_id: PlayerId, text: String) {
        if !Self::send(&self.players, player_id, Notification::private(player_id, text)) {
            log::debug!(
                "No subscribers for player {}, private notification dropped",
                player_id
            );
        }
    }
}
