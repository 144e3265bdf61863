use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

use crate::error::GameError;
use crate::game::{GameSession, SessionContext, SessionHandle};
use crate::models::config::GameConfig;
use crate::models::game::ChatId;
use crate::services::notifier::{BroadcastNotifier, Notifier};
use crate::services::stats_service::{InMemoryResultSink, ResultSink};
use crate::services::timer::{TimerService, TokioTimer};

/// チャットIDからゲームセッションへの対応表。チャットをまたいで共有される唯一の状態。
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<ChatId, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新しいロビーを作る。進行中のゲームがあれば失敗する。
    pub async fn create(
        &self,
        chat_id: ChatId,
        ctx: SessionContext,
    ) -> Result<SessionHandle, GameError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(existing) = sessions.get(&chat_id) {
            if !existing.lock().await.is_ended() {
                return Err(GameError::GameInProgress(chat_id));
            }
        }

        let session = GameSession::open(chat_id, ctx);
        sessions.insert(chat_id, session.clone());
        log::info!("Created game session for chat {}", chat_id);
        Ok(session)
    }

    pub async fn get(&self, chat_id: ChatId) -> Result<SessionHandle, GameError> {
        self.sessions
            .lock()
            .await
            .get(&chat_id)
            .cloned()
            .ok_or(GameError::GameNotFound(chat_id))
    }

    /// 終了したセッションを取り除く。登録されているのが同じセッションの場合だけ削除する。
    pub async fn release(&self, chat_id: ChatId, session: &SessionHandle) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&chat_id) {
            Some(current) if Arc::ptr_eq(current, session) => {
                sessions.remove(&chat_id);
                log::info!("Released game session for chat {}", chat_id);
                true
            }
            _ => false,
        }
    }

    pub async fn contains(&self, chat_id: ChatId) -> bool {
        self.sessions.lock().await.contains_key(&chat_id)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub games: SessionRegistry,
    pub notifier: Arc<BroadcastNotifier>,
    pub results: Arc<InMemoryResultSink>,
    pub timer: Arc<dyn TimerService>,
    pub config: Arc<GameConfig>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_timer(GameConfig::from_env(), Arc::new(TokioTimer::new()))
    }

    pub fn with_timer(config: GameConfig, timer: Arc<dyn TimerService>) -> Self {
        AppState {
            games: SessionRegistry::new(),
            notifier: Arc::new(BroadcastNotifier::default()),
            results: Arc::new(InMemoryResultSink::new()),
            timer,
            config: Arc::new(config),
        }
    }

    pub fn session_context(&self) -> SessionContext {
        SessionContext {
            notifier: self.notifier.clone() as Arc<dyn Notifier>,
            timer: self.timer.clone(),
            results: self.results.clone() as Arc<dyn ResultSink>,
            config: self.config.clone(),
            registry: self.games.clone(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
