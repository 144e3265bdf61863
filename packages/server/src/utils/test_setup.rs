use dotenvy::dotenv;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use crate::game::SessionContext;
use crate::models::config::GameConfig;
use crate::models::game::ChatId;
use crate::models::player::PlayerId;
use crate::services::notifier::Notifier;
use crate::services::stats_service::InMemoryResultSink;
use crate::services::timer::{TimerCallback, TimerHandle, TimerService};
use crate::state::SessionRegistry;

static INIT: Once = Once::new();

pub fn setup_test_env() {
    INIT.call_once(|| {
        dotenv().ok();
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// 手動で発火させるタイマー。テストでフェーズ終了のタイミングを制御する。
#[derive(Default)]
pub struct ManualTimer {
    next_id: AtomicU64,
    pending: Mutex<Vec<(TimerHandle, Duration, TimerCallback)>>,
    cancelled: Mutex<Vec<TimerHandle>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn pending_delays(&self) -> Vec<Duration> {
        self.pending.lock().unwrap().iter().map(|(_, d, _)| *d).collect()
    }

    pub fn cancelled(&self) -> Vec<TimerHandle> {
        self.cancelled.lock().unwrap().clone()
    }

    /// 最も古い予約を発火させる。予約がなければ false。
    pub async fn fire_next(&self) -> bool {
        let next = {
            let mut pending = self.pending.lock().unwrap();
            if pending.is_empty() {
                None
            } else {
                Some(pending.remove(0))
            }
        };
        match next {
            Some((_, _, callback)) => {
                callback().await;
                true
            }
            None => false,
        }
    }
}

impl TimerService for ManualTimer {
    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let handle = TimerHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.pending.lock().unwrap().push((handle, delay, callback));
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        let mut pending = self.pending.lock().unwrap();
        if let Some(index) = pending.iter().position(|(h, _, _)| *h == handle) {
            drop(pending.remove(index));
            self.cancelled.lock().unwrap().push(handle);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Public(ChatId, String),
    Private(PlayerId, String),
}

/// 送信された通知を記録するだけの Notifier
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn private_to(&self, player_id: PlayerId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Private(id, text) if id == player_id => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn public_in(&self, chat_id: ChatId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Public(id, text) if id == chat_id => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, chat_id: ChatId, text: String) {
        self.sent.lock().unwrap().push(Sent::Public(chat_id, text));
    }

    fn notify_private(&self, player_id: PlayerId, text: String) {
        self.sent.lock().unwrap().push(Sent::Private(player_id, text));
    }
}

/// テスト用の協調者一式
pub struct TestHarness {
    pub timer: Arc<ManualTimer>,
    pub notifier: Arc<RecordingNotifier>,
    pub results: Arc<InMemoryResultSink>,
    pub registry: SessionRegistry,
    pub config: Arc<GameConfig>,
}

impl TestHarness {
    pub fn new() -> Self {
        setup_test_env();
        let config = GameConfig {
            role_seed: Some(7),
            ..GameConfig::default()
        };
        Self {
            timer: Arc::new(ManualTimer::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            results: Arc::new(InMemoryResultSink::new()),
            registry: SessionRegistry::new(),
            config: Arc::new(config),
        }
    }

    pub fn context(&self) -> SessionContext {
        SessionContext {
            notifier: self.notifier.clone(),
            timer: self.timer.clone(),
            results: self.results.clone(),
            config: self.config.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
