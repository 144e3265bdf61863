use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;

pub type TimerCallback = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// 一度だけ発火するキャンセル可能なタイマー
pub trait TimerService: Send + Sync {
    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
    fn cancel(&self, handle: TimerHandle);
}

/// tokio タスクでタイマーを実装する
#[derive(Default)]
pub struct TokioTimer {
    next_id: AtomicU64,
    tasks: Arc<Mutex<HashMap<TimerHandle, AbortHandle>>>,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl TimerService for TokioTimer {
    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let handle = TimerHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let tasks = self.tasks.clone();

        // 登録前に発火してもエントリが残らないように、ロックを持ったまま spawn する
        let mut guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // 発火したらハンドルを忘れる。コールバック内で自分を cancel しても中断されない。
            tasks
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&handle);
            callback().await;
        });
        guard.insert(handle, task.abort_handle());

        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        let removed = self
            .tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&handle);
        if let Some(task) = removed {
            task.abort();
            log::debug!("Timer {:?} cancelled", handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_callback(counter: Arc<AtomicUsize>) -> TimerCallback {
        Box::new(move || {
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_once() {
        let timer = TokioTimer::new();
        let counter = Arc::new(AtomicUsize::new(0));

        timer.schedule_once(Duration::from_secs(5), counting_callback(counter.clone()));
        assert_eq!(timer.pending(), 1);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(timer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let timer = TokioTimer::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let handle =
            timer.schedule_once(Duration::from_secs(5), counting_callback(counter.clone()));
        timer.cancel(handle);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(timer.pending(), 0);
    }
}
