//! 考试倒计时
//!
//! 按固定间隔更新剩余时间，归零时执行一次回调。取消或 drop 之后回调不会再执行。

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::debug;

/// 最小的刷新间隔
const MIN_TICK: Duration = Duration::from_millis(1);

/// 倒计时
#[derive(Debug)]
pub struct Countdown {
    remaining: watch::Receiver<Duration>,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// 启动倒计时，必须在 tokio 运行时中调用
    pub fn start<F, Fut>(limit: Duration, tick: Duration, on_expire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = watch::channel(limit);

        let handle = tokio::spawn(async move {
            let deadline = Instant::now() + limit;
            let mut ticker = interval(tick.max(MIN_TICK));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let remaining = deadline.saturating_duration_since(Instant::now());
                // 没有接收方时忽略
                let _ = tx.send(remaining);
                if remaining.is_zero() {
                    break;
                }
            }

            debug!("⏰ 倒计时结束");
            on_expire().await;
        });

        Self {
            remaining: rx,
            handle,
        }
    }

    /// 当前剩余时间
    pub fn remaining(&self) -> Duration {
        *self.remaining.borrow()
    }

    /// 订阅剩余时间的变化
    pub fn subscribe(&self) -> watch::Receiver<Duration> {
        self.remaining.clone()
    }

    /// 倒计时任务是否已经结束（到时或被取消）
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// 取消倒计时
    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            debug!("倒计时已取消");
            self.handle.abort();
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter_callback(
        counter: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> std::future::Ready<()> + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test]
    async fn test_expires_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let countdown = Countdown::start(
            Duration::from_millis(40),
            Duration::from_millis(10),
            counter_callback(&fired),
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(countdown.remaining(), Duration::ZERO);
        assert!(countdown.is_finished());
    }

    #[tokio::test]
    async fn test_remaining_counts_down() {
        let fired = Arc::new(AtomicUsize::new(0));
        let countdown = Countdown::start(
            Duration::from_secs(60),
            Duration::from_millis(10),
            counter_callback(&fired),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(countdown.remaining() < Duration::from_secs(60));
        assert!(countdown.remaining() > Duration::from_secs(50));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_prevents_callback() {
        let fired = Arc::new(AtomicUsize::new(0));
        let countdown = Countdown::start(
            Duration::from_millis(50),
            Duration::from_millis(10),
            counter_callback(&fired),
        );
        countdown.cancel();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(countdown.is_finished());
    }

    #[tokio::test]
    async fn test_drop_prevents_callback() {
        let fired = Arc::new(AtomicUsize::new(0));
        let countdown = Countdown::start(
            Duration::from_millis(50),
            Duration::from_millis(10),
            counter_callback(&fired),
        );
        drop(countdown);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
