//! 会话计时器 - 业务能力层
//!
//! 只负责"距离截止时间还剩多久"，截止时间由服务器下发，客户端从不延长

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// 计时器事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// 周期性心跳，携带剩余时间
    Tick(Duration),
    /// 已到截止时间，每个计时器只会出现一次
    Expired,
}

/// 会话计时器
///
/// 由拥有者在事件循环中驱动 `next_event()`：
/// - 每个 tick 向观察者发布剩余时间
/// - 到达截止时间时返回一次 `Expired`，之后不再产生任何事件
/// - 构造时截止时间已过，第一次 `next_event()` 立即返回 `Expired`
/// - `stop()` 之后同样不再产生事件
pub struct SessionClock {
    deadline: Instant,
    ticker: Interval,
    expired: bool,
    stopped: bool,
    remaining_tx: watch::Sender<Duration>,
}

impl SessionClock {
    /// 以当前墙上时间创建计时器
    pub fn new(deadline: DateTime<Utc>, tick: Duration) -> Self {
        Self::starting_at(deadline, Utc::now(), tick)
    }

    /// 以指定的"当前时间"创建计时器
    ///
    /// 截止时间换算成单调时钟上的时刻，之后只依赖单调时钟。
    pub fn starting_at(deadline: DateTime<Utc>, now: DateTime<Utc>, tick: Duration) -> Self {
        let remaining = (deadline - now).to_std().unwrap_or(Duration::ZERO);
        let start = Instant::now();

        let mut ticker = interval_at(start + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let (remaining_tx, _) = watch::channel(remaining);

        debug!("计时器启动，剩余 {:?}", remaining);

        Self {
            deadline: start + remaining,
            ticker,
            expired: false,
            stopped: false,
            remaining_tx,
        }
    }

    /// 剩余时间，最小为零；到期后永远为零
    pub fn remaining(&self) -> Duration {
        if self.expired {
            return Duration::ZERO;
        }
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// 订阅剩余时间
    pub fn subscribe(&self) -> watch::Receiver<Duration> {
        self.remaining_tx.subscribe()
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn is_running(&self) -> bool {
        !self.expired && !self.stopped
    }

    /// 等待下一个计时器事件
    ///
    /// 已到期或已停止时永远挂起，可以安全地放在 `select!` 中。
    pub async fn next_event(&mut self) -> ClockEvent {
        if !self.is_running() {
            return std::future::pending().await;
        }

        if self.remaining().is_zero() {
            return self.expire();
        }

        let deadline = self.deadline;
        let reached = tokio::select! {
            biased;
            _ = sleep_until(deadline) => true,
            _ = self.ticker.tick() => false,
        };

        let remaining = self.remaining();
        if reached || remaining.is_zero() {
            return self.expire();
        }

        self.remaining_tx.send_replace(remaining);
        ClockEvent::Tick(remaining)
    }

    /// 停止计时器，只有第一次调用返回 true
    pub fn stop(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.stopped = true;
        debug!("计时器已停止，剩余 {:?}", self.remaining());
        true
    }

    fn expire(&mut self) -> ClockEvent {
        self.expired = true;
        self.remaining_tx.send_replace(Duration::ZERO);
        debug!("⏰ 计时器到期");
        ClockEvent::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, task};

    #[tokio::test(start_paused = true)]
    async fn test_ticks_then_expires_once() {
        let now = Utc::now();
        let deadline = now + chrono::Duration::seconds(3);
        let mut clock = SessionClock::starting_at(deadline, now, Duration::from_secs(1));
        let observer = clock.subscribe();

        assert_eq!(clock.next_event().await, ClockEvent::Tick(Duration::from_secs(2)));
        assert_eq!(*observer.borrow(), Duration::from_secs(2));
        assert_eq!(clock.next_event().await, ClockEvent::Tick(Duration::from_secs(1)));
        assert_eq!(clock.next_event().await, ClockEvent::Expired);

        assert!(clock.is_expired());
        assert_eq!(clock.remaining(), Duration::ZERO);
        assert_eq!(*observer.borrow(), Duration::ZERO);

        // 到期之后不再有事件
        let mut next = task::spawn(clock.next_event());
        assert_pending!(next.poll());
        drop(next);
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(clock.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_deadline_expires_immediately() {
        let now = Utc::now();
        let deadline = now - chrono::Duration::minutes(30);
        let mut clock = SessionClock::starting_at(deadline, now, Duration::from_secs(1));

        let started = Instant::now();
        assert_eq!(clock.next_event().await, ClockEvent::Expired);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unaligned_deadline_expires_on_time() {
        let now = Utc::now();
        let deadline = now + chrono::Duration::milliseconds(1500);
        let mut clock = SessionClock::starting_at(deadline, now, Duration::from_secs(1));

        let started = Instant::now();
        assert!(matches!(clock.next_event().await, ClockEvent::Tick(_)));
        assert_eq!(clock.next_event().await, ClockEvent::Expired);
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_clock_never_fires() {
        let now = Utc::now();
        let deadline = now + chrono::Duration::seconds(2);
        let mut clock = SessionClock::starting_at(deadline, now, Duration::from_secs(1));

        assert!(clock.stop());
        assert!(!clock.stop());

        let mut next = task::spawn(clock.next_event());
        assert_pending!(next.poll());
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_pending!(next.poll());
    }
}
