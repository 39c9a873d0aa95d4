//! 自动保存 - 业务能力层
//!
//! 只负责"按固定间隔把快照交给持久化协作者"，与计时器相互独立

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use crate::clients::SessionApi;
use crate::error::ApiError;
use crate::models::checkpoint::Checkpoint;
use crate::models::session::SessionRef;

type FlushFuture = BoxFuture<'static, Result<Checkpoint, ApiError>>;

/// 一次 flush 请求的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushDecision {
    /// 已发起
    Started,
    /// 上一次 flush 尚未完成，本次跳过（合并，不排队）
    Coalesced,
    /// 已停止，不再发起
    Stopped,
}

/// 自动保存泵产生的事件
#[derive(Debug)]
pub enum PumpEvent {
    /// 保存周期到期，拥有者应取快照并调用 `flush()`
    Due,
    /// 在途 flush 完成
    Completed(Result<Checkpoint, ApiError>),
}

/// 自动保存统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutosaveStats {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub coalesced: u64,
}

/// 自动保存泵
///
/// 职责：
/// - 按固定间隔产生 `PumpEvent::Due`，由拥有者取快照后调用 `flush()`
/// - 同一时刻最多一个 flush 在途
/// - 失败不致命，下一个 tick 自然重试
/// - `stop()` 会丢弃在途 flush，之后不再产生 tick 和结果
pub struct AutosavePump {
    api: Arc<dyn SessionApi>,
    session: SessionRef,
    period: Duration,
    ticker: Interval,
    in_flight: Option<FlushFuture>,
    stopped: bool,
    stats: AutosaveStats,
}

impl AutosavePump {
    /// 创建自动保存泵，第一个 tick 在一个间隔之后
    pub fn new(api: Arc<dyn SessionApi>, session: SessionRef, period: Duration) -> Self {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            api,
            session,
            period,
            ticker,
            in_flight: None,
            stopped: false,
            stats: AutosaveStats::default(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn stats(&self) -> AutosaveStats {
        self.stats
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_flushing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// 等待下一个事件：保存周期到期或在途 flush 完成
    ///
    /// 停止后永远挂起。可以安全地在 `select!` 中被取消，在途 flush 不会丢失。
    pub async fn next_event(&mut self) -> PumpEvent {
        if self.stopped {
            return std::future::pending().await;
        }
        let Some(flush) = self.in_flight.as_mut() else {
            self.ticker.tick().await;
            return PumpEvent::Due;
        };
        tokio::select! {
            biased;
            result = flush => {
                self.in_flight = None;
                match &result {
                    Ok(_) => self.stats.succeeded += 1,
                    Err(_) => self.stats.failed += 1,
                }
                PumpEvent::Completed(result)
            }
            _ = self.ticker.tick() => PumpEvent::Due,
        }
    }

    /// 发起一次保存
    pub fn flush(&mut self, checkpoint: Checkpoint) -> FlushDecision {
        if self.stopped {
            return FlushDecision::Stopped;
        }
        if self.in_flight.is_some() {
            self.stats.coalesced += 1;
            debug!("上一次自动保存尚未完成，跳过本次");
            return FlushDecision::Coalesced;
        }

        let api = Arc::clone(&self.api);
        let session = self.session.clone();
        self.in_flight = Some(Box::pin(async move {
            api.save_answers(&session, &checkpoint).await?;
            Ok(checkpoint)
        }));
        self.stats.started += 1;
        FlushDecision::Started
    }

    /// 停止自动保存，只有第一次调用返回 true
    ///
    /// 在途的 flush 被直接丢弃，其结果永远不会被观察到。
    pub fn stop(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.stopped = true;
        if self.in_flight.take().is_some() {
            debug!("自动保存停止，丢弃在途的保存请求");
        }
        true
    }
}
