//! 考试诚信监控 - 业务能力层
//!
//! 只负责"统计违规并在超过阈值时升级"，不持有计时器，纯信号驱动

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::violation::{PlatformSignal, ViolationKind, ViolationRecord};

/// 监控状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Watching,
    Escalated,
}

/// 处理一个信号后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityEvent {
    /// 已升级或已解除订阅，信号被忽略
    Ignored,
    /// 记录一次违规并警告
    Warning {
        record: ViolationRecord,
        max_warnings: u32,
    },
    /// 超过阈值，升级（每个会话只出现一次）
    Escalated {
        record: ViolationRecord,
        kind: ViolationKind,
    },
}

/// 平台信号发送端
///
/// 监控解除订阅后发送会失败。
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: mpsc::UnboundedSender<PlatformSignal>,
}

impl SignalSender {
    /// 投递信号，监控已解除订阅时返回 false
    pub fn send(&self, signal: PlatformSignal) -> bool {
        self.tx.send(signal).is_ok()
    }

    pub fn is_attached(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// 诚信监控
///
/// 职责：
/// - `Watching` 时每个违规信号计数并发出警告
/// - 计数超过 `max_warnings` 时进入 `Escalated`，只发出一次升级事件
/// - 通过 `attach()`/`detach()` 管理订阅，解除后不会再收到任何信号
pub struct IntegrityMonitor {
    state: MonitorState,
    record: ViolationRecord,
    max_warnings: u32,
    fullscreen_exit_escalates: bool,
    signals: Option<mpsc::UnboundedReceiver<PlatformSignal>>,
}

impl IntegrityMonitor {
    pub fn new(max_warnings: u32, fullscreen_exit_escalates: bool) -> Self {
        Self {
            state: MonitorState::Watching,
            record: ViolationRecord::default(),
            max_warnings,
            fullscreen_exit_escalates,
            signals: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn record(&self) -> &ViolationRecord {
        &self.record
    }

    pub fn is_attached(&self) -> bool {
        self.signals.is_some()
    }

    /// 订阅平台信号，返回发送端
    ///
    /// 重复调用会替换之前的订阅，旧的发送端随之失效。
    pub fn attach(&mut self) -> SignalSender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.signals = Some(rx);
        debug!("诚信监控已订阅平台信号");
        SignalSender { tx }
    }

    /// 解除订阅，只有第一次调用返回 true
    pub fn detach(&mut self) -> bool {
        match self.signals.take() {
            Some(mut rx) => {
                rx.close();
                debug!("诚信监控已解除订阅");
                true
            }
            None => false,
        }
    }

    /// 等待下一个平台信号，未订阅时永远挂起
    pub async fn next_signal(&mut self) -> PlatformSignal {
        let Some(rx) = self.signals.as_mut() else {
            return std::future::pending().await;
        };
        match rx.recv().await {
            Some(signal) => signal,
            None => {
                // 所有发送端都已释放
                self.signals = None;
                std::future::pending().await
            }
        }
    }

    /// 处理一个违规信号
    pub fn observe(&mut self, signal: PlatformSignal, at: DateTime<Utc>) -> IntegrityEvent {
        if self.state == MonitorState::Escalated {
            debug!("已升级，忽略信号: {:?}", signal);
            return IntegrityEvent::Ignored;
        }

        let kind = signal.kind();
        self.record.record(kind, at);

        let immediate = self.fullscreen_exit_escalates && kind == ViolationKind::FullscreenExit;
        if immediate || self.record.count > self.max_warnings {
            self.state = MonitorState::Escalated;
            warn!(
                "🚨 违规升级: {} (累计 {} 次)",
                kind.description(),
                self.record.count
            );
            return IntegrityEvent::Escalated {
                record: self.record.clone(),
                kind,
            };
        }

        warn!(
            "⚠️ 违规警告 {}/{}: {}",
            self.record.count,
            self.max_warnings,
            kind.description()
        );
        IntegrityEvent::Warning {
            record: self.record.clone(),
            max_warnings: self.max_warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, task};

    #[test]
    fn test_third_violation_escalates_once() {
        let mut monitor = IntegrityMonitor::new(2, false);
        let now = Utc::now();

        assert!(matches!(
            monitor.observe(PlatformSignal::VisibilityHidden, now),
            IntegrityEvent::Warning { .. }
        ));
        assert!(matches!(
            monitor.observe(PlatformSignal::FullscreenExited, now),
            IntegrityEvent::Warning { .. }
        ));
        assert_eq!(monitor.state(), MonitorState::Watching);

        match monitor.observe(PlatformSignal::VisibilityHidden, now) {
            IntegrityEvent::Escalated { record, kind } => {
                assert_eq!(record.count, 3);
                assert_eq!(kind, ViolationKind::TabHidden);
            }
            other => panic!("应该升级，实际: {:?}", other),
        }
        assert_eq!(monitor.state(), MonitorState::Escalated);

        // 升级后不再计数，也不会二次升级
        assert_eq!(
            monitor.observe(PlatformSignal::VisibilityHidden, now),
            IntegrityEvent::Ignored
        );
        assert_eq!(monitor.record().count, 3);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let mut monitor = IntegrityMonitor::new(0, false);
        assert!(matches!(
            monitor.observe(PlatformSignal::FocusLost, Utc::now()),
            IntegrityEvent::Escalated { .. }
        ));
    }

    #[test]
    fn test_fullscreen_exit_policy() {
        let mut monitor = IntegrityMonitor::new(2, true);
        assert!(matches!(
            monitor.observe(PlatformSignal::VisibilityHidden, Utc::now()),
            IntegrityEvent::Warning { .. }
        ));
        assert!(matches!(
            monitor.observe(PlatformSignal::FullscreenExited, Utc::now()),
            IntegrityEvent::Escalated { .. }
        ));
    }

    #[tokio::test]
    async fn test_detach_removes_subscription() {
        let mut monitor = IntegrityMonitor::new(2, false);
        let sender = monitor.attach();

        assert!(sender.send(PlatformSignal::VisibilityHidden));
        assert_eq!(monitor.next_signal().await, PlatformSignal::VisibilityHidden);

        assert!(monitor.detach());
        assert!(!monitor.detach());
        assert!(!sender.is_attached());
        assert!(!sender.send(PlatformSignal::VisibilityHidden));

        let mut next = task::spawn(monitor.next_signal());
        assert_pending!(next.poll());
    }
}
