//! 提交协调器 - 流程层
//!
//! 拥有会话的全部状态：答案、计时器、自动保存、诚信监控。
//! 所有事件都在同一个 `select!` 循环里按顺序处理，保证：
//! - 最终提交至多发起一次（失败后只能由学生手动重试）
//! - 发起提交之前先停止计时器与自动保存、解除诚信监控
//! - 提交发起后不再有任何保存请求

use futures::future::BoxFuture;
use std::fmt;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::clients::{SessionApi, SubmitReceipt};
use crate::error::{ApiError, SessionError};
use crate::models::{
    AnswerValue, Checkpoint, PlatformSignal, Question, Session, SessionData, SessionState,
    ViolationKind, ViolationRecord,
};
use crate::services::{
    AnswerStore, AutosavePump, AutosaveStats, ClockEvent, FlushDecision, IntegrityEvent,
    IntegrityMonitor, PumpEvent, SessionClock, SignalSender,
};
use crate::utils::logging::format_remaining;
use crate::workflow::session_ctx::SessionCtx;
use crate::workflow::session_handle::{SessionCommand, SessionHandle, SessionNotice};
use crate::workflow::state_machine::{transition, Effect, SessionEvent};

type SaveFuture = BoxFuture<'static, Result<Checkpoint, ApiError>>;
type FinalizeFuture = BoxFuture<'static, Result<SubmitReceipt, ApiError>>;

const COMMAND_BUFFER: usize = 32;
const NOTICE_BUFFER: usize = 64;
/// 会话结束前等待取消资格上报的上限
const REPORT_WAIT: Duration = Duration::from_secs(10);

/// 会话引擎配置
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub autosave_interval: Duration,
    pub clock_tick: Duration,
    /// 允许的违规警告次数
    pub max_violation_warnings: u32,
    pub fullscreen_exit_escalates: bool,
    pub report_disqualification: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            autosave_interval: Duration::from_secs(30),
            clock_tick: Duration::from_secs(1),
            max_violation_warnings: 2,
            fullscreen_exit_escalates: false,
            report_disqualification: true,
        }
    }
}

/// 强制提交原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedReason {
    Deadline,
    Integrity(ViolationKind),
}

impl fmt::Display for ForcedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForcedReason::Deadline => f.write_str("考试时间到"),
            ForcedReason::Integrity(kind) => write!(f, "违规次数超限 ({})", kind),
        }
    }
}

/// 取消资格上报结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisqualificationReport {
    Sent,
    Failed,
    TimedOut,
}

impl fmt::Display for DisqualificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisqualificationReport::Sent => f.write_str("已上报"),
            DisqualificationReport::Failed => f.write_str("上报失败"),
            DisqualificationReport::TimedOut => f.write_str("上报超时"),
        }
    }
}

/// 会话结束后的统计
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session_id: String,
    pub final_state: SessionState,
    pub answered: usize,
    pub total: usize,
    pub violations: ViolationRecord,
    pub autosave: AutosaveStats,
    pub time_spent_seconds: u64,
    pub forced_by: Option<ForcedReason>,
    pub receipt: Option<SubmitReceipt>,
    /// 未触发上报时为 None
    pub disqualification: Option<DisqualificationReport>,
}

/// 提交协调器
pub struct SubmissionCoordinator {
    api: Arc<dyn SessionApi>,
    settings: SessionSettings,
    session: Session,
    ctx: SessionCtx,
    store: AnswerStore,
    clock: SessionClock,
    pump: AutosavePump,
    monitor: IntegrityMonitor,
    signals: Option<SignalSender>,
    commands: mpsc::Receiver<SessionCommand>,
    commands_open: bool,
    state_tx: watch::Sender<SessionState>,
    notices: broadcast::Sender<SessionNotice>,
    manual_save: Option<SaveFuture>,
    finalize: Option<FinalizeFuture>,
    /// 最终提交已发起，失败后才会复位
    finalize_issued: bool,
    /// 停止计时器时冻结的最终答案，重试时沿用
    frozen: Option<Checkpoint>,
    forced_by: Option<ForcedReason>,
    receipt: Option<SubmitReceipt>,
    report_task: Option<JoinHandle<Result<(), ApiError>>>,
    disqualification: Option<DisqualificationReport>,
}

impl SubmissionCoordinator {
    /// 从平台加载会话并进入答题状态
    pub async fn load(
        api: Arc<dyn SessionApi>,
        competition_id: &str,
        settings: SessionSettings,
    ) -> Result<(Self, SessionHandle), SessionError> {
        if let Some(reason) = api
            .disqualification_status(competition_id)
            .await
            .map_err(SessionError::Load)?
        {
            return Err(SessionError::AlreadyDisqualified { reason });
        }
        let data = api
            .fetch_session(competition_id)
            .await
            .map_err(SessionError::Load)?;
        Self::from_data(api, competition_id, data, settings)
    }

    /// 用已获取的会话数据创建协调器
    pub fn from_data(
        api: Arc<dyn SessionApi>,
        competition_id: &str,
        data: SessionData,
        settings: SessionSettings,
    ) -> Result<(Self, SessionHandle), SessionError> {
        if data.session_id.trim().is_empty() {
            return Err(SessionError::InvalidSessionData("会话ID为空".to_string()));
        }
        if settings.autosave_interval.is_zero() || settings.clock_tick.is_zero() {
            return Err(SessionError::InvalidSessionData(
                "自动保存间隔与计时器心跳必须大于 0".to_string(),
            ));
        }

        let session = Session::new(competition_id, &data);
        let ctx = SessionCtx::new(&session);

        let questions: Arc<[Question]> = data.questions.into();
        let mut store = AnswerStore::new(Arc::clone(&questions))?;
        let restored = store.seed(&data.saved_answers);
        debug!("{} 恢复 {} 个已保存答案", ctx, restored);

        let clock = SessionClock::new(session.deadline, settings.clock_tick);
        let pump = AutosavePump::new(
            Arc::clone(&api),
            session.reference(),
            settings.autosave_interval,
        );
        let monitor = IntegrityMonitor::new(
            settings.max_violation_warnings,
            settings.fullscreen_exit_escalates,
        );

        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(session.state);
        let (notices, _) = broadcast::channel(NOTICE_BUFFER);
        let remaining = clock.subscribe();

        let mut coordinator = Self {
            api,
            settings,
            session,
            ctx,
            store,
            clock,
            pump,
            monitor,
            signals: None,
            commands,
            commands_open: true,
            state_tx,
            notices: notices.clone(),
            manual_save: None,
            finalize: None,
            finalize_issued: false,
            frozen: None,
            forced_by: None,
            receipt: None,
            report_task: None,
            disqualification: None,
        };
        coordinator.apply_sync(SessionEvent::Loaded);

        let signals = match coordinator.signals.clone() {
            Some(signals) => signals,
            None => coordinator.monitor.attach(),
        };
        let handle = SessionHandle {
            session_id: coordinator.session.session_id.clone(),
            questions,
            commands: command_tx,
            signals,
            state: state_rx,
            remaining,
            notices,
        };
        Ok((coordinator, handle))
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    /// 运行会话直到进入终止状态
    ///
    /// 所有句柄释放且提交失败时也会结束（无人能够重试）。
    pub async fn run(mut self) -> SessionReport {
        info!(
            "{} 🚀 开始答题，剩余时间 {}，共 {} 题，每 {} 秒自动保存",
            self.ctx,
            format_remaining(self.clock.remaining()),
            self.store.total(),
            self.pump.period().as_secs()
        );

        while !self.session.state.is_terminal() {
            if !self.commands_open && self.session.state == SessionState::Failed {
                warn!("{} 提交失败且已没有控制端，结束会话", self.ctx);
                break;
            }

            // 计时器优先，截止后排队的命令不会再改动答案
            tokio::select! {
                biased;

                event = self.clock.next_event() => self.on_clock_event(event),
                command = self.commands.recv(), if self.commands_open => match command {
                    Some(command) => self.on_command(command).await,
                    None => {
                        debug!("{} 所有句柄已释放", self.ctx);
                        self.commands_open = false;
                    }
                },
                result = poll_slot(&mut self.finalize) => self.on_finalize_result(result),
                signal = self.monitor.next_signal() => self.on_signal(signal),
                result = poll_slot(&mut self.manual_save) => self.on_manual_save_result(result),
                event = self.pump.next_event() => match event {
                    PumpEvent::Due => self.on_autosave_due(),
                    PumpEvent::Completed(result) => self.on_autosave_result(result),
                },
            }
        }

        self.await_disqualification_report().await;
        self.report()
    }

    // ========== 事件处理 ==========

    async fn on_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SetAnswer {
                question_id,
                value,
                reply,
            } => {
                let result = self.set_answer(&question_id, value);
                let _ = reply.send(result);
            }
            SessionCommand::Save => {
                if self.apply(SessionEvent::SaveStarted).await {
                    let checkpoint = self.checkpoint();
                    self.manual_save = Some(self.save_future(checkpoint));
                }
            }
            SessionCommand::Submit => {
                self.apply(SessionEvent::SubmitRequested).await;
            }
            SessionCommand::Retry => {
                self.apply(SessionEvent::RetryRequested).await;
            }
            SessionCommand::Exit => {
                self.apply(SessionEvent::ExitRequested).await;
            }
        }
    }

    fn set_answer(&mut self, question_id: &str, value: AnswerValue) -> Result<(), SessionError> {
        if !self.session.state.is_answering() {
            debug!("{} 当前状态 {} 不能修改答案", self.ctx, self.session.state);
            return Err(SessionError::SessionClosed);
        }
        if self.clock.remaining().is_zero() {
            debug!("{} 已过截止时间，拒绝修改题目 {}", self.ctx, question_id);
            return Err(SessionError::SessionClosed);
        }
        self.store.set(question_id, value)?;
        debug!(
            "{} 题目 {} 已作答 ({}/{})",
            self.ctx,
            question_id,
            self.store.answered_count(),
            self.store.total()
        );
        Ok(())
    }

    fn on_clock_event(&mut self, event: ClockEvent) {
        match event {
            ClockEvent::Tick(remaining) => {
                if remaining.as_secs() % 60 == 0 {
                    debug!("{} ⏱ 剩余 {}", self.ctx, format_remaining(remaining));
                }
            }
            ClockEvent::Expired => {
                warn!("{} ⏰ 考试时间到，强制提交", self.ctx);
                self.forced_by.get_or_insert(ForcedReason::Deadline);
                self.notify(SessionNotice::DeadlineReached);
                self.apply_sync(SessionEvent::DeadlineReached);
            }
        }
    }

    fn on_signal(&mut self, signal: PlatformSignal) {
        if !self.session.state.is_answering() {
            return;
        }
        match self.monitor.observe(signal, chrono::Utc::now()) {
            IntegrityEvent::Ignored => {}
            IntegrityEvent::Warning {
                record,
                max_warnings,
            } => {
                self.notify(SessionNotice::ViolationWarning {
                    kind: signal.kind(),
                    count: record.count,
                    max_warnings,
                });
            }
            IntegrityEvent::Escalated { record, kind } => {
                warn!(
                    "{} 🚨 违规 {} 次，超过上限 {}，强制提交",
                    self.ctx, record.count, self.settings.max_violation_warnings
                );
                self.forced_by.get_or_insert(ForcedReason::Integrity(kind));
                self.notify(SessionNotice::IntegrityEscalated {
                    kind,
                    count: record.count,
                });
                self.apply_sync(SessionEvent::IntegrityEscalated);
            }
        }
    }

    fn on_autosave_due(&mut self) {
        if !self.session.state.is_answering() {
            return;
        }
        let checkpoint = self.checkpoint();
        match self.pump.flush(checkpoint) {
            FlushDecision::Started => debug!("{} 💾 自动保存开始", self.ctx),
            FlushDecision::Coalesced => debug!("{} 上一次自动保存未完成，本次合并", self.ctx),
            FlushDecision::Stopped => {}
        }
    }

    fn on_autosave_result(&mut self, result: Result<Checkpoint, ApiError>) {
        if !self.session.state.is_answering() {
            debug!("{} 丢弃过期的自动保存结果", self.ctx);
            return;
        }
        match result {
            Ok(checkpoint) => {
                debug!(
                    "{} ✓ 自动保存成功 ({} 题已作答)",
                    self.ctx,
                    checkpoint.answered_count()
                );
                self.notify(SessionNotice::Autosaved {
                    answered: checkpoint.answered_count(),
                    saved_at: checkpoint.saved_at,
                });
            }
            Err(e) => {
                if !e.is_transient() {
                    warn!("{} 服务器拒绝自动保存: {}", self.ctx, e);
                }
                let e = SessionError::TransientNetwork(e);
                warn!("{} ⚠️ {}，下个周期重试", self.ctx, e);
                self.notify(SessionNotice::AutosaveFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    fn on_manual_save_result(&mut self, result: Result<Checkpoint, ApiError>) {
        if self.session.state != SessionState::Saving {
            return;
        }
        match result {
            Ok(checkpoint) => {
                info!("{} ✓ 手动保存成功", self.ctx);
                self.notify(SessionNotice::Saved {
                    saved_at: checkpoint.saved_at,
                });
            }
            Err(e) => {
                let e = SessionError::TransientNetwork(e);
                warn!("{} ⚠️ 手动{}", self.ctx, e);
                self.notify(SessionNotice::SaveFailed {
                    message: e.to_string(),
                });
            }
        }
        self.apply_sync(SessionEvent::SaveFinished);
    }

    fn on_finalize_result(&mut self, result: Result<SubmitReceipt, ApiError>) {
        if !self.session.state.is_submitting() {
            return;
        }
        match result {
            Ok(receipt) => {
                info!("{} ✅ 提交成功", self.ctx);
                self.notify(SessionNotice::Submitted {
                    receipt: receipt.clone(),
                });
                self.receipt = Some(receipt);
                self.apply_sync(SessionEvent::FinalizeSucceeded);
            }
            Err(e) => {
                let e = SessionError::Finalize(e);
                error!("{} ❌ {}，等待手动重试", self.ctx, e);
                self.finalize_issued = false;
                self.notify(SessionNotice::SubmitFailed {
                    message: e.to_string(),
                });
                self.apply_sync(SessionEvent::FinalizeFailed);
            }
        }
    }

    // ========== 状态转换与副作用 ==========

    /// 执行状态转换，事件被忽略时返回 false
    async fn apply(&mut self, event: SessionEvent) -> bool {
        let Some(effects) = self.enter(event) else {
            return false;
        };
        for effect in effects {
            if *effect == Effect::BestEffortSave {
                self.best_effort_save().await;
            } else {
                self.run_effect(*effect);
            }
        }
        true
    }

    /// 同步版本，用于不含 `BestEffortSave` 的转换
    fn apply_sync(&mut self, event: SessionEvent) -> bool {
        let Some(effects) = self.enter(event) else {
            return false;
        };
        for effect in effects {
            self.run_effect(*effect);
        }
        true
    }

    fn enter(&mut self, event: SessionEvent) -> Option<&'static [Effect]> {
        let Some(t) = transition(self.session.state, event) else {
            debug!(
                "{} 状态 {} 忽略事件 {:?}",
                self.ctx, self.session.state, event
            );
            return None;
        };
        info!("{} 状态: {} → {} ({:?})", self.ctx, t.from, t.to, event);
        self.session.state = t.to;
        self.state_tx.send_replace(t.to);
        self.notify(SessionNotice::StateChanged(t.to));
        Some(t.effects)
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::StartTimers => {
                self.signals = Some(self.monitor.attach());
            }
            Effect::Teardown => self.teardown(),
            Effect::ReportDisqualification => self.report_disqualification(),
            Effect::IssueFinalize => self.issue_finalize(),
            Effect::BestEffortSave => {
                warn!("{} 尽力保存只能在异步转换中执行", self.ctx);
            }
        }
    }

    /// 停止计时器与自动保存、解除监控，冻结最终答案
    fn teardown(&mut self) {
        let checkpoint = self.checkpoint();
        self.clock.stop();
        self.pump.stop();
        self.monitor.detach();
        self.signals = None;
        if self.manual_save.take().is_some() {
            debug!("{} 丢弃未完成的手动保存", self.ctx);
        }
        self.frozen.get_or_insert(checkpoint);
    }

    fn issue_finalize(&mut self) {
        if self.finalize_issued {
            warn!("{} 最终提交已发起，忽略重复请求", self.ctx);
            return;
        }
        self.finalize_issued = true;

        let checkpoint = match &self.frozen {
            Some(checkpoint) => checkpoint.clone(),
            None => self.checkpoint(),
        };
        let answered = checkpoint.answered_count();
        let total = self.store.total();
        if answered < total {
            warn!(
                "{} ⚠️ 还有 {} 题未作答，仍然提交",
                self.ctx,
                total - answered
            );
            self.notify(SessionNotice::IncompleteAnswers { answered, total });
        }
        info!(
            "{} 📤 发起最终提交 ({}/{} 题，用时 {} 秒)",
            self.ctx, answered, total, checkpoint.time_spent_seconds
        );

        let api = Arc::clone(&self.api);
        let session = self.session.reference();
        self.finalize = Some(Box::pin(async move {
            api.submit_answers(&session, &checkpoint).await
        }));
    }

    /// 上报取消资格，与提交并行，会话结束前等待结果
    fn report_disqualification(&mut self) {
        if !self.settings.report_disqualification {
            return;
        }
        let reason = match self.monitor.record().kind {
            Some(kind) => format!("{}: {}", kind.description(), self.monitor.record().count),
            None => "违规次数超限".to_string(),
        };
        let api = Arc::clone(&self.api);
        let competition_id = self.session.competition_id.clone();
        info!("{} 上报取消资格: {}", self.ctx, reason);
        self.report_task = Some(tokio::spawn(async move {
            api.report_disqualification(&competition_id, &reason).await
        }));
    }

    async fn await_disqualification_report(&mut self) {
        let Some(task) = self.report_task.take() else {
            return;
        };
        let outcome = match timeout(REPORT_WAIT, task).await {
            Ok(Ok(Ok(()))) => {
                info!("{} ✓ 取消资格已上报", self.ctx);
                DisqualificationReport::Sent
            }
            Ok(Ok(Err(e))) => {
                warn!("{} 上报取消资格失败: {}", self.ctx, e);
                DisqualificationReport::Failed
            }
            Ok(Err(e)) => {
                warn!("{} 上报取消资格任务异常: {}", self.ctx, e);
                DisqualificationReport::Failed
            }
            Err(_) => {
                warn!(
                    "{} 上报取消资格超过 {} 秒未完成",
                    self.ctx,
                    REPORT_WAIT.as_secs()
                );
                DisqualificationReport::TimedOut
            }
        };
        self.disqualification = Some(outcome);
    }

    /// 退出前尽力保存一次，失败只记录日志
    async fn best_effort_save(&mut self) {
        let checkpoint = self.checkpoint();
        let session = self.session.reference();
        match self.api.save_answers(&session, &checkpoint).await {
            Ok(()) => info!("{} 💾 退出前已保存答案", self.ctx),
            Err(e) => warn!("{} 退出前保存失败: {}", self.ctx, e),
        }
    }

    // ========== 辅助 ==========

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(self.store.snapshot(), self.time_spent())
    }

    fn time_spent(&self) -> u64 {
        // 剩余时间向上取整到秒
        let remaining = self.clock.remaining();
        let remaining_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        self.session.duration_seconds.saturating_sub(remaining_secs)
    }

    fn save_future(&self, checkpoint: Checkpoint) -> SaveFuture {
        let api = Arc::clone(&self.api);
        let session = self.session.reference();
        Box::pin(async move {
            api.save_answers(&session, &checkpoint).await?;
            Ok(checkpoint)
        })
    }

    fn notify(&self, notice: SessionNotice) {
        // 没有订阅者时发送失败，忽略
        let _ = self.notices.send(notice);
    }

    fn report(self) -> SessionReport {
        let (answered, time_spent_seconds) = match &self.frozen {
            Some(checkpoint) => (checkpoint.answered_count(), checkpoint.time_spent_seconds),
            None => (self.store.answered_count(), self.time_spent()),
        };
        SessionReport {
            session_id: self.session.session_id,
            final_state: self.session.state,
            answered,
            total: self.store.total(),
            violations: self.monitor.record().clone(),
            autosave: self.pump.stats(),
            time_spent_seconds,
            forced_by: self.forced_by,
            receipt: self.receipt,
            disqualification: self.disqualification,
        }
    }
}

/// 等待可选的在途操作，空槽时永远挂起
async fn poll_slot<T>(slot: &mut Option<BoxFuture<'static, T>>) -> T {
    let Some(future) = slot.as_mut() else {
        return pending().await;
    };
    let output = future.await;
    *slot = None;
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::InMemorySessionApi;
    use chrono::Utc;

    fn data(deadline_secs: i64) -> SessionData {
        SessionData {
            session_id: "s-1".to_string(),
            student_id: "stu".to_string(),
            deadline: Utc::now() + chrono::Duration::seconds(deadline_secs),
            duration_seconds: deadline_secs.max(0) as u64,
            questions: vec![
                Question::single_choice("q1", &["a", "b"]),
                Question::free_text("q2"),
            ],
            saved_answers: Vec::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_data_enters_active() {
        let api = Arc::new(InMemorySessionApi::new(data(600)));
        let (coordinator, handle) =
            SubmissionCoordinator::from_data(api, "c-1", data(600), SessionSettings::default())
                .unwrap();

        assert_eq!(coordinator.state(), SessionState::Active);
        assert_eq!(handle.state(), SessionState::Active);
        assert!(handle.signals().is_attached());
        assert_eq!(handle.questions().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_empty_session_id() {
        let mut bad = data(600);
        bad.session_id = " ".to_string();
        let api = Arc::new(InMemorySessionApi::new(data(600)));
        let result = SubmissionCoordinator::from_data(api, "c-1", bad, SessionSettings::default());
        assert!(matches!(result, Err(SessionError::InvalidSessionData(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_answers_rejected_after_submit() {
        let api = Arc::new(InMemorySessionApi::new(data(600)));
        let (coordinator, handle) = SubmissionCoordinator::from_data(
            api.clone(),
            "c-1",
            data(600),
            SessionSettings::default(),
        )
        .unwrap();
        let task = tokio::spawn(coordinator.run());

        handle.set_answer("q1", AnswerValue::single("a")).await.unwrap();
        handle.submit().await.unwrap();
        let state = handle
            .wait_for_state(|s| s.is_terminal())
            .await
            .unwrap();
        assert_eq!(state, SessionState::Submitted);

        // 协调器结束后命令通道关闭
        assert!(matches!(
            handle.set_answer("q2", AnswerValue::text("late")).await,
            Err(SessionError::SessionClosed)
        ));

        let report = task.await.unwrap();
        assert_eq!(report.answered, 1);
        assert_eq!(api.submissions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_answer_rejected_after_deadline() {
        use tokio_test::{assert_pending, assert_ready, task};

        let api = Arc::new(InMemorySessionApi::new(data(2)));
        let (coordinator, handle) = SubmissionCoordinator::from_data(
            api.clone(),
            "c-1",
            data(2),
            SessionSettings::default(),
        )
        .unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;

        // 命令在协调器运行前已进入队列
        let mut late = task::spawn(handle.set_answer("q2", AnswerValue::text("written late")));
        assert_pending!(late.poll());

        let report = coordinator.run().await;
        assert_eq!(report.final_state, SessionState::Submitted);
        assert_eq!(report.forced_by, Some(ForcedReason::Deadline));
        assert!(matches!(
            assert_ready!(late.poll()),
            Err(SessionError::SessionClosed)
        ));

        let submitted = api.submissions();
        assert_eq!(submitted.len(), 1);
        assert!(submitted[0]
            .answers
            .iter()
            .all(|a| a.value != AnswerValue::text("written late")));
        assert_eq!(submitted[0].answered_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_intervals_rejected() {
        let api = Arc::new(InMemorySessionApi::new(data(600)));

        let settings = SessionSettings {
            autosave_interval: Duration::ZERO,
            ..SessionSettings::default()
        };
        let result = SubmissionCoordinator::from_data(api.clone(), "c-1", data(600), settings);
        assert!(matches!(result, Err(SessionError::InvalidSessionData(_))));

        let settings = SessionSettings {
            clock_tick: Duration::ZERO,
            ..SessionSettings::default()
        };
        let result = SubmissionCoordinator::from_data(api, "c-1", data(600), settings);
        assert!(matches!(result, Err(SessionError::InvalidSessionData(_))));
    }

    #[test]
    fn test_forced_reason_display() {
        assert_eq!(ForcedReason::Deadline.to_string(), "考试时间到");
        assert!(ForcedReason::Integrity(ViolationKind::TabHidden)
            .to_string()
            .contains("违规"));
    }
}
