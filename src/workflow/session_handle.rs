//! 会话句柄
//!
//! 协调器以 actor 方式运行，外部只通过句柄发送命令、订阅通知

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::clients::SubmitReceipt;
use crate::error::SessionError;
use crate::models::{AnswerValue, PlatformSignal, Question, SessionState, ViolationKind};
use crate::services::SignalSender;

/// 发往协调器的命令
#[derive(Debug)]
pub enum SessionCommand {
    SetAnswer {
        question_id: String,
        value: AnswerValue,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Save,
    Submit,
    Retry,
    Exit,
}

/// 协调器广播的通知
#[derive(Debug, Clone)]
pub enum SessionNotice {
    StateChanged(SessionState),
    /// 违规警告，尚未达到升级阈值
    ViolationWarning {
        kind: ViolationKind,
        count: u32,
        max_warnings: u32,
    },
    /// 违规升级，即将强制提交
    IntegrityEscalated { kind: ViolationKind, count: u32 },
    DeadlineReached,
    Autosaved {
        answered: usize,
        saved_at: DateTime<Utc>,
    },
    /// 自动保存失败，下一个周期会重试
    AutosaveFailed { message: String },
    Saved { saved_at: DateTime<Utc> },
    SaveFailed { message: String },
    /// 提交时仍有未作答题目（仅提示，不阻止提交）
    IncompleteAnswers { answered: usize, total: usize },
    Submitted { receipt: SubmitReceipt },
    /// 提交失败，可以手动重试
    SubmitFailed { message: String },
}

/// 会话句柄，可克隆
#[derive(Clone)]
pub struct SessionHandle {
    pub(crate) session_id: String,
    pub(crate) questions: Arc<[Question]>,
    pub(crate) commands: mpsc::Sender<SessionCommand>,
    pub(crate) signals: SignalSender,
    pub(crate) state: watch::Receiver<SessionState>,
    pub(crate) remaining: watch::Receiver<Duration>,
    pub(crate) notices: broadcast::Sender<SessionNotice>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.question_id == question_id)
    }

    /// 修改答案，等待协调器校验结果
    pub async fn set_answer(
        &self,
        question_id: impl Into<String>,
        value: AnswerValue,
    ) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::SetAnswer {
            question_id: question_id.into(),
            value,
            reply,
        })
        .await?;
        rx.await.map_err(|_| SessionError::SessionClosed)?
    }

    /// 手动保存
    pub async fn save(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Save).await
    }

    /// 手动提交
    pub async fn submit(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Submit).await
    }

    /// 提交失败后重试
    pub async fn retry(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Retry).await
    }

    /// 退出会话
    pub async fn exit(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Exit).await
    }

    /// 投递平台信号，监控已解除订阅时返回 false
    pub fn signal(&self, signal: PlatformSignal) -> bool {
        self.signals.send(signal)
    }

    /// 平台信号发送端，交给页面事件源使用
    pub fn signals(&self) -> SignalSender {
        self.signals.clone()
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn remaining(&self) -> Duration {
        *self.remaining.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn watch_remaining(&self) -> watch::Receiver<Duration> {
        self.remaining.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    /// 等待状态满足条件
    pub async fn wait_for_state(
        &self,
        pred: impl FnMut(&SessionState) -> bool,
    ) -> Result<SessionState, SessionError> {
        let mut rx = self.state.clone();
        rx.wait_for(pred)
            .await
            .map(|state| *state)
            .map_err(|_| SessionError::SessionClosed)
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::SessionClosed)
    }
}
