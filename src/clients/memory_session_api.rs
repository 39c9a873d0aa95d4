/// 内存版会话 API
///
/// 离线模式与测试使用：按服务器语义记录保存、提交和取消资格上报
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::clients::session_api::{SessionApi, SubmitReceipt};
use crate::error::ApiError;
use crate::models::checkpoint::Checkpoint;
use crate::models::session::{SessionData, SessionRef};

#[derive(Default)]
struct MemoryState {
    saves: Vec<Checkpoint>,
    submissions: Vec<Checkpoint>,
    submit_attempts: usize,
    reports: Vec<String>,
    joined: bool,
    failing_saves: usize,
    failing_submits: usize,
    disqualified: Option<String>,
}

/// 内存版会话 API
pub struct InMemorySessionApi {
    data: SessionData,
    save_delay: Duration,
    submit_delay: Duration,
    report_delay: Duration,
    state: Mutex<MemoryState>,
}

impl InMemorySessionApi {
    pub fn new(data: SessionData) -> Self {
        Self {
            data,
            save_delay: Duration::ZERO,
            submit_delay: Duration::ZERO,
            report_delay: Duration::ZERO,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// 每次保存耗时
    pub fn with_save_delay(mut self, delay: Duration) -> Self {
        self.save_delay = delay;
        self
    }

    /// 每次提交耗时
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    /// 每次上报取消资格耗时
    pub fn with_report_delay(mut self, delay: Duration) -> Self {
        self.report_delay = delay;
        self
    }

    /// 前 n 次保存失败
    pub fn with_failing_saves(self, n: usize) -> Self {
        self.lock().failing_saves = n;
        self
    }

    /// 前 n 次提交失败
    pub fn with_failing_submits(self, n: usize) -> Self {
        self.lock().failing_submits = n;
        self
    }

    /// 学生在进入前已被取消资格
    pub fn with_disqualification(self, reason: impl Into<String>) -> Self {
        self.lock().disqualified = Some(reason.into());
        self
    }

    /// 成功写入的保存记录
    pub fn saves(&self) -> Vec<Checkpoint> {
        self.lock().saves.clone()
    }

    pub fn save_count(&self) -> usize {
        self.lock().saves.len()
    }

    /// 成功的提交记录
    pub fn submissions(&self) -> Vec<Checkpoint> {
        self.lock().submissions.clone()
    }

    /// 提交接口被调用的总次数（含失败）
    pub fn submit_attempts(&self) -> usize {
        self.lock().submit_attempts
    }

    /// 已上报的取消资格原因
    pub fn reports(&self) -> Vec<String> {
        self.lock().reports.clone()
    }

    pub fn joined(&self) -> bool {
        self.lock().joined
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // 锁内不会 panic，中毒时沿用内部数据
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_session(&self, session: &SessionRef, endpoint: &str) -> Result<(), ApiError> {
        if session.session_id == self.data.session_id {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                endpoint: endpoint.to_string(),
                message: format!("未知会话: {}", session.session_id),
            })
        }
    }
}

#[async_trait]
impl SessionApi for InMemorySessionApi {
    async fn fetch_session(&self, competition_id: &str) -> Result<SessionData, ApiError> {
        debug!("内存 API: 获取会话 {}", competition_id);
        Ok(self.data.clone())
    }

    async fn save_answers(
        &self,
        session: &SessionRef,
        checkpoint: &Checkpoint,
    ) -> Result<(), ApiError> {
        self.check_session(session, "save")?;
        if !self.save_delay.is_zero() {
            tokio::time::sleep(self.save_delay).await;
        }

        let mut state = self.lock();
        if state.failing_saves > 0 {
            state.failing_saves -= 1;
            return Err(ApiError::Other("模拟网络错误".to_string()));
        }
        if !state.submissions.is_empty() {
            return Err(ApiError::Rejected {
                endpoint: "save".to_string(),
                message: "已提交，不能再保存".to_string(),
            });
        }
        state.saves.push(checkpoint.clone());
        Ok(())
    }

    async fn submit_answers(
        &self,
        session: &SessionRef,
        checkpoint: &Checkpoint,
    ) -> Result<SubmitReceipt, ApiError> {
        self.check_session(session, "submit")?;
        self.lock().submit_attempts += 1;
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }

        let mut state = self.lock();
        if state.failing_submits > 0 {
            state.failing_submits -= 1;
            return Err(ApiError::Other("模拟提交失败".to_string()));
        }
        if !state.submissions.is_empty() {
            return Err(ApiError::Rejected {
                endpoint: "submit".to_string(),
                message: "重复提交".to_string(),
            });
        }
        state.submissions.push(checkpoint.clone());
        Ok(SubmitReceipt {
            submission_id: Some(format!("SUB-{}", self.data.session_id)),
            preliminary_score: None,
        })
    }

    async fn join_competition(&self, _competition_id: &str) -> Result<(), ApiError> {
        self.lock().joined = true;
        Ok(())
    }

    async fn disqualification_status(
        &self,
        _competition_id: &str,
    ) -> Result<Option<String>, ApiError> {
        Ok(self.lock().disqualified.clone())
    }

    async fn report_disqualification(
        &self,
        _competition_id: &str,
        reason: &str,
    ) -> Result<(), ApiError> {
        if !self.report_delay.is_zero() {
            tokio::time::sleep(self.report_delay).await;
        }
        let mut state = self.lock();
        state.reports.push(reason.to_string());
        state.disqualified = Some(reason.to_string());
        Ok(())
    }
}
