//! 平台会话 API 抽象
//!
//! 引擎只依赖这个 trait，具体实现可以是 HTTP 客户端，也可以是内存实现

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::checkpoint::Checkpoint;
use crate::models::session::{SessionData, SessionRef};

/// 提交回执
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    #[serde(default)]
    pub submission_id: Option<String>,
    /// 服务器给出的初步得分，可能需要等待评阅
    #[serde(default)]
    pub preliminary_score: Option<f64>,
}

/// 平台会话 API
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// 进入考试时获取会话（截止时间、题目、已保存答案），只调用一次
    async fn fetch_session(&self, competition_id: &str) -> Result<SessionData, ApiError>;

    /// 保存答案（自动保存与手动保存），幂等
    async fn save_answers(
        &self,
        session: &SessionRef,
        checkpoint: &Checkpoint,
    ) -> Result<(), ApiError>;

    /// 最终提交，每个会话只会成功调用一次
    async fn submit_answers(
        &self,
        session: &SessionRef,
        checkpoint: &Checkpoint,
    ) -> Result<SubmitReceipt, ApiError>;

    /// 加入竞赛
    async fn join_competition(&self, competition_id: &str) -> Result<(), ApiError>;

    /// 查询是否已被取消资格，返回取消原因
    async fn disqualification_status(
        &self,
        competition_id: &str,
    ) -> Result<Option<String>, ApiError>;

    /// 上报取消资格
    async fn report_disqualification(
        &self,
        competition_id: &str,
        reason: &str,
    ) -> Result<(), ApiError>;
}
