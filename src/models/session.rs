use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::answer::Answer;
use crate::models::question::Question;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Loading,
    Active,
    /// 手动保存中，属于 Active 的子模式
    Saving,
    /// 时间到或违规升级触发的强制提交
    ForcedSubmitting,
    ManualSubmitting,
    Submitted,
    /// 提交失败，可手动重试
    Failed,
    /// 学生主动退出，已尽力保存部分答案
    Exited,
}

impl SessionState {
    /// 是否处于答题阶段（可以编辑答案、计时器在运行）
    pub fn is_answering(self) -> bool {
        matches!(self, SessionState::Active | SessionState::Saving)
    }

    pub fn is_submitting(self) -> bool {
        matches!(
            self,
            SessionState::ManualSubmitting | SessionState::ForcedSubmitting
        )
    }

    /// 终止状态，不会再有任何转换
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Submitted | SessionState::Exited)
    }

    pub fn name(self) -> &'static str {
        match self {
            SessionState::Loading => "加载中",
            SessionState::Active => "答题中",
            SessionState::Saving => "保存中",
            SessionState::ForcedSubmitting => "强制提交中",
            SessionState::ManualSubmitting => "提交中",
            SessionState::Submitted => "已提交",
            SessionState::Failed => "提交失败",
            SessionState::Exited => "已退出",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 服务器返回的会话数据
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub session_id: String,
    #[serde(default)]
    pub student_id: String,
    /// 服务器下发的绝对截止时间，客户端不做任何延长
    pub deadline: DateTime<Utc>,
    pub duration_seconds: u64,
    pub questions: Vec<Question>,
    #[serde(default)]
    pub saved_answers: Vec<Answer>,
}

/// 调用平台 API 时使用的会话标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRef {
    pub session_id: String,
    pub competition_id: String,
}

/// 一次考试尝试
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub competition_id: String,
    pub student_id: String,
    pub deadline: DateTime<Utc>,
    pub duration_seconds: u64,
    pub state: SessionState,
}

impl Session {
    pub fn new(competition_id: impl Into<String>, data: &SessionData) -> Self {
        Self {
            session_id: data.session_id.clone(),
            competition_id: competition_id.into(),
            student_id: data.student_id.clone(),
            deadline: data.deadline,
            duration_seconds: data.duration_seconds,
            state: SessionState::Loading,
        }
    }

    pub fn reference(&self) -> SessionRef {
        SessionRef {
            session_id: self.session_id.clone(),
            competition_id: self.competition_id.clone(),
        }
    }
}
