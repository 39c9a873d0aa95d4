//! 会话上下文
//!
//! 封装"我正在处理哪个竞赛的哪个会话"这一信息，用作日志前缀

use std::fmt::Display;

use crate::models::session::Session;

/// 会话上下文
#[derive(Debug, Clone)]
pub struct SessionCtx {
    /// 会话ID
    pub session_id: String,

    /// 竞赛ID
    pub competition_id: String,

    /// 学生ID（可能为空）
    pub student_id: String,
}

impl SessionCtx {
    /// 从会话创建上下文
    pub fn new(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            competition_id: session.competition_id.clone(),
            student_id: session.student_id.clone(),
        }
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.student_id.is_empty() {
            write!(f, "[会话 {} 竞赛#{}]", self.session_id, self.competition_id)
        } else {
            write!(
                f,
                "[会话 {} 竞赛#{} 学生#{}]",
                self.session_id, self.competition_id, self.student_id
            )
        }
    }
}
