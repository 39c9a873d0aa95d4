use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::models::answer::Answer;

/// 自动保存使用的不可变快照
///
/// `answers` 是 `AnswerStore` 在某一时刻的拷贝，与实时存储不共享内存。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub answers: Arc<[Answer]>,
    pub time_spent_seconds: u64,
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(answers: Arc<[Answer]>, time_spent_seconds: u64) -> Self {
        Self {
            answers,
            time_spent_seconds,
            saved_at: Utc::now(),
        }
    }

    /// 已作答题目数量
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_answered()).count()
    }

    /// 查找某题答案
    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }
}
