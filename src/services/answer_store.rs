//! 答案存储 - 业务能力层
//!
//! 只负责"保存当前会话的每题答案"，不持有计时器，不关心流程

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::models::answer::{Answer, AnswerValue};
use crate::models::question::Question;

/// 答案存储
///
/// 职责：
/// - 每道题始终恰好有一个 `Answer`（初始化时创建空答案）
/// - 写入时按题型校验答案形态，不做任何隐式转换
/// - 提供不与实时存储共享内存的快照
pub struct AnswerStore {
    questions: Arc<[Question]>,
    index: HashMap<String, usize>,
    answers: Vec<Answer>,
}

impl AnswerStore {
    /// 根据题目列表创建答案存储，每题一个空答案
    pub fn new(questions: Arc<[Question]>) -> Result<Self, SessionError> {
        let mut index = HashMap::with_capacity(questions.len());
        let mut answers = Vec::with_capacity(questions.len());

        for (i, question) in questions.iter().enumerate() {
            question.validate()?;
            if index.insert(question.question_id.clone(), i).is_some() {
                return Err(SessionError::InvalidSessionData(format!(
                    "题目ID重复: {}",
                    question.question_id
                )));
            }
            answers.push(Answer::empty(
                question.question_id.clone(),
                question.question_type,
            ));
        }

        Ok(Self {
            questions,
            index,
            answers,
        })
    }

    /// 用之前保存的答案初始化
    ///
    /// 不合法的答案跳过并记录警告，返回成功恢复的数量。
    pub fn seed(&mut self, saved: &[Answer]) -> usize {
        let mut restored = 0;
        for answer in saved {
            let Some(&i) = self.index.get(&answer.question_id) else {
                warn!("⚠️ 忽略未知题目的已保存答案: {}", answer.question_id);
                continue;
            };
            if let Err(e) = validate_shape(&self.questions[i], &answer.value) {
                warn!("⚠️ 忽略不合法的已保存答案: {}", e);
                continue;
            }
            self.answers[i] = answer.clone();
            restored += 1;
        }
        debug!("已恢复 {} 个已保存答案", restored);
        restored
    }

    /// 写入答案（原地覆盖）
    pub fn set(&mut self, question_id: &str, value: AnswerValue) -> Result<(), SessionError> {
        let i = self.position(question_id)?;
        validate_shape(&self.questions[i], &value)?;

        let answer = &mut self.answers[i];
        answer.value = value;
        answer.last_modified_at = Some(Utc::now());
        Ok(())
    }

    /// 获取当前答案，未作答时为该题型的空答案
    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.index.get(question_id).map(|&i| &self.answers[i].value)
    }

    /// 已作答题目数量
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_answered()).count()
    }

    /// 未作答的题目ID
    pub fn unanswered(&self) -> Vec<&str> {
        self.answers
            .iter()
            .filter(|a| !a.is_answered())
            .map(|a| a.question_id.as_str())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.answers.len()
    }

    pub fn questions(&self) -> &Arc<[Question]> {
        &self.questions
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.index.get(question_id).map(|&i| &self.questions[i])
    }

    /// 不可变快照
    ///
    /// 每次调用都分配新的内存，之后的 `set` 不会影响已取出的快照。
    pub fn snapshot(&self) -> Arc<[Answer]> {
        self.answers.iter().cloned().collect()
    }

    fn position(&self, question_id: &str) -> Result<usize, SessionError> {
        self.index
            .get(question_id)
            .copied()
            .ok_or_else(|| SessionError::UnknownQuestion {
                question_id: question_id.to_string(),
            })
    }
}

/// 按题型校验答案形态
fn validate_shape(question: &Question, value: &AnswerValue) -> Result<(), SessionError> {
    let id = &question.question_id;
    let expected = question.question_type;

    if value.question_type() != expected {
        return Err(SessionError::invalid_shape(
            id.as_str(),
            expected,
            format!("收到 {} 形态的答案", value.question_type()),
        ));
    }

    match value {
        AnswerValue::SingleChoice {
            selected: Some(option_id),
        } => ensure_option(question, option_id),
        AnswerValue::MultiChoice { selected } => {
            selected.iter().try_for_each(|o| ensure_option(question, o))
        }
        AnswerValue::Code { source, language }
            if !source.trim().is_empty() && language.trim().is_empty() =>
        {
            Err(SessionError::invalid_shape(
                id.as_str(),
                expected,
                "代码答案缺少语言标记",
            ))
        }
        _ => Ok(()),
    }
}

fn ensure_option(question: &Question, option_id: &str) -> Result<(), SessionError> {
    if question.has_option(option_id) {
        Ok(())
    } else {
        Err(SessionError::UnknownOption {
            question_id: question.question_id.clone(),
            option_id: option_id.to_string(),
        })
    }
}
